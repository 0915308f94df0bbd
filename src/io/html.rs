//! Tolerant scanning of forum HTML.
//!
//! Pages are scanned as a flat token stream rather than built into a DOM.
//! Tag names are matched case-insensitively, attribute order and quoting do
//! not matter, and `<script>`/`<style>` bodies are skipped.

/// Elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Lower-cased tag name
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

impl StartTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the `class` attribute contains the given class token
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|token| token == class))
    }

    pub fn is_void(&self) -> bool {
        self.self_closing || VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'a> {
    Text(&'a str),
    Start(StartTag),
    /// Lower-cased name of a closing tag
    End(String),
}

/// A token and its byte span in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlToken<'a> {
    pub kind: TokenKind<'a>,
    pub start: usize,
    pub end: usize,
}

/// Split HTML into text, start-tag and end-tag tokens. Comments, doctypes and
/// processing instructions are dropped.
pub fn tokenize(html: &str) -> Vec<HtmlToken<'_>> {
    let bytes = html.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }

        let rest = &html[pos..];
        let markup = if rest.starts_with("<!--") {
            let end = rest.find("-->").map(|i| pos + i + 3).unwrap_or(bytes.len());
            Some((None, end))
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').map(|i| pos + i + 1).unwrap_or(bytes.len());
            Some((None, end))
        } else if rest.starts_with("</") {
            let close = rest.find('>').map(|i| pos + i).unwrap_or(bytes.len());
            let name = html[pos + 2..close].trim().to_ascii_lowercase();
            Some((Some(TokenKind::End(name)), (close + 1).min(bytes.len())))
        } else if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            find_tag_end(html, pos).and_then(|close| {
                parse_start_tag(&html[pos + 1..close]).map(|tag| (Some(TokenKind::Start(tag)), close + 1))
            })
        } else {
            None
        };

        let Some((kind, end)) = markup else {
            // A bare '<' is text
            pos += 1;
            continue;
        };

        if text_start < pos {
            tokens.push(HtmlToken {
                kind: TokenKind::Text(&html[text_start..pos]),
                start: text_start,
                end: pos,
            });
        }

        let mut next = end;
        if let Some(kind) = kind {
            let raw_text = match &kind {
                TokenKind::Start(tag) if tag.name == "script" || tag.name == "style" => {
                    Some(tag.name.clone())
                }
                _ => None,
            };
            tokens.push(HtmlToken { kind, start: pos, end });

            if let Some(name) = raw_text {
                let close = format!("</{}", name);
                next = html[end..]
                    .to_ascii_lowercase()
                    .find(&close)
                    .map(|i| end + i)
                    .unwrap_or(bytes.len());
            }
        }

        pos = next;
        text_start = next;
    }

    if text_start < bytes.len() {
        tokens.push(HtmlToken {
            kind: TokenKind::Text(&html[text_start..]),
            start: text_start,
            end: bytes.len(),
        });
    }

    tokens
}

/// Byte offset of the `>` closing a start tag, honouring quotes
fn find_tag_end(html: &str, start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &b) in html.as_bytes()[start..].iter().enumerate() {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(start + i),
            _ => {}
        }
    }
    None
}

/// Parse the inside of a start tag (between `<` and `>`)
fn parse_start_tag(inner: &str) -> Option<StartTag> {
    let inner = inner.trim();
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(stripped) => (stripped, true),
        None => (inner, false),
    };

    let name_end = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    let mut attrs = Vec::new();
    let mut rest = inner[name_end..].trim_start_matches(|c: char| c.is_whitespace() || c == '/');
    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let close = body.find(q).unwrap_or(body.len());
                    rest = body.get(close + 1..).unwrap_or("");
                    &body[..close]
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    rest = &after_eq[end..];
                    &after_eq[..end]
                }
            }
        } else {
            ""
        };

        if !key.is_empty() {
            attrs.push((key, decode_entities(value)));
        }
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
    }

    Some(StartTag {
        name,
        attrs,
        self_closing,
    })
}

/// An element located in a page
#[derive(Debug, Clone)]
pub struct Element<'a> {
    pub tag: StartTag,
    /// Raw HTML between the start and end tags
    pub inner: &'a str,
    /// Byte offset just past the element
    pub end: usize,
}

impl Element<'_> {
    pub fn text(&self) -> String {
        inner_text(self.inner)
    }
}

/// First element with the given tag name and class, starting at `from`
pub fn find_element_from<'a>(
    html: &'a str,
    from: usize,
    tag: &str,
    class: Option<&str>,
) -> Option<Element<'a>> {
    let slice = html.get(from..)?;
    let tokens = tokenize(slice);

    for (i, token) in tokens.iter().enumerate() {
        let TokenKind::Start(start) = &token.kind else {
            continue;
        };
        if start.name != tag || !class.is_none_or(|c| start.has_class(c)) {
            continue;
        }
        if start.is_void() {
            return Some(Element {
                tag: start.clone(),
                inner: "",
                end: from + token.end,
            });
        }

        let mut depth = 0usize;
        for close in &tokens[i + 1..] {
            match &close.kind {
                TokenKind::Start(t) if t.name == tag && !t.is_void() => depth += 1,
                TokenKind::End(name) if name == tag => {
                    if depth == 0 {
                        return Some(Element {
                            tag: start.clone(),
                            inner: &slice[token.end..close.start],
                            end: from + close.end,
                        });
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }

        // Unclosed element runs to the end of the document
        return Some(Element {
            tag: start.clone(),
            inner: &slice[token.end..],
            end: html.len(),
        });
    }

    None
}

pub fn find_element<'a>(html: &'a str, tag: &str, class: Option<&str>) -> Option<Element<'a>> {
    find_element_from(html, 0, tag, class)
}

/// Every element with the given tag name and class, in document order
pub fn find_all_elements<'a>(html: &'a str, tag: &str, class: Option<&str>) -> Vec<Element<'a>> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(element) = find_element_from(html, from, tag, class) {
        // Void or nested matches still advance past the start tag
        from = if element.end > from { element.end } else { html.len() };
        found.push(element);
    }
    found
}

/// A direct child of an element, as needed for line segmentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildNode {
    Text(String),
    LineBreak,
    Element,
}

/// Direct children of an element body. Text is entity-decoded; nested
/// elements are reported without their content.
pub fn child_nodes(inner: &str) -> Vec<ChildNode> {
    let mut children = Vec::new();
    let mut depth = 0usize;

    for token in tokenize(inner) {
        match token.kind {
            TokenKind::Text(text) if depth == 0 => children.push(ChildNode::Text(decode_entities(text))),
            TokenKind::Text(_) => {}
            TokenKind::Start(tag) if depth == 0 && tag.name == "br" => children.push(ChildNode::LineBreak),
            TokenKind::Start(tag) => {
                if depth == 0 {
                    children.push(ChildNode::Element);
                }
                if !tag.is_void() {
                    depth += 1;
                }
            }
            TokenKind::End(_) => depth = depth.saturating_sub(1),
        }
    }

    children
}

/// Visible text of an HTML fragment with whitespace collapsed
pub fn inner_text(html: &str) -> String {
    let text: String = tokenize(html)
        .into_iter()
        .filter_map(|t| match t.kind {
            TokenKind::Text(s) => Some(decode_entities(s)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the named entities forums actually emit, plus numeric references
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&candidate[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "rsquo" => '\u{2019}',
        "lsquo" => '\u{2018}',
        "rdquo" => '\u{201D}',
        "ldquo" => '\u{201C}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        _ => return None,
    };
    Some(c)
}
