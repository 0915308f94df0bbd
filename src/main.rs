use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dialogue_miner::stages::{QualityFlag, timestamp};
use dialogue_miner::{
    BracketMode, Dataset, FetchConfig, HttpFetcher, Lexicon, ParserConfig, ScrapeConfig, Scraper,
    TrainingPairConfig, TranscriptParser, TranscriptValidator, ValidationConfig, analyze_dataset,
    derive_training_pairs, parse_pages, read_json_file, save_dataset, write_json_file,
};

#[derive(Parser)]
#[command(name = "dialogue-miner")]
#[command(author, version, about = "Extract speaker-attributed dialogue from transcript forums", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a transcript forum into a dialogue dataset
    Scrape {
        /// Output dataset file (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Forum index page listing the episode topics
        #[arg(long, default_value = "https://transcripts.foreverdreaming.org/viewforum.php?f=187")]
        base_url: String,

        /// Show name recorded in the dataset metadata
        #[arg(long, default_value = "Dexter")]
        show_name: String,

        /// Lexicon file (JSON) with aliases and non-speaker words
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// Delay between episode requests in milliseconds
        #[arg(long, default_value = "2500")]
        delay_ms: u64,

        /// Maximum random extra delay in milliseconds
        #[arg(long, default_value = "500")]
        jitter_ms: u64,

        /// Maximum number of index pages to follow
        #[arg(long, default_value = "1")]
        max_pages: usize,

        /// Scrape at most this many episodes
        #[arg(long)]
        limit: Option<usize>,

        /// Where bracketed speaker cues are recognised
        #[arg(long, value_enum, default_value_t = BracketMode::Anywhere)]
        bracket_mode: BracketMode,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse saved episode pages into a dialogue dataset
    Parse {
        /// Saved episode HTML pages
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,

        /// Output dataset file (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Show name recorded in the dataset metadata
        #[arg(long, default_value = "Dexter")]
        show_name: String,

        /// Lexicon file (JSON) with aliases and non-speaker words
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// Where bracketed speaker cues are recognised
        #[arg(long, value_enum, default_value_t = BracketMode::Anywhere)]
        bracket_mode: BracketMode,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a dataset file
    Validate {
        /// Dataset file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Repeats of one speaker tolerated before warning
        #[arg(long, default_value = "5")]
        max_same_speaker_run: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Derive input/output training pairs for one speaker
    Pairs {
        /// Dataset file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output training data file (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Speaker whose lines become outputs
        #[arg(long, default_value = "DEXTER")]
        speaker: String,

        /// Preceding dialogue entries used as input
        #[arg(long, default_value = "3")]
        context_window: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report context, speaker and data-quality statistics
    Analyze {
        /// Dataset file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Number of context patterns to show
        #[arg(long, default_value = "20")]
        top: usize,

        /// Minimum lines for a speaker to be listed
        #[arg(long, default_value = "10")]
        min_lines: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            output,
            base_url,
            show_name,
            lexicon,
            delay_ms,
            jitter_ms,
            max_pages,
            limit,
            bracket_mode,
            verbose,
        } => {
            setup_logging(verbose);
            let config = ScrapeConfig {
                base_url,
                show_name,
                delay_ms,
                jitter_ms,
                max_pages,
                limit,
            };
            scrape(config, output, lexicon, bracket_mode).await
        }
        Commands::Parse {
            input,
            output,
            show_name,
            lexicon,
            bracket_mode,
            verbose,
        } => {
            setup_logging(verbose);
            parse_saved_pages(input, output, &show_name, lexicon, bracket_mode).await
        }
        Commands::Validate {
            input,
            max_same_speaker_run,
            verbose,
        } => {
            setup_logging(verbose);
            validate(input, max_same_speaker_run)
        }
        Commands::Pairs {
            input,
            output,
            speaker,
            context_window,
            verbose,
        } => {
            setup_logging(verbose);
            let config = TrainingPairConfig {
                target_speaker: speaker,
                context_window,
            };
            training_pairs(input, output, &config)
        }
        Commands::Analyze {
            input,
            top,
            min_lines,
            verbose,
        } => {
            setup_logging(verbose);
            analyze(input, top, min_lines)
        }
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn build_parser(lexicon: Option<PathBuf>, mode: BracketMode) -> Result<TranscriptParser> {
    let lexicon = match lexicon {
        Some(path) => Lexicon::from_file(&path)
            .with_context(|| format!("Failed to load lexicon from {:?}", path))?,
        None => Lexicon::default(),
    };
    TranscriptParser::from_lexicon(&lexicon, ParserConfig::for_mode(mode))
        .context("Failed to build transcript parser")
}

async fn scrape(
    config: ScrapeConfig,
    output: PathBuf,
    lexicon: Option<PathBuf>,
    mode: BracketMode,
) -> Result<()> {
    let parser = build_parser(lexicon, mode)?;
    let fetcher = HttpFetcher::new(FetchConfig::default()).context("Failed to create HTTP client")?;
    let source = config.base_url.clone();

    info!("Scraping {} from {}", config.show_name, source);
    let scraper = Scraper::new(fetcher, parser, config);
    let outcome = scraper.scrape_all().await.context("Failed to scrape forum index")?;

    for (url, e) in &outcome.failures {
        warn!("Skipped {}: {}", url, e);
    }
    if outcome.episodes.is_empty() {
        bail!("No episodes were scraped");
    }

    let dataset = outcome.into_dataset(&source);
    save_dataset(&dataset, &output, &TranscriptValidator::default())?;
    info!("Output written to {:?}", output);
    Ok(())
}

async fn parse_saved_pages(
    input: Vec<PathBuf>,
    output: PathBuf,
    show_name: &str,
    lexicon: Option<PathBuf>,
    mode: BracketMode,
) -> Result<()> {
    let parser = Arc::new(build_parser(lexicon, mode)?);
    let source = input
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");

    info!("Parsing {} saved page(s)", input.len());
    let episodes = parse_pages(input, parser, show_name).await?;
    if episodes.is_empty() {
        bail!("No episodes could be parsed");
    }

    let dataset = Dataset::from_episodes(episodes, source, timestamp());
    save_dataset(&dataset, &output, &TranscriptValidator::default())?;
    info!("Output written to {:?}", output);
    Ok(())
}

fn validate(input: PathBuf, max_same_speaker_run: usize) -> Result<()> {
    info!("Validating dataset from {:?}", input);
    let value = read_json_file(&input)?;
    let validator = TranscriptValidator::new(ValidationConfig {
        max_same_speaker_run,
    });
    let report = validator.validate(&value);

    println!("Validation Report");
    println!("=================");
    println!("Errors: {}", report.errors.len());
    println!("Warnings: {}", report.warnings.len());

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings");
        println!("--------");
        for warning in &report.warnings {
            println!("{}", warning);
        }
    }
    if !report.errors.is_empty() {
        println!();
        println!("Errors");
        println!("------");
        for error in &report.errors {
            println!("{}", error);
        }
    }

    if !report.is_valid {
        bail!("Dataset validation failed with {} error(s)", report.errors.len());
    }
    println!();
    println!("Dataset is valid");
    Ok(())
}

fn training_pairs(input: PathBuf, output: PathBuf, config: &TrainingPairConfig) -> Result<()> {
    info!("Loading dataset from {:?}", input);
    let value = read_json_file(&input)?;

    let data = derive_training_pairs(&value, config, &input.display().to_string());
    write_json_file(&data, &output)?;

    let stats = &data.metadata.stats;
    info!(
        "Wrote {} pairs to {:?} (avg {:.1} words, {} episodes, {} with context)",
        stats.total_dialogues,
        output,
        stats.avg_dialogue_length,
        stats.unique_episodes,
        stats.dialogues_with_context
    );
    Ok(())
}

fn analyze(input: PathBuf, top: usize, min_lines: usize) -> Result<()> {
    info!("Analyzing dataset from {:?}", input);
    let value = read_json_file(&input)?;
    let stats = analyze_dataset(&value);

    println!("Top Context Patterns");
    println!("{}", "-".repeat(58));
    println!("{:<30} | {:>10} | {:>10}", "Context", "Count", "% of Total");
    println!("{}", "-".repeat(58));
    for context in stats.top_contexts(top) {
        println!(
            "{:<30} | {:>10} | {:>9.2}%",
            truncate(&context.value, 30),
            context.count,
            context.percentage
        );
    }

    println!();
    println!("Speaker Statistics (minimum {} lines)", min_lines);
    println!("{}", "-".repeat(62));
    println!("{:<30} | {:>11} | {:>15}", "Speaker", "Total Lines", "% of Dialogue");
    println!("{}", "-".repeat(62));
    for speaker in stats.speakers_with_at_least(min_lines) {
        println!(
            "{:<30} | {:>11} | {:>14.2}%",
            truncate(&speaker.value, 30),
            speaker.count,
            speaker.percentage
        );
    }

    println!();
    println!("Potential Data Quality Issues");
    for (flag, heading) in [
        (QualityFlag::LongName, "Long speaker names (might be misclassified dialogue)"),
        (QualityFlag::ContainsDigits, "Speakers containing numbers (might be errors)"),
        (QualityFlag::VeryLongName, "Very long speaker names"),
    ] {
        println!();
        println!("{}", heading);
        println!("{}", "-".repeat(heading.len()));
        for issue in stats.issues_flagged(flag) {
            println!("{}: {}", issue.episode, issue.speaker);
        }
    }

    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
