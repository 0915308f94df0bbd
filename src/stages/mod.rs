pub mod episode;
pub mod pairs;
pub mod parse;
pub mod scrape;
pub mod segment;
pub mod stats;
pub mod validate;

pub use episode::*;
pub use pairs::*;
pub use parse::*;
pub use scrape::*;
pub use segment::*;
pub use stats::*;
pub use validate::*;
