pub mod dataset;
pub mod fetch;
pub mod html;

pub use dataset::*;
pub use fetch::*;
