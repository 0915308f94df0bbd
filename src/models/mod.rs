pub mod dialogue;
pub mod episode;
pub mod training;

pub use dialogue::*;
pub use episode::*;
pub use training::*;
