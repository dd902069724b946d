//! Content and path fingerprints for incremental change detection.

mod accumulator;
mod content;
mod error;
mod path;

pub use accumulator::*;
pub use content::*;
pub use error::*;
pub use path::*;
