//! Persisted stamps and change detection against them.

mod changes;
mod scan;
mod store;

pub use changes::*;
pub use scan::*;
pub use store::*;
