mod document;
pub use document::*;

mod task;
pub use task::*;
