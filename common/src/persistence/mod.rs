mod common;
pub use common::*;

mod thumbnails;
pub use thumbnails::*;

pub mod local;
pub mod s3;
pub mod tempfiles;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;
