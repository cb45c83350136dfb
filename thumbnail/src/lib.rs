pub mod render;
pub mod state;
pub mod task;
pub mod thumbnail;
