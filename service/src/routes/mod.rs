pub mod root;
pub mod tasks;
