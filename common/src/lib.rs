pub mod models;
pub mod nats;
pub mod persistence;
pub mod tasks;
pub mod util;
