pub mod base;
pub mod kv_store;
pub mod publish;
pub mod subscribe;
