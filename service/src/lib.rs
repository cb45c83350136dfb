pub mod dtos;
pub mod routes;
pub mod state;
