pub mod orphans;
pub mod state;
