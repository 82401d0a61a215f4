pub mod cache;
pub mod classify;
pub mod config;
pub mod taxonomy;
