pub mod config;
pub mod errors;
pub mod export;
pub mod modules;
pub mod ports;
pub mod trace;
pub mod types;
