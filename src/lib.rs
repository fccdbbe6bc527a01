pub mod artifact;
pub mod config;
pub mod dal;
pub mod handler;
pub mod server;
