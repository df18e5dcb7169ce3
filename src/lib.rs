// Library exports for dblog-file

pub mod cli;
pub mod config;
pub mod error;
pub mod logs;
pub mod server;
pub mod settings;
