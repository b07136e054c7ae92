pub mod config;
pub mod deps;
pub mod init;
pub mod publish;
