pub mod config;
pub mod decode;
pub mod ports;
pub mod watch;
