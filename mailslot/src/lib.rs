pub mod config;
pub mod fs;
pub mod net;
pub mod policy;
pub mod smtp;
