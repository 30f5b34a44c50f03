//! Library crate for portprobe-rs: concurrent TCP connect scanning with banner capture.
pub mod config;
pub mod error;
pub mod ports;
pub mod probe;
pub mod report;
pub mod resolve;
pub mod scanner;
pub mod session;
pub mod types;

pub use error::ScanError;
pub use session::ScanSession;
