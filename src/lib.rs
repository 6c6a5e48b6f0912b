pub mod archive;
pub mod config;
pub mod driver;
pub mod error;
pub mod http;
pub mod matcher;
pub mod platform;
pub mod progress;
pub mod release;
pub mod runtime;
pub mod sync;
