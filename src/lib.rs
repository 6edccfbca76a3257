pub mod api;
pub mod blocklist;
pub mod config;
pub mod coordinator;
pub mod dnsmasq;
pub mod error;
pub mod fsutil;
pub mod init;
pub mod net;
pub mod scheduler;
pub mod settings;

pub use error::{Error, Result};
