use thiserror::Error;

/// Errors produced by the update/configure pipelines.
#[derive(Debug, Error)]
pub enum Error {
    /// A blocklist source could not be fetched.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The settings store could not be read or written.
    #[error("settings store error: {0}")]
    Store(String),

    /// Writing the rule file or resolver config failed.
    #[error("file write failed: {0}")]
    FileWrite(#[from] std::io::Error),

    /// Restarting the resolver service failed.
    #[error("service reload failed: {0}")]
    Reload(String),
}

pub type Result<T> = std::result::Result<T, Error>;
