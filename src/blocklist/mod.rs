pub mod convert;
pub mod fetch;
pub mod fingerprint;
pub mod merge;

pub use fetch::{FetchResult, Fetcher, HttpFetcher};
pub use fingerprint::FingerprintStore;
pub use merge::OverrideSet;
