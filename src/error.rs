use thiserror::Error;

/// Failures the player surfaces as values instead of aborting.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("track list is not valid JSON: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("failed to read track list {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch track list from {url}: {source}")]
    ConfigFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0} is not supported by this surface")]
    UnsupportedFeature(&'static str),

    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
}
