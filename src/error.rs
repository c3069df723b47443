// Error taxonomy for everything around the filtering core.
//
// Classification, identity and aggregation never fail; these errors come from
// fetching windows, parsing them, loading rules and writing the result.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to parse window '{window}': {reason}")]
    Parse { window: String, reason: String },

    #[error("Failed to write calendar to {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl FeedError {
    pub fn fetch(url: &str, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(window: &str, reason: impl ToString) -> Self {
        Self::Parse {
            window: window.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
