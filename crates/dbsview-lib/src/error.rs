use crate::signal::StreamKind;
use thiserror::Error;

/// Errors surfaced by montage construction, the derivation engine and the loaders.
///
/// Every variant is recoverable: the operation that produced it leaves previously valid
/// state untouched.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing 10-20 channels even after interpolation: {}", .0.join(", "))]
    MissingChannel(Vec<String>),
    #[error(
        "invalid band-pass parameters: lowcut {lowcut} Hz, highcut {highcut} Hz \
         (need 0 < lowcut < highcut < {nyquist} Hz)"
    )]
    InvalidFilterParameter {
        lowcut: f64,
        highcut: f64,
        nyquist: f64,
    },
    #[error("start sample {requested} is out of range for {available} samples")]
    OutOfRange { requested: usize, available: usize },
    #[error("malformed input {origin}: {reason}")]
    MalformedInput { origin: String, reason: String },
    #[error("no data: {0}")]
    EmptyResult(String),
    #[error("window length must be a positive number of seconds, got {0}")]
    InvalidWindowLength(f64),
    #[error("no {0} recording loaded")]
    NotLoaded(StreamKind),
    #[error("duplicate channel label '{0}'")]
    DuplicateChannel(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(origin: impl Into<String>, reason: impl ToString) -> Self {
        Error::MalformedInput {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
