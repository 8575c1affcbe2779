use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The sensor could not be opened, or its stream died mid-flight.
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("malformed frame: expected {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    #[error("failed to start acquisition thread: {0}")]
    ThreadStartFailed(#[from] std::io::Error),

    #[error("no tracking device found")]
    DeviceNotFound,
}

impl From<rusb::Error> for Error {
    fn from(e: rusb::Error) -> Self {
        Error::SensorUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
