use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Identifier errors
    #[error("invalid device id '{value}': expected 1-2 hex digits")]
    InvalidDeviceId { value: String },
}

impl Error {
    /// Build an `InvalidDeviceId` from anything string-like.
    pub fn invalid_device_id(value: impl Into<String>) -> Self {
        Error::InvalidDeviceId {
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
