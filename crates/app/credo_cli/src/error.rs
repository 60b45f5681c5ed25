use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("Json: {}", .0)]
    Json(#[from] serde_json::Error),

    #[error("Config: {}", .0)]
    Config(#[from] credo_core::config::ConfigError),

    #[error("{}", .0)]
    Auth(#[from] credo_core::auth::AuthError),
}

impl From<credo_core::auth::ValidationError> for Error {
    fn from(e: credo_core::auth::ValidationError) -> Self {
        Error::Auth(e.into())
    }
}

impl From<credo_core::auth::HashError> for Error {
    fn from(e: credo_core::auth::HashError) -> Self {
        Error::Auth(e.into())
    }
}

impl From<credo_core::auth::TokenError> for Error {
    fn from(e: credo_core::auth::TokenError) -> Self {
        Error::Auth(e.into())
    }
}
