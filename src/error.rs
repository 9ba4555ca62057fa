use http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type SignResult<T> = std::result::Result<T, SignError>;
pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("request signing failed : {0}")]
    Sign(#[from] SignError),
    #[error("token exchange failed : {0}")]
    TokenExchange(#[from] TokenExchangeError),
    #[error("{0}")]
    InvalidStatus(#[from] InvalidStatusError),
    #[error("request failed : {0}")]
    Transport(#[from] TransportError),
}

/// Malformed signing input. These are programming errors and are never
/// caught internally.
#[derive(Error, Debug, Clone)]
pub enum SignError {
    #[error("signing requires a non-empty HTTP method")]
    EmptyMethod,
    #[error("signing requires a non-empty URL")]
    EmptyUrl,
    #[error("request URL could not be parsed : {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("form body could not be encoded : {0}")]
    InvalidForm(String),
}

#[derive(Error, Debug)]
pub enum TokenExchangeError {
    #[error("token endpoint call failed : {0}")]
    Transport(#[from] TransportError),
    #[error("token endpoint responded {status} : {body}")]
    Endpoint { status: StatusCode, body: String },
    #[error("token response is missing {0} : {1}")]
    MissingKey(&'static str, String),
    #[error("no pending request token is stored")]
    MissingRequestToken,
    #[error("the pending token was already exchanged by a concurrent call")]
    Superseded,
}

/// The persisted status value is outside the defined range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("undefined authorization status value : {0}")]
pub struct InvalidStatusError(pub u8);

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{0}")]
    Io(String),
    #[error("server responded {status} : {body}")]
    Status { status: StatusCode, body: String },
}
