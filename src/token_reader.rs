use std::collections::HashMap;

use serde::Deserialize;

use crate::error::TokenExchangeError;
use crate::secrets::Token;
use crate::{OAUTH_TOKEN_KEY, OAUTH_TOKEN_SECRET_KEY};

/// Response of a token endpoint (request-token or access-token exchange),
/// delivered as URL-encoded key/value pairs.
#[derive(Deserialize, Debug, Clone)]
pub struct TokenResponse {
    /// OAuth Token
    pub oauth_token: String,
    /// OAuth Token Secret
    pub oauth_token_secret: String,
    /// Other contents, e.g. `oauth_callback_confirmed`
    #[serde(flatten)]
    pub remain: HashMap<String, String>,
}

impl TokenResponse {
    /// Parse a token endpoint response body.
    pub fn parse(body: &str) -> Result<Self, TokenExchangeError> {
        serde_urlencoded::from_str::<TokenResponse>(body)
            .map_err(|_| TokenExchangeError::MissingKey(missing_key(body), body.to_string()))
    }

    /// The token pair, dropping the remaining response fields.
    pub fn into_token(self) -> Token {
        Token::new(self.oauth_token, self.oauth_token_secret)
    }
}

// Deserialization only fails when one of the two required keys is absent;
// report the first one the body does not carry.
fn missing_key(body: &str) -> &'static str {
    let has_token = body
        .split('&')
        .filter_map(|pair| pair.splitn(2, '=').next())
        .any(|key| key == OAUTH_TOKEN_KEY);
    if has_token {
        OAUTH_TOKEN_SECRET_KEY
    } else {
        OAUTH_TOKEN_KEY
    }
}
