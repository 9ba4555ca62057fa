/*!
oauth1-flow: three-legged OAuth 1.0a, client side.

# Overview

This library implements the OAuth 1.0a authorization flow for client
applications: it obtains a temporary request token, hands back the
authorization URL the resource owner must visit, exchanges the approved
request token for an access token, and signs subsequent HTTP requests
(HMAC-SHA1) on behalf of the authorized identity.

Token persistence and request execution are consumed through two narrow
traits, [`TokenStore`] and [`Transport`]. The crate ships a `Mutex`-backed
[`MemoryTokenStore`] and a [`reqwest`]-backed [`ReqwestTransport`]; session or
database backends plug in by implementing the traits.

# How to use

## Walking the three legs

```no_run
use oauth1_flow::{
    AuthorizationFlow, Credential, Endpoints, MemoryTokenStore, OAuthClient, ReqwestTransport,
};

# async fn run() -> oauth1_flow::Result<()> {
let flow = AuthorizationFlow::new(
    Credential::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]"),
    Endpoints::new("https://provider.example/oauth/"),
    MemoryTokenStore::new(),
    ReqwestTransport::new(),
    "https://app.example/home",
);
let client = OAuthClient::new(flow);

// leg 1: acquire a request token, then send the user to this URL
let authorize_url = client
    .request_token(Some("https://app.example/callback"))
    .await?;

// leg 3, once the user approved: exchange for the access token
let home_url = client.access_token(Some("[VERIFIER]")).await?;

// signed API calls from here on
let profile = client.get("https://provider.example/api/profile.json").await?;
# Ok(())
# }
```

## Restoring an authorized session

```no_run
use oauth1_flow::{
    AuthorizationFlow, AuthorizationStatus, Credential, Endpoints, MemoryTokenStore, OAuthClient,
    ReqwestTransport,
};

# fn run() -> oauth1_flow::Result<()> {
let flow = AuthorizationFlow::new(
    Credential::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]"),
    Endpoints::new("https://provider.example/oauth/"),
    MemoryTokenStore::new(),
    ReqwestTransport::new(),
    "https://app.example/home",
);
let client = OAuthClient::new(flow);

// token pair loaded from long-term storage
client.set_current_access_token(
    "[ACCESS_TOKEN]",
    "[TOKEN_SECRET]",
    Some(AuthorizationStatus::Authorized.as_u8()),
)?;
assert!(client.is_authorized());
# Ok(())
# }
```
*/
mod client;
mod endpoints;
mod error;
mod flow;
mod request;
mod secrets;
mod signer;
mod store;
mod token_reader;
mod transport;

// exposed to external program
pub use client::OAuthClient;
pub use endpoints::Endpoints;
pub use error::{
    Error, InvalidStatusError, Result, SignError, SignResult, TokenExchangeError, TransportError,
    TransportResult,
};
pub use flow::AuthorizationFlow;
pub use request::{RequestBuilder, SignaturePlacement, SignedRequest};
pub use secrets::{Credential, Token};
pub use signer::{normalize_params, oauth_encode, sign};
pub use store::{AuthorizationStatus, MemoryTokenStore, TokenStore};
pub use token_reader::TokenResponse;
pub use transport::{ReqwestTransport, Transport, TransportResponse};

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";
/// Represents `realm`.
pub const REALM_KEY: &str = "realm";

// crate-private constant variables
pub(crate) const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
pub(crate) const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
pub(crate) const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
pub(crate) const OAUTH_TOKEN_KEY: &str = "oauth_token";
pub(crate) const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";
pub(crate) const SIGNATURE_METHOD_VALUE: &str = "HMAC-SHA1";
pub(crate) const VERSION_VALUE: &str = "1.0";
