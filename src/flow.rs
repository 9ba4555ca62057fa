use std::convert::TryFrom;

use http::Method;
use tracing::{debug, warn};

use crate::endpoints::Endpoints;
use crate::error::{Error, Result, TokenExchangeError};
use crate::request::{RequestBuilder, SignaturePlacement};
use crate::secrets::{Credential, Token};
use crate::store::{AuthorizationStatus, TokenStore};
use crate::token_reader::TokenResponse;
use crate::transport::Transport;
use crate::OAUTH_TOKEN_KEY;

/// Drives the three-legged handshake and owns every status transition.
///
/// Token-endpoint calls are signed with the protocol parameters in the URI
/// query by default; see [`AuthorizationFlow::placement`].
pub struct AuthorizationFlow<S, T> {
    credential: Credential,
    endpoints: Endpoints,
    store: S,
    transport: T,
    return_url: String,
    placement: SignaturePlacement,
}

impl<S, T> AuthorizationFlow<S, T>
where
    S: TokenStore,
    T: Transport,
{
    /// `return_url` is where the caller sends the user after a completed
    /// handshake. The store is initialised on construction so a missing
    /// status reads as `NotStarted`.
    pub fn new<U>(
        credential: Credential,
        endpoints: Endpoints,
        store: S,
        transport: T,
        return_url: U,
    ) -> Self
    where
        U: Into<String>,
    {
        let flow = AuthorizationFlow {
            credential,
            endpoints,
            store,
            transport,
            return_url: return_url.into(),
            placement: SignaturePlacement::Query,
        };
        flow.store.initialise();
        flow
    }

    /// Signature placement used for token-endpoint calls.
    pub fn placement(self, placement: SignaturePlacement) -> Self {
        AuthorizationFlow { placement, ..self }
    }

    /// Obtain a temporary request token and store it as pending.
    ///
    /// Returns the authorization URL (with `oauth_token` appended) the user
    /// must be redirected to. A transport or parse failure here leaves stored
    /// state exactly as it was.
    pub async fn request_token(&self, callback: Option<&str>) -> Result<String> {
        let url = self.endpoints.request_token_url();
        let mut builder = RequestBuilder::new(&self.credential).placement(self.placement);
        if let Some(callback) = callback {
            builder = builder.callback(callback.to_string());
        }
        let request = builder.build(Method::POST, &url, None)?;

        debug!(url = %url, "requesting temporary token");
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(TokenExchangeError::Transport)?;
        if !response.status.is_success() {
            return Err(TokenExchangeError::Endpoint {
                status: response.status,
                body: response.body,
            }
            .into());
        }
        let parsed = TokenResponse::parse(&response.body)?;

        self.store.set_token(&parsed.oauth_token);
        self.store.set_secret(&parsed.oauth_token_secret);
        self.store
            .set_status(AuthorizationStatus::PendingAuthorization);
        debug!("temporary token stored, authorization pending");

        Ok(format!(
            "{}?{}={}",
            self.endpoints.authorize_url(),
            OAUTH_TOKEN_KEY,
            parsed.oauth_token
        ))
    }

    /// Exchange the pending request token for an access token.
    ///
    /// Returns the configured return URL the user should be redirected to.
    /// On a transport or parse failure the stored handshake is cleared and
    /// reset to `NotStarted` before the failure is surfaced. When another
    /// call completes the exchange first, the loser fails with
    /// `TokenExchangeError::Superseded` and the winner's token survives.
    pub async fn access_token(&self, verifier: Option<&str>) -> Result<String> {
        let pending = match (self.store.token(), self.store.secret()) {
            (Some(key), Some(secret)) => Token::new(key, secret),
            _ => return Err(TokenExchangeError::MissingRequestToken.into()),
        };

        let url = self.endpoints.access_token_url();
        let mut builder = RequestBuilder::new(&self.credential)
            .token(&pending)
            .placement(self.placement);
        if let Some(verifier) = verifier {
            builder = builder.verifier(verifier.to_string());
        }
        let request = builder.build(Method::POST, &url, None)?;

        debug!(url = %url, "exchanging request token for access token");
        let response = match self.transport.execute(request).await {
            Ok(response) if response.status.is_success() => response,
            Ok(response) => {
                return Err(self.fail_exchange(TokenExchangeError::Endpoint {
                    status: response.status,
                    body: response.body,
                }))
            }
            Err(err) => return Err(self.fail_exchange(TokenExchangeError::Transport(err))),
        };
        let parsed = match TokenResponse::parse(&response.body) {
            Ok(parsed) => parsed,
            Err(err) => return Err(self.fail_exchange(err)),
        };

        if !self.store.compare_and_set_status(
            AuthorizationStatus::PendingAuthorization,
            AuthorizationStatus::Authorized,
        ) {
            return Err(TokenExchangeError::Superseded.into());
        }
        self.store.set_token(&parsed.oauth_token);
        self.store.set_secret(&parsed.oauth_token_secret);
        debug!("access token stored, handshake authorized");

        Ok(self.return_url.clone())
    }

    // Access-token failures clear the stored handshake before surfacing.
    // Request-token failures intentionally do not (historical behavior,
    // asserted in tests).
    fn fail_exchange(&self, err: TokenExchangeError) -> Error {
        warn!(error = %err, "access token exchange failed, resetting handshake");
        self.store.set_last_failure(&err.to_string());
        self.store.clear_token_data();
        self.store.set_status(AuthorizationStatus::NotStarted);
        err.into()
    }

    /// Inject a token/secret pair obtained out of band, optionally forcing
    /// the stored status (integer form, as persisted). The status is
    /// validated before anything is written.
    pub fn set_current_access_token(
        &self,
        token: &str,
        secret: &str,
        status: Option<u8>,
    ) -> Result<()> {
        let status = match status {
            Some(value) => Some(AuthorizationStatus::try_from(value)?),
            None => None,
        };
        self.store.set_token(token);
        self.store.set_secret(secret);
        if let Some(status) = status {
            self.store.set_status(status);
        }
        Ok(())
    }

    /// Clear stored token data and return to `NotStarted`. Idempotent.
    pub fn logout(&self) {
        self.store.clear_token_data();
        self.store.set_status(AuthorizationStatus::NotStarted);
        debug!("handshake state cleared");
    }

    /// Current handshake status; `NotStarted` when the store holds none.
    pub fn status(&self) -> AuthorizationStatus {
        self.store
            .status()
            .unwrap_or(AuthorizationStatus::NotStarted)
    }

    pub fn is_authorized(&self) -> bool {
        self.status() == AuthorizationStatus::Authorized
    }

    pub fn is_pending_authorization(&self) -> bool {
        self.status() == AuthorizationStatus::PendingAuthorization
    }

    pub fn is_not_started(&self) -> bool {
        self.status() == AuthorizationStatus::NotStarted
    }

    pub fn return_url(&self) -> &str {
        &self.return_url
    }

    pub(crate) fn credential(&self) -> &Credential {
        &self.credential
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }
}
