use http::header::HeaderMap;
use http::Method;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SignError, TransportError};
use crate::flow::AuthorizationFlow;
use crate::request::{RequestBuilder, SignaturePlacement};
use crate::secrets::Token;
use crate::store::{AuthorizationStatus, TokenStore};
use crate::transport::Transport;

/// Public façade: the three-legged handshake plus signed GET/POST/PUT/DELETE
/// helpers for the authorized API.
pub struct OAuthClient<S, T> {
    flow: AuthorizationFlow<S, T>,
    request_base_url: Option<String>,
    placement: SignaturePlacement,
}

impl<S, T> OAuthClient<S, T>
where
    S: TokenStore,
    T: Transport,
{
    pub fn new(flow: AuthorizationFlow<S, T>) -> Self {
        OAuthClient {
            flow,
            request_base_url: None,
            placement: SignaturePlacement::Query,
        }
    }

    /// Prefix applied verbatim to every URL passed to the request helpers.
    pub fn request_base_url<U>(self, base_url: U) -> Self
    where
        U: Into<String>,
    {
        OAuthClient {
            request_base_url: Some(base_url.into()),
            ..self
        }
    }

    /// Default signature placement for API calls. `post` overrides this per
    /// call.
    pub fn placement(self, placement: SignaturePlacement) -> Self {
        OAuthClient { placement, ..self }
    }

    pub fn flow(&self) -> &AuthorizationFlow<S, T> {
        &self.flow
    }

    // ------------------------------------------------------------------------
    // Handshake, delegated to the flow

    pub async fn request_token(&self, callback: Option<&str>) -> Result<String> {
        self.flow.request_token(callback).await
    }

    pub async fn access_token(&self, verifier: Option<&str>) -> Result<String> {
        self.flow.access_token(verifier).await
    }

    pub fn set_current_access_token(
        &self,
        token: &str,
        secret: &str,
        status: Option<u8>,
    ) -> Result<()> {
        self.flow.set_current_access_token(token, secret, status)
    }

    pub fn logout(&self) {
        self.flow.logout()
    }

    pub fn status(&self) -> AuthorizationStatus {
        self.flow.status()
    }

    pub fn is_authorized(&self) -> bool {
        self.flow.is_authorized()
    }

    pub fn is_pending_authorization(&self) -> bool {
        self.flow.is_pending_authorization()
    }

    pub fn is_not_started(&self) -> bool {
        self.flow.is_not_started()
    }

    // ------------------------------------------------------------------------
    // Signed API calls

    /// Signed GET; returns the raw response body.
    pub async fn get(&self, url: &str) -> Result<String> {
        self.execute(Method::GET, url, None, self.placement, None)
            .await
    }

    /// Signed form POST; returns the raw response body.
    ///
    /// The signature goes into the `Authorization` header unless `placement`
    /// overrides it, some endpoints reject body-bearing signed headers and
    /// want the query form instead.
    pub async fn post<F>(
        &self,
        url: &str,
        form: &F,
        placement: Option<SignaturePlacement>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<String>
    where
        F: Serialize + ?Sized,
    {
        let body = encode_form(form)?;
        self.execute(
            Method::POST,
            url,
            Some(body),
            placement.unwrap_or(SignaturePlacement::Header),
            extra_headers,
        )
        .await
    }

    /// Signed form PUT; returns the raw response body.
    pub async fn put<F>(&self, url: &str, form: &F) -> Result<String>
    where
        F: Serialize + ?Sized,
    {
        let body = encode_form(form)?;
        self.execute(Method::PUT, url, Some(body), self.placement, None)
            .await
    }

    /// Signed DELETE; returns the raw response body.
    pub async fn delete(&self, url: &str) -> Result<String> {
        self.execute(Method::DELETE, url, None, self.placement, None)
            .await
    }

    /// Most recent request failure message; cleared by this read.
    pub fn last_failure(&self) -> Option<String> {
        self.flow.store().take_last_failure()
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        placement: SignaturePlacement,
        extra_headers: Option<HeaderMap>,
    ) -> Result<String> {
        let url = self.resolve_url(url);
        let token = match (self.flow.store().token(), self.flow.store().secret()) {
            (Some(key), Some(secret)) => Some(Token::new(key, secret)),
            _ => None,
        };

        let mut builder = RequestBuilder::new(self.flow.credential()).placement(placement);
        if let Some(ref token) = token {
            builder = builder.token(token);
        }
        let mut request = builder.build(method, &url, body.as_deref())?;
        if let Some(extra) = extra_headers {
            request.headers.extend(extra);
        }

        debug!(method = %request.method, url = %url, "executing signed request");
        match self.flow.transport().execute(request).await {
            Ok(response) if response.status.is_success() => Ok(response.body),
            Ok(response) => {
                let err = TransportError::Status {
                    status: response.status,
                    body: response.body,
                };
                self.flow.store().set_last_failure(&err.to_string());
                Err(err.into())
            }
            Err(err) => {
                self.flow.store().set_last_failure(&err.to_string());
                Err(err.into())
            }
        }
    }

    fn resolve_url(&self, url: &str) -> String {
        match self.request_base_url {
            Some(ref base_url) => format!("{}{}", base_url, url),
            None => url.to_string(),
        }
    }
}

fn encode_form<F>(form: &F) -> Result<String>
where
    F: Serialize + ?Sized,
{
    serde_urlencoded::to_string(form)
        .map_err(|err| SignError::InvalidForm(err.to_string()).into())
}
