use std::convert::TryFrom;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::InvalidStatusError;

/// Progress of the three-legged handshake. Exactly one value is current at
/// any time; the integer form is what persistence backends store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotStarted = 0,
    PendingAuthorization = 1,
    Authorized = 2,
    AuthorizationFailed = 3,
}

impl AuthorizationStatus {
    /// Integer form used by persistence backends.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for AuthorizationStatus {
    type Error = InvalidStatusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AuthorizationStatus::NotStarted),
            1 => Ok(AuthorizationStatus::PendingAuthorization),
            2 => Ok(AuthorizationStatus::Authorized),
            3 => Ok(AuthorizationStatus::AuthorizationFailed),
            other => Err(InvalidStatusError(other)),
        }
    }
}

/// Durable storage for the current token, its secret and the handshake
/// status.
///
/// Implementations must provide read-after-write consistency per token
/// identity. Backends shared between concurrent requests must override
/// `compare_and_set_status` with an atomic version, otherwise two requests
/// finishing the handshake at once can race each other into a lost update.
pub trait TokenStore: Send + Sync {
    /// Ensure a default `NotStarted` status exists when none is present.
    fn initialise(&self);

    fn has_token_data(&self) -> bool {
        self.token().is_some() && self.secret().is_some()
    }

    fn token(&self) -> Option<String>;

    fn secret(&self) -> Option<String>;

    fn set_token(&self, token: &str);

    fn set_secret(&self, secret: &str);

    /// Remove the stored token and secret.
    fn clear_token_data(&self);

    fn status(&self) -> Option<AuthorizationStatus>;

    fn set_status(&self, status: AuthorizationStatus);

    /// Transition `expected -> next`, returning whether the write happened.
    ///
    /// The default is a plain read-then-write.
    fn compare_and_set_status(
        &self,
        expected: AuthorizationStatus,
        next: AuthorizationStatus,
    ) -> bool {
        if self.status() == Some(expected) {
            self.set_status(next);
            true
        } else {
            false
        }
    }

    /// Record the most recent request failure message.
    fn set_last_failure(&self, message: &str);

    /// The most recent failure message; cleared by this read.
    fn take_last_failure(&self) -> Option<String>;
}

impl<S> TokenStore for Arc<S>
where
    S: TokenStore + ?Sized,
{
    fn initialise(&self) {
        (**self).initialise()
    }

    fn has_token_data(&self) -> bool {
        (**self).has_token_data()
    }

    fn token(&self) -> Option<String> {
        (**self).token()
    }

    fn secret(&self) -> Option<String> {
        (**self).secret()
    }

    fn set_token(&self, token: &str) {
        (**self).set_token(token)
    }

    fn set_secret(&self, secret: &str) {
        (**self).set_secret(secret)
    }

    fn clear_token_data(&self) {
        (**self).clear_token_data()
    }

    fn status(&self) -> Option<AuthorizationStatus> {
        (**self).status()
    }

    fn set_status(&self, status: AuthorizationStatus) {
        (**self).set_status(status)
    }

    fn compare_and_set_status(
        &self,
        expected: AuthorizationStatus,
        next: AuthorizationStatus,
    ) -> bool {
        (**self).compare_and_set_status(expected, next)
    }

    fn set_last_failure(&self, message: &str) {
        (**self).set_last_failure(message)
    }

    fn take_last_failure(&self) -> Option<String> {
        (**self).take_last_failure()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    token: Option<String>,
    secret: Option<String>,
    status: Option<AuthorizationStatus>,
    last_failure: Option<String>,
}

/// Mutex-backed store, suitable for tests and single-process deployments.
/// Status transitions through `compare_and_set_status` are atomic under the
/// lock.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    state: Mutex<StoreState>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    // a poisoned lock still yields usable state
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn initialise(&self) {
        let mut state = self.lock();
        if state.status.is_none() {
            state.status = Some(AuthorizationStatus::NotStarted);
        }
    }

    fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    fn secret(&self) -> Option<String> {
        self.lock().secret.clone()
    }

    fn set_token(&self, token: &str) {
        self.lock().token = Some(token.to_string());
    }

    fn set_secret(&self, secret: &str) {
        self.lock().secret = Some(secret.to_string());
    }

    fn clear_token_data(&self) {
        let mut state = self.lock();
        state.token = None;
        state.secret = None;
    }

    fn status(&self) -> Option<AuthorizationStatus> {
        self.lock().status
    }

    fn set_status(&self, status: AuthorizationStatus) {
        self.lock().status = Some(status);
    }

    fn compare_and_set_status(
        &self,
        expected: AuthorizationStatus,
        next: AuthorizationStatus,
    ) -> bool {
        let mut state = self.lock();
        if state.status == Some(expected) {
            state.status = Some(next);
            true
        } else {
            false
        }
    }

    fn set_last_failure(&self, message: &str) {
        self.lock().last_failure = Some(message.to_string());
    }

    fn take_last_failure(&self) -> Option<String> {
        self.lock().last_failure.take()
    }
}
