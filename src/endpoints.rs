/// Endpoint configuration for the three-legged handshake.
///
/// A final endpoint URL is the plain concatenation of the base URL and a
/// path. No separator normalization is applied, so the base URL carries the
/// trailing slash (or the paths carry leading ones).
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
    request_token_path: String,
    authorize_path: String,
    access_token_path: String,
}

impl Endpoints {
    /// Paths default to `request_token`, `authorize` and `access_token`
    /// relative to `base_url`.
    pub fn new<T>(base_url: T) -> Self
    where
        T: Into<String>,
    {
        Endpoints {
            base_url: base_url.into(),
            request_token_path: "request_token".to_string(),
            authorize_path: "authorize".to_string(),
            access_token_path: "access_token".to_string(),
        }
    }

    /// Set the request token path.
    pub fn request_token_path<T>(self, path: T) -> Self
    where
        T: Into<String>,
    {
        Endpoints {
            request_token_path: path.into(),
            ..self
        }
    }

    /// Set the authorize path.
    pub fn authorize_path<T>(self, path: T) -> Self
    where
        T: Into<String>,
    {
        Endpoints {
            authorize_path: path.into(),
            ..self
        }
    }

    /// Set the access token path.
    pub fn access_token_path<T>(self, path: T) -> Self
    where
        T: Into<String>,
    {
        Endpoints {
            access_token_path: path.into(),
            ..self
        }
    }

    pub fn request_token_url(&self) -> String {
        format!("{}{}", self.base_url, self.request_token_path)
    }

    pub fn authorize_url(&self) -> String {
        format!("{}{}", self.base_url, self.authorize_path)
    }

    pub fn access_token_url(&self) -> String {
        format!("{}{}", self.base_url, self.access_token_path)
    }
}
