//! HTTP Basic authentication against the user directory.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use http::HeaderMap;

use graphfs_core::AppError;

/// Credentials extracted from a Basic `Authorization` header.
#[derive(Clone)]
pub struct BasicCredentials {
    pub username: String,
    /// Plaintext password from the header.
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Extract Basic credentials from HTTP headers.
pub fn extract_basic_credentials(headers: &HeaderMap) -> Result<BasicCredentials, AuthError> {
    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidHeader)?;

    let encoded = auth_str
        .strip_prefix("Basic ")
        .ok_or(AuthError::NotBasicAuth)?;
    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|_| AuthError::InvalidEncoding)?;

    let decoded_str = String::from_utf8(decoded).map_err(|_| AuthError::InvalidEncoding)?;

    let (username, password) = decoded_str
        .split_once(':')
        .ok_or(AuthError::InvalidFormat)?;

    Ok(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Malformed or missing credentials.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header present
    #[error("Missing Authorization header")]
    MissingHeader,

    /// Authorization header is not valid UTF-8
    #[error("Invalid Authorization header")]
    InvalidHeader,

    /// Not a Basic auth scheme
    #[error("Not Basic authentication")]
    NotBasicAuth,

    /// Base64 decoding failed
    #[error("Invalid base64 encoding")]
    InvalidEncoding,

    /// Credentials format invalid (missing colon)
    #[error("Invalid credentials format")]
    InvalidFormat,
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingHeader | AuthError::NotBasicAuth => {
                AppError::authentication("Authentication required")
            }
            _ => AppError::authentication(format!("Invalid authentication: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphfs_core::ErrorKind;
    use http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extracts_credentials() {
        let encoded = BASE64.encode("alice:s3:cret");
        let creds = extract_basic_credentials(&headers(&format!("Basic {encoded}"))).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "s3:cret");
        assert!(!format!("{creds:?}").contains("s3:cret"));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(
            extract_basic_credentials(&HeaderMap::new()),
            Err(AuthError::MissingHeader)
        ));
        assert!(matches!(
            extract_basic_credentials(&headers("Bearer abc")),
            Err(AuthError::NotBasicAuth)
        ));
        assert!(matches!(
            extract_basic_credentials(&headers("Basic !!!")),
            Err(AuthError::InvalidEncoding)
        ));
        let no_colon = BASE64.encode("alice");
        let err = extract_basic_credentials(&headers(&format!("Basic {no_colon}"))).unwrap_err();
        assert!(AppError::from(err).is(ErrorKind::Authentication));
    }
}
