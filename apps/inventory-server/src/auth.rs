//! HTTP Basic credentials.
//!
//! ```text
//! Authorization: Basic base64(username ":" password)
//! ```
//!
//! The password may itself contain ':'; only the first one separates.

use axum::http::HeaderValue;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Username and password taken from the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// password is never printed
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Parses a `Basic` authorization header.
///
/// ## Returns
/// `None` for any other scheme or malformed value; the caller treats
/// that the same as a missing header.
pub fn parse_basic(header: &HeaderValue) -> Option<Credentials> {
    let value = header.to_str().ok()?.trim();
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    if username.is_empty() {
        return None;
    }

    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// `WWW-Authenticate` value for a 401.
pub fn challenge(realm: &str) -> String {
    format!("Basic realm=\"{}\"", realm.replace('"', "'"))
}

/// Builds a header value; used by tests and clients.
pub fn basic_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let header = HeaderValue::from_str(&basic_header("admin", "a:b:c")).unwrap();
        let creds = parse_basic(&header).unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password, "a:b:c");
    }

    #[test]
    fn test_rejects_other_schemes() {
        let header = HeaderValue::from_static("Bearer abc.def");
        assert!(parse_basic(&header).is_none());

        let header = HeaderValue::from_static("Basic !!!notbase64");
        assert!(parse_basic(&header).is_none());

        // no colon
        let header = HeaderValue::from_str(&format!("Basic {}", STANDARD.encode("admin"))).unwrap();
        assert!(parse_basic(&header).is_none());
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials {
            username: "admin".into(),
            password: "FerretAdmin2024$".into(),
        };
        assert!(!format!("{creds:?}").contains("Ferret"));
    }

    #[test]
    fn test_challenge() {
        assert_eq!(challenge("InventarioService"), "Basic realm=\"InventarioService\"");
    }
}
