//! Per-run session state
//!
//! A `Session` is created when a scenario starts and threaded `&mut` through
//! every step. Login and registration store the bearer token here; every later
//! authorized request reads it back.

use url::Url;

/// Number of token characters shown in console narration
const TOKEN_PREVIEW_CHARS: usize = 20;

#[derive(Debug, Clone)]
pub struct Session {
    base_url: Url,
    token: Option<String>,
    user_id: Option<u64>,
}

impl Session {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            user_id: None,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    /// Store credentials from a successful login or registration
    pub fn authenticate(&mut self, token: impl Into<String>, user_id: Option<u64>) {
        self.token = Some(token.into());
        self.user_id = user_id;
    }
}

/// Shorten a token for display: first 20 characters plus `...`
pub fn token_preview(token: &str) -> String {
    match token.char_indices().nth(TOKEN_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &token[..idx]),
        None => token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(Url::parse("http://localhost:8080/").unwrap())
    }

    #[test]
    fn test_new_session_is_anonymous() {
        let s = session();
        assert_eq!(s.token(), None);
        assert_eq!(s.user_id(), None);
    }

    #[test]
    fn test_authenticate_stores_token() {
        let mut s = session();
        s.authenticate("abc.def.ghi", Some(12));
        assert_eq!(s.token(), Some("abc.def.ghi"));
        assert_eq!(s.user_id(), Some(12));
    }

    #[test]
    fn test_reauthenticate_replaces_user() {
        let mut s = session();
        s.authenticate("first", Some(1));
        s.authenticate("second", None);
        assert_eq!(s.token(), Some("second"));
        assert_eq!(s.user_id(), None);
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("short"), "short");
        assert_eq!(
            token_preview("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"),
            "eyJhbGciOiJIUzI1NiIs..."
        );
        // multi-byte characters are never split
        let wide = "令牌".repeat(15);
        assert_eq!(token_preview(&wide).chars().count(), 23);
    }
}
