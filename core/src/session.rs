//! Credentials and bearer token, plus the hook that persists them.

use crate::error::Result;
use crate::link::is_blank;
use crate::types::Credentials;

/// The credential/token triple the client signs on with.
///
/// `token` stays empty until the first successful sign-on and is replaced
/// in place whenever the client re-authenticates.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub password: String,
    pub token: String,
}

impl Session {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            token: String::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    pub fn has_token(&self) -> bool {
        !is_blank(Some(&self.token))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("has_token", &self.has_token())
            .finish_non_exhaustive()
    }
}

/// Durably saves a session. `save` must not return before the data is
/// stored; the client calls it right after every sign-on.
pub trait SessionStore {
    fn save(&mut self, session: &Session) -> Result<()>;
}

impl<F> SessionStore for F
where
    F: FnMut(&Session) -> Result<()>,
{
    fn save(&mut self, session: &Session) -> Result<()> {
        self(session)
    }
}

/// A store that keeps nothing, for one-off clients whose token need not
/// outlive them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ephemeral;

impl SessionStore for Ephemeral {
    fn save(&mut self, _session: &Session) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_no_token() {
        let session = Session::new("me", "pw");
        assert!(!session.has_token());
        assert!(!session.clone().with_token(" ").has_token());
        assert!(session.with_token("t1").has_token());
    }

    #[test]
    fn closures_are_stores() {
        let mut saved = Vec::new();
        {
            let mut store = |s: &Session| -> Result<()> {
                saved.push(s.token.clone());
                Ok(())
            };
            store.save(&Session::new("me", "pw").with_token("t1")).unwrap();
            store.save(&Session::new("me", "pw").with_token("t2")).unwrap();
        }
        assert_eq!(saved, vec!["t1", "t2"]);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let session = Session::new("me", "hunter2").with_token("secret-token");
        let dbg = format!("{session:?}");
        assert!(dbg.contains("me"));
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("secret-token"));
    }
}
