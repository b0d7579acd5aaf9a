//! Session handle and request authorization

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::{debug, info, warn};

use crate::claims::{decode_unverified, TokenClaims};
use crate::error::Result;
use crate::store::{SessionStore, TOKEN_KEY, USER_ID_KEY};

/// Endpoints that never receive the bearer token
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &["/auth/login", "/auth/register"];

/// Current authenticated identity
///
/// Cheap to clone; clones share the same token. Created once at startup and
/// passed to whatever issues requests. Tests build their own isolated
/// instance over a `MemoryStore`.
///
/// The user id is never cached in memory: every call to [`Session::user_id`]
/// decodes the current token, so it always follows token changes.
#[derive(Clone)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
    store: Arc<dyn SessionStore>,
    public_paths: Arc<[String]>,
}

impl Session {
    /// Create an unauthenticated session over `store`
    ///
    /// The store is written on every token change but not read here; use
    /// [`Session::restore`] to pick up a persisted token.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            token: Arc::new(RwLock::new(None)),
            store,
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Create a session from the token persisted in `store`
    ///
    /// An expired token is dropped and removed from the store. A token whose
    /// payload cannot be decoded is kept: it is still a credential, it just
    /// has no derivable identifier.
    pub fn restore(store: Arc<dyn SessionStore>) -> Result<Self> {
        let session = Self::new(store);
        let Some(token) = session.store.load(TOKEN_KEY)? else {
            debug!("No persisted session token");
            return Ok(session);
        };

        let expired = decode_unverified(&token).is_some_and(|c| c.is_expired_at(Utc::now()));
        if expired {
            info!("Persisted session token expired, clearing");
            session.set_token(None)?;
        } else {
            // Refresh the cached id in case the store was written by an older build
            session.set_token(Some(token))?;
            info!(user_id = ?session.user_id(), "Session restored");
        }
        Ok(session)
    }

    /// Replace the list of endpoint paths that never get the token
    ///
    /// A request is public when its URL path ends with one of these.
    pub fn with_public_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the current token
    ///
    /// `None` (or an empty string) logs the session out. Memory is updated
    /// first; a storage failure is returned but the in-memory state already
    /// reflects the new token.
    pub fn set_token(&self, token: Option<String>) -> Result<()> {
        let token = token.filter(|t| !t.trim().is_empty());

        {
            let mut current = self.token.write().unwrap_or_else(PoisonError::into_inner);
            *current = token.clone();
        }

        match token {
            Some(token) => {
                self.store.save(TOKEN_KEY, &token)?;
                match decode_unverified(&token).and_then(|c| c.sub) {
                    Some(user_id) => self.store.save(USER_ID_KEY, &user_id)?,
                    None => self.store.remove(USER_ID_KEY)?,
                }
                debug!("Session token updated");
            }
            None => {
                self.store.remove(TOKEN_KEY)?;
                self.store.remove(USER_ID_KEY)?;
                debug!("Session token cleared");
            }
        }
        Ok(())
    }

    /// Log out locally
    pub fn clear(&self) -> Result<()> {
        self.set_token(None)
    }

    /// Current token, if any
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A token is held and has not passed its `exp`
    ///
    /// Expiry is only checked here and in [`Session::restore`]; an expired
    /// token stays in place and is still attached by [`Session::authorize`]
    /// until the caller refreshes or clears it.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some() && !self.is_expired()
    }

    /// Unverified claims of the current token
    pub fn claims(&self) -> Option<TokenClaims> {
        self.token().as_deref().and_then(decode_unverified)
    }

    /// Subject of the current token, or `None` when absent or undecodable
    pub fn user_id(&self) -> Option<String> {
        self.claims().and_then(|c| c.sub)
    }

    /// True when the current token carries an `exp` in the past
    pub fn is_expired(&self) -> bool {
        self.claims().is_some_and(|c| c.is_expired_at(Utc::now()))
    }

    /// Whether a URL path targets one of the public endpoints
    pub fn is_public_path(&self, path: &str) -> bool {
        let path = path.trim_end_matches('/');
        self.public_paths
            .iter()
            .any(|public| path.ends_with(public.trim_end_matches('/')))
    }

    /// Attach `Authorization: Bearer <token>` to `request`
    ///
    /// Leaves the request untouched when there is no token or the target is
    /// a public endpoint. Returns whether the header was attached.
    pub fn authorize(&self, request: &mut reqwest::Request) -> bool {
        if self.is_public_path(request.url().path()) {
            return false;
        }
        let Some(token) = self.token() else {
            return false;
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
                true
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Session token is not a valid header value, sending unauthenticated"
                );
                false
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("user_id", &self.user_id())
            .field("public_paths", &self.public_paths)
            .finish()
    }
}
