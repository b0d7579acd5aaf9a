//! Client-side session propagation
//!
//! Holds the bearer token for the lifetime of the application and hands it
//! to every outgoing request.
//!
//! ## Core Components
//!
//! - **Session**: cloneable handle over the current token, passed explicitly
//!   to whatever issues requests (no process-wide global)
//! - **TokenClaims**: unverified view of the token payload, used to derive the
//!   user identifier for display and routing
//! - **SessionStore**: local key-value persistence for the token and the
//!   cached user id (`MemoryStore`, `FileStore`)
//!
//! ## Trust model
//!
//! No signature verification happens here. The derived user id is a
//! convenience for the client, never an authorization decision. Malformed
//! tokens degrade to "no identifier" instead of failing.
//!
//! ## Usage
//!
//! ```rust
//! use session_core::{MemoryStore, Session};
//! use std::sync::Arc;
//!
//! let session = Session::new(Arc::new(MemoryStore::default()));
//! assert!(session.user_id().is_none());
//!
//! // header {"alg":"none"}, payload {"sub":"u1"}
//! session.set_token(Some("eyJhbGciOiJub25lIn0.eyJzdWIiOiJ1MSJ9.sig".to_string())).unwrap();
//! assert_eq!(session.user_id().as_deref(), Some("u1"));
//! ```

mod claims;
mod error;
mod session;
mod store;

pub use claims::{decode_unverified, TokenClaims};
pub use error::{Result, SessionError};
pub use session::{Session, DEFAULT_PUBLIC_PATHS};
pub use store::{FileStore, MemoryStore, SessionStore, TOKEN_KEY, USER_ID_KEY};
