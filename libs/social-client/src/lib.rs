//! Typed REST client for the social network services
//!
//! One [`ApiClient`] carries the configuration, the connection pool and the
//! [`Session`]; every service wrapper is a method on it, so authorization,
//! status checking and body decoding happen in one place.
//!
//! ## Services
//!
//! - **auth**: login, register, refresh, logout
//! - **feed** / **posts** / **comments**: content, with paginated listings
//!   exposed as [`PaginatedCollection`]s
//! - **reactions**: typed reactions and per-type counters
//! - **relationships**: followers, following, follow/unfollow
//! - **notifications**: list, mark read, delete
//! - **users**: profiles, search, avatar upload
//! - **mentions**: `@user` tracking inside post and comment text
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use social_client::{ApiClient, ClientConfig, MemoryStore, Session};
//!
//! # async fn run() -> social_client::Result<()> {
//! let session = Session::new(Arc::new(MemoryStore::default()));
//! let client = ApiClient::new(ClientConfig::from_env()?, session)?;
//!
//! client.login("ana@example.com", "secret").await?;
//! let feed = client.feed();
//! feed.load_more().await?;
//! println!("{} posts", feed.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod comments;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod mentions;
pub mod models;
pub mod notifications;
pub mod posts;
pub mod reactions;
pub mod relationships;
pub mod users;

pub use comments::{CommentSource, ReplySource};
pub use config::{ClientConfig, Service};
pub use error::{ClientError, Result};
pub use feed::FeedSource;
pub use http::{ApiClient, Envelope};
pub use mentions::{
    active_mention_query, insert_mention, validate_mentions, Mention, MentionInsertion,
    MentionPicker, MentionQuery, PickerAction, PickerKey,
};
pub use models::{
    Attachment, AuthResponse, Comment, CommentLike, LoginRequest, MediaAttachment, NewComment,
    NewPost, Notification, NotificationKind, Post, PostUpdate, RegisterRequest, UserProfile,
    UserSummary,
};
pub use notifications::NotificationSource;
pub use posts::HashtagSource;
pub use reactions::{Reaction, ReactionSummary, ReactionTarget, ReactionType, TargetType};
pub use relationships::{FollowersSource, FollowingSource};
pub use users::UserSearchSource;

pub use cursor_pagination::{
    InfiniteScroll, LoadOutcome, PaginatedCollection, ScrollMetrics, SkipReason,
};
pub use session_core::{FileStore, MemoryStore, Session, SessionStore};
