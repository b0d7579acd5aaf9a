//! Session lifecycle tests
//!
//! Login → token persisted → requests authorized → logout → nothing attached.

use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Url};
use session_core::{FileStore, MemoryStore, Session, SessionStore, TOKEN_KEY, USER_ID_KEY};

fn make_token(payload: &str) -> String {
    format!(
        "{}.{}.{}",
        general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#),
        general_purpose::URL_SAFE_NO_PAD.encode(payload),
        general_purpose::URL_SAFE_NO_PAD.encode("not-checked")
    )
}

fn token_for(user_id: &str, exp: i64) -> String {
    make_token(&format!(r#"{{"sub":"{}","exp":{},"token_type":"access"}}"#, user_id, exp))
}

fn request(method: Method, url: &str) -> reqwest::Request {
    reqwest::Request::new(method, Url::parse(url).unwrap())
}

#[test]
fn test_user_id_follows_sub_claim() {
    let session = Session::new(Arc::new(MemoryStore::default()));

    for user_id in ["u1", "7c9e6679-7425-40de-944b-e07fc1f90ae7", "user_with.dots"] {
        session
            .set_token(Some(make_token(&format!(r#"{{"sub":"{}"}}"#, user_id))))
            .unwrap();
        assert_eq!(session.user_id().as_deref(), Some(user_id));
    }
}

#[test]
fn test_user_id_recomputed_when_token_changes() {
    let session = Session::new(Arc::new(MemoryStore::default()));
    let exp = (Utc::now() + Duration::hours(1)).timestamp();

    session.set_token(Some(token_for("alice", exp))).unwrap();
    assert_eq!(session.user_id().as_deref(), Some("alice"));

    session.set_token(Some(token_for("bob", exp))).unwrap();
    assert_eq!(session.user_id().as_deref(), Some("bob"));

    session.set_token(Some("opaque-token".to_string())).unwrap();
    assert_eq!(session.user_id(), None);
    assert!(session.is_authenticated());

    session.set_token(None).unwrap();
    assert_eq!(session.user_id(), None);
}

#[test]
fn test_malformed_tokens_degrade_to_no_identifier() {
    let session = Session::new(Arc::new(MemoryStore::default()));
    let malformed = [
        "".to_string(),
        "abc".to_string(),
        "a.b".to_string(),
        "a.%%%.c".to_string(),
        format!("a.{}.c", general_purpose::URL_SAFE_NO_PAD.encode("{broken json")),
        make_token(r#"{"name":"no subject"}"#),
        make_token(r#"["u9",1,2]"#),
        make_token(r#""u9""#),
    ];

    for token in malformed {
        session.set_token(Some(token)).unwrap();
        assert_eq!(session.user_id(), None);
        assert!(!session.is_expired());
    }
}

#[test]
fn test_expired_token_is_not_authenticated() {
    let session = Session::new(Arc::new(MemoryStore::default()));
    let expired = token_for("alice", (Utc::now() - Duration::minutes(5)).timestamp());

    session.set_token(Some(expired.clone())).unwrap();
    assert!(session.is_expired());
    assert!(!session.is_authenticated());
    // still held and sent; the server's 401 is the caller's to act on
    assert_eq!(session.token(), Some(expired));
    assert_eq!(session.user_id().as_deref(), Some("alice"));

    let mut req = request(Method::GET, "https://api.example.com/feed");
    assert!(session.authorize(&mut req));
}

#[test]
fn test_clones_share_token() {
    let session = Session::new(Arc::new(MemoryStore::default()));
    let view = session.clone();

    session.set_token(Some(make_token(r#"{"sub":"u1"}"#))).unwrap();
    assert_eq!(view.user_id().as_deref(), Some("u1"));

    view.clear().unwrap();
    assert!(!session.is_authenticated());
}

#[test]
fn test_authorize_attaches_bearer_token() {
    let session = Session::new(Arc::new(MemoryStore::default()));
    let token = make_token(r#"{"sub":"u1"}"#);
    session.set_token(Some(token.clone())).unwrap();

    let mut req = request(Method::GET, "http://api.local/feed?limit=20");
    assert!(session.authorize(&mut req));
    assert_eq!(
        req.headers().get(AUTHORIZATION).unwrap().to_str().unwrap(),
        format!("Bearer {}", token)
    );
}

#[test]
fn test_authorize_without_token_leaves_request_untouched() {
    let session = Session::new(Arc::new(MemoryStore::default()));

    for url in [
        "http://api.local/feed",
        "http://api.local/posts/1",
        "http://api.local/auth/login",
    ] {
        let mut req = request(Method::GET, url);
        assert!(!session.authorize(&mut req));
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }
}

#[test]
fn test_authorize_skips_public_endpoints_with_token() {
    let session = Session::new(Arc::new(MemoryStore::default()));
    session
        .set_token(Some(make_token(r#"{"sub":"u1"}"#)))
        .unwrap();

    for url in [
        "http://api.local/auth/login",
        "http://api.local/auth/register",
        "http://api.local/api/v1/auth/login/",
    ] {
        let mut req = request(Method::POST, url);
        assert!(!session.authorize(&mut req), "{} must stay public", url);
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    let mut logout = request(Method::POST, "http://api.local/auth/logout");
    assert!(session.authorize(&mut logout));
}

#[test]
fn test_token_and_user_id_persisted_under_fixed_keys() {
    let store = Arc::new(MemoryStore::default());
    let session = Session::new(store.clone());

    session
        .set_token(Some(make_token(r#"{"sub":"u1"}"#)))
        .unwrap();
    assert!(store.load(TOKEN_KEY).unwrap().is_some());
    assert_eq!(store.load(USER_ID_KEY).unwrap().as_deref(), Some("u1"));

    session.set_token(Some("opaque".to_string())).unwrap();
    assert_eq!(store.load(TOKEN_KEY).unwrap().as_deref(), Some("opaque"));
    assert_eq!(store.load(USER_ID_KEY).unwrap(), None);

    session.clear().unwrap();
    assert_eq!(store.load(TOKEN_KEY).unwrap(), None);
    assert_eq!(store.load(USER_ID_KEY).unwrap(), None);
}

#[test]
fn test_restore_from_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let exp = (Utc::now() + Duration::hours(1)).timestamp();

    {
        let session = Session::new(Arc::new(FileStore::new(&path)));
        session.set_token(Some(token_for("u42", exp))).unwrap();
    }

    let restored = Session::restore(Arc::new(FileStore::new(&path))).unwrap();
    assert!(restored.is_authenticated());
    assert_eq!(restored.user_id().as_deref(), Some("u42"));
    assert!(!restored.is_expired());
}

#[test]
fn test_restore_drops_expired_token() {
    let store = Arc::new(MemoryStore::default());
    let exp = (Utc::now() - Duration::minutes(5)).timestamp();
    store.save(TOKEN_KEY, &token_for("u1", exp)).unwrap();
    store.save(USER_ID_KEY, "u1").unwrap();

    let session = Session::restore(store.clone()).unwrap();
    assert!(!session.is_authenticated());
    assert_eq!(store.load(TOKEN_KEY).unwrap(), None);
    assert_eq!(store.load(USER_ID_KEY).unwrap(), None);
}

#[test]
fn test_restore_keeps_opaque_token() {
    let store = Arc::new(MemoryStore::default());
    store.save(TOKEN_KEY, "opaque-token").unwrap();

    let session = Session::restore(store).unwrap();
    assert_eq!(session.token().as_deref(), Some("opaque-token"));
    assert_eq!(session.user_id(), None);
}

#[test]
fn test_restore_empty_store() {
    let session = Session::restore(Arc::new(MemoryStore::default())).unwrap();
    assert!(!session.is_authenticated());
}
