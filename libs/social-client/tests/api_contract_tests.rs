//! HTTP contract tests against a mock server
//!
//! Cover session propagation (which requests carry the bearer token),
//! error mapping by content type, envelopes and local validation.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};
use social_client::{
    ApiClient, ClientConfig, ClientError, MemoryStore, Mention, NewComment, NewPost,
    ReactionTarget, ReactionType, Session,
};
use wiremock::matchers::{any, body_partial_json, header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests without an Authorization header
struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

/// Matches multipart bodies containing every given fragment
struct MultipartContaining(Vec<&'static str>);

impl Match for MultipartContaining {
    fn matches(&self, request: &Request) -> bool {
        let is_multipart = request
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&request.body);
        is_multipart && self.0.iter().all(|fragment| body.contains(fragment))
    }
}

fn token_for(sub: &str) -> String {
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
        URL_SAFE_NO_PAD.encode(json!({ "sub": sub }).to_string())
    )
}

fn post_json(id: &str, content: &str) -> Value {
    json!({
        "id": id,
        "authorId": "u1",
        "content": content,
        "createdAt": "2024-05-01T10:00:00Z"
    })
}

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let config = ClientConfig::with_base_url(&server.uri()).unwrap();
    let session = Session::new(Arc::new(MemoryStore::default()));
    let client = ApiClient::new(config, session).unwrap();
    (server, client)
}

async fn signed_in(sub: &str) -> (MockServer, ApiClient, String) {
    let (server, client) = setup().await;
    let token = token_for(sub);
    client.session().set_token(Some(token.clone())).unwrap();
    (server, client, token)
}

#[tokio::test]
async fn test_authenticated_request_carries_bearer_token() {
    let (server, client, token) = signed_in("u1").await;

    Mock::given(method("GET"))
        .and(path("/posts/p1"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": post_json("p1", "hi") })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let post = client.get_post("p1").await.unwrap();
    assert_eq!(post.id, "p1");
}

#[tokio::test]
async fn test_anonymous_request_has_no_authorization() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/posts/p1"))
        .and(NoAuthorization)
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": post_json("p1", "hi") })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.get_post("p1").await.unwrap();
}

#[tokio::test]
async fn test_login_is_public_and_stores_token() {
    // An old token is present but must not be sent to the login endpoint
    let (server, client, _) = signed_in("old-user").await;
    let new_token = token_for("u42");

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(NoAuthorization)
        .and(body_partial_json(json!({ "email": "ana@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "accessToken": new_token, "refreshToken": "r1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client.login(" ana@example.com ", "pw").await.unwrap();
    assert_eq!(response.refresh_token.as_deref(), Some("r1"));
    assert_eq!(client.session().token().as_deref(), Some(new_token.as_str()));
    assert_eq!(client.session().user_id().as_deref(), Some("u42"));
}

#[tokio::test]
async fn test_failed_login_keeps_session_unchanged() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let err = client.login("ana@example.com", "wrong").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Invalid credentials");
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_refresh_token_replaces_session() {
    let (server, client, _) = signed_in("u1").await;
    let refreshed = token_for("u1-refreshed");

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .and(body_partial_json(json!({ "refreshToken": "r1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "accessToken": refreshed }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.refresh_token("r1").await.unwrap();
    assert_eq!(client.session().user_id().as_deref(), Some("u1-refreshed"));
}

#[tokio::test]
async fn test_logout_clears_session_even_when_server_fails() {
    let (server, client, _) = signed_in("u1").await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "statusCode": 500 })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.logout().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(!client.session().is_authenticated());
    assert_eq!(client.session().user_id(), None);
}

#[tokio::test]
async fn test_json_error_message_is_surfaced() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/posts/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "statusCode": 404, "message": "Post not found" })),
        )
        .mount(&server)
        .await;

    match client.get_post("missing").await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Post not found");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_json_error_without_message_uses_status_text() {
    let (server, client) = setup().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "statusCode": 500 })))
        .mount(&server)
        .await;

    let err = client.get_post("p1").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status: 500, ref message } if message == "Internal Server Error"
    ));
}

#[tokio::test]
async fn test_html_error_page_is_not_parsed() {
    let (server, client) = setup().await;

    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_raw("<html><body>Bad gateway</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    match client.get_post("p1").await {
        Err(ClientError::UnexpectedBody {
            status,
            content_type,
            message,
        }) => {
            assert_eq!(status, 502);
            assert!(content_type.starts_with("text/html"));
            assert_eq!(message, "Bad Gateway");
        }
        other => panic!("expected UnexpectedBody, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wrong_envelope_is_decode_error() {
    let (server, client) = setup().await;

    // get_post expects {"data": ...}
    Mock::given(method("GET"))
        .and(path("/posts/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json("p1", "bare")))
        .mount(&server)
        .await;

    let err = client.get_post("p1").await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let config = ClientConfig::with_base_url("http://127.0.0.1:1").unwrap();
    let client = ApiClient::new(config, Session::new(Arc::new(MemoryStore::default()))).unwrap();

    let err = client.get_post("p1").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_empty_post_fails_without_request() {
    let (server, client, _) = signed_in("u1").await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.create_post(&NewPost::text("   ")).await.unwrap_err();
    assert!(matches!(&err, ClientError::Validation(m) if m == "Post cannot be empty"));
    assert_eq!(err.user_message(), "Post cannot be empty");
}

#[tokio::test]
async fn test_create_post_sends_multipart() {
    let (server, client, _) = signed_in("u1").await;

    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(MultipartContaining(vec![
            r#"name="content""#,
            "hello @bob",
            r#"name="mentions""#,
            r#""userId":"u2""#,
            r#"name="files"; filename="cat.png""#,
        ]))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": post_json("p9", "hello @bob")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let post = NewPost {
        content: "hello @bob".to_string(),
        files: vec![social_client::Attachment::new("cat.png", "image/png", vec![137, 80, 78, 71])],
        mentions: vec![Mention {
            user_id: "u2".to_string(),
            offset: 6,
            length: 4,
        }],
    };
    let created = client.create_post(&post).await.unwrap();
    assert_eq!(created.id, "p9");
}

#[tokio::test]
async fn test_blank_comment_fails_without_request() {
    let (server, client, _) = signed_in("u1").await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let comment = NewComment {
        post_id: "p1".to_string(),
        content: "\n".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        client.create_comment(&comment).await,
        Err(ClientError::Validation(_))
    ));
}

#[tokio::test]
async fn test_react_uses_session_user() {
    let (server, client, _) = signed_in("u7").await;

    Mock::given(method("POST"))
        .and(path("/reaction"))
        .and(body_partial_json(json!({
            "targetId": "p1",
            "targetType": "post",
            "userId": "u7",
            "reactionType": "love"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "targetId": "p1",
                "targetType": "post",
                "userId": "u7",
                "reactionType": "love"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reaction = client
        .react(&ReactionTarget::post("p1"), ReactionType::Love)
        .await
        .unwrap();
    assert_eq!(reaction.reaction_type, ReactionType::Love);
}

#[tokio::test]
async fn test_my_reaction_absent_and_summary() {
    let (server, client, _) = signed_in("u7").await;

    Mock::given(method("GET"))
        .and(path("/reaction"))
        .and(query_param("userId", "u7"))
        .and(query_param("targetType", "comment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reaction/summary"))
        .and(query_param("targetId", "c1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "like": 2, "wow": 1 } })),
        )
        .mount(&server)
        .await;

    let target = ReactionTarget::comment("c1");
    assert_eq!(client.my_reaction(&target).await.unwrap(), None);

    let summary = client.reaction_summary(&target).await.unwrap();
    assert_eq!(summary.total(), 3);
    assert_eq!(summary.count(ReactionType::Like), 2);
}

#[tokio::test]
async fn test_user_operations_require_sign_in() {
    let (server, client) = setup().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .react(&ReactionTarget::post("p1"), ReactionType::Like)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
    assert!(matches!(client.me().await, Err(ClientError::NotAuthenticated)));
}

#[tokio::test]
async fn test_follow_and_unfollow() {
    let (server, client, _) = signed_in("u1").await;

    Mock::given(method("POST"))
        .and(path("/relationships/u2/follow"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/relationships/u2/follow"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.follow("u2").await.unwrap();
    client.unfollow("u2").await.unwrap();
    assert!(matches!(
        client.follow("u1").await,
        Err(ClientError::Validation(_))
    ));
}

#[tokio::test]
async fn test_notification_updates() {
    let (server, client, _) = signed_in("u1").await;

    Mock::given(method("PATCH"))
        .and(path("/notifications/mark-read"))
        .and(body_partial_json(json!({ "notificationIds": ["n1", "n2"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/notifications/mark-all-read"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/notifications/n3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.mark_read(&[]).await.unwrap();
    client
        .mark_read(&["n1".to_string(), "n2".to_string()])
        .await
        .unwrap();
    client.mark_all_read().await.unwrap();
    client.delete_notification("n3").await.unwrap();
}

#[tokio::test]
async fn test_upload_avatar_multipart() {
    let (server, client, _) = signed_in("u1").await;

    Mock::given(method("POST"))
        .and(path("/users/u1/avatar"))
        .and(MultipartContaining(vec![r#"name="avatar"; filename="me.jpg""#]))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "u1", "username": "ana", "avatarUrl": "https://cdn/me.jpg" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let avatar = social_client::Attachment::new("me.jpg", "image/jpeg", vec![0xFF, 0xD8]);
    let profile = client.upload_avatar(&avatar).await.unwrap();
    assert_eq!(profile.avatar_url.as_deref(), Some("https://cdn/me.jpg"));

    let not_image = social_client::Attachment::new("me.txt", "text/plain", vec![1]);
    assert!(matches!(
        client.upload_avatar(&not_image).await,
        Err(ClientError::Validation(_))
    ));
}
