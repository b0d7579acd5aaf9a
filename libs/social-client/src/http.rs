//! Shared HTTP client for every service wrapper
//!
//! All requests go through [`ApiClient`]: the session authorizes them, and
//! responses are checked and decoded the same way everywhere.

use std::sync::Arc;

use cursor_pagination::PageRequest;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use session_core::Session;
use tracing::{debug, warn};

use crate::config::{ClientConfig, Service};
use crate::error::{ClientError, ErrorBody, Result};

/// How an endpoint wraps its success payload
///
/// Declared per endpoint; nothing is inferred from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{"data": <payload>}`
    Wrapped,
    /// The payload itself
    Bare,
}

#[derive(Deserialize)]
struct Wrapped<T> {
    data: T,
}

/// REST client shared by every service wrapper
///
/// Cheap to clone; clones share the connection pool, configuration and
/// session.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: Arc<ClientConfig>,
    session: Session,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: Session) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: Arc::new(config),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Id of the signed-in user, or `NotAuthenticated`
    pub(crate) fn require_user_id(&self) -> Result<String> {
        self.session.user_id().ok_or(ClientError::NotAuthenticated)
    }

    pub(crate) fn request(
        &self,
        method: Method,
        service: Service,
        path: &str,
    ) -> Result<RequestBuilder> {
        let url = self.config.endpoint(service, path)?;
        Ok(self.http.request(method, url))
    }

    /// Authorize, send and check the status of a request
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut request = builder.build()?;
        let authorized = self.session.authorize(&mut request);
        let method = request.method().clone();
        let path = request.url().path().to_string();

        debug!(%method, %path, authorized, "Sending request");

        let response = self.http.execute(request).await.map_err(|e| {
            warn!(%method, %path, error = %e, "Request failed before a response");
            ClientError::Transport(e.to_string())
        })?;

        check_status(response, &method, &path).await
    }

    /// Send and decode the success body according to `envelope`
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        envelope: Envelope,
    ) -> Result<T> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        decode_body(&bytes, envelope)
    }

    /// Send and ignore any success body
    pub(crate) async fn execute_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.send(builder).await.map(|_| ())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish()
    }
}

/// Turn a non-2xx response into a `ClientError`
///
/// The content type decides whether the body is parsed: HTML error pages
/// and other non-JSON bodies never reach the JSON parser.
async fn check_status(response: Response, method: &Method, path: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let status_text = status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string();

    let err = if is_json(&content_type) {
        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or(status_text);
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    } else {
        ClientError::UnexpectedBody {
            status: status.as_u16(),
            content_type: if content_type.is_empty() {
                "no content type".to_string()
            } else {
                content_type
            },
            message: status_text,
        }
    };

    warn!(%method, path, status = status.as_u16(), error = %err, "Request rejected");
    Err(err)
}

fn is_json(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

pub(crate) fn decode_body<T: DeserializeOwned>(bytes: &[u8], envelope: Envelope) -> Result<T> {
    let decoded = match envelope {
        Envelope::Wrapped => serde_json::from_slice::<Wrapped<T>>(bytes).map(|w| w.data),
        Envelope::Bare => serde_json::from_slice::<T>(bytes),
    };
    decoded.map_err(|e| ClientError::Decode(format!("{:?} body: {}", envelope, e)))
}

/// `fetchSize`/`pageState` query used by every list endpoint except the feed
pub(crate) fn page_state_query(request: &PageRequest) -> Vec<(&'static str, String)> {
    let mut query = vec![("fetchSize", request.page_size.to_string())];
    if let Some(state) = &request.cursor {
        query.push(("pageState", state.clone()));
    }
    query
}

/// Check an id before it is spliced into a URL path
pub(crate) fn path_id<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClientError::Validation(format!("{} is required", name)));
    }
    if value.contains(['/', '?', '#']) {
        return Err(ClientError::Validation(format!(
            "{} contains invalid characters",
            name
        )));
    }
    Ok(value)
}
