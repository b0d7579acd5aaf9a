//! Authentication endpoints
//!
//! Login, refresh and logout are the only operations that change the
//! session token.

use reqwest::Method;
use tracing::{info, warn};

use crate::config::Service;
use crate::error::{ClientError, Result};
use crate::http::{ApiClient, Envelope};
use crate::models::{AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest};

impl ApiClient {
    /// POST /auth/login and store the returned token
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::Validation("Email and password are required".to_string()));
        }

        let builder = self
            .request(Method::POST, Service::Auth, "/auth/login")?
            .json(&LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            });
        let response: AuthResponse = self.execute(builder, Envelope::Wrapped).await?;

        self.session().set_token(Some(response.access_token.clone()))?;
        info!(user_id = ?self.session().user_id(), "Signed in");
        Ok(response)
    }

    /// POST /auth/register
    ///
    /// Registration does not sign the user in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        if request.username.trim().is_empty() || request.email.trim().is_empty() {
            return Err(ClientError::Validation("Username and email are required".to_string()));
        }

        let builder = self
            .request(Method::POST, Service::Auth, "/auth/register")?
            .json(request);
        let response: AuthResponse = self.execute(builder, Envelope::Wrapped).await?;
        info!(username = %request.username, "Account registered");
        Ok(response)
    }

    /// POST /auth/refresh-token and replace the stored token
    ///
    /// Only called explicitly; a 401 elsewhere does not trigger it.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<AuthResponse> {
        let builder = self
            .request(Method::POST, Service::Auth, "/auth/refresh-token")?
            .json(&RefreshTokenRequest { refresh_token });
        let response: AuthResponse = self.execute(builder, Envelope::Wrapped).await?;

        self.session().set_token(Some(response.access_token.clone()))?;
        info!(user_id = ?self.session().user_id(), "Access token refreshed");
        Ok(response)
    }

    /// POST /auth/logout
    ///
    /// The local session is cleared whether or not the server call
    /// succeeds; a server failure is still returned.
    pub async fn logout(&self) -> Result<()> {
        let result = match self.request(Method::POST, Service::Auth, "/auth/logout") {
            Ok(builder) => self.execute_empty(builder).await,
            Err(e) => Err(e),
        };

        self.session().clear()?;

        match &result {
            Ok(()) => info!("Signed out"),
            Err(e) => warn!(error = %e, "Logout call failed, local session cleared"),
        }
        result
    }
}
