/// Client configuration shared by every REST wrapper
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::{ClientError, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Backend service an endpoint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Auth,
    Posts,
    Reactions,
    Relationships,
    Notifications,
    Users,
}

impl Service {
    pub const ALL: [Service; 6] = [
        Service::Auth,
        Service::Posts,
        Service::Reactions,
        Service::Relationships,
        Service::Notifications,
        Service::Users,
    ];

    fn env_var(self) -> &'static str {
        match self {
            Service::Auth => "SOCIAL_AUTH_URL",
            Service::Posts => "SOCIAL_POSTS_URL",
            Service::Reactions => "SOCIAL_REACTIONS_URL",
            Service::Relationships => "SOCIAL_RELATIONSHIPS_URL",
            Service::Notifications => "SOCIAL_NOTIFICATIONS_URL",
            Service::Users => "SOCIAL_USERS_URL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub auth_url: Url,
    pub posts_url: Url,
    pub reactions_url: Url,
    pub relationships_url: Url,
    pub notifications_url: Url,
    pub users_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Default page size for list views
    pub page_size: u32,
    /// Where the CLI persists the session; `None` keeps it in memory
    pub session_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Every service behind one base URL
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base = parse_url("base URL", base_url)?;
        Ok(Self {
            auth_url: base.clone(),
            posts_url: base.clone(),
            reactions_url: base.clone(),
            relationships_url: base.clone(),
            notifications_url: base.clone(),
            users_url: base,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            session_file: None,
        })
    }

    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is read first when present.
    /// `SOCIAL_API_BASE_URL` sets every service; `SOCIAL_<SERVICE>_URL`
    /// overrides one.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let base_url =
            std::env::var("SOCIAL_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut config = Self::with_base_url(&base_url)?;

        for service in Service::ALL {
            if let Ok(value) = std::env::var(service.env_var()) {
                *config.url_mut(service) = parse_url(service.env_var(), &value)?;
            }
        }

        config.timeout = Duration::from_secs(
            std::env::var("SOCIAL_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );
        config.page_size = std::env::var("SOCIAL_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);
        config.session_file = std::env::var("SOCIAL_SESSION_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be greater than zero".to_string()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ClientError::Config(format!(
                "page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    pub fn url(&self, service: Service) -> &Url {
        match service {
            Service::Auth => &self.auth_url,
            Service::Posts => &self.posts_url,
            Service::Reactions => &self.reactions_url,
            Service::Relationships => &self.relationships_url,
            Service::Notifications => &self.notifications_url,
            Service::Users => &self.users_url,
        }
    }

    fn url_mut(&mut self, service: Service) -> &mut Url {
        match service {
            Service::Auth => &mut self.auth_url,
            Service::Posts => &mut self.posts_url,
            Service::Reactions => &mut self.reactions_url,
            Service::Relationships => &mut self.relationships_url,
            Service::Notifications => &mut self.notifications_url,
            Service::Users => &mut self.users_url,
        }
    }

    /// Absolute URL for `path` on `service`
    ///
    /// `path` is appended to the service URL's own path, so a base of
    /// `https://host/api/v1` and `/feed` give `https://host/api/v1/feed`.
    pub fn endpoint(&self, service: Service, path: &str) -> Result<Url> {
        let base = self.url(service);
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        parse_url("endpoint", &joined)
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value.trim())
        .map_err(|e| ClientError::Config(format!("invalid {} '{}': {}", name, value, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!(
            "{} must use http or https, got '{}'",
            name,
            url.scheme()
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            "SOCIAL_API_BASE_URL",
            "SOCIAL_HTTP_TIMEOUT_SECS",
            "SOCIAL_PAGE_SIZE",
            "SOCIAL_SESSION_FILE",
        ] {
            std::env::remove_var(var);
        }
        for service in Service::ALL {
            std::env::remove_var(service.env_var());
        }
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ClientConfig::with_base_url("https://api.example.com/api/v1/").unwrap();
        assert_eq!(
            config.endpoint(Service::Posts, "/posts/42").unwrap().as_str(),
            "https://api.example.com/api/v1/posts/42"
        );
        assert_eq!(
            config.endpoint(Service::Auth, "auth/login").unwrap().as_str(),
            "https://api.example.com/api/v1/auth/login"
        );
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(matches!(
            ClientConfig::with_base_url("not a url"),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::with_base_url("ftp://files.example.com"),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_validate_page_size() {
        let mut config = ClientConfig::with_base_url(DEFAULT_BASE_URL).unwrap();
        assert!(config.validate().is_ok());
        config.page_size = 0;
        assert!(config.validate().is_err());
        config.page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.posts_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.session_file.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_service_override() {
        clear_env();
        std::env::set_var("SOCIAL_API_BASE_URL", "https://api.example.com");
        std::env::set_var("SOCIAL_NOTIFICATIONS_URL", "https://notify.example.com/v2");
        std::env::set_var("SOCIAL_PAGE_SIZE", "50");
        std::env::set_var("SOCIAL_SESSION_FILE", "/tmp/social-session.json");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.auth_url.as_str(), "https://api.example.com/");
        assert_eq!(
            config
                .endpoint(Service::Notifications, "/notifications/me")
                .unwrap()
                .as_str(),
            "https://notify.example.com/v2/notifications/me"
        );
        assert_eq!(config.page_size, 50);
        assert_eq!(
            config.session_file,
            Some(PathBuf::from("/tmp/social-session.json"))
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_override() {
        clear_env();
        std::env::set_var("SOCIAL_USERS_URL", "::nope::");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ClientError::Config(_))
        ));
        clear_env();
    }
}
