//! Follow graph: follower/following lists and follow/unfollow

use async_trait::async_trait;
use cursor_pagination::{Page, PageRequest, PageSource, PaginatedCollection};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Service;
use crate::error::{ClientError, Result};
use crate::http::{page_state_query, path_id, ApiClient, Envelope};
use crate::models::UserSummary;

/// Which side of the follow edge a list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Followers,
    Following,
}

impl Direction {
    fn segment(self) -> &'static str {
        match self {
            Direction::Followers => "followers",
            Direction::Following => "following",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPage {
    #[serde(default)]
    users: Vec<UserSummary>,
    #[serde(default)]
    page_state: Option<String>,
    #[serde(default)]
    has_more: Option<bool>,
}

#[derive(Debug, Clone)]
struct RelationshipSource {
    client: ApiClient,
    user_id: String,
    direction: Direction,
}

impl RelationshipSource {
    fn new(client: ApiClient, user_id: &str, direction: Direction) -> Result<Self> {
        Ok(Self {
            client,
            user_id: path_id("user id", user_id)?.to_string(),
            direction,
        })
    }

    async fn fetch(&self, request: PageRequest) -> Result<Page<UserSummary>> {
        let path = format!("/relationships/{}/{}", self.user_id, self.direction.segment());
        let builder = self
            .client
            .request(Method::GET, Service::Relationships, &path)?
            .query(&page_state_query(&request));
        let page: UserPage = self.client.execute(builder, Envelope::Wrapped).await?;
        debug!(
            user_id = %self.user_id,
            direction = self.direction.segment(),
            count = page.users.len(),
            "Relationship page fetched"
        );
        Ok(Page::from_wire(page.users, page.page_state, page.has_more))
    }
}

/// `GET /relationships/{userId}/followers`
#[derive(Debug, Clone)]
pub struct FollowersSource(RelationshipSource);

impl FollowersSource {
    pub fn new(client: ApiClient, user_id: &str) -> Result<Self> {
        RelationshipSource::new(client, user_id, Direction::Followers).map(Self)
    }
}

#[async_trait]
impl PageSource for FollowersSource {
    type Item = UserSummary;
    type Error = ClientError;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<UserSummary>> {
        self.0.fetch(request).await
    }
}

/// `GET /relationships/{userId}/following`
#[derive(Debug, Clone)]
pub struct FollowingSource(RelationshipSource);

impl FollowingSource {
    pub fn new(client: ApiClient, user_id: &str) -> Result<Self> {
        RelationshipSource::new(client, user_id, Direction::Following).map(Self)
    }
}

#[async_trait]
impl PageSource for FollowingSource {
    type Item = UserSummary;
    type Error = ClientError;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<UserSummary>> {
        self.0.fetch(request).await
    }
}

impl ApiClient {
    pub fn followers(&self, user_id: &str) -> Result<PaginatedCollection<FollowersSource>> {
        let source = FollowersSource::new(self.clone(), user_id)?;
        Ok(PaginatedCollection::new(source, self.config().page_size))
    }

    pub fn following(&self, user_id: &str) -> Result<PaginatedCollection<FollowingSource>> {
        let source = FollowingSource::new(self.clone(), user_id)?;
        Ok(PaginatedCollection::new(source, self.config().page_size))
    }

    /// POST /relationships/{userId}/follow
    pub async fn follow(&self, user_id: &str) -> Result<()> {
        self.change_follow(Method::POST, user_id).await?;
        info!(target_user = user_id, "Followed user");
        Ok(())
    }

    /// DELETE /relationships/{userId}/follow
    pub async fn unfollow(&self, user_id: &str) -> Result<()> {
        self.change_follow(Method::DELETE, user_id).await?;
        info!(target_user = user_id, "Unfollowed user");
        Ok(())
    }

    async fn change_follow(&self, method: Method, user_id: &str) -> Result<()> {
        let user_id = path_id("user id", user_id)?;
        if self.session().user_id().as_deref() == Some(user_id) {
            return Err(ClientError::Validation("You cannot follow yourself".to_string()));
        }
        let path = format!("/relationships/{}/follow", user_id);
        let builder = self.request(method, Service::Relationships, &path)?;
        self.execute_empty(builder).await
    }
}
