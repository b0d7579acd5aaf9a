//! Typed reactions on posts and comments
//!
//! A reaction is keyed by `(target_id, target_type, user_id)`; a user has at
//! most one reaction per target. Counters are aggregated per type.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Service;
use crate::error::Result;
use crate::http::{ApiClient, Envelope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

impl ReactionType {
    pub const ALL: [ReactionType; 6] = [
        ReactionType::Like,
        ReactionType::Love,
        ReactionType::Haha,
        ReactionType::Wow,
        ReactionType::Sad,
        ReactionType::Angry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReactionType::Like => "like",
            ReactionType::Love => "love",
            ReactionType::Haha => "haha",
            ReactionType::Wow => "wow",
            ReactionType::Sad => "sad",
            ReactionType::Angry => "angry",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Post,
    Comment,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Post => "post",
            TargetType::Comment => "comment",
        }
    }
}

/// What a reaction is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReactionTarget {
    pub id: String,
    pub kind: TargetType,
}

impl ReactionTarget {
    pub fn post(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: TargetType::Post,
        }
    }

    pub fn comment(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: TargetType::Comment,
        }
    }
}

/// Per-type reaction counters, serialized as `{"like": 3, "love": 1}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionSummary {
    counts: BTreeMap<ReactionType, u64>,
}

impl ReactionSummary {
    pub fn count(&self, reaction: ReactionType) -> u64 {
        self.counts.get(&reaction).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Non-zero counters, largest first; ties keep declaration order
    pub fn top(&self, n: usize) -> Vec<(ReactionType, u64)> {
        let mut counts: Vec<(ReactionType, u64)> = self
            .counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(&reaction, &count)| (reaction, count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts.truncate(n);
        counts
    }

    /// Update counters locally after the user's reaction changed from
    /// `previous` to `next`
    pub fn apply_change(&mut self, previous: Option<ReactionType>, next: Option<ReactionType>) {
        if previous == next {
            return;
        }
        if let Some(previous) = previous {
            if let Some(count) = self.counts.get_mut(&previous) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.counts.remove(&previous);
                }
            }
        }
        if let Some(next) = next {
            *self.counts.entry(next).or_insert(0) += 1;
        }
    }
}

impl FromIterator<(ReactionType, u64)> for ReactionSummary {
    fn from_iter<I: IntoIterator<Item = (ReactionType, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().filter(|(_, count)| *count > 0).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub target_id: String,
    pub target_type: TargetType,
    pub user_id: String,
    pub reaction_type: ReactionType,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReactRequest<'a> {
    target_id: &'a str,
    target_type: TargetType,
    user_id: &'a str,
    reaction_type: ReactionType,
}

impl ApiClient {
    /// GET /reaction/summary
    pub async fn reaction_summary(&self, target: &ReactionTarget) -> Result<ReactionSummary> {
        let builder = self
            .request(Method::GET, Service::Reactions, "/reaction/summary")?
            .query(&[("targetId", target.id.as_str()), ("targetType", target.kind.as_str())]);
        self.execute(builder, Envelope::Wrapped).await
    }

    /// GET /reaction for one user
    ///
    /// `Ok(None)` when the user has not reacted.
    pub async fn user_reaction(
        &self,
        target: &ReactionTarget,
        user_id: &str,
    ) -> Result<Option<Reaction>> {
        let builder = self
            .request(Method::GET, Service::Reactions, "/reaction")?
            .query(&[
                ("targetId", target.id.as_str()),
                ("targetType", target.kind.as_str()),
                ("userId", user_id),
            ]);
        self.execute(builder, Envelope::Wrapped).await
    }

    /// The signed-in user's reaction
    pub async fn my_reaction(&self, target: &ReactionTarget) -> Result<Option<Reaction>> {
        let user_id = self.require_user_id()?;
        self.user_reaction(target, &user_id).await
    }

    /// POST /reaction, replacing any previous reaction of the user
    pub async fn react(&self, target: &ReactionTarget, reaction: ReactionType) -> Result<Reaction> {
        let user_id = self.require_user_id()?;
        let builder = self
            .request(Method::POST, Service::Reactions, "/reaction")?
            .json(&ReactRequest {
                target_id: &target.id,
                target_type: target.kind,
                user_id: &user_id,
                reaction_type: reaction,
            });
        let reaction: Reaction = self.execute(builder, Envelope::Wrapped).await?;
        info!(
            target_id = %target.id,
            target_type = target.kind.as_str(),
            reaction = reaction.reaction_type.as_str(),
            "Reaction saved"
        );
        Ok(reaction)
    }

    /// DELETE /reaction
    pub async fn remove_reaction(&self, target: &ReactionTarget) -> Result<()> {
        let user_id = self.require_user_id()?;
        let builder = self
            .request(Method::DELETE, Service::Reactions, "/reaction")?
            .query(&[
                ("targetId", target.id.as_str()),
                ("targetType", target.kind.as_str()),
                ("userId", user_id.as_str()),
            ]);
        self.execute_empty(builder).await
    }
}
