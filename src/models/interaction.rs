use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

/// Kind of action a viewer took on a video
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    View,
    Like,
    Dislike,
    Hide,
    MuteChannel,
    ShowMoreLikeThis,
}

impl InteractionKind {
    /// Stored representation, shared with the database column
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::View => "view",
            InteractionKind::Like => "like",
            InteractionKind::Dislike => "dislike",
            InteractionKind::Hide => "hide",
            InteractionKind::MuteChannel => "mute_channel",
            InteractionKind::ShowMoreLikeThis => "show_more_like_this",
        }
    }
}

impl Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(InteractionKind::View),
            "like" => Ok(InteractionKind::Like),
            "dislike" => Ok(InteractionKind::Dislike),
            "hide" => Ok(InteractionKind::Hide),
            "mute_channel" => Ok(InteractionKind::MuteChannel),
            "show_more_like_this" => Ok(InteractionKind::ShowMoreLikeThis),
            other => Err(format!("unknown interaction kind: {}", other)),
        }
    }
}

/// One recorded user action. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub user_id: Uuid,
    pub content_id: Uuid,
    pub kind: InteractionKind,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    /// Creates an interaction stamped with the current time
    pub fn new(user_id: Uuid, content_id: Uuid, kind: InteractionKind) -> Self {
        Self {
            user_id,
            content_id,
            kind,
            created_at: Utc::now(),
        }
    }
}

/// Projection of the interaction log used for relevance scoring
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionRecord {
    pub content_id: Uuid,
    pub kind: InteractionKind,
}
