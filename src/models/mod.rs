use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod analysis;
mod interaction;
mod user_preferences;

pub use analysis::ContentAnalysis;
pub use interaction::{Interaction, InteractionKind, InteractionRecord};
pub use user_preferences::{PreferenceModel, PreferencePatch};

/// A published video as stored by the content store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub poster_url: String,
    pub creator_id: Uuid,
    /// Ordered tags; duplicates carry no extra meaning
    pub tags: Vec<String>,
    pub views: i64,
    pub likes: i64,
    pub dislikes: i64,
    /// Duration in seconds
    pub duration: i32,
    pub is_preview: bool,
    pub created_at: DateTime<Utc>,
    /// Derived 0-100 score. May lag behind the live counters until rescored.
    pub quality_score: f64,
}

impl ContentItem {
    /// Creates a new item with zeroed counters, created now
    pub fn new(title: impl Into<String>, creator_id: Uuid, tags: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            video_url: String::new(),
            poster_url: String::new(),
            creator_id,
            tags,
            views: 0,
            likes: 0,
            dislikes: 0,
            duration: 0,
            is_preview: false,
            created_at: Utc::now(),
            quality_score: 0.0,
        }
    }

    /// Tags with duplicates removed, first occurrence wins
    pub fn distinct_tags(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            if !seen.contains(&tag.as_str()) {
                seen.push(tag.as_str());
            }
        }
        seen
    }
}

/// A content item annotated with a viewer-scoped relevance score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedFeedEntry {
    #[serde(flatten)]
    pub item: ContentItem,
    pub relevance_score: f64,
}

impl RankedFeedEntry {
    /// Entry for views without a viewer signal: relevance mirrors quality
    pub fn unpersonalized(item: ContentItem) -> Self {
        let relevance_score = item.quality_score;
        Self {
            item,
            relevance_score,
        }
    }

    /// Combined sort key used by the personalized ranking
    pub fn combined_score(&self) -> f64 {
        self.item.quality_score + self.relevance_score
    }
}

/// Named feed views rendered on the home page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HomeFeed {
    /// First few showcase entries, shown in the hero slider
    pub hero: Vec<RankedFeedEntry>,
    pub showcase: Vec<RankedFeedEntry>,
    pub upcoming_previews: Vec<RankedFeedEntry>,
    pub free_for_all: Vec<RankedFeedEntry>,
}
