use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ContentItem, InteractionKind};

/// A viewer's accumulated preferences
///
/// Both lists behave as sets: membership is exact match and adding an
/// existing entry is a no-op. Nothing is ever removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PreferenceModel {
    /// Tags the viewer asked to see more of
    pub preferred_tags: Vec<String>,
    /// Creators whose videos are hidden from the viewer's feed
    pub muted_channels: Vec<Uuid>,
}

/// Partial preference update. `None` fields are left untouched by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PreferencePatch {
    pub preferred_tags: Option<Vec<String>>,
    pub muted_channels: Option<Vec<Uuid>>,
}

impl PreferencePatch {
    pub fn is_empty(&self) -> bool {
        self.preferred_tags.is_none() && self.muted_channels.is_none()
    }
}

impl PreferenceModel {
    /// Creates empty preferences
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a creator to the muted set. Returns true if it was not muted yet.
    pub fn mute_channel(&mut self, creator_id: Uuid) -> bool {
        if self.muted_channels.contains(&creator_id) {
            return false;
        }
        self.muted_channels.push(creator_id);
        true
    }

    /// Unions the given tags into the preferred set. Returns true if any tag was new.
    pub fn prefer_tags<'a, I>(&mut self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut changed = false;
        for tag in tags {
            if !self.prefers_tag(tag) {
                self.preferred_tags.push(tag.to_string());
                changed = true;
            }
        }
        changed
    }

    pub fn is_muted(&self, creator_id: &Uuid) -> bool {
        self.muted_channels.contains(creator_id)
    }

    pub fn prefers_tag(&self, tag: &str) -> bool {
        self.preferred_tags.iter().any(|t| t == tag)
    }

    /// Applies an interaction to the model and returns the patch to persist
    ///
    /// Only `mute_channel` and `show_more_like_this` touch preferences; every
    /// other kind, and a repeat of an already applied one, yields `None`.
    pub fn apply(&mut self, kind: InteractionKind, item: &ContentItem) -> Option<PreferencePatch> {
        match kind {
            InteractionKind::MuteChannel => {
                self.mute_channel(item.creator_id).then(|| PreferencePatch {
                    muted_channels: Some(self.muted_channels.clone()),
                    ..Default::default()
                })
            }
            InteractionKind::ShowMoreLikeThis => self
                .prefer_tags(item.tags.iter().map(String::as_str))
                .then(|| PreferencePatch {
                    preferred_tags: Some(self.preferred_tags.clone()),
                    ..Default::default()
                }),
            InteractionKind::View
            | InteractionKind::Like
            | InteractionKind::Dislike
            | InteractionKind::Hide => None,
        }
    }
}
