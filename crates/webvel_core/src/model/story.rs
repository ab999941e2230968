//! Story domain model.
//!
//! # Responsibility
//! - Define the write-side draft and the read views of a Webvel story.
//! - Keep single-entity views and list rows as separate shapes.
//!
//! # Invariants
//! - `story_id` is assigned by storage, positive, and never reused.
//! - `user_id` references an existing author account (enforced by storage).
//! - `username` only ever comes from the author join; it is never written.

use serde::{Deserialize, Serialize};

/// Storage-assigned primary key of a story.
pub type StoryId = i64;

/// Primary key of an author account in `user_account`.
pub type UserId = i64;

/// Partially filled story used as input for create and update.
///
/// Built from whatever the caller has at hand (typically a request body).
/// Every field is optional: missing fields stay `None` instead of failing,
/// and storage constraints decide whether the draft can be persisted.
///
/// Deserialization keeps values as sent; [`StoryDraft::from_source`] also
/// treats empty strings and zero ids as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryDraft {
    /// Identifies the row to update. Ignored on create.
    pub story_id: Option<StoryId>,
    pub title: Option<String>,
    /// Author account. Ignored on update.
    pub user_id: Option<UserId>,
    pub summary: Option<String>,
}

impl StoryDraft {
    /// Creates a draft for a new story by `user_id`.
    pub fn new(title: impl Into<String>, user_id: UserId, summary: Option<String>) -> Self {
        Self {
            story_id: None,
            title: Some(title.into()),
            user_id: Some(user_id),
            summary,
        }
    }

    /// Creates a draft that retitles/resummarises an existing story.
    pub fn for_update(
        story_id: StoryId,
        title: impl Into<String>,
        summary: Option<String>,
    ) -> Self {
        Self {
            story_id: Some(story_id),
            title: Some(title.into()),
            user_id: None,
            summary,
        }
    }

    /// Builds a draft from an optional source; `None` yields an empty draft.
    ///
    /// Empty strings and zero ids in the source become `None`.
    pub fn from_source(source: Option<&StoryDraft>) -> Self {
        let Some(source) = source else {
            return Self::default();
        };

        Self {
            story_id: source.story_id.filter(|id| *id != 0),
            title: source.title.clone().filter(|title| !title.is_empty()),
            user_id: source.user_id.filter(|id| *id != 0),
            summary: source.summary.clone().filter(|summary| !summary.is_empty()),
        }
    }
}

/// One persisted `story` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub story_id: StoryId,
    pub title: String,
    pub user_id: UserId,
    pub summary: Option<String>,
    /// Unix epoch milliseconds, assigned by storage on insert.
    pub creation_date: i64,
}

/// Story joined with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDetail {
    pub story_id: StoryId,
    pub title: String,
    pub summary: Option<String>,
    pub username: String,
}

/// Row of the all-stories listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryListing {
    pub story_id: StoryId,
    pub title: String,
    pub username: String,
}
