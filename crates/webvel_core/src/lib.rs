//! Story persistence core for Webvel.
//!
//! Route handlers build a [`StoryService`] over a [`SqliteStoryRepository`]
//! borrowed from a connection opened with [`db::open_db`], then read typed
//! results or typed errors from each call.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::story::{StoryDetail, StoryDraft, StoryId, StoryListing, StoryRecord, UserId};
pub use repo::story_repo::{
    RepoError, RepoResult, SqliteStoryRepository, StoryLookup, StoryRepository,
};
pub use service::story_service::StoryService;
