//! Story use-case service.
//!
//! # Responsibility
//! - Provide the story entry points used by the route layer.
//! - Emit one structured log event per call; propagate every failure.
//!
//! # Invariants
//! - Service APIs never bypass the repository contract.
//! - Logged fields are ids, counts and error codes, never story text.

use crate::model::story::{StoryDetail, StoryDraft, StoryId, StoryListing, StoryRecord};
use crate::repo::story_repo::{RepoResult, StoryRepository};
use log::{debug, warn};
use std::time::Instant;

/// Use-case service wrapper for story operations.
pub struct StoryService<R: StoryRepository> {
    repo: R,
}

impl<R: StoryRepository> StoryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists every story with its author's username.
    pub fn fetch_all(&self) -> RepoResult<Vec<StoryListing>> {
        let started_at = Instant::now();
        let result = self.repo.list_stories();
        log_outcome("story_fetch_all", started_at, &result, |stories| {
            format!("count={}", stories.len())
        });
        result
    }

    /// Lists all stories written by `username`.
    ///
    /// Returns `NotFound` for an unknown author and an empty list for an
    /// author without stories.
    pub fn fetch_all_by_username(&self, username: &str) -> RepoResult<Vec<StoryDetail>> {
        let started_at = Instant::now();
        let result = self.repo.list_stories_by_username(username);
        log_outcome("story_fetch_by_username", started_at, &result, |stories| {
            format!("count={}", stories.len())
        });
        result
    }

    /// Loads the story titled `title` together with its author.
    pub fn fetch_by_title(&self, title: &str) -> RepoResult<StoryDetail> {
        let started_at = Instant::now();
        let result = self.repo.get_story_by_title(title);
        log_outcome("story_fetch_by_title", started_at, &result, |story| {
            format!("story_id={}", story.story_id)
        });
        result
    }

    /// Loads one persisted story by id.
    pub fn fetch_by_id(&self, story_id: StoryId) -> RepoResult<StoryRecord> {
        let started_at = Instant::now();
        let result = self.repo.get_story(story_id);
        log_outcome("story_fetch_by_id", started_at, &result, |story| {
            format!("story_id={}", story.story_id)
        });
        result
    }

    /// Persists a new story from `draft`.
    ///
    /// The returned record carries the storage-assigned id and creation date.
    pub fn create(&self, draft: &StoryDraft) -> RepoResult<StoryRecord> {
        let started_at = Instant::now();
        let result = self.repo.create_story(draft);
        log_outcome("story_create", started_at, &result, |story| {
            format!("story_id={} user_id={}", story.story_id, story.user_id)
        });
        result
    }

    /// Renames/resummarises the story identified by `draft.story_id` and
    /// `current_title`.
    pub fn update(&self, draft: &StoryDraft, current_title: &str) -> RepoResult<StoryRecord> {
        let started_at = Instant::now();
        let result = self.repo.update_story(draft, current_title);
        log_outcome("story_update", started_at, &result, |story| {
            format!("story_id={}", story.story_id)
        });
        result
    }
}

fn log_outcome<T>(
    event: &str,
    started_at: Instant,
    result: &RepoResult<T>,
    describe: impl FnOnce(&T) -> String,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(value) => debug!(
            "event={event} module=story status=ok duration_ms={duration_ms} {}",
            describe(value)
        ),
        Err(err) => warn!(
            "event={event} module=story status=error duration_ms={duration_ms} error_code={} error={}",
            err.code(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::StoryService;
    use crate::model::story::{StoryDetail, StoryDraft, StoryId, StoryListing, StoryRecord};
    use crate::repo::story_repo::{RepoError, RepoResult, StoryLookup, StoryRepository};
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeRepository {
        stories: RefCell<Vec<StoryRecord>>,
    }

    impl StoryRepository for FakeRepository {
        fn list_stories(&self) -> RepoResult<Vec<StoryListing>> {
            Ok(self
                .stories
                .borrow()
                .iter()
                .map(|story| StoryListing {
                    story_id: story.story_id,
                    title: story.title.clone(),
                    username: format!("user-{}", story.user_id),
                })
                .collect())
        }

        fn list_stories_by_username(&self, username: &str) -> RepoResult<Vec<StoryDetail>> {
            Err(RepoError::NotFound(StoryLookup::Username(
                username.to_string(),
            )))
        }

        fn get_story_by_title(&self, title: &str) -> RepoResult<StoryDetail> {
            Err(RepoError::NotFound(StoryLookup::Title(title.to_string())))
        }

        fn get_story(&self, story_id: StoryId) -> RepoResult<StoryRecord> {
            self.stories
                .borrow()
                .iter()
                .find(|story| story.story_id == story_id)
                .cloned()
                .ok_or(RepoError::NotFound(StoryLookup::Id(story_id)))
        }

        fn create_story(&self, draft: &StoryDraft) -> RepoResult<StoryRecord> {
            let (Some(title), Some(user_id)) = (draft.title.clone(), draft.user_id) else {
                return Err(RepoError::ConstraintViolation(
                    "NOT NULL constraint failed".to_string(),
                ));
            };
            let mut stories = self.stories.borrow_mut();
            let record = StoryRecord {
                story_id: stories.len() as StoryId + 1,
                title,
                user_id,
                summary: draft.summary.clone(),
                creation_date: 1_700_000_000_000,
            };
            stories.push(record.clone());
            Ok(record)
        }

        fn update_story(
            &self,
            draft: &StoryDraft,
            current_title: &str,
        ) -> RepoResult<StoryRecord> {
            Err(RepoError::NotFound(StoryLookup::IdAndTitle {
                story_id: draft.story_id,
                title: current_title.to_string(),
            }))
        }
    }

    #[test]
    fn service_delegates_to_injected_repository() {
        let service = StoryService::new(FakeRepository::default());

        let created = service
            .create(&StoryDraft::new("Dune", 3, Some("desert".to_string())))
            .unwrap();
        assert_eq!(created.story_id, 1);

        let fetched = service.fetch_by_id(created.story_id).unwrap();
        assert_eq!(fetched, created);

        let listed = service.fetch_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].username, "user-3");
    }

    #[test]
    fn service_propagates_typed_failures() {
        let service = StoryService::new(FakeRepository::default());

        let err = service.create(&StoryDraft::default()).unwrap_err();
        assert!(matches!(err, RepoError::ConstraintViolation(_)));

        let err = service
            .update(&StoryDraft::for_update(9, "New", None), "Old")
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::NotFound(StoryLookup::IdAndTitle { story_id: Some(9), .. })
        ));

        let err = service.fetch_by_title("missing").unwrap_err();
        assert!(matches!(err, RepoError::NotFound(StoryLookup::Title(_))));
    }
}
