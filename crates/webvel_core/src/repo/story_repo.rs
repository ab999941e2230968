//! Story repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the story read/write operations over `story` and `user_account`.
//! - Keep SQL details inside the core persistence boundary.
//! - Translate storage outcomes into typed errors (`NotFound`,
//!   `ConstraintViolation`, `Db`) instead of leaving callers to guess.
//!
//! # Invariants
//! - Every operation issues exactly one SQL statement.
//! - Update only ever writes `title` and `summary`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::story::{StoryDetail, StoryDraft, StoryId, StoryListing, StoryRecord};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const STORY_RETURNING_SQL: &str = "RETURNING story_id, title, user_id, summary, creation_date";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "story",
        &["story_id", "title", "user_id", "summary", "creation_date"],
    ),
    ("user_account", &["user_id", "username"]),
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Key a story lookup was made with, carried by `RepoError::NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryLookup {
    Id(StoryId),
    Title(String),
    Username(String),
    /// Update key: the story id plus the title the caller believes is current.
    IdAndTitle {
        story_id: Option<StoryId>,
        title: String,
    },
}

impl Display for StoryLookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "story_id={id}"),
            Self::Title(title) => write!(f, "title `{title}`"),
            Self::Username(username) => write!(f, "author `{username}`"),
            Self::IdAndTitle {
                story_id: Some(id),
                title,
            } => write!(f, "story_id={id} with title `{title}`"),
            Self::IdAndTitle {
                story_id: None,
                title,
            } => write!(f, "story without id with title `{title}`"),
        }
    }
}

/// Repository error for story persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Connection or query execution failure.
    Db(DbError),
    NotFound(StoryLookup),
    /// Storage rejected the write (NOT NULL, FOREIGN KEY, UNIQUE, ...).
    ConstraintViolation(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Short stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db_error",
            Self::NotFound(_) => "not_found",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::InvalidData(_) => "invalid_data",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_table",
            Self::MissingRequiredColumn { .. } => "missing_column",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(lookup) => write!(f, "story not found: {lookup}"),
            Self::ConstraintViolation(message) => {
                write!(f, "story constraint violation: {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted story data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if value.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            return Self::ConstraintViolation(value.to_string());
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for story operations.
pub trait StoryRepository {
    /// Lists every story with its author's username, oldest first.
    fn list_stories(&self) -> RepoResult<Vec<StoryListing>>;
    /// Lists the stories of one author; empty when the author has none.
    fn list_stories_by_username(&self, username: &str) -> RepoResult<Vec<StoryDetail>>;
    /// Gets the story with exactly this title (lowest id on duplicates).
    fn get_story_by_title(&self, title: &str) -> RepoResult<StoryDetail>;
    /// Gets one persisted story row by id.
    fn get_story(&self, story_id: StoryId) -> RepoResult<StoryRecord>;
    /// Inserts the draft's title/user/summary and returns the stored row.
    fn create_story(&self, draft: &StoryDraft) -> RepoResult<StoryRecord>;
    /// Rewrites title/summary of the row matching `(draft.story_id, current_title)`.
    fn update_story(&self, draft: &StoryDraft, current_title: &str) -> RepoResult<StoryRecord>;
}

/// SQLite-backed story repository over an injected connection.
pub struct SqliteStoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStoryRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   does not carry the story and account columns.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl StoryRepository for SqliteStoryRepository<'_> {
    fn list_stories(&self) -> RepoResult<Vec<StoryListing>> {
        let mut stmt = self.conn.prepare(
            "SELECT story.story_id, story.title, user_account.username
             FROM story
             INNER JOIN user_account
                ON user_account.user_id = story.user_id
             ORDER BY story.story_id ASC;",
        )?;

        let mut rows = stmt.query([])?;
        let mut stories = Vec::new();
        while let Some(row) = rows.next()? {
            stories.push(StoryListing {
                story_id: parse_story_id(row.get("story_id")?)?,
                title: row.get("title")?,
                username: row.get("username")?,
            });
        }

        Ok(stories)
    }

    fn list_stories_by_username(&self, username: &str) -> RepoResult<Vec<StoryDetail>> {
        // Author-preserving join: an author without stories still yields one
        // row with NULL story columns, which separates "no stories" from
        // "no such author".
        let mut stmt = self.conn.prepare(
            "SELECT story.story_id, story.title, story.summary, user_account.username
             FROM user_account
             LEFT JOIN story
                ON story.user_id = user_account.user_id
             WHERE user_account.username = ?1
             ORDER BY story.story_id ASC;",
        )?;

        let mut rows = stmt.query([username])?;
        let mut author_seen = false;
        let mut stories = Vec::new();
        while let Some(row) = rows.next()? {
            author_seen = true;
            let Some(story_id) = row.get::<_, Option<i64>>("story_id")? else {
                continue;
            };
            stories.push(StoryDetail {
                story_id: parse_story_id(story_id)?,
                title: row.get("title")?,
                summary: row.get("summary")?,
                username: row.get("username")?,
            });
        }

        if !author_seen {
            return Err(RepoError::NotFound(StoryLookup::Username(
                username.to_string(),
            )));
        }

        Ok(stories)
    }

    fn get_story_by_title(&self, title: &str) -> RepoResult<StoryDetail> {
        let mut stmt = self.conn.prepare(
            "SELECT story.story_id, story.title, story.summary, user_account.username
             FROM story
             INNER JOIN user_account
                ON user_account.user_id = story.user_id
             WHERE story.title = ?1
             ORDER BY story.story_id ASC
             LIMIT 1;",
        )?;

        let mut rows = stmt.query([title])?;
        match rows.next()? {
            Some(row) => Ok(StoryDetail {
                story_id: parse_story_id(row.get("story_id")?)?,
                title: row.get("title")?,
                summary: row.get("summary")?,
                username: row.get("username")?,
            }),
            None => Err(RepoError::NotFound(StoryLookup::Title(title.to_string()))),
        }
    }

    fn get_story(&self, story_id: StoryId) -> RepoResult<StoryRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT story_id, title, user_id, summary, creation_date
             FROM story
             WHERE story_id = ?1;",
        )?;

        let mut rows = stmt.query([story_id])?;
        match rows.next()? {
            Some(row) => parse_story_row(row),
            None => Err(RepoError::NotFound(StoryLookup::Id(story_id))),
        }
    }

    fn create_story(&self, draft: &StoryDraft) -> RepoResult<StoryRecord> {
        let mut stmt = self.conn.prepare(&format!(
            "INSERT INTO story (title, user_id, summary)
             VALUES (?1, ?2, ?3)
             {STORY_RETURNING_SQL};"
        ))?;

        let mut rows = stmt.query(params![
            draft.title.as_deref(),
            draft.user_id,
            draft.summary.as_deref(),
        ])?;
        match rows.next()? {
            Some(row) => parse_story_row(row),
            None => Err(RepoError::InvalidData(
                "insert into story returned no row".to_string(),
            )),
        }
    }

    fn update_story(&self, draft: &StoryDraft, current_title: &str) -> RepoResult<StoryRecord> {
        let mut stmt = self.conn.prepare(&format!(
            "UPDATE story
             SET
                title = ?1,
                summary = ?2
             WHERE story_id = ?3
               AND title = ?4
             {STORY_RETURNING_SQL};"
        ))?;

        let mut rows = stmt.query(params![
            draft.title.as_deref(),
            draft.summary.as_deref(),
            draft.story_id,
            current_title,
        ])?;
        match rows.next()? {
            Some(row) => parse_story_row(row),
            None => Err(RepoError::NotFound(StoryLookup::IdAndTitle {
                story_id: draft.story_id,
                title: current_title.to_string(),
            })),
        }
    }
}

fn parse_story_row(row: &Row<'_>) -> RepoResult<StoryRecord> {
    let user_id: i64 = row.get("user_id")?;
    if user_id <= 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid user_id value `{user_id}` in story.user_id"
        )));
    }

    Ok(StoryRecord {
        story_id: parse_story_id(row.get("story_id")?)?,
        title: row.get("title")?,
        user_id,
        summary: row.get("summary")?,
        creation_date: row.get("creation_date")?,
    })
}

fn parse_story_id(value: i64) -> RepoResult<StoryId> {
    if value <= 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid story_id value `{value}` in story.story_id"
        )));
    }
    Ok(value)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{RepoError, StoryLookup};
    use rusqlite::Connection;

    #[test]
    fn constraint_failures_map_to_constraint_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT NOT NULL);")
            .unwrap();

        let err: RepoError = conn
            .execute("INSERT INTO t (v) VALUES (NULL);", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepoError::ConstraintViolation(_)));
        assert_eq!(err.code(), "constraint_violation");
    }

    #[test]
    fn other_sqlite_failures_map_to_db() {
        let conn = Connection::open_in_memory().unwrap();

        let err: RepoError = conn
            .execute("SELECT * FROM does_not_exist;", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepoError::Db(_)));
    }

    #[test]
    fn not_found_message_names_the_lookup_key() {
        let err = RepoError::NotFound(StoryLookup::IdAndTitle {
            story_id: Some(7),
            title: "Draft".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "story not found: story_id=7 with title `Draft`"
        );
    }
}
