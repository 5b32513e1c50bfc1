//! Persistence contracts and their implementations.
//!
//! [`CatalogStore`] is the read contract the search pipeline and the comment
//! assembler depend on. The remaining traits cover the write paths of the
//! application (ratings, favorites, comments, accounts, administration).
//! [`PgStore`] backs the service in production; [`MemoryStore`] keeps
//! everything in process and applies the same predicates and orderings.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Comment, FavoriteEntry, FavoriteMovie, Genre, Movie, MovieUpdate, NewComment, NewUser,
    RatingEntry, Role, Session, User,
};
use crate::search::{MovieFilter, PageWindow, SortOrder};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Movies matching `filter`, ordered by `sort`, restricted to `window`.
    async fn find_movies(
        &self,
        filter: &MovieFilter,
        sort: SortOrder,
        window: PageWindow,
    ) -> Result<Vec<Movie>, StoreError>;

    async fn count_movies(&self, filter: &MovieFilter) -> Result<u64, StoreError>;

    async fn genres(&self) -> Result<Vec<Genre>, StoreError>;

    async fn movie(&self, movie_id: i32) -> Result<Option<Movie>, StoreError>;

    async fn popular_movies(&self, limit: u32) -> Result<Vec<Movie>, StoreError>;

    /// Flat comments of a movie in posting order, author names resolved.
    async fn comments_for_movie(&self, movie_id: i32) -> Result<Vec<Comment>, StoreError>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Inserts or replaces the user's rating and refreshes the movie's
    /// aggregate rating in the same unit of work.
    async fn upsert_rating(&self, movie_id: i32, user_id: i32, value: i32)
        -> Result<(), StoreError>;

    async fn user_rating(&self, movie_id: i32, user_id: i32) -> Result<Option<i32>, StoreError>;

    /// All ratings of a user, newest first.
    async fn user_ratings(&self, user_id: i32) -> Result<Vec<RatingEntry>, StoreError>;

    /// Returns `true` when the movie is a favorite after the call.
    async fn toggle_favorite(&self, movie_id: i32, user_id: i32) -> Result<bool, StoreError>;

    async fn is_favorite(&self, movie_id: i32, user_id: i32) -> Result<bool, StoreError>;

    /// Returns `false` when there was nothing to remove.
    async fn remove_favorite(&self, movie_id: i32, user_id: i32) -> Result<bool, StoreError>;

    async fn user_favorites(&self, user_id: i32) -> Result<Vec<FavoriteEntry>, StoreError>;

    async fn favorite_movies(&self, user_id: i32) -> Result<Vec<FavoriteMovie>, StoreError>;

    async fn add_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    async fn edit_comment(
        &self,
        comment_id: i32,
        user_id: i32,
        content: &str,
    ) -> Result<Comment, StoreError>;

    /// Deletes the comment with its replies and returns the movie id.
    async fn delete_comment(&self, comment_id: i32, user_id: i32) -> Result<i32, StoreError>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// The user registered with `email` and its password hash.
    async fn credentials_by_email(&self, email: &str)
        -> Result<Option<(User, String)>, StoreError>;

    async fn create_session(
        &self,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid, StoreError>;

    async fn session(&self, session_id: Uuid) -> Result<Option<Session>, StoreError>;

    async fn delete_session(&self, session_id: Uuid) -> Result<(), StoreError>;

    async fn credentials_by_id(&self, user_id: i32)
        -> Result<Option<(User, String)>, StoreError>;

    async fn update_password(&self, user_id: i32, password_hash: &str) -> Result<(), StoreError>;

    /// Removes the account with its sessions, ratings, favorites and comments
    /// (replies to those comments included), then refreshes the aggregate
    /// rating of every movie the user had rated.
    async fn delete_user(&self, user_id: i32) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Users whose name contains `username` (ignoring case), by id.
    async fn list_users(
        &self,
        username: Option<&str>,
        window: PageWindow,
    ) -> Result<Vec<User>, StoreError>;

    async fn count_users(&self, username: Option<&str>) -> Result<u64, StoreError>;

    async fn set_banned(&self, user_id: i32, banned: bool) -> Result<User, StoreError>;

    async fn set_role(&self, user_id: i32, role: Role) -> Result<User, StoreError>;

    /// Unknown genre ids are rejected with `InvalidInput` and leave the movie
    /// unchanged.
    async fn update_movie(&self, movie_id: i32, update: &MovieUpdate)
        -> Result<Movie, StoreError>;

    async fn delete_movie(&self, movie_id: i32) -> Result<(), StoreError>;
}

/// Everything the HTTP layer needs from persistence.
pub trait Store: CatalogStore + FeedbackStore + AccountStore + AdminStore {}

impl<T> Store for T where T: CatalogStore + FeedbackStore + AccountStore + AdminStore {}
