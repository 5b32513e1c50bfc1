use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::Instrument;
use uuid::Uuid;

use super::{AccountStore, AdminStore, CatalogStore, FeedbackStore, StoreError};
use crate::models::{
    Actor, Comment, FavoriteEntry, FavoriteMovie, Genre, Movie, MovieUpdate, NewComment, NewUser,
    RatingEntry, Role, Session, User,
};
use crate::search::{like_pattern, year_bounds, MovieFilter, PageWindow, SortOrder};

const MOVIE_COLUMNS: &str = "SELECT m.id, m.title, m.description, m.release_date, m.rating, \
     m.language, m.poster_path, m.runtime, m.popularity FROM movies m";

const USER_COLUMNS: &str = "u.id, u.username, u.email, u.role, u.is_banned, u.created_at";

#[derive(sqlx::FromRow)]
struct MovieRow {
    id: i32,
    title: String,
    description: Option<String>,
    release_date: Option<NaiveDate>,
    rating: Option<f64>,
    language: Option<String>,
    poster_path: Option<String>,
    runtime: Option<i32>,
    popularity: Option<f64>,
}

impl MovieRow {
    fn into_movie(self, genres: Vec<Genre>, actors: Vec<Actor>) -> Movie {
        Movie {
            id: self.id,
            title: self.title,
            description: self.description,
            release_date: self.release_date,
            rating: self.rating,
            language: self.language,
            poster_path: self.poster_path,
            runtime: self.runtime,
            popularity: self.popularity,
            genres,
            actors,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    movie_id: i32,
    title: String,
    poster_path: Option<String>,
    rating: Option<f64>,
    release_date: Option<NaiveDate>,
    is_watched: bool,
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    expires_at: DateTime<Utc>,
    #[sqlx(flatten)]
    user: User,
}

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn genres_by_movie(&self, ids: &[i32]) -> Result<HashMap<i32, Vec<Genre>>, StoreError> {
        let rows: Vec<(i32, i32, String)> = sqlx::query_as(
            r#"
            SELECT mg.movie_id, g.id, g.name
            FROM movie_genres mg
            JOIN genres g ON g.id = mg.genre_id
            WHERE mg.movie_id = ANY($1)
            ORDER BY g.name COLLATE "C", g.id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut genres: HashMap<i32, Vec<Genre>> = HashMap::new();
        for (movie_id, id, name) in rows {
            genres.entry(movie_id).or_default().push(Genre { id, name });
        }
        Ok(genres)
    }

    async fn actors_by_movie(&self, ids: &[i32]) -> Result<HashMap<i32, Vec<Actor>>, StoreError> {
        let rows: Vec<(i32, i32, String)> = sqlx::query_as(
            r#"
            SELECT ma.movie_id, a.id, a.name
            FROM movie_actors ma
            JOIN actors a ON a.id = ma.actor_id
            WHERE ma.movie_id = ANY($1)
            ORDER BY ma.billing_order, a.id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut actors: HashMap<i32, Vec<Actor>> = HashMap::new();
        for (movie_id, id, name) in rows {
            actors.entry(movie_id).or_default().push(Actor { id, name });
        }
        Ok(actors)
    }

    /// Resolves genre and actor links for a batch of rows, preserving row order.
    async fn attach_links(&self, rows: Vec<MovieRow>) -> Result<Vec<Movie>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        let mut genres = self.genres_by_movie(&ids).await?;
        let mut actors = self.actors_by_movie(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                row.into_movie(
                    genres.remove(&id).unwrap_or_default(),
                    actors.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn comment_with_author(&self, comment_id: i32) -> Result<Comment, StoreError> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.movie_id, c.user_id, u.username AS author, c.content,
                   c.created_at, c.parent_comment_id AS parent_id
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Comment"))
    }

    async fn comment_owner(&self, comment_id: i32) -> Result<(i32, i32), StoreError> {
        sqlx::query_as::<_, (i32, i32)>("SELECT user_id, movie_id FROM comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Comment"))
    }
}

/// Appends the `WHERE` clause for `filter` to a query over `movies m`.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &MovieFilter) {
    builder.push(" WHERE TRUE");

    if let Some(text) = &filter.text {
        let pattern = like_pattern(text);
        builder
            .push(" AND (m.title ILIKE ")
            .push_bind(pattern.clone())
            .push(
                " OR EXISTS (SELECT 1 FROM movie_genres mg JOIN genres g ON g.id = mg.genre_id \
                 WHERE mg.movie_id = m.id AND g.name ILIKE ",
            )
            .push_bind(pattern.clone())
            .push(
                ") OR EXISTS (SELECT 1 FROM movie_actors ma JOIN actors a ON a.id = ma.actor_id \
                 WHERE ma.movie_id = m.id AND a.name ILIKE ",
            )
            .push_bind(pattern)
            .push("))");
    }

    if let Some(title) = &filter.title {
        builder.push(" AND m.title ILIKE ").push_bind(like_pattern(title));
    }

    if let Some(genre_id) = filter.genre_id {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM movie_genres mg \
                 WHERE mg.movie_id = m.id AND mg.genre_id = ",
            )
            .push_bind(genre_id)
            .push(")");
    }

    if let Some(min_rating) = filter.min_rating {
        builder.push(" AND m.rating >= ").push_bind(min_rating);
    }

    if let Some(year) = filter.release_year {
        match year_bounds(year) {
            Some((first, last)) => {
                builder
                    .push(" AND m.release_date BETWEEN ")
                    .push_bind(first)
                    .push(" AND ")
                    .push_bind(last);
            }
            None => {
                builder.push(" AND FALSE");
            }
        }
    }

    if let Some(language) = &filter.language {
        builder.push(" AND m.language = ").push_bind(language.clone());
    }

    if let Some(user_id) = filter.favorites_of {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM favorites f \
                 WHERE f.movie_id = m.id AND f.user_id = ",
            )
            .push_bind(user_id)
            .push(")");
    }
}

/// One page of movies matching `filter` in `sort` order.
fn search_query(
    filter: &MovieFilter,
    sort: SortOrder,
    window: PageWindow,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(MOVIE_COLUMNS);
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY ").push(sort.order_by_clause());
    builder.push(" LIMIT ").push_bind(i64::from(window.limit));
    builder
        .push(" OFFSET ")
        .push_bind(i64::try_from(window.offset).unwrap_or(i64::MAX));
    builder
}

fn count_query(filter: &MovieFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM movies m");
    push_filter(&mut builder, filter);
    builder
}

fn push_username_filter(builder: &mut QueryBuilder<'_, Postgres>, username: Option<&str>) {
    if let Some(username) = username {
        builder
            .push(" WHERE u.username ILIKE ")
            .push_bind(like_pattern(username));
    }
}

fn user_list_query(username: Option<&str>, window: PageWindow) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM users u", USER_COLUMNS));
    push_username_filter(&mut builder, username);
    builder.push(" ORDER BY u.id LIMIT ").push_bind(i64::from(window.limit));
    builder
        .push(" OFFSET ")
        .push_bind(i64::try_from(window.offset).unwrap_or(i64::MAX));
    builder
}

fn user_count_query(username: Option<&str>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM users u");
    push_username_filter(&mut builder, username);
    builder
}

fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn conflict_on_unique(message: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |err| match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            StoreError::Conflict(message.to_string())
        }
        err => StoreError::from(err),
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_movies(
        &self,
        filter: &MovieFilter,
        sort: SortOrder,
        window: PageWindow,
    ) -> Result<Vec<Movie>, StoreError> {
        let query_span = tracing::info_span!("Fetching movie search page", ?filter, %sort);
        let mut builder = search_query(filter, sort, window);
        let rows: Vec<MovieRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .instrument(query_span)
            .await?;
        self.attach_links(rows).await
    }

    async fn count_movies(&self, filter: &MovieFilter) -> Result<u64, StoreError> {
        let query_span = tracing::info_span!("Counting movie search results", ?filter);
        let mut builder = count_query(filter);
        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .instrument(query_span)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn genres(&self) -> Result<Vec<Genre>, StoreError> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"SELECT id, name FROM genres ORDER BY name COLLATE "C", id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn movie(&self, movie_id: i32) -> Result<Option<Movie>, StoreError> {
        let row: Option<MovieRow> =
            sqlx::query_as(&format!("{} WHERE m.id = $1", MOVIE_COLUMNS))
                .bind(movie_id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some(row) => Ok(self.attach_links(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn popular_movies(&self, limit: u32) -> Result<Vec<Movie>, StoreError> {
        let rows: Vec<MovieRow> = sqlx::query_as(&format!(
            "{} ORDER BY m.popularity DESC NULLS LAST, m.id ASC LIMIT $1",
            MOVIE_COLUMNS
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        self.attach_links(rows).await
    }

    async fn comments_for_movie(&self, movie_id: i32) -> Result<Vec<Comment>, StoreError> {
        let query_span = tracing::info_span!("Fetching movie comments", movie_id);
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.movie_id, c.user_id, u.username AS author, c.content,
                   c.created_at, c.parent_comment_id AS parent_id
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.movie_id = $1
            ORDER BY c.created_at, c.id
            "#,
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .instrument(query_span)
        .await?;
        Ok(comments)
    }
}

#[async_trait]
impl FeedbackStore for PgStore {
    async fn upsert_rating(
        &self,
        movie_id: i32,
        user_id: i32,
        value: i32,
    ) -> Result<(), StoreError> {
        let query_span = tracing::info_span!("Saving movie rating", movie_id, user_id, value);
        async {
            let mut transaction = self.pool.begin().await?;
            sqlx::query_scalar::<_, i32>("SELECT id FROM movies WHERE id = $1 FOR UPDATE")
                .bind(movie_id)
                .fetch_optional(&mut *transaction)
                .await?
                .ok_or(StoreError::NotFound("Movie"))?;
            sqlx::query(
                r#"
                INSERT INTO ratings (movie_id, user_id, value, rated_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (movie_id, user_id)
                DO UPDATE SET value = EXCLUDED.value, rated_at = EXCLUDED.rated_at
                "#,
            )
            .bind(movie_id)
            .bind(user_id)
            .bind(value)
            .execute(&mut *transaction)
            .await?;
            sqlx::query("SELECT refresh_movie_rating($1)")
                .bind(movie_id)
                .execute(&mut *transaction)
                .await?;
            transaction.commit().await?;
            Ok::<(), StoreError>(())
        }
        .instrument(query_span)
        .await
    }

    async fn user_rating(&self, movie_id: i32, user_id: i32) -> Result<Option<i32>, StoreError> {
        let value = sqlx::query_scalar::<_, i32>(
            "SELECT value FROM ratings WHERE movie_id = $1 AND user_id = $2",
        )
        .bind(movie_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn user_ratings(&self, user_id: i32) -> Result<Vec<RatingEntry>, StoreError> {
        let entries = sqlx::query_as::<_, RatingEntry>(
            r#"
            SELECT r.movie_id, m.title AS movie_title, r.value, r.rated_at
            FROM ratings r
            JOIN movies m ON m.id = r.movie_id
            WHERE r.user_id = $1
            ORDER BY r.rated_at DESC, r.movie_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn toggle_favorite(&self, movie_id: i32, user_id: i32) -> Result<bool, StoreError> {
        let mut transaction = self.pool.begin().await?;
        sqlx::query_scalar::<_, i32>("SELECT id FROM movies WHERE id = $1")
            .bind(movie_id)
            .fetch_optional(&mut *transaction)
            .await?
            .ok_or(StoreError::NotFound("Movie"))?;
        let removed = sqlx::query("DELETE FROM favorites WHERE movie_id = $1 AND user_id = $2")
            .bind(movie_id)
            .bind(user_id)
            .execute(&mut *transaction)
            .await?
            .rows_affected();
        if removed == 0 {
            sqlx::query(
                "INSERT INTO favorites (movie_id, user_id, created_at) VALUES ($1, $2, NOW()) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(movie_id)
            .bind(user_id)
            .execute(&mut *transaction)
            .await?;
        }
        transaction.commit().await?;
        Ok(removed == 0)
    }

    async fn is_favorite(&self, movie_id: i32, user_id: i32) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM favorites WHERE movie_id = $1 AND user_id = $2)",
        )
        .bind(movie_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    async fn remove_favorite(&self, movie_id: i32, user_id: i32) -> Result<bool, StoreError> {
        let removed = sqlx::query("DELETE FROM favorites WHERE movie_id = $1 AND user_id = $2")
            .bind(movie_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn user_favorites(&self, user_id: i32) -> Result<Vec<FavoriteEntry>, StoreError> {
        let entries = sqlx::query_as::<_, FavoriteEntry>(
            r#"
            SELECT movie_id, created_at AS favorited_at
            FROM favorites
            WHERE user_id = $1
            ORDER BY created_at, movie_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn favorite_movies(&self, user_id: i32) -> Result<Vec<FavoriteMovie>, StoreError> {
        let rows = sqlx::query_as::<_, FavoriteRow>(
            r#"
            SELECT m.id AS movie_id, m.title, m.poster_path, m.rating, m.release_date,
                   EXISTS (
                       SELECT 1 FROM ratings r WHERE r.movie_id = m.id AND r.user_id = f.user_id
                   ) AS is_watched
            FROM favorites f
            JOIN movies m ON m.id = f.movie_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC, m.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|row| row.movie_id).collect();
        let mut genres = self.genres_by_movie(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| FavoriteMovie {
                genres: genres
                    .remove(&row.movie_id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|genre| genre.name)
                    .collect(),
                movie_id: row.movie_id,
                title: row.title,
                poster_path: row.poster_path,
                rating: row.rating,
                release_date: row.release_date,
                is_watched: row.is_watched,
            })
            .collect())
    }

    async fn add_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let query_span = tracing::info_span!(
            "Saving movie comment",
            movie_id = comment.movie_id,
            user_id = comment.user_id,
            parent_id = ?comment.parent_id
        );
        let id = async {
            let mut transaction = self.pool.begin().await?;
            sqlx::query_scalar::<_, i32>("SELECT id FROM movies WHERE id = $1")
                .bind(comment.movie_id)
                .fetch_optional(&mut *transaction)
                .await?
                .ok_or(StoreError::NotFound("Movie"))?;
            if let Some(parent_id) = comment.parent_id {
                let parent_movie =
                    sqlx::query_scalar::<_, i32>("SELECT movie_id FROM comments WHERE id = $1")
                        .bind(parent_id)
                        .fetch_optional(&mut *transaction)
                        .await?
                        .ok_or(StoreError::NotFound("Parent comment"))?;
                if parent_movie != comment.movie_id {
                    return Err(StoreError::InvalidInput(
                        "Parent comment belongs to another movie".to_string(),
                    ));
                }
            }
            let id = sqlx::query_scalar::<_, i32>(
                r#"
                INSERT INTO comments (movie_id, user_id, content, parent_comment_id, created_at)
                VALUES ($1, $2, $3, $4, NOW())
                RETURNING id
                "#,
            )
            .bind(comment.movie_id)
            .bind(comment.user_id)
            .bind(&comment.content)
            .bind(comment.parent_id)
            .fetch_one(&mut *transaction)
            .await?;
            transaction.commit().await?;
            Ok::<i32, StoreError>(id)
        }
        .instrument(query_span)
        .await?;
        self.comment_with_author(id).await
    }

    async fn edit_comment(
        &self,
        comment_id: i32,
        user_id: i32,
        content: &str,
    ) -> Result<Comment, StoreError> {
        let (owner, _) = self.comment_owner(comment_id).await?;
        if owner != user_id {
            return Err(StoreError::Forbidden(
                "You can only edit your own comments".to_string(),
            ));
        }
        sqlx::query("UPDATE comments SET content = $1, updated_at = NOW() WHERE id = $2")
            .bind(content)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        self.comment_with_author(comment_id).await
    }

    async fn delete_comment(&self, comment_id: i32, user_id: i32) -> Result<i32, StoreError> {
        let (owner, movie_id) = self.comment_owner(comment_id).await?;
        if owner != user_id {
            return Err(StoreError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }
        // replies go with it through ON DELETE CASCADE
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(movie_id)
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let query_span = tracing::info_span!("Saving new user details in the database");
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, username, email, role, is_banned, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .instrument(query_span)
        .await
        .map_err(conflict_on_unique("Username or email already in use"))
    }

    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, StoreError> {
        let row = sqlx::query_as::<_, CredentialsRow>(&format!(
            "SELECT {}, u.password_hash FROM users u WHERE u.email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| (row.user, row.password_hash)))
    }

    async fn create_session(
        &self,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn session(&self, session_id: Uuid) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT s.id AS session_id, s.expires_at, {} \
             FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.id = $1",
            USER_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| Session {
            id: row.session_id,
            user: row.user,
            expires_at: row.expires_at,
        }))
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn credentials_by_id(
        &self,
        user_id: i32,
    ) -> Result<Option<(User, String)>, StoreError> {
        let row = sqlx::query_as::<_, CredentialsRow>(&format!(
            "SELECT {}, u.password_hash FROM users u WHERE u.id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| (row.user, row.password_hash)))
    }

    async fn update_password(&self, user_id: i32, password_hash: &str) -> Result<(), StoreError> {
        let query_span = tracing::info_span!("Updating user password", user_id);
        let updated = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .instrument(query_span)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: i32) -> Result<(), StoreError> {
        let query_span = tracing::info_span!("Deleting user account", user_id);
        async {
            let mut transaction = self.pool.begin().await?;
            let rated: Vec<i32> =
                sqlx::query_scalar("SELECT movie_id FROM ratings WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_all(&mut *transaction)
                    .await?;
            // sessions, ratings, favorites and comments cascade
            let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&mut *transaction)
                .await?
                .rows_affected();
            if deleted == 0 {
                return Err(StoreError::NotFound("User"));
            }
            for movie_id in rated {
                sqlx::query("SELECT refresh_movie_rating($1)")
                    .bind(movie_id)
                    .execute(&mut *transaction)
                    .await?;
            }
            transaction.commit().await?;
            Ok::<(), StoreError>(())
        }
        .instrument(query_span)
        .await
    }
}

#[async_trait]
impl AdminStore for PgStore {
    async fn list_users(
        &self,
        username: Option<&str>,
        window: PageWindow,
    ) -> Result<Vec<User>, StoreError> {
        let mut builder = user_list_query(username, window);
        let users = builder.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn count_users(&self, username: Option<&str>) -> Result<u64, StoreError> {
        let mut builder = user_count_query(username);
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn set_banned(&self, user_id: i32, banned: bool) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET is_banned = $1 WHERE id = $2
            RETURNING id, username, email, role, is_banned, created_at
            "#,
        )
        .bind(banned)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("User"))
    }

    async fn set_role(&self, user_id: i32, role: Role) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET role = $1 WHERE id = $2
            RETURNING id, username, email, role, is_banned, created_at
            "#,
        )
        .bind(role)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("User"))
    }

    async fn update_movie(
        &self,
        movie_id: i32,
        update: &MovieUpdate,
    ) -> Result<Movie, StoreError> {
        let query_span = tracing::info_span!("Updating movie details", movie_id, ?update);
        async {
            let mut transaction = self.pool.begin().await?;
            sqlx::query_scalar::<_, i32>(
                r#"
                UPDATE movies
                SET title = COALESCE($1, title), description = COALESCE($2, description)
                WHERE id = $3
                RETURNING id
                "#,
            )
            .bind(update.title.as_deref())
            .bind(update.description.as_deref())
            .bind(movie_id)
            .fetch_optional(&mut *transaction)
            .await?
            .ok_or(StoreError::NotFound("Movie"))?;

            if let Some(genre_ids) = &update.genre_ids {
                let genre_ids = dedup_ids(genre_ids);
                let known: Vec<i32> =
                    sqlx::query_scalar("SELECT id FROM genres WHERE id = ANY($1)")
                        .bind(&genre_ids[..])
                        .fetch_all(&mut *transaction)
                        .await?;
                if let Some(unknown) = genre_ids.iter().find(|id| !known.contains(*id)) {
                    return Err(StoreError::InvalidInput(format!(
                        "Unknown genre id {}",
                        unknown
                    )));
                }
                sqlx::query("DELETE FROM movie_genres WHERE movie_id = $1")
                    .bind(movie_id)
                    .execute(&mut *transaction)
                    .await?;
                sqlx::query(
                    "INSERT INTO movie_genres (movie_id, genre_id) \
                     SELECT $1, UNNEST($2::INTEGER[])",
                )
                .bind(movie_id)
                .bind(&genre_ids[..])
                .execute(&mut *transaction)
                .await?;
            }
            transaction.commit().await?;
            Ok::<(), StoreError>(())
        }
        .instrument(query_span)
        .await?;
        self.movie(movie_id)
            .await?
            .ok_or(StoreError::NotFound("Movie"))
    }

    async fn delete_movie(&self, movie_id: i32) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(movie_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(StoreError::NotFound("Movie"));
        }
        Ok(())
    }
}
