use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::comment_tree::CommentNode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Actor {
    pub id: i32,
    pub name: String,
}

/// A catalog entry together with its genre and actor links.
///
/// `rating` is the aggregate of all user ratings. It is maintained by the
/// store whenever a rating changes and is only ever read here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub language: Option<String>,
    pub poster_path: Option<String>,
    pub runtime: Option<i32>,
    pub popularity: Option<f64>,
    pub genres: Vec<Genre>,
    pub actors: Vec<Actor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i32,
    pub movie_id: i32,
    pub user_id: i32,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub parent_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub movie_id: i32,
    pub user_id: i32,
    pub content: String,
    pub parent_id: Option<i32>,
}

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq, Clone, Copy, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: uuid::Uuid,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RatingEntry {
    pub movie_id: i32,
    pub movie_title: String,
    pub value: i32,
    pub rated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FavoriteEntry {
    pub movie_id: i32,
    pub favorited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteMovie {
    pub movie_id: i32,
    pub title: String,
    pub poster_path: Option<String>,
    pub rating: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub genres: Vec<String>,
    /// The owner of the list has rated this movie.
    pub is_watched: bool,
}

/// Admin edit of a movie. `None` leaves a field untouched; `genre_ids`
/// replaces every genre link when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre_ids: Option<Vec<i32>>,
}

/// Row of the admin movie listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagedMovie {
    pub id: i32,
    pub title: String,
    pub rating: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub genres: Vec<String>,
}

impl From<Movie> for ManagedMovie {
    fn from(movie: Movie) -> Self {
        ManagedMovie {
            id: movie.id,
            title: movie.title,
            rating: movie.rating,
            release_date: movie.release_date,
            genres: movie.genres.into_iter().map(|genre| genre.name).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieDetails {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub poster_path: Option<String>,
    pub rating: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub runtime: Option<i32>,
    pub language: Option<String>,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub user_rating: Option<i32>,
    pub is_favorite: bool,
    pub comments: Vec<CommentNode>,
}

impl MovieDetails {
    pub fn new(movie: Movie, comments: Vec<CommentNode>) -> Self {
        MovieDetails {
            id: movie.id,
            title: movie.title,
            description: movie.description,
            poster_path: movie.poster_path,
            rating: movie.rating,
            release_date: movie.release_date,
            runtime: movie.runtime,
            language: movie.language,
            genres: movie.genres.into_iter().map(|genre| genre.name).collect(),
            actors: movie.actors.into_iter().map(|actor| actor.name).collect(),
            user_rating: None,
            is_favorite: false,
            comments,
        }
    }
}
