use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, AdminStore, CatalogStore, FeedbackStore, StoreError};
use crate::models::{
    Comment, FavoriteEntry, FavoriteMovie, Genre, Movie, MovieUpdate, NewComment, NewUser,
    RatingEntry, Role, Session, User,
};
use crate::search::{MovieFilter, PageWindow, SortOrder};

#[derive(Debug, Clone)]
struct StoredRating {
    value: i32,
    rated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct State {
    movies: BTreeMap<i32, Movie>,
    genres: BTreeMap<i32, Genre>,
    // keyed by (movie_id, user_id)
    ratings: BTreeMap<(i32, i32), StoredRating>,
    favorites: BTreeMap<(i32, i32), DateTime<Utc>>,
    comments: Vec<Comment>,
    users: BTreeMap<i32, StoredUser>,
    sessions: HashMap<Uuid, (i32, DateTime<Utc>)>,
    last_comment_id: i32,
    last_user_id: i32,
}

impl State {
    fn favorite_ids(&self, user_id: i32) -> HashSet<i32> {
        self.favorites
            .keys()
            .filter(|(_, owner)| *owner == user_id)
            .map(|(movie_id, _)| *movie_id)
            .collect()
    }

    fn matching(&self, filter: &MovieFilter) -> Vec<&Movie> {
        let favorite_ids = filter
            .favorites_of
            .map(|user_id| self.favorite_ids(user_id))
            .unwrap_or_default();
        self.movies
            .values()
            .filter(|movie| filter.matches(movie, &favorite_ids))
            .collect()
    }

    fn require_movie(&self, movie_id: i32) -> Result<&Movie, StoreError> {
        self.movies.get(&movie_id).ok_or(StoreError::NotFound("Movie"))
    }

    fn refresh_movie_rating(&mut self, movie_id: i32) {
        let values: Vec<i32> = self
            .ratings
            .range((movie_id, i32::MIN)..=(movie_id, i32::MAX))
            .map(|(_, rating)| rating.value)
            .collect();
        let aggregate = if values.is_empty() {
            None
        } else {
            Some(values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64)
        };
        if let Some(movie) = self.movies.get_mut(&movie_id) {
            movie.rating = aggregate;
        }
    }

    fn users_named(&self, username: Option<&str>) -> Vec<User> {
        let needle = username.map(str::to_lowercase);
        self.users
            .values()
            .filter(|stored| match &needle {
                Some(needle) => stored.user.username.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .map(|stored| stored.user.clone())
            .collect()
    }

    fn genres_by_id(&self, ids: &[i32]) -> Result<Vec<Genre>, StoreError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        let mut genres = Vec::with_capacity(ids.len());
        for id in ids {
            let genre = self
                .genres
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::InvalidInput(format!("Unknown genre id {}", id)))?;
            genres.push(genre);
        }
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(genres)
    }

    fn comment_subtree(&self, root: i32) -> HashSet<i32> {
        let mut children: HashMap<i32, Vec<i32>> = HashMap::new();
        for comment in &self.comments {
            if let Some(parent_id) = comment.parent_id {
                children.entry(parent_id).or_default().push(comment.id);
            }
        }
        let mut subtree = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            for &child in children.get(&id).map(Vec::as_slice).unwrap_or_default() {
                if subtree.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        subtree
    }
}

/// In-process store with the same observable behaviour as [`super::PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_genre(&self, genre: Genre) {
        self.state.write().await.genres.insert(genre.id, genre);
    }

    /// Adds or replaces a catalog entry; its genres become selectable.
    pub async fn insert_movie(&self, movie: Movie) {
        let mut state = self.state.write().await;
        for genre in &movie.genres {
            state.genres.insert(genre.id, genre.clone());
        }
        state.movies.insert(movie.id, movie);
    }

    /// Stores `comment` as given, without checking its movie or parent.
    pub async fn insert_comment(&self, comment: Comment) {
        let mut state = self.state.write().await;
        state.last_comment_id = state.last_comment_id.max(comment.id);
        state.comments.push(comment);
    }

    pub async fn grant_admin(&self, user_id: i32) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let stored = state
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))?;
        stored.user.role = Role::Admin;
        Ok(stored.user.clone())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_movies(
        &self,
        filter: &MovieFilter,
        sort: SortOrder,
        window: PageWindow,
    ) -> Result<Vec<Movie>, StoreError> {
        let state = self.state.read().await;
        let mut movies = state.matching(filter);
        movies.sort_by(|a, b| sort.compare(a, b));
        Ok(window.slice(&movies).iter().map(|movie| (*movie).clone()).collect())
    }

    async fn count_movies(&self, filter: &MovieFilter) -> Result<u64, StoreError> {
        let state = self.state.read().await;
        Ok(state.matching(filter).len() as u64)
    }

    async fn genres(&self) -> Result<Vec<Genre>, StoreError> {
        let state = self.state.read().await;
        let mut genres: Vec<Genre> = state.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(genres)
    }

    async fn movie(&self, movie_id: i32) -> Result<Option<Movie>, StoreError> {
        Ok(self.state.read().await.movies.get(&movie_id).cloned())
    }

    async fn popular_movies(&self, limit: u32) -> Result<Vec<Movie>, StoreError> {
        let state = self.state.read().await;
        let mut movies: Vec<&Movie> = state.movies.values().collect();
        movies.sort_by(|a, b| match (a.popularity, b.popularity) {
            (Some(x), Some(y)) => y.total_cmp(&x).then(a.id.cmp(&b.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        Ok(movies
            .into_iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn comments_for_movie(&self, movie_id: i32) -> Result<Vec<Comment>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .filter(|comment| comment.movie_id == movie_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn upsert_rating(
        &self,
        movie_id: i32,
        user_id: i32,
        value: i32,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.require_movie(movie_id)?;
        state.ratings.insert(
            (movie_id, user_id),
            StoredRating {
                value,
                rated_at: Utc::now(),
            },
        );
        state.refresh_movie_rating(movie_id);
        Ok(())
    }

    async fn user_rating(&self, movie_id: i32, user_id: i32) -> Result<Option<i32>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .ratings
            .get(&(movie_id, user_id))
            .map(|rating| rating.value))
    }

    async fn user_ratings(&self, user_id: i32) -> Result<Vec<RatingEntry>, StoreError> {
        let state = self.state.read().await;
        let mut entries: Vec<RatingEntry> = state
            .ratings
            .iter()
            .filter(|((_, owner), _)| *owner == user_id)
            .filter_map(|((movie_id, _), rating)| {
                let movie = state.movies.get(movie_id)?;
                Some(RatingEntry {
                    movie_id: *movie_id,
                    movie_title: movie.title.clone(),
                    value: rating.value,
                    rated_at: rating.rated_at,
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.rated_at
                .cmp(&a.rated_at)
                .then(a.movie_id.cmp(&b.movie_id))
        });
        Ok(entries)
    }

    async fn toggle_favorite(&self, movie_id: i32, user_id: i32) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        state.require_movie(movie_id)?;
        if state.favorites.remove(&(movie_id, user_id)).is_some() {
            return Ok(false);
        }
        state.favorites.insert((movie_id, user_id), Utc::now());
        Ok(true)
    }

    async fn is_favorite(&self, movie_id: i32, user_id: i32) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        Ok(state.favorites.contains_key(&(movie_id, user_id)))
    }

    async fn remove_favorite(&self, movie_id: i32, user_id: i32) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.favorites.remove(&(movie_id, user_id)).is_some())
    }

    async fn user_favorites(&self, user_id: i32) -> Result<Vec<FavoriteEntry>, StoreError> {
        let state = self.state.read().await;
        let mut entries: Vec<FavoriteEntry> = state
            .favorites
            .iter()
            .filter(|((_, owner), _)| *owner == user_id)
            .map(|((movie_id, _), favorited_at)| FavoriteEntry {
                movie_id: *movie_id,
                favorited_at: *favorited_at,
            })
            .collect();
        entries.sort_by(|a, b| {
            a.favorited_at
                .cmp(&b.favorited_at)
                .then(a.movie_id.cmp(&b.movie_id))
        });
        Ok(entries)
    }

    async fn favorite_movies(&self, user_id: i32) -> Result<Vec<FavoriteMovie>, StoreError> {
        let state = self.state.read().await;
        let mut favorites: Vec<(DateTime<Utc>, FavoriteMovie)> = state
            .favorites
            .iter()
            .filter(|((_, owner), _)| *owner == user_id)
            .filter_map(|((movie_id, _), favorited_at)| {
                let movie = state.movies.get(movie_id)?;
                Some((
                    *favorited_at,
                    FavoriteMovie {
                        movie_id: movie.id,
                        title: movie.title.clone(),
                        poster_path: movie.poster_path.clone(),
                        rating: movie.rating,
                        release_date: movie.release_date,
                        genres: movie.genres.iter().map(|g| g.name.clone()).collect(),
                        is_watched: state.ratings.contains_key(&(movie.id, user_id)),
                    },
                ))
            })
            .collect();
        favorites.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.movie_id.cmp(&b.1.movie_id)));
        Ok(favorites.into_iter().map(|(_, movie)| movie).collect())
    }

    async fn add_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut state = self.state.write().await;
        state.require_movie(comment.movie_id)?;
        let author = state
            .users
            .get(&comment.user_id)
            .map(|stored| stored.user.username.clone())
            .ok_or(StoreError::NotFound("User"))?;
        if let Some(parent_id) = comment.parent_id {
            let parent = state
                .comments
                .iter()
                .find(|existing| existing.id == parent_id)
                .ok_or(StoreError::NotFound("Parent comment"))?;
            if parent.movie_id != comment.movie_id {
                return Err(StoreError::InvalidInput(
                    "Parent comment belongs to another movie".to_string(),
                ));
            }
        }
        state.last_comment_id += 1;
        let saved = Comment {
            id: state.last_comment_id,
            movie_id: comment.movie_id,
            user_id: comment.user_id,
            author,
            content: comment.content,
            created_at: Utc::now(),
            parent_id: comment.parent_id,
        };
        state.comments.push(saved.clone());
        Ok(saved)
    }

    async fn edit_comment(
        &self,
        comment_id: i32,
        user_id: i32,
        content: &str,
    ) -> Result<Comment, StoreError> {
        let mut state = self.state.write().await;
        let comment = state
            .comments
            .iter_mut()
            .find(|comment| comment.id == comment_id)
            .ok_or(StoreError::NotFound("Comment"))?;
        if comment.user_id != user_id {
            return Err(StoreError::Forbidden(
                "You can only edit your own comments".to_string(),
            ));
        }
        comment.content = content.to_string();
        Ok(comment.clone())
    }

    async fn delete_comment(&self, comment_id: i32, user_id: i32) -> Result<i32, StoreError> {
        let mut state = self.state.write().await;
        let comment = state
            .comments
            .iter()
            .find(|comment| comment.id == comment_id)
            .ok_or(StoreError::NotFound("Comment"))?;
        if comment.user_id != user_id {
            return Err(StoreError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }
        let movie_id = comment.movie_id;
        let doomed = state.comment_subtree(comment_id);
        state.comments.retain(|comment| !doomed.contains(&comment.id));
        Ok(movie_id)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let taken = state.users.values().any(|stored| {
            stored.user.username == user.username || stored.user.email == user.email
        });
        if taken {
            return Err(StoreError::Conflict(
                "Username or email already in use".to_string(),
            ));
        }
        state.last_user_id += 1;
        let created = User {
            id: state.last_user_id,
            username: user.username,
            email: user.email,
            role: Role::User,
            is_banned: false,
            created_at: Utc::now(),
        };
        state.users.insert(
            created.id,
            StoredUser {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(created)
    }

    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|stored| stored.user.email == email)
            .map(|stored| (stored.user.clone(), stored.password_hash.clone())))
    }

    async fn create_session(
        &self,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid, StoreError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::NotFound("User"));
        }
        let id = Uuid::new_v4();
        state.sessions.insert(id, (user_id, expires_at));
        Ok(id)
    }

    async fn session(&self, session_id: Uuid) -> Result<Option<Session>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .get(&session_id)
            .and_then(|(user_id, expires_at)| {
                state.users.get(user_id).map(|stored| Session {
                    id: session_id,
                    user: stored.user.clone(),
                    expires_at: *expires_at,
                })
            }))
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<(), StoreError> {
        self.state.write().await.sessions.remove(&session_id);
        Ok(())
    }

    async fn credentials_by_id(
        &self,
        user_id: i32,
    ) -> Result<Option<(User, String)>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .get(&user_id)
            .map(|stored| (stored.user.clone(), stored.password_hash.clone())))
    }

    async fn update_password(&self, user_id: i32, password_hash: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let stored = state
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))?;
        stored.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn delete_user(&self, user_id: i32) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.users.remove(&user_id).is_none() {
            return Err(StoreError::NotFound("User"));
        }
        state.sessions.retain(|_, (owner, _)| *owner != user_id);
        state.favorites.retain(|(_, owner), _| *owner != user_id);

        let rated: Vec<i32> = state
            .ratings
            .keys()
            .filter(|(_, owner)| *owner == user_id)
            .map(|(movie_id, _)| *movie_id)
            .collect();
        state.ratings.retain(|(_, owner), _| *owner != user_id);
        for movie_id in rated {
            state.refresh_movie_rating(movie_id);
        }

        let authored: Vec<i32> = state
            .comments
            .iter()
            .filter(|comment| comment.user_id == user_id)
            .map(|comment| comment.id)
            .collect();
        let mut doomed = HashSet::new();
        for comment_id in authored {
            doomed.extend(state.comment_subtree(comment_id));
        }
        state.comments.retain(|comment| !doomed.contains(&comment.id));
        Ok(())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn list_users(
        &self,
        username: Option<&str>,
        window: PageWindow,
    ) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        Ok(window.slice(&state.users_named(username)).to_vec())
    }

    async fn count_users(&self, username: Option<&str>) -> Result<u64, StoreError> {
        let state = self.state.read().await;
        Ok(state.users_named(username).len() as u64)
    }

    async fn set_banned(&self, user_id: i32, banned: bool) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let stored = state
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))?;
        stored.user.is_banned = banned;
        Ok(stored.user.clone())
    }

    async fn set_role(&self, user_id: i32, role: Role) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let stored = state
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))?;
        stored.user.role = role;
        Ok(stored.user.clone())
    }

    async fn update_movie(
        &self,
        movie_id: i32,
        update: &MovieUpdate,
    ) -> Result<Movie, StoreError> {
        let mut state = self.state.write().await;
        state.require_movie(movie_id)?;
        let genres = match &update.genre_ids {
            Some(ids) => Some(state.genres_by_id(ids)?),
            None => None,
        };
        let movie = state
            .movies
            .get_mut(&movie_id)
            .ok_or(StoreError::NotFound("Movie"))?;
        if let Some(genres) = genres {
            movie.genres = genres;
        }
        if let Some(title) = &update.title {
            movie.title = title.clone();
        }
        if let Some(description) = &update.description {
            movie.description = Some(description.clone());
        }
        Ok(movie.clone())
    }

    async fn delete_movie(&self, movie_id: i32) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.movies.remove(&movie_id).is_none() {
            return Err(StoreError::NotFound("Movie"));
        }
        state.ratings.retain(|(movie, _), _| *movie != movie_id);
        state.favorites.retain(|(movie, _), _| *movie != movie_id);
        state.comments.retain(|comment| comment.movie_id != movie_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Genre;

    fn movie(id: i32, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            description: None,
            release_date: None,
            rating: None,
            language: None,
            poster_path: None,
            runtime: None,
            popularity: Some(f64::from(id)),
            genres: vec![Genre {
                id: 1,
                name: "Drama".to_string(),
            }],
            actors: vec![],
        }
    }

    async fn store_with_user() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        store.insert_movie(movie(1, "Her")).await;
        store.insert_movie(movie(2, "Heat")).await;
        let user = store
            .create_user(NewUser {
                username: "critic".to_string(),
                email: "critic@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        (store, user)
    }

    #[actix_rt::test]
    async fn rating_upsert_replaces_value_and_refreshes_aggregate() {
        let (store, user) = store_with_user().await;
        store.upsert_rating(1, user.id, 4).await.unwrap();
        store.upsert_rating(1, user.id, 8).await.unwrap();
        store.upsert_rating(1, user.id + 100, 6).await.unwrap();

        assert_eq!(store.user_rating(1, user.id).await.unwrap(), Some(8));
        assert_eq!(store.user_ratings(user.id).await.unwrap().len(), 1);
        let movie = store.movie(1).await.unwrap().unwrap();
        assert_eq!(movie.rating, Some(7.0));
    }

    #[actix_rt::test]
    async fn rating_unknown_movie_is_not_found() {
        let (store, user) = store_with_user().await;
        let err = store.upsert_rating(99, user.id, 5).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Movie")));
    }

    #[actix_rt::test]
    async fn toggle_favorite_flips_state() {
        let (store, user) = store_with_user().await;
        assert!(store.toggle_favorite(2, user.id).await.unwrap());
        assert!(store.is_favorite(2, user.id).await.unwrap());
        assert!(!store.toggle_favorite(2, user.id).await.unwrap());
        assert!(!store.is_favorite(2, user.id).await.unwrap());
        assert!(!store.remove_favorite(2, user.id).await.unwrap());
    }

    #[actix_rt::test]
    async fn favorite_movies_flag_rated_ones_as_watched() {
        let (store, user) = store_with_user().await;
        store.toggle_favorite(1, user.id).await.unwrap();
        store.toggle_favorite(2, user.id).await.unwrap();
        store.upsert_rating(2, user.id, 9).await.unwrap();

        let favorites = store.favorite_movies(user.id).await.unwrap();
        assert_eq!(favorites.len(), 2);
        let heat = favorites.iter().find(|f| f.movie_id == 2).unwrap();
        assert!(heat.is_watched);
        assert_eq!(heat.genres, vec!["Drama".to_string()]);
        let her = favorites.iter().find(|f| f.movie_id == 1).unwrap();
        assert!(!her.is_watched);
    }

    #[actix_rt::test]
    async fn reply_must_target_same_movie() {
        let (store, user) = store_with_user().await;
        let root = store
            .add_comment(NewComment {
                movie_id: 1,
                user_id: user.id,
                content: "first".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();
        assert_eq!(root.author, "critic");

        let err = store
            .add_comment(NewComment {
                movie_id: 2,
                user_id: user.id,
                content: "wrong movie".to_string(),
                parent_id: Some(root.id),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));

        let err = store
            .add_comment(NewComment {
                movie_id: 1,
                user_id: user.id,
                content: "dangling".to_string(),
                parent_id: Some(404),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Parent comment")));
    }

    #[actix_rt::test]
    async fn deleting_comment_removes_its_replies() {
        let (store, user) = store_with_user().await;
        let mut parent = None;
        for content in ["a", "b", "c"] {
            let saved = store
                .add_comment(NewComment {
                    movie_id: 1,
                    user_id: user.id,
                    content: content.to_string(),
                    parent_id: parent,
                })
                .await
                .unwrap();
            parent = Some(saved.id);
        }
        let sibling = store
            .add_comment(NewComment {
                movie_id: 1,
                user_id: user.id,
                content: "d".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();

        let first_id = store.comments_for_movie(1).await.unwrap()[0].id;
        assert_eq!(store.delete_comment(first_id, user.id).await.unwrap(), 1);
        let remaining = store.comments_for_movie(1).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, sibling.id);
    }

    #[actix_rt::test]
    async fn only_the_author_can_edit_or_delete() {
        let (store, user) = store_with_user().await;
        let saved = store
            .add_comment(NewComment {
                movie_id: 1,
                user_id: user.id,
                content: "mine".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();

        let err = store
            .edit_comment(saved.id, user.id + 1, "theirs")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
        let err = store.delete_comment(saved.id, user.id + 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));

        let edited = store.edit_comment(saved.id, user.id, "edited").await.unwrap();
        assert_eq!(edited.content, "edited");
    }

    #[actix_rt::test]
    async fn duplicate_accounts_conflict() {
        let (store, _) = store_with_user().await;
        let err = store
            .create_user(NewUser {
                username: "critic".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn deleting_movie_drops_its_feedback() {
        let (store, user) = store_with_user().await;
        store.upsert_rating(1, user.id, 7).await.unwrap();
        store.toggle_favorite(1, user.id).await.unwrap();
        store.delete_movie(1).await.unwrap();

        assert!(store.movie(1).await.unwrap().is_none());
        assert!(store.user_ratings(user.id).await.unwrap().is_empty());
        assert!(store.user_favorites(user.id).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_movie(1).await.unwrap_err(),
            StoreError::NotFound("Movie")
        ));
    }

    #[actix_rt::test]
    async fn deleting_user_drops_feedback_and_refreshes_ratings() {
        let (store, user) = store_with_user().await;
        let other = store
            .create_user(NewUser {
                username: "other".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        store.upsert_rating(1, user.id, 2).await.unwrap();
        store.upsert_rating(1, other.id, 8).await.unwrap();
        store.toggle_favorite(1, user.id).await.unwrap();
        store.create_session(user.id, Utc::now()).await.unwrap();
        let root = store
            .add_comment(NewComment {
                movie_id: 1,
                user_id: user.id,
                content: "mine".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();
        store
            .add_comment(NewComment {
                movie_id: 1,
                user_id: other.id,
                content: "reply".to_string(),
                parent_id: Some(root.id),
            })
            .await
            .unwrap();
        let kept = store
            .add_comment(NewComment {
                movie_id: 1,
                user_id: other.id,
                content: "standalone".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();

        store.delete_user(user.id).await.unwrap();

        assert!(store.credentials_by_id(user.id).await.unwrap().is_none());
        assert_eq!(store.movie(1).await.unwrap().unwrap().rating, Some(8.0));
        assert!(store.user_favorites(user.id).await.unwrap().is_empty());
        let comments = store.comments_for_movie(1).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, kept.id);
        assert!(matches!(
            store.delete_user(user.id).await.unwrap_err(),
            StoreError::NotFound("User")
        ));
    }

    #[actix_rt::test]
    async fn user_listing_filters_by_name_and_pages() {
        let (store, _) = store_with_user().await;
        for name in ["Critic_Two", "viewer"] {
            store
                .create_user(NewUser {
                    username: name.to_string(),
                    email: format!("{}@example.com", name),
                    password_hash: "hash".to_string(),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.count_users(None).await.unwrap(), 3);
        assert_eq!(store.count_users(Some("CRITIC")).await.unwrap(), 2);
        let second_page = store
            .list_users(Some("critic"), PageWindow::sized(2, 1))
            .await
            .unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].username, "Critic_Two");
    }

    #[actix_rt::test]
    async fn movie_update_replaces_genres() {
        let (store, _) = store_with_user().await;
        store
            .insert_genre(Genre {
                id: 2,
                name: "Crime".to_string(),
            })
            .await;

        let update = MovieUpdate {
            genre_ids: Some(vec![2, 1, 2]),
            ..Default::default()
        };
        let movie = store.update_movie(2, &update).await.unwrap();
        let names: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Crime", "Drama"]);

        let unknown = MovieUpdate {
            title: Some("Renamed".to_string()),
            genre_ids: Some(vec![99]),
            ..Default::default()
        };
        let err = store.update_movie(2, &unknown).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
        assert_eq!(store.movie(2).await.unwrap().unwrap().title, "Heat");
    }

    #[actix_rt::test]
    async fn popular_movies_order_by_popularity() {
        let (store, _) = store_with_user().await;
        let popular = store.popular_movies(1).await.unwrap();
        assert_eq!(popular.len(), 1);
        assert_eq!(popular[0].id, 2);
    }
}
