use std::collections::HashSet;

use chrono::NaiveDate;

use crate::models::Movie;

/// Conjunction of the predicates a movie search can apply.
///
/// `None` fields do not constrain the result. `text` matches
/// case-insensitively against the title, the linked genre names and the
/// linked actor names; `title` matches the title alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieFilter {
    pub text: Option<String>,
    pub title: Option<String>,
    pub genre_id: Option<i32>,
    pub min_rating: Option<f64>,
    pub release_year: Option<i32>,
    pub language: Option<String>,
    /// Restrict to the favorites of this user.
    pub favorites_of: Option<i32>,
}

impl MovieFilter {
    /// Checks `movie` against every predicate. `favorite_ids` holds the movie
    /// ids favorited by `favorites_of` and is ignored when that is unset.
    pub fn matches(&self, movie: &Movie, favorite_ids: &HashSet<i32>) -> bool {
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let hit = contains_ignore_case(&movie.title, &needle)
                || movie
                    .genres
                    .iter()
                    .any(|genre| contains_ignore_case(&genre.name, &needle))
                || movie
                    .actors
                    .iter()
                    .any(|actor| contains_ignore_case(&actor.name, &needle));
            if !hit {
                return false;
            }
        }

        if let Some(title) = &self.title {
            if !contains_ignore_case(&movie.title, &title.to_lowercase()) {
                return false;
            }
        }

        if let Some(genre_id) = self.genre_id {
            if !movie.genres.iter().any(|genre| genre.id == genre_id) {
                return false;
            }
        }

        if let Some(min_rating) = self.min_rating {
            match movie.rating {
                Some(rating) if rating >= min_rating => {}
                _ => return false,
            }
        }

        if let Some(year) = self.release_year {
            let Some((first, last)) = year_bounds(year) else {
                return false;
            };
            match movie.release_date {
                Some(date) if date >= first && date <= last => {}
                _ => return false,
            }
        }

        if let Some(language) = &self.language {
            if movie.language.as_deref() != Some(language.as_str()) {
                return false;
            }
        }

        if self.favorites_of.is_some() && !favorite_ids.contains(&movie.id) {
            return false;
        }

        true
    }
}

/// Earliest day a PostgreSQL `DATE` can hold (4714-11-24 BC).
const EARLIEST_STORABLE_DAY: (i32, u32, u32) = (-4713, 11, 24);

/// First and last storable day of `year`, or `None` when no day of the year
/// can be represented as a calendar date in both stores.
pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let (y, m, d) = EARLIEST_STORABLE_DAY;
    let earliest = NaiveDate::from_ymd_opt(y, m, d)?;
    let first = NaiveDate::from_ymd_opt(year, 1, 1)?.max(earliest);
    let last = NaiveDate::from_ymd_opt(year, 12, 31)?;
    if last < first {
        return None;
    }
    Some((first, last))
}

/// Builds a `LIKE` / `ILIKE` pattern that matches `text` anywhere, with the
/// pattern metacharacters escaped.
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn contains_ignore_case(haystack: &str, lowercase_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_needle)
}
