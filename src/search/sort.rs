use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Movie;

/// Result ordering of a movie search.
///
/// Every variant falls back to the movie id (ascending) when the primary key
/// ties, so a query always produces the same sequence and pages never
/// overlap. Missing ratings and release dates sort last in both directions.
#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    RatingDesc,
    RatingAsc,
    TitleAsc,
    TitleDesc,
    Newest,
    Oldest,
}

impl SortOrder {
    pub const ALL: [SortOrder; 6] = [
        SortOrder::RatingDesc,
        SortOrder::RatingAsc,
        SortOrder::TitleAsc,
        SortOrder::TitleDesc,
        SortOrder::Newest,
        SortOrder::Oldest,
    ];

    /// Unknown or missing keys fall back to `rating_desc`.
    pub fn parse(key: Option<&str>) -> Self {
        match key.map(str::trim) {
            Some("rating_desc") => SortOrder::RatingDesc,
            Some("rating_asc") => SortOrder::RatingAsc,
            Some("title_asc") => SortOrder::TitleAsc,
            Some("title_desc") => SortOrder::TitleDesc,
            Some("newest") => SortOrder::Newest,
            Some("oldest") => SortOrder::Oldest,
            Some(other) => {
                tracing::debug!("Unknown sort order {:?}, using rating_desc", other);
                SortOrder::default()
            }
            None => SortOrder::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::RatingDesc => "rating_desc",
            SortOrder::RatingAsc => "rating_asc",
            SortOrder::TitleAsc => "title_asc",
            SortOrder::TitleDesc => "title_desc",
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
        }
    }

    pub fn compare(&self, a: &Movie, b: &Movie) -> Ordering {
        let primary = match self {
            SortOrder::RatingDesc => nulls_last(a.rating, b.rating, |x, y| y.total_cmp(x)),
            SortOrder::RatingAsc => nulls_last(a.rating, b.rating, |x, y| x.total_cmp(y)),
            SortOrder::TitleAsc => a.title.cmp(&b.title),
            SortOrder::TitleDesc => b.title.cmp(&a.title),
            SortOrder::Newest => nulls_last(a.release_date, b.release_date, |x, y| y.cmp(x)),
            SortOrder::Oldest => nulls_last(a.release_date, b.release_date, |x, y| x.cmp(y)),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }

    /// `ORDER BY` body matching [`SortOrder::compare`] for a `movies m` scan.
    ///
    /// Titles use the "C" collation so the database orders them byte-wise,
    /// like `str::cmp`.
    pub fn order_by_clause(&self) -> &'static str {
        match self {
            SortOrder::RatingDesc => "m.rating DESC NULLS LAST, m.id ASC",
            SortOrder::RatingAsc => "m.rating ASC NULLS LAST, m.id ASC",
            SortOrder::TitleAsc => r#"m.title COLLATE "C" ASC, m.id ASC"#,
            SortOrder::TitleDesc => r#"m.title COLLATE "C" DESC, m.id ASC"#,
            SortOrder::Newest => "m.release_date DESC NULLS LAST, m.id ASC",
            SortOrder::Oldest => "m.release_date ASC NULLS LAST, m.id ASC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn nulls_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
