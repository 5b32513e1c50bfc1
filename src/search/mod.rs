//! Faceted movie search.
//!
//! A [`SearchRequest`] is normalised into a [`MovieFilter`], a [`SortOrder`]
//! and a [`PageWindow`]; the catalog store evaluates them and the pipeline
//! packages one page of results with the counts a paginated UI needs.
//! Invalid page numbers and unknown sort keys are clamped or defaulted, so a
//! well-formed request always yields a result.

mod filter;
mod pagination;
mod sort;

pub use filter::*;
pub use pagination::*;
pub use sort::*;

use serde::{Deserialize, Serialize};

use crate::models::{Genre, Movie};
use crate::store::{CatalogStore, StoreError};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub genre_id: Option<i32>,
    pub min_rating: Option<f64>,
    pub release_year: Option<i32>,
    #[serde(default)]
    pub only_favorites: bool,
    pub page: Option<i64>,
    pub sort_order: Option<String>,
    pub language: Option<String>,
}

impl SearchRequest {
    /// Builds the store filter for this request.
    ///
    /// `only_favorites` needs a signed-in viewer; anonymous requests ignore
    /// the flag rather than failing. Whitespace-only queries and non-finite
    /// rating thresholds are treated as absent. A non-blank query is matched
    /// as typed, surrounding spaces included.
    pub fn to_filter(&self, viewer: Option<i32>) -> MovieFilter {
        MovieFilter {
            text: search_text(self.query.as_deref()),
            title: None,
            genre_id: self.genre_id,
            min_rating: self.min_rating.filter(|rating| rating.is_finite()),
            release_year: self.release_year,
            language: non_blank(self.language.as_deref()),
            favorites_of: if self.only_favorites { viewer } else { None },
        }
    }

    pub fn sort(&self) -> SortOrder {
        SortOrder::parse(self.sort_order.as_deref())
    }

    pub fn page(&self) -> u32 {
        clamp_page(self.page)
    }
}

/// Keeps a search needle unless it is whitespace only.
pub fn search_text(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Serialize, Debug, Clone)]
pub struct SearchResults {
    pub query: Option<String>,
    pub genre_id: Option<i32>,
    pub min_rating: Option<f64>,
    pub release_year: Option<i32>,
    pub language: Option<String>,
    pub only_favorites: bool,
    pub sort_order: SortOrder,
    pub results: Vec<Movie>,
    pub available_genres: Vec<Genre>,
    pub current_page: u32,
    pub page_size: u32,
    pub total_results: u64,
    pub total_pages: u64,
}

/// Runs one search against `store` on behalf of `viewer` (a user id).
pub async fn search_movies<S>(
    store: &S,
    request: &SearchRequest,
    viewer: Option<i32>,
) -> Result<SearchResults, StoreError>
where
    S: CatalogStore + ?Sized,
{
    let filter = request.to_filter(viewer);
    let sort_order = request.sort();
    let page = request.page();
    let window = PageWindow::for_page(page);

    if request.only_favorites && filter.favorites_of.is_none() {
        tracing::debug!("Ignoring favorites filter for anonymous search");
    }

    let total_results = store.count_movies(&filter).await?;
    let results = if window.offset < total_results {
        store.find_movies(&filter, sort_order, window).await?
    } else {
        Vec::new()
    };
    let available_genres = store.genres().await?;

    tracing::info!(
        total_results,
        page,
        sort_order = %sort_order,
        "Movie search completed"
    );

    Ok(SearchResults {
        query: filter.text,
        genre_id: filter.genre_id,
        min_rating: filter.min_rating,
        release_year: filter.release_year,
        language: filter.language,
        only_favorites: request.only_favorites,
        sort_order,
        results,
        available_genres,
        current_page: page,
        page_size: PAGE_SIZE,
        total_results,
        total_pages: total_pages(total_results),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_keeps_its_spaces_unless_blank() {
        let request = SearchRequest {
            query: Some("a ".to_string()),
            ..Default::default()
        };
        assert_eq!(request.to_filter(None).text.as_deref(), Some("a "));

        let blank = SearchRequest {
            query: Some(" \t ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.to_filter(None).text, None);
    }

    #[test]
    fn favorites_need_a_viewer() {
        let request = SearchRequest {
            only_favorites: true,
            min_rating: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(request.to_filter(None).favorites_of, None);
        assert_eq!(request.to_filter(Some(7)).favorites_of, Some(7));
        assert_eq!(request.to_filter(Some(7)).min_rating, None);
    }
}
