
use std::collections::HashSet;

use movie_feedback::search::{search_movies, PageWindow, SearchRequest, SortOrder, PAGE_SIZE};
use movie_feedback::store::{CatalogStore, FeedbackStore, MemoryStore};
use test_startup::*;

/// 25 movies with repeated ratings, titles and dates so every ordering has ties.
async fn crowded_store() -> MemoryStore {
    let store = MemoryStore::new();
    for id in 1..=25 {
        let rating = if id % 5 == 0 { None } else { Some(f64::from(id % 4) + 6.0) };
        let date = if id % 7 == 0 {
            None
        } else {
            Some((2000 + id % 3, 1 + (id % 12) as u32, 1))
        };
        let genres = if id % 2 == 0 { vec![drama()] } else { vec![science_fiction()] };
        let title = format!("Film {}", id % 6);
        store.insert_movie(movie(id, &title, rating, date, genres)).await;
    }
    store
}

fn request(sort: &str, page: i64) -> SearchRequest {
    SearchRequest {
        sort_order: Some(sort.to_string()),
        page: Some(page),
        ..Default::default()
    }
}

async fn ids(store: &MemoryStore, request: &SearchRequest, viewer: Option<i32>) -> Vec<i32> {
    search_movies(store, request, viewer)
        .await
        .unwrap()
        .results
        .iter()
        .map(|movie| movie.id)
        .collect()
}

#[actix_rt::test]
async fn dune_and_her_scenario() {
    let store = MemoryStore::new();
    for movie in catalog() {
        store.insert_movie(movie).await;
    }
    let request = SearchRequest {
        min_rating: Some(8.0),
        sort_order: Some("rating_desc".to_string()),
        page: Some(1),
        ..Default::default()
    };

    let results = search_movies(&store, &request, None).await.unwrap();
    let titles: Vec<&str> = results.results.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune"]);
    assert_eq!(results.total_results, 1);
    assert_eq!(results.total_pages, 1);
    assert_eq!(results.page_size, PAGE_SIZE);
}

#[actix_rt::test]
async fn pages_partition_the_sorted_result_set() {
    let store = crowded_store().await;
    for sort in SortOrder::ALL {
        let first = search_movies(&store, &request(sort.as_str(), 1), None)
            .await
            .unwrap();
        assert_eq!(first.total_results, 25);
        assert_eq!(first.total_pages, 3);

        let mut seen = Vec::new();
        for page in 1..=first.total_pages as i64 {
            let page_ids = ids(&store, &request(sort.as_str(), page), None).await;
            assert!(page_ids.len() <= PAGE_SIZE as usize);
            seen.extend(page_ids);
        }
        assert_eq!(seen.len(), 25, "{}", sort);
        let unique: HashSet<i32> = seen.iter().copied().collect();
        assert_eq!(unique.len(), 25, "{}", sort);

        let filter = request(sort.as_str(), 1).to_filter(None);
        let whole = store
            .find_movies(&filter, sort, PageWindow::unbounded())
            .await
            .unwrap();
        assert!(whole
            .windows(2)
            .all(|pair| sort.compare(&pair[0], &pair[1]).is_lt()));
        let whole_ids: Vec<i32> = whole.iter().map(|movie| movie.id).collect();
        assert_eq!(seen, whole_ids, "{}", sort);

        let beyond = ids(&store, &request(sort.as_str(), 4), None).await;
        assert!(beyond.is_empty());
    }
}

#[actix_rt::test]
async fn repeated_queries_return_the_same_order() {
    let store = crowded_store().await;
    for sort in SortOrder::ALL {
        let first = ids(&store, &request(sort.as_str(), 2), None).await;
        let second = ids(&store, &request(sort.as_str(), 2), None).await;
        assert_eq!(first, second, "{}", sort);
    }
}

#[actix_rt::test]
async fn adding_a_predicate_never_grows_the_result() {
    let store = crowded_store().await;
    let base = SearchRequest {
        query: Some("film".to_string()),
        ..Default::default()
    };
    let narrowed = [
        SearchRequest {
            genre_id: Some(2),
            ..base.clone()
        },
        SearchRequest {
            min_rating: Some(8.0),
            ..base.clone()
        },
        SearchRequest {
            release_year: Some(2001),
            ..base.clone()
        },
        SearchRequest {
            query: Some("film 3".to_string()),
            ..base.clone()
        },
    ];

    let all = search_movies(&store, &base, None).await.unwrap().total_results;
    for request in &narrowed {
        let fewer = search_movies(&store, request, None).await.unwrap().total_results;
        assert!(fewer <= all);
    }

    let combined = SearchRequest {
        genre_id: Some(2),
        min_rating: Some(8.0),
        ..base.clone()
    };
    let by_genre = search_movies(&store, &narrowed[0], None).await.unwrap();
    let both = search_movies(&store, &combined, None).await.unwrap();
    assert!(both.total_results <= by_genre.total_results);
    for movie in &both.results {
        assert!(movie.genres.iter().any(|genre| genre.id == 2));
        assert!(movie.rating.unwrap() >= 8.0);
    }
}

#[actix_rt::test]
async fn favorites_flag_without_viewer_is_ignored() {
    let store = crowded_store().await;
    store.toggle_favorite(3, 42).await.unwrap();

    let with_flag = SearchRequest {
        only_favorites: true,
        ..request("title_asc", 1)
    };
    let anonymous = ids(&store, &with_flag, None).await;
    let unfiltered = ids(&store, &request("title_asc", 1), None).await;
    assert_eq!(anonymous, unfiltered);

    let viewer = ids(&store, &with_flag, Some(42)).await;
    assert_eq!(viewer, vec![3]);
}

#[actix_rt::test]
async fn unknown_sort_key_uses_rating_desc() {
    let store = crowded_store().await;
    let unknown = search_movies(&store, &request("by_mood", 1), None)
        .await
        .unwrap();
    assert_eq!(unknown.sort_order, SortOrder::RatingDesc);
    assert_eq!(
        unknown.results.iter().map(|m| m.id).collect::<Vec<_>>(),
        ids(&store, &request("rating_desc", 1), None).await
    );
}
