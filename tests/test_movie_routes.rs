
use serde_json::{json, Value};
use test_startup::*;

fn titles(body: &Value) -> Vec<String> {
    body["data"]["results"]
        .as_array()
        .expect("results array")
        .iter()
        .map(|movie| movie["title"].as_str().unwrap().to_string())
        .collect()
}

async fn search(app: &TestApp, query: &str, user: Option<&TestUser>) -> Value {
    let res = app
        .get(&format!("/movies/search{}", query), user)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(res.status().as_u16(), 200);
    res.json().await.expect("Failed to parse search body")
}

#[actix_rt::test]
async fn min_rating_keeps_only_dune() {
    let app = spawn_app().await;
    app.seed_catalog().await;

    let body = search(&app, "?min_rating=8.0&sort_order=rating_desc&page=1", None).await;
    assert_eq!(titles(&body), vec!["Dune"]);
    assert_eq!(body["data"]["total_results"], 1);
    assert_eq!(body["data"]["total_pages"], 1);
    assert_eq!(body["data"]["current_page"], 1);
    assert_eq!(body["data"]["sort_order"], "rating_desc");
    assert_eq!(body["data"]["available_genres"].as_array().unwrap().len(), 2);
}

#[actix_rt::test]
async fn text_search_covers_titles_genres_and_actors() {
    let app = spawn_app().await;
    app.seed_catalog().await;

    assert_eq!(titles(&search(&app, "?query=zendaya", None).await), vec!["Dune"]);
    assert_eq!(
        titles(&search(&app, "?query=DRAMA", None).await),
        vec!["Her", "Untitled Drama"]
    );
    assert_eq!(titles(&search(&app, "?query=her", None).await), vec!["Her"]);
}

#[actix_rt::test]
async fn facets_and_sorting() {
    let app = spawn_app().await;
    app.seed_catalog().await;

    assert_eq!(
        titles(&search(&app, "?genre_id=2", None).await),
        vec!["Her", "Untitled Drama"]
    );
    assert_eq!(
        titles(&search(&app, "?release_year=2013", None).await),
        vec!["Her"]
    );
    assert_eq!(
        titles(&search(&app, "?sort_order=title_asc", None).await),
        vec!["Dune", "Her", "Untitled Drama"]
    );
    assert_eq!(
        titles(&search(&app, "?sort_order=newest", None).await),
        vec!["Dune", "Her", "Untitled Drama"]
    );
    let unknown = search(&app, "?sort_order=sideways", None).await;
    assert_eq!(unknown["data"]["sort_order"], "rating_desc");
    assert_eq!(titles(&unknown), vec!["Dune", "Her", "Untitled Drama"]);
}

#[actix_rt::test]
async fn out_of_range_pages_are_handled() {
    let app = spawn_app().await;
    app.seed_catalog().await;

    let first = search(&app, "?page=0", None).await;
    assert_eq!(first["data"]["current_page"], 1);
    assert_eq!(titles(&first).len(), 3);

    let beyond = search(&app, "?page=5", None).await;
    assert!(titles(&beyond).is_empty());
    assert_eq!(beyond["data"]["total_results"], 3);
}

#[actix_rt::test]
async fn favorites_filter_needs_a_viewer() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;

    let res = app
        .post("/movies/2/favorite", Some(&user))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let anonymous = search(&app, "?only_favorites=true", None).await;
    assert_eq!(titles(&anonymous).len(), 3);

    let mine = search(&app, "?only_favorites=true", Some(&user)).await;
    assert_eq!(titles(&mine), vec!["Her"]);
    assert_eq!(mine["data"]["only_favorites"], true);
}

#[actix_rt::test]
async fn movie_details_reflect_the_viewer() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;

    let res = app.get("/movies/1", None).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Dune");
    assert_eq!(body["data"]["genres"], json!(["Science Fiction"]));
    assert_eq!(body["data"]["actors"], json!(["Zendaya"]));
    assert_eq!(body["data"]["user_rating"], Value::Null);
    assert_eq!(body["data"]["is_favorite"], false);
    assert_eq!(body["data"]["comments"], json!([]));

    let res = app
        .post("/movies/1/rating", Some(&user))
        .json(&json!({ "value": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let rated: Value = res.json().await.unwrap();
    assert_eq!(rated["data"]["rating"], 9.0);

    app.post("/movies/1/favorite", Some(&user))
        .send()
        .await
        .unwrap();

    let body: Value = app
        .get("/movies/1", Some(&user))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["user_rating"], 9);
    assert_eq!(body["data"]["is_favorite"], true);
    assert_eq!(body["data"]["rating"], 9.0);
}

#[actix_rt::test]
async fn unknown_movie_is_not_found() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;

    let res = app.get("/movies/999", None).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 404);

    let res = app
        .post("/movies/999/rating", Some(&user))
        .json(&json!({ "value": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
}

#[actix_rt::test]
async fn rating_is_validated_and_requires_a_session() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;

    let res = app
        .post("/movies/1/rating", None)
        .json(&json!({ "value": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);

    for value in [0, 11] {
        let res = app
            .post("/movies/1/rating", Some(&user))
            .json(&json!({ "value": value }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "Rating must be between 1 and 10");
    }
}

#[actix_rt::test]
async fn favorites_list_marks_watched_movies() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;

    for movie_id in [1, 2] {
        let res = app
            .post(&format!("/movies/{}/favorite", movie_id), Some(&user))
            .send()
            .await
            .unwrap();
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["data"]["is_favorite"], true);
    }
    app.post("/movies/1/rating", Some(&user))
        .json(&json!({ "value": 7 }))
        .send()
        .await
        .unwrap();

    let body: Value = app
        .get("/favorites", Some(&user))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let favorites = body["data"].as_array().unwrap();
    assert_eq!(favorites.len(), 2);
    let dune = favorites.iter().find(|f| f["movie_id"] == 1).unwrap();
    assert_eq!(dune["is_watched"], true);
    let her = favorites.iter().find(|f| f["movie_id"] == 2).unwrap();
    assert_eq!(her["is_watched"], false);

    let res = app.delete("/favorites/2", Some(&user)).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let res = app.delete("/favorites/2", Some(&user)).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 404);

    let res = app.get("/favorites", None).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 401);
}

#[actix_rt::test]
async fn toggling_twice_removes_the_favorite() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;

    app.post("/movies/3/favorite", Some(&user))
        .send()
        .await
        .unwrap();
    let body: Value = app
        .post("/movies/3/favorite", Some(&user))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["is_favorite"], false);
}

#[actix_rt::test]
async fn popular_movies_are_ordered_by_popularity() {
    let app = spawn_app().await;
    app.seed_catalog().await;

    let body: Value = app
        .get("/movies/popular", None)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|movie| movie["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}
