
use chrono::Utc;
use serde_json::{json, Value};
use test_startup::*;

async fn get_json(app: &TestApp, path: &str, user: &TestUser) -> Value {
    let res = app.get(path, Some(user)).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 200, "{}", path);
    res.json().await.unwrap()
}

#[actix_rt::test]
async fn statistics_reflect_ratings_and_favorites() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;

    for (movie_id, value) in [(1, 8), (2, 5)] {
        app.post(&format!("/movies/{}/rating", movie_id), Some(&user))
            .json(&json!({ "value": value }))
            .send()
            .await
            .unwrap();
    }
    app.post("/movies/3/favorite", Some(&user))
        .send()
        .await
        .unwrap();

    let summary = get_json(&app, "/stats/summary", &user).await;
    assert_eq!(summary["data"]["total_ratings"], 2);
    assert_eq!(summary["data"]["total_favorites"], 1);
    assert_eq!(summary["data"]["average_rating"], 6.5);

    let average = get_json(&app, "/stats/average", &user).await;
    assert_eq!(average["data"]["average_rating"], 6.5);

    let today = Utc::now().date_naive().to_string();
    let ratings = get_json(&app, "/stats/ratings", &user).await;
    assert_eq!(ratings["data"][0]["date"], today);
    assert_eq!(ratings["data"][0]["average_rating"], 6.5);

    let favorites = get_json(&app, "/stats/favorites", &user).await;
    assert_eq!(favorites["data"][0]["count"], 1);

    let activity = get_json(&app, "/stats/activity", &user).await;
    let activity = activity["data"].as_array().unwrap();
    let total: i64 = activity
        .iter()
        .map(|point| point["count"].as_i64().unwrap())
        .sum();
    assert_eq!(total, 3);

    let recent = get_json(&app, "/stats/recent?limit=1", &user).await;
    assert_eq!(recent["data"].as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn date_range_excludes_other_days() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;
    app.post("/movies/1/rating", Some(&user))
        .json(&json!({ "value": 9 }))
        .send()
        .await
        .unwrap();

    let summary = get_json(
        &app,
        "/stats/summary?from=2000-01-01&to=2000-12-31",
        &user,
    )
    .await;
    assert_eq!(summary["data"]["total_ratings"], 0);
    assert_eq!(summary["data"]["average_rating"], 0.0);
}

#[actix_rt::test]
async fn invalid_statistics_requests() {
    let app = spawn_app().await;
    let user = app.sign_up("critic").await;

    let res = app
        .get("/stats/summary?from=2024-05-01&to=2024-04-01", Some(&user))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    let res = app
        .get("/stats/recent?limit=0", Some(&user))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    let res = app.get("/stats/summary", None).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 401);
}
