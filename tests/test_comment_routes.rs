
use serde_json::{json, Value};
use test_startup::*;

async fn comment(
    app: &TestApp,
    user: &TestUser,
    movie_id: i32,
    content: &str,
    parent_id: Option<i64>,
) -> reqwest::Response {
    app.post(&format!("/movies/{}/comments", movie_id), Some(user))
        .json(&json!({ "content": content, "parent_id": parent_id }))
        .send()
        .await
        .expect("Failed to execute request")
}

async fn comment_id(res: reqwest::Response) -> i64 {
    assert_eq!(res.status().as_u16(), 201);
    let body: Value = res.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

async fn comment_tree(app: &TestApp, movie_id: i32) -> Value {
    let body: Value = app
        .get(&format!("/movies/{}", movie_id), None)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["data"]["comments"].clone()
}

#[actix_rt::test]
async fn replies_are_nested_under_their_parent() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;

    let root = comment_id(comment(&app, &user, 1, "Spice must flow", None).await).await;
    let reply = comment_id(comment(&app, &user, 1, "Agreed", Some(root)).await).await;
    let nested = comment_id(comment(&app, &user, 1, "  Indeed  ", Some(reply)).await).await;
    let second = comment_id(comment(&app, &user, 1, "Long runtime", None).await).await;

    let tree = comment_tree(&app, 1).await;
    let top = tree.as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["id"], root);
    assert_eq!(top[0]["author"], "critic");
    assert_eq!(top[0]["replies"][0]["id"], reply);
    assert_eq!(top[0]["replies"][0]["replies"][0]["id"], nested);
    assert_eq!(top[0]["replies"][0]["replies"][0]["content"], "Indeed");
    assert_eq!(top[1]["id"], second);
    assert_eq!(top[1]["replies"], json!([]));
}

#[actix_rt::test]
async fn invalid_comments_are_rejected() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;

    let res = comment(&app, &user, 1, "   ", None).await;
    assert_eq!(res.status().as_u16(), 400);

    let res = comment(&app, &user, 1, &"a".repeat(2001), None).await;
    assert_eq!(res.status().as_u16(), 400);

    let res = comment(&app, &user, 999, "Lost", None).await;
    assert_eq!(res.status().as_u16(), 404);

    let res = comment(&app, &user, 1, "Dangling", Some(12345)).await;
    assert_eq!(res.status().as_u16(), 404);

    let res = app
        .post("/movies/1/comments", None)
        .json(&json!({ "content": "anonymous" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);
}

#[actix_rt::test]
async fn reply_must_stay_on_the_same_movie() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;

    let root = comment_id(comment(&app, &user, 1, "About Dune", None).await).await;
    let res = comment(&app, &user, 2, "About Her?", Some(root)).await;
    assert_eq!(res.status().as_u16(), 400);
}

#[actix_rt::test]
async fn only_the_author_can_edit_or_delete() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let author = app.sign_up("author").await;
    let other = app.sign_up("other").await;

    let id = comment_id(comment(&app, &author, 1, "Original", None).await).await;
    let path = format!("/comments/{}", id);

    let res = app
        .patch(&path, Some(&other))
        .json(&json!({ "content": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 403);

    let res = app.delete(&path, Some(&other)).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 403);

    let res = app
        .patch(&path, Some(&author))
        .json(&json!({ "content": " Edited " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["content"], "Edited");

    let res = app
        .patch("/comments/999", Some(&author))
        .json(&json!({ "content": "Nothing" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
}

#[actix_rt::test]
async fn deleting_a_comment_removes_its_replies() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let user = app.sign_up("critic").await;

    let root = comment_id(comment(&app, &user, 1, "Root", None).await).await;
    let reply = comment_id(comment(&app, &user, 1, "Reply", Some(root)).await).await;
    comment_id(comment(&app, &user, 1, "Nested", Some(reply)).await).await;
    let kept = comment_id(comment(&app, &user, 1, "Kept", None).await).await;

    let res = app
        .delete(&format!("/comments/{}", root), Some(&user))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["movie_id"], 1);

    let tree = comment_tree(&app, 1).await;
    let top = tree.as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["id"], kept);
}
