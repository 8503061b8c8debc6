mod common;

use common::{Client, data, spawn};

#[tokio::test]
async fn book_crud_and_soft_delete() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("books@example.com", "a-real-password").await.status, 201);

    let create = client
        .post("/api/books", serde_json::json!({ "title": "The Hobbit", "author": "J.R.R. Tolkien" }))
        .await;
    assert_eq!(create.status, 201);
    let book_id = data(&create)["id"].as_str().unwrap().to_string();
    assert_eq!(data(&create)["visibility"], "draft");
    assert_eq!(data(&create)["coverBgMode"], "default");

    let list = client.get("/api/books").await;
    assert_eq!(list.status, 200);
    assert_eq!(data(&list).as_array().unwrap().len(), 1);

    let patch = client
        .patch(&format!("/api/books/{book_id}"), serde_json::json!({ "title": "There and Back Again" }))
        .await;
    assert_eq!(patch.status, 200);
    assert_eq!(data(&patch)["title"], "There and Back Again");

    let delete = client.delete(&format!("/api/books/{book_id}")).await;
    assert_eq!(delete.status, 204);

    let get_after_delete = client.get(&format!("/api/books/{book_id}")).await;
    assert_eq!(get_after_delete.status, 404);

    let list_after_delete = client.get("/api/books").await;
    assert_eq!(data(&list_after_delete).as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn chapter_create_and_content_fetch() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("chapters@example.com", "a-real-password").await.status, 201);

    let book = client
        .post("/api/books", serde_json::json!({ "title": "The Hobbit" }))
        .await;
    let book_id = data(&book)["id"].as_str().unwrap().to_string();

    let chapter = client
        .post(
            &format!("/api/books/{book_id}/chapters"),
            serde_json::json!({ "title": "Ch1", "htmlContent": "<p>In a hole in the ground...</p>" }),
        )
        .await;
    assert_eq!(chapter.status, 201);
    assert_eq!(data(&chapter)["hasContent"], true);
    let chapter_id = data(&chapter)["id"].as_str().unwrap().to_string();

    let content = client
        .get(&format!("/api/books/{book_id}/chapters/{chapter_id}/content"))
        .await;
    assert_eq!(content.status, 200);
    assert_eq!(data(&content), "<article><p>In a hole in the ground...</p></article>");
}

#[tokio::test]
async fn reorder_requires_set_equality_and_renumbers_densely() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("reorder@example.com", "a-real-password").await.status, 201);

    let mut ids = Vec::new();
    for title in ["One", "Two", "Three"] {
        let created = client.post("/api/books", serde_json::json!({ "title": title })).await;
        ids.push(data(&created)["id"].as_str().unwrap().to_string());
    }

    let reversed = vec![ids[2].clone(), ids[0].clone(), ids[1].clone()];
    let reorder = client
        .patch("/api/books/reorder", serde_json::json!({ "ids": reversed }))
        .await;
    assert_eq!(reorder.status, 200);
    let reordered = data(&reorder).as_array().unwrap();
    assert_eq!(reordered[0]["id"], reversed[0]);
    assert_eq!(reordered[0]["position"], 0);
    assert_eq!(reordered[1]["position"], 1);
    assert_eq!(reordered[2]["position"], 2);

    // Omitting one id from the set is rejected rather than silently
    // dropping the book from the ordering.
    let incomplete = vec![ids[0].clone(), ids[1].clone()];
    let rejected = client
        .patch("/api/books/reorder", serde_json::json!({ "ids": incomplete }))
        .await;
    assert_eq!(rejected.status, 409);
}

#[tokio::test]
async fn cross_user_access_is_forbidden_not_leaked_as_not_found() {
    let app = spawn().await;
    let mut owner = Client::new(&app);
    let mut stranger = Client::new(&app);
    assert_eq!(owner.register("owner@example.com", "a-real-password").await.status, 201);
    assert_eq!(stranger.register("stranger@example.com", "a-real-password").await.status, 201);

    let created = owner.post("/api/books", serde_json::json!({ "title": "Private" })).await;
    let book_id = data(&created)["id"].as_str().unwrap().to_string();

    let stolen_read = stranger.get(&format!("/api/books/{book_id}")).await;
    assert_eq!(stolen_read.status, 403);

    let missing_book = stranger.get("/api/books/does-not-exist").await;
    assert_eq!(missing_book.status, 404);
}

#[tokio::test]
async fn patch_conflicts_on_stale_if_unmodified_since() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("concurrency@example.com", "a-real-password").await.status, 201);

    let created = client.post("/api/books", serde_json::json!({ "title": "Original" })).await;
    let book_id = data(&created)["id"].as_str().unwrap().to_string();
    let created_at = data(&created)["updatedAt"].as_i64().unwrap();

    // Matching the row's own updatedAt exactly is not stale (the check is
    // strictly-greater-than), so the first edit goes through.
    let first_patch = client
        .patch_with_header(
            &format!("/api/books/{book_id}"),
            serde_json::json!({ "title": "First edit" }),
            "if-unmodified-since",
            &created_at.to_string(),
        )
        .await;
    assert_eq!(first_patch.status, 200);

    // A timestamp from strictly before creation can never match the row's
    // current updatedAt (which only ever moves forward), so this is a
    // deterministic conflict regardless of how much wall-clock time the
    // two edits above actually took.
    let definitely_stale = (created_at - 1).to_string();
    let second_patch = client
        .patch_with_header(
            &format!("/api/books/{book_id}"),
            serde_json::json!({ "title": "Second edit" }),
            "if-unmodified-since",
            &definitely_stale,
        )
        .await;
    assert_eq!(second_patch.status, 409);
    assert_eq!(second_patch.json["error"], "conflict");
}

#[tokio::test]
async fn book_not_found_on_unrelated_chapter_paths() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("orphan@example.com", "a-real-password").await.status, 201);

    let listing = client.get("/api/books/nope/chapters").await;
    assert_eq!(listing.status, 404);
}
