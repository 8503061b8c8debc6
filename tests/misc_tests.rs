mod common;

use common::{Client, data, spawn};

#[tokio::test]
async fn health_reports_ok_with_a_working_db_and_store() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    let health = client.get("/api/health").await;
    assert_eq!(health.status, 200);
    assert_eq!(health.json["data"]["status"], "ok");
    assert_eq!(health.json["data"]["db"]["ok"], true);
    assert_eq!(health.json["data"]["store"]["ok"], true);
}

#[tokio::test]
async fn docs_serve_an_openapi_document() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    let docs = client.get("/api/docs").await;
    assert_eq!(docs.status, 200);
    assert!(docs.json["paths"].is_object());

    let spec_json = client.get("/api/docs/spec.json").await;
    assert_eq!(spec_json.status, 200);
    assert!(spec_json.json["paths"].is_object());
}

#[tokio::test]
async fn public_discover_lists_only_published_books_unauthenticated() {
    let app = spawn().await;
    let mut author = Client::new(&app);
    assert_eq!(author.register("publisher@example.com", "a-real-password").await.status, 201);

    let draft = author.post("/api/books", serde_json::json!({ "title": "Draft book" })).await;
    let draft_id = data(&draft)["id"].as_str().unwrap().to_string();

    let published = author.post("/api/books", serde_json::json!({ "title": "Published book" })).await;
    let published_id = data(&published)["id"].as_str().unwrap().to_string();
    let patch = author
        .patch(&format!("/api/books/{published_id}"), serde_json::json!({ "visibility": "published" }))
        .await;
    assert_eq!(patch.status, 200);

    // A fresh, unauthenticated client (no cookies at all) can still list
    // only the published book.
    let mut anonymous = Client::new(&app);
    let discover = anonymous.get("/api/public/discover").await;
    assert_eq!(discover.status, 200);
    let books = data(&discover).as_array().unwrap();
    assert!(books.iter().any(|b| b["id"] == published_id));
    assert!(!books.iter().any(|b| b["id"] == draft_id));
}

#[tokio::test]
async fn reading_fonts_are_seeded_lazily_and_builtins_cannot_be_deleted() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("fontsuser@example.com", "a-real-password").await.status, 201);

    let list = client.get("/api/fonts").await;
    assert_eq!(list.status, 200);
    let fonts = data(&list).as_array().unwrap().clone();
    assert!(!fonts.is_empty(), "builtin reading fonts should be seeded on first list");
    assert!(fonts.iter().all(|f| f["builtin"] == true));

    let builtin_id = fonts[0]["id"].as_str().unwrap().to_string();
    let delete = client.delete(&format!("/api/fonts/{builtin_id}")).await;
    assert_eq!(delete.status, 400);
}

#[tokio::test]
async fn reading_progress_is_last_write_wins() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("progressuser@example.com", "a-real-password").await.status, 201);

    let book = client.post("/api/books", serde_json::json!({ "title": "Progress Book" })).await;
    let book_id = data(&book)["id"].as_str().unwrap().to_string();

    let first = client
        .put(&format!("/api/books/{book_id}/progress"), serde_json::json!({ "page": 3 }))
        .await;
    assert_eq!(first.status, 200);
    assert_eq!(data(&first)["page"], 3);

    let second = client
        .put(&format!("/api/books/{book_id}/progress"), serde_json::json!({ "page": 40 }))
        .await;
    assert_eq!(second.status, 200);
    assert_eq!(data(&second)["page"], 40);

    let get = client.get(&format!("/api/books/{book_id}/progress")).await;
    assert_eq!(data(&get)["page"], 40);
}

#[tokio::test]
async fn book_sounds_and_ambients_round_trip() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("soundsuser@example.com", "a-real-password").await.status, 201);

    let book = client.post("/api/books", serde_json::json!({ "title": "Sound Book" })).await;
    let book_id = data(&book)["id"].as_str().unwrap().to_string();

    let patch_sounds = client
        .patch(
            &format!("/api/books/{book_id}/sounds"),
            serde_json::json!({ "pageFlip": "https://cdn.example.com/flip.mp3" }),
        )
        .await;
    assert_eq!(patch_sounds.status, 200);
    assert_eq!(data(&patch_sounds)["pageFlip"], "https://cdn.example.com/flip.mp3");

    let ambient = client
        .post(
            &format!("/api/books/{book_id}/ambients"),
            serde_json::json!({ "ambientKey": "rain", "label": "Rain" }),
        )
        .await;
    assert_eq!(ambient.status, 201);
    assert_eq!(data(&ambient)["builtin"], false);

    let list = client.get(&format!("/api/books/{book_id}/ambients")).await;
    assert_eq!(data(&list).as_array().unwrap().len(), 1);
}
