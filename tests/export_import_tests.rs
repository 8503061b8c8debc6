mod common;

use common::{Client, data, spawn};

#[tokio::test]
async fn export_reflects_the_full_owned_tree() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("exporter@example.com", "a-real-password").await.status, 201);

    let book = client
        .post("/api/books", serde_json::json!({ "title": "Exported Book", "author": "Someone" }))
        .await;
    let book_id = data(&book)["id"].as_str().unwrap().to_string();
    client
        .post(
            &format!("/api/books/{book_id}/chapters"),
            serde_json::json!({ "title": "Ch1", "htmlContent": "<p>Hello.</p>" }),
        )
        .await;

    let export = client.get("/api/export").await;
    assert_eq!(export.status, 200);
    let bundle = data(&export);
    assert_eq!(bundle["books"].as_array().unwrap().len(), 1);
    assert_eq!(bundle["books"][0]["book"]["title"], "Exported Book");
    assert_eq!(bundle["books"][0]["chapters"].as_array().unwrap().len(), 1);
    assert_eq!(bundle["books"][0]["chapters"][0]["title"], "Ch1");
    assert!(bundle["globalSettings"]["fontMin"].is_i64());
}

#[tokio::test]
async fn import_reconstructs_a_book_and_its_children_under_the_caller() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("importer@example.com", "a-real-password").await.status, 201);

    let import = client
        .post(
            "/api/import",
            serde_json::json!({
                "books": [{
                    "title": "Imported Book",
                    "author": "Someone Else",
                    "visibility": "published",
                    "chapters": [{ "title": "Ch1", "htmlContent": "<p>Hello.</p>" }],
                    "ambients": [{ "ambientKey": "rain", "label": "Rain" }]
                }],
                "readingFonts": [],
                "globalSettings": null
            }),
        )
        .await;
    assert_eq!(import.status, 200);
    let bundle = data(&import);
    assert_eq!(bundle["books"].as_array().unwrap().len(), 1);
    assert_eq!(bundle["books"][0]["book"]["title"], "Imported Book");
    assert_eq!(bundle["books"][0]["book"]["visibility"], "published");
    assert_eq!(bundle["books"][0]["chapters"][0]["title"], "Ch1");
    assert_eq!(bundle["books"][0]["ambients"][0]["ambientKey"], "rain");

    let books = client.get("/api/books").await;
    assert_eq!(data(&books).as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn migration_skips_when_the_account_already_has_books() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("migrator@example.com", "a-real-password").await.status, 201);

    client.post("/api/books", serde_json::json!({ "title": "Already here" })).await;

    let migrate = client
        .post(
            "/api/migrate",
            serde_json::json!({ "books": [{ "title": "Legacy book" }] }),
        )
        .await;
    assert_eq!(migrate.status, 200);
    assert_eq!(migrate.json["data"]["status"], "skipped");

    let books = client.get("/api/books").await;
    assert_eq!(data(&books).as_array().unwrap().len(), 1);
    assert_eq!(data(&books)[0]["title"], "Already here");
}

#[tokio::test]
async fn migration_imports_legacy_payload_for_a_fresh_account() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("freshmigrator@example.com", "a-real-password").await.status, 201);

    let migrate = client
        .post(
            "/api/migrate",
            serde_json::json!({
                "books": [
                    {
                        "title": "Legacy Book",
                        "chapters": [{ "title": "Intro", "htmlContent": "<p>Once upon a time.</p>" }]
                    }
                ]
            }),
        )
        .await;
    assert_eq!(migrate.status, 200);
    assert_eq!(migrate.json["data"]["status"], "imported");
    assert_eq!(migrate.json["data"]["books"], 1);

    let books = client.get("/api/books").await;
    assert_eq!(data(&books).as_array().unwrap().len(), 1);
    assert_eq!(data(&books)[0]["title"], "Legacy Book");
}
