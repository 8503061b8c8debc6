mod common;

use common::{Client, data, spawn};

#[tokio::test]
async fn uploading_a_txt_book_parses_paragraphs() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("uploader@example.com", "a-real-password").await.status, 201);

    let upload = client
        .upload_file(
            "/api/upload/book",
            "novel.txt",
            "text/plain",
            b"Para one.\n\nPara two.",
        )
        .await;
    assert_eq!(upload.status, 200);
    let parsed = data(&upload);
    assert_eq!(parsed["title"], "novel");
    assert_eq!(parsed["chapters"].as_array().unwrap().len(), 1);
    assert_eq!(
        parsed["chapters"][0]["html"],
        "<article><p>Para one.</p><p>Para two.</p></article>"
    );
}

#[tokio::test]
async fn uploading_an_image_stores_it_and_returns_a_url() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("image@example.com", "a-real-password").await.status, 201);

    // Not a real PNG, but `infer` only needs the magic bytes to sniff the
    // type; the content-sniffed MIME is what the upload policy checks.
    let png_magic: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    let upload = client
        .upload_file("/api/upload/image", "cover.png", "image/png", png_magic)
        .await;
    assert_eq!(upload.status, 200);
    assert!(data(&upload)["url"].as_str().unwrap().starts_with("/objects/images/"));
}

#[tokio::test]
async fn upload_rejects_disallowed_extension() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("badext@example.com", "a-real-password").await.status, 201);

    let upload = client
        .upload_file("/api/upload/image", "payload.exe", "application/octet-stream", b"whatever")
        .await;
    assert_eq!(upload.status, 400);
    assert_eq!(upload.json["error"], "validation");
}

#[tokio::test]
async fn upload_rejects_oversized_file_for_its_kind() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("oversize@example.com", "a-real-password").await.status, 201);

    // Fonts cap at 400 KiB; one byte over that is rejected regardless of
    // content.
    let oversized = vec![0u8; 400 * 1024 + 1];
    let upload = client
        .upload_file("/api/upload/font", "big.ttf", "font/ttf", &oversized)
        .await;
    assert_eq!(upload.status, 413);
}

#[tokio::test]
async fn unknown_upload_kind_is_not_found() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("badkind@example.com", "a-real-password").await.status, 201);

    let upload = client
        .upload_file("/api/upload/video", "clip.mp4", "video/mp4", b"data")
        .await;
    assert_eq!(upload.status, 404);
}
