mod common;

use common::{Client, data, spawn};

#[tokio::test]
async fn register_then_me_then_logout() {
    let app = spawn().await;
    let mut client = Client::new(&app);

    let register = client.register("reader@example.com", "correct-horse").await;
    assert_eq!(register.status, 201);
    assert_eq!(data(&register)["email"], "reader@example.com");

    let me = client.get("/api/auth/me").await;
    assert_eq!(me.status, 200);
    assert_eq!(data(&me)["email"], "reader@example.com");

    let logout = client.post("/api/auth/logout", serde_json::json!({})).await;
    assert_eq!(logout.status, 204);

    let me_after_logout = client.get("/api/auth/me").await;
    assert_eq!(me_after_logout.status, 401);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = spawn().await;
    let mut first = Client::new(&app);
    let mut second = Client::new(&app);

    assert_eq!(first.register("dup@example.com", "first-password").await.status, 201);
    let conflict = second.register("dup@example.com", "second-password").await;
    assert_eq!(conflict.status, 409);
    assert_eq!(conflict.json["error"], "conflict");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = spawn().await;
    let mut client = Client::new(&app);

    assert_eq!(client.register("wrongpw@example.com", "the-real-password").await.status, 201);
    assert_eq!(client.post("/api/auth/logout", serde_json::json!({})).await.status, 204);

    let login = client
        .post(
            "/api/auth/login",
            serde_json::json!({ "email": "wrongpw@example.com", "password": "not-it" }),
        )
        .await;
    assert_eq!(login.status, 401);
}

#[tokio::test]
async fn register_validates_email_and_password_length() {
    let app = spawn().await;
    let mut client = Client::new(&app);

    let bad_email = client
        .post(
            "/api/auth/register",
            serde_json::json!({ "email": "not-an-email", "password": "longenough1" }),
        )
        .await;
    assert_eq!(bad_email.status, 400);
    assert_eq!(bad_email.json["error"], "validation");

    let short_password = client
        .post(
            "/api/auth/register",
            serde_json::json!({ "email": "short@example.com", "password": "short" }),
        )
        .await;
    assert_eq!(short_password.status, 400);
}

#[tokio::test]
async fn mutations_without_csrf_token_are_forbidden() {
    let app = spawn().await;
    let mut client = Client::new(&app);
    assert_eq!(client.register("csrf@example.com", "a-real-password").await.status, 201);

    // Drop the csrf token the register response handed out, but keep the
    // session cookie, to simulate a cross-site form post.
    client.forget_csrf_token();
    let create = client
        .post("/api/books", serde_json::json!({ "title": "Should not be created" }))
        .await;
    assert_eq!(create.status, 403);
}

#[tokio::test]
async fn auth_routes_are_rate_limited_at_five_per_minute() {
    let app = spawn().await;
    let mut client = Client::new(&app);

    assert_eq!(client.register("ratelimit@example.com", "a-real-password").await.status, 201);
    for _ in 0..4 {
        let login = client
            .post(
                "/api/auth/login",
                serde_json::json!({ "email": "ratelimit@example.com", "password": "a-real-password" }),
            )
            .await;
        assert_eq!(login.status, 200);
    }

    let sixth_call = client
        .post(
            "/api/auth/login",
            serde_json::json!({ "email": "ratelimit@example.com", "password": "a-real-password" }),
        )
        .await;
    assert_eq!(sixth_call.status, 429);
    assert_eq!(sixth_call.json["error"], "rateLimited");
}
