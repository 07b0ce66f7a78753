use chrono::{Duration, Utc};
use filegate_cli::{auth::Claims, routes, AppState, GatewayConfig};
use filegate_store::FlexibleObjectStore;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{
    multipart::{Form, Part},
    Client, StatusCode,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

const JWT_SECRET: &str = "test-secret-123";
const CLIENT_ID: &str = "filegate";

// Helper to spawn a server on a random port
async fn spawn_server(auth_enabled: bool) -> String {
    let config = GatewayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        use_memory_store: true,
        auth_enabled,
        jwt_secret: Some(JWT_SECRET.to_string()),
        client_id: CLIENT_ID.to_string(),
        rate_limit_rps: 0,
        ..Default::default()
    };

    let store = FlexibleObjectStore::memory(config.list_page_size);
    let state = Arc::new(AppState::with_store(config, store).unwrap());
    let app = routes::create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    format!("http://{}", addr)
}

fn token_with_roles(roles: &[&str]) -> String {
    let claims = Claims {
        sub: "test-user".to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
        iat: Some(Utc::now().timestamp()),
        iss: None,
        azp: Some(CLIENT_ID.to_string()),
        preferred_username: Some("tester".to_string()),
        resource_access: Some(json!({ CLIENT_ID: { "roles": roles } })),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn files_form(files: &[(&str, &str)]) -> Form {
    files.iter().fold(Form::new(), |form, (name, data)| {
        form.part(
            "files",
            Part::bytes(data.as_bytes().to_vec()).file_name(name.to_string()),
        )
    })
}

#[tokio::test]
async fn test_file_lifecycle() {
    let base_url = spawn_server(true).await;
    let client = Client::new();
    let admin = token_with_roles(&["ADMIN"]);

    // 1. Upload two files
    let res = client
        .post(format!("{}/reports/upload/files", base_url))
        .bearer_auth(&admin)
        .multipart(files_form(&[("q1.txt", "first quarter"), ("q2.json", "{}")]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let names: Vec<String> = res.json().await.unwrap();
    assert_eq!(names, vec!["q1.txt", "q2.json"]);

    // 2. Retrieve without a token
    let res = client
        .get(format!("{}/reports/retrieve/files/q1.txt", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "first quarter");

    let res = client
        .get(format!("{}/reports/retrieve/files/q2.json", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["content-type"], "application/json");

    // 3. Remove one file
    let res = client
        .delete(format!("{}/reports/remove/files/q1.txt", base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "File [q1.txt] deleted successfully");

    let res = client
        .get(format!("{}/reports/retrieve/files/q1.txt", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // 4. Remove the folder
    let res = client
        .delete(format!("{}/remove/folders/reports", base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Folder [reports] deleted successfully");

    let res = client
        .get(format!("{}/reports/retrieve/files/q2.json", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gated_paths_require_admin() {
    let base_url = spawn_server(true).await;
    let client = Client::new();

    // No token
    let res = client
        .post(format!("{}/docs/upload/files", base_url))
        .multipart(files_form(&[("a.txt", "a")]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "Unauthorized");

    // Garbage token
    let res = client
        .delete(format!("{}/docs/remove/files/a.txt", base_url))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Valid token without ADMIN
    let viewer = token_with_roles(&["viewer"]);
    for res in [
        client
            .post(format!("{}/docs/upload/files", base_url))
            .bearer_auth(&viewer)
            .multipart(files_form(&[("a.txt", "a")]))
            .send()
            .await
            .unwrap(),
        client
            .delete(format!("{}/docs/remove/files/a.txt", base_url))
            .bearer_auth(&viewer)
            .send()
            .await
            .unwrap(),
        client
            .delete(format!("{}/remove/folders/docs", base_url))
            .bearer_auth(&viewer)
            .send()
            .await
            .unwrap(),
    ] {
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(res.headers()["x-error-code"], "AccessDenied");
    }

    // Nothing was written by the rejected upload
    let res = client
        .get(format!("{}/docs/retrieve/files/a.txt", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generated_file_names() {
    let base_url = spawn_server(true).await;
    let client = Client::new();
    let admin = token_with_roles(&["ADMIN"]);

    let res = client
        .post(format!("{}/photos/upload/files?generate-file-name=true", base_url))
        .bearer_auth(&admin)
        .multipart(files_form(&[("cat.png", "png"), ("README", "text")]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let names: Vec<String> = res.json().await.unwrap();

    assert_eq!(names.len(), 2);
    assert!(names[0].ends_with(".png"));
    assert_ne!(names[0], "cat.png");
    assert!(!names[1].contains('.'));

    let res = client
        .get(format!("{}/photos/retrieve/files/{}", base_url, names[0]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn test_invalid_uploads() {
    let base_url = spawn_server(true).await;
    let client = Client::new();
    let admin = token_with_roles(&["ADMIN"]);

    // No `files` parts at all
    let res = client
        .post(format!("{}/docs/upload/files", base_url))
        .bearer_auth(&admin)
        .multipart(Form::new().text("note", "hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Traversal in the filename
    let res = client
        .post(format!("{}/docs/upload/files", base_url))
        .bearer_auth(&admin)
        .multipart(files_form(&[("..", "x")]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "InvalidArgument");
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let base_url = spawn_server(false).await;
    let client = Client::new();

    for _ in 0..2 {
        let res = client
            .delete(format!("{}/docs/remove/files/never-stored.txt", base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client
        .delete(format!("{}/remove/folders/empty", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let base_url = spawn_server(true).await;
    let res = Client::new()
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "OK");
}
