use std::net::TcpListener;
use serde_json::{json, Value};
use statusboard::auth::SessionController;
use statusboard::configuration::JwtSettings;
use statusboard::startup::{run, Stores};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Registers a user and returns their access token
    async fn register(&self, username: &str) -> String {
        let response = self
            .client
            .post(&format!("{}/register", &self.address))
            .json(&json!({
                "username": username,
                "email": format!("{}@x.com", username),
                "password": "longpass1",
                "confirmPassword": "longpass1"
            }))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(200, response.status().as_u16());
        cookie_value(&response, "accessToken").expect("access cookie missing")
    }

    async fn post_status(&self, access_token: &str, message: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/statuses", &self.address))
            .bearer_auth(access_token)
            .json(&json!({ "message": message }))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let jwt = JwtSettings {
        access_secret: "statuses-access-secret".to_string(),
        refresh_secret: "statuses-refresh-secret".to_string(),
        access_token_expiry: 600,
        refresh_token_expiry: 3600,
        issuer: "statusboard".to_string(),
        rotate_refresh_tokens: false,
    };
    let stores = Stores::in_memory();
    let sessions = SessionController::from_settings(&jwt, stores.users, stores.revocations)
        .expect("Failed to build session controller");

    let server = run(listener, sessions, stores.statuses)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

fn cookie_value(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|c| c.split(';').next()?.strip_prefix(&prefix).map(str::to_string))
}

// --- Authentication Gate ---

#[tokio::test]
async fn create_status_returns_401_without_token() {
    let app = spawn_app();

    let response = app
        .client
        .post(&format!("{}/statuses", &app.address))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn create_status_returns_403_for_invalid_token() {
    let app = spawn_app();

    let response = app.post_status("not.a.token", "hello").await;

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn create_status_accepts_access_cookie() {
    let app = spawn_app();
    let token = app.register("bob").await;

    let response = app
        .client
        .post(&format!("{}/statuses", &app.address))
        .header("Cookie", format!("accessToken={}", token))
        .json(&json!({ "message": "from a cookie" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

// --- Create / Read ---

#[tokio::test]
async fn created_status_is_listed_and_readable() {
    let app = spawn_app();
    let token = app.register("bob").await;

    let created = app.post_status(&token, "  hello world  ").await;
    assert_eq!(200, created.status().as_u16());
    let status: Value = created.json().await.unwrap();
    assert_eq!(status["user"], "bob");
    assert_eq!(status["message"], "hello world");
    assert!(status["createdAt"].is_string());
    let id = status["id"].as_str().unwrap().to_string();

    let listed: Value = app
        .client
        .get(&format!("{}/statuses", &app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().map(|a| a.len()), Some(1));
    assert_eq!(listed[0]["id"], id.as_str());

    let fetched = app
        .client
        .get(&format!("{}/statuses/{}/data", &app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(200, fetched.status().as_u16());
    let fetched: Value = fetched.json().await.unwrap();
    assert_eq!(fetched, status);
}

#[tokio::test]
async fn statuses_are_listed_newest_first() {
    let app = spawn_app();
    let token = app.register("bob").await;

    for message in ["first", "second", "third"] {
        assert_eq!(200, app.post_status(&token, message).await.status().as_u16());
    }

    let listed: Value = app
        .client
        .get(&format!("{}/statuses", &app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let messages: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["message"].as_str())
        .collect();
    assert_eq!(messages, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn create_status_returns_400_for_invalid_message() {
    let app = spawn_app();
    let token = app.register("bob").await;

    let too_long = "a".repeat(256);
    let test_cases = vec![("   ", "empty message"), (too_long.as_str(), "message too long")];

    for (message, reason) in test_cases {
        let response = app.post_status(&token, message).await;
        assert_eq!(400, response.status().as_u16(), "Should reject {}", reason);
        let body: Value = response.json().await.unwrap();
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn missing_status_returns_404() {
    let app = spawn_app();

    for id in [uuid::Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let response = app
            .client
            .get(&format!("{}/statuses/{}/data", &app.address, id))
            .send()
            .await
            .unwrap();

        assert_eq!(404, response.status().as_u16());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "404 Not Found");
        assert_eq!(body["message"], "No entry found");
    }
}

#[tokio::test]
async fn status_page_is_html() {
    let app = spawn_app();
    let id = uuid::Uuid::new_v4();

    let response = app
        .client
        .get(&format!("{}/statuses/{}", &app.address, id))
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    let body = response.text().await.unwrap();
    assert!(body.contains("<html"));
}

// --- Update / Delete ---

#[tokio::test]
async fn author_can_edit_and_delete_status() {
    let app = spawn_app();
    let token = app.register("bob").await;
    let status: Value = app.post_status(&token, "draft").await.json().await.unwrap();
    let url = format!("{}/statuses/{}", &app.address, status["id"].as_str().unwrap());

    let updated = app
        .client
        .patch(&url)
        .bearer_auth(&token)
        .json(&json!({ "message": "final" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, updated.status().as_u16());
    let updated: Value = updated.json().await.unwrap();
    assert_eq!(updated["message"], "final");
    assert_eq!(updated["id"], status["id"]);

    let deleted = app.client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(200, deleted.status().as_u16());

    let gone = app
        .client
        .get(&format!("{}/data", url))
        .send()
        .await
        .unwrap();
    assert_eq!(404, gone.status().as_u16());
}

#[tokio::test]
async fn other_users_cannot_edit_or_delete() {
    let app = spawn_app();
    let bob = app.register("bob").await;
    let alice = app.register("alice").await;
    let status: Value = app.post_status(&bob, "mine").await.json().await.unwrap();
    let url = format!("{}/statuses/{}", &app.address, status["id"].as_str().unwrap());

    let patch = app
        .client
        .patch(&url)
        .bearer_auth(&alice)
        .json(&json!({ "message": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(403, patch.status().as_u16());

    let delete = app.client.delete(&url).bearer_auth(&alice).send().await.unwrap();
    assert_eq!(403, delete.status().as_u16());

    let still_there: Value = app
        .client
        .get(&format!("{}/data", url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(still_there["message"], "mine");
}

#[tokio::test]
async fn editing_missing_status_returns_404() {
    let app = spawn_app();
    let token = app.register("bob").await;

    let response = app
        .client
        .patch(&format!("{}/statuses/{}", &app.address, uuid::Uuid::new_v4()))
        .bearer_auth(&token)
        .json(&json!({ "message": "nothing here" }))
        .send()
        .await
        .unwrap();

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn ownership_is_checked_before_the_body() {
    let app = spawn_app();
    let bob = app.register("bob").await;
    let alice = app.register("alice").await;
    let status: Value = app.post_status(&bob, "mine").await.json().await.unwrap();
    let url = format!("{}/statuses/{}", &app.address, status["id"].as_str().unwrap());

    let not_author = app
        .client
        .patch(&url)
        .bearer_auth(&alice)
        .json(&json!({ "message": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(403, not_author.status().as_u16());

    let missing = app
        .client
        .patch(&format!("{}/statuses/{}", &app.address, uuid::Uuid::new_v4()))
        .bearer_auth(&alice)
        .json(&json!({ "message": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(404, missing.status().as_u16());

    let author = app
        .client
        .patch(&url)
        .bearer_auth(&bob)
        .json(&json!({ "message": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(400, author.status().as_u16());
}
