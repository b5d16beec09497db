#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use partyfund_server::{
    config::{AdminBootstrap, Config, HashingConfig, OAuthConfig, ProviderConfig, StorageBackend},
    create_routes,
    services::{ExchangeRequest, TokenExchange},
    store::MemoryStore,
    utils::AppError,
    AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const PASSWORD: &str = "testyou";
pub const ADMIN_EMAIL: &str = "admin@party.com";
pub const ADMIN_PASSWORD: &str = "backstage";
pub const TWITTER_AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";

/// Hands back a token derived from the code without any network traffic.
/// The verifier it was sent is echoed so tests can check it.
pub struct StaticExchange;

#[async_trait]
impl TokenExchange for StaticExchange {
    async fn exchange(
        &self,
        _provider: &ProviderConfig,
        request: &ExchangeRequest<'_>,
    ) -> Result<Value, AppError> {
        Ok(json!({
            "access_token": format!("token-for-{}", request.code),
            "token_type": "bearer",
            "code_verifier": request.code_verifier,
        }))
    }
}

pub fn test_config() -> Config {
    Config {
        storage: StorageBackend::Memory,
        hashing: HashingConfig::lightweight(),
        oauth: OAuthConfig {
            redirect_base: "http://localhost:3001".to_string(),
            twitter: Some(ProviderConfig {
                client_id: "twitter-client".to_string(),
                client_secret: "twitter-secret".to_string(),
                authorize_url: TWITTER_AUTHORIZE_URL.to_string(),
                token_url: "https://api.twitter.com/2/oauth2/token".to_string(),
                scope: "tweet.read users.read".to_string(),
                basic_auth: true,
            }),
            google: None,
        },
        ..Config::default()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"]
            .as_str()
            .or_else(|| self.body["error"]["message"].as_str())
            .unwrap_or_default()
    }

    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    pub fn id(&self) -> i32 {
        self.body["data"]["id"].as_i64().expect("response carries an id") as i32
    }
}

/// One browser: a router plus the session cookie it was last handed.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    cookie: Option<String>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone(), Arc::new(StaticExchange))
            .expect("Failed to build state");

        Self {
            router: create_routes(state),
            store,
            cookie: None,
        }
    }

    /// Server whose admin account was bootstrapped at startup.
    pub async fn with_admin() -> Self {
        let config = Config {
            admin_bootstrap: Some(AdminBootstrap {
                name: "Site Admin".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            }),
            ..test_config()
        };
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone(), Arc::new(StaticExchange))
            .expect("Failed to build state");

        let admin = state.config.admin_bootstrap.clone().unwrap();
        state
            .auth
            .bootstrap_admin(&admin)
            .await
            .expect("Failed to bootstrap admin");

        Self {
            router: create_routes(state),
            store,
            cookie: None,
        }
    }

    /// Second browser against the same server.
    pub fn fresh_browser(&self) -> Self {
        Self {
            router: self.router.clone(),
            store: self.store.clone(),
            cookie: None,
        }
    }

    pub async fn request(
        &mut self,
        method: Method,
        uri: &str,
        form: Option<&[(&str, &str)]>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let body = match form {
            Some(fields) => {
                builder = builder.header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                );
                Body::from(serde_urlencoded::to_string(fields).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap()
                .to_string();
            self.cookie = Some(pair);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        self.request(Method::POST, uri, Some(form)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Registers `username` (signing this browser in) and returns the user id.
    pub async fn sign_up(&mut self, username: &str) -> i32 {
        let email = format!("{}@party.com", username.to_lowercase());
        let response = self
            .post(
                "/signup",
                &[
                    ("name", "Party Goer"),
                    ("email", email.as_str()),
                    ("username", username),
                    ("password", PASSWORD),
                ],
            )
            .await;

        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.id()
    }

    pub async fn log_in(&mut self, email: &str, password: &str) -> TestResponse {
        self.post("/login", &[("email", email), ("password", password)])
            .await
    }

    pub async fn create_event(&mut self, name: &str) -> i32 {
        let response = self.try_create_event(name).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.id()
    }

    pub async fn try_create_event(&mut self, name: &str) -> TestResponse {
        self.post(
            "/events",
            &[
                ("name_of_event", name),
                ("desc", "Rooftop party"),
                ("number_of_guests", "40"),
                ("date_of_party", "2024-07-04"),
                ("time_of_party", "8pm"),
                ("target_goal", "500"),
            ],
        )
        .await
    }

    pub async fn create_bar(&mut self, suffix: &str) -> i32 {
        let response = self.try_create_bar(suffix).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.id()
    }

    pub async fn try_create_bar(&mut self, suffix: &str) -> TestResponse {
        let name = format!("Dive {}", suffix);
        let address = format!("{} Main St", suffix);
        let email = format!("bar{}@dive.com", suffix);
        let phone = format!("512-555-{}", suffix);
        self.post(
            "/bars",
            &[
                ("bar_name", name.as_str()),
                ("address", address.as_str()),
                ("city", "Austin"),
                ("state", "TX"),
                ("country", "USA"),
                ("email", email.as_str()),
                ("phone", phone.as_str()),
                ("website", ""),
            ],
        )
        .await
    }
}
