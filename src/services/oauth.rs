//! Linking Twitter and Google accounts to local users.
//!
//! Runs the authorization-code flow with an S256 PKCE challenge. The
//! verifier never leaves the server until the token exchange; only its
//! SHA-256 digest travels through the browser. The resulting token is stored
//! against the signed-in user, replacing any earlier token for the same
//! provider.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::{OAuthConfig, ProviderConfig};
use crate::models::{OAuth, OAuthLinkable, Provider};
use crate::store::Store;
use crate::utils::error::AppError;

/// Parameters of one code-for-token exchange.
#[derive(Debug)]
pub struct ExchangeRequest<'a> {
    pub code: &'a str,
    pub redirect_uri: &'a str,
    pub code_verifier: &'a str,
}

/// Swaps an authorization code for a provider token.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(
        &self,
        provider: &ProviderConfig,
        request: &ExchangeRequest<'_>,
    ) -> Result<Value, AppError>;
}

/// Exchanges codes by POSTing to the provider's token endpoint.
#[derive(Clone, Default)]
pub struct HttpTokenExchange {
    client: reqwest::Client,
}

impl HttpTokenExchange {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The RFC 6749 `error` code of a failed exchange. The rest of the body is
/// never logged, and anything that is not a plain code token is masked.
pub(crate) fn provider_error_code(body: Option<&Value>) -> &str {
    let Some(code) = body.and_then(|b| b.get("error")).and_then(Value::as_str) else {
        return "unknown";
    };

    let is_code_token = !code.is_empty()
        && code.len() <= 64
        && code.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if is_code_token {
        code
    } else {
        "unrecognized"
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn exchange(
        &self,
        provider: &ProviderConfig,
        request: &ExchangeRequest<'_>,
    ) -> Result<Value, AppError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", request.code),
            ("redirect_uri", request.redirect_uri),
            ("code_verifier", request.code_verifier),
            ("client_id", provider.client_id.as_str()),
        ];

        let mut builder = self.client.post(&provider.token_url);
        if provider.basic_auth {
            builder = builder.basic_auth(&provider.client_id, Some(&provider.client_secret));
        } else {
            form.push(("client_secret", provider.client_secret.as_str()));
        }

        let response = builder.form(&form).send().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Token endpoint unreachable: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.ok();
            tracing::warn!(
                %status,
                error = provider_error_code(body.as_ref()),
                "Token exchange rejected"
            );
            return Err(AppError::ExternalServiceError(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Invalid token response: {}", e))
        })
    }
}

/// SHA-256 of the verifier, base64url without padding.
pub fn pkce_challenge(code_verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// One authorization attempt, kept in the session until the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub state: String,
    pub code_verifier: String,
}

impl PendingAuthorization {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill(&mut bytes);

        Self {
            state: Uuid::new_v4().simple().to_string(),
            code_verifier: URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    pub fn code_challenge(&self) -> String {
        pkce_challenge(&self.code_verifier)
    }
}

#[derive(Clone)]
pub struct OAuthService {
    store: Arc<dyn Store>,
    exchange: Arc<dyn TokenExchange>,
    providers: HashMap<Provider, ProviderConfig>,
    redirect_base: String,
}

impl OAuthService {
    pub fn new(
        config: &OAuthConfig,
        store: Arc<dyn Store>,
        exchange: Arc<dyn TokenExchange>,
    ) -> Self {
        let providers: HashMap<Provider, ProviderConfig> = [
            (Provider::Twitter, config.twitter.clone()),
            (Provider::Google, config.google.clone()),
        ]
        .into_iter()
        .filter_map(|(provider, cfg)| cfg.map(|cfg| (provider, cfg)))
        .collect();

        for provider in Provider::ALL {
            if providers.contains_key(&provider) {
                info!("OAuth: {} login enabled", provider.display_name());
            }
        }

        Self {
            store,
            exchange,
            providers,
            redirect_base: config.redirect_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_enabled(&self, provider: Provider) -> bool {
        self.providers.contains_key(&provider)
    }

    fn provider(&self, provider: Provider) -> Result<&ProviderConfig, AppError> {
        self.providers.get(&provider).ok_or_else(|| {
            AppError::NotFound(format!(
                "{} login is not configured",
                provider.display_name()
            ))
        })
    }

    pub fn redirect_uri(&self, provider: Provider) -> String {
        format!("{}/login/{}/authorized", self.redirect_base, provider)
    }

    pub fn authorization_url(
        &self,
        provider: Provider,
        pending: &PendingAuthorization,
    ) -> Result<String, AppError> {
        let cfg = self.provider(provider)?;
        let redirect_uri = self.redirect_uri(provider);
        let challenge = pending.code_challenge();

        let url = reqwest::Url::parse_with_params(
            &cfg.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", cfg.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("scope", cfg.scope.as_str()),
                ("state", pending.state.as_str()),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| {
            AppError::InternalServerError(format!(
                "Invalid authorize URL for {}: {}",
                provider, e
            ))
        })?;

        Ok(url.into())
    }

    /// Exchanges `code` and stores the token against `owner`.
    #[instrument(skip(self, code, code_verifier, owner), fields(user_id = owner.get_id()))]
    pub async fn link<T>(
        &self,
        provider: Provider,
        code: &str,
        code_verifier: &str,
        owner: &T,
    ) -> Result<OAuth, AppError>
    where
        T: OAuthLinkable + Sync,
    {
        let cfg = self.provider(provider)?;
        let redirect_uri = self.redirect_uri(provider);

        let token = self
            .exchange
            .exchange(
                cfg,
                &ExchangeRequest {
                    code,
                    redirect_uri: &redirect_uri,
                    code_verifier,
                },
            )
            .await?;

        if token.get("access_token").and_then(Value::as_str).is_none() {
            return Err(AppError::ExternalServiceError(format!(
                "{} returned no access token",
                provider.display_name()
            )));
        }

        let saved = self
            .store
            .save_oauth_token(&owner.link_token(provider, token))
            .await?;

        info!(%provider, "OAuth account linked");
        Ok(saved)
    }
}
