use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{Identifiable, OAuthLinkable};
use crate::utils::error::AppError;

pub const USER_ID_KEY: &str = "user_id";
pub const USERNAME_KEY: &str = "username";
/// Role marker compared against the configured admin role.
pub const ROLE_KEY: &str = "user";

/// The signed-in user as remembered by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub username: String,
}

impl Identifiable for Identity {
    fn get_id(&self) -> i32 {
        self.user_id
    }

    fn session_label(&self) -> &str {
        &self.username
    }
}

impl OAuthLinkable for Identity {}

/// Who is making this request, read once from the session and handed to
/// handlers and gates explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub identity: Option<Identity>,
    pub role: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    pub fn require_identity(&self) -> Result<&Identity, AppError> {
        self.identity
            .as_ref()
            .ok_or_else(|| AppError::AuthError("Please log in to access this page".to_string()))
    }

    pub async fn from_session(session: &Session) -> Result<Self, AppError> {
        let user_id: Option<i32> = session.get(USER_ID_KEY).await?;
        let username: Option<String> = session.get(USERNAME_KEY).await?;
        let role: Option<String> = session.get(ROLE_KEY).await?;

        let identity = match (user_id, username) {
            (Some(user_id), Some(username)) => Some(Identity { user_id, username }),
            _ => None,
        };

        Ok(Self { identity, role })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::InternalServerError(msg.to_string()))?;

        Self::from_session(&session).await
    }
}

/// Starts a fresh session for `who`.
pub async fn sign_in<T>(session: &Session, who: &T) -> Result<RequestContext, AppError>
where
    T: Identifiable + Sync,
{
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, who.get_id()).await?;
    session.insert(USERNAME_KEY, who.session_label()).await?;
    session.insert(ROLE_KEY, who.session_label()).await?;

    tracing::info!(user_id = who.get_id(), "Session started");

    Ok(RequestContext {
        identity: Some(Identity {
            user_id: who.get_id(),
            username: who.session_label().to_string(),
        }),
        role: Some(who.session_label().to_string()),
    })
}

pub async fn sign_out(session: &Session) -> Result<(), AppError> {
    session.flush().await?;
    Ok(())
}
