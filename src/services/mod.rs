pub mod auth;
pub mod oauth;

pub use auth::{AuthOutcome, AuthService, LoginForm, SignupForm};
pub use oauth::{
    pkce_challenge, ExchangeRequest, HttpTokenExchange, OAuthService, PendingAuthorization,
    TokenExchange,
};
