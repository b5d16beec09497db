use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/partyfund";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEFAULT_ADMIN_ROLE: &str = "Administrator";
const DEFAULT_REDIRECT_BASE: &str = "http://localhost:3001";

const TWITTER_AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";
const TWITTER_TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";
const TWITTER_SCOPE: &str = "users.read tweet.read";
const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_SCOPE: &str = "openid email profile";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Argon2 cost parameters.
#[derive(Debug, Clone)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashingConfig {
    /// Cheapest parameters argon2 accepts. Only for tests and local seeding.
    pub fn lightweight() -> Self {
        Self {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

/// Client registration with one OAuth provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub scope: String,
    /// Send client credentials as HTTP basic auth instead of form fields.
    pub basic_auth: bool,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub redirect_base: String,
    pub twitter: Option<ProviderConfig>,
    pub google: Option<ProviderConfig>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            redirect_base: DEFAULT_REDIRECT_BASE.to_string(),
            twitter: None,
            google: None,
        }
    }
}

/// Account created at startup under the admin role's username. Signup
/// refuses that username, so this is the only way to obtain it.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub storage: StorageBackend,
    pub bind_addr: SocketAddr,
    pub production: bool,
    pub cors_allowed_origins: String,
    pub session_inactivity_hours: i64,
    /// Seconds between sweeps of expired sessions.
    pub session_purge_secs: u64,
    /// Value of the session role marker that opens the admin dashboard.
    pub admin_role: String,
    pub admin_bootstrap: Option<AdminBootstrap>,
    pub hashing: HashingConfig,
    pub oauth: OAuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_max_connections: 5,
            storage: StorageBackend::Postgres,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            production: false,
            cors_allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
            session_inactivity_hours: 24,
            session_purge_secs: 300,
            admin_role: DEFAULT_ADMIN_ROLE.to_string(),
            admin_bootstrap: None,
            hashing: HashingConfig::default(),
            oauth: OAuthConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: env_parse(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            storage: env_parse("STORAGE_BACKEND", defaults.storage),
            bind_addr: env_parse("BIND_ADDR", defaults.bind_addr),
            production: env::var("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(false),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or(defaults.cors_allowed_origins),
            session_inactivity_hours: env_parse(
                "SESSION_INACTIVITY_HOURS",
                defaults.session_inactivity_hours,
            ),
            session_purge_secs: env_parse("SESSION_PURGE_SECS", defaults.session_purge_secs),
            admin_role: env::var("ADMIN_ROLE").unwrap_or(defaults.admin_role),
            admin_bootstrap: admin_from_env(),
            hashing: HashingConfig {
                memory_kib: env_parse("HASH_MEMORY_KIB", defaults.hashing.memory_kib),
                iterations: env_parse("HASH_ITERATIONS", defaults.hashing.iterations),
                parallelism: env_parse("HASH_PARALLELISM", defaults.hashing.parallelism),
            },
            oauth: OAuthConfig {
                redirect_base: env::var("OAUTH_REDIRECT_BASE")
                    .unwrap_or(defaults.oauth.redirect_base),
                twitter: provider_from_env(
                    "TWITTER",
                    TWITTER_AUTHORIZE_URL,
                    TWITTER_TOKEN_URL,
                    TWITTER_SCOPE,
                    true,
                ),
                google: provider_from_env(
                    "GOOGLE",
                    GOOGLE_AUTHORIZE_URL,
                    GOOGLE_TOKEN_URL,
                    GOOGLE_SCOPE,
                    false,
                ),
            },
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Config: ignoring invalid {}='{}': {}", key, raw, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Needs both `ADMIN_EMAIL` and `ADMIN_PASSWORD`; `ADMIN_NAME` is optional.
fn admin_from_env() -> Option<AdminBootstrap> {
    let email = env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty())?;
    let password = env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty())?;

    Some(AdminBootstrap {
        name: env::var("ADMIN_NAME").unwrap_or_else(|_| DEFAULT_ADMIN_ROLE.to_string()),
        email,
        password,
    })
}

/// A provider is enabled only when both its client id and secret are set.
fn provider_from_env(
    prefix: &str,
    authorize_url: &str,
    token_url: &str,
    scope: &str,
    basic_auth: bool,
) -> Option<ProviderConfig> {
    let client_id = env::var(format!("{}_CLIENT_ID", prefix)).ok()?;
    let client_secret = env::var(format!("{}_CLIENT_SECRET", prefix)).ok()?;

    if client_id.is_empty() || client_secret.is_empty() {
        tracing::warn!("OAuth: {} credentials are empty, provider disabled", prefix);
        return None;
    }

    Some(ProviderConfig {
        client_id,
        client_secret,
        authorize_url: env::var(format!("{}_AUTHORIZE_URL", prefix))
            .unwrap_or_else(|_| authorize_url.to_string()),
        token_url: env::var(format!("{}_TOKEN_URL", prefix))
            .unwrap_or_else(|_| token_url.to_string()),
        scope: env::var(format!("{}_SCOPE", prefix)).unwrap_or_else(|_| scope.to_string()),
        basic_auth,
    })
}
