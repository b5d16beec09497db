use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Third-party identity providers a user can link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Twitter,
    Google,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Twitter, Provider::Google];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Twitter => "twitter",
            Provider::Google => "google",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Twitter => "Twitter",
            Provider::Google => "Google",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown OAuth provider '{}'", s))
    }
}

/// A stored provider token. The raw token is never serialized outward.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OAuth {
    pub id: i32,
    pub provider: String,
    pub created_at: NaiveDateTime,
    #[serde(skip_serializing)]
    pub token: Value,
    pub user_id: Option<i32>,
}

impl OAuth {
    pub fn access_token(&self) -> Option<&str> {
        self.token.get("access_token").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct NewOAuthToken {
    pub provider: Provider,
    pub user_id: Option<i32>,
    pub token: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_round_trip_names() {
        assert_eq!("google".parse::<Provider>(), Ok(Provider::Google));
        assert_eq!("Twitter".parse::<Provider>(), Ok(Provider::Twitter));
        assert!("github".parse::<Provider>().is_err());
        assert_eq!(Provider::Twitter.to_string(), "twitter");
    }

    #[test]
    fn test_token_hidden_from_json() {
        let row = OAuth {
            id: 1,
            provider: "google".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
            token: json!({"access_token": "ya29.secret", "token_type": "Bearer"}),
            user_id: Some(1111),
        };

        assert_eq!(row.access_token(), Some("ya29.secret"));
        let value = serde_json::to_value(&row).unwrap();
        assert!(value.get("token").is_none());
        assert_eq!(value["provider"], "google");
    }
}
