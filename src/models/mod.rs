pub mod bar;
pub mod event;
pub mod event_list;
pub mod oauth;
pub mod rsvp;
pub mod user;

pub use bar::{Bar, BarDict, NewBar};
pub use event::{Event, EventDict, NewEvent};
pub use event_list::EventList;
pub use oauth::{NewOAuthToken, OAuth, Provider};
pub use rsvp::Rsvp;
pub use user::{NewUser, User, UserUpdate};

use serde_json::Value;

/// Something that can be remembered in a login session.
pub trait Identifiable {
    fn get_id(&self) -> i32;

    /// Value written to the session role marker on login.
    fn session_label(&self) -> &str;
}

/// Something a third-party token can be stored against.
pub trait OAuthLinkable: Identifiable {
    fn link_token(&self, provider: Provider, token: Value) -> NewOAuthToken {
        NewOAuthToken {
            provider,
            user_id: Some(self.get_id()),
            token,
        }
    }
}

/// Form fields submitted empty are stored as NULL so optional unique columns
/// do not collide on "".
pub(crate) fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
