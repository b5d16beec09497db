//! Persistence for users, bars, events and their join tables.
//!
//! Every method is a single atomic operation. Uniqueness, foreign keys and
//! cascading deletes are owned by the backend: PostgreSQL enforces them with
//! constraints, [`MemoryStore`] mirrors the same rules in process.

use async_trait::async_trait;

use crate::models::{
    Bar, Event, EventList, NewBar, NewEvent, NewOAuthToken, NewUser, OAuth, Provider, Rsvp, User,
    UserUpdate,
};
use crate::utils::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Users
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError>;
    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn touch_last_login(&self, id: i32) -> Result<(), AppError>;
    async fn update_user(&self, id: i32, update: &UserUpdate) -> Result<User, AppError>;
    /// Removes the user's rsvps and tokens; refused while they own events.
    async fn delete_user(&self, id: i32) -> Result<(), AppError>;

    // Bars
    async fn create_bar(&self, bar: &NewBar) -> Result<Bar, AppError>;
    async fn find_bar(&self, id: i32) -> Result<Option<Bar>, AppError>;
    async fn list_bars(&self) -> Result<Vec<Bar>, AppError>;
    async fn delete_bar(&self, id: i32) -> Result<(), AppError>;

    // Events
    async fn create_event(&self, event: &NewEvent) -> Result<Event, AppError>;
    async fn find_event(&self, id: i32) -> Result<Option<Event>, AppError>;
    async fn list_events(&self) -> Result<Vec<Event>, AppError>;
    async fn list_events_by_owner(&self, user_id: i32) -> Result<Vec<Event>, AppError>;
    /// Removes the event's rsvps and bar links.
    async fn delete_event(&self, id: i32) -> Result<(), AppError>;
    /// Adds to `total_fund`, treating NULL as zero.
    async fn add_to_fund(&self, event_id: i32, amount: i32) -> Result<Event, AppError>;

    // Rsvps
    async fn create_rsvp(&self, user_id: i32, event_id: i32) -> Result<Rsvp, AppError>;
    /// Returns whether a row was removed.
    async fn delete_rsvp(&self, user_id: i32, event_id: i32) -> Result<bool, AppError>;
    async fn list_attendees(&self, event_id: i32) -> Result<Vec<User>, AppError>;

    // Event <-> bar links
    async fn link_bar(&self, event_id: i32, bar_id: i32) -> Result<EventList, AppError>;
    async fn bars_for_event(&self, event_id: i32) -> Result<Vec<Bar>, AppError>;
    /// The bar side of the link is scalar: lowest event id wins.
    async fn event_for_bar(&self, bar_id: i32) -> Result<Option<Event>, AppError>;

    // OAuth tokens
    /// Replaces any token already stored for the same provider and user.
    async fn save_oauth_token(&self, token: &NewOAuthToken) -> Result<OAuth, AppError>;
    async fn find_oauth_token(
        &self,
        provider: Provider,
        user_id: i32,
    ) -> Result<Option<OAuth>, AppError>;
    async fn delete_oauth_token(&self, provider: Provider, user_id: i32)
        -> Result<bool, AppError>;
}

/// Constraint names shared by the SQL schema and the in-process store.
pub(crate) mod constraint {
    pub const USERS_EMAIL: &str = "users_email_key";
    pub const USERS_USERNAME: &str = "users_username_key";
    pub const BARS_ADDRESS: &str = "bars_address_key";
    pub const BARS_EMAIL: &str = "bars_email_key";
    pub const BARS_PHONE: &str = "bars_phone_key";
    pub const BARS_WEBSITE: &str = "bars_website_key";
    pub const BARS_FACEBOOK: &str = "bars_facebook_key";
    pub const BARS_INSTAGRAM: &str = "bars_instagram_key";
    pub const BARS_TWITTER: &str = "bars_twitter_key";
    pub const RSVPS_USER_EVENT: &str = "rsvps_user_event_key";
    pub const EVENTLIST_PKEY: &str = "eventlist_bars_pkey";

    pub const EVENTS_USER_FK: &str = "events_user_id_fkey";
    pub const RSVPS_USER_FK: &str = "rsvps_user_id_fkey";
    pub const RSVPS_EVENT_FK: &str = "rsvps_event_id_fkey";
    pub const EVENTLIST_EVENT_FK: &str = "eventlist_bars_event_id_fkey";
    pub const EVENTLIST_BAR_FK: &str = "eventlist_bars_bar_id_fkey";
    pub const OAUTH_USER_FK: &str = "oauth_user_id_fkey";
}

/// Unique violation → conflict naming the duplicated field.
pub(crate) fn unique_violation(constraint: &str) -> AppError {
    use constraint::*;

    let message = match constraint {
        USERS_EMAIL | BARS_EMAIL => "Email already exists",
        USERS_USERNAME => "Username already exists",
        BARS_ADDRESS => "Address already exists",
        BARS_PHONE => "Phone already exists",
        BARS_WEBSITE => "Website already exists",
        BARS_FACEBOOK => "Facebook already exists",
        BARS_INSTAGRAM => "Instagram already exists",
        BARS_TWITTER => "Twitter already exists",
        RSVPS_USER_EVENT => "User has already RSVP'd to this event",
        EVENTLIST_PKEY => "Bar is already linked to this event",
        _ => "Record already exists",
    };

    AppError::Conflict(message.to_string())
}

/// Foreign key violated by an insert: the referenced parent is missing.
pub(crate) fn missing_parent(constraint: &str) -> AppError {
    use constraint::*;

    let message = match constraint {
        EVENTS_USER_FK | RSVPS_USER_FK | OAUTH_USER_FK => "User not found",
        RSVPS_EVENT_FK | EVENTLIST_EVENT_FK => "Event not found",
        EVENTLIST_BAR_FK => "Bar not found",
        _ => "Referenced record not found",
    };

    AppError::NotFound(message.to_string())
}

/// Foreign key violated by a delete: children without cascade still exist.
pub(crate) fn still_referenced(constraint: &str) -> AppError {
    let message = match constraint {
        constraint::EVENTS_USER_FK => "User still owns events",
        _ => "Record is still referenced",
    };

    AppError::Conflict(message.to_string())
}

/// A contribution would push `total_fund` past what an `INT` column holds.
pub(crate) fn fund_out_of_range() -> AppError {
    AppError::ValidationError("Fund total out of range".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: AppError) -> String {
        match err {
            AppError::Conflict(msg) | AppError::NotFound(msg) => msg,
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unique_violation_names_field() {
        assert_eq!(
            message(unique_violation(constraint::USERS_USERNAME)),
            "Username already exists"
        );
        assert_eq!(
            message(unique_violation(constraint::BARS_PHONE)),
            "Phone already exists"
        );
        assert_eq!(message(unique_violation("whatever")), "Record already exists");
    }

    #[test]
    fn test_foreign_key_messages() {
        assert!(matches!(
            missing_parent(constraint::RSVPS_EVENT_FK),
            AppError::NotFound(_)
        ));
        assert_eq!(
            message(still_referenced(constraint::EVENTS_USER_FK)),
            "User still owns events"
        );
    }
}
