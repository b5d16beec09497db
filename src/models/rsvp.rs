use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One user attending one event. The pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Rsvp {
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
}
