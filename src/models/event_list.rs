use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Links an event to a bar where it takes place. `(event_id, bar_id)` is the
/// primary key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct EventList {
    pub event_id: i32,
    pub bar_id: i32,
}
