use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use validator::Validate;

use super::blank_as_none;

pub const DEFAULT_EVENT_FLYER: &str = "default-event.png";

/// A crowdfunded party owned by one user.
///
/// Guest count, date, time and goal are free-form strings as stored; nothing
/// checks that `total_fund` stays under `target_goal`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i32,
    pub name_of_event: String,
    pub event_flyer_img: String,
    pub user_id: i32,
    pub desc: String,
    pub number_of_guests: String,
    pub date_of_party: Option<String>,
    pub time_of_party: Option<String>,
    pub target_goal: String,
    pub total_fund: Option<i32>,
    pub created_on: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EventDict<'a> {
    pub id: i32,
    pub name_of_event: &'a str,
    pub info: EventInfo<'a>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EventInfo<'a> {
    pub event_flyer_img: &'a str,
    pub desc: &'a str,
    pub number_of_guests: &'a str,
    pub date_of_party: Option<&'a str>,
    pub time_of_party: Option<&'a str>,
    pub target_goal: &'a str,
    pub total_fund: Option<i32>,
}

impl Event {
    pub fn to_dict(&self) -> EventDict<'_> {
        EventDict {
            id: self.id,
            name_of_event: &self.name_of_event,
            info: EventInfo {
                event_flyer_img: &self.event_flyer_img,
                desc: &self.desc,
                number_of_guests: &self.number_of_guests,
                date_of_party: self.date_of_party.as_deref(),
                time_of_party: self.time_of_party.as_deref(),
                target_goal: &self.target_goal,
                total_fund: self.total_fund,
            },
        }
    }

    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.user_id == user_id
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Event {}>", self.name_of_event)
    }
}

fn default_event_flyer() -> String {
    DEFAULT_EVENT_FLYER.to_string()
}

/// Event details as submitted; the owner comes from the session.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EventForm {
    #[validate(length(min = 1, max = 250))]
    pub name_of_event: String,
    #[serde(default = "default_event_flyer")]
    #[validate(length(min = 1, max = 255))]
    pub event_flyer_img: String,
    #[validate(length(min = 1, max = 255))]
    pub desc: String,
    #[validate(length(min = 1, max = 50))]
    pub number_of_guests: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 50))]
    pub date_of_party: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 50))]
    pub time_of_party: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub target_goal: String,
}

/// An unsaved event. `total_fund` starts out NULL.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name_of_event: String,
    pub event_flyer_img: String,
    pub user_id: i32,
    pub desc: String,
    pub number_of_guests: String,
    pub date_of_party: Option<String>,
    pub time_of_party: Option<String>,
    pub target_goal: String,
}

impl NewEvent {
    pub fn register(form: EventForm, user_id: i32) -> Self {
        Self {
            name_of_event: form.name_of_event,
            event_flyer_img: form.event_flyer_img,
            user_id,
            desc: form.desc,
            number_of_guests: form.number_of_guests,
            date_of_party: form.date_of_party,
            time_of_party: form.time_of_party,
            target_goal: form.target_goal,
        }
    }
}
