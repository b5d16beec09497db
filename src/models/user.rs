use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use super::{Identifiable, OAuthLinkable};

pub const DEFAULT_USER_IMAGE: &str = "default-user.png";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub username: String,
    /// Argon2 PHC string, never the plaintext.
    #[serde(skip_serializing)]
    pub password: String,
    pub image_file: String,
    pub email_confirmed: bool,
    pub mailing_list: bool,
    pub created_on: Option<NaiveDateTime>,
    pub last_login: Option<NaiveDateTime>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<User {}>", self.username)
    }
}

impl Identifiable for User {
    fn get_id(&self) -> i32 {
        self.id
    }

    fn session_label(&self) -> &str {
        &self.username
    }
}

impl OAuthLinkable for User {}

/// An unsaved user. `password` already holds the hash.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Profile edits; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub image_file: Option<String>,
    pub email_confirmed: Option<bool>,
    pub mailing_list: Option<bool>,
}

impl UserUpdate {
    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(image_file) = &self.image_file {
            user.image_file = image_file.clone();
        }
        if let Some(email_confirmed) = self.email_confirmed {
            user.email_confirmed = email_confirmed;
        }
        if let Some(mailing_list) = self.mailing_list {
            user.mailing_list = mailing_list;
        }
    }
}
