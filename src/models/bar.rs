use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use validator::Validate;

use super::blank_as_none;

pub const DEFAULT_BAR_IMAGE: &str = "default-bar.png";
pub const DEFAULT_BAR_HEADER_IMAGE: &str = "default-header-bar.png";

/// A venue that can host events.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bar {
    pub id: i32,
    pub bar_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub email: String,
    pub email_confirmed: bool,
    pub phone: String,
    pub img: String,
    pub img_header: String,
    pub desc: Option<String>,
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub created_on: Option<NaiveDateTime>,
}

/// Nested view of a bar handed to presentation layers.
#[derive(Debug, Serialize, PartialEq)]
pub struct BarDict<'a> {
    pub id: i32,
    pub bar_name: &'a str,
    pub info: BarInfo<'a>,
    pub location: BarLocation<'a>,
    pub social_media: BarSocialMedia<'a>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct BarInfo<'a> {
    pub email: &'a str,
    pub phone: &'a str,
    pub website: Option<&'a str>,
    pub img: &'a str,
    pub desc: Option<&'a str>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct BarLocation<'a> {
    pub address: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub country: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct BarSocialMedia<'a> {
    pub facebook: Option<&'a str>,
    pub instagram: Option<&'a str>,
    pub twitter: Option<&'a str>,
}

impl Bar {
    pub fn image_url(&self) -> &str {
        &self.img
    }

    pub fn to_dict(&self) -> BarDict<'_> {
        BarDict {
            id: self.id,
            bar_name: &self.bar_name,
            info: BarInfo {
                email: &self.email,
                phone: &self.phone,
                website: self.website.as_deref(),
                img: &self.img,
                desc: self.desc.as_deref(),
            },
            location: BarLocation {
                address: &self.address,
                city: &self.city,
                state: &self.state,
                country: &self.country,
            },
            social_media: BarSocialMedia {
                facebook: self.facebook.as_deref(),
                instagram: self.instagram.as_deref(),
                twitter: self.twitter.as_deref(),
            },
        }
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Bar {}>", self.bar_name)
    }
}

fn default_bar_image() -> String {
    DEFAULT_BAR_IMAGE.to_string()
}

fn default_bar_header_image() -> String {
    DEFAULT_BAR_HEADER_IMAGE.to_string()
}

/// Registration form for a bar. Lengths follow the column definitions.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBar {
    #[validate(length(min = 1, max = 100))]
    pub bar_name: String,
    #[validate(length(min = 1, max = 100))]
    pub address: String,
    #[validate(length(min = 1, max = 50))]
    pub city: String,
    #[validate(length(min = 1, max = 50))]
    pub state: String,
    #[validate(length(min = 1, max = 25))]
    pub country: String,
    #[validate(email, length(max = 40))]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub phone: String,
    #[serde(default = "default_bar_image")]
    #[validate(length(min = 1, max = 255))]
    pub img: String,
    #[serde(default = "default_bar_header_image")]
    #[validate(length(min = 1, max = 255))]
    pub img_header: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 255))]
    pub desc: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 150))]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 150))]
    pub facebook: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 150))]
    pub instagram: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 150))]
    pub twitter: Option<String>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_new_bar(suffix: &str) -> NewBar {
        NewBar {
            bar_name: format!("Dive {}", suffix),
            address: format!("{} Main St", suffix),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            country: "USA".to_string(),
            email: format!("bar{}@dive.com", suffix),
            phone: format!("512-555-{}", suffix),
            img: DEFAULT_BAR_IMAGE.to_string(),
            img_header: DEFAULT_BAR_HEADER_IMAGE.to_string(),
            desc: Some("Cheap drinks".to_string()),
            website: None,
            facebook: Some(format!("fb.com/dive{}", suffix)),
            instagram: None,
            twitter: None,
        }
    }

    fn bar() -> Bar {
        Bar {
            id: 7,
            bar_name: "The Dive".to_string(),
            address: "1 Main St".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            country: "USA".to_string(),
            email: "hello@dive.com".to_string(),
            email_confirmed: false,
            phone: "512-555-0100".to_string(),
            img: "dive.png".to_string(),
            img_header: DEFAULT_BAR_HEADER_IMAGE.to_string(),
            desc: None,
            website: Some("dive.com".to_string()),
            facebook: None,
            instagram: Some("@dive".to_string()),
            twitter: None,
            created_on: None,
        }
    }

    #[test]
    fn test_to_dict_groups_columns() {
        let value = serde_json::to_value(bar().to_dict()).unwrap();

        assert_eq!(
            value,
            json!({
                "id": 7,
                "bar_name": "The Dive",
                "info": {
                    "email": "hello@dive.com",
                    "phone": "512-555-0100",
                    "website": "dive.com",
                    "img": "dive.png",
                    "desc": null,
                },
                "location": {
                    "address": "1 Main St",
                    "city": "Austin",
                    "state": "TX",
                    "country": "USA",
                },
                "social_media": {
                    "facebook": null,
                    "instagram": "@dive",
                    "twitter": null,
                },
            })
        );
    }

    #[test]
    fn test_to_dict_is_deterministic() {
        let bar = bar();
        assert_eq!(bar.to_dict(), bar.to_dict());
    }

    #[test]
    fn test_form_defaults_and_blank_links() {
        let form: NewBar = serde_urlencoded::from_str(
            "bar_name=Dive&address=1+Main&city=Austin&state=TX&country=USA\
             &email=a%40b.com&phone=1&website=&twitter=%40dive",
        )
        .unwrap();

        assert_eq!(form.img, DEFAULT_BAR_IMAGE);
        assert_eq!(form.img_header, DEFAULT_BAR_HEADER_IMAGE);
        assert_eq!(form.website, None);
        assert_eq!(form.twitter.as_deref(), Some("@dive"));
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_overlong_country_rejected() {
        let mut form = sample_new_bar("1");
        form.country = "x".repeat(26);
        assert!(form.validate().is_err());
    }
}
