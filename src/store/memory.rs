use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use super::{
    constraint, fund_out_of_range, missing_parent, still_referenced, unique_violation, Store,
};
use crate::models::{
    bar::Bar, event::Event, user::DEFAULT_USER_IMAGE, EventList, NewBar, NewEvent,
    NewOAuthToken, NewUser, OAuth, Provider, Rsvp, User, UserUpdate,
};
use crate::utils::error::AppError;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    bars: Vec<Bar>,
    events: Vec<Event>,
    rsvps: Vec<Rsvp>,
    event_bars: Vec<EventList>,
    oauth: Vec<OAuth>,
    next_user_id: i32,
    next_bar_id: i32,
    next_event_id: i32,
    next_rsvp_id: i32,
    next_oauth_id: i32,
}

fn next(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Optional unique columns only collide when both sides are set.
fn same_link(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

impl Tables {
    fn user_exists(&self, id: i32) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn event_exists(&self, id: i32) -> bool {
        self.events.iter().any(|e| e.id == id)
    }

    fn bar_exists(&self, id: i32) -> bool {
        self.bars.iter().any(|b| b.id == id)
    }

    fn event(&self, id: i32) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }
}

/// In-process store with the same constraints as the SQL schema.
///
/// Data lives for the lifetime of the process. Used by the test suite and by
/// `STORAGE_BACKEND=memory` for local runs without a database.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|e| AppError::InternalServerError(format!("Memory store poisoned: {}", e)))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.tables().map(|_| ())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let mut t = self.tables()?;

        if t.users.iter().any(|u| u.email == user.email) {
            return Err(unique_violation(constraint::USERS_EMAIL));
        }
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(unique_violation(constraint::USERS_USERNAME));
        }

        let created = User {
            id: next(&mut t.next_user_id),
            name: user.name.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            password: user.password.clone(),
            image_file: DEFAULT_USER_IMAGE.to_string(),
            email_confirmed: false,
            mailing_list: false,
            created_on: Some(now()),
            last_login: Some(now()),
        };
        t.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.tables()?.users.clone())
    }

    async fn touch_last_login(&self, id: i32) -> Result<(), AppError> {
        let mut t = self.tables()?;
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.last_login = Some(now());
        Ok(())
    }

    async fn update_user(&self, id: i32, update: &UserUpdate) -> Result<User, AppError> {
        let mut t = self.tables()?;
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        update.apply(user);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i32) -> Result<(), AppError> {
        let mut t = self.tables()?;

        if !t.user_exists(id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if t.events.iter().any(|e| e.user_id == id) {
            return Err(still_referenced(constraint::EVENTS_USER_FK));
        }

        t.users.retain(|u| u.id != id);
        t.rsvps.retain(|r| r.user_id != id);
        t.oauth.retain(|o| o.user_id != Some(id));
        Ok(())
    }

    async fn create_bar(&self, bar: &NewBar) -> Result<Bar, AppError> {
        let mut t = self.tables()?;

        for existing in &t.bars {
            let clash = if existing.address == bar.address {
                Some(constraint::BARS_ADDRESS)
            } else if existing.email == bar.email {
                Some(constraint::BARS_EMAIL)
            } else if existing.phone == bar.phone {
                Some(constraint::BARS_PHONE)
            } else if same_link(&existing.website, &bar.website) {
                Some(constraint::BARS_WEBSITE)
            } else if same_link(&existing.facebook, &bar.facebook) {
                Some(constraint::BARS_FACEBOOK)
            } else if same_link(&existing.instagram, &bar.instagram) {
                Some(constraint::BARS_INSTAGRAM)
            } else if same_link(&existing.twitter, &bar.twitter) {
                Some(constraint::BARS_TWITTER)
            } else {
                None
            };

            if let Some(name) = clash {
                return Err(unique_violation(name));
            }
        }

        let created = Bar {
            id: next(&mut t.next_bar_id),
            bar_name: bar.bar_name.clone(),
            address: bar.address.clone(),
            city: bar.city.clone(),
            state: bar.state.clone(),
            country: bar.country.clone(),
            email: bar.email.clone(),
            email_confirmed: false,
            phone: bar.phone.clone(),
            img: bar.img.clone(),
            img_header: bar.img_header.clone(),
            desc: bar.desc.clone(),
            website: bar.website.clone(),
            facebook: bar.facebook.clone(),
            instagram: bar.instagram.clone(),
            twitter: bar.twitter.clone(),
            created_on: Some(now()),
        };
        t.bars.push(created.clone());
        Ok(created)
    }

    async fn find_bar(&self, id: i32) -> Result<Option<Bar>, AppError> {
        Ok(self.tables()?.bars.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bars(&self) -> Result<Vec<Bar>, AppError> {
        Ok(self.tables()?.bars.clone())
    }

    async fn delete_bar(&self, id: i32) -> Result<(), AppError> {
        let mut t = self.tables()?;

        if !t.bar_exists(id) {
            return Err(AppError::NotFound("Bar not found".to_string()));
        }

        t.bars.retain(|b| b.id != id);
        t.event_bars.retain(|l| l.bar_id != id);
        Ok(())
    }

    async fn create_event(&self, event: &NewEvent) -> Result<Event, AppError> {
        let mut t = self.tables()?;

        if !t.user_exists(event.user_id) {
            return Err(missing_parent(constraint::EVENTS_USER_FK));
        }

        let created = Event {
            id: next(&mut t.next_event_id),
            name_of_event: event.name_of_event.clone(),
            event_flyer_img: event.event_flyer_img.clone(),
            user_id: event.user_id,
            desc: event.desc.clone(),
            number_of_guests: event.number_of_guests.clone(),
            date_of_party: event.date_of_party.clone(),
            time_of_party: event.time_of_party.clone(),
            target_goal: event.target_goal.clone(),
            total_fund: None,
            created_on: Some(now()),
        };
        t.events.push(created.clone());
        Ok(created)
    }

    async fn find_event(&self, id: i32) -> Result<Option<Event>, AppError> {
        Ok(self.tables()?.event(id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        Ok(self.tables()?.events.clone())
    }

    async fn list_events_by_owner(&self, user_id: i32) -> Result<Vec<Event>, AppError> {
        Ok(self
            .tables()?
            .events
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_event(&self, id: i32) -> Result<(), AppError> {
        let mut t = self.tables()?;

        if !t.event_exists(id) {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        t.events.retain(|e| e.id != id);
        t.rsvps.retain(|r| r.event_id != id);
        t.event_bars.retain(|l| l.event_id != id);
        Ok(())
    }

    async fn add_to_fund(&self, event_id: i32, amount: i32) -> Result<Event, AppError> {
        let mut t = self.tables()?;
        let event = t
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let total = event
            .total_fund
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(fund_out_of_range)?;
        event.total_fund = Some(total);
        Ok(event.clone())
    }

    async fn create_rsvp(&self, user_id: i32, event_id: i32) -> Result<Rsvp, AppError> {
        let mut t = self.tables()?;

        if !t.user_exists(user_id) {
            return Err(missing_parent(constraint::RSVPS_USER_FK));
        }
        if !t.event_exists(event_id) {
            return Err(missing_parent(constraint::RSVPS_EVENT_FK));
        }
        if t
            .rsvps
            .iter()
            .any(|r| r.user_id == user_id && r.event_id == event_id)
        {
            return Err(unique_violation(constraint::RSVPS_USER_EVENT));
        }

        let rsvp = Rsvp {
            id: next(&mut t.next_rsvp_id),
            user_id,
            event_id,
        };
        t.rsvps.push(rsvp.clone());
        Ok(rsvp)
    }

    async fn delete_rsvp(&self, user_id: i32, event_id: i32) -> Result<bool, AppError> {
        let mut t = self.tables()?;
        let before = t.rsvps.len();
        t.rsvps
            .retain(|r| !(r.user_id == user_id && r.event_id == event_id));
        Ok(t.rsvps.len() < before)
    }

    async fn list_attendees(&self, event_id: i32) -> Result<Vec<User>, AppError> {
        let t = self.tables()?;
        Ok(t.rsvps
            .iter()
            .filter(|r| r.event_id == event_id)
            .filter_map(|r| t.users.iter().find(|u| u.id == r.user_id))
            .cloned()
            .collect())
    }

    async fn link_bar(&self, event_id: i32, bar_id: i32) -> Result<EventList, AppError> {
        let mut t = self.tables()?;

        if !t.event_exists(event_id) {
            return Err(missing_parent(constraint::EVENTLIST_EVENT_FK));
        }
        if !t.bar_exists(bar_id) {
            return Err(missing_parent(constraint::EVENTLIST_BAR_FK));
        }

        let link = EventList { event_id, bar_id };
        if t.event_bars.contains(&link) {
            return Err(unique_violation(constraint::EVENTLIST_PKEY));
        }

        t.event_bars.push(link);
        Ok(link)
    }

    async fn bars_for_event(&self, event_id: i32) -> Result<Vec<Bar>, AppError> {
        let t = self.tables()?;
        let mut bars: Vec<Bar> = t
            .event_bars
            .iter()
            .filter(|l| l.event_id == event_id)
            .filter_map(|l| t.bars.iter().find(|b| b.id == l.bar_id))
            .cloned()
            .collect();
        bars.sort_by_key(|b| b.id);
        Ok(bars)
    }

    async fn event_for_bar(&self, bar_id: i32) -> Result<Option<Event>, AppError> {
        let t = self.tables()?;
        Ok(t.event_bars
            .iter()
            .filter(|l| l.bar_id == bar_id)
            .map(|l| l.event_id)
            .min()
            .and_then(|id| t.event(id))
            .cloned())
    }

    async fn save_oauth_token(&self, token: &NewOAuthToken) -> Result<OAuth, AppError> {
        let mut t = self.tables()?;

        if let Some(user_id) = token.user_id {
            if !t.user_exists(user_id) {
                return Err(missing_parent(constraint::OAUTH_USER_FK));
            }
        }

        let provider = token.provider.as_str();
        t.oauth
            .retain(|o| !(o.provider == provider && o.user_id == token.user_id));

        let saved = OAuth {
            id: next(&mut t.next_oauth_id),
            provider: provider.to_string(),
            created_at: now(),
            token: token.token.clone(),
            user_id: token.user_id,
        };
        t.oauth.push(saved.clone());
        Ok(saved)
    }

    async fn find_oauth_token(
        &self,
        provider: Provider,
        user_id: i32,
    ) -> Result<Option<OAuth>, AppError> {
        Ok(self
            .tables()?
            .oauth
            .iter()
            .rev()
            .find(|o| o.provider == provider.as_str() && o.user_id == Some(user_id))
            .cloned())
    }

    async fn delete_oauth_token(
        &self,
        provider: Provider,
        user_id: i32,
    ) -> Result<bool, AppError> {
        let mut t = self.tables()?;
        let before = t.oauth.len();
        t.oauth
            .retain(|o| !(o.provider == provider.as_str() && o.user_id == Some(user_id)));
        Ok(t.oauth.len() < before)
    }
}
