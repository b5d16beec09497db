use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

use super::{fund_out_of_range, missing_parent, still_referenced, unique_violation, Store};
use crate::models::{
    Bar, Event, EventList, NewBar, NewEvent, NewOAuthToken, NewUser, OAuth, Provider, Rsvp, User,
    UserUpdate,
};
use crate::utils::error::AppError;

const USER_COLUMNS: &str = "id, name, email, username, password, image_file, \
     email_confirmed, mailing_list, created_on, last_login";

const BAR_COLUMNS: &str = "id, bar_name, address, city, state, country, email, \
     email_confirmed, phone, img, img_header, \"desc\", website, facebook, instagram, twitter, \
     created_on";

const EVENT_COLUMNS: &str = "id, name_of_event, event_flyer_img, user_id, \"desc\", \
     number_of_guests, date_of_party, time_of_party, target_goal, total_fund, created_on";

/// SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

const OAUTH_COLUMNS: &str = "id, provider, created_at, token, user_id";

/// Constraint errors raised by inserts and updates.
fn write_error(e: sqlx::Error) -> AppError {
    let mapped = match &e {
        sqlx::Error::Database(db) => {
            let constraint = db.constraint().unwrap_or_default();
            if db.is_unique_violation() {
                Some(unique_violation(constraint))
            } else if db.is_foreign_key_violation() {
                Some(missing_parent(constraint))
            } else {
                None
            }
        }
        _ => None,
    };

    mapped.unwrap_or(AppError::DatabaseError(e))
}

/// Constraint errors raised by deletes.
fn delete_error(e: sqlx::Error) -> AppError {
    let mapped = match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            Some(still_referenced(db.constraint().unwrap_or_default()))
        }
        _ => None,
    };

    mapped.unwrap_or(AppError::DatabaseError(e))
}

/// Overflow of `total_fund` is a bad contribution, not a storage fault.
fn fund_error(e: sqlx::Error) -> AppError {
    let out_of_range = matches!(
        &e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE)
    );

    if out_of_range {
        fund_out_of_range()
    } else {
        AppError::DatabaseError(e)
    }
}

fn not_found_unless_deleted(rows: u64, what: &str) -> Result<(), AppError> {
    if rows == 0 {
        Err(AppError::NotFound(format!("{} not found", what)))
    } else {
        Ok(())
    }
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        info!(max_connections, "Connecting to PostgreSQL");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        info!("Successfully connected to database");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| AppError::InternalServerError(format!("Migration failed: {}", e)))?;

        info!("Migrations run successfully");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (name, email, username, password) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );

        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password)
            .fetch_one(&self.pool)
            .await
            .map_err(write_error)?;

        info!(user_id = created.id, "User created");
        Ok(created)
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn touch_last_login(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        not_found_unless_deleted(result.rows_affected(), "User")
    }

    #[instrument(skip(self, update))]
    async fn update_user(&self, id: i32, update: &UserUpdate) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET \
               name = COALESCE($2, name), \
               image_file = COALESCE($3, image_file), \
               email_confirmed = COALESCE($4, email_confirmed), \
               mailing_list = COALESCE($5, mailing_list) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(&update.image_file)
            .bind(update.email_confirmed)
            .bind(update.mailing_list)
            .fetch_optional(&self.pool)
            .await
            .map_err(write_error)?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(delete_error)?;
        not_found_unless_deleted(result.rows_affected(), "User")
    }

    #[instrument(skip(self, bar), fields(bar_name = %bar.bar_name))]
    async fn create_bar(&self, bar: &NewBar) -> Result<Bar, AppError> {
        let sql = format!(
            "INSERT INTO bars (bar_name, address, city, state, country, email, phone, img, \
               img_header, \"desc\", website, facebook, instagram, twitter) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {BAR_COLUMNS}"
        );

        let created = sqlx::query_as::<_, Bar>(&sql)
            .bind(&bar.bar_name)
            .bind(&bar.address)
            .bind(&bar.city)
            .bind(&bar.state)
            .bind(&bar.country)
            .bind(&bar.email)
            .bind(&bar.phone)
            .bind(&bar.img)
            .bind(&bar.img_header)
            .bind(&bar.desc)
            .bind(&bar.website)
            .bind(&bar.facebook)
            .bind(&bar.instagram)
            .bind(&bar.twitter)
            .fetch_one(&self.pool)
            .await
            .map_err(write_error)?;

        info!(bar_id = created.id, "Bar created");
        Ok(created)
    }

    async fn find_bar(&self, id: i32) -> Result<Option<Bar>, AppError> {
        let sql = format!("SELECT {BAR_COLUMNS} FROM bars WHERE id = $1");
        Ok(sqlx::query_as::<_, Bar>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_bars(&self) -> Result<Vec<Bar>, AppError> {
        let sql = format!("SELECT {BAR_COLUMNS} FROM bars ORDER BY id");
        Ok(sqlx::query_as::<_, Bar>(&sql).fetch_all(&self.pool).await?)
    }

    #[instrument(skip(self))]
    async fn delete_bar(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(delete_error)?;
        not_found_unless_deleted(result.rows_affected(), "Bar")
    }

    #[instrument(skip(self, event), fields(owner = event.user_id))]
    async fn create_event(&self, event: &NewEvent) -> Result<Event, AppError> {
        let sql = format!(
            "INSERT INTO events (name_of_event, event_flyer_img, user_id, \"desc\", \
               number_of_guests, date_of_party, time_of_party, target_goal) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {EVENT_COLUMNS}"
        );

        let created = sqlx::query_as::<_, Event>(&sql)
            .bind(&event.name_of_event)
            .bind(&event.event_flyer_img)
            .bind(event.user_id)
            .bind(&event.desc)
            .bind(&event.number_of_guests)
            .bind(&event.date_of_party)
            .bind(&event.time_of_party)
            .bind(&event.target_goal)
            .fetch_one(&self.pool)
            .await
            .map_err(write_error)?;

        info!(event_id = created.id, "Event created");
        Ok(created)
    }

    async fn find_event(&self, id: i32) -> Result<Option<Event>, AppError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        Ok(sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY id");
        Ok(sqlx::query_as::<_, Event>(&sql).fetch_all(&self.pool).await?)
    }

    async fn list_events_by_owner(&self, user_id: i32) -> Result<Vec<Event>, AppError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE user_id = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, Event>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    #[instrument(skip(self))]
    async fn delete_event(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(delete_error)?;
        not_found_unless_deleted(result.rows_affected(), "Event")
    }

    #[instrument(skip(self))]
    async fn add_to_fund(&self, event_id: i32, amount: i32) -> Result<Event, AppError> {
        let sql = format!(
            "UPDATE events SET total_fund = COALESCE(total_fund, 0) + $2 \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        );

        sqlx::query_as::<_, Event>(&sql)
            .bind(event_id)
            .bind(amount)
            .fetch_optional(&self.pool)
            .await
            .map_err(fund_error)?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    #[instrument(skip(self))]
    async fn create_rsvp(&self, user_id: i32, event_id: i32) -> Result<Rsvp, AppError> {
        sqlx::query_as::<_, Rsvp>(
            "INSERT INTO rsvps (user_id, event_id) VALUES ($1, $2) \
             RETURNING id, user_id, event_id",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn delete_rsvp(&self, user_id: i32, event_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM rsvps WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_attendees(&self, event_id: i32) -> Result<Vec<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u JOIN rsvps r ON r.user_id = u.id \
             WHERE r.event_id = $1 ORDER BY r.id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?)
    }

    #[instrument(skip(self))]
    async fn link_bar(&self, event_id: i32, bar_id: i32) -> Result<EventList, AppError> {
        sqlx::query_as::<_, EventList>(
            "INSERT INTO eventlist_bars (event_id, bar_id) VALUES ($1, $2) \
             RETURNING event_id, bar_id",
        )
        .bind(event_id)
        .bind(bar_id)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn bars_for_event(&self, event_id: i32) -> Result<Vec<Bar>, AppError> {
        Ok(sqlx::query_as::<_, Bar>(
            "SELECT b.* FROM bars b JOIN eventlist_bars el ON el.bar_id = b.id \
             WHERE el.event_id = $1 ORDER BY b.id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn event_for_bar(&self, bar_id: i32) -> Result<Option<Event>, AppError> {
        Ok(sqlx::query_as::<_, Event>(
            "SELECT e.* FROM events e JOIN eventlist_bars el ON el.event_id = e.id \
             WHERE el.bar_id = $1 ORDER BY e.id LIMIT 1",
        )
        .bind(bar_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    #[instrument(skip(self, token), fields(provider = %token.provider, user_id = ?token.user_id))]
    async fn save_oauth_token(&self, token: &NewOAuthToken) -> Result<OAuth, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM oauth WHERE provider = $1 AND user_id IS NOT DISTINCT FROM $2")
            .bind(token.provider.as_str())
            .bind(token.user_id)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "INSERT INTO oauth (provider, token, user_id) VALUES ($1, $2, $3) \
             RETURNING {OAUTH_COLUMNS}"
        );
        let saved = sqlx::query_as::<_, OAuth>(&sql)
            .bind(token.provider.as_str())
            .bind(&token.token)
            .bind(token.user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(write_error)?;

        tx.commit().await?;

        info!(oauth_id = saved.id, "OAuth token stored");
        Ok(saved)
    }

    async fn find_oauth_token(
        &self,
        provider: Provider,
        user_id: i32,
    ) -> Result<Option<OAuth>, AppError> {
        let sql = format!(
            "SELECT {OAUTH_COLUMNS} FROM oauth WHERE provider = $1 AND user_id = $2 \
             ORDER BY id DESC LIMIT 1"
        );
        Ok(sqlx::query_as::<_, OAuth>(&sql)
            .bind(provider.as_str())
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_oauth_token(
        &self,
        provider: Provider,
        user_id: i32,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM oauth WHERE provider = $1 AND user_id = $2")
            .bind(provider.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
