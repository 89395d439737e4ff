use chrono::DateTime;
use diesel::{Insertable, Queryable, Selectable};
use garde::Validate;
use serde::Deserialize;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::sessions;

#[derive(Queryable, Selectable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<chrono::Utc>,
    pub expires_at: DateTime<chrono::Utc>,
    pub user_id: Uuid,
}

#[derive(Insertable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<chrono::Utc>,
    pub expires_at: DateTime<chrono::Utc>,
}

/// `credential` matches a username or an email
#[derive(Validate, Deserialize, ToSchema, TS, Debug)]
pub struct UserLogin {
    #[garde(length(min = 1))]
    pub credential: String,
    #[garde(length(min = 1))]
    pub password: String,
}
