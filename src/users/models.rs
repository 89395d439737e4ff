use chrono::DateTime;
use diesel::prelude::*;
use garde::Validate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::users;

#[derive(Insertable, Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
}

impl User {
    pub fn into_response(self) -> UserResponse {
        UserResponse {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            email: self.email,
        }
    }

    pub fn into_response_brief(self) -> UserResponseBrief {
        UserResponseBrief {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

#[derive(Validate, Deserialize, ToSchema, TS, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[garde(length(min = 1))]
    pub first_name: String,
    #[garde(length(min = 1))]
    pub last_name: String,
    #[garde(length(min = 4, max = 30))]
    pub username: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 6))]
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

/// Owner / reviewer summary nested inside spot and review responses
#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserResponseBrief {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

/// Login/signup body: the user plus the opaque session token that was also
/// set as the HTTP-only cookie
#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUserResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_payload_rejects_bad_fields() {
        let payload = CreateUser {
            first_name: String::new(),
            last_name: String::from("Doe"),
            username: String::from("abc"),
            email: String::from("not-an-email"),
            password: String::from("short"),
        };

        let errors = payload.validate(&()).unwrap_err();
        let fields: Vec<String> = errors
            .flatten()
            .iter()
            .map(|(path, _)| path.clone())
            .collect();

        assert!(fields.iter().any(|f| f.contains("first_name")));
        assert!(fields.iter().any(|f| f.contains("username")));
        assert!(fields.iter().any(|f| f.contains("email")));
        assert!(fields.iter().any(|f| f.contains("password")));
    }

    #[test]
    fn signup_payload_accepts_valid_fields() {
        let payload = CreateUser {
            first_name: String::from("Jane"),
            last_name: String::from("Doe"),
            username: String::from("janedoe"),
            email: String::from("jane@example.com"),
            password: String::from("password123"),
        };

        assert!(payload.validate(&()).is_ok());
    }
}
