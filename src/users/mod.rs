use axum::{http::StatusCode, response::IntoResponse};
use diesel::result::{DatabaseErrorKind, Error::DatabaseError};
use diesel_async::pooled_connection::deadpool::PoolError;

use crate::{validation_error_response, ErrorResponse};

pub mod models;
pub mod routes;

#[derive(thiserror::Error, Debug)]
pub enum UsersError {
    #[error("internal server error")]
    InternalServerError,

    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    #[error(transparent)]
    PoolError(#[from] PoolError),

    #[error(transparent)]
    Argon2(#[from] argon2::password_hash::Error),

    #[error(transparent)]
    Validator(#[from] garde::Errors),

    #[error(transparent)]
    SessionError(#[from] crate::sessions::SessionError),
}

impl IntoResponse for UsersError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:#?}", self);

        match self {
            UsersError::Diesel(diesel_error) => {
                if let DatabaseError(DatabaseErrorKind::UniqueViolation, message) = diesel_error {
                    return match message.constraint_name() {
                        Some("users_username_key") => ErrorResponse {
                            message: String::from("User with that username already exists"),
                            status_code: StatusCode::CONFLICT.as_u16(),
                            ..Default::default()
                        }
                        .into_response(),
                        Some("users_email_key") => ErrorResponse {
                            message: String::from("User with that email already exists"),
                            status_code: StatusCode::CONFLICT.as_u16(),
                            ..Default::default()
                        }
                        .into_response(),
                        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                    };
                }
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            UsersError::Validator(errors) => validation_error_response(&errors).into_response(),
            UsersError::SessionError(e) => e.into_response(),
            UsersError::InternalServerError
            | UsersError::PoolError(_)
            | UsersError::Argon2(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
