use axum::{http::StatusCode, response::IntoResponse};
use diesel_async::pooled_connection::deadpool::PoolError;

use crate::{validation_error_response, ErrorResponse};

pub mod models;
pub mod routes;

#[derive(thiserror::Error, Debug)]
pub enum SpotsError {
    #[error("internal server error")]
    InternalServerError,

    #[error("Spot couldn't be found")]
    SpotNotFound,

    #[error("Spot must belong to the current user")]
    Forbidden,

    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    #[error(transparent)]
    PoolError(#[from] PoolError),

    #[error(transparent)]
    Validator(#[from] garde::Errors),
}

impl IntoResponse for SpotsError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:#?}", self);

        match self {
            SpotsError::SpotNotFound => ErrorResponse {
                message: self.to_string(),
                status_code: StatusCode::NOT_FOUND.as_u16(),
                ..Default::default()
            }
            .into_response(),
            SpotsError::Forbidden => ErrorResponse {
                message: self.to_string(),
                status_code: StatusCode::FORBIDDEN.as_u16(),
                ..Default::default()
            }
            .into_response(),
            SpotsError::Diesel(diesel_error) => {
                if let diesel::result::Error::NotFound = diesel_error {
                    return ErrorResponse {
                        message: String::from("Spot couldn't be found"),
                        status_code: StatusCode::NOT_FOUND.as_u16(),
                        ..Default::default()
                    }
                    .into_response();
                }
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            SpotsError::Validator(errors) => validation_error_response(&errors).into_response(),
            SpotsError::InternalServerError | SpotsError::PoolError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
