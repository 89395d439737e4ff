use axum::{http::StatusCode, response::IntoResponse};
use diesel::result::{DatabaseErrorKind, Error::DatabaseError};
use diesel_async::pooled_connection::deadpool::PoolError;

use crate::{validation_error_response, ErrorResponse};

pub mod models;
pub mod routes;

pub const REVIEW_IMAGES_LIMIT: i64 = 10;

#[derive(thiserror::Error, Debug)]
pub enum ReviewsError {
    #[error("internal server error")]
    InternalServerError,

    #[error("Spot couldn't be found")]
    SpotNotFound,

    #[error("Review couldn't be found")]
    ReviewNotFound,

    #[error("User already has a review for this spot")]
    DuplicateReview,

    #[error("Review must belong to the current user")]
    Forbidden,

    #[error("Maximum number of images for this resource was reached")]
    TooManyImages,

    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    #[error(transparent)]
    PoolError(#[from] PoolError),

    #[error(transparent)]
    Validator(#[from] garde::Errors),
}

impl IntoResponse for ReviewsError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:#?}", self);

        match self {
            ReviewsError::SpotNotFound | ReviewsError::ReviewNotFound => ErrorResponse {
                message: self.to_string(),
                status_code: StatusCode::NOT_FOUND.as_u16(),
                ..Default::default()
            }
            .into_response(),
            ReviewsError::DuplicateReview
            | ReviewsError::Forbidden
            | ReviewsError::TooManyImages => ErrorResponse {
                message: self.to_string(),
                status_code: StatusCode::FORBIDDEN.as_u16(),
                ..Default::default()
            }
            .into_response(),
            ReviewsError::Diesel(diesel_error) => {
                // losing the insert race trips the unique (user_id, spot_id) constraint
                if let DatabaseError(DatabaseErrorKind::UniqueViolation, message) = &diesel_error {
                    if message.constraint_name() == Some("reviews_user_id_spot_id_key") {
                        return ReviewsError::DuplicateReview.into_response();
                    }
                }
                if let diesel::result::Error::NotFound = diesel_error {
                    return ReviewsError::ReviewNotFound.into_response();
                }
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            ReviewsError::Validator(errors) => validation_error_response(&errors).into_response(),
            ReviewsError::InternalServerError | ReviewsError::PoolError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
