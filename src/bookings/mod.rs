use std::collections::BTreeMap;

use axum::{http::StatusCode, response::IntoResponse};
use diesel_async::pooled_connection::deadpool::PoolError;

use crate::ErrorResponse;

pub mod models;
pub mod routes;

#[derive(thiserror::Error, Debug)]
pub enum BookingsError {
    #[error("internal server error")]
    InternalServerError,

    #[error("Spot couldn't be found")]
    SpotNotFound,

    #[error("Booking couldn't be found")]
    BookingNotFound,

    #[error("Spot must NOT belong to the current user")]
    OwnSpot,

    #[error("Booking must belong to the current user")]
    Forbidden,

    #[error("Sorry, this spot is already booked for the specified dates")]
    BookingConflict,

    #[error("Validation error")]
    InvalidDateRange,

    #[error("Past bookings can't be modified")]
    PastBooking,

    #[error("Bookings that have been started can't be deleted")]
    StartedBooking,

    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    #[error(transparent)]
    PoolError(#[from] PoolError),
}

impl IntoResponse for BookingsError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:#?}", self);

        match self {
            BookingsError::SpotNotFound | BookingsError::BookingNotFound => ErrorResponse {
                message: self.to_string(),
                status_code: StatusCode::NOT_FOUND.as_u16(),
                ..Default::default()
            }
            .into_response(),
            BookingsError::OwnSpot
            | BookingsError::Forbidden
            | BookingsError::PastBooking
            | BookingsError::StartedBooking => ErrorResponse {
                message: self.to_string(),
                status_code: StatusCode::FORBIDDEN.as_u16(),
                ..Default::default()
            }
            .into_response(),
            BookingsError::BookingConflict => {
                let mut errors = BTreeMap::new();
                errors.insert(
                    String::from("startDate"),
                    String::from("Start date conflicts with an existing booking"),
                );
                errors.insert(
                    String::from("endDate"),
                    String::from("End date conflicts with an existing booking"),
                );

                ErrorResponse {
                    message: self.to_string(),
                    status_code: StatusCode::FORBIDDEN.as_u16(),
                    errors: Some(errors),
                }
                .into_response()
            }
            BookingsError::InvalidDateRange => {
                let mut errors = BTreeMap::new();
                errors.insert(
                    String::from("endDate"),
                    String::from("endDate cannot be on or before startDate"),
                );

                ErrorResponse {
                    message: self.to_string(),
                    status_code: StatusCode::BAD_REQUEST.as_u16(),
                    errors: Some(errors),
                }
                .into_response()
            }
            BookingsError::Diesel(diesel_error) => {
                if let diesel::result::Error::NotFound = diesel_error {
                    return BookingsError::BookingNotFound.into_response();
                }
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            BookingsError::InternalServerError | BookingsError::PoolError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
