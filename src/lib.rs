use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::FromRef, http::StatusCode, response::IntoResponse, Json};
use diesel_async::{pooled_connection::deadpool::Pool, AsyncPgConnection};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tower_cookies::Key;
use ts_rs::TS;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

pub mod auth;
pub mod bookings;
pub mod config;
pub mod migrations;
pub mod reviews;
pub mod schema;
pub mod sessions;
pub mod spots;
pub mod users;
pub mod utils;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub inner: Arc<InnerAppState>,
}

pub struct InnerAppState {
    pub pool: Pool<AsyncPgConnection>,
}

impl FromRef<AppState> for Pool<AsyncPgConnection> {
    fn from_ref(state: &AppState) -> Self {
        state.inner.pool.clone()
    }
}

pub static COOKIES_SECRET: OnceCell<Key> = OnceCell::new();

/// Anything rated out of 5 stars
pub trait Rating {
    fn rating(&self) -> f64;
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self)).into_response()
    }
}

/// Aggregates every violated field into one 400 body
pub fn validation_error_response(errors: &garde::Errors) -> ErrorResponse {
    ErrorResponse {
        message: String::from("Validation error"),
        status_code: StatusCode::BAD_REQUEST.as_u16(),
        errors: Some(
            errors
                .flatten()
                .iter()
                .map(|(path, error)| (path.clone(), error.to_string()))
                .collect(),
        ),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::routes::create_user,
        sessions::routes::login,
        sessions::routes::logout,
        sessions::routes::get_session,
        spots::routes::get_spots,
        spots::routes::create_spot,
        spots::routes::get_current_user_spots,
        spots::routes::get_spot,
        spots::routes::update_spot,
        spots::routes::delete_spot,
        spots::routes::create_spot_image,
        reviews::routes::get_spot_reviews,
        reviews::routes::create_spot_review,
        reviews::routes::get_current_user_reviews,
        reviews::routes::update_review,
        reviews::routes::delete_review,
        reviews::routes::create_review_image,
        bookings::routes::create_spot_booking,
        bookings::routes::get_spot_bookings,
        bookings::routes::get_current_user_bookings,
        bookings::routes::update_booking,
        bookings::routes::delete_booking,
    ),
    components(
        schemas(users::models::CreateUser),
        schemas(users::models::UserResponse),
        schemas(users::models::UserResponseBrief),
        schemas(users::models::AuthenticatedUserResponse),
        schemas(sessions::models::UserLogin),
        schemas(spots::models::CreateSpot),
        schemas(spots::models::CreateSpotImage),
        schemas(spots::models::SpotResponse),
        schemas(spots::models::SpotResponseBrief),
        schemas(spots::models::SpotDetailResponse),
        schemas(spots::models::SpotImageResponse),
        schemas(spots::models::SpotsResponse),
        schemas(reviews::models::CreateReview),
        schemas(reviews::models::ReviewResponse),
        schemas(reviews::models::ReviewDetailResponse),
        schemas(reviews::models::ReviewWithSpotResponse),
        schemas(reviews::models::ReviewImageResponse),
        schemas(reviews::models::CreateReviewImage),
        schemas(reviews::models::SpotReviewsResponse),
        schemas(reviews::models::UserReviewsResponse),
        schemas(bookings::models::CreateBooking),
        schemas(bookings::models::BookingResponse),
        schemas(bookings::models::BookingResponseBrief),
        schemas(bookings::models::BookingWithSpotResponse),
        schemas(bookings::models::BookingWithUserResponse),
        schemas(bookings::models::UserBookingsResponse),
        schemas(bookings::models::SpotBookingsResponse),
        schemas(bookings::models::SpotBookingsBriefResponse),
        schemas(ErrorResponse),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users API"),
        (name = "Session API"),
        (name = "Spots API"),
        (name = "Reviews API"),
        (name = "Bookings API"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    sessions::SESSION_COOKIE_NAME,
                ))),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_uses_camel_case_wire_keys() {
        let error = ErrorResponse {
            message: String::from("Spot couldn't be found"),
            status_code: 404,
            ..Default::default()
        };

        let json = serde_json::to_value(&error).expect("error response as json");

        assert_eq!(
            json,
            serde_json::json!({
                "message": "Spot couldn't be found",
                "statusCode": 404,
            })
        );
    }

    #[test]
    fn validation_body_carries_field_map() {
        let error = ErrorResponse {
            message: String::from("Validation error"),
            status_code: 400,
            errors: Some(BTreeMap::from([(
                String::from("stars"),
                String::from("not in range 1..=5"),
            )])),
        };

        let json = serde_json::to_value(&error).expect("error response as json");

        assert_eq!(json["statusCode"], 400);
        assert_eq!(json["errors"]["stars"], "not in range 1..=5");
    }
}
