use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use diesel::{
    BelongingToDsl, ExpressionMethods, GroupedBy, OptionalExtension, QueryDsl, SelectableHelper,
};
use diesel_async::RunQueryDsl;
use itertools::multizip;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::AuthExtractor,
    schema::{bookings, spot_images, spots, users},
    spots::models::{Spot, SpotImage},
    users::models::User,
    AppState, ErrorResponse, InnerAppState,
};

use super::{
    models::{
        Booking, BookingResponse, CreateBooking, SpotBookingsBriefResponse, SpotBookingsResponse,
        UserBookingsResponse,
    },
    BookingsError,
};

pub fn bookings_router() -> Router<AppState> {
    Router::new()
        .route("/current", get(get_current_user_bookings))
        .route("/:booking_id", put(update_booking).delete(delete_booking))
}

/// Book a spot; owners can't book their own spots
#[utoipa::path(
    post,
    path = "/api/spots/{spot_id}/bookings",
    request_body(content = CreateBooking, content_type = "application/json"),
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = StatusCode::BAD_REQUEST, description = "End date on or before start date", body = ErrorResponse),
        (status = StatusCode::FORBIDDEN, description = "Own spot or dates already booked", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified spot not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Bookings API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn create_spot_booking(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Path(spot_id): Path<Uuid>,
    Json(payload): Json<CreateBooking>,
) -> Result<(StatusCode, Json<BookingResponse>), BookingsError> {
    let mut db = state.pool.get().await?;

    let spot = spots::table
        .find(spot_id)
        .select(Spot::as_select())
        .get_result::<Spot>(&mut db)
        .await
        .optional()?
        .ok_or(BookingsError::SpotNotFound)?;

    if spot.owner_id == auth.current_user.id {
        return Err(BookingsError::OwnSpot);
    }

    if !payload.date_range_is_valid() {
        return Err(BookingsError::InvalidDateRange);
    }

    let existing_bookings = Booking::belonging_to(&spot)
        .select(Booking::as_select())
        .load::<Booking>(&mut db)
        .await?;

    if existing_bookings
        .iter()
        .any(|booking| booking.overlaps(payload.start_date, payload.end_date))
    {
        return Err(BookingsError::BookingConflict);
    }

    let booking = Booking {
        id: Uuid::now_v7(),
        spot_id,
        user_id: auth.current_user.id,
        start_date: payload.start_date,
        end_date: payload.end_date,
        created_at: Utc::now(),
        updated_at: None,
    };

    let booking = diesel::insert_into(bookings::table)
        .values(&booking)
        .returning(Booking::as_returning())
        .get_result::<Booking>(&mut db)
        .await?;

    Ok((StatusCode::CREATED, Json(booking.into_response())))
}

/// Get all bookings of a spot; the owner sees who booked, everyone
/// else only sees the blocked dates
#[utoipa::path(
    get,
    path = "/api/spots/{spot_id}/bookings",
    responses(
        (status = 200, description = "Bookings of the spot", body = SpotBookingsResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified spot not found", body = ErrorResponse),
        (status = StatusCode::UNAUTHORIZED, description = "Caller unauthenticated", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Bookings API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn get_spot_bookings(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Path(spot_id): Path<Uuid>,
) -> Result<Response, BookingsError> {
    let mut db = state.pool.get().await?;

    let spot = spots::table
        .find(spot_id)
        .select(Spot::as_select())
        .get_result::<Spot>(&mut db)
        .await
        .optional()?
        .ok_or(BookingsError::SpotNotFound)?;

    if spot.owner_id == auth.current_user.id {
        let bookings = bookings::table
            .inner_join(users::table)
            .filter(bookings::spot_id.eq(spot_id))
            .select((Booking::as_select(), User::as_select()))
            .load::<(Booking, User)>(&mut db)
            .await?
            .into_iter()
            .map(|(booking, user)| booking.into_user_response(user.into_response_brief()))
            .collect();

        return Ok(Json(SpotBookingsResponse { bookings }).into_response());
    }

    let bookings = Booking::belonging_to(&spot)
        .select(Booking::as_select())
        .load::<Booking>(&mut db)
        .await?
        .into_iter()
        .map(Booking::into_response_brief)
        .collect();

    Ok(Json(SpotBookingsBriefResponse { bookings }).into_response())
}

/// Get all bookings made by the current user
#[utoipa::path(
    get,
    path = "/api/bookings/current",
    responses(
        (status = 200, description = "The caller's bookings with the booked spots", body = UserBookingsResponse),
        (status = StatusCode::UNAUTHORIZED, description = "Caller unauthenticated", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Bookings API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn get_current_user_bookings(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
) -> Result<Json<UserBookingsResponse>, BookingsError> {
    let mut db = state.pool.get().await?;

    let (bookings, booked_spots): (Vec<Booking>, Vec<Spot>) = bookings::table
        .inner_join(spots::table)
        .filter(bookings::user_id.eq(auth.current_user.id))
        .select((Booking::as_select(), Spot::as_select()))
        .load::<(Booking, Spot)>(&mut db)
        .await?
        .into_iter()
        .unzip();

    let previews = SpotImage::belonging_to(&booked_spots)
        .filter(spot_images::preview.eq(true))
        .select(SpotImage::as_select())
        .load::<SpotImage>(&mut db)
        .await?
        .grouped_by(&booked_spots);

    let bookings = multizip((bookings, booked_spots, previews))
        .map(|(booking, spot, previews)| {
            let preview_image = previews.into_iter().next().map(|image| image.url);
            booking.into_spot_response(spot.into_response_brief(preview_image))
        })
        .collect();

    Ok(Json(UserBookingsResponse { bookings }))
}

/// Move a booking to new dates; only future bookings, only by their owner
#[utoipa::path(
    put,
    path = "/api/bookings/{booking_id}",
    request_body(content = CreateBooking, content_type = "application/json"),
    responses(
        (status = 200, description = "Booking updated", body = BookingResponse),
        (status = StatusCode::BAD_REQUEST, description = "End date on or before start date", body = ErrorResponse),
        (status = StatusCode::FORBIDDEN, description = "Not the caller's booking, already past, or dates already booked", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified booking not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Bookings API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn update_booking(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<CreateBooking>,
) -> Result<Json<BookingResponse>, BookingsError> {
    let mut db = state.pool.get().await?;

    let booking = bookings::table
        .find(booking_id)
        .select(Booking::as_select())
        .get_result::<Booking>(&mut db)
        .await
        .optional()?
        .ok_or(BookingsError::BookingNotFound)?;

    if booking.user_id != auth.current_user.id {
        return Err(BookingsError::Forbidden);
    }

    if booking.end_date < Utc::now().date_naive() {
        return Err(BookingsError::PastBooking);
    }

    if !payload.date_range_is_valid() {
        return Err(BookingsError::InvalidDateRange);
    }

    let other_bookings = bookings::table
        .filter(bookings::spot_id.eq(booking.spot_id))
        .filter(bookings::id.ne(booking.id))
        .select(Booking::as_select())
        .load::<Booking>(&mut db)
        .await?;

    if other_bookings
        .iter()
        .any(|other| other.overlaps(payload.start_date, payload.end_date))
    {
        return Err(BookingsError::BookingConflict);
    }

    let booking = diesel::update(bookings::table.find(booking_id))
        .set((&payload, bookings::updated_at.eq(Some(Utc::now()))))
        .returning(Booking::as_returning())
        .get_result::<Booking>(&mut db)
        .await?;

    Ok(Json(booking.into_response()))
}

/// Delete a booking; allowed for the booker and for the spot's owner,
/// unless the stay already started
#[utoipa::path(
    delete,
    path = "/api/bookings/{booking_id}",
    responses(
        (status = 200, description = "Booking deleted"),
        (status = StatusCode::FORBIDDEN, description = "Not the caller's booking or stay already started", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified booking not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Bookings API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn delete_booking(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, BookingsError> {
    let mut db = state.pool.get().await?;

    let booking = bookings::table
        .find(booking_id)
        .select(Booking::as_select())
        .get_result::<Booking>(&mut db)
        .await
        .optional()?
        .ok_or(BookingsError::BookingNotFound)?;

    if booking.user_id != auth.current_user.id {
        let spot = spots::table
            .find(booking.spot_id)
            .select(Spot::as_select())
            .get_result::<Spot>(&mut db)
            .await?;

        if spot.owner_id != auth.current_user.id {
            return Err(BookingsError::Forbidden);
        }
    }

    if booking.start_date <= Utc::now().date_naive() {
        return Err(BookingsError::StartedBooking);
    }

    diesel::delete(bookings::table.find(booking_id))
        .execute(&mut db)
        .await?;

    Ok(Json(json!({
        "message": "Successfully deleted",
        "statusCode": 200,
    })))
}
