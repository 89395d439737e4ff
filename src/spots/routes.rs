use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use diesel::{
    BelongingToDsl, ExpressionMethods, GroupedBy, OptionalExtension, QueryDsl, SelectableHelper,
};
use diesel_async::{scoped_futures::ScopedFutureExt, AsyncConnection, RunQueryDsl};
use garde::Validate;
use itertools::multizip;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::AuthExtractor,
    bookings::routes::{create_spot_booking, get_spot_bookings},
    reviews::{
        models::Review,
        routes::{create_spot_review, get_spot_reviews},
    },
    schema::{spot_images, spots, users},
    users::models::User,
    AppState, ErrorResponse, InnerAppState,
};

use super::{
    models::{
        CreateSpot, CreateSpotImage, Spot, SpotDetailResponse, SpotImage, SpotImageResponse,
        SpotResponse, SpotsResponse,
    },
    SpotsError,
};

pub fn spots_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_spots).post(create_spot))
        .route("/current", get(get_current_user_spots))
        .route(
            "/:spot_id",
            get(get_spot).put(update_spot).delete(delete_spot),
        )
        .route("/:spot_id/images", post(create_spot_image))
        .route(
            "/:spot_id/reviews",
            get(get_spot_reviews).post(create_spot_review),
        )
        .route(
            "/:spot_id/bookings",
            get(get_spot_bookings).post(create_spot_booking),
        )
}

/// Get all spots
#[utoipa::path(
    get,
    path = "/api/spots",
    responses(
        (status = 200, description = "All spots, augmented with avgRating and previewImage", body = SpotsResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    tag = "Spots API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn get_spots(
    State(state): State<Arc<InnerAppState>>,
) -> Result<Json<SpotsResponse>, SpotsError> {
    let mut db = state.pool.get().await?;

    let spots = spots::table
        .select(Spot::as_select())
        .load::<Spot>(&mut db)
        .await?;

    let reviews = Review::belonging_to(&spots)
        .select(Review::as_select())
        .load::<Review>(&mut db)
        .await?
        .grouped_by(&spots);

    let previews = SpotImage::belonging_to(&spots)
        .filter(spot_images::preview.eq(true))
        .select(SpotImage::as_select())
        .load::<SpotImage>(&mut db)
        .await?
        .grouped_by(&spots);

    let spots = multizip((spots, reviews, previews))
        .map(|(spot, reviews, previews)| {
            let preview_image = previews.into_iter().next().map(|image| image.url);
            spot.into_response(&reviews, preview_image)
        })
        .collect();

    Ok(Json(SpotsResponse { spots }))
}

/// Get all spots owned by the current user
#[utoipa::path(
    get,
    path = "/api/spots/current",
    responses(
        (status = 200, description = "The caller's spots, augmented with avgRating and previewImage", body = SpotsResponse),
        (status = StatusCode::UNAUTHORIZED, description = "Caller unauthenticated", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Spots API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn get_current_user_spots(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
) -> Result<Json<SpotsResponse>, SpotsError> {
    let mut db = state.pool.get().await?;

    let spots = spots::table
        .filter(spots::owner_id.eq(auth.current_user.id))
        .select(Spot::as_select())
        .load::<Spot>(&mut db)
        .await?;

    let reviews = Review::belonging_to(&spots)
        .select(Review::as_select())
        .load::<Review>(&mut db)
        .await?
        .grouped_by(&spots);

    let previews = SpotImage::belonging_to(&spots)
        .filter(spot_images::preview.eq(true))
        .select(SpotImage::as_select())
        .load::<SpotImage>(&mut db)
        .await?
        .grouped_by(&spots);

    let spots = multizip((spots, reviews, previews))
        .map(|(spot, reviews, previews)| {
            let preview_image = previews.into_iter().next().map(|image| image.url);
            spot.into_response(&reviews, preview_image)
        })
        .collect();

    Ok(Json(SpotsResponse { spots }))
}

/// Create a spot owned by the caller
#[utoipa::path(
    post,
    path = "/api/spots",
    request_body(content = CreateSpot, content_type = "application/json"),
    responses(
        (status = 201, description = "Spot created", body = SpotResponse),
        (status = StatusCode::BAD_REQUEST, description = "Fields validation error", body = ErrorResponse),
        (status = StatusCode::UNAUTHORIZED, description = "Caller unauthenticated", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Spots API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn create_spot(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Json(payload): Json<CreateSpot>,
) -> Result<(StatusCode, Json<SpotResponse>), SpotsError> {
    payload.validate(&())?;

    let mut db = state.pool.get().await?;

    let spot = Spot {
        id: Uuid::now_v7(),
        address: payload.address,
        city: payload.city,
        state: payload.state,
        country: payload.country,
        lat: payload.lat,
        lng: payload.lng,
        name: payload.name,
        description: payload.description,
        price: payload.price,
        owner_id: auth.current_user.id,
        created_at: Utc::now(),
        updated_at: None,
    };

    let spot = diesel::insert_into(spots::table)
        .values(&spot)
        .returning(Spot::as_returning())
        .get_result::<Spot>(&mut db)
        .await?;

    Ok((StatusCode::CREATED, Json(spot.into_response(&[], None))))
}

/// Get the details of one spot
#[utoipa::path(
    get,
    path = "/api/spots/{spot_id}",
    responses(
        (status = 200, description = "Spot detail with reviews aggregate, images and owner", body = SpotDetailResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified spot not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    tag = "Spots API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn get_spot(
    State(state): State<Arc<InnerAppState>>,
    Path(spot_id): Path<Uuid>,
) -> Result<Json<SpotDetailResponse>, SpotsError> {
    let mut db = state.pool.get().await?;

    let spot = spots::table
        .find(spot_id)
        .select(Spot::as_select())
        .get_result::<Spot>(&mut db)
        .await
        .optional()?
        .ok_or(SpotsError::SpotNotFound)?;

    let reviews = Review::belonging_to(&spot)
        .select(Review::as_select())
        .load::<Review>(&mut db)
        .await?;

    let images = SpotImage::belonging_to(&spot)
        .select(SpotImage::as_select())
        .load::<SpotImage>(&mut db)
        .await?;

    let owner = users::table
        .find(spot.owner_id)
        .select(User::as_select())
        .get_result::<User>(&mut db)
        .await?;

    Ok(Json(spot.into_detail_response(
        &reviews,
        images,
        owner.into_response_brief(),
    )))
}

/// Edit a spot; only its owner may do this
#[utoipa::path(
    put,
    path = "/api/spots/{spot_id}",
    request_body(content = CreateSpot, content_type = "application/json"),
    responses(
        (status = 200, description = "Spot updated", body = SpotResponse),
        (status = StatusCode::BAD_REQUEST, description = "Fields validation error", body = ErrorResponse),
        (status = StatusCode::FORBIDDEN, description = "Spot belongs to another user", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified spot not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Spots API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn update_spot(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Path(spot_id): Path<Uuid>,
    Json(payload): Json<CreateSpot>,
) -> Result<Json<SpotResponse>, SpotsError> {
    payload.validate(&())?;

    let mut db = state.pool.get().await?;

    let spot = spots::table
        .find(spot_id)
        .select(Spot::as_select())
        .get_result::<Spot>(&mut db)
        .await
        .optional()?
        .ok_or(SpotsError::SpotNotFound)?;

    if spot.owner_id != auth.current_user.id {
        return Err(SpotsError::Forbidden);
    }

    let spot = diesel::update(spots::table.find(spot_id))
        .set((&payload, spots::updated_at.eq(Some(Utc::now()))))
        .returning(Spot::as_returning())
        .get_result::<Spot>(&mut db)
        .await?;

    let reviews = Review::belonging_to(&spot)
        .select(Review::as_select())
        .load::<Review>(&mut db)
        .await?;

    let preview_image = SpotImage::belonging_to(&spot)
        .filter(spot_images::preview.eq(true))
        .select(SpotImage::as_select())
        .get_result::<SpotImage>(&mut db)
        .await
        .optional()?
        .map(|image| image.url);

    Ok(Json(spot.into_response(&reviews, preview_image)))
}

/// Delete a spot; dependent images, reviews and bookings cascade
#[utoipa::path(
    delete,
    path = "/api/spots/{spot_id}",
    responses(
        (status = 200, description = "Spot deleted"),
        (status = StatusCode::FORBIDDEN, description = "Spot belongs to another user", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified spot not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Spots API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn delete_spot(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Path(spot_id): Path<Uuid>,
) -> Result<Json<Value>, SpotsError> {
    let mut db = state.pool.get().await?;

    let spot = spots::table
        .find(spot_id)
        .select(Spot::as_select())
        .get_result::<Spot>(&mut db)
        .await
        .optional()?
        .ok_or(SpotsError::SpotNotFound)?;

    if spot.owner_id != auth.current_user.id {
        return Err(SpotsError::Forbidden);
    }

    diesel::delete(spots::table.find(spot_id))
        .execute(&mut db)
        .await?;

    Ok(Json(json!({
        "message": "Successfully deleted",
        "statusCode": 200,
    })))
}

/// Add an image to a spot; a new preview image demotes the previous one
#[utoipa::path(
    post,
    path = "/api/spots/{spot_id}/images",
    request_body(content = CreateSpotImage, content_type = "application/json"),
    responses(
        (status = 201, description = "Image created", body = SpotImageResponse),
        (status = StatusCode::FORBIDDEN, description = "Spot belongs to another user", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified spot not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Spots API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn create_spot_image(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Path(spot_id): Path<Uuid>,
    Json(payload): Json<CreateSpotImage>,
) -> Result<(StatusCode, Json<SpotImageResponse>), SpotsError> {
    payload.validate(&())?;

    let mut db = state.pool.get().await?;

    let spot = spots::table
        .find(spot_id)
        .select(Spot::as_select())
        .get_result::<Spot>(&mut db)
        .await
        .optional()?
        .ok_or(SpotsError::SpotNotFound)?;

    if spot.owner_id != auth.current_user.id {
        return Err(SpotsError::Forbidden);
    }

    let image = db
        .transaction::<_, SpotsError, _>(|transaction| {
            async move {
                if payload.preview {
                    // keep at most one preview per spot
                    diesel::update(
                        spot_images::table
                            .filter(spot_images::spot_id.eq(spot_id))
                            .filter(spot_images::preview.eq(true)),
                    )
                    .set(spot_images::preview.eq(false))
                    .execute(transaction)
                    .await?;
                }

                let image = SpotImage {
                    id: Uuid::now_v7(),
                    url: payload.url,
                    preview: payload.preview,
                    spot_id,
                    created_at: Utc::now(),
                };

                let image = diesel::insert_into(spot_images::table)
                    .values(&image)
                    .returning(SpotImage::as_returning())
                    .get_result::<SpotImage>(transaction)
                    .await?;

                Ok(image)
            }
            .scope_boxed()
        })
        .await?;

    Ok((StatusCode::CREATED, Json(image.into_response())))
}
