use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use diesel::{
    BelongingToDsl, ExpressionMethods, GroupedBy, OptionalExtension, QueryDsl, SelectableHelper,
};
use diesel_async::RunQueryDsl;
use garde::Validate;
use itertools::multizip;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::AuthExtractor,
    schema::{review_images, reviews, spot_images, spots, users},
    spots::models::{Spot, SpotImage},
    users::models::User,
    AppState, ErrorResponse, InnerAppState,
};

use super::{
    models::{
        CreateReview, CreateReviewImage, Review, ReviewImage, ReviewImageResponse, ReviewResponse,
        SpotReviewsResponse, UserReviewsResponse,
    },
    ReviewsError, REVIEW_IMAGES_LIMIT,
};

pub fn reviews_router() -> Router<AppState> {
    Router::new()
        .route("/current", get(get_current_user_reviews))
        .route("/:review_id", put(update_review).delete(delete_review))
        .route("/:review_id/images", post(create_review_image))
}

/// Get all reviews of a spot
#[utoipa::path(
    get,
    path = "/api/spots/{spot_id}/reviews",
    responses(
        (status = 200, description = "Reviews with their authors and images", body = SpotReviewsResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified spot not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    tag = "Reviews API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn get_spot_reviews(
    State(state): State<Arc<InnerAppState>>,
    Path(spot_id): Path<Uuid>,
) -> Result<Json<SpotReviewsResponse>, ReviewsError> {
    let mut db = state.pool.get().await?;

    let spot_exists = spots::table
        .find(spot_id)
        .select(spots::id)
        .get_result::<Uuid>(&mut db)
        .await
        .optional()?;

    if spot_exists.is_none() {
        return Err(ReviewsError::SpotNotFound);
    }

    let (reviews, reviewers): (Vec<Review>, Vec<User>) = reviews::table
        .inner_join(users::table)
        .filter(reviews::spot_id.eq(spot_id))
        .select((Review::as_select(), User::as_select()))
        .load::<(Review, User)>(&mut db)
        .await?
        .into_iter()
        .unzip();

    let images = ReviewImage::belonging_to(&reviews)
        .select(ReviewImage::as_select())
        .load::<ReviewImage>(&mut db)
        .await?
        .grouped_by(&reviews);

    let reviews = multizip((reviews, reviewers, images))
        .map(|(review, reviewer, images)| {
            review.into_detail_response(reviewer.into_response_brief(), images)
        })
        .collect();

    Ok(Json(SpotReviewsResponse { reviews }))
}

/// Review a spot; one review per user per spot
#[utoipa::path(
    post,
    path = "/api/spots/{spot_id}/reviews",
    request_body(content = CreateReview, content_type = "application/json"),
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = StatusCode::BAD_REQUEST, description = "Fields validation error", body = ErrorResponse),
        (status = StatusCode::FORBIDDEN, description = "Caller already reviewed this spot", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified spot not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Reviews API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn create_spot_review(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Path(spot_id): Path<Uuid>,
    Json(payload): Json<CreateReview>,
) -> Result<(StatusCode, Json<ReviewResponse>), ReviewsError> {
    payload.validate(&())?;

    let mut db = state.pool.get().await?;

    let spot_exists = spots::table
        .find(spot_id)
        .select(spots::id)
        .get_result::<Uuid>(&mut db)
        .await
        .optional()?;

    if spot_exists.is_none() {
        return Err(ReviewsError::SpotNotFound);
    }

    let existing_review = reviews::table
        .filter(reviews::spot_id.eq(spot_id))
        .filter(reviews::user_id.eq(auth.current_user.id))
        .select(reviews::id)
        .get_result::<Uuid>(&mut db)
        .await
        .optional()?;

    if existing_review.is_some() {
        return Err(ReviewsError::DuplicateReview);
    }

    let review = Review {
        id: Uuid::now_v7(),
        body: payload.review,
        stars: payload.stars,
        spot_id,
        user_id: auth.current_user.id,
        created_at: Utc::now(),
        updated_at: None,
    };

    let review = diesel::insert_into(reviews::table)
        .values(&review)
        .returning(Review::as_returning())
        .get_result::<Review>(&mut db)
        .await?;

    Ok((StatusCode::CREATED, Json(review.into_response())))
}

/// Get all reviews written by the current user
#[utoipa::path(
    get,
    path = "/api/reviews/current",
    responses(
        (status = 200, description = "The caller's reviews with the reviewed spots", body = UserReviewsResponse),
        (status = StatusCode::UNAUTHORIZED, description = "Caller unauthenticated", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Reviews API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn get_current_user_reviews(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
) -> Result<Json<UserReviewsResponse>, ReviewsError> {
    let mut db = state.pool.get().await?;

    let (reviews, reviewed_spots): (Vec<Review>, Vec<Spot>) = reviews::table
        .inner_join(spots::table)
        .filter(reviews::user_id.eq(auth.current_user.id))
        .select((Review::as_select(), Spot::as_select()))
        .load::<(Review, Spot)>(&mut db)
        .await?
        .into_iter()
        .unzip();

    let images = ReviewImage::belonging_to(&reviews)
        .select(ReviewImage::as_select())
        .load::<ReviewImage>(&mut db)
        .await?
        .grouped_by(&reviews);

    let previews = SpotImage::belonging_to(&reviewed_spots)
        .filter(spot_images::preview.eq(true))
        .select(SpotImage::as_select())
        .load::<SpotImage>(&mut db)
        .await?
        .grouped_by(&reviewed_spots);

    let reviews = multizip((reviews, reviewed_spots, images, previews))
        .map(|(review, spot, images, previews)| {
            let preview_image = previews.into_iter().next().map(|image| image.url);
            review.into_spot_response(spot.into_response_brief(preview_image), images)
        })
        .collect();

    Ok(Json(UserReviewsResponse { reviews }))
}

/// Edit a review; only its author may do this
#[utoipa::path(
    put,
    path = "/api/reviews/{review_id}",
    request_body(content = CreateReview, content_type = "application/json"),
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = StatusCode::BAD_REQUEST, description = "Fields validation error", body = ErrorResponse),
        (status = StatusCode::FORBIDDEN, description = "Review belongs to another user", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified review not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Reviews API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn update_review(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Path(review_id): Path<Uuid>,
    Json(payload): Json<CreateReview>,
) -> Result<Json<ReviewResponse>, ReviewsError> {
    payload.validate(&())?;

    let mut db = state.pool.get().await?;

    let review = reviews::table
        .find(review_id)
        .select(Review::as_select())
        .get_result::<Review>(&mut db)
        .await
        .optional()?
        .ok_or(ReviewsError::ReviewNotFound)?;

    if review.user_id != auth.current_user.id {
        return Err(ReviewsError::Forbidden);
    }

    let review = diesel::update(reviews::table.find(review_id))
        .set((&payload, reviews::updated_at.eq(Some(Utc::now()))))
        .returning(Review::as_returning())
        .get_result::<Review>(&mut db)
        .await?;

    Ok(Json(review.into_response()))
}

/// Delete a review; only its author may do this
#[utoipa::path(
    delete,
    path = "/api/reviews/{review_id}",
    responses(
        (status = 200, description = "Review deleted"),
        (status = StatusCode::FORBIDDEN, description = "Review belongs to another user", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified review not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Reviews API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn delete_review(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Path(review_id): Path<Uuid>,
) -> Result<Json<Value>, ReviewsError> {
    let mut db = state.pool.get().await?;

    let review = reviews::table
        .find(review_id)
        .select(Review::as_select())
        .get_result::<Review>(&mut db)
        .await
        .optional()?
        .ok_or(ReviewsError::ReviewNotFound)?;

    if review.user_id != auth.current_user.id {
        return Err(ReviewsError::Forbidden);
    }

    diesel::delete(reviews::table.find(review_id))
        .execute(&mut db)
        .await?;

    Ok(Json(json!({
        "message": "Successfully deleted",
        "statusCode": 200,
    })))
}

/// Add an image to a review; only its author may do this
#[utoipa::path(
    post,
    path = "/api/reviews/{review_id}/images",
    request_body(content = CreateReviewImage, content_type = "application/json"),
    responses(
        (status = 201, description = "Image created", body = ReviewImageResponse),
        (status = StatusCode::FORBIDDEN, description = "Review belongs to another user or image limit reached", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "Specified review not found", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    security(("session" = [])),
    tag = "Reviews API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn create_review_image(
    auth: AuthExtractor,
    State(state): State<Arc<InnerAppState>>,
    Path(review_id): Path<Uuid>,
    Json(payload): Json<CreateReviewImage>,
) -> Result<(StatusCode, Json<ReviewImageResponse>), ReviewsError> {
    payload.validate(&())?;

    let mut db = state.pool.get().await?;

    let review = reviews::table
        .find(review_id)
        .select(Review::as_select())
        .get_result::<Review>(&mut db)
        .await
        .optional()?
        .ok_or(ReviewsError::ReviewNotFound)?;

    if review.user_id != auth.current_user.id {
        return Err(ReviewsError::Forbidden);
    }

    let image_count = review_images::table
        .filter(review_images::review_id.eq(review_id))
        .count()
        .get_result::<i64>(&mut db)
        .await?;

    if image_count >= REVIEW_IMAGES_LIMIT {
        return Err(ReviewsError::TooManyImages);
    }

    let image = ReviewImage {
        id: Uuid::now_v7(),
        url: payload.url,
        review_id,
        created_at: Utc::now(),
    };

    let image = diesel::insert_into(review_images::table)
        .values(&image)
        .returning(ReviewImage::as_returning())
        .get_result::<ReviewImage>(&mut db)
        .await?;

    Ok((StatusCode::CREATED, Json(image.into_response())))
}
