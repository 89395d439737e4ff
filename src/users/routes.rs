use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;
use diesel::SelectableHelper;
use diesel_async::RunQueryDsl;
use garde::Validate;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    schema::users,
    sessions::start_session,
    users::models::{AuthenticatedUserResponse, CreateUser, User},
    AppState, ErrorResponse, InnerAppState,
};

use super::UsersError;

pub fn users_router() -> Router<AppState> {
    Router::new().route("/", post(create_user))
}

/// Sign up, and log the new user in right away
#[utoipa::path(
    post,
    path = "/api/users",
    request_body(content = CreateUser, content_type = "application/json"),
    responses(
        (status = 201, description = "User created and logged in", body = AuthenticatedUserResponse),
        (status = StatusCode::BAD_REQUEST, description = "Fields validation error", body = ErrorResponse),
        (status = StatusCode::CONFLICT, description = "Username or email already taken", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    tag = "Users API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn create_user(
    State(state): State<Arc<InnerAppState>>,
    cookies: Cookies,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, Json<AuthenticatedUserResponse>), UsersError> {
    payload.validate(&())?;

    let mut db = state.pool.get().await?;

    let salt = SaltString::generate(&mut OsRng);

    // argon2 is a good algorithm (not a security expert :))
    let argon2 = Argon2::default();

    let hashed_password = argon2
        .hash_password(payload.password.as_bytes(), &salt)?
        .to_string();

    let user = User {
        id: Uuid::now_v7(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        username: payload.username.to_lowercase(),
        email: payload.email.to_lowercase(),
        password: hashed_password,
        created_at: Utc::now(),
        updated_at: None,
    };

    let user = diesel::insert_into(users::table)
        .values(&user)
        .returning(User::as_returning())
        .get_result::<User>(&mut db)
        .await?;

    let session = start_session(&mut db, &cookies, user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthenticatedUserResponse {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            email: user.email,
            token: session.id.to_string(),
        }),
    ))
}
