pub mod models;
pub mod routes;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use chrono::{DateTime, Duration, Utc};
use diesel::SelectableHelper;
use diesel::{dsl, ExpressionMethods, QueryDsl};
use diesel_async::{
    pooled_connection::deadpool::{Object, Pool},
    AsyncPgConnection, RunQueryDsl,
};
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    schema::sessions,
    sessions::models::{CreateSession, Session},
    validation_error_response, AppState, ErrorResponse, COOKIES_SECRET,
};

pub const SESSION_COOKIE_NAME: &str = "token";

pub const SESSION_DURATION_DAYS: i64 = 2;

pub struct UserSession {
    pub session_id: Option<Uuid>,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("something went wrong")]
    SomethingWentWrong,

    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    #[error(transparent)]
    PoolError(#[from] diesel_async::pooled_connection::deadpool::PoolError),

    #[error(transparent)]
    Argon2(#[from] argon2::password_hash::Error),

    #[error(transparent)]
    Validator(#[from] garde::Errors),

    #[error("invalid session")]
    InvalidSession,

    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:#?}", self);

        match self {
            SessionError::InvalidSession | SessionError::InvalidCredentials => ErrorResponse {
                message: self.to_string(),
                status_code: StatusCode::UNAUTHORIZED.as_u16(),
                ..Default::default()
            }
            .into_response(),
            SessionError::Validator(errors) => validation_error_response(&errors).into_response(),
            SessionError::SomethingWentWrong
            | SessionError::Diesel(_)
            | SessionError::PoolError(_)
            | SessionError::Argon2(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UserSession {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies =
            parts
                .extract::<Cookies>()
                .await
                .map_err(|(_error_status, error_message)| {
                    tracing::error!(
                        "session-extractor: failed to get private cookie jar: {error_message}"
                    );
                    SessionError::InvalidSession
                })?;

        let key = COOKIES_SECRET.get().expect("cookies secret key");

        if let Some(session_id) = cookies.private(key).get(SESSION_COOKIE_NAME) {
            Ok(Self {
                session_id: Some(Uuid::parse_str(session_id.value()).map_err(|e| {
                    tracing::error!("session-extractor: invalid session_id: {e}");
                    SessionError::InvalidSession
                })?),
            })
        } else {
            Ok(Self { session_id: None })
        }
    }
}

/// Insert a session row and set the HTTP-only cookie carrying its id
pub async fn start_session(
    db: &mut Object<AsyncPgConnection>,
    cookies: &Cookies,
    user_id: Uuid,
) -> Result<Session, SessionError> {
    let created_at = Utc::now();

    let session = CreateSession {
        id: Uuid::now_v7(),
        user_id,
        created_at,
        expires_at: created_at + Duration::days(SESSION_DURATION_DAYS),
    };

    let session = diesel::insert_into(sessions::table)
        .values(&session)
        .returning(Session::as_returning())
        .get_result::<Session>(db)
        .await?;

    let key = COOKIES_SECRET.get().expect("cookies secret key");

    cookies
        .private(key)
        .add(session_cookie(session.id.to_string()));

    Ok(session)
}

fn session_cookie(session_id: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, session_id);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie
}

/// The removal cookie must carry the same path the login cookie was set
/// with, or browsers keep the original
pub(crate) fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookie
}

type SessionRefresh = dsl::Update<
    dsl::Filter<dsl::Find<sessions::table, Uuid>, dsl::Gt<sessions::expires_at, DateTime<Utc>>>,
    dsl::Eq<sessions::expires_at, DateTime<Utc>>,
>;

/// Pushes the deadline of a still-live session. Expired rows are left
/// untouched for the auth extractor to reject and purge
fn refresh_statement(session_id: Uuid, now: DateTime<Utc>) -> SessionRefresh {
    diesel::update(
        sessions::table
            .find(session_id)
            .filter(sessions::expires_at.gt(now)),
    )
    .set(sessions::expires_at.eq(now + Duration::days(SESSION_DURATION_DAYS)))
}

/// Sliding expiry: every authenticated request pushes the session deadline
pub async fn refresh_session<B>(
    session: UserSession,
    State(pool): State<Pool<AsyncPgConnection>>,
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, SessionError> {
    if let Some(session_id) = session.session_id {
        let mut db = pool.get().await?;

        refresh_statement(session_id, Utc::now())
            .execute(&mut db)
            .await?;
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_only_touches_live_sessions() {
        let statement = refresh_statement(Uuid::now_v7(), Utc::now());
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&statement).to_string();

        assert!(sql.starts_with(r#"UPDATE "sessions" SET "expires_at""#));
        assert!(sql.contains(r#""expires_at" > "#));
    }

    #[test]
    fn session_cookie_is_scoped_to_the_whole_site() {
        let cookie = session_cookie(String::from("0"));

        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[test]
    fn removal_cookie_matches_the_login_cookie_path() {
        let cookie = removal_cookie();

        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.path(), Some("/"));
    }
}
