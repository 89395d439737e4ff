use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::StatusCode, response::IntoResponse, RequestPartsExt};
use chrono::Utc;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::{
    schema::{sessions, users},
    sessions::{models::Session, UserSession},
    users::models::{User, UserResponseBrief},
    AppState, ErrorResponse,
};

/// Resolves the requesting user from the session cookie. Routes that take
/// this extractor reject unauthenticated callers with 401.
pub struct AuthExtractor {
    pub current_user: UserResponseBrief,
    pub session_id: Uuid,
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("something went wrong")]
    SomethingWentWrong,

    #[error(transparent)]
    PoolError(#[from] diesel_async::pooled_connection::deadpool::PoolError),

    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    #[error("Authentication required")]
    InvalidSession,

    #[error("invalid session")]
    SessionError(#[from] crate::sessions::SessionError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:#?}", self);

        match self {
            AuthError::InvalidSession => ErrorResponse {
                message: self.to_string(),
                status_code: StatusCode::UNAUTHORIZED.as_u16(),
                ..Default::default()
            }
            .into_response(),
            AuthError::SessionError(e) => e.into_response(),
            AuthError::SomethingWentWrong | AuthError::Diesel(_) | AuthError::PoolError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthExtractor {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let mut db = state.inner.pool.get().await?;

        let session_id = parts
            .extract_with_state::<UserSession, _>(state)
            .await?
            .session_id
            .ok_or_else(|| {
                tracing::error!("auth-extractor: missing session_id");
                AuthError::InvalidSession
            })?;

        let query = sessions::table
            .inner_join(users::table)
            .filter(sessions::id.eq(session_id))
            .filter(sessions::expires_at.gt(Utc::now()));

        let Ok((user, session)) = query
            .select((User::as_select(), Session::as_select()))
            .get_result::<(User, Session)>(&mut db)
            .await
        else {
            // expired or unknown session: purge the row so it can't come back
            diesel::delete(sessions::table.filter(sessions::id.eq(session_id)))
                .execute(&mut db)
                .await?;
            return Err(AuthError::InvalidSession);
        };

        Ok(AuthExtractor {
            current_user: UserResponseBrief {
                id: user.id,
                first_name: user.first_name,
                last_name: user.last_name,
            },
            session_id: session.id,
        })
    }
}
