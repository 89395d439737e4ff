use std::{net::SocketAddr, sync::Arc};

use axum::{middleware, Router};
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager},
    AsyncPgConnection,
};
use rstays::{
    bookings::routes::bookings_router, config::Config, migrations::run_migrations,
    reviews::routes::reviews_router, sessions::refresh_session, sessions::routes::sessions_router,
    spots::routes::spots_router, users::routes::users_router, ApiDoc, AppState, InnerAppState,
    COOKIES_SECRET,
};
use tower_cookies::{CookieManagerLayer, Key};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rstays=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    COOKIES_SECRET
        .set(Key::derive_from(config.cookies_secret.as_bytes()))
        .map_err(|_| "cookies secret already set")?;

    run_migrations(&config.database_url).await?;

    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
    let pool = Pool::builder(manager).build()?;

    let app_state = AppState {
        inner: Arc::new(InnerAppState { pool }),
    };

    let app = Router::new()
        .nest("/api/users", users_router())
        .nest("/api/session", sessions_router())
        .nest("/api/spots", spots_router())
        .nest("/api/reviews", reviews_router())
        .nest("/api/bookings", bookings_router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            refresh_session,
        ))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let address = SocketAddr::from(([127, 0, 0, 1], config.port));

    tracing::info!("listening on http://{address}");

    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
