use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    account_handlers, auth, handlers, scoreboard_handlers, team_handlers, vm_handlers, AppState,
};

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/account/info", get(account_handlers::info))
        .route("/api/account/vpnconfig", get(account_handlers::vpn_config))
        .route("/api/account/checkin", post(account_handlers::check_in))
        .route("/api/vm/start", post(vm_handlers::start_vulnbox))
        .route("/api/vm/reset", post(vm_handlers::reset_vulnbox))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_middleware,
        ));

    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/account/login", get(account_handlers::login))
        .route(
            "/api/account/oauth2redirect",
            get(account_handlers::oauth2_redirect),
        )
        .route("/api/teams/confirmed", get(team_handlers::confirmed))
        .route("/api/scoreboard/schedule", get(scoreboard_handlers::schedule))
        .route("/api/scoreboard/{file}", get(scoreboard_handlers::snapshot));

    // SPA assets with index fallback, mirroring the frontend's
    // client-side routing.
    let static_assets = ServeDir::new(&state.settings.static_dir)
        .not_found_service(ServeFile::new(state.settings.static_dir.join("index.html")));

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback_service(static_assets)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(TraceLayer::new_for_http())
}
