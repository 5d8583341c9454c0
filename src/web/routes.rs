// src/web/routes.rs
use crate::{
    state::AppState,
    web::{admin_handlers, auth_handlers, mw_admin, mw_auth, password_handlers, profile_handlers},
};
use axum::{
    middleware,
    routing::get,
    Router,
};

pub fn create_router(app_state: AppState) -> Router {

    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route("/logout", get(auth_handlers::handle_logout))
        .route("/forgot", get(auth_handlers::show_forgot_page))
        .route("/ping", get(|| async { "pong" }));

    // --- Rotas de Admin ---
    // Exigem o ADMIN_TOKEN na query string, não uma sessão
    let admin_routes = Router::new()
        .route("/admin_reset/{id}", get(admin_handlers::handle_admin_reset))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_admin::require_admin_token,
        ));

    // --- Rotas Autenticadas ---
    let authenticated_routes = Router::new()
        .route(
            "/change_password",
            get(password_handlers::show_change_password_form)
                .post(password_handlers::handle_change_password),
        )
        .route(
            "/change-password",
            get(password_handlers::show_change_password_form)
                .post(password_handlers::handle_change_password),
        )
        .route("/profile", get(profile_handlers::profile_handler))
        .route("/refresh", get(profile_handlers::refresh_handler))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    // --- Router Final ---
    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}
