// src/web/password_handlers.rs
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::employee::ChangePasswordForm,
    services::account_service::{self, PasswordChange},
    state::AppState,
    templates::{self, ChangePasswordPage},
    web::mw_auth::EmpId,
};
use axum::{
    extract::{Extension, Form, State},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

// GET /change_password (protegido por require_auth)
pub async fn show_change_password_form(
    State(state): State<AppState>,
    Extension(EmpId(emp_id)): Extension<EmpId>,
) -> AppResult<Response> {
    let forced = account_service::must_change_password(&state, &emp_id).await?;
    tracing::debug!("GET /change_password para {} (obrigatória: {})", emp_id, forced);
    render_form(&state.config, forced, None)
}

// POST /change_password
pub async fn handle_change_password(
    State(state): State<AppState>,
    session: Session,
    Extension(EmpId(emp_id)): Extension<EmpId>,
    Form(form): Form<ChangePasswordForm>,
) -> AppResult<Response> {
    let outcome = account_service::change_password(
        &state,
        &emp_id,
        &form.current_password,
        &form.new_password,
        &form.confirm_password,
    )
    .await?;

    match outcome {
        PasswordChange::Changed => {
            let notice = urlencoding::encode("Senha alterada com sucesso.");
            Ok(Redirect::to(&format!("/profile?notice={}", notice)).into_response())
        }
        PasswordChange::UnknownEmployee => {
            session
                .flush()
                .await
                .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;
            Ok(Redirect::to("/login").into_response())
        }
        PasswordChange::Rejected(rejection) => {
            // Nada foi gravado; mostra o formulário outra vez com o motivo
            let forced = account_service::must_change_password(&state, &emp_id).await?;
            render_form(&state.config, forced, Some(rejection.to_string()))
        }
    }
}

fn render_form(config: &Arc<Config>, forced: bool, error: Option<String>) -> AppResult<Response> {
    let page = ChangePasswordPage {
        error,
        forced,
        require_current: config.password_policy.requires_current(),
        hint: config.password_policy.hint(),
    };
    Ok(templates::render(&page)?.into_response())
}
