// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::employee::LoginForm,
    services::account_service::{self, LoginOutcome},
    state::AppState,
    templates::{self, ForgotPage, LoginPage},
    web::mw_auth::SESSION_EMP_ID,
};
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

pub const MSG_EMPLOYEE_NOT_FOUND: &str = "Número de funcionário não encontrado.";
pub const MSG_WRONG_PASSWORD: &str = "Senha incorreta.";

// GET / e GET /login
pub async fn show_login_form(session: Session) -> AppResult<Response> {
    // Já autenticado: vai direto ao perfil
    if session.get::<String>(SESSION_EMP_ID).await.ok().flatten().is_some() {
        tracing::debug!("GET /login: sessão ativa, redirecionando para /profile");
        return Ok(Redirect::to("/profile").into_response());
    }

    let page = LoginPage {
        error: None,
        emp_id: String::new(),
    };
    Ok(templates::render(&page)?.into_response())
}

// POST / e POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    tracing::info!("Tentativa de login para ID: {}", form.emp_id);

    match account_service::authenticate(&state, &form.emp_id, &form.password).await? {
        LoginOutcome::UnknownEmployee => login_error(MSG_EMPLOYEE_NOT_FOUND, &form.emp_id),
        LoginOutcome::WrongPassword => login_error(MSG_WRONG_PASSWORD, &form.emp_id),
        LoginOutcome::Authenticated { emp_id, must_change } => {
            // Novo ID de sessão a cada login
            session
                .cycle_id()
                .await
                .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
            session
                .insert(SESSION_EMP_ID, &emp_id)
                .await
                .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;

            if must_change {
                tracing::info!("✅ Login de {} com senha provisória, mudança obrigatória.", emp_id);
                Ok(Redirect::to("/change_password").into_response())
            } else {
                tracing::info!("✅ Login bem-sucedido para: {}", emp_id);
                Ok(Redirect::to("/profile").into_response())
            }
        }
    }
}

fn login_error(message: &str, emp_id: &str) -> AppResult<Response> {
    let page = LoginPage {
        error: Some(message.to_string()),
        emp_id: emp_id.trim().to_string(),
    };
    Ok(templates::render(&page)?.into_response())
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    let emp_id: Option<String> = session.get(SESSION_EMP_ID).await.ok().flatten();

    // Remove os dados e apaga a sessão da store
    session
        .flush()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;

    match emp_id {
        Some(id) => tracing::info!("🚪 Funcionário '{}' saiu.", id),
        None => tracing::info!("🚪 Sessão anónima terminada."),
    }

    Ok(Redirect::to("/login"))
}

// GET /forgot
pub async fn show_forgot_page() -> AppResult<impl IntoResponse> {
    templates::render(&ForgotPage)
}
