// src/web/mw_auth.rs
use crate::error::AppError;
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Chave da sessão onde fica o ID do funcionário autenticado.
pub const SESSION_EMP_ID: &str = "emp_id";

// Middleware que verifica se o funcionário está autenticado
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match session.get::<String>(SESSION_EMP_ID).await {
        Ok(Some(emp_id)) => {
            tracing::debug!("Autenticação MW: funcionário '{}' autenticado.", emp_id);
            // Os handlers protegidos leem o ID das extensões
            request.extensions_mut().insert(EmpId(emp_id));
            Ok(next.run(request).await)
        }
        Ok(None) => {
            tracing::debug!("Autenticação MW: sem sessão, redirecionando para /login");
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => {
            tracing::error!("Autenticação MW: erro ao ler sessão: {:?}", e);
            Err(AppError::SessionError(format!("Erro ao verificar sessão: {}", e)))
        }
    }
}

#[derive(Clone, Debug)]
pub struct EmpId(pub String);
