// src/web/mw_admin.rs
use crate::{config::Config, error::AppError};
use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AdminTokenQuery {
    #[serde(default)]
    token: Option<String>,
}

/// Protege as rotas de administração com o `ADMIN_TOKEN`.
/// Sem token configurado as rotas simplesmente não existem (404).
pub async fn require_admin_token(
    State(config): State<Arc<Config>>,
    Query(query): Query<AdminTokenQuery>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = config.admin_token.as_deref() else {
        tracing::warn!("Admin MW: rota de administração chamada sem ADMIN_TOKEN configurado.");
        return Err(AppError::NotFound);
    };

    match query.token.as_deref() {
        Some(given) if tokens_match(given, expected) => {
            tracing::debug!("Admin MW: token aceite.");
            Ok(next.run(request).await)
        }
        _ => {
            tracing::warn!("Admin MW: token ausente ou inválido para {}", request.uri().path());
            Err(AppError::Unauthorized)
        }
    }
}

// Comparação sem saída antecipada no conteúdo
fn tokens_match(given: &str, expected: &str) -> bool {
    let (a, b) = (given.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
