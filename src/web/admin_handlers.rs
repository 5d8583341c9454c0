// src/web/admin_handlers.rs
use crate::{
    error::AppResult,
    services::account_service,
    state::AppState,
    templates::{self, MessagePage},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /admin_reset/{id}?token=...
/// Repõe a senha padrão do funcionário e obriga a nova mudança no próximo login.
pub async fn handle_admin_reset(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    tracing::info!("Admin: pedido de reposição de senha para '{}'", raw_id);

    if account_service::reset_to_default(&state, &raw_id).await? {
        tracing::info!("✅ Senha de '{}' reposta para a senha padrão.", raw_id);
        let page = MessagePage {
            title: "Senha reposta".into(),
            message: format!(
                "A senha do funcionário {} foi reposta. Terá de escolher uma nova no próximo acesso.",
                raw_id.trim()
            ),
        };
        Ok(templates::render(&page)?.into_response())
    } else {
        tracing::warn!("Admin: funcionário '{}' não encontrado para reposição.", raw_id);
        let page = MessagePage {
            title: "Funcionário não encontrado".into(),
            message: format!("Não existe nenhum funcionário com o número {}.", raw_id.trim()),
        };
        Ok((StatusCode::NOT_FOUND, templates::render(&page)?).into_response())
    }
}
