// src/web/profile_handlers.rs
use crate::{
    error::{AppError, AppResult},
    services::{account_service, employee_service::EmployeeStore},
    state::AppState,
    templates::{self, ProfilePage},
    web::mw_auth::EmpId,
};
use axum::{
    extract::{Extension, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

#[derive(Deserialize, Debug)]
pub struct ProfileParams {
    notice: Option<String>,
}

// GET /profile (protegido por require_auth)
pub async fn profile_handler(
    State(state): State<AppState>,
    Extension(EmpId(emp_id)): Extension<EmpId>,
    session: Session,
    Query(params): Query<ProfileParams>,
) -> AppResult<Response> {
    tracing::debug!("GET /profile: acesso de {}", emp_id);

    let Some(employee) = state.employees.find_employee(&emp_id).await? else {
        // A planilha foi trocada e o funcionário desapareceu: termina a sessão
        tracing::warn!("Funcionário autenticado '{}' já não existe na planilha.", emp_id);
        session
            .flush()
            .await
            .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;
        return Ok(Redirect::to("/login").into_response());
    };

    // Senha provisória: só depois de a trocar é que o perfil fica disponível
    if account_service::must_change_password(&state, &emp_id).await? {
        tracing::debug!("{} ainda tem de mudar a senha, redirecionando.", emp_id);
        return Ok(Redirect::to("/change_password").into_response());
    }

    let page = ProfilePage {
        fields: employee.known_fields(),
        emp_id: employee.id,
        name: employee.name,
        other: employee.other,
        notice: params.notice,
    };
    Ok(templates::render(&page)?.into_response())
}

// GET /refresh: descarta a cache e relê a planilha no próximo pedido
pub async fn refresh_handler(
    State(employees): State<Arc<EmployeeStore>>,
    Extension(EmpId(emp_id)): Extension<EmpId>,
) -> Redirect {
    tracing::info!("Atualização da planilha pedida por {}", emp_id);
    employees.invalidate().await;
    let notice = urlencoding::encode("Dados atualizados.");
    Redirect::to(&format!("/profile?notice={}", notice))
}
