// src/services/account_service.rs
//
// Regras de negócio por trás dos handlers: login com provisão preguiçosa,
// mudança de senha e reposição pelo administrador.
use crate::{
    error::AppResult,
    models::{credential::Credential, employee::normalize_employee_id},
    services::{auth_service, password_policy::PasswordRejection},
    state::AppState,
};

/// Resultado de uma tentativa de login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    UnknownEmployee,
    WrongPassword,
    Authenticated { emp_id: String, must_change: bool },
}

pub async fn authenticate(state: &AppState, raw_id: &str, password: &str) -> AppResult<LoginOutcome> {
    let emp_id = normalize_employee_id(raw_id);

    // 1. O funcionário tem de existir na planilha
    let directory = state.employees.directory().await?;
    if emp_id.is_empty() || !directory.contains(&emp_id) {
        tracing::warn!("Funcionário não encontrado: '{}'", raw_id);
        return Ok(LoginOutcome::UnknownEmployee);
    }

    // 2. Sem hash ainda: provisiona a senha padrão e obriga a mudar
    let credential = match state.credentials.get(&emp_id).await? {
        Some(credential) => credential,
        None => provision_default(state, &emp_id).await?,
    };

    // 3. Verificação (bcrypt, ou pbkdf2 herdado do werkzeug)
    if !auth_service::verify_password(password, &credential.password_hash).await? {
        tracing::warn!("Senha incorreta para {}", emp_id);
        return Ok(LoginOutcome::WrongPassword);
    }

    if auth_service::needs_rehash(&credential.password_hash) {
        upgrade_hash(state, &emp_id, password, credential.must_change).await;
    }

    Ok(LoginOutcome::Authenticated {
        emp_id,
        must_change: credential.must_change,
    })
}

async fn provision_default(state: &AppState, emp_id: &str) -> AppResult<Credential> {
    tracing::info!("Primeiro acesso de {}: atribuindo senha padrão.", emp_id);
    let hash = auth_service::hash_password(&state.config.master_password, state.config.bcrypt_cost).await?;
    let credential = Credential::new(hash, true);
    state.credentials.set(emp_id, credential.clone()).await?;
    Ok(credential)
}

// Regrava em bcrypt um hash antigo; uma falha aqui não impede o login
async fn upgrade_hash(state: &AppState, emp_id: &str, password: &str, must_change: bool) {
    let result = match auth_service::hash_password(password, state.config.bcrypt_cost).await {
        Ok(hash) => state.credentials.set(emp_id, Credential::new(hash, must_change)).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => tracing::info!("Hash de {} migrado para bcrypt.", emp_id),
        Err(e) => tracing::warn!("Falha ao migrar o hash de {}: {}", emp_id, e),
    }
}

/// Indica se o funcionário ainda está com a senha provisória.
pub async fn must_change_password(state: &AppState, emp_id: &str) -> AppResult<bool> {
    Ok(state
        .credentials
        .get(emp_id)
        .await?
        .map(|c| c.must_change)
        .unwrap_or(true))
}

/// Resultado de uma mudança de senha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordChange {
    Changed,
    /// Nada foi gravado.
    Rejected(PasswordRejection),
    /// O funcionário já não está na planilha.
    UnknownEmployee,
}

/// Troca a senha de um funcionário autenticado.
pub async fn change_password(
    state: &AppState,
    emp_id: &str,
    current_password: &str,
    new_password: &str,
    confirmation: &str,
) -> AppResult<PasswordChange> {
    // No modo JSON evita gravar credenciais de IDs que já não existem
    if !state.employees.directory().await?.contains(emp_id) {
        tracing::warn!("Mudança de senha para {} que já não está na planilha.", emp_id);
        return Ok(PasswordChange::UnknownEmployee);
    }

    let policy = state.config.password_policy;
    if let Err(rejection) = policy.check(new_password, confirmation) {
        tracing::debug!("Mudança de senha recusada para {}: {}", emp_id, rejection);
        return Ok(PasswordChange::Rejected(rejection));
    }

    if policy.requires_current() {
        if current_password.is_empty() {
            return Ok(PasswordChange::Rejected(PasswordRejection::MissingCurrent));
        }
        let stored = state.credentials.get(emp_id).await?;
        let current_ok = match stored {
            Some(credential) => {
                auth_service::verify_password(current_password, &credential.password_hash).await?
            }
            None => false,
        };
        if !current_ok {
            tracing::warn!("Senha atual incorreta na mudança de senha de {}", emp_id);
            return Ok(PasswordChange::Rejected(PasswordRejection::WrongCurrent));
        }
    }

    let hash = auth_service::hash_password(new_password, state.config.bcrypt_cost).await?;
    let saved = state
        .credentials
        .set(emp_id, Credential::new(hash, false))
        .await?;
    if !saved {
        tracing::warn!("Funcionário {} removido da planilha durante a mudança de senha.", emp_id);
        return Ok(PasswordChange::UnknownEmployee);
    }
    tracing::info!("✅ Senha alterada para {}", emp_id);
    Ok(PasswordChange::Changed)
}

/// Repõe a senha padrão e volta a exigir a mudança. `false` se o ID não existe.
pub async fn reset_to_default(state: &AppState, raw_id: &str) -> AppResult<bool> {
    let emp_id = normalize_employee_id(raw_id);
    if !state.employees.directory().await?.contains(&emp_id) {
        return Ok(false);
    }
    let hash = auth_service::hash_password(&state.config.master_password, state.config.bcrypt_cost).await?;
    state
        .credentials
        .set(&emp_id, Credential::new(hash, true))
        .await
}
