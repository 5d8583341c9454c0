// src/state.rs
use crate::{
    config::Config,
    error::AppResult,
    services::{
        credential_service::CredentialStore,
        employee_service::{ColumnLayout, EmployeeStore},
    },
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub employees: Arc<EmployeeStore>,
    pub credentials: Arc<CredentialStore>,
}

impl AppState {
    /// Monta os armazenamentos a partir da configuração e prepara-os
    /// (colunas de autenticação, ficheiro de credenciais, leitura inicial).
    pub async fn build(config: Config) -> AppResult<Self> {
        let layout = ColumnLayout {
            id_column: config.id_column.clone(),
            hash_column: config.hash_column.clone(),
            flag_column: config.flag_column.clone(),
        };
        let employees = Arc::new(EmployeeStore::new(
            config.employees_file.clone(),
            layout,
            config.cache_enabled,
        ));

        let credentials = match &config.credentials_file {
            Some(path) => {
                tracing::info!("🔐 Credenciais guardadas em {}", path.display());
                CredentialStore::json(path.clone())
            }
            None => {
                tracing::info!("🔐 Credenciais guardadas na própria planilha.");
                CredentialStore::Sheet(employees.clone())
            }
        };
        credentials.prepare().await?;

        let directory = employees.directory().await?;
        tracing::info!(
            "📄 Planilha {} carregada: {} funcionários.",
            config.employees_file.display(),
            directory.len()
        );

        Ok(AppState {
            config: Arc::new(config),
            employees,
            credentials: Arc::new(credentials),
        })
    }
}

impl axum::extract::FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Arc<Config> {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<EmployeeStore> {
    fn from_ref(state: &AppState) -> Arc<EmployeeStore> {
        state.employees.clone()
    }
}
