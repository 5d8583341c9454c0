// src/services/credential_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        credential::Credential,
        employee::normalize_employee_id,
        sheet::Cell,
    },
    services::{employee_service::EmployeeStore, spreadsheet},
};
use std::{collections::BTreeMap, io::Write, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

type CredentialMap = BTreeMap<String, Credential>;

/// Onde ficam o hash e a flag "tem de mudar a senha".
#[derive(Debug)]
pub enum CredentialStore {
    /// Duas colunas extra na própria planilha de funcionários.
    Sheet(Arc<EmployeeStore>),
    /// Ficheiro JSON ao lado da planilha, indexado pelo ID.
    Json(JsonCredentials),
}

impl CredentialStore {
    pub fn json(path: PathBuf) -> Self {
        CredentialStore::Json(JsonCredentials {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Prepara o armazenamento no arranque (colunas em falta / ficheiro vazio).
    pub async fn prepare(&self) -> AppResult<()> {
        match self {
            CredentialStore::Sheet(employees) => {
                let layout = employees.layout();
                employees
                    .ensure_columns(vec![layout.hash_column.clone(), layout.flag_column.clone()])
                    .await
            }
            CredentialStore::Json(json) => json.prepare().await,
        }
    }

    /// Credencial guardada; `None` se ainda não existe hash para este ID.
    pub async fn get(&self, emp_id: &str) -> AppResult<Option<Credential>> {
        let emp_id = normalize_employee_id(emp_id);
        match self {
            CredentialStore::Sheet(employees) => {
                let directory = employees.directory().await?;
                let layout = employees.layout();
                let Some(row) = directory.find_row(&emp_id) else {
                    return Ok(None);
                };
                let hash_col = directory
                    .table
                    .column(&layout.hash_column)
                    .ok_or_else(|| AppError::MissingColumn(layout.hash_column.clone()))?;
                let hash = directory.table.cell(row, hash_col).display();
                if hash.is_empty() {
                    return Ok(None);
                }
                let must_change = directory
                    .table
                    .column(&layout.flag_column)
                    .map(|col| directory.table.cell(row, col).as_flag())
                    .unwrap_or(false);
                Ok(Some(Credential::new(hash, must_change)))
            }
            CredentialStore::Json(json) => Ok(json.load().await?.remove(&emp_id)),
        }
    }

    /// Guarda a credencial. Devolve `false` se o funcionário não existe na planilha.
    pub async fn set(&self, emp_id: &str, credential: Credential) -> AppResult<bool> {
        let emp_id = normalize_employee_id(emp_id);
        match self {
            CredentialStore::Sheet(employees) => {
                let layout = employees.layout().clone();
                employees
                    .update(move |directory| {
                        let Some(row) = directory.find_row(&emp_id) else {
                            return Ok((false, false));
                        };
                        let (hash_col, _) = directory.table.ensure_column(&layout.hash_column);
                        let (flag_col, _) = directory.table.ensure_column(&layout.flag_column);
                        directory
                            .table
                            .set_cell(row, hash_col, Cell::Text(credential.password_hash));
                        directory
                            .table
                            .set_cell(row, flag_col, Cell::flag(credential.must_change));
                        Ok((true, true))
                    })
                    .await
            }
            CredentialStore::Json(json) => {
                json.upsert(emp_id, credential).await?;
                Ok(true)
            }
        }
    }
}

#[derive(Debug)]
pub struct JsonCredentials {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonCredentials {
    async fn prepare(&self) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(&self.path).await? {
            // Valida o conteúdo logo no arranque
            let count = self.load().await?.len();
            tracing::info!(
                "Ficheiro de credenciais {} com {} registos.",
                self.path.display(),
                count
            );
            return Ok(());
        }
        tracing::info!("Criando ficheiro de credenciais vazio em {}", self.path.display());
        self.write(CredentialMap::new()).await
    }

    async fn load(&self) -> AppResult<CredentialMap> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CredentialMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(CredentialMap::new());
        }
        let map: CredentialMap = serde_json::from_str(&raw)?;
        // Chaves antigas podem vir como "1001.0"
        Ok(map
            .into_iter()
            .map(|(id, cred)| (normalize_employee_id(&id), cred))
            .collect())
    }

    async fn upsert(&self, emp_id: String, credential: Credential) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load().await?;
        map.insert(emp_id, credential);
        self.write(map).await
    }

    async fn write(&self, map: CredentialMap) -> AppResult<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> AppResult<()> {
            let mut tmp = spreadsheet::temp_file_beside(&path)?;
            serde_json::to_writer_pretty(tmp.as_file_mut(), &map)?;
            tmp.as_file_mut().write_all(b"\n")?;
            tmp.as_file_mut().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| {
            tracing::error!("Erro na task spawn_blocking (gravar credenciais): {:?}", e);
            AppError::InternalServerError
        })?
    }
}
