// src/services/employee_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        employee::{employee_id_from_cell, normalize_employee_id, Employee, ProfileField},
        sheet::{Cell, SheetTable},
    },
    services::{column_detect, spreadsheet},
};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::{Mutex, RwLock};

// Cabeçalhos aceites para cada campo descritivo (comparação sem maiúsculas)
const NAME_HEADERS: &[&str] = &["الاسم", "اسم الموظف", "name", "employee name", "nome"];
const TITLE_HEADERS: &[&str] = &["المسمى الوظيفي", "الوظيفة", "title", "job title", "cargo"];
const GRADE_HEADERS: &[&str] = &["الدرجة", "المرتبة", "grade", "grau"];
const STAGE_HEADERS: &[&str] = &["المرحلة", "stage", "etapa"];
const DUE_DATE_HEADERS: &[&str] = &[
    "تاريخ الاستحقاق",
    "due date",
    "due_date",
    "data de vencimento",
];
const NOTES_HEADERS: &[&str] = &["ملاحظات", "الملاحظات", "notes", "observações", "observacoes"];

/// Como encontrar as colunas especiais na planilha.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    pub id_column: Option<String>,
    pub hash_column: String,
    pub flag_column: String,
}

impl ColumnLayout {
    fn auth_columns(&self) -> [&str; 2] {
        [self.hash_column.as_str(), self.flag_column.as_str()]
    }
}

/// Planilha carregada com a coluna de ID já resolvida.
#[derive(Debug, Clone)]
pub struct EmployeeDirectory {
    pub table: SheetTable,
    pub id_col: usize,
    layout: ColumnLayout,
}

impl EmployeeDirectory {
    pub fn from_table(table: SheetTable, layout: ColumnLayout) -> AppResult<Self> {
        let id_col = match &layout.id_column {
            Some(name) => table
                .column(name)
                .ok_or_else(|| AppError::MissingColumn(name.clone()))?,
            None => column_detect::detect_id_column(&table, &layout.auth_columns())
                .ok_or_else(|| AppError::MissingColumn("ID do funcionário".into()))?,
        };
        Ok(EmployeeDirectory {
            table,
            id_col,
            layout,
        })
    }

    /// Linha do funcionário; o primeiro registo com o ID ganha.
    pub fn find_row(&self, emp_id: &str) -> Option<usize> {
        let wanted = normalize_employee_id(emp_id);
        if wanted.is_empty() {
            return None;
        }
        (0..self.table.rows.len())
            .find(|&row| employee_id_from_cell(self.table.cell(row, self.id_col)) == wanted)
    }

    pub fn contains(&self, emp_id: &str) -> bool {
        self.find_row(emp_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.table.rows.len()
    }

    pub fn employee(&self, emp_id: &str) -> Option<Employee> {
        self.find_row(emp_id).map(|row| self.employee_at(row))
    }

    fn employee_at(&self, row: usize) -> Employee {
        let table = &self.table;
        let auth = self.layout.auth_columns();
        let mut employee = Employee {
            id: employee_id_from_cell(table.cell(row, self.id_col)),
            ..Default::default()
        };

        for (col, header) in table.headers.iter().enumerate() {
            if col == self.id_col || auth.iter().any(|a| a.trim() == header.trim()) {
                continue;
            }
            let cell = table.cell(row, col);
            if cell.is_empty() {
                continue;
            }

            let key = header.trim().to_lowercase();
            let matches = |aliases: &[&str]| aliases.contains(&key.as_str());
            if matches(NAME_HEADERS) {
                employee.name = Some(cell.display());
            } else if matches(TITLE_HEADERS) {
                employee.title = Some(cell.display());
            } else if matches(GRADE_HEADERS) {
                employee.grade = Some(cell.display());
            } else if matches(STAGE_HEADERS) {
                employee.stage = Some(cell.display());
            } else if matches(DUE_DATE_HEADERS) {
                employee.due_date = Some(cell.display_as_date());
            } else if matches(NOTES_HEADERS) {
                employee.notes = Some(cell.display());
            } else {
                let value = match cell {
                    Cell::DateTime(_) => cell.display_as_date(),
                    other => other.display(),
                };
                employee.other.push(ProfileField {
                    label: header.trim().to_string(),
                    value,
                });
            }
        }
        employee
    }
}

/// Acesso à planilha de funcionários, com cache opcional.
#[derive(Debug)]
pub struct EmployeeStore {
    path: PathBuf,
    layout: ColumnLayout,
    cache_enabled: bool,
    cache: RwLock<Option<Arc<EmployeeDirectory>>>,
    // Avança a cada escrita ou invalidação; leituras iniciadas antes não entram na cache
    generation: AtomicU64,
    // Serializa as escritas feitas por esta aplicação
    write_lock: Mutex<()>,
}

impl EmployeeStore {
    pub fn new(path: PathBuf, layout: ColumnLayout, cache_enabled: bool) -> Self {
        EmployeeStore {
            path,
            layout,
            cache_enabled,
            cache: RwLock::new(None),
            generation: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        }
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Devolve a planilha carregada (da cache, se ativa).
    pub async fn directory(&self) -> AppResult<Arc<EmployeeDirectory>> {
        if self.cache_enabled {
            if let Some(cached) = self.cache.read().await.as_ref() {
                return Ok(cached.clone());
            }
        }

        let generation = self.generation.load(Ordering::Acquire);
        let directory = Arc::new(self.load().await?);
        if self.cache_enabled && self.fill_cache(generation, directory.clone()).await {
            tracing::debug!("Cache da planilha preenchida ({} linhas)", directory.len());
        }
        Ok(directory)
    }

    // Só guarda o que foi lido se nenhuma escrita terminou entretanto
    async fn fill_cache(&self, generation: u64, directory: Arc<EmployeeDirectory>) -> bool {
        let mut cache = self.cache.write().await;
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!("Leitura da planilha ultrapassada por uma escrita; cache não preenchida.");
            return false;
        }
        *cache = Some(directory);
        true
    }

    pub async fn find_employee(&self, emp_id: &str) -> AppResult<Option<Employee>> {
        Ok(self.directory().await?.employee(emp_id))
    }

    pub async fn invalidate(&self) {
        self.invalidate_quietly().await;
        tracing::info!("🔄 Cache da planilha invalidada.");
    }

    /// Lê, altera e grava a planilha sob o lock de escrita.
    ///
    /// A leitura é sempre feita do disco (ignora a cache) e a cache é
    /// descartada no fim, mesmo quando a alteração falha.
    pub async fn update<F, R>(&self, change: F) -> AppResult<R>
    where
        F: FnOnce(&mut EmployeeDirectory) -> AppResult<(R, bool)> + Send + 'static,
        R: Send + 'static,
    {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        let layout = self.layout.clone();

        let result = tokio::task::spawn_blocking(move || -> AppResult<R> {
            let table = spreadsheet::read_table(&path)?;
            let mut directory = EmployeeDirectory::from_table(table, layout)?;
            let (value, dirty) = change(&mut directory)?;
            if dirty {
                spreadsheet::write_table(&path, &directory.table)?;
            }
            Ok(value)
        })
        .await
        .map_err(|e| {
            tracing::error!("Erro na task spawn_blocking (update planilha): {:?}", e);
            AppError::InternalServerError
        })?;

        self.invalidate_quietly().await;
        result
    }

    /// Acrescenta as colunas em falta (passo de arranque do modo "credenciais na planilha").
    pub async fn ensure_columns(&self, names: Vec<String>) -> AppResult<()> {
        let added = self
            .update(move |directory| {
                let mut added = Vec::new();
                for name in &names {
                    let (_, created) = directory.table.ensure_column(name);
                    if created {
                        added.push(name.clone());
                    }
                }
                let dirty = !added.is_empty();
                Ok((added, dirty))
            })
            .await?;

        if !added.is_empty() {
            tracing::info!("Colunas acrescentadas à planilha: {:?}", added);
        }
        Ok(())
    }

    async fn load(&self) -> AppResult<EmployeeDirectory> {
        let path = self.path.clone();
        let layout = self.layout.clone();
        tokio::task::spawn_blocking(move || {
            let table = spreadsheet::read_table(&path)?;
            EmployeeDirectory::from_table(table, layout)
        })
        .await
        .map_err(|e| {
            tracing::error!("Erro na task spawn_blocking (ler planilha): {:?}", e);
            AppError::InternalServerError
        })?
    }

    async fn invalidate_quietly(&self) {
        let mut cache = self.cache.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        *cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn layout() -> ColumnLayout {
        ColumnLayout {
            id_column: None,
            hash_column: "password_hash".into(),
            flag_column: "first_login".into(),
        }
    }

    fn sample_table() -> SheetTable {
        let due = NaiveDate::from_ymd_opt(2025, 6, 30)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        SheetTable {
            sheet_name: "Sheet1".into(),
            origin: (0, 0),
            headers: vec![
                "الرقم الوظيفي".into(),
                "الاسم".into(),
                "الدرجة".into(),
                "تاريخ الاستحقاق".into(),
                "القسم".into(),
                "password_hash".into(),
            ],
            rows: vec![
                vec![
                    Cell::Number(1001.0),
                    Cell::Text("أحمد".into()),
                    Cell::Number(7.0),
                    Cell::DateTime(due),
                    Cell::Text("المالية".into()),
                    Cell::Text("$2b$04$abc".into()),
                ],
                vec![
                    Cell::Text("1002.0".into()),
                    Cell::Text("سارة".into()),
                    Cell::Empty,
                    Cell::Text("قريبا".into()),
                    Cell::Empty,
                    Cell::Empty,
                ],
                // ID duplicado: o primeiro ganha
                vec![Cell::Number(1001.0), Cell::Text("نسخة".into())],
            ],
        }
    }

    #[test]
    fn lookup_normalizes_both_sides() {
        let dir = EmployeeDirectory::from_table(sample_table(), layout()).unwrap();
        assert_eq!(dir.id_col, 0);
        assert_eq!(dir.find_row("1001"), Some(0));
        assert_eq!(dir.find_row("1002"), Some(1));
        assert_eq!(dir.find_row(" 1002.0 "), Some(1));
        assert_eq!(dir.find_row("9999"), None);
        assert_eq!(dir.find_row(""), None);
    }

    #[test]
    fn employee_maps_known_and_other_columns() {
        let dir = EmployeeDirectory::from_table(sample_table(), layout()).unwrap();

        let ahmed = dir.employee("1001").unwrap();
        assert_eq!(ahmed.id, "1001");
        assert_eq!(ahmed.name.as_deref(), Some("أحمد"));
        assert_eq!(ahmed.grade.as_deref(), Some("7"));
        assert_eq!(ahmed.due_date.as_deref(), Some("2025-06-30"));
        // O hash nunca aparece no perfil
        assert_eq!(
            ahmed.other,
            vec![ProfileField {
                label: "القسم".into(),
                value: "المالية".into()
            }]
        );

        let sara = dir.employee("1002").unwrap();
        assert_eq!(sara.due_date.as_deref(), Some("قريبا"));
        assert!(sara.grade.is_none());
    }

    #[test]
    fn explicit_id_column_must_exist() {
        let mut l = layout();
        l.id_column = Some("matricula".into());
        let err = EmployeeDirectory::from_table(sample_table(), l).unwrap_err();
        assert!(matches!(err, AppError::MissingColumn(_)));
    }

    #[tokio::test]
    async fn update_writes_and_drops_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("employees.xlsx");
        spreadsheet::write_table(&path, &sample_table()).unwrap();

        let store = EmployeeStore::new(path.clone(), layout(), true);
        let before = store.directory().await.unwrap();
        assert!(before.table.column("first_login").is_none());

        store
            .ensure_columns(vec!["password_hash".into(), "first_login".into()])
            .await
            .unwrap();

        let after = store.directory().await.unwrap();
        assert!(after.table.column("first_login").is_some());
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn read_overtaken_by_write_is_not_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("employees.xlsx");
        spreadsheet::write_table(&path, &sample_table()).unwrap();
        let store = EmployeeStore::new(path.clone(), layout(), true);

        // Leitura começa antes da escrita e só termina depois dela
        let generation = store.generation.load(Ordering::Acquire);
        let stale = Arc::new(store.load().await.unwrap());
        store
            .ensure_columns(vec!["first_login".into()])
            .await
            .unwrap();

        assert!(!store.fill_cache(generation, stale).await);
        let fresh = store.directory().await.unwrap();
        assert!(fresh.table.column("first_login").is_some());
    }

    #[tokio::test]
    async fn concurrent_reads_never_resurrect_old_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("employees.xlsx");
        spreadsheet::write_table(&path, &sample_table()).unwrap();
        let store = Arc::new(EmployeeStore::new(path.clone(), layout(), true));

        for round in 0..20 {
            let label = format!("v{round}");
            store.invalidate().await;

            let writer = {
                let store = store.clone();
                let label = label.clone();
                tokio::spawn(async move {
                    store
                        .update(move |directory| {
                            let (col, _) = directory.table.ensure_column("versao");
                            directory.table.set_cell(0, col, Cell::Text(label));
                            Ok(((), true))
                        })
                        .await
                })
            };
            let reader = {
                let store = store.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_micros(round * 150)).await;
                    store.directory().await.map(|_| ())
                })
            };
            writer.await.unwrap().unwrap();
            reader.await.unwrap().unwrap();

            let directory = store.directory().await.unwrap();
            let col = directory.table.column("versao").unwrap();
            assert_eq!(directory.table.cell(0, col).display(), label);
        }
    }
}
