// src/models/employee.rs
use crate::models::sheet::Cell;
use serde::Deserialize;

/// Normaliza um ID de funcionário para a forma canónica usada nas buscas.
///
/// A planilha guarda muitas vezes o ID como número, e ao ser lido volta como
/// `1001.0`; o formulário pode trazer espaços ou dígitos árabes-índicos.
/// Tudo isso colapsa para `1001`.
pub fn normalize_employee_id(raw: &str) -> String {
    let ascii: String = raw.trim().chars().map(ascii_digit).collect();

    if let Some((int_part, frac_part)) = ascii.split_once('.') {
        let int_ok = !int_part.is_empty() && int_part.chars().all(|c| c.is_ascii_digit());
        let frac_zero = !frac_part.is_empty() && frac_part.chars().all(|c| c == '0');
        if int_ok && frac_zero {
            return int_part.to_string();
        }
    }
    ascii
}

/// ID normalizado de uma célula, vazio quando a célula não tem valor.
pub fn employee_id_from_cell(cell: &Cell) -> String {
    match cell {
        Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        other => normalize_employee_id(&other.display()),
    }
}

pub fn is_digit_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

// Dígitos árabes-índicos (U+0660..) e persas (U+06F0..) para ASCII
fn ascii_digit(c: char) -> char {
    match c {
        '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
        '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
        _ => c,
    }
}

/// Campo mostrado na página de perfil.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileField {
    pub label: String,
    pub value: String,
}

/// Dados descritivos de um funcionário (só leitura para a aplicação).
#[derive(Debug, Clone, Default)]
pub struct Employee {
    pub id: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub grade: Option<String>,
    pub stage: Option<String>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
    /// Restantes colunas da planilha, pela ordem do cabeçalho.
    pub other: Vec<ProfileField>,
}

impl Employee {
    /// Campos conhecidos preenchidos, já com o rótulo a mostrar.
    pub fn known_fields(&self) -> Vec<ProfileField> {
        [
            ("Cargo", &self.title),
            ("Grau", &self.grade),
            ("Etapa", &self.stage),
            ("Data de vencimento", &self.due_date),
            ("Observações", &self.notes),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value.as_ref().map(|v| ProfileField {
                label: label.to_string(),
                value: v.clone(),
            })
        })
        .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub emp_id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}
