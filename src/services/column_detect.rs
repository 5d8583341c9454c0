// src/services/column_detect.rs
//
// Heurística para adivinhar qual coluna da planilha guarda o ID do funcionário.
// Cada coluna recebe uma pontuação pelo cabeçalho e pelos valores; ganha a maior.
use crate::models::{
    employee::{employee_id_from_cell, is_digit_id},
    sheet::SheetTable,
};
use std::collections::HashSet;

/// Cabeçalhos conhecidos (já normalizados: minúsculas, sem espaços, `_` ou `-`).
const EXACT_HEADERS: &[&str] = &[
    "الرقمالوظيفي",
    "رقمالموظف",
    "الرقم",
    "employeeid",
    "empid",
    "staffid",
    "id",
    "matricula",
    "matrícula",
    "númerodefuncionário",
    "numerodefuncionario",
];

const HEADER_KEYWORDS: &[&str] = &[
    "id", "رقم", "الرقم", "employee", "emp", "code", "كود", "matric", "número", "numero",
];

const EXACT_HEADER_WEIGHT: f64 = 5.0;
const KEYWORD_WEIGHT: f64 = 2.0;
const DIGIT_WEIGHT: f64 = 3.0;
const UNIQUE_WEIGHT: f64 = 2.0;
const FILL_WEIGHT: f64 = 1.0;

/// Pontuação mínima para aceitar uma coluna como ID.
pub const MIN_SCORE: f64 = 3.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnScore {
    pub index: usize,
    pub header: String,
    pub score: f64,
}

/// Devolve o índice da coluna de ID, ignorando as colunas em `excluded`.
pub fn detect_id_column(table: &SheetTable, excluded: &[&str]) -> Option<usize> {
    let best = score_columns(table, excluded)
        .into_iter()
        // Em caso de empate fica a primeira coluna
        .fold(None::<ColumnScore>, |best, candidate| match best {
            Some(b) if b.score >= candidate.score => Some(b),
            _ => Some(candidate),
        })?;

    if best.score >= MIN_SCORE {
        tracing::debug!(
            "Coluna de ID detetada: '{}' (índice {}, pontuação {:.2})",
            best.header,
            best.index,
            best.score
        );
        Some(best.index)
    } else {
        tracing::warn!(
            "Nenhuma coluna de ID convincente (melhor: '{}' com {:.2})",
            best.header,
            best.score
        );
        None
    }
}

pub fn score_columns(table: &SheetTable, excluded: &[&str]) -> Vec<ColumnScore> {
    let excluded: Vec<String> = excluded.iter().map(|e| normalize_header(e)).collect();

    table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !excluded.contains(&normalize_header(h)))
        .map(|(index, header)| ColumnScore {
            index,
            header: header.clone(),
            score: header_score(header) + value_score(table, index),
        })
        .collect()
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect()
}

fn header_score(header: &str) -> f64 {
    let normalized = normalize_header(header);
    if normalized.is_empty() {
        return 0.0;
    }
    if EXACT_HEADERS.contains(&normalized.as_str()) {
        return EXACT_HEADER_WEIGHT;
    }
    if HEADER_KEYWORDS.iter().any(|k| normalized.contains(k)) {
        return KEYWORD_WEIGHT;
    }
    0.0
}

fn value_score(table: &SheetTable, col: usize) -> f64 {
    let total = table.rows.len();
    if total == 0 {
        return 0.0;
    }

    let values: Vec<String> = (0..total)
        .map(|row| employee_id_from_cell(table.cell(row, col)))
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return 0.0;
    }

    let filled = values.len() as f64;
    let digits = values.iter().filter(|v| is_digit_id(v)).count() as f64;
    let unique = values.iter().collect::<HashSet<_>>().len() as f64;

    DIGIT_WEIGHT * (digits / filled)
        + UNIQUE_WEIGHT * (unique / filled)
        + FILL_WEIGHT * (filled / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sheet::Cell;

    fn table(headers: &[&str], rows: Vec<Vec<Cell>>) -> SheetTable {
        SheetTable {
            sheet_name: "Sheet1".into(),
            origin: (0, 0),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    #[test]
    fn known_arabic_header_wins() {
        let t = table(
            &["الاسم", "الرقم الوظيفي", "الدرجة"],
            vec![
                vec![text("أحمد"), Cell::Number(1001.0), Cell::Number(5.0)],
                vec![text("سارة"), Cell::Number(1002.0), Cell::Number(5.0)],
            ],
        );
        assert_eq!(detect_id_column(&t, &[]), Some(1));
    }

    #[test]
    fn unlabeled_unique_digit_column_is_found() {
        let t = table(
            &["nome", "col", "grau"],
            vec![
                vec![text("Ana"), text("501.0"), Cell::Number(3.0)],
                vec![text("Rui"), text("502"), Cell::Number(3.0)],
                vec![text("Eva"), text("503"), Cell::Number(3.0)],
            ],
        );
        assert_eq!(detect_id_column(&t, &[]), Some(1));
    }

    #[test]
    fn auth_columns_are_never_chosen() {
        let t = table(
            &["password_hash", "first_login"],
            vec![vec![text("$2b$..."), Cell::Number(1.0)]],
        );
        assert_eq!(detect_id_column(&t, &["password_hash", "first_login"]), None);
    }

    #[test]
    fn text_only_sheet_has_no_id_column() {
        let t = table(
            &["nome", "cargo"],
            vec![
                vec![text("Ana"), text("Analista")],
                vec![text("Rui"), text("Técnico")],
            ],
        );
        assert_eq!(detect_id_column(&t, &[]), None);
    }

    #[test]
    fn header_alone_is_enough_on_empty_sheet() {
        let t = table(&["Employee ID", "Name"], vec![]);
        assert_eq!(detect_id_column(&t, &[]), Some(0));
    }
}
