// src/models/sheet.rs
use chrono::{NaiveDate, NaiveDateTime};

/// Valor de uma célula, já desligado do tipo do `calamine`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

// Formatos aceites quando uma data chega como texto
const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const TEXT_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Representação textual para mostrar ao utilizador.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => format_datetime(dt),
        }
    }

    /// Formata a célula como data quando possível; caso contrário devolve o texto cru.
    pub fn display_as_date(&self) -> String {
        match self {
            Cell::DateTime(dt) => format_datetime(dt),
            Cell::Text(s) => parse_text_date(s.trim())
                .map(|dt| format_datetime(&dt))
                .unwrap_or_else(|| s.trim().to_string()),
            other => other.display(),
        }
    }

    /// Interpreta a célula como a flag "tem de mudar a senha".
    pub fn as_flag(&self) -> bool {
        match self {
            Cell::Number(n) => *n != 0.0,
            Cell::Bool(b) => *b,
            Cell::Text(s) => text_flag(s),
            Cell::Empty | Cell::DateTime(_) => false,
        }
    }

    pub fn flag(value: bool) -> Cell {
        Cell::Number(if value { 1.0 } else { 0.0 })
    }
}

pub fn text_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "1.0" | "true" | "yes" | "sim"
    )
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M").to_string()
    }
}

fn parse_text_date(raw: &str) -> Option<NaiveDateTime> {
    TEXT_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            TEXT_DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Primeira folha de um livro: cabeçalho + linhas de dados.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    /// Posição (linha, coluna) do cabeçalho na folha; a gravação repõe-na.
    pub origin: (u32, u32),
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetTable {
    /// Índice da coluna com este cabeçalho (ignora espaços nas pontas).
    pub fn column(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: Cell) {
        if let Some(r) = self.rows.get_mut(row) {
            if r.len() <= col {
                r.resize(col + 1, Cell::Empty);
            }
            r[col] = value;
        }
    }

    /// Garante que a coluna existe (acrescenta-a no fim). Devolve o índice e se foi criada.
    pub fn ensure_column(&mut self, name: &str) -> (usize, bool) {
        if let Some(idx) = self.column(name) {
            return (idx, false);
        }
        self.headers.push(name.trim().to_string());
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, Cell::Empty);
        }
        (width - 1, true)
    }
}
