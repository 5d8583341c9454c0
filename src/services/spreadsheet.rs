// src/services/spreadsheet.rs
use crate::{
    error::{AppError, AppResult},
    models::sheet::{Cell, SheetTable},
};
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tempfile::NamedTempFile;

const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Lê a primeira folha do livro. A primeira linha é o cabeçalho.
pub fn read_table(path: &Path) -> AppResult<SheetTable> {
    tracing::debug!("Lendo planilha {}", path.display());
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    // Só a primeira folha interessa
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(AppError::EmptySpreadsheet)?;

    // O range começa na primeira célula usada, não necessariamente em A1
    let range = workbook.worksheet_range(&sheet_name)?;
    let origin = range.start().unwrap_or((0, 0));
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|h| cell_from_data(h).display())
            .collect(),
        None => return Err(AppError::EmptySpreadsheet),
    };

    let rows: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    tracing::debug!(
        "Planilha '{}' lida: {} colunas, {} linhas",
        sheet_name,
        headers.len(),
        rows.len()
    );

    Ok(SheetTable {
        sheet_name,
        origin,
        headers,
        rows,
    })
}

/// Grava a tabela inteira, substituindo o ficheiro de forma atómica.
pub fn write_table(path: &Path, table: &SheetTable) -> AppResult<()> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let worksheet = workbook.add_worksheet();
    let sheet_name = if table.sheet_name.trim().is_empty() {
        DEFAULT_SHEET_NAME
    } else {
        table.sheet_name.as_str()
    };
    worksheet.set_name(sheet_name)?;

    let (top, left) = table.origin;
    let left = u16::try_from(left).map_err(|_| {
        AppError::SpreadsheetWrite(rust_xlsxwriter::XlsxError::RowColumnLimitError)
    })?;

    for (c, header) in table.headers.iter().enumerate() {
        if !header.is_empty() {
            worksheet.write_string(top, left + c as u16, header)?;
        }
    }

    for (r, row) in table.rows.iter().enumerate() {
        let excel_row = top + (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let excel_col = left + c as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string(excel_row, excel_col, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(excel_row, excel_col, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(excel_row, excel_col, *b)?;
                }
                Cell::DateTime(dt) => {
                    worksheet.write_datetime_with_format(excel_row, excel_col, dt, &date_format)?;
                }
            }
        }
    }

    let tmp = temp_file_beside(path)?;
    workbook.save(tmp.path())?;
    tmp.persist(path).map_err(|e| e.error)?;

    tracing::debug!("Planilha gravada em {}", path.display());
    Ok(())
}

/// Ficheiro temporário na mesma pasta do destino, para o `rename` ser atómico.
pub fn temp_file_beside(path: &Path) -> AppResult<NamedTempFile> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(tempfile::Builder::new()
        .prefix(".portal-")
        .suffix(".tmp")
        .tempfile_in(dir)?)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) => s
            .parse::<NaiveDateTime>()
            .map(Cell::DateTime)
            .unwrap_or_else(|_| Cell::Text(s.clone())),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn written_table_reads_back_with_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("employees.xlsx");
        let due = NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let table = SheetTable {
            sheet_name: "الموظفين".into(),
            origin: (0, 0),
            headers: vec!["الرقم الوظيفي".into(), "الاسم".into(), "تاريخ الاستحقاق".into()],
            rows: vec![
                vec![Cell::Number(1001.0), Cell::Text("أحمد".into()), Cell::DateTime(due)],
                vec![Cell::Number(1002.0), Cell::Empty, Cell::Text("غير محدد".into())],
            ],
        };
        write_table(&path, &table).unwrap();

        let read = read_table(&path).unwrap();
        assert_eq!(read.sheet_name, "الموظفين");
        assert_eq!(read.headers, table.headers);
        assert_eq!(read.rows.len(), 2);
        assert_eq!(read.cell(0, 0), &Cell::Number(1001.0));
        assert_eq!(read.cell(0, 1), &Cell::Text("أحمد".into()));
        assert_eq!(read.cell(0, 2).display_as_date(), "2026-01-15");
        assert!(read.cell(1, 1).is_empty());
        assert_eq!(read.cell(1, 2).display_as_date(), "غير محدد");

        // Nenhum ficheiro temporário fica para trás
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn table_offset_from_a1_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("employees.xlsx");
        let table = SheetTable {
            sheet_name: "Sheet1".into(),
            origin: (2, 1),
            headers: vec!["ID".into(), "Nome".into()],
            rows: vec![vec![Cell::Number(7.0), Cell::Text("Rui".into())]],
        };
        write_table(&path, &table).unwrap();

        let read = read_table(&path).unwrap();
        assert_eq!(read.origin, (2, 1));
        assert_eq!(read.headers, table.headers);

        // Regravar não desloca os dados para A1
        write_table(&path, &read).unwrap();
        let again = read_table(&path).unwrap();
        assert_eq!(again, read);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_table(&dir.path().join("nao-existe.xlsx")).unwrap_err();
        assert!(matches!(err, AppError::SpreadsheetRead(_)));
    }
}
