//! Reading uploaded sales sheets (CSV or Excel) into cleaned records.

use std::{fs::File, io, io::Read, path::Path};

use calamine::{open_workbook_auto, Data, Reader};
use thiserror::Error;

use crate::domain::{normalize_table, ColumnNames, NormalizeError, RawCell, RawTable, TransactionRecord};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet error: {0}")]
    Excel(#[from] calamine::Error),
    #[error("unsupported file type '{0}' (expected .csv, .xls, .xlsx, .xlsm, .xlsb or .ods)")]
    UnsupportedFileType(String),
    #[error("workbook '{0}' has no worksheets")]
    EmptyWorkbook(String),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Excel,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(SheetFormat::Csv),
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Ok(SheetFormat::Excel),
            _ => Err(LoadError::UnsupportedFileType(path.display().to_string())),
        }
    }
}

/// Read and clean a sales sheet. Any error aborts the whole load.
pub fn load_records(path: &Path, columns: &ColumnNames) -> Result<Vec<TransactionRecord>, LoadError> {
    let table = read_table(path)?;
    match normalize_table(&table, columns) {
        Ok(records) => {
            tracing::info!(path = %path.display(), records = records.len(), "sales sheet cleaned");
            Ok(records)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "rejecting sales sheet");
            Err(err.into())
        }
    }
}

pub fn read_table(path: &Path) -> Result<RawTable, LoadError> {
    let format = SheetFormat::from_path(path)?;
    let table = match format {
        SheetFormat::Csv => read_csv(File::open(path)?)?,
        SheetFormat::Excel => read_workbook(path)?,
    };
    tracing::info!(
        path = %path.display(),
        ?format,
        columns = table.headers.len(),
        rows = table.rows.len(),
        "sales sheet read"
    );
    Ok(table)
}

pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        rows.push(record.iter().map(RawCell::from).collect());
    }

    Ok(RawTable { headers, rows })
}

/// First worksheet of the workbook; the first row is the header.
fn read_workbook(path: &Path) -> Result<RawTable, LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::EmptyWorkbook(path.display().to_string()))??;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|header| {
            header
                .iter()
                .map(|cell| {
                    raw_cell(cell)
                        .as_text()
                        .map(|text| text.into_owned())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default();

    let rows = rows
        .map(|row| row.iter().map(raw_cell).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(text) => RawCell::from(text.as_str()),
        Data::Float(value) => RawCell::Number(*value),
        Data::Int(value) => RawCell::Number(*value as f64),
        Data::Bool(value) => RawCell::Text(value.to_string()),
        Data::DateTime(value) => RawCell::Number(value.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => RawCell::from(text.as_str()),
        #[allow(unreachable_patterns)]
        _ => RawCell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Seller;
    use rust_decimal_macros::dec;
    use std::io::Write;

    const SHEET: &str = "\
\u{feff}Receita,Vendas,Origem,Mídia,Campanha,Conteúdo,Fonte
\"R$ 9.000,00\",2,joao-vendeu,whatsapp,natal,video,ig
\"R$ 1.500,50\",1,Claudia-v,email,natal,,fb
\"R$ 80,00\",abc,Marcos,whatsapp,pascoa,post,ig
";

    #[test]
    fn format_is_picked_by_extension() {
        assert_eq!(SheetFormat::from_path(Path::new("a.CSV")).unwrap(), SheetFormat::Csv);
        assert_eq!(SheetFormat::from_path(Path::new("a.xlsx")).unwrap(), SheetFormat::Excel);
        assert_eq!(SheetFormat::from_path(Path::new("a.xls")).unwrap(), SheetFormat::Excel);
        assert!(matches!(
            SheetFormat::from_path(Path::new("a.json")),
            Err(LoadError::UnsupportedFileType(_))
        ));
        assert!(SheetFormat::from_path(Path::new("noext")).is_err());

        let err = SheetFormat::from_path(Path::new("a.json")).unwrap_err();
        for ext in [".csv", ".xls", ".xlsx", ".xlsm", ".xlsb", ".ods"] {
            assert!(err.to_string().contains(ext));
            let path = format!("sheet{ext}");
            assert!(SheetFormat::from_path(Path::new(&path)).is_ok());
        }
    }

    #[test]
    fn csv_headers_and_rows() {
        let table = read_csv(SHEET.as_bytes()).unwrap();
        assert_eq!(table.headers[0], "Receita");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1][5], RawCell::Empty);
    }

    #[test]
    fn loads_and_cleans_csv_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(SHEET.as_bytes()).unwrap();

        let records = load_records(file.path(), &ColumnNames::default()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].seller, Seller::Joao);
        assert_eq!(records[1].seller, Seller::Claudia);
        assert_eq!(records[1].revenue, dec!(1500.50));
        assert_eq!(records[2].seller, Seller::Other);
        assert_eq!(records[2].sale_count, 0);
    }

    #[test]
    fn missing_column_fails_the_load() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"Receita,Vendas,Origem\n10,1,Claudia\n").unwrap();

        let err = load_records(file.path(), &ColumnNames::default()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Normalize(NormalizeError::MissingColumn(ref column)) if column == "Mídia"
        ));
    }

    #[test]
    fn unsupported_file_is_rejected_before_reading() {
        let err = load_records(Path::new("does-not-exist.txt"), &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFileType(_)));
    }

    #[test]
    fn spreadsheet_cells_keep_numbers() {
        assert_eq!(raw_cell(&Data::Float(1234.5)), RawCell::Number(1234.5));
        assert_eq!(raw_cell(&Data::Int(7)), RawCell::Number(7.0));
        assert_eq!(raw_cell(&Data::String(String::new())), RawCell::Empty);
        assert_eq!(raw_cell(&Data::Empty), RawCell::Empty);
    }
}
