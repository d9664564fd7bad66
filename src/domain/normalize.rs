//! Cleaning of raw sales sheets into [`TransactionRecord`]s.
//!
//! - Revenue text such as `R$ 1.234,56` is converted to a decimal; anything that
//!   does not parse aborts the whole load.
//! - Sale counts are coerced leniently (bad values become 0).
//! - Seller labels go through a fixed alias table and collapse to [`Seller`].

use std::{borrow::Cow, collections::HashMap, str::FromStr, sync::OnceLock};

use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Seller, TransactionRecord, UNKNOWN_LABEL};

const CURRENCY_SYMBOL: &str = "R$";
const THOUSANDS_SEPARATOR: char = '.';
const DECIMAL_SEPARATOR: char = ',';
/// Larger per-row sale counts are treated as invalid.
const MAX_SALE_COUNT: f64 = u32::MAX as f64;

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("line {line}: revenue value '{value}' is not a valid non-negative amount")]
    InvalidRevenue { line: usize, value: String },
}

/// A single spreadsheet cell before cleaning.
#[derive(Clone, Debug, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
}

impl RawCell {
    /// Trimmed text content, `None` for empty or blank cells.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            RawCell::Empty => None,
            RawCell::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then_some(Cow::Borrowed(trimmed))
            }
            RawCell::Number(value) => Some(Cow::Owned(value.to_string())),
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(value.to_string())
        }
    }
}

/// Header row plus data rows, as read from a CSV or workbook sheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header.trim() == name)
    }
}

/// Header names of the required columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    pub revenue: String,
    pub sale_count: String,
    pub seller: String,
    pub channel: String,
    pub campaign: String,
    pub content: String,
    pub source: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            revenue: "Receita".to_string(),
            sale_count: "Vendas".to_string(),
            seller: "Origem".to_string(),
            channel: "Mídia".to_string(),
            campaign: "Campanha".to_string(),
            content: "Conteúdo".to_string(),
            source: "Fonte".to_string(),
        }
    }
}

struct ColumnIndexes {
    revenue: usize,
    sale_count: usize,
    seller: usize,
    channel: usize,
    campaign: usize,
    content: usize,
    source: usize,
}

impl ColumnIndexes {
    fn resolve(table: &RawTable, names: &ColumnNames) -> Result<Self, NormalizeError> {
        let find = |name: &String| {
            table
                .column_index(name)
                .ok_or_else(|| NormalizeError::MissingColumn(name.clone()))
        };
        Ok(Self {
            revenue: find(&names.revenue)?,
            sale_count: find(&names.sale_count)?,
            seller: find(&names.seller)?,
            channel: find(&names.channel)?,
            campaign: find(&names.campaign)?,
            content: find(&names.content)?,
            source: find(&names.source)?,
        })
    }
}

/// Clean every row of `table`. Fails on the first missing column or bad revenue.
pub fn normalize_table(
    table: &RawTable,
    columns: &ColumnNames,
) -> Result<Vec<TransactionRecord>, NormalizeError> {
    let idx = ColumnIndexes::resolve(table, columns)?;
    let empty = RawCell::Empty;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let cell = |i: usize| row.get(i).unwrap_or(&empty);
            // header occupies line 1
            let line = row_idx + 2;

            let revenue_cell = cell(idx.revenue);
            let revenue =
                parse_revenue_cell(revenue_cell).ok_or_else(|| NormalizeError::InvalidRevenue {
                    line,
                    value: revenue_cell
                        .as_text()
                        .map(|text| text.into_owned())
                        .unwrap_or_default(),
                })?;

            let seller_raw = clean_label(cell(idx.seller));
            Ok(TransactionRecord {
                seller: canonical_seller(&seller_raw),
                seller_raw,
                revenue,
                sale_count: coerce_sale_count(cell(idx.sale_count)),
                channel: clean_label(cell(idx.channel)),
                campaign: clean_label(cell(idx.campaign)),
                content: clean_label(cell(idx.content)),
                source: clean_label(cell(idx.source)),
            })
        })
        .collect()
}

/// Parse localized currency text (`R$ 12.345,67`) into a non-negative decimal.
pub fn parse_revenue(raw: &str) -> Option<Decimal> {
    let cleaned = raw
        .replace(CURRENCY_SYMBOL, "")
        .replace(THOUSANDS_SEPARATOR, "")
        .replace(DECIMAL_SEPARATOR, ".");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned)
        .ok()
        .filter(|value| *value >= Decimal::ZERO)
}

fn parse_revenue_cell(cell: &RawCell) -> Option<Decimal> {
    match cell {
        RawCell::Empty => None,
        RawCell::Text(text) => parse_revenue(text),
        RawCell::Number(value) => Decimal::from_f64(*value).filter(|v| *v >= Decimal::ZERO),
    }
}

/// Lenient sale count: fractional values truncate, anything invalid or
/// implausibly large is 0.
pub fn coerce_sale_count(cell: &RawCell) -> u64 {
    let value = match cell {
        RawCell::Empty => return 0,
        RawCell::Number(value) => *value,
        RawCell::Text(text) => match text.trim().parse::<f64>() {
            Ok(value) => value,
            Err(_) => return 0,
        },
    };

    if value.is_finite() && (0.0..=MAX_SALE_COUNT).contains(&value) {
        value.trunc() as u64
    } else {
        0
    }
}

/// Trimmed label, or the unknown sentinel for missing values.
pub fn clean_label(cell: &RawCell) -> String {
    cell.as_text()
        .map(|text| text.into_owned())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

fn alias_table() -> &'static HashMap<&'static str, Seller> {
    static ALIASES: OnceLock<HashMap<&'static str, Seller>> = OnceLock::new();
    ALIASES.get_or_init(|| {
        HashMap::from([
            ("joão", Seller::Joao),
            ("joao", Seller::Joao),
            ("joao-vendeu", Seller::Joao),
            ("joao_vendeu?utm_source=joão", Seller::Joao),
            ("auto", Seller::Joao),
            ("claudia", Seller::Claudia),
            ("claudia-vendeu", Seller::Claudia),
            ("claudia-v", Seller::Claudia),
            ("henrique", Seller::Henrique),
        ])
    })
}

/// Resolve a raw seller label. Unknown labels collapse to [`Seller::Other`].
pub fn canonical_seller(raw: &str) -> Seller {
    let key = raw.trim().to_lowercase();
    alias_table().get(key.as_str()).copied().unwrap_or(Seller::Other)
}
