use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Label used for free-text columns that arrive empty.
pub const UNKNOWN_LABEL: &str = "Desconhecido";

/// Canonical seller identity after alias resolution.
///
/// The three named sellers are the commission-eligible principals; everything
/// else collapses into `Other`. Serialized with the same spelling as
/// [`Seller::label`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Seller {
    #[serde(rename = "João", alias = "Joao")]
    Joao,
    Claudia,
    Henrique,
    #[serde(rename = "Outros", alias = "Other")]
    Other,
}

impl Seller {
    pub const PRINCIPALS: [Seller; 3] = [Seller::Joao, Seller::Claudia, Seller::Henrique];

    /// Display label as it appears in the sales sheets.
    pub fn label(&self) -> &'static str {
        match self {
            Seller::Joao => "João",
            Seller::Claudia => "Claudia",
            Seller::Henrique => "Henrique",
            Seller::Other => "Outros",
        }
    }

    pub fn is_principal(&self) -> bool {
        !matches!(self, Seller::Other)
    }
}

impl fmt::Display for Seller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One cleaned row of the uploaded sales sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub seller: Seller,
    /// Seller text as it appeared in the sheet, trimmed.
    pub seller_raw: String,
    pub revenue: Decimal,
    pub sale_count: u64,
    pub channel: String,
    pub campaign: String,
    pub content: String,
    pub source: String,
}

/// A principal seller's row after cost deduction and rate resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub record: TransactionRecord,
    /// Fraction of the seller's revenue this row carries of the shared cost.
    pub cost_share: Decimal,
    pub adjusted_revenue: Decimal,
    pub rate: Decimal,
    pub commission: Decimal,
}

impl CommissionRecord {
    pub fn seller(&self) -> Seller {
        self.record.seller
    }
}

/// Per-seller commission aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SellerCommission {
    pub seller: Seller,
    /// Sum of adjusted revenue across the seller's rows.
    pub revenue: Decimal,
    pub rate: Decimal,
    pub commission: Decimal,
}
