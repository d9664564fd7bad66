//! CSV and JSON serialization of commission results.

use std::{fs::File, io, io::Write, path::Path};

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::domain::{
    CampaignEfficiency, CommissionRecord, CommissionResult, SalesOverview, SellerCommission,
    SharedCost,
};
use crate::util::version::version_label;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

#[derive(Serialize)]
struct CommissionRow<'a> {
    seller: &'static str,
    channel: &'a str,
    campaign: &'a str,
    content: &'a str,
    source: &'a str,
    sales: u64,
    revenue: Decimal,
    cost_share: Decimal,
    adjusted_revenue: Decimal,
    rate: Decimal,
    commission: Decimal,
}

impl<'a> From<&'a CommissionRecord> for CommissionRow<'a> {
    fn from(row: &'a CommissionRecord) -> Self {
        Self {
            seller: row.record.seller.label(),
            channel: &row.record.channel,
            campaign: &row.record.campaign,
            content: &row.record.content,
            source: &row.record.source,
            sales: row.record.sale_count,
            revenue: row.record.revenue,
            cost_share: row.cost_share,
            adjusted_revenue: row.adjusted_revenue,
            rate: row.rate,
            commission: row.commission,
        }
    }
}

#[derive(Serialize)]
struct TotalRow {
    seller: &'static str,
    revenue: Decimal,
    rate: Decimal,
    commission: Decimal,
}

/// Write one line per commission row. Decimals are written unrounded.
pub fn write_rows_csv<W: Write>(writer: W, rows: &[CommissionRecord]) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(CommissionRow::from(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_totals_csv<W: Write>(writer: W, totals: &[SellerCommission]) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for total in totals {
        csv_writer.serialize(TotalRow {
            seller: total.seller.label(),
            revenue: total.revenue,
            rate: total.rate,
            commission: total.commission,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_rows_csv(path: &Path, rows: &[CommissionRecord]) -> Result<(), ExportError> {
    write_rows_csv(File::create(path)?, rows)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "commission rows exported");
    Ok(())
}

pub fn export_totals_csv(path: &Path, totals: &[SellerCommission]) -> Result<(), ExportError> {
    write_totals_csv(File::create(path)?, totals)?;
    tracing::info!(path = %path.display(), sellers = totals.len(), "commission totals exported");
    Ok(())
}

/// Everything one computation produced, with provenance.
#[derive(Clone, Debug, Serialize)]
pub struct CommissionReport {
    pub generated_at: String,
    pub generator: String,
    pub shared_cost: SharedCost,
    pub overview: SalesOverview,
    pub totals: Vec<SellerCommission>,
    pub rows: Vec<CommissionRecord>,
    pub campaigns: Vec<CampaignEfficiency>,
}

impl CommissionReport {
    pub fn new(
        shared_cost: SharedCost,
        overview: SalesOverview,
        result: CommissionResult,
        campaigns: Vec<CampaignEfficiency>,
    ) -> Result<Self, ExportError> {
        Ok(Self {
            generated_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
            generator: version_label(),
            shared_cost,
            overview,
            totals: result.totals,
            rows: result.rows,
            campaigns,
        })
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
