use std::{collections::BTreeSet, io, path::PathBuf};

use clap::Parser;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::{
    domain::{
        campaign_efficiency, canonical_seller, compute_commissions, revenue_ranking,
        sales_overview, volume_by_seller, CommissionError, CommissionPlan, CommissionResult,
        RowFilter, SalesOverview, SharedCost, TransactionRecord,
    },
    infra::{export_rows_csv, export_totals_csv, load_records, CommissionReport, ExportError, LoadError},
    util::{
        persistence::{load_persisted_settings, save_persisted_settings, PersistSaveError, PersistedSettings},
        version::{version_label, APP_NAME},
    },
};

/// Compute seller commissions from a sales sheet.
#[derive(Debug, Parser)]
#[command(name = "sales-commission", version, about)]
pub struct Cli {
    /// Sales sheet (.csv, .xls, .xlsx, .xlsm, .xlsb or .ods)
    pub input: PathBuf,
    /// Operating cost deducted from the cost-bearing seller's revenue
    #[arg(long)]
    pub shared_cost: Option<Decimal>,
    /// Keep only these sellers (repeatable; aliases accepted)
    #[arg(long = "seller")]
    pub sellers: Vec<String>,
    /// Keep only these campaigns (repeatable)
    #[arg(long = "campaign")]
    pub campaigns: Vec<String>,
    /// Keep only these channels (repeatable)
    #[arg(long = "channel")]
    pub channels: Vec<String>,
    /// Write the per-row commission table as CSV
    #[arg(long)]
    pub export: Option<PathBuf>,
    /// Write the per-seller totals as CSV
    #[arg(long)]
    pub totals_export: Option<PathBuf>,
    /// Print the full report as JSON instead of tables
    #[arg(long)]
    pub json: bool,
    /// Remember shared cost and filters for the next run
    #[arg(long)]
    pub remember: bool,
    /// Ignore remembered settings
    #[arg(long, conflicts_with = "remember")]
    pub reset: bool,
}

impl Cli {
    /// Filter from the command line, `None` when no filter flag was given.
    fn filter(&self) -> Option<RowFilter> {
        let set = |values: &[String]| -> Option<BTreeSet<String>> {
            (!values.is_empty()).then(|| values.iter().map(|v| v.trim().to_string()).collect())
        };
        let filter = RowFilter {
            sellers: (!self.sellers.is_empty())
                .then(|| self.sellers.iter().map(|s| canonical_seller(s)).collect::<BTreeSet<_>>()),
            campaigns: set(&self.campaigns),
            channels: set(&self.channels),
        };
        (!filter.is_empty()).then_some(filter)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load sales sheet: {0}")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Commission(#[from] CommissionError),
    #[error("failed to write report: {0}")]
    Export(#[from] ExportError),
    #[error("failed to save settings: {0}")]
    Persist(#[from] PersistSaveError),
}

pub fn run(cli: Cli) -> Result<(), AppError> {
    tracing::info!(app = APP_NAME, version = %version_label(), input = %cli.input.display(), "starting");

    let saved = if cli.reset {
        PersistedSettings::default()
    } else {
        load_persisted_settings().unwrap_or_default()
    };

    let shared_cost = match cli.shared_cost {
        Some(amount) => SharedCost::new(amount)?,
        None => saved.shared_cost,
    };
    let filter = cli.filter().unwrap_or_else(|| saved.filter.clone());

    let records = load_records(&cli.input, &saved.columns)?;
    let selected = filter.apply(&records);
    tracing::info!(loaded = records.len(), selected = selected.len(), "rows selected");

    let result = compute_commissions(&selected, shared_cost, CommissionPlan::standard())?;
    let overview = sales_overview(&selected, &result)?;

    if let Some(path) = &cli.export {
        export_rows_csv(path, &result.rows)?;
    }
    if let Some(path) = &cli.totals_export {
        export_totals_csv(path, &result.totals)?;
    }

    if cli.json {
        let report =
            CommissionReport::new(shared_cost, overview, result, campaign_efficiency(&selected)?)?;
        report.write_json(io::stdout().lock())?;
        println!();
    } else {
        print_dashboard(&selected, &overview, &result)?;
    }

    if cli.remember {
        let settings = PersistedSettings {
            shared_cost,
            filter,
            columns: saved.columns,
        };
        let path = save_persisted_settings(&settings)?;
        tracing::info!(path = %path.display(), "settings saved");
    }

    Ok(())
}

fn print_dashboard(
    records: &[TransactionRecord],
    overview: &SalesOverview,
    result: &CommissionResult,
) -> Result<(), CommissionError> {
    println!("== {APP_NAME} ==");
    println!("Revenue:       {}", format_money(overview.total_revenue));
    println!("Sales:         {}", overview.total_sales);
    println!("Average ticket {}", format_money(overview.average_ticket));
    println!("Commission:    {}", format_money(overview.total_commission));

    println!();
    println!("-- Commission by seller --");
    println!("{:<10} {:>18} {:>8} {:>16}", "Seller", "Revenue", "Rate", "Commission");
    for total in &result.totals {
        println!(
            "{:<10} {:>18} {:>8} {:>16}",
            total.seller.label(),
            format_money(total.revenue),
            format_rate(total.rate),
            format_money(total.commission)
        );
    }

    println!();
    println!("-- Sales by seller --");
    for volume in volume_by_seller(records)? {
        println!("{:<10} {:>8}", volume.seller.label(), volume.sales);
    }

    println!();
    println!("-- Revenue by seller --");
    for volume in revenue_ranking(records)? {
        println!("{:<10} {:>18}", volume.seller.label(), format_money(volume.revenue));
    }

    println!();
    println!("-- Campaigns --");
    println!("{:<24} {:>18} {:>8} {:>16}", "Campaign", "Revenue", "Sales", "Avg ticket");
    for campaign in campaign_efficiency(records)? {
        println!(
            "{:<24} {:>18} {:>8} {:>16}",
            campaign.campaign,
            format_money(campaign.revenue),
            campaign.sales,
            campaign
                .average_ticket
                .map(format_money)
                .unwrap_or_else(|| "-".to_string())
        );
    }

    println!();
    println!("-- Commission details --");
    println!("{:<10} {:>18} {:>8} {:>16}", "Seller", "Revenue", "Rate", "Commission");
    for row in &result.rows {
        println!(
            "{:<10} {:>18} {:>8} {:>16}",
            row.seller().label(),
            format_money(row.adjusted_revenue),
            format_rate(row.rate),
            format_money(row.commission)
        );
    }
    Ok(())
}

/// `R$ 12,345.68`: two decimals, comma thousands.
pub fn format_money(value: Decimal) -> String {
    let text = format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    );
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}R$ {grouped}.{fraction}")
}

pub fn format_rate(rate: Decimal) -> String {
    format!("{:.2}%", rate * Decimal::ONE_HUNDRED)
}
