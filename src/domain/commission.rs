use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{CommissionRecord, Seller, SellerCommission, TransactionRecord};
use super::rates::CommissionPlan;

#[derive(Debug, Error, PartialEq)]
pub enum CommissionError {
    #[error("shared cost must be non-negative, got {0}")]
    NegativeSharedCost(Decimal),
    #[error("only one seller may bear the shared cost, found {0:?}")]
    MultipleCostBearers(Vec<Seller>),
    #[error("invalid rate schedule: {0}")]
    InvalidSchedule(String),
    #[error("invalid commission plan: {0}")]
    InvalidPlan(String),
    #[error("{0} exceeds the representable amount")]
    Overflow(&'static str),
}

/// Operating cost deducted from the cost-bearing seller's revenue.
/// Always non-negative once constructed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct SharedCost(Decimal);

impl SharedCost {
    pub const ZERO: SharedCost = SharedCost(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Result<Self, CommissionError> {
        if amount < Decimal::ZERO {
            return Err(CommissionError::NegativeSharedCost(amount));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for SharedCost {
    type Error = CommissionError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SharedCost> for Decimal {
    fn from(value: SharedCost) -> Self {
        value.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommissionResult {
    /// Eligible rows in input order.
    pub rows: Vec<CommissionRecord>,
    /// One entry per seller present in `rows`, ordered by seller.
    pub totals: Vec<SellerCommission>,
}

impl CommissionResult {
    /// Sum over all sellers. Results from [`compute_commissions`] have this
    /// total checked against overflow.
    pub fn total_commission(&self) -> Decimal {
        self.totals.iter().map(|total| total.commission).sum()
    }

    pub fn total_for(&self, seller: Seller) -> Option<&SellerCommission> {
        self.totals.iter().find(|total| total.seller == seller)
    }
}

/// `acc + value`, failing with [`CommissionError::Overflow`] instead of panicking.
pub(crate) fn checked_sum(
    acc: Decimal,
    value: Decimal,
    what: &'static str,
) -> Result<Decimal, CommissionError> {
    acc.checked_add(value).ok_or(CommissionError::Overflow(what))
}

/// Compute per-row and per-seller commissions.
///
/// Rows of sellers without terms in `plan` are dropped. The cost bearer's rows
/// each absorb a share of `shared_cost` proportional to their revenue, floored
/// at zero. Each seller then gets a single rate from its aggregate adjusted
/// revenue, applied to every one of its rows.
///
/// Fails with [`CommissionError::Overflow`] when a sum leaves the decimal range.
pub fn compute_commissions(
    records: &[TransactionRecord],
    shared_cost: SharedCost,
    plan: &CommissionPlan,
) -> Result<CommissionResult, CommissionError> {
    let eligible: Vec<&TransactionRecord> = records
        .iter()
        .filter(|record| plan.is_eligible(record.seller))
        .collect();

    if eligible.is_empty() {
        return Ok(CommissionResult::default());
    }

    let bearer = plan.cost_bearer();
    let bearer_total = eligible
        .iter()
        .filter(|record| Some(record.seller) == bearer)
        .try_fold(Decimal::ZERO, |acc, record| {
            checked_sum(acc, record.revenue, "cost bearer revenue")
        })?;
    let deduct = bearer_total > Decimal::ZERO;
    match bearer {
        Some(seller) if !deduct => {
            tracing::debug!(%seller, "cost bearer has no revenue; skipping shared cost deduction")
        }
        Some(seller) => {
            tracing::debug!(%seller, %bearer_total, cost = %shared_cost.amount(), "deducting shared cost")
        }
        None => {}
    }

    let mut rows: Vec<CommissionRecord> = eligible
        .into_iter()
        .map(|record| {
            let cost_share = if deduct && Some(record.seller) == bearer {
                record.revenue / bearer_total
            } else {
                Decimal::ZERO
            };
            // cost_share <= 1, so neither step can leave the range
            let deducted = record.revenue - cost_share * shared_cost.amount();
            if deducted < Decimal::ZERO {
                tracing::debug!(seller = %record.seller, %deducted, "adjusted revenue clamped to zero");
            }

            CommissionRecord {
                record: record.clone(),
                cost_share,
                adjusted_revenue: deducted.max(Decimal::ZERO),
                rate: Decimal::ZERO,
                commission: Decimal::ZERO,
            }
        })
        .collect();

    let mut aggregates: BTreeMap<Seller, Decimal> = BTreeMap::new();
    for row in &rows {
        let aggregate = aggregates.entry(row.seller()).or_default();
        *aggregate = checked_sum(*aggregate, row.adjusted_revenue, "seller revenue")?;
    }

    let rates: BTreeMap<Seller, Decimal> = aggregates
        .iter()
        .map(|(seller, aggregate)| (*seller, plan.rate_for(*seller, *aggregate)))
        .collect();

    let mut commissions: BTreeMap<Seller, Decimal> = BTreeMap::new();
    for row in &mut rows {
        row.rate = rates.get(&row.seller()).copied().unwrap_or_default();
        row.commission = row
            .adjusted_revenue
            .checked_mul(row.rate)
            .ok_or(CommissionError::Overflow("commission"))?;
        let commission = commissions.entry(row.seller()).or_default();
        *commission = checked_sum(*commission, row.commission, "seller commission")?;
    }
    commissions
        .values()
        .try_fold(Decimal::ZERO, |acc, value| checked_sum(acc, *value, "total commission"))?;

    let totals = aggregates
        .into_iter()
        .map(|(seller, revenue)| SellerCommission {
            seller,
            revenue,
            rate: rates.get(&seller).copied().unwrap_or_default(),
            commission: commissions.get(&seller).copied().unwrap_or_default(),
        })
        .collect();

    Ok(CommissionResult { rows, totals })
}
