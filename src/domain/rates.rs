//! Seller commission terms and bracket lookup.

use std::{collections::BTreeMap, sync::OnceLock};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::commission::CommissionError;
use super::entities::Seller;

/// Flat rate applied when the aggregate falls at or below `up_to`.
/// `None` marks the open-ended top bracket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateBracket {
    pub up_to: Option<Decimal>,
    pub rate: Decimal,
}

impl RateBracket {
    pub const fn capped(up_to: Decimal, rate: Decimal) -> Self {
        Self {
            up_to: Some(up_to),
            rate,
        }
    }

    pub const fn open(rate: Decimal) -> Self {
        Self { up_to: None, rate }
    }
}

/// Ordered, non-overlapping brackets. The whole aggregate is paid at the rate
/// of the bracket it lands in; there is no marginal split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateSchedule {
    brackets: Vec<RateBracket>,
}

impl RateSchedule {
    pub fn new(brackets: Vec<RateBracket>) -> Result<Self, CommissionError> {
        let Some(last) = brackets.last() else {
            return Err(CommissionError::InvalidSchedule("no brackets".to_string()));
        };
        if last.up_to.is_some() {
            return Err(CommissionError::InvalidSchedule(
                "last bracket must be open-ended".to_string(),
            ));
        }

        let capped = &brackets[..brackets.len() - 1];
        if capped.iter().any(|bracket| bracket.up_to.is_none()) {
            return Err(CommissionError::InvalidSchedule(
                "only the last bracket may be open-ended".to_string(),
            ));
        }
        if capped.windows(2).any(|pair| pair[0].up_to >= pair[1].up_to) {
            return Err(CommissionError::InvalidSchedule(
                "bracket limits must be strictly increasing".to_string(),
            ));
        }
        if brackets.iter().any(|bracket| bracket.rate < Decimal::ZERO) {
            return Err(CommissionError::InvalidSchedule(
                "rates must be non-negative".to_string(),
            ));
        }

        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[RateBracket] {
        &self.brackets
    }

    /// Rate for an aggregate amount. Limits are inclusive.
    pub fn rate_for(&self, aggregate: Decimal) -> Decimal {
        self.brackets
            .iter()
            .find(|bracket| bracket.up_to.map_or(true, |limit| aggregate <= limit))
            .map(|bracket| bracket.rate)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SellerTerms {
    pub schedule: RateSchedule,
    /// Whether this seller's revenue absorbs the shared operating cost.
    pub bears_shared_cost: bool,
}

/// Commission terms per eligible seller. Sellers without terms earn nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommissionPlan {
    terms: BTreeMap<Seller, SellerTerms>,
}

impl CommissionPlan {
    pub fn new(terms: BTreeMap<Seller, SellerTerms>) -> Result<Self, CommissionError> {
        if terms.contains_key(&Seller::Other) {
            return Err(CommissionError::InvalidPlan(
                "the catch-all seller cannot earn commission".to_string(),
            ));
        }
        let bearers: Vec<Seller> = terms
            .iter()
            .filter(|(_, t)| t.bears_shared_cost)
            .map(|(seller, _)| *seller)
            .collect();
        if bearers.len() > 1 {
            return Err(CommissionError::MultipleCostBearers(bearers));
        }

        Ok(Self { terms })
    }

    /// The default plan, built once per process.
    pub fn standard() -> &'static CommissionPlan {
        static STANDARD: OnceLock<CommissionPlan> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let lead = RateSchedule {
                brackets: vec![
                    RateBracket::capped(dec!(15000), dec!(0.03)),
                    RateBracket::capped(dec!(30000), dec!(0.04)),
                    RateBracket::capped(dec!(60000), dec!(0.05)),
                    RateBracket::capped(dec!(100000), dec!(0.06)),
                    RateBracket::open(dec!(0.07)),
                ],
            };
            let associate = RateSchedule {
                brackets: vec![
                    RateBracket::capped(dec!(10000), dec!(0.01)),
                    RateBracket::capped(dec!(15000), dec!(0.02)),
                    RateBracket::open(dec!(0.03)),
                ],
            };

            CommissionPlan {
                terms: BTreeMap::from([
                    (
                        Seller::Joao,
                        SellerTerms {
                            schedule: lead,
                            bears_shared_cost: true,
                        },
                    ),
                    (
                        Seller::Claudia,
                        SellerTerms {
                            schedule: associate.clone(),
                            bears_shared_cost: false,
                        },
                    ),
                    (
                        Seller::Henrique,
                        SellerTerms {
                            schedule: associate,
                            bears_shared_cost: false,
                        },
                    ),
                ]),
            }
        })
    }

    pub fn is_eligible(&self, seller: Seller) -> bool {
        self.terms.contains_key(&seller)
    }

    pub fn cost_bearer(&self) -> Option<Seller> {
        self.terms
            .iter()
            .find(|(_, terms)| terms.bears_shared_cost)
            .map(|(seller, _)| *seller)
    }

    pub fn terms(&self, seller: Seller) -> Option<&SellerTerms> {
        self.terms.get(&seller)
    }

    /// Flat commission rate for a seller's aggregate adjusted revenue.
    pub fn rate_for(&self, seller: Seller, aggregate: Decimal) -> Decimal {
        self.terms
            .get(&seller)
            .map(|terms| terms.schedule.rate_for(aggregate))
            .unwrap_or(Decimal::ZERO)
    }
}
