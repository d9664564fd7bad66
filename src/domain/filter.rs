//! Row selection applied before commissions are computed.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::entities::{Seller, TransactionRecord};

/// Membership filter over seller, campaign and channel.
/// A `None` dimension accepts every value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    #[serde(default)]
    pub sellers: Option<BTreeSet<Seller>>,
    #[serde(default)]
    pub campaigns: Option<BTreeSet<String>>,
    #[serde(default)]
    pub channels: Option<BTreeSet<String>>,
}

impl RowFilter {
    pub fn is_empty(&self) -> bool {
        self.sellers.is_none() && self.campaigns.is_none() && self.channels.is_none()
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if let Some(ref sellers) = self.sellers {
            if !sellers.contains(&record.seller) { return false; }
        }
        if let Some(ref campaigns) = self.campaigns {
            if !campaigns.contains(&record.campaign) { return false; }
        }
        if let Some(ref channels) = self.channels {
            if !channels.contains(&record.channel) { return false; }
        }

        true
    }

    pub fn apply(&self, records: &[TransactionRecord]) -> Vec<TransactionRecord> {
        records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

pub fn distinct_sellers(records: &[TransactionRecord]) -> Vec<Seller> {
    first_seen(records.iter().map(|record| record.seller))
}

pub fn distinct_campaigns(records: &[TransactionRecord]) -> Vec<String> {
    first_seen(records.iter().map(|record| record.campaign.clone()))
}

pub fn distinct_channels(records: &[TransactionRecord]) -> Vec<String> {
    first_seen(records.iter().map(|record| record.channel.clone()))
}

fn first_seen<T, I>(values: I) -> Vec<T>
where
    T: Clone + Eq + std::hash::Hash,
    I: Iterator<Item = T>,
{
    let mut seen = HashSet::new();
    values.filter(|value| seen.insert(value.clone())).collect()
}
