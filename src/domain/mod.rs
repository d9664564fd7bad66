//! Commission engine: cleaning, rate lookup and commission computation.

pub mod commission;
pub mod entities;
pub mod filter;
pub mod metrics;
pub mod normalize;
pub mod rates;

pub use commission::{compute_commissions, CommissionError, CommissionResult, SharedCost};
pub use entities::{CommissionRecord, Seller, SellerCommission, TransactionRecord, UNKNOWN_LABEL};
pub use filter::{distinct_campaigns, distinct_channels, distinct_sellers, RowFilter};
pub use metrics::{
    campaign_efficiency, revenue_ranking, sales_overview, volume_by_seller, CampaignEfficiency,
    SalesOverview, SellerVolume,
};
pub use normalize::{
    canonical_seller, normalize_table, parse_revenue, ColumnNames, NormalizeError, RawCell,
    RawTable,
};
pub use rates::{CommissionPlan, RateBracket, RateSchedule, SellerTerms};
