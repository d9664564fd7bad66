//! Headline figures and breakdowns over the filtered sales rows.
//!
//! Unlike commissions these cover every seller, including the catch-all.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::commission::{checked_sum, CommissionError, CommissionResult};
use super::entities::{Seller, TransactionRecord};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesOverview {
    pub total_revenue: Decimal,
    pub total_sales: u64,
    /// Revenue per sale, zero when nothing was sold.
    pub average_ticket: Decimal,
    pub total_commission: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SellerVolume {
    pub seller: Seller,
    pub sales: u64,
    pub revenue: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignEfficiency {
    pub campaign: String,
    pub revenue: Decimal,
    pub sales: u64,
    /// `None` when the campaign has no recorded sales.
    pub average_ticket: Option<Decimal>,
}

fn add_sales(acc: u64, sales: u64) -> Result<u64, CommissionError> {
    acc.checked_add(sales).ok_or(CommissionError::Overflow("sale count"))
}

pub fn sales_overview(
    records: &[TransactionRecord],
    commissions: &CommissionResult,
) -> Result<SalesOverview, CommissionError> {
    let mut total_revenue = Decimal::ZERO;
    let mut total_sales = 0u64;
    for record in records {
        total_revenue = checked_sum(total_revenue, record.revenue, "total revenue")?;
        total_sales = add_sales(total_sales, record.sale_count)?;
    }

    let average_ticket = if total_sales == 0 {
        Decimal::ZERO
    } else {
        total_revenue / Decimal::from(total_sales)
    };

    Ok(SalesOverview {
        total_revenue,
        total_sales,
        average_ticket,
        total_commission: commissions.total_commission(),
    })
}

/// Sales and raw revenue per seller, ordered by seller.
pub fn volume_by_seller(records: &[TransactionRecord]) -> Result<Vec<SellerVolume>, CommissionError> {
    let mut grouped: BTreeMap<Seller, (u64, Decimal)> = BTreeMap::new();
    for record in records {
        let entry = grouped.entry(record.seller).or_default();
        entry.0 = add_sales(entry.0, record.sale_count)?;
        entry.1 = checked_sum(entry.1, record.revenue, "seller revenue")?;
    }

    Ok(grouped
        .into_iter()
        .map(|(seller, (sales, revenue))| SellerVolume {
            seller,
            sales,
            revenue,
        })
        .collect())
}

/// Same figures as [`volume_by_seller`], highest revenue first.
pub fn revenue_ranking(records: &[TransactionRecord]) -> Result<Vec<SellerVolume>, CommissionError> {
    let mut ranking = volume_by_seller(records)?;
    ranking.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(a.seller.cmp(&b.seller)));
    Ok(ranking)
}

/// Revenue, sales and ticket per campaign, highest revenue first.
pub fn campaign_efficiency(
    records: &[TransactionRecord],
) -> Result<Vec<CampaignEfficiency>, CommissionError> {
    let mut grouped: HashMap<&str, (Decimal, u64)> = HashMap::new();
    for record in records {
        let entry = grouped.entry(record.campaign.as_str()).or_default();
        entry.0 = checked_sum(entry.0, record.revenue, "campaign revenue")?;
        entry.1 = add_sales(entry.1, record.sale_count)?;
    }

    let mut campaigns: Vec<CampaignEfficiency> = grouped
        .into_iter()
        .map(|(campaign, (revenue, sales))| CampaignEfficiency {
            campaign: campaign.to_string(),
            revenue,
            sales,
            average_ticket: (sales > 0).then(|| revenue / Decimal::from(sales)),
        })
        .collect();

    campaigns.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.campaign.cmp(&b.campaign))
    });
    Ok(campaigns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commission::{compute_commissions, SharedCost};
    use crate::domain::rates::CommissionPlan;
    use rust_decimal_macros::dec;

    fn row(seller: Seller, campaign: &str, revenue: Decimal, sales: u64) -> TransactionRecord {
        TransactionRecord {
            seller,
            seller_raw: seller.label().to_string(),
            revenue,
            sale_count: sales,
            channel: "whatsapp".to_string(),
            campaign: campaign.to_string(),
            content: "reels".to_string(),
            source: "ig".to_string(),
        }
    }

    fn sample() -> Vec<TransactionRecord> {
        vec![
            row(Seller::Joao, "natal", dec!(1000), 2),
            row(Seller::Other, "natal", dec!(500), 1),
            row(Seller::Claudia, "pascoa", dec!(2000), 1),
            row(Seller::Other, "brinde", dec!(0), 0),
        ]
    }

    #[test]
    fn overview_counts_every_seller() {
        let records = sample();
        let commissions =
            compute_commissions(&records, SharedCost::ZERO, CommissionPlan::standard()).unwrap();
        let overview = sales_overview(&records, &commissions).unwrap();

        assert_eq!(overview.total_revenue, dec!(3500));
        assert_eq!(overview.total_sales, 4);
        assert_eq!(overview.average_ticket, dec!(875));
        // 1000 * 3% + 2000 * 1%
        assert_eq!(overview.total_commission, dec!(50));
    }

    #[test]
    fn average_ticket_is_zero_without_sales() {
        let records = vec![row(Seller::Joao, "natal", dec!(100), 0)];
        let overview = sales_overview(&records, &CommissionResult::default()).unwrap();
        assert_eq!(overview.average_ticket, Decimal::ZERO);
    }

    #[test]
    fn seller_breakdowns() {
        let records = sample();

        let volume = volume_by_seller(&records).unwrap();
        assert_eq!(volume.len(), 3);
        assert_eq!(volume[0].seller, Seller::Joao);
        assert_eq!(volume[2].seller, Seller::Other);
        assert_eq!(volume[2].sales, 1);
        assert_eq!(volume[2].revenue, dec!(500));

        let ranking = revenue_ranking(&records).unwrap();
        let order: Vec<Seller> = ranking.iter().map(|v| v.seller).collect();
        assert_eq!(order, vec![Seller::Claudia, Seller::Joao, Seller::Other]);
    }

    #[test]
    fn campaign_efficiency_ranks_by_revenue() {
        let campaigns = campaign_efficiency(&sample()).unwrap();

        let names: Vec<&str> = campaigns.iter().map(|c| c.campaign.as_str()).collect();
        assert_eq!(names, vec!["pascoa", "natal", "brinde"]);
        assert_eq!(campaigns[1].revenue, dec!(1500));
        assert_eq!(campaigns[1].sales, 3);
        assert_eq!(campaigns[1].average_ticket, Some(dec!(500)));
        assert_eq!(campaigns[2].average_ticket, None);
    }

    #[test]
    fn aggregate_overflow_is_reported() {
        let huge = Decimal::MAX / dec!(2) + Decimal::ONE;
        let records = vec![
            row(Seller::Other, "natal", huge, 1),
            row(Seller::Other, "natal", huge, 1),
        ];
        let empty = CommissionResult::default();

        assert_eq!(
            sales_overview(&records, &empty).unwrap_err(),
            CommissionError::Overflow("total revenue")
        );
        assert!(volume_by_seller(&records).is_err());
        assert!(revenue_ranking(&records).is_err());
        assert!(campaign_efficiency(&records).is_err());
    }

    #[test]
    fn sale_count_overflow_is_reported() {
        let records = vec![
            row(Seller::Joao, "natal", dec!(1), u64::MAX),
            row(Seller::Claudia, "natal", dec!(1), 1),
        ];

        assert_eq!(
            sales_overview(&records, &CommissionResult::default()).unwrap_err(),
            CommissionError::Overflow("sale count")
        );
        assert_eq!(
            campaign_efficiency(&records).unwrap_err(),
            CommissionError::Overflow("sale count")
        );
        // per seller the counts stay apart
        assert!(volume_by_seller(&records).is_ok());
    }
}
