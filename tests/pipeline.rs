use std::collections::BTreeSet;
use std::io::Write;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sales_commission::domain::{
    campaign_efficiency, compute_commissions, sales_overview, ColumnNames, CommissionError,
    CommissionPlan, RowFilter, Seller, SharedCost,
};
use sales_commission::infra::{export_rows_csv, export_totals_csv, load_records, LoadError};

const SHEET: &str = "\
Receita,Vendas,Origem,Mídia,Campanha,Conteúdo,Fonte
\"R$ 9.000,00\",3,joao-vendeu,whatsapp,natal,video,instagram
\"R$ 21.000,00\",5,joao_vendeu?utm_source=João,whatsapp,natal,post,facebook
\"R$ 12.000,00\",4,Claudia-vendeu,email,pascoa,,newsletter
\"R$ 8.000,00\",2, Henrique ,whatsapp,pascoa,reels,instagram
\"R$ 50.000,00\",10,Marcos,whatsapp,natal,video,instagram
\"R$ 2.000,00\",n/a,Auto,email,pascoa,post,
";

fn write_sheet(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn sheet_to_commissions() {
    let file = write_sheet(SHEET);
    let records = load_records(file.path(), &ColumnNames::default()).unwrap();
    assert_eq!(records.len(), 6);

    let shared = SharedCost::new(dec!(3200)).unwrap();
    let result = compute_commissions(&records, shared, CommissionPlan::standard()).unwrap();

    // Marcos collapses to the catch-all and earns nothing
    assert_eq!(result.rows.len(), 5);
    assert!(result.total_for(Seller::Other).is_none());

    // Joao: 32000 revenue absorbs the 3200 cost -> 28800 at 4%
    let joao = result.total_for(Seller::Joao).unwrap();
    assert_eq!(joao.revenue, dec!(28800));
    assert_eq!(joao.rate, dec!(0.04));
    assert_eq!(joao.commission, dec!(1152));
    let adjusted: Vec<Decimal> = result
        .rows
        .iter()
        .filter(|row| row.seller() == Seller::Joao)
        .map(|row| row.adjusted_revenue)
        .collect();
    assert_eq!(adjusted, vec![dec!(8100), dec!(18900), dec!(1800)]);

    let claudia = result.total_for(Seller::Claudia).unwrap();
    assert_eq!(claudia.rate, dec!(0.02));
    assert_eq!(claudia.commission, dec!(240));

    let henrique = result.total_for(Seller::Henrique).unwrap();
    assert_eq!(henrique.rate, dec!(0.01));
    assert_eq!(henrique.commission, dec!(80));

    let overview = sales_overview(&records, &result).unwrap();
    assert_eq!(overview.total_revenue, dec!(102000));
    assert_eq!(overview.total_sales, 24);
    assert_eq!(overview.total_commission, dec!(1472));

    let campaigns = campaign_efficiency(&records).unwrap();
    assert_eq!(campaigns[0].campaign, "natal");
    assert_eq!(campaigns[0].revenue, dec!(80000));
}

#[test]
fn filter_runs_before_commissions() {
    let file = write_sheet(SHEET);
    let records = load_records(file.path(), &ColumnNames::default()).unwrap();

    let filter = RowFilter {
        campaigns: Some(BTreeSet::from(["pascoa".to_string()])),
        ..RowFilter::default()
    };
    let selected = filter.apply(&records);
    let result = compute_commissions(
        &selected,
        SharedCost::new(dec!(100)).unwrap(),
        CommissionPlan::standard(),
    )
    .unwrap();

    // only the 2000 "Auto" row remains for Joao, so it bears the whole cost
    let joao = result.total_for(Seller::Joao).unwrap();
    assert_eq!(joao.revenue, dec!(1900));
    assert_eq!(joao.rate, dec!(0.03));
    assert_eq!(result.rows.iter().filter(|r| r.seller() == Seller::Joao).count(), 1);
}

#[test]
fn exports_write_every_row() {
    let file = write_sheet(SHEET);
    let records = load_records(file.path(), &ColumnNames::default()).unwrap();
    let result = compute_commissions(&records, SharedCost::ZERO, CommissionPlan::standard()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let rows_path = dir.path().join("comissoes.csv");
    let totals_path = dir.path().join("totais.csv");
    export_rows_csv(&rows_path, &result.rows).unwrap();
    export_totals_csv(&totals_path, &result.totals).unwrap();

    let mut reader = csv::Reader::from_path(&rows_path).unwrap();
    let commissions: Vec<Decimal> = reader
        .records()
        .map(|record| record.unwrap()[10].parse().unwrap())
        .collect();
    assert_eq!(commissions.len(), result.rows.len());
    let exported: Decimal = commissions.iter().sum();
    assert_eq!(exported, result.total_commission());

    let totals = std::fs::read_to_string(&totals_path).unwrap();
    assert_eq!(totals.lines().count(), 1 + result.totals.len());
}

#[test]
fn bad_revenue_aborts_the_whole_load() {
    let file = write_sheet(
        "Receita,Vendas,Origem,Mídia,Campanha,Conteúdo,Fonte\n\
         \"R$ 10,00\",1,Claudia,email,natal,post,ig\n\
         dez reais,1,Claudia,email,natal,post,ig\n",
    );

    let err = load_records(file.path(), &ColumnNames::default()).unwrap_err();
    assert!(matches!(err, LoadError::Normalize(_)));
    assert!(err.to_string().contains("line 3"));
}

#[test]
fn oversized_amounts_fail_without_panicking() {
    let file = write_sheet(
        "Receita,Vendas,Origem,Mídia,Campanha,Conteúdo,Fonte\n\
         \"R$ 50.000.000.000.000.000.000.000.000.000\",1e19,Claudia,email,natal,post,ig\n\
         \"R$ 50.000.000.000.000.000.000.000.000.000\",1e19,Claudia,email,natal,post,ig\n",
    );
    let records = load_records(file.path(), &ColumnNames::default()).unwrap();
    assert_eq!(records.len(), 2);
    // counts that large are not plausible and read as zero
    assert!(records.iter().all(|record| record.sale_count == 0));

    let err = compute_commissions(&records, SharedCost::ZERO, CommissionPlan::standard())
        .unwrap_err();
    assert_eq!(err, CommissionError::Overflow("seller revenue"));

    let err = sales_overview(&records, &Default::default()).unwrap_err();
    assert_eq!(err, CommissionError::Overflow("total revenue"));
}

#[test]
fn workbook_sheet_loads_like_csv() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/vendas.xlsx");
    let records = load_records(&path, &ColumnNames::default()).unwrap();
    assert_eq!(records.len(), 3);

    // numeric cell, no separator handling
    assert_eq!(records[0].seller, Seller::Joao);
    assert_eq!(records[0].revenue, dec!(9000.5));
    assert_eq!(records[0].sale_count, 3);

    // text cell in the sheet's currency format
    assert_eq!(records[1].seller, Seller::Claudia);
    assert_eq!(records[1].revenue, dec!(1500));
    assert_eq!(records[1].content, "Desconhecido");

    assert_eq!(records[2].seller, Seller::Other);

    let result = compute_commissions(&records, SharedCost::ZERO, CommissionPlan::standard()).unwrap();
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.total_for(Seller::Joao).unwrap().rate, dec!(0.03));
}
