// tests/integration_tests.rs

use more_asserts::{assert_gt, assert_lt};
use polars::prelude::DataType as PolarsType;
use serde_json::{json, Value};
use stock_cleaning::{
    normalize, process_unit, validate_processed, validate_raw, DataType, SchemaCatalog, Stage,
    UnitOutcome,
};

fn daily_payload() -> Value {
    json!({
        "Meta Data": {
            "1. Information": "Daily Prices (open, high, low, close) and Volumes",
            "2. Symbol": "AAPL",
            "3. Last Refreshed": "2025-03-24",
            "4. Output Size": "Full size",
            "5. Time Zone": "US/Eastern"
        },
        "Time Series (Daily)": {
            "2025-03-24": {
                "1. open": "221.0000",
                "2. high": "221.4800",
                "3. low": "218.5800",
                "4. close": "220.7300",
                "5. volume": "44299483"
            },
            "2025-03-21": {
                "1. open": "211.5600",
                "2. high": "218.8400",
                "3. low": "211.2800",
                "4. close": "218.2700",
                "5. volume": "94127768"
            },
            "2025-03-20": {
                "1. open": "213.9900",
                "2. high": "217.4900",
                "3. low": "212.2200",
                "4. close": "214.1000",
                "5. volume": "48862947"
            }
        }
    })
}

fn overview_payload() -> Value {
    json!({
        "Symbol": "AAPL",
        "AssetType": "Common Stock",
        "Name": "Apple Inc",
        "Description": "Apple Inc. is an American multinational technology company.",
        "CIK": "320193",
        "Exchange": "NASDAQ",
        "Currency": "USD",
        "Country": "USA",
        "Sector": "TECHNOLOGY",
        "Industry": "ELECTRONIC COMPUTERS",
        "MarketCapitalization": "3315670000000",
        "SharesOutstanding": "15022100000"
    })
}

fn income_payload() -> Value {
    json!({
        "symbol": "AAPL",
        "annualReports": [
            {
                "fiscalDateEnding": "2024-09-30",
                "reportedCurrency": "USD",
                "grossProfit": "180683000000",
                "totalRevenue": "391035000000",
                "costOfRevenue": "210352000000",
                "costofGoodsAndServicesSold": "210352000000",
                "operatingIncome": "123216000000",
                "sellingGeneralAndAdministrative": "26097000000",
                "researchAndDevelopment": "31370000000",
                "operatingExpenses": "57467000000",
                "investmentIncomeNet": "None",
                "netInterestIncome": "None",
                "interestIncome": "None",
                "interestExpense": "None",
                "nonInterestIncome": "391035000000",
                "otherNonOperatingIncome": "269000000",
                "depreciation": "None",
                "depreciationAndAmortization": "11445000000",
                "incomeBeforeTax": "123485000000",
                "incomeTaxExpense": "29749000000",
                "interestAndDebtExpense": "None",
                "netIncomeFromContinuingOperations": "93736000000",
                "comprehensiveIncomeNetOfTax": "98016000000",
                "ebit": "123485000000",
                "ebitda": "134930000000",
                "netIncome": "93736000000"
            },
            {
                "fiscalDateEnding": "2023-09-30",
                "reportedCurrency": "USD",
                "grossProfit": "169148000000",
                "totalRevenue": "383285000000",
                "costOfRevenue": "214137000000",
                "costofGoodsAndServicesSold": "214137000000",
                "operatingIncome": "114301000000",
                "sellingGeneralAndAdministrative": "24932000000",
                "researchAndDevelopment": "29915000000",
                "operatingExpenses": "54847000000",
                "investmentIncomeNet": "3750000000",
                "netInterestIncome": "-183000000",
                "interestIncome": "3750000000",
                "interestExpense": "3933000000",
                "nonInterestIncome": "383285000000",
                "otherNonOperatingIncome": "-565000000",
                "depreciation": "8500000000",
                "depreciationAndAmortization": "11519000000",
                "incomeBeforeTax": "113736000000",
                "incomeTaxExpense": "16741000000",
                "interestAndDebtExpense": "3933000000",
                "netIncomeFromContinuingOperations": "96995000000",
                "comprehensiveIncomeNetOfTax": "96652000000",
                "ebit": "117669000000",
                "ebitda": "129188000000",
                "netIncome": "96995000000"
            }
        ]
    })
}

fn balance_payload() -> Value {
    json!({
        "symbol": "AAPL",
        "annualReports": [{
            "fiscalDateEnding": "2024-09-30",
            "reportedCurrency": "USD",
            "totalAssets": "364980000000",
            "totalCurrentAssets": "152987000000",
            "cashAndCashEquivalentsAtCarryingValue": "29943000000",
            "cashAndShortTermInvestments": "65171000000",
            "inventory": "7286000000",
            "currentNetReceivables": "66243000000",
            "totalNonCurrentAssets": "211993000000",
            "propertyPlantEquipment": "45680000000",
            "accumulatedDepreciationAmortizationPPE": "None",
            "intangibleAssets": "None",
            "intangibleAssetsExcludingGoodwill": "None",
            "goodwill": "None",
            "investments": "None",
            "longTermInvestments": "91479000000",
            "shortTermInvestments": "35228000000",
            "otherCurrentAssets": "14287000000",
            "otherNonCurrentAssets": "None",
            "totalLiabilities": "308030000000",
            "totalCurrentLiabilities": "176392000000",
            "currentAccountsPayable": "68960000000",
            "deferredRevenue": "None",
            "currentDebt": "20879000000",
            "shortTermDebt": "10912000000",
            "totalNonCurrentLiabilities": "131638000000",
            "capitalLeaseObligations": "None",
            "longTermDebt": "85750000000",
            "currentLongTermDebt": "10912000000",
            "longTermDebtNoncurrent": "None",
            "shortLongTermDebtTotal": "106629000000",
            "otherCurrentLiabilities": "78304000000",
            "otherNonCurrentLiabilities": "45888000000",
            "totalShareholderEquity": "56950000000",
            "treasuryStock": "None",
            "retainedEarnings": "-19154000000",
            "commonStock": "83276000000",
            "commonStockSharesOutstanding": "15116786000"
        }]
    })
}

fn cash_payload() -> Value {
    json!({
        "symbol": "AAPL",
        "annualReports": [{
            "fiscalDateEnding": "2024-09-30",
            "reportedCurrency": "USD",
            "operatingCashflow": "118254000000",
            "paymentsForOperatingActivities": "None",
            "proceedsFromOperatingActivities": "None",
            "changeInOperatingLiabilities": "21572000000",
            "changeInOperatingAssets": "17921000000",
            "depreciationDepletionAndAmortization": "11445000000",
            "capitalExpenditures": "9447000000",
            "changeInReceivables": "3788000000",
            "changeInInventory": "1046000000",
            "profitLoss": "None",
            "cashflowFromInvestment": "2935000000",
            "cashflowFromFinancing": "-121983000000",
            "proceedsFromRepaymentsOfShortTermDebt": "3960000000",
            "paymentsForRepurchaseOfCommonStock": "94949000000",
            "paymentsForRepurchaseOfEquity": "94949000000",
            "paymentsForRepurchaseOfPreferredStock": "None",
            "dividendPayout": "15234000000",
            "dividendPayoutCommonStock": "15234000000",
            "dividendPayoutPreferredStock": "None",
            "proceedsFromIssuanceOfCommonStock": "None",
            "proceedsFromIssuanceOfLongTermDebtAndCapitalSecuritiesNet": "0",
            "proceedsFromIssuanceOfPreferredStock": "None",
            "proceedsFromRepurchaseOfEquity": "-94949000000",
            "proceedsFromSaleOfTreasuryStock": "None",
            "changeInCashAndCashEquivalents": "None",
            "changeInExchangeRate": "None",
            "netIncome": "93736000000"
        }]
    })
}

fn all_payloads() -> Vec<(DataType, Value)> {
    vec![
        (DataType::Daily, daily_payload()),
        (DataType::Info, overview_payload()),
        (DataType::Income, income_payload()),
        (DataType::Balance, balance_payload()),
        (DataType::Cash, cash_payload()),
    ]
}

fn expect_accepted(outcome: UnitOutcome) -> polars::prelude::DataFrame {
    match outcome {
        UnitOutcome::Accepted(table) => table,
        UnitOutcome::Rejected { stage, message } => {
            panic!("rejected at {} stage: {}", stage, message)
        }
    }
}

#[test]
fn test_every_data_type_passes_all_stages() {
    let catalog = SchemaCatalog::new();
    for (data_type, payload) in all_payloads() {
        let raw = validate_raw(&catalog, &payload, data_type.as_str());
        assert!(raw.is_ok(), "{}: {}", data_type, raw.message);

        let table = normalize(&catalog, &payload, data_type).unwrap();
        let processed = validate_processed(&catalog, &table, data_type.as_str());
        assert!(processed.is_ok(), "{}: {}", data_type, processed.message);

        let expected: Vec<&str> = catalog.schema(data_type).columns().map(|c| c.name).collect();
        let actual: Vec<&str> = table.get_column_names();
        assert_eq!(actual, expected, "{} columns", data_type);
    }
}

#[test]
fn test_daily_rows_follow_payload_order() {
    let catalog = SchemaCatalog::new();
    let outcome = process_unit(&catalog, &daily_payload(), DataType::Daily).unwrap();
    let table = expect_accepted(outcome);

    // The API lists the newest day first
    assert_eq!(table.height(), 3);
    let close = table.column("Close").unwrap().f64().unwrap();
    assert_eq!(close.get(0), Some(220.73));
    assert_eq!(close.get(1), Some(218.27));
    assert_eq!(close.get(2), Some(214.10));
}

#[test]
fn test_income_margins_per_year() {
    let catalog = SchemaCatalog::new();
    let outcome = process_unit(&catalog, &income_payload(), DataType::Income).unwrap();
    let table = expect_accepted(outcome);

    assert_eq!(table.height(), 2);
    let gross_margin = table.column("gross_margin").unwrap().f64().unwrap();
    let latest = gross_margin.get(0).unwrap();
    assert_gt!(latest, 46.2);
    assert_lt!(latest, 46.21);
    let previous = gross_margin.get(1).unwrap();
    assert_gt!(previous, 44.1);
    assert_lt!(previous, 44.14);

    let interest = table.column("interest_and_debt_expense").unwrap().f64().unwrap();
    assert_eq!(interest.get(0), None);
    assert_eq!(interest.get(1), Some(3933000000.0));
}

#[test]
fn test_balance_keeps_negative_retained_earnings() {
    let catalog = SchemaCatalog::new();
    let outcome = process_unit(&catalog, &balance_payload(), DataType::Balance).unwrap();
    let table = expect_accepted(outcome);

    assert_eq!(table.column("fiscal_date_ending").unwrap().dtype(), &PolarsType::Date);
    assert_eq!(
        table.column("retained_earnings").unwrap().f64().unwrap().get(0),
        Some(-19154000000.0)
    );
}

#[test]
fn test_cash_free_cashflow() {
    let catalog = SchemaCatalog::new();
    let table = expect_accepted(process_unit(&catalog, &cash_payload(), DataType::Cash).unwrap());
    assert_eq!(
        table.column("free_cashflow").unwrap().f64().unwrap().get(0),
        Some(108807000000.0)
    );
}

#[test]
fn test_overview_single_row() {
    let catalog = SchemaCatalog::new();
    let outcome = process_unit(&catalog, &overview_payload(), DataType::Info).unwrap();
    let table = expect_accepted(outcome);
    assert_eq!(table.height(), 1);
    assert_eq!(table.column("name").unwrap().str().unwrap().get(0), Some("Apple Inc"));
    assert_eq!(table.column("exchange").unwrap().str().unwrap().get(0), Some("NASDAQ"));
}

#[test]
fn test_invalid_report_value_rejected_at_raw_stage() {
    let catalog = SchemaCatalog::new();
    let mut payload = balance_payload();
    payload["annualReports"][0]["retainedEarnings"] = json!("InvalidData");

    match process_unit(&catalog, &payload, DataType::Balance).unwrap() {
        UnitOutcome::Rejected { stage, message } => {
            assert_eq!(stage, Stage::Raw);
            assert!(message.contains("retainedEarnings"));
            assert!(message.contains("InvalidData"));
        }
        UnitOutcome::Accepted(_) => panic!("invalid report accepted"),
    }
}

#[test]
fn test_missing_report_field_named() {
    let catalog = SchemaCatalog::new();
    let mut payload = balance_payload();
    payload["annualReports"][0]
        .as_object_mut()
        .unwrap()
        .remove("totalAssets");

    let verdict = validate_raw(&catalog, &payload, "balance");
    assert!(verdict.error);
    assert!(verdict.message.contains("totalAssets"));
    assert!(verdict.message.contains("2024-09-30"));
}

#[test]
fn test_rate_limit_rejected_for_every_type() {
    let catalog = SchemaCatalog::new();
    let payload = json!({
        "Information": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."
    });
    for data_type in DataType::ALL {
        match process_unit(&catalog, &payload, data_type).unwrap() {
            UnitOutcome::Rejected { stage, message } => {
                assert_eq!(stage, Stage::Raw);
                assert!(message.contains("rate limit"), "{}", message);
            }
            UnitOutcome::Accepted(_) => panic!("{} accepted a rate limit notice", data_type),
        }
    }
}

#[test]
fn test_daily_without_volume_rejected_after_normalization() {
    let catalog = SchemaCatalog::new();
    let table = normalize(&catalog, &daily_payload(), DataType::Daily).unwrap();
    let table = table.drop("Volume").unwrap();

    let verdict = validate_processed(&catalog, &table, "daily");
    assert!(verdict.error);
    assert!(verdict.message.contains("Volume"));
}

#[test]
fn test_validators_are_stable_across_calls() {
    let catalog = SchemaCatalog::new();
    let payload = income_payload();
    let first = validate_raw(&catalog, &payload, "income");
    let second = validate_raw(&catalog, &payload, "income");
    assert_eq!(first, second);
}
