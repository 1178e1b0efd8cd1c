// src/catalog.rs

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseDataTypeError;

lazy_static! {
    // Matches "YYYY-MM-DD"
    pub static ref DATE_PATTERN: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern");
    // Matches "1. open", "5. volume", etc.
    pub static ref DAILY_FIELD_PATTERN: Regex =
        Regex::new(r"^\d\.\s(open|high|low|close|volume)$").expect("daily field pattern");
    // Matches integers or decimals, optionally negative
    pub static ref NUMERIC_PATTERN: Regex =
        Regex::new(r"^-?\d+(\.\d+)?$").expect("numeric pattern");
    // Matches report keys such as "totalRevenue" (letters first, no special characters)
    pub static ref IDENTIFIER_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z]+[a-zA-Z0-9]*$").expect("identifier pattern");
    pub static ref NULL_SENTINEL_PATTERN: Regex =
        Regex::new(r"^None$").expect("null sentinel pattern");
    // Matches currency codes like "USD"
    pub static ref CURRENCY_CODE_PATTERN: Regex =
        Regex::new(r"^[A-Z]{3}$").expect("currency code pattern");
}

/// The five payload families served by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Daily,
    Income,
    Balance,
    Cash,
    Info,
}

impl DataType {
    pub const ALL: [DataType; 5] = [
        DataType::Daily,
        DataType::Income,
        DataType::Balance,
        DataType::Cash,
        DataType::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Daily => "daily",
            DataType::Income => "income",
            DataType::Balance => "balance",
            DataType::Cash => "cash",
            DataType::Info => "info",
        }
    }

    // Income, balance and cash statements share the annualReports layout
    pub fn is_financial(&self) -> bool {
        matches!(self, DataType::Income | DataType::Balance | DataType::Cash)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ParseDataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .iter()
            .copied()
            .find(|data_type| data_type.as_str() == s)
            .ok_or_else(|| ParseDataTypeError(s.to_string()))
    }
}

/// Shapes a raw string value is allowed to take inside a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Date,
    Numeric,
    NullSentinel,
    CurrencyCode,
}

impl ValueShape {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            ValueShape::Date => DATE_PATTERN.is_match(value),
            ValueShape::Numeric => NUMERIC_PATTERN.is_match(value),
            ValueShape::NullSentinel => NULL_SENTINEL_PATTERN.is_match(value),
            ValueShape::CurrencyCode => CURRENCY_CODE_PATTERN.is_match(value),
        }
    }

    /// First shape the value conforms to, checked in catalog order.
    pub fn classify(value: &str) -> Option<ValueShape> {
        [
            ValueShape::Date,
            ValueShape::Numeric,
            ValueShape::NullSentinel,
            ValueShape::CurrencyCode,
        ]
        .into_iter()
        .find(|shape| shape.matches(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Numeric,
    Text,
}

/// One canonical column of a normalized table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn date(name: &'static str) -> Self {
        Column { name, kind: ColumnKind::Date }
    }

    pub const fn numeric(name: &'static str) -> Self {
        Column { name, kind: ColumnKind::Numeric }
    }

    pub const fn text(name: &'static str) -> Self {
        Column { name, kind: ColumnKind::Text }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Derivation {
    /// numerator / denominator * 100
    Percentage {
        numerator: &'static str,
        denominator: &'static str,
    },
    /// minuend - subtrahend
    Difference {
        minuend: &'static str,
        subtrahend: &'static str,
    },
}

/// A numeric column computed from other canonical columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedColumn {
    pub name: &'static str,
    pub derivation: Derivation,
}

/// Everything the validators and cleaners need to know about one data type.
#[derive(Debug, Clone)]
pub struct Schema {
    pub data_type: DataType,
    /// Key holding the nested collection; `None` when the payload itself is the record.
    pub extraction_key: Option<&'static str>,
    /// Fields every record (daily entry, annual report or overview) must carry.
    pub required_fields: &'static [&'static str],
    /// Raw field name -> canonical column name.
    pub rename_map: &'static [(&'static str, &'static str)],
    /// Canonical columns kept after renaming, in output order.
    pub retained: &'static [Column],
    pub derived: &'static [DerivedColumn],
}

impl Schema {
    pub fn canonical_name(&self, raw: &str) -> Option<&'static str> {
        self.rename_map
            .iter()
            .find(|(raw_name, _)| *raw_name == raw)
            .map(|(_, canonical)| *canonical)
    }

    pub fn raw_name(&self, canonical: &str) -> Option<&'static str> {
        self.rename_map
            .iter()
            .find(|(_, canonical_name)| *canonical_name == canonical)
            .map(|(raw, _)| *raw)
    }

    /// Full canonical schema: retained columns followed by derived ones.
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.retained
            .iter()
            .copied()
            .chain(self.derived.iter().map(|derived| Column::numeric(derived.name)))
    }

    pub fn date_column(&self) -> Option<&'static str> {
        self.retained
            .iter()
            .find(|column| column.kind == ColumnKind::Date)
            .map(|column| column.name)
    }
}

/// Immutable lookup tables for every data type, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    daily: Schema,
    income: Schema,
    balance: Schema,
    cash: Schema,
    info: Schema,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        SchemaCatalog {
            daily: Schema {
                data_type: DataType::Daily,
                extraction_key: Some(DAILY_SERIES_KEY),
                required_fields: DAILY_REQUIRED,
                rename_map: DAILY_RENAMES,
                retained: DAILY_COLUMNS,
                derived: &[],
            },
            income: Schema {
                data_type: DataType::Income,
                extraction_key: Some(ANNUAL_REPORTS_KEY),
                required_fields: INCOME_REQUIRED,
                rename_map: INCOME_RENAMES,
                retained: INCOME_COLUMNS,
                derived: INCOME_DERIVED,
            },
            balance: Schema {
                data_type: DataType::Balance,
                extraction_key: Some(ANNUAL_REPORTS_KEY),
                required_fields: BALANCE_REQUIRED,
                rename_map: BALANCE_RENAMES,
                retained: BALANCE_COLUMNS,
                derived: &[],
            },
            cash: Schema {
                data_type: DataType::Cash,
                extraction_key: Some(ANNUAL_REPORTS_KEY),
                required_fields: CASH_REQUIRED,
                rename_map: CASH_RENAMES,
                retained: CASH_COLUMNS,
                derived: CASH_DERIVED,
            },
            info: Schema {
                data_type: DataType::Info,
                extraction_key: None,
                required_fields: INFO_REQUIRED,
                rename_map: INFO_RENAMES,
                retained: INFO_COLUMNS,
                derived: &[],
            },
        }
    }

    pub fn schema(&self, data_type: DataType) -> &Schema {
        match data_type {
            DataType::Daily => &self.daily,
            DataType::Income => &self.income,
            DataType::Balance => &self.balance,
            DataType::Cash => &self.cash,
            DataType::Info => &self.info,
        }
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::new()
    }
}

pub const DAILY_SERIES_KEY: &str = "Time Series (Daily)";
pub const ANNUAL_REPORTS_KEY: &str = "annualReports";

const DAILY_REQUIRED: &[&str] = &["1. open", "2. high", "3. low", "4. close", "5. volume"];

// High and low are not part of the canonical daily schema
const DAILY_RENAMES: &[(&str, &str)] = &[
    ("1. open", "Open"),
    ("4. close", "Close"),
    ("5. volume", "Volume"),
];

const DAILY_COLUMNS: &[Column] = &[
    Column::date("Date"),
    Column::numeric("Open"),
    Column::numeric("Close"),
    Column::numeric("Volume"),
];

const INFO_REQUIRED: &[&str] = &[
    "Name",
    "SharesOutstanding",
    "Symbol",
    "Exchange",
    "Currency",
    "Country",
    "Sector",
];

const INFO_RENAMES: &[(&str, &str)] = &[
    ("Name", "name"),
    ("SharesOutstanding", "total_shares"),
    ("Symbol", "ticker_symbol"),
    ("Exchange", "exchange"),
    ("Currency", "currency"),
    ("Country", "country"),
    ("Sector", "sector"),
];

const INFO_COLUMNS: &[Column] = &[
    Column::text("name"),
    Column::numeric("total_shares"),
    Column::text("ticker_symbol"),
    Column::text("exchange"),
    Column::text("currency"),
    Column::text("country"),
    Column::text("sector"),
];

const INCOME_REQUIRED: &[&str] = &[
    "fiscalDateEnding",
    "reportedCurrency",
    "grossProfit",
    "totalRevenue",
    "costOfRevenue",
    "costofGoodsAndServicesSold",
    "operatingIncome",
    "sellingGeneralAndAdministrative",
    "researchAndDevelopment",
    "operatingExpenses",
    "investmentIncomeNet",
    "netInterestIncome",
    "interestIncome",
    "interestExpense",
    "nonInterestIncome",
    "otherNonOperatingIncome",
    "depreciation",
    "depreciationAndAmortization",
    "incomeBeforeTax",
    "incomeTaxExpense",
    "interestAndDebtExpense",
    "netIncomeFromContinuingOperations",
    "comprehensiveIncomeNetOfTax",
    "ebit",
    "ebitda",
    "netIncome",
];

const INCOME_RENAMES: &[(&str, &str)] = &[
    ("fiscalDateEnding", "fiscal_date_ending"),
    ("reportedCurrency", "reported_currency"),
    ("grossProfit", "gross_profit"),
    ("totalRevenue", "total_revenue"),
    ("costOfRevenue", "cost_of_revenue"),
    ("costofGoodsAndServicesSold", "cost_of_goods_and_services_sold"),
    ("operatingIncome", "operating_income"),
    ("sellingGeneralAndAdministrative", "selling_general_and_administrative"),
    ("researchAndDevelopment", "research_and_development"),
    ("operatingExpenses", "operating_expenses"),
    ("investmentIncomeNet", "investment_income_net"),
    ("netInterestIncome", "net_interest_income"),
    ("interestIncome", "interest_income"),
    ("interestExpense", "interest_expense"),
    ("nonInterestIncome", "non_interest_income"),
    ("otherNonOperatingIncome", "other_non_operating_income"),
    ("depreciation", "depreciation"),
    ("depreciationAndAmortization", "depreciation_and_amortization"),
    ("incomeBeforeTax", "income_before_tax"),
    ("incomeTaxExpense", "income_tax_expense"),
    ("interestAndDebtExpense", "interest_and_debt_expense"),
    ("netIncomeFromContinuingOperations", "net_income_from_continuing_operations"),
    ("comprehensiveIncomeNetOfTax", "comprehensive_income_net_of_tax"),
    ("ebit", "ebit"),
    ("ebitda", "ebitda"),
    ("netIncome", "net_income"),
];

const INCOME_COLUMNS: &[Column] = &[
    Column::date("fiscal_date_ending"),
    Column::numeric("total_revenue"),
    Column::numeric("gross_profit"),
    Column::numeric("operating_income"),
    Column::numeric("net_income"),
    Column::numeric("interest_and_debt_expense"),
    Column::numeric("ebit"),
];

const INCOME_DERIVED: &[DerivedColumn] = &[
    DerivedColumn {
        name: "gross_margin",
        derivation: Derivation::Percentage {
            numerator: "gross_profit",
            denominator: "total_revenue",
        },
    },
    DerivedColumn {
        name: "operating_margin",
        derivation: Derivation::Percentage {
            numerator: "operating_income",
            denominator: "total_revenue",
        },
    },
    DerivedColumn {
        name: "ebit_margin",
        derivation: Derivation::Percentage {
            numerator: "ebit",
            denominator: "total_revenue",
        },
    },
];

const BALANCE_REQUIRED: &[&str] = &[
    "fiscalDateEnding",
    "reportedCurrency",
    "totalAssets",
    "totalCurrentAssets",
    "cashAndCashEquivalentsAtCarryingValue",
    "cashAndShortTermInvestments",
    "inventory",
    "currentNetReceivables",
    "totalNonCurrentAssets",
    "propertyPlantEquipment",
    "accumulatedDepreciationAmortizationPPE",
    "intangibleAssets",
    "intangibleAssetsExcludingGoodwill",
    "goodwill",
    "investments",
    "longTermInvestments",
    "shortTermInvestments",
    "otherCurrentAssets",
    "otherNonCurrentAssets",
    "totalLiabilities",
    "totalCurrentLiabilities",
    "currentAccountsPayable",
    "deferredRevenue",
    "currentDebt",
    "shortTermDebt",
    "totalNonCurrentLiabilities",
    "capitalLeaseObligations",
    "longTermDebt",
    "currentLongTermDebt",
    "longTermDebtNoncurrent",
    "shortLongTermDebtTotal",
    "otherCurrentLiabilities",
    "otherNonCurrentLiabilities",
    "totalShareholderEquity",
    "treasuryStock",
    "retainedEarnings",
    "commonStock",
    "commonStockSharesOutstanding",
];

const BALANCE_RENAMES: &[(&str, &str)] = &[
    ("fiscalDateEnding", "fiscal_date_ending"),
    ("reportedCurrency", "reported_currency"),
    ("totalAssets", "total_assets"),
    ("totalCurrentAssets", "total_current_assets"),
    ("cashAndCashEquivalentsAtCarryingValue", "cash_and_cash_equivalents"),
    ("cashAndShortTermInvestments", "cash_and_short_term_investments"),
    ("inventory", "inventory"),
    ("currentNetReceivables", "current_net_receivables"),
    ("totalNonCurrentAssets", "total_non_current_assets"),
    ("propertyPlantEquipment", "property_plant_and_equipment"),
    ("accumulatedDepreciationAmortizationPPE", "accumulated_depreciation_on_ppe"),
    ("intangibleAssets", "intangible_assets"),
    ("intangibleAssetsExcludingGoodwill", "intangible_assets_excl_goodwill"),
    ("goodwill", "goodwill"),
    ("investments", "investments"),
    ("longTermInvestments", "long_term_investments"),
    ("shortTermInvestments", "short_term_investments"),
    ("otherCurrentAssets", "other_current_assets"),
    ("otherNonCurrentAssets", "other_non_current_assets"),
    ("totalLiabilities", "total_liabilities"),
    ("totalCurrentLiabilities", "total_current_liabilities"),
    ("currentAccountsPayable", "current_accounts_payable"),
    ("deferredRevenue", "deferred_revenue"),
    ("currentDebt", "current_debt"),
    ("shortTermDebt", "short_term_debt"),
    ("totalNonCurrentLiabilities", "total_non_current_liabilities"),
    ("capitalLeaseObligations", "capital_lease_obligations"),
    ("longTermDebt", "long_term_debt"),
    ("currentLongTermDebt", "current_long_term_debt"),
    ("longTermDebtNoncurrent", "non_current_long_term_debt"),
    ("shortLongTermDebtTotal", "total_short_long_term_debt"),
    ("otherCurrentLiabilities", "other_current_liabilities"),
    ("otherNonCurrentLiabilities", "other_non_current_liabilities"),
    ("totalShareholderEquity", "total_shareholder_equity"),
    ("treasuryStock", "treasury_stock"),
    ("retainedEarnings", "retained_earnings"),
    ("commonStock", "common_stock"),
    ("commonStockSharesOutstanding", "common_stock_shares_outstanding"),
];

const BALANCE_COLUMNS: &[Column] = &[
    Column::date("fiscal_date_ending"),
    Column::numeric("total_current_assets"),
    Column::numeric("total_non_current_assets"),
    Column::numeric("total_current_liabilities"),
    Column::numeric("total_non_current_liabilities"),
    Column::numeric("total_shareholder_equity"),
    Column::numeric("short_term_debt"),
    Column::numeric("long_term_debt"),
    Column::numeric("retained_earnings"),
    Column::numeric("cash_and_cash_equivalents"),
];

const CASH_REQUIRED: &[&str] = &[
    "fiscalDateEnding",
    "reportedCurrency",
    "operatingCashflow",
    "paymentsForOperatingActivities",
    "proceedsFromOperatingActivities",
    "changeInOperatingLiabilities",
    "changeInOperatingAssets",
    "depreciationDepletionAndAmortization",
    "capitalExpenditures",
    "changeInReceivables",
    "changeInInventory",
    "profitLoss",
    "cashflowFromInvestment",
    "cashflowFromFinancing",
    "proceedsFromRepaymentsOfShortTermDebt",
    "paymentsForRepurchaseOfCommonStock",
    "paymentsForRepurchaseOfEquity",
    "paymentsForRepurchaseOfPreferredStock",
    "dividendPayout",
    "dividendPayoutCommonStock",
    "dividendPayoutPreferredStock",
    "proceedsFromIssuanceOfCommonStock",
    "proceedsFromIssuanceOfLongTermDebtAndCapitalSecuritiesNet",
    "proceedsFromIssuanceOfPreferredStock",
    "proceedsFromRepurchaseOfEquity",
    "proceedsFromSaleOfTreasuryStock",
    "changeInCashAndCashEquivalents",
    "changeInExchangeRate",
    "netIncome",
];

const CASH_RENAMES: &[(&str, &str)] = &[
    ("fiscalDateEnding", "fiscal_date_ending"),
    ("reportedCurrency", "reported_currency"),
    ("operatingCashflow", "operating_cashflow"),
    ("paymentsForOperatingActivities", "payments_for_operating_activities"),
    ("proceedsFromOperatingActivities", "proceeds_from_operating_activities"),
    ("changeInOperatingLiabilities", "change_in_operating_liabilities"),
    ("changeInOperatingAssets", "change_in_operating_assets"),
    ("depreciationDepletionAndAmortization", "depreciation_depletion_and_amortization"),
    ("capitalExpenditures", "capital_expenditures"),
    ("changeInReceivables", "change_in_receivables"),
    ("changeInInventory", "change_in_inventory"),
    ("profitLoss", "profit_loss"),
    ("cashflowFromInvestment", "cashflow_from_investment"),
    ("cashflowFromFinancing", "cashflow_from_financing"),
    ("proceedsFromRepaymentsOfShortTermDebt", "debt_repayments"),
    ("paymentsForRepurchaseOfCommonStock", "payments_for_repurchase_of_common_stock"),
    ("paymentsForRepurchaseOfEquity", "payments_for_repurchase_of_equity"),
    ("paymentsForRepurchaseOfPreferredStock", "payments_for_repurchase_of_preferred_stock"),
    ("dividendPayout", "dividend_payout"),
    ("dividendPayoutCommonStock", "dividend_payout_common_stock"),
    ("dividendPayoutPreferredStock", "dividend_payout_preferred_stock"),
    ("proceedsFromIssuanceOfCommonStock", "proceeds_from_issuance_of_common_stock"),
    (
        "proceedsFromIssuanceOfLongTermDebtAndCapitalSecuritiesNet",
        "proceeds_from_issuance_of_long_term_debt_and_capital_securities_net",
    ),
    ("proceedsFromIssuanceOfPreferredStock", "proceeds_from_issuance_of_preferred_stock"),
    ("proceedsFromRepurchaseOfEquity", "proceeds_from_repurchase_of_equity"),
    ("proceedsFromSaleOfTreasuryStock", "proceeds_from_sale_of_treasury_stock"),
    ("changeInCashAndCashEquivalents", "change_in_cash_and_cash_equivalents"),
    ("changeInExchangeRate", "change_in_exchange_rate"),
    ("netIncome", "net_income"),
];

const CASH_COLUMNS: &[Column] = &[
    Column::date("fiscal_date_ending"),
    Column::numeric("operating_cashflow"),
    Column::numeric("capital_expenditures"),
    Column::numeric("cashflow_from_investment"),
    Column::numeric("cashflow_from_financing"),
    Column::numeric("dividend_payout"),
    Column::numeric("debt_repayments"),
];

const CASH_DERIVED: &[DerivedColumn] = &[DerivedColumn {
    name: "free_cashflow",
    derivation: Derivation::Difference {
        minuend: "operating_cashflow",
        subtrahend: "capital_expenditures",
    },
}];
