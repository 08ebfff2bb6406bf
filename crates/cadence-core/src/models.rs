//! Domain models for Cadence

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An account that transactions belong to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub date: NaiveDate,
    pub description: String,
    /// Negative = expense, positive = income
    pub amount: f64,
    /// Normalized merchant name used as the grouping key
    pub merchant_normalized: Option<String>,
    /// Hash for deduplication
    pub import_hash: String,
    /// Whether this transaction is archived (excluded from analysis)
    pub archived: bool,
    /// Transfers between own accounts are excluded from analysis
    pub is_transfer: bool,
    pub created_at: DateTime<Utc>,
}

/// A new transaction to be imported (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub merchant_normalized: Option<String>,
    pub import_hash: String,
    pub is_transfer: bool,
}

/// A single observed charge within a recurring series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occurrence {
    pub date: NaiveDate,
    /// Absolute charge amount
    pub amount: f64,
}

/// One grouping key's ordered charge history, assembled per analysis run
#[derive(Debug, Clone)]
pub struct OccurrenceSeries {
    pub merchant: String,
    pub account_id: i64,
    /// Sorted ascending by date
    pub occurrences: Vec<Occurrence>,
}

impl OccurrenceSeries {
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.occurrences.iter().map(|o| o.date).collect()
    }

    pub fn amounts(&self) -> Vec<f64> {
        self.occurrences.iter().map(|o| o.amount).collect()
    }
}

/// Recurring billing frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
    /// Cadence could not be pinned to a named bucket
    Irregular,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::SemiAnnual => "semi_annual",
            Self::Annual => "annual",
            Self::Irregular => "irregular",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "semi_annual" | "semiannual" => Ok(Self::SemiAnnual),
            "annual" | "yearly" => Ok(Self::Annual),
            "irregular" => Ok(Self::Irregular),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of pattern a suggestion describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// A named billing cadence (monthly, weekly, ...)
    Recurring(Frequency),
    /// The merchant recurs but no cadence was consistent enough to name
    RecurringMerchant,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recurring(f) => f.as_str(),
            Self::RecurringMerchant => "recurring_merchant",
        }
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("recurring_merchant") {
            return Ok(Self::RecurringMerchant);
        }
        s.parse::<Frequency>().map(Self::Recurring)
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a detected-pattern suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternStatus {
    Pending,
    Accepted,
    Rejected,
    /// Unresolved past the retention window
    Expired,
}

impl PatternStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl std::str::FromStr for PatternStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            _ => Err(format!("Unknown pattern status: {}", s)),
        }
    }
}

impl std::fmt::Display for PatternStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted recurring-charge suggestion awaiting human review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub id: i64,
    pub merchant: String,
    pub account_id: i64,
    pub pattern_type: PatternType,
    /// 0..1, from the billing-pattern matcher
    pub confidence_score: f64,
    /// Average observed gap in days
    pub interval_days: Option<f64>,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
    pub amount_avg: Option<f64>,
    pub occurrence_count: i64,
    /// Dominant calendar day (1-31), if one was detected
    pub typical_day_of_month: Option<u32>,
    /// Dominant weekday (0=Sunday..6=Saturday), if one was detected
    pub typical_weekday: Option<u32>,
    pub first_occurrence: Option<NaiveDate>,
    pub last_occurrence: Option<NaiveDate>,
    pub next_expected: Option<NaiveDate>,
    pub status: PatternStatus,
    /// When the user accepted/rejected (or the pattern expired)
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A freshly computed pattern candidate, before persistence
#[derive(Debug, Clone)]
pub struct NewDetectedPattern {
    pub merchant: String,
    pub account_id: i64,
    pub pattern_type: PatternType,
    pub confidence_score: f64,
    pub interval_days: Option<f64>,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
    pub amount_avg: Option<f64>,
    pub occurrence_count: i64,
    pub typical_day_of_month: Option<u32>,
    pub typical_weekday: Option<u32>,
    pub first_occurrence: Option<NaiveDate>,
    pub last_occurrence: Option<NaiveDate>,
    pub next_expected: Option<NaiveDate>,
}

/// Direction of a price change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceChangeType {
    Increase,
    Decrease,
}

impl PriceChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

impl std::str::FromStr for PriceChangeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "increase" => Ok(Self::Increase),
            "decrease" => Ok(Self::Decrease),
            _ => Err(format!("Unknown price change type: {}", s)),
        }
    }
}

impl std::fmt::Display for PriceChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An append-only record of an amount change in a recognized series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChangeEvent {
    pub id: i64,
    pub merchant: String,
    pub account_id: i64,
    /// The pattern this series belongs to, when known
    pub pattern_id: Option<i64>,
    pub previous_amount: f64,
    pub new_amount: f64,
    pub effective_date: NaiveDate,
    pub change_type: PriceChangeType,
    /// Signed percentage relative to the previous amount
    pub change_percentage: f64,
    pub created_at: DateTime<Utc>,
}

/// Types of alerts the emitter produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A new high-confidence pattern was detected
    NewPattern,
    /// A recognized series changed price beyond the alerting threshold
    PriceChange,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewPattern => "new_pattern",
            Self::PriceChange => "price_change",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NewPattern => "Recurring Charge Detected",
            Self::PriceChange => "Price Change",
        }
    }
}

impl std::str::FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new_pattern" => Ok(Self::NewPattern),
            "price_change" => Ok(Self::PriceChange),
            _ => Err(format!("Unknown alert kind: {}", s)),
        }
    }
}

/// Alert lifecycle. Terminal once dismissed or actioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    New,
    Dismissed,
    Actioned,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Dismissed => "dismissed",
            Self::Actioned => "actioned",
        }
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "dismissed" => Ok(Self::Dismissed),
            "actioned" => Ok(Self::Actioned),
            _ => Err(format!("Unknown alert status: {}", s)),
        }
    }
}

/// A reviewable notification derived from a pattern or price event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub kind: AlertKind,
    pub pattern_id: Option<i64>,
    pub price_event_id: Option<i64>,
    pub message: Option<String>,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A user's correction of a prediction, consumed by external recalibration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionFeedback {
    pub id: i64,
    pub pattern_id: i64,
    pub original_date: Option<NaiveDate>,
    pub original_amount: Option<f64>,
    pub original_confidence: Option<f64>,
    pub corrected_date: Option<NaiveDate>,
    pub corrected_amount: Option<f64>,
    pub was_accurate: bool,
    /// Optional 1-5 rating of the prediction
    pub rating: Option<i32>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// New feedback record for creation
#[derive(Debug, Clone)]
pub struct NewPredictionFeedback {
    pub pattern_id: i64,
    pub original_date: Option<NaiveDate>,
    pub original_amount: Option<f64>,
    pub original_confidence: Option<f64>,
    pub corrected_date: Option<NaiveDate>,
    pub corrected_amount: Option<f64>,
    pub was_accurate: bool,
    pub rating: Option<i32>,
    pub note: Option<String>,
}
