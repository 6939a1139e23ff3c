//! Data models for the portfolio dashboard.
//!
//! These mirror the JSON payloads served by the portfolio backend. The
//! backend quotes most numeric fields as strings, so numbers are decoded
//! leniently: a missing, null, empty or unparseable value becomes `0.0`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lenient decoders for loosely typed backend fields.
pub(crate) mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Interpret a JSON value as a finite float.
    pub fn parse(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(parse).unwrap_or(0.0))
    }

    pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(parse))
    }

    /// Whole-number counters; negative and fractional inputs are clamped/rounded.
    pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        let n = value.as_ref().and_then(parse).unwrap_or(0.0);
        Ok(if n > 0.0 { n.round() as u64 } else { 0 })
    }

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = text(deserializer)?;
        Ok(if value.trim().is_empty() { None } else { Some(value) })
    }

    /// An object that is absent, null or `{}` decodes to `None`.
    pub fn non_empty<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Object(map)) if map.is_empty() => Ok(None),
            Some(Value::Null) | None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Parse the timestamp formats the backend is known to emit.
///
/// Date-only values resolve to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    const DATETIME_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Aggregate portfolio totals from `/api/portfolio/summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_equity: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_market_value: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_positions: u64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_dividends: f64,
}

/// A single ticker position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub percent_change: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub market_value: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub equity: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub average_buy_price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_return_today: f64,
    #[serde(
        default,
        deserialize_with = "lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub pe_ratio: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub dividend_yield: Option<f64>,
}

/// Holdings keyed by ticker symbol.
pub type Holdings = BTreeMap<String, Holding>;

/// Payment state of a dividend record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DividendState {
    Paid,
    Pending,
    Other(String),
}

impl From<&str> for DividendState {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "paid" | "reinvested" => DividendState::Paid,
            "pending" => DividendState::Pending,
            _ => DividendState::Other(s.trim().to_string()),
        }
    }
}

impl fmt::Display for DividendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DividendState::Paid => write!(f, "Paid"),
            DividendState::Pending => write!(f, "Pending"),
            DividendState::Other(state) if state.is_empty() => write!(f, "Unknown"),
            DividendState::Other(state) => write!(f, "{}", state),
        }
    }
}

/// A dividend payment or pending-payment entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rate: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub position: f64,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub paid_at: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub payable_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub record_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub state: String,
}

impl Dividend {
    pub fn status(&self) -> DividendState {
        DividendState::from(self.state.as_str())
    }

    /// Payment date, falling back to the payable date for unpaid entries.
    pub fn effective_date(&self) -> Option<&str> {
        self.paid_at.as_deref().or(self.payable_date.as_deref())
    }
}

/// Direction of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
            OrderSide::Unknown => write!(f, "N/A"),
        }
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderState {
    Queued,
    Confirmed,
    Filled,
    Cancelled,
    Other(String),
}

impl From<&str> for OrderState {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "queued" | "unconfirmed" => OrderState::Queued,
            "confirmed" | "partially_filled" => OrderState::Confirmed,
            "filled" => OrderState::Filled,
            "cancelled" | "canceled" => OrderState::Cancelled,
            other => OrderState::Other(other.to_string()),
        }
    }
}

impl OrderState {
    /// Marker used next to the state in text listings.
    pub fn marker(&self) -> &'static str {
        match self {
            OrderState::Filled => "🟢",
            OrderState::Cancelled => "🔴",
            OrderState::Queued | OrderState::Confirmed => "🟡",
            OrderState::Other(_) => "⚪",
        }
    }
}

/// A single buy/sell order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub symbol: String,
    #[serde(default)]
    pub side: OrderSide,
    #[serde(default, rename = "type", deserialize_with = "lenient::text")]
    pub order_type: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub state: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub time_in_force: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub executed_at: Option<String>,
}

impl Order {
    pub fn status(&self) -> OrderState {
        OrderState::from(self.state.as_str())
    }

    /// Notional value of the order (price times quantity).
    pub fn total(&self) -> f64 {
        self.price * self.quantity
    }
}

/// Brokerage account balances from `/api/account/info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default, deserialize_with = "lenient::text")]
    pub account_number: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub buying_power: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cash: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sma: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_value: f64,
}

/// Profile details from `/api/user/info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: String,
}

impl UserInfo {
    /// Full name when both parts are known, otherwise the username.
    pub fn display_name(&self) -> String {
        if !self.first_name.is_empty() && !self.last_name.is_empty() {
            format!("{} {}", self.first_name, self.last_name)
        } else {
            self.username.clone()
        }
    }

    /// Avatar initial: first name, then username, then `U`.
    pub fn initial(&self) -> char {
        self.first_name
            .chars()
            .next()
            .or_else(|| self.username.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// The holding snapshot embedded in a stock analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisHolding {
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub market_value: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub average_buy_price: f64,
}

/// Trading metrics the backend derives from a symbol's order history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradingMetrics {
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_bought_quantity: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_sold_quantity: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub net_quantity: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_orders: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub buy_orders: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub sell_orders: u64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub calculated_avg_price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_dividend_amount: f64,
}

/// Per-symbol analysis from `/api/stock/{symbol}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockAnalysis {
    #[serde(default, deserialize_with = "lenient::text")]
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient::non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_holding: Option<AnalysisHolding>,
    #[serde(
        default,
        deserialize_with = "lenient::non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub metrics: Option<TradingMetrics>,
    #[serde(default, alias = "recent_orders")]
    pub orders: Vec<Order>,
    #[serde(default, alias = "dividend_history")]
    pub dividends: Vec<Dividend>,
}

/// Reply of `/api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Body of `/api/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa_code: Option<String>,
}

/// Credentials as entered on the login screen.
#[derive(Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub mfa_code: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("has_mfa_code", &!self.mfa_code.trim().is_empty())
            .finish()
    }
}

impl LoginForm {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        mfa_code: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mfa_code: mfa_code.into(),
        }
    }

    /// Basic shape checks performed before contacting the backend.
    pub fn validate(&self) -> Result<(), String> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err("Username is required".to_string());
        }
        if self.password.trim().is_empty() {
            return Err("Password is required".to_string());
        }

        if username.contains('@') {
            let mut parts = username.split('@');
            let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
                (Some(local), Some(domain), None) => (local, domain),
                _ => return Err("Invalid email format".to_string()),
            };
            if local.is_empty() || domain.is_empty() {
                return Err("Invalid email format".to_string());
            }
            if !domain.contains('.') {
                return Err("Invalid email domain".to_string());
            }
        }

        if self.password.chars().count() < 6 {
            return Err("Password must be at least 6 characters".to_string());
        }

        Ok(())
    }

    /// Build the request body; a blank MFA code is sent as absent.
    pub fn to_request(&self) -> LoginRequest {
        let mfa = self.mfa_code.trim();
        LoginRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            mfa_code: if mfa.is_empty() {
                None
            } else {
                Some(mfa.to_string())
            },
        }
    }
}
