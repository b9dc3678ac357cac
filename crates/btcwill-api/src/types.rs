//! Request and response bodies

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account profile, persisted next to the token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Serialize)]
pub(crate) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct PlanRequest<'a> {
    pub plan_type: &'a str,
}

#[derive(Serialize)]
pub(crate) struct VerifyRequest<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub plan_name: Option<String>,
    /// End of the paid period (unix seconds)
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

impl SubscriptionStatus {
    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Hosted Stripe checkout
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
}

/// Hosted BTCPay invoice
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BtcpayInvoice {
    pub invoice_url: String,
}

/// Billing portal for an existing subscription
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PortalSession {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaymentVerification {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// One row of `GET /will/list`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WillSummary {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub testator_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl WillSummary {
    /// Creation date, accepting RFC 3339 or a zone-less ISO timestamp
    pub fn created_date(&self) -> Option<NaiveDate> {
        let raw = self.created_at.as_deref()?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.date_naive());
        }
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(ts.date());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

/// Response to create/update
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WillSaved {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// File name for a downloaded will: `bitcoin_will_{id}_{YYYY-MM-DD}.pdf`
pub fn pdf_filename(id: u64, date: NaiveDate) -> String {
    format!("bitcoin_will_{}_{}.pdf", id, date.format("%Y-%m-%d"))
}
