//! Wire schema of a will
//!
//! [`WillPayload`] is what the backend receives on create/update. [`WillRecord`]
//! is what it sends back for editing: the same shape, but every section is
//! optional and parsing is lenient about how older records were stored.

use crate::FormError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use zeroize::Zeroize;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Zeroize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Zeroize)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub date_of_birth: String,
    pub phone: String,
    pub executor_name: String,
    pub executor_contact: String,
    pub address: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Zeroize)]
#[serde(default)]
pub struct Wallet {
    pub name: String,
    #[serde(rename = "type")]
    pub wallet_type: String,
    pub description: String,
    pub access_method: String,
    pub seed_phrase_location: String,
    pub private_key_location: String,
    pub additional_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Zeroize)]
#[serde(default)]
pub struct Exchange {
    pub name: String,
    pub username: String,
    pub email: String,
    pub two_factor_backup: String,
    pub additional_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Zeroize)]
#[serde(default)]
pub struct Assets {
    pub wallets: Vec<Wallet>,
    pub exchanges: Vec<Exchange>,
    pub storage_method: String,
    pub storage_location: String,
    pub storage_details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Zeroize)]
#[serde(default)]
pub struct Beneficiary {
    pub name: String,
    pub relationship: String,
    /// Share of assets in percent
    #[serde(deserialize_with = "lenient_percentage")]
    pub percentage: f64,
    pub phone: String,
    pub email: String,
    pub bitcoin_address: String,
    pub address: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Zeroize)]
#[serde(default)]
pub struct Beneficiaries {
    pub primary: Vec<Beneficiary>,
    pub contingent: Vec<Beneficiary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Zeroize)]
#[serde(default)]
pub struct TrustedContact {
    pub name: String,
    pub contact: String,
    pub relationship: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Zeroize)]
#[serde(default)]
pub struct Instructions {
    pub access_instructions: String,
    pub security_notes: String,
    pub additional_instructions: String,
    pub emergency_contact: String,
    pub trusted_contacts: Vec<TrustedContact>,
}

/// Body of `POST /will/create` and `PUT /will/:id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Zeroize)]
pub struct WillPayload {
    pub personal_info: PersonalInfo,
    pub assets: Assets,
    pub beneficiaries: Beneficiaries,
    pub instructions: Instructions,
}

impl WillPayload {
    /// Sum of primary beneficiary percentages
    pub fn primary_total(&self) -> f64 {
        self.beneficiaries.primary.iter().map(|b| b.percentage).sum()
    }

    /// Counts shown on the review panel
    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary {
            testator: self.personal_info.full_name.clone(),
            executor: self.personal_info.executor_name.clone(),
            wallets: self.assets.wallets.len(),
            exchanges: self.assets.exchanges.len(),
            primary_beneficiaries: self.beneficiaries.primary.len(),
            contingent_beneficiaries: self.beneficiaries.contingent.len(),
            primary_total: self.primary_total(),
            trusted_contacts: self.instructions.trusted_contacts.len(),
        }
    }
}

/// Condensed view of a payload for the review-and-submit step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSummary {
    pub testator: String,
    pub executor: String,
    pub wallets: usize,
    pub exchanges: usize,
    pub primary_beneficiaries: usize,
    pub contingent_beneficiaries: usize,
    pub primary_total: f64,
    pub trusted_contacts: usize,
}

// ============================================================================
// Incoming records
// ============================================================================

/// A previously saved will as returned by `GET /will/:id`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WillRecord {
    #[serde(default)]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default, alias = "bitcoin_assets")]
    pub assets: Option<Assets>,
    #[serde(default)]
    pub beneficiaries: Option<Beneficiaries>,
    #[serde(default)]
    pub instructions: Option<Instructions>,
}

const SECTIONS: &[&str] = &[
    "personal_info",
    "assets",
    "bitcoin_assets",
    "beneficiaries",
    "instructions",
];

impl WillRecord {
    /// Parse a record from JSON text
    pub fn from_json(text: &str) -> Result<Self, FormError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| FormError::InvalidRecord(e.to_string()))?;
        Self::from_value(value)
    }

    /// Parse a record from an already decoded JSON value.
    ///
    /// Sections stored as JSON text are decoded first, and `null` values are
    /// treated as absent.
    pub fn from_value(mut value: Value) -> Result<Self, FormError> {
        let Some(map) = value.as_object_mut() else {
            return Err(FormError::InvalidRecord("expected a JSON object".into()));
        };

        for key in SECTIONS {
            let parsed = match map.get(*key) {
                Some(Value::String(text)) => serde_json::from_str::<Value>(text).map_err(|e| {
                    FormError::InvalidRecord(format!("{key} is not valid JSON: {e}"))
                })?,
                _ => continue,
            };
            map.insert((*key).to_string(), parsed);
        }
        strip_nulls(&mut value);

        serde_json::from_value(value).map_err(|e| FormError::InvalidRecord(e.to_string()))
    }
}

impl From<WillPayload> for WillRecord {
    fn from(payload: WillPayload) -> Self {
        Self {
            personal_info: Some(payload.personal_info),
            assets: Some(payload.assets),
            beneficiaries: Some(payload.beneficiaries),
            instructions: Some(payload.instructions),
        }
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// Accept a number or a numeric string; anything unparseable becomes 0
fn lenient_percentage<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => crate::extract::parse_percentage(&s),
        _ => 0.0,
    })
}
