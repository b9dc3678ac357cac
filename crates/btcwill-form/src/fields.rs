//! Field descriptors and value storage
//!
//! Every input of the will form is described once, statically. A [`FieldSet`]
//! holds the current values for one list of descriptors (a scalar block such as
//! personal information, or a single repeatable entry).

use crate::FormError;
use zeroize::Zeroize;

/// Input kind, used by renderers and for option checking on write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Date,
    Number,
    TextArea,
    Select(&'static [&'static str]),
}

/// Static description of one named input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Form name (stable key used by lookups)
    pub name: &'static str,
    /// Human-readable label
    pub label: &'static str,
    pub kind: FieldKind,
    /// Must be non-blank (after trimming) for the step to validate
    pub required: bool,
}

const fn field(
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    required: bool,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required,
    }
}

pub const WALLET_TYPES: &[&str] = &["hardware", "software", "paper", "mobile", "web"];

// ============================================================================
// Scalar blocks
// ============================================================================

pub const PERSONAL_FIELDS: &[FieldSpec] = &[
    field("fullName", "Full Legal Name", FieldKind::Text, true),
    field("dateOfBirth", "Date of Birth", FieldKind::Date, true),
    field("phone", "Phone Number", FieldKind::Tel, false),
    field("executorName", "Executor Name", FieldKind::Text, true),
    field("executorContact", "Executor Contact", FieldKind::Text, true),
    field("street", "Street Address", FieldKind::Text, false),
    field("city", "City", FieldKind::Text, false),
    field("state", "State/Province", FieldKind::Text, false),
    field("zipCode", "ZIP/Postal Code", FieldKind::Text, false),
    field("country", "Country", FieldKind::Text, false),
];

pub const STORAGE_FIELDS: &[FieldSpec] = &[
    field("storageMethod", "Storage Method", FieldKind::Text, false),
    field("storageLocation", "Storage Location", FieldKind::Text, false),
    field("storageDetails", "Storage Details", FieldKind::TextArea, false),
];

pub const INSTRUCTION_FIELDS: &[FieldSpec] = &[
    field(
        "accessInstructions",
        "Access Instructions",
        FieldKind::TextArea,
        true,
    ),
    field("securityNotes", "Security Notes", FieldKind::TextArea, false),
    field(
        "additionalInstructions",
        "Additional Instructions",
        FieldKind::TextArea,
        false,
    ),
    field("emergencyContact", "Emergency Contact", FieldKind::Text, false),
];

// ============================================================================
// Repeatable entries
// ============================================================================

pub const WALLET_FIELDS: &[FieldSpec] = &[
    field("walletName", "Wallet Name", FieldKind::Text, true),
    field(
        "walletType",
        "Wallet Type",
        FieldKind::Select(WALLET_TYPES),
        true,
    ),
    field("walletDescription", "Description", FieldKind::TextArea, false),
    field("accessMethod", "Access Method", FieldKind::TextArea, true),
    field(
        "seedPhraseLocation",
        "Seed Phrase Location",
        FieldKind::Text,
        false,
    ),
    field(
        "privateKeyLocation",
        "Private Key Location",
        FieldKind::Text,
        false,
    ),
    field("walletNotes", "Additional Notes", FieldKind::TextArea, false),
];

pub const EXCHANGE_FIELDS: &[FieldSpec] = &[
    field("exchangeName", "Exchange Name", FieldKind::Text, true),
    field(
        "exchangeUsername",
        "Username/Account ID",
        FieldKind::Text,
        true,
    ),
    field("exchangeEmail", "Email Address", FieldKind::Email, false),
    field("twoFactorBackup", "2FA Backup Location", FieldKind::Text, false),
    field("exchangeNotes", "Additional Notes", FieldKind::TextArea, false),
];

pub const BENEFICIARY_FIELDS: &[FieldSpec] = &[
    field("beneficiaryName", "Full Name", FieldKind::Text, true),
    field(
        "beneficiaryRelationship",
        "Relationship",
        FieldKind::Text,
        true,
    ),
    field(
        "beneficiaryPercentage",
        "Percentage of Assets",
        FieldKind::Number,
        true,
    ),
    field("beneficiaryPhone", "Phone Number", FieldKind::Tel, false),
    field("beneficiaryEmail", "Email Address", FieldKind::Email, false),
    field(
        "beneficiaryBitcoinAddress",
        "Bitcoin Address (optional)",
        FieldKind::Text,
        false,
    ),
    field("beneficiaryStreet", "Street Address", FieldKind::Text, false),
    field("beneficiaryCity", "City", FieldKind::Text, false),
    field("beneficiaryState", "State/Province", FieldKind::Text, false),
    field("beneficiaryZip", "ZIP/Postal Code", FieldKind::Text, false),
    field("beneficiaryCountry", "Country", FieldKind::Text, false),
];

pub const CONTACT_FIELDS: &[FieldSpec] = &[
    field("contactName", "Name", FieldKind::Text, true),
    field("contactInfo", "Contact Information", FieldKind::Text, true),
    field("contactRelationship", "Relationship", FieldKind::Text, false),
    field("contactRole", "Role/Expertise", FieldKind::Text, false),
];

// ============================================================================
// FieldSet
// ============================================================================

/// Current values for a fixed list of field descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    specs: &'static [FieldSpec],
    values: Vec<String>,
}

impl FieldSet {
    /// Create an all-empty set
    pub fn new(specs: &'static [FieldSpec]) -> Self {
        Self {
            specs,
            values: vec![String::new(); specs.len()],
        }
    }

    pub fn specs(&self) -> &'static [FieldSpec] {
        self.specs
    }

    /// Descriptor for `name`, if this set has it
    pub fn spec(&self, name: &str) -> Option<&'static FieldSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }

    /// Current value; unknown names read as empty
    pub fn get(&self, name: &str) -> &str {
        self.position(name)
            .map(|i| self.values[i].as_str())
            .unwrap_or("")
    }

    /// Write a value. Select fields only accept one of their options or "".
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        let idx = self
            .position(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        let value = value.into();

        if let FieldKind::Select(options) = self.specs[idx].kind {
            if !value.is_empty() && !options.contains(&value.as_str()) {
                return Err(FormError::InvalidOption {
                    field: self.specs[idx].name,
                    value,
                });
            }
        }

        self.values[idx].zeroize();
        self.values[idx] = value;
        Ok(())
    }

    /// Write only when `value` is non-empty, leaving the field untouched otherwise
    pub fn set_if_present(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        if value.is_empty() {
            return Ok(());
        }
        self.set(name, value)
    }

    /// True if every value is blank after trimming
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }

    /// Names of required fields that are blank after trimming
    pub fn missing_required(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs
            .iter()
            .zip(self.values.iter())
            .filter(|(spec, value)| spec.required && value.trim().is_empty())
            .map(|(spec, _)| spec.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, &str)> + '_ {
        self.specs
            .iter()
            .zip(self.values.iter().map(String::as_str))
    }

    /// Zero and empty every value
    pub fn clear(&mut self) {
        for value in &mut self.values {
            value.zeroize();
        }
    }
}

impl Drop for FieldSet {
    fn drop(&mut self) {
        self.clear();
    }
}
