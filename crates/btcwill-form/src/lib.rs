//! btcwill form engine
//!
//! In-memory model of the Bitcoin will wizard: field catalogue, repeatable
//! sections (wallets, exchanges, beneficiaries, trusted contacts), the step
//! controller with visibility-aware validation, and the mapping between the
//! form and the JSON payload the backend expects.
//!
//! # Flow
//!
//! ```
//! use btcwill_form::{Group, StepLayout, ValidationPolicy, Wizard, WizardMode};
//!
//! let mut wizard = Wizard::new(StepLayout::FourPanel, ValidationPolicy::default());
//! wizard.open(WizardMode::Create);
//! assert_eq!(wizard.current_step(), 1);
//! assert_eq!(wizard.form().section(Group::Wallets).len(), 1);
//! ```

pub mod extract;
pub mod fields;
pub mod form;
pub mod payload;
pub mod populate;
pub mod section;
pub mod session;
pub mod wizard;

pub use extract::{extract, parse_percentage};
pub use fields::{FieldKind, FieldSet, FieldSpec};
pub use form::WillForm;
pub use payload::{
    Address, Assets, Beneficiaries, Beneficiary, Exchange, Instructions, PersonalInfo,
    ReviewSummary, TrustedContact, Wallet, WillPayload, WillRecord,
};
pub use populate::populate;
pub use section::{Entry, EntryId, Group, Section};
pub use session::SessionWillData;
pub use wizard::{
    FieldRef, NavState, StepLayout, Submission, SubmitTarget, ValidationError, ValidationPolicy,
    Wizard, WizardError, WizardMode,
};

use thiserror::Error;

/// Errors from direct form manipulation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid option '{value}' for field {field}")]
    InvalidOption { field: &'static str, value: String },

    #[error("Entry not found")]
    EntryNotFound,

    #[error("Invalid will record: {0}")]
    InvalidRecord(String),
}
