use btcwill_api::{ApiError, StoreError};
use btcwill_form::WizardError;
use thiserror::Error;

/// Errors from application flows
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session storage error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Please subscribe to create Bitcoin wills")]
    SubscriptionRequired,

    #[error("Please select a plan first")]
    NoPlanSelected,

    #[error("Deleting a will requires confirmation")]
    ConfirmationRequired,

    #[error("Unknown payment method: {0} (expected stripe or btcpay)")]
    UnknownPaymentMethod(String),
}
