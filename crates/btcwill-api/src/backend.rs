//! The seam between the application and the backend

use crate::error::ApiError;
use crate::types::{
    AuthResponse, BtcpayInvoice, CheckoutSession, PaymentVerification, PortalSession,
    SubscriptionStatus, User, WillSaved, WillSummary,
};
use btcwill_form::{WillPayload, WillRecord};

/// Everything the application needs from the will backend.
///
/// [`crate::ApiClient`] implements this over HTTP; tests substitute an
/// in-memory fake.
#[allow(async_fn_in_trait)]
pub trait WillBackend {
    /// Install or drop the bearer token used for authenticated calls
    fn set_token(&mut self, token: Option<&str>);

    fn has_token(&self) -> bool;

    // Auth
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;
    async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;
    async fn me(&self) -> Result<User, ApiError>;

    // Subscription
    async fn subscription_status(&self) -> Result<SubscriptionStatus, ApiError>;
    async fn create_checkout_session(&self, plan: &str) -> Result<CheckoutSession, ApiError>;
    async fn create_btcpay_invoice(&self, plan: &str) -> Result<BtcpayInvoice, ApiError>;
    async fn manage_subscription(&self) -> Result<PortalSession, ApiError>;
    async fn verify_payment(&self, session_id: &str) -> Result<PaymentVerification, ApiError>;

    // Wills
    async fn list_wills(&self) -> Result<Vec<WillSummary>, ApiError>;
    async fn create_will(&self, payload: &WillPayload) -> Result<WillSaved, ApiError>;
    /// Render a PDF without storing the will server-side
    async fn generate_session_will(&self, payload: &WillPayload) -> Result<Vec<u8>, ApiError>;
    async fn get_will(&self, id: u64) -> Result<WillRecord, ApiError>;
    async fn update_will(&self, id: u64, payload: &WillPayload) -> Result<WillSaved, ApiError>;
    async fn delete_will(&self, id: u64) -> Result<(), ApiError>;
    async fn download_will(&self, id: u64) -> Result<Vec<u8>, ApiError>;
}
