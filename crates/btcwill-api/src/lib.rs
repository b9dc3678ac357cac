//! btcwill backend client
//!
//! Async REST client for the will backend (auth, subscription billing, will
//! CRUD, PDF download), the [`WillBackend`] trait the application layer is
//! generic over, and the on-disk store for the session token.
//!
//! Every call is one request with no retry. A request without a configured
//! timeout waits as long as the server does.

pub mod backend;
pub mod client;
pub mod error;
pub mod store;
pub mod types;

pub use backend::WillBackend;
pub use client::ApiClient;
pub use error::ApiError;
pub use store::{StoreError, StoredSession, TokenStore};
pub use types::{
    pdf_filename, AuthResponse, BtcpayInvoice, CheckoutSession, PaymentVerification,
    PortalSession, SubscriptionStatus, User, WillSaved, WillSummary,
};
