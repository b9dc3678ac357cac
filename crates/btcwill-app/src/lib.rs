//! btcwill application layer
//!
//! The explicit application-state object that drives authentication,
//! subscription checkout, the will wizard and PDF download over any
//! [`btcwill_api::WillBackend`], plus the client configuration used by the
//! `btcwill` binary.

pub mod app;
pub mod config;
pub mod error;
pub mod notice;

pub use app::{App, AppSettings, PaymentMethod, PaymentReturn, SubmitOutcome, View};
pub use config::ClientConfig;
pub use error::AppError;
pub use notice::{Notice, NoticeLevel};
