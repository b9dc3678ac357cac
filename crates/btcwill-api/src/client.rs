//! HTTP implementation of [`WillBackend`]

use crate::backend::WillBackend;
use crate::error::ApiError;
use crate::types::{
    AuthResponse, BtcpayInvoice, CheckoutSession, Credentials, PaymentVerification, PlanRequest,
    PortalSession, SubscriptionStatus, User, VerifyRequest, WillSaved, WillSummary,
};
use btcwill_form::{WillPayload, WillRecord};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use zeroize::Zeroizing;

/// REST client for the will backend
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `https://api.example.com/api`).
    ///
    /// Without a timeout a hung request waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(concat!("btcwill/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, auth: bool) -> Result<RequestBuilder, ApiError> {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if !auth {
            return Ok(builder);
        }
        let token = self.token.as_ref().ok_or(ApiError::NotAuthenticated)?;
        Ok(builder.bearer_auth(token.as_str()))
    }

    /// Send and return the raw body of a 2xx response
    async fn send(&self, request: RequestBuilder, path: &str, auth: bool) -> Result<Vec<u8>, ApiError> {
        log::debug!("Calling {}", path);
        let response = request.send().await.map_err(|e| {
            log::error!("Request to {} failed: {}", path, e);
            ApiError::Network(e)
        })?;

        let status = response.status();
        let body = response.bytes().await?.to_vec();
        if status.is_success() {
            return Ok(body);
        }

        log::warn!("{} returned {}", path, status);
        if auth && status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(&body).unwrap_or_default(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path, true)?;
        parse(&self.send(request, path, true).await?)
    }
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Malformed(e.to_string()))
}

/// Pull a human-readable message out of an error body
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| value.get(key)?.as_str())
        .map(str::to_string)
}

fn non_empty_pdf(body: Vec<u8>) -> Result<Vec<u8>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::Malformed("empty PDF document".into()));
    }
    if !body.starts_with(b"%PDF") {
        log::warn!("Downloaded document does not look like a PDF");
    }
    Ok(body)
}

impl WillBackend for ApiClient {
    fn set_token(&mut self, token: Option<&str>) {
        self.token = token.map(|t| Zeroizing::new(t.to_string()));
    }

    fn has_token(&self) -> bool {
        self.token.is_some()
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let path = "/auth/login";
        let request = self
            .request(Method::POST, path, false)?
            .json(&Credentials { email, password });
        parse(&self.send(request, path, false).await?)
    }

    async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let path = "/auth/register";
        let request = self
            .request(Method::POST, path, false)?
            .json(&Credentials { email, password });
        parse(&self.send(request, path, false).await?)
    }

    async fn me(&self) -> Result<User, ApiError> {
        self.get_json("/auth/me").await
    }

    async fn subscription_status(&self) -> Result<SubscriptionStatus, ApiError> {
        self.get_json("/subscription/status").await
    }

    async fn create_checkout_session(&self, plan: &str) -> Result<CheckoutSession, ApiError> {
        let path = "/subscription/create-checkout-session";
        let request = self
            .request(Method::POST, path, true)?
            .json(&PlanRequest { plan_type: plan });
        parse(&self.send(request, path, true).await?)
    }

    async fn create_btcpay_invoice(&self, plan: &str) -> Result<BtcpayInvoice, ApiError> {
        let path = "/subscription/create-btcpay-invoice";
        let request = self
            .request(Method::POST, path, true)?
            .json(&PlanRequest { plan_type: plan });
        parse(&self.send(request, path, true).await?)
    }

    async fn manage_subscription(&self) -> Result<PortalSession, ApiError> {
        let path = "/subscription/manage";
        let request = self.request(Method::POST, path, true)?;
        parse(&self.send(request, path, true).await?)
    }

    async fn verify_payment(&self, session_id: &str) -> Result<PaymentVerification, ApiError> {
        let path = "/subscription/verify-payment";
        let request = self
            .request(Method::POST, path, true)?
            .json(&VerifyRequest { session_id });
        parse(&self.send(request, path, true).await?)
    }

    async fn list_wills(&self) -> Result<Vec<WillSummary>, ApiError> {
        let value: Value = self.get_json("/will/list").await?;
        // Accept both a bare array and `{"wills": [...]}`
        let list = match value {
            Value::Object(mut map) => map.remove("wills").unwrap_or(Value::Null),
            other => other,
        };
        serde_json::from_value(list).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    async fn create_will(&self, payload: &WillPayload) -> Result<WillSaved, ApiError> {
        let path = "/will/create";
        let request = self.request(Method::POST, path, true)?.json(payload);
        let saved: WillSaved = parse(&self.send(request, path, true).await?)?;
        log::info!("Will created (id {:?})", saved.id);
        Ok(saved)
    }

    async fn generate_session_will(&self, payload: &WillPayload) -> Result<Vec<u8>, ApiError> {
        let path = "/will/generate-session";
        let request = self.request(Method::POST, path, true)?.json(payload);
        non_empty_pdf(self.send(request, path, true).await?)
    }

    async fn get_will(&self, id: u64) -> Result<WillRecord, ApiError> {
        let value: Value = self.get_json(&format!("/will/{}", id)).await?;
        WillRecord::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    async fn update_will(&self, id: u64, payload: &WillPayload) -> Result<WillSaved, ApiError> {
        let path = format!("/will/{}", id);
        let request = self.request(Method::PUT, &path, true)?.json(payload);
        let body = self.send(request, &path, true).await?;
        log::info!("Will {} updated", id);
        // Some deployments answer an update with an empty body
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(WillSaved {
                id: Some(id),
                message: None,
            });
        }
        parse(&body)
    }

    async fn delete_will(&self, id: u64) -> Result<(), ApiError> {
        let path = format!("/will/{}", id);
        let request = self.request(Method::DELETE, &path, true)?;
        self.send(request, &path, true).await?;
        log::info!("Will {} deleted", id);
        Ok(())
    }

    async fn download_will(&self, id: u64) -> Result<Vec<u8>, ApiError> {
        let path = format!("/will/{}/download", id);
        let request = self.request(Method::GET, &path, true)?;
        non_empty_pdf(self.send(request, &path, true).await?)
    }
}
