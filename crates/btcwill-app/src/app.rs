//! Application state and user flows
//!
//! [`App`] owns everything that lives between user actions: the backend
//! handle, the persisted session, the current view, the will wizard and the
//! session-only payload mirror. It is created once (`new`), the wizard is reset
//! on close (`reset_wizard`), and all of it is torn down on logout (`dispose`).
//!
//! A failing flow logs the error and leaves a [`Notice`] for the user before
//! returning the error to the caller.

use crate::error::AppError;
use crate::notice::Notice;
use btcwill_api::{
    pdf_filename, AuthResponse, StoredSession, SubscriptionStatus, TokenStore, User,
    WillBackend, WillSaved, WillSummary,
};
use btcwill_form::{
    SessionWillData, StepLayout, Submission, SubmitTarget, ValidationPolicy, Wizard, WizardError,
    WizardMode,
};
use chrono::Utc;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Guest,
    Dashboard,
    WillCreator,
    Subscription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Stripe,
    Btcpay,
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stripe" | "card" => Ok(PaymentMethod::Stripe),
            "btcpay" | "bitcoin" => Ok(PaymentMethod::Btcpay),
            _ => Err(AppError::UnknownPaymentMethod(s.to_string())),
        }
    }
}

/// Wizard and submission settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppSettings {
    pub layout: StepLayout,
    pub policy: ValidationPolicy,
    /// Generate the PDF from the session mirror instead of storing the will
    pub session_only: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            layout: StepLayout::FourPanel,
            policy: ValidationPolicy::default(),
            session_only: false,
        }
    }
}

/// Result of a successful will submission
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Stored server-side
    Saved(WillSaved),
    /// Session-only mode: the rendered PDF
    Pdf(Vec<u8>),
}

/// What the payment provider's return URL reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentReturn {
    Success,
    Cancelled,
    Nothing,
}

/// Raise `loading` for the duration of `work`
async fn busy<F: Future>(loading: &mut bool, work: F) -> F::Output {
    *loading = true;
    let output = work.await;
    *loading = false;
    output
}

pub struct App<B: WillBackend> {
    backend: B,
    store: TokenStore,
    session_only: bool,
    view: View,
    user: Option<User>,
    subscription: Option<SubscriptionStatus>,
    wills: Vec<WillSummary>,
    selected_plan: Option<String>,
    wizard: Wizard,
    session_data: SessionWillData,
    notice: Option<Notice>,
    loading: bool,
}

impl<B: WillBackend> App<B> {
    pub fn new(backend: B, store: TokenStore, settings: AppSettings) -> Self {
        Self {
            backend,
            store,
            session_only: settings.session_only,
            view: View::Guest,
            user: None,
            subscription: None,
            wills: Vec::new(),
            selected_plan: None,
            wizard: Wizard::new(settings.layout, settings.policy),
            session_data: SessionWillData::new(),
            notice: None,
            loading: false,
        }
    }

    // ------------------------------------------------------------------
    // State accessors
    // ------------------------------------------------------------------

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.backend.has_token()
    }

    pub fn subscription(&self) -> Option<&SubscriptionStatus> {
        self.subscription.as_ref()
    }

    pub fn wills(&self) -> &[WillSummary] {
        &self.wills
    }

    pub fn selected_plan(&self) -> Option<&str> {
        self.selected_plan.as_deref()
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard {
        &mut self.wizard
    }

    pub fn session_data(&self) -> &SessionWillData {
        &self.session_data
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Dismiss the current notice, returning it
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Log `err`, leave an error notice and hand the error back.
    ///
    /// A rejected token also ends the session.
    fn fail<T>(&mut self, err: impl Into<AppError>, fallback: &str) -> Result<T, AppError> {
        let err = err.into();
        log::error!("{}: {}", fallback, err);

        let message = match &err {
            AppError::Api(api) => api.user_message(fallback),
            AppError::Wizard(WizardError::Validation { source, .. }) => source.to_string(),
            other => other.to_string(),
        };
        if matches!(&err, AppError::Api(api) if api.is_auth_failure()) {
            self.dispose();
        }

        self.notice = Some(Notice::error(message));
        Err(err)
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Resume a saved session if the backend still accepts its token
    pub async fn startup(&mut self) -> View {
        let stored = self.store.load().unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable session file: {}", e);
            StoredSession::default()
        });
        let Some(token) = stored.token else {
            self.view = View::Guest;
            return self.view;
        };

        self.backend.set_token(Some(&token));
        self.user = stored.user;
        match busy(&mut self.loading, self.backend.me()).await {
            Ok(user) => {
                log::info!("Resumed session for {}", user.email);
                self.user = Some(user);
                if let Err(e) = self.load_dashboard().await {
                    log::warn!("Dashboard failed to load: {}", e);
                }
            }
            Err(e) => {
                log::warn!("Saved session is no longer valid: {}", e);
                self.dispose();
            }
        }
        self.view
    }

    fn establish(&mut self, auth: AuthResponse, email: &str) {
        let user = auth.user.unwrap_or_else(|| User {
            email: email.to_string(),
            ..Default::default()
        });
        self.backend.set_token(Some(&auth.access_token));

        let session = StoredSession {
            token: Some(auth.access_token),
            user: Some(user.clone()),
        };
        if let Err(e) = self.store.save(&session) {
            log::warn!("Session will not survive a restart: {}", e);
        }

        self.user = Some(user);
        self.view = View::Dashboard;
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), AppError> {
        match busy(&mut self.loading, self.backend.login(email, password)).await {
            Ok(auth) => {
                self.establish(auth, email);
                log::info!("Logged in as {}", email);
                self.notice = Some(Notice::success(format!("Logged in as {}", email)));
                let _ = self.load_dashboard().await;
                Ok(())
            }
            Err(e) => self.fail(e, "Authentication failed. Please try again."),
        }
    }

    /// Create an account; the password must be typed twice
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), AppError> {
        if password != confirm {
            log::warn!("Registration for {} rejected: passwords do not match", email);
            self.notice = Some(Notice::error(AppError::PasswordMismatch.to_string()));
            return Err(AppError::PasswordMismatch);
        }

        match busy(&mut self.loading, self.backend.register(email, password)).await {
            Ok(auth) => {
                self.establish(auth, email);
                log::info!("Registered {}", email);
                self.notice = Some(Notice::success("Account created. Welcome!"));
                let _ = self.load_dashboard().await;
                Ok(())
            }
            Err(e) => self.fail(e, "Registration failed. Please try again."),
        }
    }

    pub fn logout(&mut self) {
        self.dispose();
        log::info!("Logged out");
        self.notice = Some(Notice::info("You have been logged out."));
    }

    /// Drop every piece of per-user state, including the saved session
    pub fn dispose(&mut self) {
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear saved session: {}", e);
        }
        self.backend.set_token(None);
        self.user = None;
        self.subscription = None;
        self.wills.clear();
        self.selected_plan = None;
        self.wizard.close();
        self.session_data.wipe();
        self.view = View::Guest;
    }

    // ------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------

    /// Fetch subscription status and the will list concurrently
    pub async fn load_dashboard(&mut self) -> Result<(), AppError> {
        if !self.backend.has_token() {
            return self.fail(btcwill_api::ApiError::NotAuthenticated, "Please log in");
        }
        self.view = View::Dashboard;

        let backend = &self.backend;
        let (status, wills) = busy(&mut self.loading, async {
            tokio::join!(backend.subscription_status(), backend.list_wills())
        })
        .await;

        match status {
            Ok(status) => self.subscription = Some(status),
            Err(e) if e.is_auth_failure() => {
                return self.fail(e, "Failed to load subscription status")
            }
            Err(e) => log::error!("Failed to load subscription status: {}", e),
        }

        match wills {
            Ok(wills) => {
                log::debug!("Loaded {} wills", wills.len());
                self.wills = wills;
                Ok(())
            }
            Err(e) => self.fail(e, "Failed to load wills"),
        }
    }

    // ------------------------------------------------------------------
    // Will wizard
    // ------------------------------------------------------------------

    /// Open the wizard in create mode; requires an active subscription
    pub async fn open_creator(&mut self) -> Result<(), AppError> {
        let status = match busy(&mut self.loading, self.backend.subscription_status()).await {
            Ok(status) => status,
            Err(e) => return self.fail(e, "Failed to verify subscription. Please try again."),
        };

        let active = status.active;
        self.subscription = Some(status);
        if !active {
            log::warn!("Will creator blocked: no active subscription");
            self.view = View::Subscription;
            self.notice = Some(Notice::info(AppError::SubscriptionRequired.to_string()));
            return Err(AppError::SubscriptionRequired);
        }

        self.wizard.open(WizardMode::Create);
        self.view = View::WillCreator;
        Ok(())
    }

    /// Load a saved will into the wizard
    pub async fn edit_will(&mut self, id: u64) -> Result<(), AppError> {
        let record = match busy(&mut self.loading, self.backend.get_will(id)).await {
            Ok(record) => record,
            Err(e) => return self.fail(e, "Failed to load will data"),
        };

        self.wizard.open(WizardMode::Edit { record_id: id });
        self.wizard.populate(&record);
        self.view = View::WillCreator;
        log::info!("Editing will {}", id);
        Ok(())
    }

    /// Close the wizard, discarding its contents
    pub fn reset_wizard(&mut self) {
        self.wizard.close();
        self.view = if self.backend.has_token() {
            View::Dashboard
        } else {
            View::Guest
        };
    }

    /// Validate, extract and send the will from the wizard's final step
    pub async fn submit_will(&mut self) -> Result<SubmitOutcome, AppError> {
        let Submission { target, payload } = match self.wizard.submit() {
            Ok(submission) => submission,
            Err(e) => return self.fail(e, "Please review the form"),
        };

        if self.session_only {
            let payload = self.session_data.store(payload);
            let result =
                busy(&mut self.loading, self.backend.generate_session_will(payload)).await;
            return match result {
                Ok(pdf) => {
                    self.session_data.wipe();
                    self.wizard.close();
                    self.view = View::Dashboard;
                    self.notice = Some(Notice::success(
                        "Your Bitcoin will has been generated. Nothing was stored on the server.",
                    ));
                    Ok(SubmitOutcome::Pdf(pdf))
                }
                Err(e) => self.fail(e, "Failed to generate will. Please try again."),
            };
        }

        let result = match target {
            SubmitTarget::Create => busy(&mut self.loading, self.backend.create_will(&payload)).await,
            SubmitTarget::Update(id) => {
                busy(&mut self.loading, self.backend.update_will(id, &payload)).await
            }
        };

        match result {
            Ok(saved) => {
                self.wizard.close();
                if let Err(e) = self.load_dashboard().await {
                    log::warn!("Dashboard refresh after save failed: {}", e);
                }
                self.notice = Some(Notice::success(match target {
                    SubmitTarget::Create => "Bitcoin will created successfully!",
                    SubmitTarget::Update(_) => "Will updated successfully!",
                }));
                Ok(SubmitOutcome::Saved(saved))
            }
            Err(e) => self.fail(e, "Failed to save will. Please try again."),
        }
    }

    /// Delete a will; nothing is sent unless `confirmed`
    pub async fn delete_will(&mut self, id: u64, confirmed: bool) -> Result<(), AppError> {
        if !confirmed {
            self.notice = Some(Notice::info(
                "Are you sure you want to delete this will? This action cannot be undone.",
            ));
            return Err(AppError::ConfirmationRequired);
        }

        match busy(&mut self.loading, self.backend.delete_will(id)).await {
            Ok(()) => {
                if let Err(e) = self.load_dashboard().await {
                    log::warn!("Dashboard refresh after delete failed: {}", e);
                }
                self.notice = Some(Notice::success("Will deleted successfully"));
                Ok(())
            }
            Err(e) => self.fail(e, "Failed to delete will"),
        }
    }

    /// Download a will's PDF into `dir`, returning the written path
    pub async fn download_will(&mut self, id: u64, dir: &Path) -> Result<PathBuf, AppError> {
        let pdf = match busy(&mut self.loading, self.backend.download_will(id)).await {
            Ok(pdf) => pdf,
            Err(e) => return self.fail(e, "Failed to download will"),
        };

        let path = dir.join(pdf_filename(id, Utc::now().date_naive()));
        if let Err(e) = write_file(&path, &pdf) {
            return self.fail(e, "Failed to save will");
        }

        log::info!("Saved will {} to {}", id, path.display());
        self.notice = Some(Notice::success(format!("Will saved to {}", path.display())));
        Ok(path)
    }

    // ------------------------------------------------------------------
    // Subscription
    // ------------------------------------------------------------------

    pub fn select_plan(&mut self, plan: &str) {
        self.selected_plan = Some(plan.to_string());
        self.view = View::Subscription;
    }

    /// Start a hosted checkout for the selected plan; returns the payment URL
    pub async fn checkout(&mut self, method: PaymentMethod) -> Result<String, AppError> {
        let Some(plan) = self.selected_plan.clone() else {
            log::warn!("Checkout via {:?} attempted without a plan", method);
            self.notice = Some(Notice::error(AppError::NoPlanSelected.to_string()));
            return Err(AppError::NoPlanSelected);
        };

        let result = match method {
            PaymentMethod::Stripe => busy(
                &mut self.loading,
                self.backend.create_checkout_session(&plan),
            )
            .await
            .map(|session| session.checkout_url),
            PaymentMethod::Btcpay => {
                busy(&mut self.loading, self.backend.create_btcpay_invoice(&plan))
                    .await
                    .map(|invoice| invoice.invoice_url)
            }
        };

        match result {
            Ok(url) => {
                log::info!("Checkout for plan {} via {:?}", plan, method);
                self.notice = Some(Notice::info(format!("Continue to payment: {}", url)));
                Ok(url)
            }
            Err(e) => self.fail(e, "Payment processing failed. Please try again."),
        }
    }

    /// Billing portal URL for an existing subscription
    pub async fn manage_subscription(&mut self) -> Result<String, AppError> {
        match busy(&mut self.loading, self.backend.manage_subscription()).await {
            Ok(portal) => {
                self.notice = Some(Notice::info(format!(
                    "Manage your subscription at {}",
                    portal.url
                )));
                Ok(portal.url)
            }
            Err(e) => self.fail(e, "Failed to open subscription management"),
        }
    }

    /// Handle the query string a payment provider redirects back with
    pub async fn handle_return_params(&mut self, query: &str) -> PaymentReturn {
        let params = parse_query(query);
        let param = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        if param("cancelled") == Some("true") && param("success") != Some("true") {
            self.notice = Some(Notice::info("Payment was cancelled."));
            return PaymentReturn::Cancelled;
        }
        if param("success") != Some("true") {
            return PaymentReturn::Nothing;
        }

        if self.backend.has_token() {
            if let Some(session_id) = param("session_id") {
                match busy(&mut self.loading, self.backend.verify_payment(session_id)).await {
                    Ok(v) if !v.success => {
                        log::warn!("Payment not yet confirmed: {:?}", v.message)
                    }
                    Ok(_) => log::info!("Payment verified"),
                    Err(e) => log::error!("Payment verification failed: {}", e),
                }
            }
            match busy(&mut self.loading, self.backend.subscription_status()).await {
                Ok(status) => self.subscription = Some(status),
                Err(e) => log::error!("Failed to reload subscription status: {}", e),
            }
        }

        self.notice = Some(Notice::success(
            "Payment successful! Your subscription is now active.",
        ));
        PaymentReturn::Success
    }
}

fn write_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

/// Split `?a=1&b=2` into pairs; `+` decodes to a space
fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key.replace('+', " "), value.replace('+', " "))
        })
        .collect()
}
