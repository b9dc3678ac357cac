//! Multi-step wizard controller
//!
//! Tracks the current step, gates forward navigation on per-step validation,
//! and owns the [`WillForm`] being edited.
//!
//! # State machine
//!
//! - States: step `1..=N` (N = 4, or 5 with an explicit review step)
//! - `next`: k → k+1, only if step k validates
//! - `prev`: k → k-1, ungated
//! - `submit`: only from step N, validates every step and yields the payload
//!
//! Validation is visibility-aware: the rendering layer reports hidden fields
//! with [`Wizard::set_field_hidden`], and hidden required fields never block
//! navigation.

use crate::extract::{extract, parse_percentage};
use crate::form::WillForm;
use crate::payload::{ReviewSummary, WillPayload, WillRecord};
use crate::populate::populate;
use crate::section::{EntryId, Group};
use crate::FormError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

const PERCENT_TOLERANCE: f64 = 0.01;

/// Number of panels in the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepLayout {
    /// Personal, assets, beneficiaries, instructions (review is implicit)
    FourPanel,
    /// The four panels plus an explicit review-and-submit step
    FivePanel,
}

impl StepLayout {
    pub fn step_count(self) -> usize {
        match self {
            StepLayout::FourPanel => 4,
            StepLayout::FivePanel => 5,
        }
    }

    pub fn from_step_count(steps: usize) -> Option<Self> {
        match steps {
            4 => Some(StepLayout::FourPanel),
            5 => Some(StepLayout::FivePanel),
            _ => None,
        }
    }

    pub fn step_title(self, step: usize) -> &'static str {
        match step {
            1 => "Personal Information",
            2 => "Bitcoin Assets",
            3 => "Beneficiaries",
            4 => "Instructions",
            5 if self == StepLayout::FivePanel => "Review & Submit",
            _ => "",
        }
    }
}

/// Extra validation rules beyond required fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Step 3 fails unless primary beneficiary percentages total exactly 100
    pub enforce_primary_total: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            enforce_primary_total: true,
        }
    }
}

/// Why the wizard was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    Create,
    Edit { record_id: u64 },
}

/// Address of one input in the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRef {
    Scalar(&'static str),
    Entry {
        group: Group,
        entry: EntryId,
        field: &'static str,
    },
}

/// What the navigation bar should show
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavState {
    pub step: usize,
    pub total: usize,
    /// `step / total`, in `0.0..=1.0`
    pub progress: f32,
    pub show_prev: bool,
    pub show_next: bool,
    pub show_submit: bool,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please fill in all required fields before proceeding.")]
    MissingRequired { fields: Vec<FieldRef> },

    #[error("Beneficiary percentages must be numbers between 0 and 100.")]
    PercentageRange { fields: Vec<FieldRef> },

    #[error("Primary beneficiary percentages must total 100% (currently {total}%)")]
    PercentageTotal { total: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("Wizard is not open")]
    Closed,

    #[error("Step {step} is out of range (1..={total})")]
    StepOutOfRange { step: usize, total: usize },

    #[error("Submission is only possible from the final step (currently on step {step})")]
    NotOnFinalStep { step: usize },

    #[error("Step {step}: {source}")]
    Validation {
        step: usize,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Form(#[from] FormError),
}

/// Where a submitted payload should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTarget {
    Create,
    Update(u64),
}

/// A validated, extracted will ready to send
#[derive(Debug, Clone)]
pub struct Submission {
    pub target: SubmitTarget,
    pub payload: WillPayload,
}

/// The wizard controller
#[derive(Debug, Clone)]
pub struct Wizard {
    layout: StepLayout,
    policy: ValidationPolicy,
    current_step: usize,
    mode: WizardMode,
    open: bool,
    form: WillForm,
    hidden: HashSet<FieldRef>,
    invalid: Vec<FieldRef>,
}

impl Wizard {
    pub fn new(layout: StepLayout, policy: ValidationPolicy) -> Self {
        Self {
            layout,
            policy,
            current_step: 1,
            mode: WizardMode::Create,
            open: false,
            form: WillForm::new(),
            hidden: HashSet::new(),
            invalid: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open at step 1.
    ///
    /// Create mode starts from a blank form with one default entry per
    /// repeatable group; edit mode starts with empty groups, to be filled by
    /// [`Wizard::populate`].
    pub fn open(&mut self, mode: WizardMode) {
        self.reset_state();
        self.mode = mode;
        self.open = true;
        if mode == WizardMode::Create {
            self.form.seed_defaults();
        }
        log::debug!("Wizard opened in {:?} mode", mode);
    }

    /// Hide the wizard and discard everything entered
    pub fn close(&mut self) {
        self.reset_state();
        self.open = false;
        log::debug!("Wizard closed");
    }

    fn reset_state(&mut self) {
        self.current_step = 1;
        self.mode = WizardMode::Create;
        self.form.clear();
        self.hidden.clear();
        self.invalid.clear();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    /// Record being edited, if any
    pub fn editing_id(&self) -> Option<u64> {
        match self.mode {
            WizardMode::Edit { record_id } => Some(record_id),
            WizardMode::Create => None,
        }
    }

    pub fn layout(&self) -> StepLayout {
        self.layout
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn total_steps(&self) -> usize {
        self.layout.step_count()
    }

    pub fn form(&self) -> &WillForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut WillForm {
        &mut self.form
    }

    // ------------------------------------------------------------------
    // Repeatable sections
    // ------------------------------------------------------------------

    pub fn add_entry(&mut self, group: Group) -> EntryId {
        self.form.add_entry(group)
    }

    /// Remove an entry; hidden/invalid marks on its fields go with it
    pub fn remove_entry(&mut self, id: EntryId) -> Result<Group, FormError> {
        let (group, _) = self.form.remove_entry(id)?;
        let belongs = |f: &FieldRef| matches!(f, FieldRef::Entry { entry, .. } if *entry == id);
        self.hidden.retain(|f| !belongs(f));
        self.invalid.retain(|f| !belongs(f));
        Ok(group)
    }

    /// Reverse-map a saved record onto the form (edit mode)
    pub fn populate(&mut self, record: &WillRecord) {
        populate(&mut self.form, record);
        self.hidden.clear();
        self.invalid.clear();
    }

    // ------------------------------------------------------------------
    // Visibility and validation
    // ------------------------------------------------------------------

    /// Report whether the renderer currently hides a field
    pub fn set_field_hidden(&mut self, field: FieldRef, hidden: bool) {
        if hidden {
            self.hidden.insert(field);
        } else {
            self.hidden.remove(&field);
        }
    }

    pub fn is_field_visible(&self, field: &FieldRef) -> bool {
        !self.hidden.contains(field)
    }

    /// Fields marked invalid by the last failed validation
    pub fn invalid_fields(&self) -> &[FieldRef] {
        &self.invalid
    }

    /// Required fields rendered on `step`, in panel order
    fn required_fields(&self, step: usize) -> Vec<FieldRef> {
        let mut fields = Vec::new();

        for (block_step, block) in self.form.scalar_blocks() {
            if block_step == step {
                fields.extend(
                    block
                        .specs()
                        .iter()
                        .filter(|s| s.required)
                        .map(|s| FieldRef::Scalar(s.name)),
                );
            }
        }

        for group in Group::ALL.into_iter().filter(|g| g.step() == step) {
            for entry in self.form.section(group).entries() {
                fields.extend(
                    group
                        .fields()
                        .iter()
                        .filter(|s| s.required)
                        .map(|s| FieldRef::Entry {
                            group,
                            entry: entry.id(),
                            field: s.name,
                        }),
                );
            }
        }

        fields
    }

    fn value_of(&self, field: &FieldRef) -> &str {
        match field {
            FieldRef::Scalar(name) => self.form.scalar(name),
            FieldRef::Entry { group, entry, field } => self
                .form
                .section(*group)
                .get(*entry)
                .map(|e| e.get(field))
                .unwrap_or(""),
        }
    }

    /// Sum of the primary beneficiaries' percentage fields
    pub fn primary_total(&self) -> f64 {
        self.form
            .section(Group::PrimaryBeneficiaries)
            .entries()
            .iter()
            .map(|e| parse_percentage(e.get("beneficiaryPercentage")))
            .sum()
    }

    /// Visible percentage fields on `step` that are not a number in `0..=100`
    fn percentages_out_of_range(&self, step: usize) -> Vec<FieldRef> {
        [Group::PrimaryBeneficiaries, Group::ContingentBeneficiaries]
            .into_iter()
            .filter(|g| g.step() == step)
            .flat_map(|group| {
                self.form
                    .section(group)
                    .entries()
                    .iter()
                    .map(move |entry| FieldRef::Entry {
                        group,
                        entry: entry.id(),
                        field: "beneficiaryPercentage",
                    })
            })
            .filter(|f| self.is_field_visible(f))
            .filter(|f| {
                let raw = self.value_of(f).trim();
                !raw.is_empty()
                    && !matches!(raw.parse::<f64>(), Ok(p) if (0.0..=100.0).contains(&p))
            })
            .collect()
    }

    /// Validate one step's panel.
    ///
    /// Fails if any visible required field is blank after trimming, or if a
    /// visible beneficiary percentage is outside `0..=100`; offending fields are
    /// recorded in [`Wizard::invalid_fields`]. Steps without a panel always pass.
    pub fn validate_step(&mut self, step: usize) -> Result<(), ValidationError> {
        let missing: Vec<FieldRef> = self
            .required_fields(step)
            .into_iter()
            .filter(|f| self.is_field_visible(f))
            .filter(|f| self.value_of(f).trim().is_empty())
            .collect();

        self.invalid = missing.clone();
        if !missing.is_empty() {
            log::debug!("Step {} has {} missing fields", step, missing.len());
            return Err(ValidationError::MissingRequired { fields: missing });
        }

        let out_of_range = self.percentages_out_of_range(step);
        if !out_of_range.is_empty() {
            log::debug!("Step {} has {} out-of-range percentages", step, out_of_range.len());
            self.invalid = out_of_range.clone();
            return Err(ValidationError::PercentageRange {
                fields: out_of_range,
            });
        }

        if step == 3 && self.policy.enforce_primary_total {
            let total = self.primary_total();
            if (total - 100.0).abs() > PERCENT_TOLERANCE {
                return Err(ValidationError::PercentageTotal { total });
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn nav(&self) -> NavState {
        let total = self.total_steps();
        let step = self.current_step;
        NavState {
            step,
            total,
            progress: step as f32 / total as f32,
            show_prev: step > 1,
            show_next: step < total,
            show_submit: step == total,
        }
    }

    /// Move to step `n` once the current step validates
    pub fn go_to_step(&mut self, n: usize) -> Result<NavState, WizardError> {
        if !self.open {
            return Err(WizardError::Closed);
        }
        let total = self.total_steps();
        if !(1..=total).contains(&n) {
            return Err(WizardError::StepOutOfRange { step: n, total });
        }

        let step = self.current_step;
        self.validate_step(step)
            .map_err(|source| WizardError::Validation { step, source })?;

        self.current_step = n;
        Ok(self.nav())
    }

    /// Advance one step. On the final step this only re-validates.
    pub fn next(&mut self) -> Result<NavState, WizardError> {
        if self.current_step >= self.total_steps() {
            if !self.open {
                return Err(WizardError::Closed);
            }
            let step = self.current_step;
            self.validate_step(step)
                .map_err(|source| WizardError::Validation { step, source })?;
            return Ok(self.nav());
        }
        self.go_to_step(self.current_step + 1)
    }

    /// Go back one step without validating
    pub fn prev(&mut self) -> Result<NavState, WizardError> {
        if !self.open {
            return Err(WizardError::Closed);
        }
        if self.current_step > 1 {
            self.current_step -= 1;
        }
        Ok(self.nav())
    }

    /// Summary for the review panel
    pub fn review(&self) -> ReviewSummary {
        extract(&self.form).summary()
    }

    /// Validate every step and extract the payload.
    ///
    /// The wizard stays open; callers close it once the backend accepted the
    /// submission.
    pub fn submit(&mut self) -> Result<Submission, WizardError> {
        if !self.open {
            return Err(WizardError::Closed);
        }
        if self.current_step != self.total_steps() {
            return Err(WizardError::NotOnFinalStep {
                step: self.current_step,
            });
        }

        for step in 1..=self.total_steps() {
            self.validate_step(step)
                .map_err(|source| WizardError::Validation { step, source })?;
        }

        let target = match self.mode {
            WizardMode::Create => SubmitTarget::Create,
            WizardMode::Edit { record_id } => SubmitTarget::Update(record_id),
        };

        Ok(Submission {
            target,
            payload: extract(&self.form),
        })
    }
}
