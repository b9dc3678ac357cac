//! Repeatable form sections
//!
//! Wallets, exchanges, beneficiaries and trusted contacts are ordered lists of
//! uniform field-sets. Display labels are derived from position, so removing an
//! entry renumbers the remaining ones `1..k` without any extra bookkeeping.
//! Each entry also carries an [`EntryId`] that never changes and is never
//! displayed; it keeps per-entry state (edits, hidden marks) attached to the
//! right entry after removals.

use crate::fields::{
    FieldSet, FieldSpec, BENEFICIARY_FIELDS, CONTACT_FIELDS, EXCHANGE_FIELDS, WALLET_FIELDS,
};
use serde::{Deserialize, Serialize};

/// The repeatable groups of the will form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Wallets,
    Exchanges,
    PrimaryBeneficiaries,
    ContingentBeneficiaries,
    TrustedContacts,
}

impl Group {
    pub const ALL: [Group; 5] = [
        Group::Wallets,
        Group::Exchanges,
        Group::PrimaryBeneficiaries,
        Group::ContingentBeneficiaries,
        Group::TrustedContacts,
    ];

    /// Field descriptors of one entry in this group
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Group::Wallets => WALLET_FIELDS,
            Group::Exchanges => EXCHANGE_FIELDS,
            Group::PrimaryBeneficiaries | Group::ContingentBeneficiaries => BENEFICIARY_FIELDS,
            Group::TrustedContacts => CONTACT_FIELDS,
        }
    }

    pub fn label_prefix(self) -> &'static str {
        match self {
            Group::Wallets => "Wallet",
            Group::Exchanges => "Exchange",
            Group::PrimaryBeneficiaries => "Primary Beneficiary",
            Group::ContingentBeneficiaries => "Contingent Beneficiary",
            Group::TrustedContacts => "Trusted Contact",
        }
    }

    /// Wizard step whose panel holds this group
    pub fn step(self) -> usize {
        match self {
            Group::Wallets | Group::Exchanges => 2,
            Group::PrimaryBeneficiaries | Group::ContingentBeneficiaries => 3,
            Group::TrustedContacts => 4,
        }
    }
}

/// Internal identity of an entry, unique within one form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

/// One repeatable field-set
#[derive(Debug, Clone)]
pub struct Entry {
    id: EntryId,
    fields: FieldSet,
}

impl Entry {
    fn new(id: EntryId, group: Group) -> Self {
        Self {
            id,
            fields: FieldSet::new(group.fields()),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }

    /// Shorthand for `fields().get(name)`
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name)
    }
}

/// Ordered entries of one group
#[derive(Debug, Clone)]
pub struct Section {
    group: Group,
    entries: Vec<Entry>,
}

impl Section {
    pub fn new(group: Group) -> Self {
        Self {
            group,
            entries: Vec::new(),
        }
    }

    pub fn group(&self) -> Group {
        self.group
    }

    /// Append an empty entry; its label is `count + 1`
    pub(crate) fn push(&mut self, id: EntryId) -> &mut Entry {
        self.entries.push(Entry::new(id, self.group));
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Remove an entry by identity. Remaining entries keep their relative order.
    pub(crate) fn remove(&mut self, id: EntryId) -> Option<Entry> {
        let idx = self.position(id)?;
        Some(self.entries.remove(idx))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display label for the entry at `index`, e.g. "Wallet 2"
    pub fn label_at(&self, index: usize) -> String {
        format!("{} {}", self.group.label_prefix(), index + 1)
    }

    pub fn label_of(&self, id: EntryId) -> Option<String> {
        self.position(id).map(|idx| self.label_at(idx))
    }

    /// Labels of all entries in display order
    pub fn labels(&self) -> Vec<String> {
        (0..self.entries.len()).map(|i| self.label_at(i)).collect()
    }
}
