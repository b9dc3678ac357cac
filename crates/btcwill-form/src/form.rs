//! The complete will form: scalar blocks plus the five repeatable sections

use crate::fields::{FieldSet, INSTRUCTION_FIELDS, PERSONAL_FIELDS, STORAGE_FIELDS};
use crate::section::{Entry, EntryId, Group, Section};
use crate::FormError;

/// In-memory form state; the single source of truth for rendering and extraction
#[derive(Debug, Clone)]
pub struct WillForm {
    personal: FieldSet,
    storage: FieldSet,
    instructions: FieldSet,
    wallets: Section,
    exchanges: Section,
    primary: Section,
    contingent: Section,
    contacts: Section,
    next_entry_id: u64,
}

impl Default for WillForm {
    fn default() -> Self {
        Self::new()
    }
}

impl WillForm {
    /// Empty form with no repeatable entries
    pub fn new() -> Self {
        Self {
            personal: FieldSet::new(PERSONAL_FIELDS),
            storage: FieldSet::new(STORAGE_FIELDS),
            instructions: FieldSet::new(INSTRUCTION_FIELDS),
            wallets: Section::new(Group::Wallets),
            exchanges: Section::new(Group::Exchanges),
            primary: Section::new(Group::PrimaryBeneficiaries),
            contingent: Section::new(Group::ContingentBeneficiaries),
            contacts: Section::new(Group::TrustedContacts),
            next_entry_id: 0,
        }
    }

    // ------------------------------------------------------------------
    // Scalar fields
    // ------------------------------------------------------------------

    /// Scalar blocks paired with the wizard step that renders them
    pub fn scalar_blocks(&self) -> [(usize, &FieldSet); 3] {
        [
            (1, &self.personal),
            (2, &self.storage),
            (4, &self.instructions),
        ]
    }

    fn block_for(&self, name: &str) -> Option<&FieldSet> {
        [&self.personal, &self.storage, &self.instructions]
            .into_iter()
            .find(|block| block.spec(name).is_some())
    }

    fn block_for_mut(&mut self, name: &str) -> Option<&mut FieldSet> {
        [
            &mut self.personal,
            &mut self.storage,
            &mut self.instructions,
        ]
        .into_iter()
        .find(|block| block.spec(name).is_some())
    }

    pub fn personal(&self) -> &FieldSet {
        &self.personal
    }

    pub fn storage(&self) -> &FieldSet {
        &self.storage
    }

    pub fn instructions(&self) -> &FieldSet {
        &self.instructions
    }

    /// Value of a scalar field by name; unknown names read as empty
    pub fn scalar(&self, name: &str) -> &str {
        self.block_for(name).map(|b| b.get(name)).unwrap_or("")
    }

    pub fn set_scalar(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        self.block_for_mut(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?
            .set(name, value)
    }

    pub(crate) fn set_scalar_if_present(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        self.block_for_mut(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?
            .set_if_present(name, value)
    }

    // ------------------------------------------------------------------
    // Repeatable sections
    // ------------------------------------------------------------------

    pub fn section(&self, group: Group) -> &Section {
        match group {
            Group::Wallets => &self.wallets,
            Group::Exchanges => &self.exchanges,
            Group::PrimaryBeneficiaries => &self.primary,
            Group::ContingentBeneficiaries => &self.contingent,
            Group::TrustedContacts => &self.contacts,
        }
    }

    fn section_mut(&mut self, group: Group) -> &mut Section {
        match group {
            Group::Wallets => &mut self.wallets,
            Group::Exchanges => &mut self.exchanges,
            Group::PrimaryBeneficiaries => &mut self.primary,
            Group::ContingentBeneficiaries => &mut self.contingent,
            Group::TrustedContacts => &mut self.contacts,
        }
    }

    /// Append one empty entry to `group` and return its identity
    pub fn add_entry(&mut self, group: Group) -> EntryId {
        let id = EntryId(self.next_entry_id);
        self.next_entry_id += 1;
        self.section_mut(group).push(id);
        log::debug!(
            "Added {} ({} entries)",
            group.label_prefix(),
            self.section(group).len()
        );
        id
    }

    /// Remove an entry from whichever section holds it.
    ///
    /// Remaining entries in that section are relabelled `1..k` in order.
    pub fn remove_entry(&mut self, id: EntryId) -> Result<(Group, Entry), FormError> {
        for group in Group::ALL {
            if let Some(entry) = self.section_mut(group).remove(id) {
                return Ok((group, entry));
            }
        }
        Err(FormError::EntryNotFound)
    }

    pub fn entry(&self, id: EntryId) -> Option<(Group, &Entry)> {
        Group::ALL
            .into_iter()
            .find_map(|g| self.section(g).get(id).map(|e| (g, e)))
    }

    /// Write a field of one entry
    pub fn set_entry_field(
        &mut self,
        id: EntryId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), FormError> {
        let group = self.entry(id).map(|(g, _)| g).ok_or(FormError::EntryNotFound)?;
        self.section_mut(group)
            .get_mut(id)
            .ok_or(FormError::EntryNotFound)?
            .fields_mut()
            .set(name, value)
    }

    pub(crate) fn set_entry_field_if_present(
        &mut self,
        group: Group,
        id: EntryId,
        name: &str,
        value: &str,
    ) -> Result<(), FormError> {
        self.section_mut(group)
            .get_mut(id)
            .ok_or(FormError::EntryNotFound)?
            .fields_mut()
            .set_if_present(name, value)
    }

    pub(crate) fn clear_section(&mut self, group: Group) {
        self.section_mut(group).clear();
    }

    /// Seed exactly one empty entry per repeatable group
    pub fn seed_defaults(&mut self) {
        for group in Group::ALL {
            self.add_entry(group);
        }
    }

    /// Wipe every scalar value and drop every repeatable entry
    pub fn clear(&mut self) {
        self.personal.clear();
        self.storage.clear();
        self.instructions.clear();
        for group in Group::ALL {
            self.clear_section(group);
        }
    }
}
