//! Edit mode: map a saved record back onto the form
//!
//! For each section present in the record, every non-empty array replaces the
//! matching repeatable group with exactly one entry per element, then fills
//! them. Empty arrays leave the group as it was. Absent or empty values are
//! skipped, so the round trip is lossless for filled fields only.

use crate::form::WillForm;
use crate::payload::{Beneficiary, Exchange, TrustedContact, Wallet, WillRecord};
use crate::section::{EntryId, Group};
use crate::FormError;

/// Fill `form` from a previously saved record
pub fn populate(form: &mut WillForm, record: &WillRecord) {
    if let Some(personal) = &record.personal_info {
        let address = &personal.address;
        for (name, value) in [
            ("fullName", &personal.full_name),
            ("dateOfBirth", &personal.date_of_birth),
            ("phone", &personal.phone),
            ("executorName", &personal.executor_name),
            ("executorContact", &personal.executor_contact),
            ("street", &address.street),
            ("city", &address.city),
            ("state", &address.state),
            ("zipCode", &address.zip_code),
            ("country", &address.country),
        ] {
            skip_invalid(name, form.set_scalar_if_present(name, value));
        }
    }

    if let Some(assets) = &record.assets {
        rebuild(form, Group::Wallets, &assets.wallets, fill_wallet);
        rebuild(form, Group::Exchanges, &assets.exchanges, fill_exchange);
        for (name, value) in [
            ("storageMethod", &assets.storage_method),
            ("storageLocation", &assets.storage_location),
            ("storageDetails", &assets.storage_details),
        ] {
            skip_invalid(name, form.set_scalar_if_present(name, value));
        }
    }

    if let Some(beneficiaries) = &record.beneficiaries {
        rebuild(
            form,
            Group::PrimaryBeneficiaries,
            &beneficiaries.primary,
            fill_beneficiary,
        );
        rebuild(
            form,
            Group::ContingentBeneficiaries,
            &beneficiaries.contingent,
            fill_beneficiary,
        );
    }

    if let Some(instructions) = &record.instructions {
        for (name, value) in [
            ("accessInstructions", &instructions.access_instructions),
            ("securityNotes", &instructions.security_notes),
            (
                "additionalInstructions",
                &instructions.additional_instructions,
            ),
            ("emergencyContact", &instructions.emergency_contact),
        ] {
            skip_invalid(name, form.set_scalar_if_present(name, value));
        }
        rebuild(
            form,
            Group::TrustedContacts,
            &instructions.trusted_contacts,
            fill_contact,
        );
    }
}

/// Replace `group` with one filled entry per item; no-op for an empty list
fn rebuild<T>(
    form: &mut WillForm,
    group: Group,
    items: &[T],
    fill: fn(&mut WillForm, Group, EntryId, &T),
) {
    if items.is_empty() {
        return;
    }
    form.clear_section(group);
    for item in items {
        let id = form.add_entry(group);
        fill(form, group, id, item);
    }
}

fn set(form: &mut WillForm, group: Group, id: EntryId, name: &str, value: &str) {
    skip_invalid(name, form.set_entry_field_if_present(group, id, name, value));
}

fn skip_invalid(name: &str, result: Result<(), FormError>) {
    if let Err(e) = result {
        log::warn!("Skipping {} while populating: {}", name, e);
    }
}

fn fill_wallet(form: &mut WillForm, group: Group, id: EntryId, wallet: &Wallet) {
    set(form, group, id, "walletName", &wallet.name);
    set(form, group, id, "walletType", &wallet.wallet_type);
    set(form, group, id, "walletDescription", &wallet.description);
    set(form, group, id, "accessMethod", &wallet.access_method);
    set(form, group, id, "seedPhraseLocation", &wallet.seed_phrase_location);
    set(form, group, id, "privateKeyLocation", &wallet.private_key_location);
    set(form, group, id, "walletNotes", &wallet.additional_notes);
}

fn fill_exchange(form: &mut WillForm, group: Group, id: EntryId, exchange: &Exchange) {
    set(form, group, id, "exchangeName", &exchange.name);
    set(form, group, id, "exchangeUsername", &exchange.username);
    set(form, group, id, "exchangeEmail", &exchange.email);
    set(form, group, id, "twoFactorBackup", &exchange.two_factor_backup);
    set(form, group, id, "exchangeNotes", &exchange.additional_notes);
}

fn fill_beneficiary(form: &mut WillForm, group: Group, id: EntryId, b: &Beneficiary) {
    set(form, group, id, "beneficiaryName", &b.name);
    set(form, group, id, "beneficiaryRelationship", &b.relationship);
    set(
        form,
        group,
        id,
        "beneficiaryPercentage",
        &format_percentage(b.percentage),
    );
    set(form, group, id, "beneficiaryPhone", &b.phone);
    set(form, group, id, "beneficiaryEmail", &b.email);
    set(form, group, id, "beneficiaryBitcoinAddress", &b.bitcoin_address);
    set(form, group, id, "beneficiaryStreet", &b.address.street);
    set(form, group, id, "beneficiaryCity", &b.address.city);
    set(form, group, id, "beneficiaryState", &b.address.state);
    set(form, group, id, "beneficiaryZip", &b.address.zip_code);
    set(form, group, id, "beneficiaryCountry", &b.address.country);
}

fn fill_contact(form: &mut WillForm, group: Group, id: EntryId, contact: &TrustedContact) {
    set(form, group, id, "contactName", &contact.name);
    set(form, group, id, "contactInfo", &contact.contact);
    set(form, group, id, "contactRelationship", &contact.relationship);
    set(form, group, id, "contactRole", &contact.role);
}

/// Render a percentage for the input field.
///
/// Zero counts as absent. Values outside `0..=100` are dropped so the user
/// has to enter the share again.
fn format_percentage(value: f64) -> String {
    if value == 0.0 {
        String::new()
    } else if !(0.0..=100.0).contains(&value) {
        log::warn!("Dropping out-of-range beneficiary percentage {}", value);
        String::new()
    } else if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
