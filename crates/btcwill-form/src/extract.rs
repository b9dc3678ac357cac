//! Form to payload extraction
//!
//! Reads every field of the in-memory form and assembles a [`WillPayload`].
//! No validation happens here; the wizard only calls this after every step
//! has validated.

use crate::form::WillForm;
use crate::payload::{
    Address, Assets, Beneficiaries, Beneficiary, Exchange, Instructions, PersonalInfo,
    TrustedContact, Wallet, WillPayload,
};
use crate::section::{Entry, Group};

/// Parse a percentage field, falling back to 0 on anything non-numeric
pub fn parse_percentage(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
}

/// Build the backend payload from the current form state.
///
/// Primary and contingent beneficiaries are classified by the section that
/// holds them, never by their position in a combined list.
pub fn extract(form: &WillForm) -> WillPayload {
    let personal = form.personal();
    let storage = form.storage();
    let instructions = form.instructions();

    WillPayload {
        personal_info: PersonalInfo {
            full_name: personal.get("fullName").to_string(),
            date_of_birth: personal.get("dateOfBirth").to_string(),
            phone: personal.get("phone").to_string(),
            executor_name: personal.get("executorName").to_string(),
            executor_contact: personal.get("executorContact").to_string(),
            address: Address {
                street: personal.get("street").to_string(),
                city: personal.get("city").to_string(),
                state: personal.get("state").to_string(),
                zip_code: personal.get("zipCode").to_string(),
                country: personal.get("country").to_string(),
            },
        },
        assets: Assets {
            wallets: collect(form, Group::Wallets, wallet),
            exchanges: collect(form, Group::Exchanges, exchange),
            storage_method: storage.get("storageMethod").to_string(),
            storage_location: storage.get("storageLocation").to_string(),
            storage_details: storage.get("storageDetails").to_string(),
        },
        beneficiaries: Beneficiaries {
            primary: collect(form, Group::PrimaryBeneficiaries, beneficiary),
            contingent: collect(form, Group::ContingentBeneficiaries, beneficiary),
        },
        instructions: Instructions {
            access_instructions: instructions.get("accessInstructions").to_string(),
            security_notes: instructions.get("securityNotes").to_string(),
            additional_instructions: instructions.get("additionalInstructions").to_string(),
            emergency_contact: instructions.get("emergencyContact").to_string(),
            trusted_contacts: collect(form, Group::TrustedContacts, trusted_contact),
        },
    }
}

fn collect<T>(form: &WillForm, group: Group, map: fn(&Entry) -> T) -> Vec<T> {
    form.section(group).entries().iter().map(map).collect()
}

fn wallet(entry: &Entry) -> Wallet {
    Wallet {
        name: entry.get("walletName").to_string(),
        wallet_type: entry.get("walletType").to_string(),
        description: entry.get("walletDescription").to_string(),
        access_method: entry.get("accessMethod").to_string(),
        seed_phrase_location: entry.get("seedPhraseLocation").to_string(),
        private_key_location: entry.get("privateKeyLocation").to_string(),
        additional_notes: entry.get("walletNotes").to_string(),
    }
}

fn exchange(entry: &Entry) -> Exchange {
    Exchange {
        name: entry.get("exchangeName").to_string(),
        username: entry.get("exchangeUsername").to_string(),
        email: entry.get("exchangeEmail").to_string(),
        two_factor_backup: entry.get("twoFactorBackup").to_string(),
        additional_notes: entry.get("exchangeNotes").to_string(),
    }
}

fn beneficiary(entry: &Entry) -> Beneficiary {
    Beneficiary {
        name: entry.get("beneficiaryName").to_string(),
        relationship: entry.get("beneficiaryRelationship").to_string(),
        percentage: parse_percentage(entry.get("beneficiaryPercentage")),
        phone: entry.get("beneficiaryPhone").to_string(),
        email: entry.get("beneficiaryEmail").to_string(),
        bitcoin_address: entry.get("beneficiaryBitcoinAddress").to_string(),
        address: Address {
            street: entry.get("beneficiaryStreet").to_string(),
            city: entry.get("beneficiaryCity").to_string(),
            state: entry.get("beneficiaryState").to_string(),
            zip_code: entry.get("beneficiaryZip").to_string(),
            country: entry.get("beneficiaryCountry").to_string(),
        },
    }
}

fn trusted_contact(entry: &Entry) -> TrustedContact {
    TrustedContact {
        name: entry.get("contactName").to_string(),
        contact: entry.get("contactInfo").to_string(),
        relationship: entry.get("contactRelationship").to_string(),
        role: entry.get("contactRole").to_string(),
    }
}
