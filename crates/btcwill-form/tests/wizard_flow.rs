//! End-to-end wizard flows against the in-memory form

use btcwill_form::{
    FieldRef, Group, StepLayout, SubmitTarget, ValidationError, ValidationPolicy, Wizard,
    WizardError, WizardMode, WillRecord,
};

fn wizard(layout: StepLayout) -> Wizard {
    let mut wizard = Wizard::new(layout, ValidationPolicy::default());
    wizard.open(WizardMode::Create);
    wizard
}

fn first(wizard: &Wizard, group: Group) -> btcwill_form::EntryId {
    wizard.form().section(group).entries()[0].id()
}

fn fill_personal(wizard: &mut Wizard) {
    let form = wizard.form_mut();
    form.set_scalar("fullName", "Satoshi Nakamoto").unwrap();
    form.set_scalar("dateOfBirth", "1975-04-05").unwrap();
    form.set_scalar("executorName", "Hal Finney").unwrap();
    form.set_scalar("executorContact", "hal@example.com").unwrap();
}

fn fill_assets(wizard: &mut Wizard) {
    let wallet = first(wizard, Group::Wallets);
    let exchange = first(wizard, Group::Exchanges);
    let form = wizard.form_mut();
    form.set_entry_field(wallet, "walletName", "Coldcard").unwrap();
    form.set_entry_field(wallet, "walletType", "hardware").unwrap();
    form.set_entry_field(wallet, "accessMethod", "PIN + seed").unwrap();
    form.set_entry_field(exchange, "exchangeName", "Kraken").unwrap();
    form.set_entry_field(exchange, "exchangeUsername", "satoshi").unwrap();
}

fn fill_beneficiary(wizard: &mut Wizard, id: btcwill_form::EntryId, name: &str, pct: &str) {
    let form = wizard.form_mut();
    form.set_entry_field(id, "beneficiaryName", name).unwrap();
    form.set_entry_field(id, "beneficiaryRelationship", "Child").unwrap();
    form.set_entry_field(id, "beneficiaryPercentage", pct).unwrap();
}

fn fill_beneficiaries(wizard: &mut Wizard) {
    let primary = first(wizard, Group::PrimaryBeneficiaries);
    let contingent = first(wizard, Group::ContingentBeneficiaries);
    fill_beneficiary(wizard, primary, "Alice", "100");
    fill_beneficiary(wizard, contingent, "Bob", "100");
}

fn fill_instructions(wizard: &mut Wizard) {
    let contact = first(wizard, Group::TrustedContacts);
    let form = wizard.form_mut();
    form.set_scalar("accessInstructions", "See safe deposit box").unwrap();
    form.set_entry_field(contact, "contactName", "Carol").unwrap();
    form.set_entry_field(contact, "contactInfo", "carol@example.com").unwrap();
}

#[test]
fn test_step_stays_in_bounds() {
    let mut wizard = wizard(StepLayout::FivePanel);
    fill_personal(&mut wizard);
    fill_assets(&mut wizard);
    fill_beneficiaries(&mut wizard);
    fill_instructions(&mut wizard);

    for _ in 0..10 {
        let _ = wizard.next();
        assert!((1..=5).contains(&wizard.current_step()));
    }
    assert_eq!(wizard.current_step(), 5);
    assert!(wizard.nav().show_submit);
    assert!(!wizard.nav().show_next);

    for _ in 0..10 {
        wizard.prev().unwrap();
        assert!((1..=5).contains(&wizard.current_step()));
    }
    assert_eq!(wizard.current_step(), 1);
}

#[test]
fn test_create_flow_submits_payload() {
    let mut wizard = wizard(StepLayout::FourPanel);
    fill_personal(&mut wizard);
    wizard.next().unwrap();
    fill_assets(&mut wizard);
    wizard.next().unwrap();
    fill_beneficiaries(&mut wizard);
    wizard.next().unwrap();
    fill_instructions(&mut wizard);

    let submission = wizard.submit().unwrap();
    assert_eq!(submission.target, SubmitTarget::Create);

    let payload = submission.payload;
    assert_eq!(payload.personal_info.full_name, "Satoshi Nakamoto");
    assert_eq!(payload.personal_info.date_of_birth, "1975-04-05");
    assert_eq!(payload.personal_info.executor_name, "Hal Finney");
    assert_eq!(payload.personal_info.phone, "");
    assert_eq!(payload.assets.wallets.len(), 1);
    assert_eq!(payload.assets.exchanges.len(), 1);
    assert_eq!(payload.assets.storage_method, "");
    assert_eq!(payload.beneficiaries.primary[0].percentage, 100.0);
    assert_eq!(payload.instructions.trusted_contacts[0].name, "Carol");

    let json = serde_json::to_value(&payload).unwrap();
    assert!(json["assets"]["wallets"].is_array());
    assert!(json["assets"]["exchanges"].is_array());
}

#[test]
fn test_removed_entries_are_not_required() {
    let mut wizard = wizard(StepLayout::FourPanel);
    fill_personal(&mut wizard);
    wizard.next().unwrap();

    // Empty default wallet and exchange block step 2 until removed
    assert!(wizard.next().is_err());
    let wallet = first(&wizard, Group::Wallets);
    let exchange = first(&wizard, Group::Exchanges);
    wizard.remove_entry(wallet).unwrap();
    wizard.remove_entry(exchange).unwrap();
    wizard.next().unwrap();
    assert_eq!(wizard.current_step(), 3);

    fill_beneficiaries(&mut wizard);
    wizard.next().unwrap();
    fill_instructions(&mut wizard);

    let payload = wizard.submit().unwrap().payload;
    assert!(payload.assets.wallets.is_empty());
    assert!(payload.assets.exchanges.is_empty());
}

#[test]
fn test_primary_percentages_must_total_100() {
    let mut wizard = wizard(StepLayout::FourPanel);
    let contingent = first(&wizard, Group::ContingentBeneficiaries);
    wizard.remove_entry(contingent).unwrap();

    let a = first(&wizard, Group::PrimaryBeneficiaries);
    let b = wizard.add_entry(Group::PrimaryBeneficiaries);
    let c = wizard.add_entry(Group::PrimaryBeneficiaries);
    fill_beneficiary(&mut wizard, a, "A", "50");
    fill_beneficiary(&mut wizard, b, "B", "30");
    fill_beneficiary(&mut wizard, c, "C", "20");

    assert_eq!(wizard.primary_total(), 100.0);
    assert!(wizard.validate_step(3).is_ok());

    fill_beneficiary(&mut wizard, c, "C", "25");
    assert_eq!(wizard.primary_total(), 105.0);
    assert!(matches!(
        wizard.validate_step(3),
        Err(ValidationError::PercentageTotal { .. })
    ));

    fill_beneficiary(&mut wizard, c, "C", "15");
    assert_eq!(wizard.primary_total(), 95.0);
    let err = wizard.validate_step(3).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Primary beneficiary percentages must total 100% (currently 95%)"
    );
}

#[test]
fn test_percentages_outside_0_to_100_rejected() {
    let mut wizard = wizard(StepLayout::FourPanel);
    let a = first(&wizard, Group::PrimaryBeneficiaries);
    let b = wizard.add_entry(Group::PrimaryBeneficiaries);
    let contingent = first(&wizard, Group::ContingentBeneficiaries);
    fill_beneficiary(&mut wizard, a, "A", "150");
    fill_beneficiary(&mut wizard, b, "B", "-50");
    fill_beneficiary(&mut wizard, contingent, "C", "500");

    // Sums to 100, but every share is out of range
    assert_eq!(wizard.primary_total(), 100.0);
    let err = wizard.validate_step(3).unwrap_err();
    let fields = match err {
        ValidationError::PercentageRange { fields } => fields,
        other => panic!("unexpected error: {other:?}"),
    };
    let entries: Vec<_> = fields
        .iter()
        .map(|f| match f {
            FieldRef::Entry { entry, .. } => *entry,
            FieldRef::Scalar(name) => panic!("unexpected scalar {name}"),
        })
        .collect();
    assert_eq!(entries, vec![a, b, contingent]);
    assert_eq!(wizard.invalid_fields(), fields.as_slice());

    // The range applies with the total rule switched off too
    let mut lenient = Wizard::new(
        StepLayout::FourPanel,
        ValidationPolicy {
            enforce_primary_total: false,
        },
    );
    lenient.open(WizardMode::Create);
    let p = first(&lenient, Group::PrimaryBeneficiaries);
    let c = first(&lenient, Group::ContingentBeneficiaries);
    fill_beneficiary(&mut lenient, p, "A", "40");
    fill_beneficiary(&mut lenient, c, "C", "500");
    assert!(matches!(
        lenient.validate_step(3),
        Err(ValidationError::PercentageRange { .. })
    ));

    fill_beneficiary(&mut lenient, c, "C", "abc");
    assert!(lenient.validate_step(3).is_err());

    fill_beneficiary(&mut lenient, c, "C", "100");
    assert!(lenient.validate_step(3).is_ok());
}

#[test]
fn test_required_only_submission_keeps_empty_arrays() {
    let mut wizard = wizard(StepLayout::FivePanel);
    fill_personal(&mut wizard);
    wizard.next().unwrap();

    // No wallets or exchanges to declare
    for group in [Group::Wallets, Group::Exchanges] {
        let id = first(&wizard, group);
        wizard.remove_entry(id).unwrap();
    }
    wizard.next().unwrap();

    let contingent = first(&wizard, Group::ContingentBeneficiaries);
    wizard.remove_entry(contingent).unwrap();
    let primary = first(&wizard, Group::PrimaryBeneficiaries);
    fill_beneficiary(&mut wizard, primary, "Alice", "100");
    wizard.next().unwrap();

    fill_instructions(&mut wizard);
    wizard.next().unwrap();
    assert_eq!(wizard.current_step(), 5);

    let payload = wizard.submit().unwrap().payload;
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["assets"]["wallets"], serde_json::json!([]));
    assert_eq!(json["assets"]["exchanges"], serde_json::json!([]));
    assert_eq!(json["beneficiaries"]["contingent"], serde_json::json!([]));

    let personal = &payload.personal_info;
    assert_eq!(personal.full_name, "Satoshi Nakamoto");
    assert_eq!(personal.date_of_birth, "1975-04-05");
    assert_eq!(personal.executor_name, "Hal Finney");
    assert_eq!(personal.executor_contact, "hal@example.com");
}

#[test]
fn test_removing_middle_wallet_keeps_values() {
    let mut wizard = wizard(StepLayout::FourPanel);
    let w1 = first(&wizard, Group::Wallets);
    let w2 = wizard.add_entry(Group::Wallets);
    let w3 = wizard.add_entry(Group::Wallets);
    for (id, name) in [(w1, "First"), (w2, "Second"), (w3, "Third")] {
        wizard
            .form_mut()
            .set_entry_field(id, "walletName", name)
            .unwrap();
    }

    wizard.remove_entry(w2).unwrap();

    let wallets = wizard.form().section(Group::Wallets);
    assert_eq!(wallets.labels(), vec!["Wallet 1", "Wallet 2"]);
    assert_eq!(wallets.entries()[0].get("walletName"), "First");
    assert_eq!(wallets.entries()[1].get("walletName"), "Third");
    assert_eq!(wallets.label_of(w3).as_deref(), Some("Wallet 2"));
}

#[test]
fn test_add_remove_sequences_keep_labels_contiguous() {
    let mut wizard = wizard(StepLayout::FourPanel);
    let mut ids = vec![first(&wizard, Group::TrustedContacts)];
    for round in 0..6 {
        ids.push(wizard.add_entry(Group::TrustedContacts));
        if round % 2 == 1 {
            let victim = ids.remove(round % ids.len());
            wizard.remove_entry(victim).unwrap();
        }
        let section = wizard.form().section(Group::TrustedContacts);
        let expected: Vec<String> = (1..=section.len())
            .map(|i| format!("Trusted Contact {i}"))
            .collect();
        assert_eq!(section.labels(), expected);
    }
}

#[test]
fn test_beneficiary_count_preserved() {
    let mut wizard = wizard(StepLayout::FourPanel);
    for _ in 0..2 {
        wizard.add_entry(Group::PrimaryBeneficiaries);
    }
    for _ in 0..4 {
        wizard.add_entry(Group::ContingentBeneficiaries);
    }
    let primary = wizard.form().section(Group::PrimaryBeneficiaries).len();
    let contingent = wizard.form().section(Group::ContingentBeneficiaries).len();

    let payload = btcwill_form::extract(wizard.form());
    assert_eq!(payload.beneficiaries.primary.len(), primary);
    assert_eq!(payload.beneficiaries.contingent.len(), contingent);
    assert_eq!(primary + contingent, 3 + 5);
}

#[test]
fn test_hidden_entry_field_does_not_block() {
    let mut wizard = wizard(StepLayout::FourPanel);
    fill_personal(&mut wizard);
    wizard.next().unwrap();
    fill_assets(&mut wizard);

    let wallet = first(&wizard, Group::Wallets);
    wizard
        .form_mut()
        .set_entry_field(wallet, "accessMethod", "")
        .unwrap();
    assert!(wizard.validate_step(2).is_err());
    assert!(wizard.invalid_fields().contains(&FieldRef::Entry {
        group: Group::Wallets,
        entry: wallet,
        field: "accessMethod",
    }));

    wizard.set_field_hidden(
        FieldRef::Entry {
            group: Group::Wallets,
            entry: wallet,
            field: "accessMethod",
        },
        true,
    );
    wizard.next().unwrap();
    assert_eq!(wizard.current_step(), 3);
}

#[test]
fn test_edit_flow_targets_record() {
    let record = WillRecord::from_json(
        r#"{
            "id": 42,
            "personal_info": "{\"full_name\":\"Satoshi\",\"date_of_birth\":\"1975-04-05\",\"executor_name\":\"Hal\",\"executor_contact\":\"hal@example.com\"}",
            "bitcoin_assets": {"wallets": [], "exchanges": []},
            "beneficiaries": {
                "primary": [
                    {"name": "A", "relationship": "Son", "percentage": 60},
                    {"name": "B", "relationship": "Daughter", "percentage": "40"}
                ],
                "contingent": [{"name": "C", "relationship": "Friend", "percentage": 100}]
            },
            "instructions": {
                "access_instructions": "Ask the lawyer",
                "trusted_contacts": [{"name": "Dan", "contact": "dan@example.com"}]
            }
        }"#,
    )
    .unwrap();

    let mut wizard = Wizard::new(StepLayout::FourPanel, ValidationPolicy::default());
    wizard.open(WizardMode::Edit { record_id: 42 });
    wizard.populate(&record);

    assert_eq!(wizard.current_step(), 1);
    assert_eq!(wizard.form().scalar("fullName"), "Satoshi");
    assert_eq!(wizard.form().section(Group::PrimaryBeneficiaries).len(), 2);
    assert_eq!(wizard.primary_total(), 100.0);

    // Empty wallet/exchange arrays leave nothing to fill on step 2
    assert!(wizard.form().section(Group::Wallets).is_empty());
    assert!(wizard.form().section(Group::Exchanges).is_empty());
    wizard.next().unwrap();
    wizard.next().unwrap();

    wizard.next().unwrap();
    let submission = wizard.submit().unwrap();
    assert_eq!(submission.target, SubmitTarget::Update(42));
    assert_eq!(submission.payload.beneficiaries.primary[1].percentage, 40.0);
    assert_eq!(
        submission.payload.instructions.trusted_contacts[0].contact,
        "dan@example.com"
    );

    wizard.close();
    assert_eq!(wizard.editing_id(), None);
}

#[test]
fn test_submit_revalidates_earlier_steps() {
    let mut wizard = wizard(StepLayout::FourPanel);
    fill_personal(&mut wizard);
    wizard.next().unwrap();
    fill_assets(&mut wizard);
    wizard.next().unwrap();
    fill_beneficiaries(&mut wizard);
    wizard.next().unwrap();
    fill_instructions(&mut wizard);

    wizard.form_mut().set_scalar("fullName", "").unwrap();
    let err = wizard.submit().unwrap_err();
    assert!(matches!(err, WizardError::Validation { step: 1, .. }));
}
