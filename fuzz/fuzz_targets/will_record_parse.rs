#![no_main]

use btcwill_form::{extract, StepLayout, ValidationPolicy, WillRecord, Wizard, WizardMode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Backend records are untrusted: parsing must return Ok or Err, never panic.
    let text = String::from_utf8_lossy(data);
    let Ok(record) = WillRecord::from_json(&text) else {
        return;
    };

    // Whatever parsed must survive populate -> validate -> extract
    let mut wizard = Wizard::new(StepLayout::FivePanel, ValidationPolicy::default());
    wizard.open(WizardMode::Edit { record_id: 1 });
    wizard.populate(&record);
    for step in 1..=wizard.total_steps() {
        let _ = wizard.validate_step(step);
    }
    let payload = extract(wizard.form());
    let _ = payload.primary_total();
});
