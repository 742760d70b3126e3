use cda_model::MappingError;
use cda_model::record::{
    Dosage, MedicationAdministration, MedicationAdministrationStatus, Quantity,
};

use super::EntryContext;

const DEFAULT_STATUS: &str = "completed";

pub(super) fn build(context: &EntryContext<'_>) -> Result<MedicationAdministration, MappingError> {
    let status_code = context.status(DEFAULT_STATUS);
    let status = MedicationAdministrationStatus::from_code(&status_code)
        .ok_or_else(|| context.invalid_status(status_code))?;

    let resolver = &context.resolver;
    let effective_date_time = resolver.date_time("effective.value")?;
    let effective_period = if effective_date_time.is_some() {
        None
    } else {
        context.period("effective.start", "effective.end")?
    };

    let dose = resolver.number("dosage.value").map(|value| Quantity {
        value,
        unit: resolver.text("dosage.unit"),
        system: resolver.text("dosage.unit_system"),
        code: None,
    });
    let route = context.concept("route");
    let dosage = (dose.is_some() || route.is_some()).then_some(Dosage { dose, route });

    Ok(MedicationAdministration {
        id: context.id.clone(),
        meta: context.meta(),
        status,
        medication_codeable_concept: context.concept("medication"),
        subject: context.subject.clone(),
        effective_date_time,
        effective_period,
        dosage,
    })
}
