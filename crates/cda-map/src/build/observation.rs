//! Social history, vital sign and generic observations.

use cda_model::record::{
    CodeableConcept, Coding, Observation, ObservationStatus, Quantity, Ratio,
};
use cda_model::{MappingError, RecordKind};

use super::EntryContext;
use crate::resolver::parse_number;

const DEFAULT_STATUS: &str = "final";
const CATEGORY_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/observation-category";
/// `xsi:type` of a blood-pressure style ratio value.
const RATIO_TYPE: &str = "RTO_PQ_PQ";

pub(super) fn build(context: &EntryContext<'_>) -> Result<Observation, MappingError> {
    let status_code = context.status(DEFAULT_STATUS);
    let status = ObservationStatus::from_code(&status_code)
        .ok_or_else(|| context.invalid_status(status_code))?;

    let code = match context.coding("code") {
        Some(mut coding) => {
            // Only generic observations borrow the section label as display.
            if context.kind == RecordKind::Observation
                && coding.display.is_none()
                && !context.label.is_empty()
            {
                coding.display = Some(context.label.to_string());
            }
            CodeableConcept::from_coding(coding)
        }
        None => CodeableConcept::from_text(context.label),
    };

    let mut observation =
        Observation::new(context.id.clone(), status, code, context.subject.clone());
    observation.meta = context.meta();
    observation.category = category(context.kind).into_iter().collect();

    observation.effective_date_time = context.resolver.date_time("effective.value")?;
    if observation.effective_date_time.is_none() {
        observation.effective_period = context.period("effective.low", "effective.high")?;
    }

    match context.kind {
        RecordKind::VitalSigns => vital_sign_value(context, &mut observation)?,
        _ => observed_value(context, &mut observation),
    }
    Ok(observation)
}

fn category(kind: RecordKind) -> Option<CodeableConcept> {
    let (code, display) = match kind {
        RecordKind::SocialHistory => ("social-history", "Social History"),
        RecordKind::VitalSigns => ("vital-signs", "Vital Signs"),
        _ => return None,
    };
    Some(CodeableConcept::from_coding(Coding::new(
        CATEGORY_SYSTEM,
        code,
        display,
    )))
}

fn vital_sign_value(
    context: &EntryContext<'_>,
    observation: &mut Observation,
) -> Result<(), MappingError> {
    let resolver = &context.resolver;
    if resolver.text("value.type").as_deref() == Some(RATIO_TYPE) {
        let part = |name: &str| Quantity {
            value: resolver
                .number(&format!("ratio.{name}.value"))
                .unwrap_or_default(),
            unit: resolver.text(&format!("ratio.{name}.unit")),
            ..Quantity::default()
        };
        observation.value_ratio = Some(Ratio {
            numerator: part("numerator"),
            denominator: part("denominator"),
        });
    } else {
        let value = resolver.required("value.value")?;
        observation.value_quantity = Some(Quantity {
            value: parse_number(&value),
            unit: resolver.text("value.unit"),
            system: resolver.text("value.system"),
            code: resolver.text("value.code"),
        });
    }
    Ok(())
}

/// Coded value first, then a numeric quantity, then free text.
fn observed_value(context: &EntryContext<'_>, observation: &mut Observation) {
    if let Some(concept) = context.concept("value") {
        observation.value_codeable_concept = Some(concept);
        return;
    }
    let resolver = &context.resolver;
    let Some(raw) = resolver.text("value.value") else {
        return;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => {
            observation.value_quantity = Some(Quantity {
                value,
                unit: resolver.text("value.unit"),
                system: resolver.text("value.unit_system"),
                code: None,
            });
        }
        _ => observation.value_string = Some(raw),
    }
}
