//! First-match resolution of template fields against a flat value map.

use cda_model::{FieldPaths, FlatValueMap, MappingError, ResourceTemplate};

use crate::datetime::normalize_date_time;

/// Tries each candidate path in declared order; the first present value
/// wins, then the declared default, then nothing.
pub fn resolve(values: &FlatValueMap, field: &FieldPaths) -> Option<String> {
    field
        .paths
        .iter()
        .find_map(|path| values.get(path))
        .map(str::to_string)
        .or_else(|| field.default.clone())
}

/// Numeric coercion: anything that is not a finite number becomes `0`.
pub fn parse_number(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .unwrap_or(0.0)
}

/// Resolves named template fields for one entry.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    values: &'a FlatValueMap,
    template: &'a ResourceTemplate,
}

impl<'a> Resolver<'a> {
    pub fn new(values: &'a FlatValueMap, template: &'a ResourceTemplate) -> Self {
        Self { values, template }
    }

    pub fn template(&self) -> &'a ResourceTemplate {
        self.template
    }

    /// A field the template does not declare resolves to nothing.
    pub fn text(&self, field: &str) -> Option<String> {
        self.template
            .field(field)
            .and_then(|paths| resolve(self.values, paths))
    }

    pub fn required(&self, field: &str) -> Result<String, MappingError> {
        self.text(field).ok_or_else(|| MappingError::MissingField {
            field: field.to_string(),
        })
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.text(field).as_deref().map(parse_number)
    }

    /// Resolves and normalises a date/time field.
    pub fn date_time(&self, field: &str) -> Result<Option<String>, MappingError> {
        self.text(field)
            .map(|value| {
                normalize_date_time(&value).ok_or_else(|| MappingError::InvalidDateTime {
                    field: field.to_string(),
                    value,
                })
            })
            .transpose()
    }
}
