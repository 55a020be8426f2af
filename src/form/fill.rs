// src/form/fill.rs
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::control::{ChangeEvent, FieldKind, FillError, FormControl, FormSurface};
use super::matcher::{match_value, AutofillData};
use super::resolve::resolve_field_name;

pub const NO_MATCHING_DATA: &str = "No matching data found";

/// Per-field failure, labelled with the field's 1-based position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_ref: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedField {
    pub field_ref: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOutcome {
    #[serde(rename = "filled")]
    pub filled_count: usize,
    pub errors: Vec<FieldError>,
    #[serde(default)]
    pub skipped: Vec<SkippedField>,
}

impl FillOutcome {
    pub fn message(&self) -> String {
        format!("Successfully filled {} fields", self.filled_count)
    }
}

/// What applying a value did to one control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Changed,
    Unchanged(&'static str),
}

#[derive(Debug)]
pub struct FormFiller {
    highlight: bool,
}

impl Default for FormFiller {
    fn default() -> Self {
        Self::new()
    }
}

impl FormFiller {
    pub fn new() -> Self {
        Self { highlight: true }
    }

    pub fn without_highlight() -> Self {
        Self { highlight: false }
    }

    /// Fill every control of the surface from `data`.
    ///
    /// A failure on one control is recorded and the rest are still filled.
    pub fn fill<S: FormSurface + ?Sized>(&self, surface: &mut S, data: &AutofillData) -> FillOutcome {
        let mut outcome = FillOutcome::default();
        let mut radio_groups: HashSet<String> = HashSet::new();

        for index in 0..surface.controls().len() {
            let control = surface.controls()[index].clone();
            let field_ref = format!("Input {}", index + 1);
            let kind = control.kind();
            let name = resolve_field_name(&control);

            let skip = |reason: &str| SkippedField {
                field_ref: field_ref.clone(),
                name: name.clone(),
                kind,
                reason: reason.to_string(),
            };

            if kind.is_ignored() {
                outcome.skipped.push(skip("Ignored input type"));
                continue;
            }
            if kind == FieldKind::Radio
                && !control.name.is_empty()
                && radio_groups.contains(&control.name)
            {
                outcome.skipped.push(skip("Radio group already filled"));
                continue;
            }

            let value = match match_value(&name, data) {
                Some(found) if !found.value.is_empty() => {
                    debug!("{} '{}' matched key '{}' ({:?})", field_ref, name, found.key, found.tier);
                    found.value.to_string()
                }
                _ => {
                    debug!("{} '{}' has no matching data", field_ref, name);
                    outcome.skipped.push(skip(NO_MATCHING_DATA));
                    continue;
                }
            };

            match self.apply(surface, index, &control, &value) {
                Ok(Applied::Changed) => {
                    if kind == FieldKind::Radio && !control.name.is_empty() {
                        radio_groups.insert(control.name.clone());
                    }
                    outcome.filled_count += 1;
                }
                Ok(Applied::Unchanged(reason)) => outcome.skipped.push(skip(reason)),
                Err(e) => {
                    warn!("Failed to fill {}: {}", field_ref, e);
                    outcome.errors.push(FieldError {
                        field_ref: field_ref.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Filled {} fields, {} errors, {} skipped",
            outcome.filled_count,
            outcome.errors.len(),
            outcome.skipped.len()
        );
        outcome
    }

    fn apply<S: FormSurface + ?Sized>(
        &self,
        surface: &mut S,
        index: usize,
        control: &FormControl,
        value: &str,
    ) -> Result<Applied, FillError> {
        let target = match control.kind() {
            kind if kind.is_text_like() => {
                surface.set_value(index, value)?;
                surface.notify_changed(index, ChangeEvent::Input)?;
                surface.notify_changed(index, ChangeEvent::Change)?;
                index
            }
            FieldKind::Select => {
                let wanted = value.to_lowercase();
                let Some(option) = control.options.iter().find(|option| {
                    option.value.to_lowercase() == wanted || option.text.to_lowercase() == wanted
                }) else {
                    return Ok(Applied::Unchanged("No matching option"));
                };
                surface.set_value(index, &option.value)?;
                surface.notify_changed(index, ChangeEvent::Change)?;
                index
            }
            FieldKind::Radio => {
                let wanted = value.to_lowercase();
                // a nameless radio has no group, so only itself can match
                let sibling = if control.name.is_empty() {
                    (control.value.to_lowercase() == wanted).then_some(index)
                } else {
                    surface.controls().iter().position(|other| {
                        other.kind() == FieldKind::Radio
                            && other.name == control.name
                            && other.value.to_lowercase() == wanted
                    })
                };
                let Some(sibling) = sibling else {
                    return Ok(Applied::Unchanged("No matching radio option"));
                };
                surface.set_checked(sibling, true)?;
                surface.notify_changed(sibling, ChangeEvent::Change)?;
                sibling
            }
            FieldKind::Checkbox => {
                if !matches!(value.to_lowercase().as_str(), "true" | "yes") {
                    return Ok(Applied::Unchanged("Checkbox value is not affirmative"));
                }
                surface.set_checked(index, true)?;
                surface.notify_changed(index, ChangeEvent::Change)?;
                index
            }
            _ => return Ok(Applied::Unchanged("Unsupported input type")),
        };

        if self.highlight {
            surface.highlight(target);
        }
        Ok(Applied::Changed)
    }
}
