// src/form/resolve.rs
use super::control::FormControl;
use crate::utils::non_blank_lower;

/// Canonical lowercase identifier for a control.
///
/// First non-blank wins: name, id, placeholder, `data-testid`, label text,
/// `aria-label`. Empty when the control carries none of them.
pub fn resolve_field_name(control: &FormControl) -> String {
    [
        control.name.as_str(),
        control.id.as_str(),
        control.placeholder.as_str(),
        control.test_id.as_str(),
        control.label.as_str(),
        control.aria_label.as_str(),
    ]
    .into_iter()
    .find_map(non_blank_lower)
    .unwrap_or_default()
}
