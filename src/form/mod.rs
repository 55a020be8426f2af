// src/form/mod.rs
//! Form field identification, value matching and filling.

pub mod control;
pub mod extract;
pub mod fill;
pub mod html;
pub mod label;
pub mod matcher;
pub mod resolve;

pub use control::{ChangeEvent, FieldKind, FillError, FormControl, FormSurface, SelectOption};
pub use extract::{extract_fields, scrape_form_fields, FieldDescriptor};
pub use fill::{FieldError, FillOutcome, FormFiller, SkippedField};
pub use html::HtmlForm;
pub use matcher::{match_value, AutofillData, Match, MatchTier};
pub use resolve::resolve_field_name;
