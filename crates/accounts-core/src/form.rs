//! Field-touch tracking.
//!
//! Errors stay hidden until a field has been touched (lost focus at least
//! once), even when the value is already invalid.

use std::collections::HashSet;

use crate::validate::{self, Field};

/// Display hint for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    /// Not touched yet: no visual state.
    Untouched,
    Valid,
    Invalid,
}

impl FieldStatus {
    /// CSS-style class hint (`""`, `"is-valid"`, `"is-invalid"`).
    pub fn class_name(self) -> &'static str {
        match self {
            FieldStatus::Untouched => "",
            FieldStatus::Valid => "is-valid",
            FieldStatus::Invalid => "is-invalid",
        }
    }
}

/// Set of fields the user has interacted with on the active form.
#[derive(Debug, Clone, Default)]
pub struct TouchedFields {
    touched: HashSet<Field>,
}

impl TouchedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `field` as touched. Idempotent.
    pub fn touch(&mut self, field: Field) {
        self.touched.insert(field);
    }

    pub fn is_touched(&self, field: Field) -> bool {
        self.touched.contains(&field)
    }

    /// Error for `value`, or `None` while the field is untouched.
    pub fn error_for(&self, field: Field, value: &str) -> Option<&'static str> {
        self.gate(field, validate::validate(field, value))
    }

    /// Hides an already computed rule result until `field` is touched.
    ///
    /// Used for rules that need more than the field's own value, such as the
    /// password confirmation.
    pub fn gate(&self, field: Field, error: Option<&'static str>) -> Option<&'static str> {
        if self.is_touched(field) { error } else { None }
    }

    pub fn is_valid(&self, field: Field, value: &str) -> bool {
        self.error_for(field, value).is_none()
    }

    pub fn status_for(&self, field: Field, value: &str) -> FieldStatus {
        self.status_of(field, validate::validate(field, value))
    }

    /// Status for an already computed rule result.
    pub fn status_of(&self, field: Field, error: Option<&'static str>) -> FieldStatus {
        match (self.is_touched(field), error) {
            (false, _) => FieldStatus::Untouched,
            (true, None) => FieldStatus::Valid,
            (true, Some(_)) => FieldStatus::Invalid,
        }
    }

    /// Forgets every touched field.
    pub fn reset(&mut self) {
        self.touched.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }
}
