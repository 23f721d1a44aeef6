//! Field-level validation rules.
//!
//! Rules run on the trimmed value in a fixed precedence and the first match
//! wins, so a field never carries a required error and a format error at the
//! same time.

use std::sync::LazyLock;

use fancy_regex::Regex;

use super::*;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

static PHONE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9\s\-+()]+$").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Checkbox,
    Other,
}

impl FieldKind {
    /// Maps a control's tag and `type` attribute to the kind the rules use.
    pub fn from_control(tag: &str, type_attr: Option<&str>) -> Self {
        if !tag.eq_ignore_ascii_case("input") {
            return if tag.eq_ignore_ascii_case("textarea") {
                Self::Text
            } else {
                Self::Other
            };
        }
        match type_attr.map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("text") | Some("search") => Self::Text,
            Some("email") => Self::Email,
            Some("tel") => Self::Tel,
            Some("checkbox") => Self::Checkbox,
            Some(_) => Self::Other,
        }
    }

    fn has_format_rule(self) -> bool {
        matches!(self, Self::Email | Self::Tel)
    }
}

/// In-memory state of one input, textarea or select under validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub value: String,
    pub checked: bool,
    error: Option<String>,
}

impl FormField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            value: String::new(),
            checked: false,
            error: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The value the rules see: trimmed, and empty for an unchecked checkbox.
    pub fn effective_value(&self) -> &str {
        if self.kind == FieldKind::Checkbox && !self.checked {
            return "";
        }
        self.value.trim()
    }

    /// Whether form-level validation must look at this field.
    pub(crate) fn participates_in_form_check(&self) -> bool {
        self.required || (self.kind.has_format_rule() && !self.effective_value().is_empty())
    }

    pub(crate) fn apply(&mut self, outcome: &ValidationOutcome) {
        self.error = if outcome.valid {
            None
        } else {
            outcome.message.clone()
        };
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Validates `field` with the site's default messages.
pub fn validate_field(field: &FormField) -> ValidationOutcome {
    validate_field_with(field, &MessagesConfig::default())
}

pub(crate) fn validate_field_with(field: &FormField, messages: &MessagesConfig) -> ValidationOutcome {
    let value = field.effective_value();

    if field.required && value.is_empty() {
        return ValidationOutcome::invalid(&messages.required);
    }
    if value.is_empty() {
        return ValidationOutcome::valid();
    }

    match field.kind {
        FieldKind::Email if !pattern_matches(&EMAIL_PATTERN, value) => {
            ValidationOutcome::invalid(&messages.invalid_email)
        }
        FieldKind::Tel if !pattern_matches(&PHONE_PATTERN, value) => {
            ValidationOutcome::invalid(&messages.invalid_phone)
        }
        _ => ValidationOutcome::valid(),
    }
}

fn pattern_matches(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern
        .as_ref()
        .is_some_and(|regex| matches!(regex.is_match(value), Ok(true)))
}
