use std::path::Path;

use serde::{Deserialize, Serialize};

use super::*;

/// Markup hooks, messages and thresholds for every behaviour unit.
///
/// Every section falls back to the site's defaults, so a TOML file only
/// needs the keys it overrides:
///
/// ```toml
/// [forms]
/// honeypot_name = "url"
///
/// [scroll]
/// show_after_px = 480
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub accordion: AccordionConfig,
    pub navigation: NavigationConfig,
    pub forms: FormsConfig,
    pub messages: MessagesConfig,
    pub accessibility: AccessibilityConfig,
    pub scroll: ScrollConfig,
    pub tables: TablesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccordionConfig {
    pub trigger_selector: String,
    pub icon_selector: String,
    pub active_class: String,
    /// When `true`, opening a panel closes every other panel in the set.
    pub exclusive: bool,
}

impl Default for AccordionConfig {
    fn default() -> Self {
        Self {
            trigger_selector: ".faq-question".into(),
            icon_selector: ".faq-icon".into(),
            active_class: "active".into(),
            exclusive: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationConfig {
    pub toggle_selector: String,
    pub menu_selector: String,
    pub bar_selector: String,
    pub link_selector: String,
    pub active_class: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            toggle_selector: ".mobile-menu-toggle".into(),
            menu_selector: ".nav-menu".into(),
            bar_selector: ".hamburger".into(),
            link_selector: ".nav-link".into(),
            active_class: "active".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormsConfig {
    pub form_selector: String,
    pub field_selector: String,
    pub submit_selector: String,
    pub honeypot_name: String,
    pub error_class: String,
    pub error_message_class: String,
    pub form_message_class: String,
    pub appointment_form_id: String,
    pub funding_group_name: String,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            form_selector: "form".into(),
            field_selector: "input, textarea, select".into(),
            submit_selector: "button[type=submit]".into(),
            honeypot_name: "website".into(),
            error_class: "error".into(),
            error_message_class: "error-message".into(),
            form_message_class: "form-message".into(),
            appointment_form_id: "appointment-form".into(),
            funding_group_name: "funding".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessagesConfig {
    pub required: String,
    pub invalid_email: String,
    pub invalid_phone: String,
    pub funding_required: String,
    pub submit_error: String,
    pub sending: String,
    /// `{subject}` is replaced with `appointment_subject` or `enquiry_subject`.
    pub submit_success: String,
    pub appointment_subject: String,
    pub enquiry_subject: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            required: "This field is required.".into(),
            invalid_email: "Please enter a valid email address.".into(),
            invalid_phone: "Please enter a valid phone number.".into(),
            funding_required: "Please select at least one funding option.".into(),
            submit_error: "There was an error submitting your form. Please try again.".into(),
            sending: "Sending...".into(),
            submit_success: "Thank you! Your {subject} has been received. We'll get back to you as soon as possible.".into(),
            appointment_subject: "appointment request".into(),
            enquiry_subject: "enquiry".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessibilityConfig {
    pub skip_link_selector: String,
    pub live_region_id: String,
    pub page_title_selector: String,
    pub page_loaded_prefix: String,
    pub announce_delay_ms: i64,
    pub keyboard_navigation_class: String,
}

impl Default for AccessibilityConfig {
    fn default() -> Self {
        Self {
            skip_link_selector: ".skip-link".into(),
            live_region_id: "live-region".into(),
            page_title_selector: "h1".into(),
            page_loaded_prefix: "Page loaded: ".into(),
            announce_delay_ms: 1000,
            keyboard_navigation_class: "keyboard-navigation".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrollConfig {
    pub button_class: String,
    pub button_label: String,
    pub button_text: String,
    pub show_after_px: i64,
    pub anchor_selector: String,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            button_class: "scroll-to-top".into(),
            button_label: "Scroll to top of page".into(),
            button_text: "↑".into(),
            show_after_px: 300,
            anchor_selector: "a[href^=\"#\"]".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TablesConfig {
    pub container_class: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            container_class: "table-container".into(),
        }
    }
}

impl SiteConfig {
    /// Parses a TOML document, filling unspecified keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is not valid TOML or contains
    /// unknown keys.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::Config(format!("failed to parse config: {e}")))
    }

    /// Loads the configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))
    }

    pub(crate) fn success_message(&self, kind: FormKind) -> String {
        let subject = match kind {
            FormKind::Appointment => &self.messages.appointment_subject,
            FormKind::Enquiry => &self.messages.enquiry_subject,
        };
        self.messages.submit_success.replace("{subject}", subject)
    }
}
