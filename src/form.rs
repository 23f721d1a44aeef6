//! Per-form validation state and its projection onto the document.

use serde::Serialize;

use super::*;

/// Which confirmation a form receives. Only the configured appointment form
/// is an [`FormKind::Appointment`]; every other form is an enquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Appointment,
    Enquiry,
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Validation failed; field errors are rendered and nothing was sent.
    Invalid,
    /// The honeypot was filled in. Looks like a failure to the visitor.
    Rejected { message: String },
    /// Handed to the submitter; resolved by `Page::settle_submissions`.
    Pending,
    Accepted { message: String },
    Failed { message: String },
}

impl SubmissionOutcome {
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message } | Self::Accepted { message } | Self::Failed { message } => {
                Some(message)
            }
            Self::Invalid | Self::Pending => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageKind {
    Success,
    Error,
}

impl MessageKind {
    fn modifier(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    fn role(self) -> &'static str {
        match self {
            Self::Success => "status",
            Self::Error => "alert",
        }
    }
}

#[derive(Debug, Clone)]
struct FieldSlot {
    node: NodeId,
    // Base of the rendered error id: the control's id, else its name.
    anchor: String,
    // Checkboxes and radios only post their value while checked.
    checkable: bool,
    field: FormField,
    error_node: Option<NodeId>,
}

/// Validation and submission state for one `<form>`.
#[derive(Debug, Clone)]
pub struct FormController {
    form: NodeId,
    id: Option<String>,
    kind: FormKind,
    slots: Vec<FieldSlot>,
    honeypot: Option<NodeId>,
    submit_button: Option<NodeId>,
    submit_label: String,
    message_node: Option<NodeId>,
    message: Option<String>,
    pending: usize,
}

const NON_DATA_INPUT_TYPES: [&str; 5] = ["submit", "button", "reset", "hidden", "image"];

impl FormController {
    pub fn discover(dom: &Dom, form: NodeId, config: &FormsConfig) -> Result<Self> {
        let id = dom.attr(form, "id").filter(|id| !id.is_empty());
        let kind = if id.as_deref() == Some(config.appointment_form_id.as_str()) {
            FormKind::Appointment
        } else {
            FormKind::Enquiry
        };

        let mut slots = Vec::new();
        let mut honeypot = None;
        for (index, node) in dom
            .query_selector_all_from(form, &config.field_selector)?
            .into_iter()
            .enumerate()
        {
            let name = dom.attr(node, "name").filter(|name| !name.is_empty());
            if name.as_deref() == Some(config.honeypot_name.as_str()) {
                honeypot = Some(node);
                continue;
            }
            let tag = dom.tag_name(node).unwrap_or_default().to_string();
            let type_attr = dom.attr(node, "type");
            if tag == "input"
                && type_attr
                    .as_deref()
                    .is_some_and(|t| NON_DATA_INPUT_TYPES.contains(&t.to_ascii_lowercase().as_str()))
            {
                continue;
            }

            let control_id = dom.attr(node, "id").filter(|id| !id.is_empty());
            let field_name = name
                .clone()
                .or_else(|| control_id.clone())
                .unwrap_or_else(|| format!("field-{index}"));
            let anchor = control_id.unwrap_or_else(|| field_name.clone());
            let checkable = tag == "input"
                && type_attr
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio"));
            let field = FormField::new(field_name, FieldKind::from_control(&tag, type_attr.as_deref()))
                .required(dom.required(node))
                .with_value(dom.value(node)?)
                .with_checked(dom.checked(node)?);
            slots.push(FieldSlot {
                node,
                anchor,
                checkable,
                field,
                error_node: None,
            });
        }

        let mut submit_button = None;
        for node in dom.query_selector_all_from(form, "*")? {
            if is_submit_control(dom, node, config)? {
                submit_button = Some(node);
                break;
            }
        }
        let submit_label = submit_button
            .map(|button| dom.text_content(button))
            .unwrap_or_default();

        Ok(Self {
            form,
            id,
            kind,
            slots,
            honeypot,
            submit_button,
            submit_label,
            message_node: None,
            message: None,
            pending: 0,
        })
    }

    pub fn node(&self) -> NodeId {
        self.form
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.slots.iter().map(|slot| &slot.field)
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields().find(|field| field.name == name)
    }

    /// The form-level message currently shown, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub(crate) fn message_node(&self) -> Option<NodeId> {
        self.message_node
    }

    pub fn is_pending(&self) -> bool {
        self.pending > 0
    }

    pub fn submit_button(&self) -> Option<NodeId> {
        self.submit_button
    }

    pub(crate) fn owns(&self, dom: &Dom, node: NodeId) -> bool {
        dom.contains(self.form, node)
    }

    fn slot_index(&self, node: NodeId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.node == node)
    }

    fn sync_slot(&mut self, dom: &Dom, index: usize) -> Result<()> {
        let slot = &mut self.slots[index];
        slot.field.value = dom.value(slot.node)?;
        slot.field.checked = dom.checked(slot.node)?;
        slot.field.required = dom.required(slot.node);
        Ok(())
    }

    /// An edit clears the field's error before anything else looks at it.
    /// Returns `false` when `node` is not one of this form's fields.
    pub(crate) fn on_input(
        &mut self,
        dom: &mut Dom,
        node: NodeId,
        config: &FormsConfig,
    ) -> Result<bool> {
        let Some(index) = self.slot_index(node) else {
            return Ok(false);
        };
        self.sync_slot(dom, index)?;
        self.slots[index].field.clear_error();
        self.render_slot(dom, index, config)?;
        Ok(true)
    }

    pub(crate) fn on_blur(
        &mut self,
        dom: &mut Dom,
        node: NodeId,
        config: &SiteConfig,
    ) -> Result<Option<ValidationOutcome>> {
        let Some(index) = self.slot_index(node) else {
            return Ok(None);
        };
        self.sync_slot(dom, index)?;
        let outcome = self.check_slot(index, &config.messages);
        self.render_slot(dom, index, &config.forms)?;
        Ok(Some(outcome))
    }

    fn check_slot(&mut self, index: usize, messages: &MessagesConfig) -> ValidationOutcome {
        let slot = &mut self.slots[index];
        let outcome = validation::validate_field_with(&slot.field, messages);
        slot.field.apply(&outcome);
        if let Some(message) = &outcome.message {
            tracing::debug!(field = %slot.field.name, %message, "field failed validation");
        }
        outcome
    }

    /// Validates every field that has a rule to check and renders each
    /// field's own state. Every field is visited even after a failure.
    pub fn validate_form(&mut self, dom: &mut Dom, config: &SiteConfig) -> Result<bool> {
        self.clear_message(dom)?;
        let mut valid = true;
        for index in 0..self.slots.len() {
            self.sync_slot(dom, index)?;
            if self.slots[index].field.participates_in_form_check() {
                valid &= self.check_slot(index, &config.messages).valid;
            } else {
                self.slots[index].field.clear_error();
            }
            self.render_slot(dom, index, &config.forms)?;
        }

        if self.kind == FormKind::Appointment && !self.funding_selected(&config.forms) {
            self.show_message(dom, MessageKind::Error, &config.messages.funding_required, &config.forms)?;
            valid = false;
        }
        Ok(valid)
    }

    fn funding_selected(&self, config: &FormsConfig) -> bool {
        self.slots.iter().any(|slot| {
            slot.checkable && slot.field.name == config.funding_group_name && slot.field.checked
        })
    }

    fn render_slot(&mut self, dom: &mut Dom, index: usize, config: &FormsConfig) -> Result<()> {
        let parent = dom.parent(self.slots[index].node).unwrap_or(self.form);
        let slot = &mut self.slots[index];
        if let Some(old) = slot.error_node.take() {
            dom.remove_node(old)?;
        }

        let Some(message) = slot.field.error().map(str::to_string) else {
            dom.class_remove(slot.node, &config.error_class)?;
            dom.remove_attr(slot.node, "aria-invalid")?;
            dom.remove_attr(slot.node, "aria-describedby")?;
            return Ok(());
        };

        let error_id = format!("{}-error", slot.anchor);
        let error_node = dom.create_detached_element("div");
        dom.set_attr(error_node, "class", &config.error_message_class)?;
        dom.set_attr(error_node, "id", &error_id)?;
        dom.set_text_content(error_node, &message)?;
        dom.append_child(parent, error_node)?;

        dom.class_add(slot.node, &config.error_class)?;
        dom.set_attr(slot.node, "aria-invalid", "true")?;
        dom.set_attr(slot.node, "aria-describedby", &error_id)?;
        slot.error_node = Some(error_node);
        Ok(())
    }

    /// Replaces any form-level message with a new one appended to the form.
    pub(crate) fn show_message(
        &mut self,
        dom: &mut Dom,
        kind: MessageKind,
        text: &str,
        config: &FormsConfig,
    ) -> Result<NodeId> {
        self.clear_message(dom)?;
        let node = dom.create_detached_element("div");
        dom.set_attr(
            node,
            "class",
            &format!(
                "{base} {base}--{modifier}",
                base = config.form_message_class,
                modifier = kind.modifier()
            ),
        )?;
        dom.set_attr(node, "role", kind.role())?;
        dom.set_text_content(node, text)?;
        dom.append_child(self.form, node)?;
        self.message_node = Some(node);
        self.message = Some(text.to_string());
        Ok(node)
    }

    fn clear_message(&mut self, dom: &mut Dom) -> Result<()> {
        if let Some(node) = self.message_node.take() {
            dom.remove_node(node)?;
        }
        self.message = None;
        Ok(())
    }

    /// A filled honeypot marks the submission as automated.
    pub(crate) fn honeypot_tripped(&self, dom: &Dom) -> Result<bool> {
        match self.honeypot {
            Some(node) => Ok(!dom.value(node)?.is_empty()),
            None => Ok(false),
        }
    }

    pub(crate) fn set_pending(&mut self, dom: &mut Dom, pending: bool, sending: &str) -> Result<()> {
        if pending {
            self.pending += 1;
        } else {
            self.pending = self.pending.saturating_sub(1);
        }
        let Some(button) = self.submit_button else {
            return Ok(());
        };
        if self.is_pending() {
            dom.set_text_content(button, sending)?;
            dom.set_disabled(button, true)
        } else {
            dom.set_text_content(button, &self.submit_label)?;
            dom.set_disabled(button, false)
        }
    }

    /// Name/value pairs in document order. Unchecked boxes contribute
    /// nothing, matching what a browser would post.
    pub(crate) fn build_request(&self) -> SubmissionRequest {
        let fields = self
            .slots
            .iter()
            .filter(|slot| !slot.checkable || slot.field.checked)
            .map(|slot| {
                let value = if slot.checkable && slot.field.value.is_empty() {
                    "on".to_string()
                } else {
                    slot.field.value.clone()
                };
                (slot.field.name.clone(), value)
            })
            .collect();
        SubmissionRequest {
            form_id: self.id.clone(),
            kind: self.kind,
            fields,
        }
    }

    /// Restores every control to its markup default and drops field errors.
    /// The form-level message stays.
    pub(crate) fn reset(&mut self, dom: &mut Dom, config: &FormsConfig) -> Result<()> {
        let controls = self
            .slots
            .iter()
            .map(|slot| slot.node)
            .chain(self.honeypot)
            .collect::<Vec<_>>();
        for node in controls {
            reset_control(dom, node)?;
        }
        for index in 0..self.slots.len() {
            self.sync_slot(dom, index)?;
            self.slots[index].field.clear_error();
            self.render_slot(dom, index, config)?;
        }
        Ok(())
    }
}

/// Whether clicking `node` submits its form: it matches the configured
/// submit selector, or it is a `<button>` without a type or an
/// `<input type=submit>`.
pub(crate) fn is_submit_control(dom: &Dom, node: NodeId, config: &FormsConfig) -> Result<bool> {
    if dom.matches(node, &config.submit_selector)? {
        return Ok(true);
    }
    let type_attr = dom.attr(node, "type").map(|t| t.to_ascii_lowercase());
    Ok(if dom.is_tag(node, "button") {
        matches!(type_attr.as_deref(), None | Some("submit"))
    } else {
        dom.is_tag(node, "input") && type_attr.as_deref() == Some("submit")
    })
}

fn reset_control(dom: &mut Dom, node: NodeId) -> Result<()> {
    if dom.is_tag(node, "textarea") {
        let text = dom.text_content(node);
        return dom.set_value(node, &text);
    }
    if dom.is_tag(node, "select") {
        let options = dom.query_selector_all_from(node, "option")?;
        let default = options
            .iter()
            .copied()
            .find(|option| dom.has_attr(*option, "selected"))
            .or_else(|| options.first().copied());
        let value = default.map(|option| dom.option_value(option)).unwrap_or_default();
        return dom.set_value(node, &value);
    }
    let checked = dom.has_attr(node, "checked");
    dom.set_checked(node, checked)?;
    let value = dom.attr(node, "value").unwrap_or_default();
    dom.set_value(node, &value)
}
