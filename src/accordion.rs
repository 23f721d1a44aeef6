//! FAQ accordion: a set of question/answer panels with at most one open.

use super::*;

/// One FAQ entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub id: String,
    pub expanded: bool,
    pub(crate) trigger: NodeId,
    pub(crate) content: Option<NodeId>,
    pub(crate) icon: Option<NodeId>,
}

impl Panel {
    pub fn trigger(&self) -> NodeId {
        self.trigger
    }

    pub fn content(&self) -> Option<NodeId> {
        self.content
    }
}

/// How a panel was activated. Both variants run the same transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Pointer,
    Keyboard,
}

impl Activation {
    /// Enter and Space confirm a focused trigger; other keys do nothing.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Enter" | " " | "Space" | "Spacebar" => Some(Self::Keyboard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accordion {
    panels: Vec<Panel>,
    exclusive: bool,
    active_class: String,
}

impl Accordion {
    pub fn new(panels: Vec<Panel>, config: &AccordionConfig) -> Self {
        let mut accordion = Self {
            panels,
            exclusive: config.exclusive,
            active_class: config.active_class.clone(),
        };
        accordion.normalize();
        accordion
    }

    /// Builds panels from every trigger under `scope`. The answer is the
    /// trigger's next element sibling.
    pub fn discover(dom: &Dom, scope: NodeId, config: &AccordionConfig) -> Result<Self> {
        let triggers = dom.query_selector_all_from(scope, &config.trigger_selector)?;
        let mut panels = Vec::with_capacity(triggers.len());
        for (index, trigger) in triggers.into_iter().enumerate() {
            let id = dom
                .attr(trigger, "id")
                .or_else(|| dom.attr(trigger, "aria-controls"))
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("faq-{index}"));
            panels.push(Panel {
                id,
                expanded: dom.attr(trigger, "aria-expanded").as_deref() == Some("true"),
                trigger,
                content: dom.next_element_sibling(trigger),
                icon: dom.query_selector_from(trigger, &config.icon_selector)?,
            });
        }
        Ok(Self::new(panels, config))
    }

    // Markup may ship with several panels open; keep the first.
    fn normalize(&mut self) {
        if !self.exclusive {
            return;
        }
        let mut seen_open = false;
        for panel in &mut self.panels {
            if panel.expanded && seen_open {
                panel.expanded = false;
            }
            seen_open |= panel.expanded;
        }
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, panel_id: &str) -> Option<&Panel> {
        self.panels.iter().find(|panel| panel.id == panel_id)
    }

    pub fn expanded_panel(&self) -> Option<&Panel> {
        self.panels.iter().find(|panel| panel.expanded)
    }

    pub fn expanded_count(&self) -> usize {
        self.panels.iter().filter(|panel| panel.expanded).count()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Index of the panel whose trigger contains `node`.
    pub fn panel_for_node(&self, dom: &Dom, node: NodeId) -> Option<usize> {
        self.panels
            .iter()
            .position(|panel| dom.contains(panel.trigger, node))
    }

    /// Toggles `panel_id` and, in exclusive mode, closes every other panel.
    pub fn activate(&mut self, panel_id: &str) -> Result<()> {
        let index = self
            .panels
            .iter()
            .position(|panel| panel.id == panel_id)
            .ok_or_else(|| Error::UnknownPanel(panel_id.to_string()))?;
        self.activate_index(index)
    }

    pub fn activate_index(&mut self, index: usize) -> Result<()> {
        let was_expanded = self
            .panels
            .get(index)
            .map(|panel| panel.expanded)
            .ok_or_else(|| Error::UnknownPanel(format!("#{index}")))?;

        for (i, panel) in self.panels.iter_mut().enumerate() {
            if i == index {
                panel.expanded = !was_expanded;
            } else if self.exclusive {
                panel.expanded = false;
            }
        }

        tracing::debug!(
            panel = %self.panels[index].id,
            expanded = !was_expanded,
            "accordion panel toggled"
        );
        Ok(())
    }

    /// Projects every panel's state onto its trigger, answer and icon.
    pub fn render(&self, dom: &mut Dom) -> Result<()> {
        for panel in &self.panels {
            let expanded = if panel.expanded { "true" } else { "false" };
            dom.set_attr(panel.trigger, "aria-expanded", expanded)?;
            if let Some(content) = panel.content {
                dom.class_set(content, &self.active_class, panel.expanded)?;
            }
            if let Some(icon) = panel.icon {
                dom.class_set(icon, &self.active_class, panel.expanded)?;
            }
        }
        Ok(())
    }
}
