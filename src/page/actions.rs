use super::*;

impl Page {
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.click_node(target)
    }

    /// Routes a click through every unit that listens for it, in the order
    /// the page registered them.
    pub(crate) fn click_node(&mut self, target: NodeId) -> Result<()> {
        if !self.dom.contains(self.scope, target) {
            self.trace_line(format!("[event] click ignored outside scope {}", self.describe(target)));
            return Ok(());
        }
        if self.dom.disabled(target) {
            self.trace_line(format!("[event] click ignored on disabled {}", self.describe(target)));
            return Ok(());
        }
        self.trace_line(format!("[event] click {}", self.describe(target)));

        if let Some(index) = self.accordion.panel_for_node(&self.dom, target) {
            self.activate_panel_index(index, Activation::Pointer)?;
        }

        if let Some(nav) = self.nav.as_mut() {
            if nav.handle_click(&self.dom, target) {
                nav.render(&mut self.dom)?;
                let open = nav.is_open();
                self.trace_line(format!("[nav] open={open}"));
            }
        }

        self.follow_in_page_link(target)?;

        if target == self.scroll_button.node() {
            self.viewport.scroll_to_top();
            self.sync_scroll_button()?;
            self.trace_line("[scroll] to top".into());
        }

        if self.is_checkable(target) {
            self.toggle_checkable(target)?;
        }

        if is_submit_control(&self.dom, target, &self.config.forms)? {
            if let Some(index) = self.form_index_of(target) {
                self.submit_form(index)?;
            }
        }
        Ok(())
    }

    // The skip link jumps straight to its target; other in-page links
    // scroll there smoothly. Both move focus to the target.
    fn follow_in_page_link(&mut self, target: NodeId) -> Result<()> {
        let Some(link) = self.dom.closest(target, &self.config.scroll.anchor_selector)? else {
            return Ok(());
        };
        let href = self.dom.attr(link, "href").unwrap_or_default();
        let Some(destination) = fragment_target(&self.dom, &href) else {
            self.trace_line(format!("[scroll] no target for {href}"));
            return Ok(());
        };
        let behavior = if Some(link) == self.skip_link {
            ScrollBehavior::Instant
        } else {
            ScrollBehavior::Smooth
        };
        self.focus_node(destination)?;
        self.viewport
            .scroll_into_view(destination, behavior, ScrollBlock::Start);
        self.trace_line(format!("[scroll] {behavior:?} to {href}"));
        Ok(())
    }

    fn is_checkable(&self, node: NodeId) -> bool {
        self.dom.is_tag(node, "input")
            && self
                .dom
                .attr(node, "type")
                .is_some_and(|t| t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio"))
    }

    fn is_radio(&self, node: NodeId) -> bool {
        self.dom
            .attr(node, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("radio"))
    }

    fn toggle_checkable(&mut self, node: NodeId) -> Result<()> {
        let checked = self.is_radio(node) || !self.dom.checked(node)?;
        self.apply_checked(node, checked)
    }

    fn apply_checked(&mut self, node: NodeId, checked: bool) -> Result<()> {
        if self.dom.checked(node)? == checked {
            return Ok(());
        }
        if checked && self.is_radio(node) {
            self.uncheck_radio_group(node)?;
        }
        self.dom.set_checked(node, checked)?;
        self.dispatch_input(node)
    }

    fn uncheck_radio_group(&mut self, node: NodeId) -> Result<()> {
        let Some(name) = self.dom.attr(node, "name") else {
            return Ok(());
        };
        let container = self.dom.find_ancestor_by_tag(node, "form").unwrap_or(self.scope);
        for other in self.dom.query_selector_all_from(container, "input[type=radio]")? {
            if other != node && self.dom.attr(other, "name").as_deref() == Some(name.as_str()) {
                self.dom.set_checked(other, false)?;
                self.dispatch_input(other)?;
            }
        }
        Ok(())
    }

    fn dispatch_input(&mut self, node: NodeId) -> Result<()> {
        if let Some(index) = self.form_index_of(node) {
            if self.forms[index].on_input(&mut self.dom, node, &self.config.forms)? {
                self.trace_line(format!("[form] input {}", self.describe(node)));
            }
        }
        Ok(())
    }

    /// Replaces the value of an input or textarea and fires `input`.
    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        let tag = self
            .dom
            .tag_name(target)
            .unwrap_or("non-element")
            .to_ascii_lowercase();
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }
        self.dom.set_value(target, text)?;
        self.dispatch_input(target)
    }

    pub fn set_checked(&mut self, selector: &str, checked: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        if !self.is_checkable(target) {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "checkbox or radio input".into(),
                actual: self.describe(target),
            });
        }
        self.apply_checked(target, checked)
    }

    /// Selects the `<option>` whose value is `value`.
    pub fn select_option(&mut self, selector: &str, value: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if !self.dom.is_tag(target, "select") {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "select".into(),
                actual: self.describe(target),
            });
        }
        let known = self
            .dom
            .query_selector_all_from(target, "option")?
            .into_iter()
            .any(|option| self.dom.option_value(option) == value);
        if !known {
            return Err(Error::SelectorNotFound(format!("{selector} option[value={value}]")));
        }
        self.dom.set_value(target, value)?;
        self.dispatch_input(target)
    }

    /// Submits the form matched by `selector` (or enclosing the matched
    /// element), as the submit event would.
    pub fn submit(&mut self, selector: &str) -> Result<SubmissionOutcome> {
        let index = self.form_index_for(selector)?;
        self.submit_form(index)
    }

    /// Delivers a keydown to the element matched by `selector`.
    pub fn press_key(&mut self, selector: &str, key: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.key_down_on(target, key)
    }

    /// Delivers a keydown to the focused element, or to the scope when
    /// nothing has focus.
    pub fn key_down(&mut self, key: &str) -> Result<()> {
        let target = self.viewport.focused().unwrap_or(self.scope);
        self.key_down_on(target, key)
    }

    fn key_down_on(&mut self, target: NodeId, key: &str) -> Result<()> {
        self.trace_line(format!("[event] keydown {key:?} on {}", self.describe(target)));

        self.focus_mode.on_key(key);
        self.focus_mode.render(&mut self.dom)?;

        if key == "Escape" {
            if let Some(toggle) = self.nav.as_mut().and_then(NavMenu::handle_escape) {
                if let Some(nav) = &self.nav {
                    nav.render(&mut self.dom)?;
                }
                self.focus_node(toggle)?;
                self.trace_line("[nav] closed by Escape".into());
            }
            return Ok(());
        }

        let is_trigger = self
            .accordion
            .panels()
            .iter()
            .any(|panel| panel.trigger() == target);
        if is_trigger && Activation::from_key(key).is_some() {
            self.click_node(target)?;
        }
        Ok(())
    }

    pub fn mouse_down(&mut self) -> Result<()> {
        self.focus_mode.on_mouse_down();
        self.focus_mode.render(&mut self.dom)
    }

    /// Moves focus to the matched element, blurring the previous one.
    pub fn focus(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.focus_node(target)
    }

    pub(crate) fn focus_node(&mut self, target: NodeId) -> Result<()> {
        if let Some(previous) = self.viewport.focused() {
            if previous == target {
                return Ok(());
            }
            self.blur_node(previous)?;
        }
        self.viewport.focus(Some(target));
        Ok(())
    }

    /// Fires `blur` on the matched element, validating it if it is a form
    /// field.
    pub fn blur(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.blur_node(target)
    }

    fn blur_node(&mut self, target: NodeId) -> Result<()> {
        if self.viewport.focused() == Some(target) {
            self.viewport.focus(None);
        }
        let Some(index) = self.form_index_of(target) else {
            return Ok(());
        };
        if let Some(outcome) = self.forms[index].on_blur(&mut self.dom, target, &self.config)? {
            self.trace_line(format!(
                "[form] blur {} valid={}",
                self.describe(target),
                outcome.valid
            ));
        }
        Ok(())
    }

    pub fn scroll_to(&mut self, y: i64) -> Result<()> {
        self.viewport.set_scroll_y(y);
        self.sync_scroll_button()
    }

    fn sync_scroll_button(&mut self) -> Result<()> {
        if self.scroll_button.on_scroll(self.viewport.scroll_y()) {
            self.scroll_button.render(&mut self.dom)?;
        }
        Ok(())
    }
}
