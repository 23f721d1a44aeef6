use super::*;

impl Page {
    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(self.failure(selector, target, expected, actual));
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(self.failure(selector, target, expected, actual));
        }
        Ok(())
    }

    pub fn assert_checked(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.checked(target)?;
        if actual != expected {
            return Err(self.failure(selector, target, &expected.to_string(), actual.to_string()));
        }
        Ok(())
    }

    pub fn assert_attr(&self, selector: &str, name: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        match self.dom.attr(target, name) {
            Some(actual) if actual == expected => Ok(()),
            actual => Err(self.failure(
                selector,
                target,
                &format!("{name}={expected:?}"),
                format!("{name}={actual:?}"),
            )),
        }
    }

    pub fn assert_no_attr(&self, selector: &str, name: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        match self.dom.attr(target, name) {
            None => Ok(()),
            Some(actual) => Err(self.failure(
                selector,
                target,
                &format!("no {name}"),
                format!("{name}={actual:?}"),
            )),
        }
    }

    pub fn assert_class(&self, selector: &str, class_name: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if !self.dom.class_contains(target, class_name) {
            let actual = self.dom.attr(target, "class").unwrap_or_default();
            return Err(self.failure(selector, target, &format!("class {class_name}"), actual));
        }
        Ok(())
    }

    pub fn assert_no_class(&self, selector: &str, class_name: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.class_contains(target, class_name) {
            let actual = self.dom.attr(target, "class").unwrap_or_default();
            return Err(self.failure(selector, target, &format!("no class {class_name}"), actual));
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn assert_absent(&self, selector: &str) -> Result<()> {
        let matches = self.dom.query_selector_all(selector)?;
        let Some(first) = matches.first().copied() else {
            return Ok(());
        };
        Err(self.failure(
            selector,
            first,
            "no match",
            format!("{} match(es)", matches.len()),
        ))
    }

    pub fn assert_focused(&self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let focused = self.viewport.focused();
        if focused != Some(target) {
            let actual = focused
                .map(|node| self.describe(node))
                .unwrap_or_else(|| "nothing".into());
            return Err(self.failure(selector, target, "focused", actual));
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub(crate) fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    fn failure(&self, selector: &str, target: NodeId, expected: &str, actual: String) -> Error {
        Error::AssertionFailed {
            selector: selector.to_string(),
            expected: expected.to_string(),
            actual,
            dom_snippet: self.node_snippet(target),
        }
    }
}
