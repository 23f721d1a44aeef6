use super::*;

/// The polite live region assistive technology reads page announcements
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveRegion {
    node: NodeId,
}

impl LiveRegion {
    /// Reuses an existing region by id, or appends a new one to `host`.
    pub(crate) fn ensure(dom: &mut Dom, host: NodeId, config: &AccessibilityConfig) -> Result<Self> {
        if let Some(node) = dom.by_id(&config.live_region_id) {
            return Ok(Self { node });
        }
        let node = dom.create_detached_element("div");
        dom.set_attr(node, "id", &config.live_region_id)?;
        dom.set_attr(node, "aria-live", "polite")?;
        dom.set_attr(node, "aria-atomic", "true")?;
        dom.set_attr(node, "class", "visually-hidden")?;
        dom.append_child(host, node)?;
        Ok(Self { node })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub(crate) fn announce(&self, dom: &mut Dom, text: &str) -> Result<()> {
        tracing::debug!(%text, "live region announcement");
        dom.set_text_content(self.node, text)
    }
}

/// Tracks whether the visitor is navigating with the keyboard, so focus
/// rings are only drawn for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusMode {
    keyboard: bool,
    body: NodeId,
    class: String,
}

impl FocusMode {
    pub(crate) fn new(body: NodeId, config: &AccessibilityConfig) -> Self {
        Self {
            keyboard: false,
            body,
            class: config.keyboard_navigation_class.clone(),
        }
    }

    pub fn is_keyboard(&self) -> bool {
        self.keyboard
    }

    /// Tab switches to keyboard mode; other keys leave it alone.
    pub(crate) fn on_key(&mut self, key: &str) {
        if key == "Tab" {
            self.keyboard = true;
        }
    }

    pub(crate) fn on_mouse_down(&mut self) {
        self.keyboard = false;
    }

    /// Markup without a `<body>` hosts the page on the document node, which
    /// has no class list; the mode is still tracked but not rendered.
    pub(crate) fn render(&self, dom: &mut Dom) -> Result<()> {
        if dom.element(self.body).is_none() {
            return Ok(());
        }
        dom.class_set(self.body, &self.class, self.keyboard)
    }
}

/// Resolves an in-page `href` such as `#main` to its target element.
pub(crate) fn fragment_target(dom: &Dom, href: &str) -> Option<NodeId> {
    let id = href.strip_prefix('#')?;
    if id.is_empty() {
        return None;
    }
    dom.by_id(id)
}
