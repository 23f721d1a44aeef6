use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBlock {
    Start,
    Nearest,
}

/// One scroll the page asked the viewport to perform. `target: None` is the
/// top of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub target: Option<NodeId>,
    pub behavior: ScrollBehavior,
    pub block: ScrollBlock,
}

/// Scroll offset, focus and the scroll requests issued so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    scroll_y: i64,
    focused: Option<NodeId>,
    history: Vec<ScrollRequest>,
}

impl Viewport {
    pub fn scroll_y(&self) -> i64 {
        self.scroll_y
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn last_scroll(&self) -> Option<&ScrollRequest> {
        self.history.last()
    }

    pub fn scroll_history(&self) -> &[ScrollRequest] {
        &self.history
    }

    pub(crate) fn set_scroll_y(&mut self, y: i64) {
        self.scroll_y = y.max(0);
    }

    pub(crate) fn focus(&mut self, node: Option<NodeId>) {
        self.focused = node;
    }

    pub(crate) fn scroll_into_view(&mut self, target: NodeId, behavior: ScrollBehavior, block: ScrollBlock) {
        self.history.push(ScrollRequest {
            target: Some(target),
            behavior,
            block,
        });
    }

    pub(crate) fn scroll_to_top(&mut self) {
        self.scroll_y = 0;
        self.history.push(ScrollRequest {
            target: None,
            behavior: ScrollBehavior::Smooth,
            block: ScrollBlock::Start,
        });
    }
}

/// The floating button that returns to the top of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScrollToTop {
    node: NodeId,
    visible: bool,
    threshold: i64,
}

impl ScrollToTop {
    pub(crate) fn create(dom: &mut Dom, host: NodeId, config: &ScrollConfig) -> Result<Self> {
        let node = dom.create_detached_element("button");
        dom.set_attr(node, "type", "button")?;
        dom.set_attr(node, "class", &config.button_class)?;
        dom.set_attr(node, "aria-label", &config.button_label)?;
        dom.set_text_content(node, &config.button_text)?;
        dom.append_child(host, node)?;
        Ok(Self {
            node,
            visible: false,
            threshold: config.show_after_px,
        })
    }

    pub(crate) fn node(&self) -> NodeId {
        self.node
    }

    /// Returns `true` when visibility flipped.
    pub(crate) fn on_scroll(&mut self, scroll_y: i64) -> bool {
        let visible = scroll_y > self.threshold;
        let changed = visible != self.visible;
        self.visible = visible;
        changed
    }

    pub(crate) fn render(&self, dom: &mut Dom) -> Result<()> {
        let (opacity, visibility) = if self.visible {
            ("1", "visible")
        } else {
            ("0", "hidden")
        };
        dom.style_set(self.node, "opacity", opacity)?;
        dom.style_set(self.node, "visibility", visibility)
    }
}
