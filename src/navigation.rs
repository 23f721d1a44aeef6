use super::*;

/// Mobile navigation menu state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavMenu {
    open: bool,
    toggle: NodeId,
    menu: NodeId,
    bars: Vec<NodeId>,
    links: Vec<NodeId>,
    active_class: String,
}

impl NavMenu {
    /// Returns `None` when the scope has no toggle or no menu.
    pub fn discover(dom: &Dom, scope: NodeId, config: &NavigationConfig) -> Result<Option<Self>> {
        let Some(toggle) = dom.query_selector_from(scope, &config.toggle_selector)? else {
            return Ok(None);
        };
        let Some(menu) = dom.query_selector_from(scope, &config.menu_selector)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            open: dom.attr(toggle, "aria-expanded").as_deref() == Some("true"),
            toggle,
            menu,
            bars: dom.query_selector_all_from(scope, &config.bar_selector)?,
            links: dom.query_selector_all_from(scope, &config.link_selector)?,
            active_class: config.active_class.clone(),
        }))
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle_node(&self) -> NodeId {
        self.toggle
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Applies a click at `target`. Returns `true` when the state changed.
    pub fn handle_click(&mut self, dom: &Dom, target: NodeId) -> bool {
        let before = self.open;
        if dom.contains(self.toggle, target) {
            self.toggle();
        } else if self.links.iter().any(|link| dom.contains(*link, target))
            || !dom.contains(self.menu, target)
        {
            self.close();
        }
        before != self.open
    }

    /// Escape closes an open menu; the caller moves focus to the returned
    /// toggle.
    pub fn handle_escape(&mut self) -> Option<NodeId> {
        if !self.open {
            return None;
        }
        self.close();
        Some(self.toggle)
    }

    pub fn render(&self, dom: &mut Dom) -> Result<()> {
        dom.set_attr(
            self.toggle,
            "aria-expanded",
            if self.open { "true" } else { "false" },
        )?;
        dom.class_set(self.menu, &self.active_class, self.open)?;
        for bar in &self.bars {
            dom.class_set(*bar, &self.active_class, self.open)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAV_HTML: &str = r#"
        <header>
          <button class="mobile-menu-toggle" aria-expanded="false">
            <span class="hamburger"></span><span class="hamburger"></span>
          </button>
          <ul class="nav-menu">
            <li><a class="nav-link" href="/about">About</a></li>
            <li><span id="menu-text">Menu</span></li>
          </ul>
        </header>
        <main id="content"><p id="body-text">Hello</p></main>
    "#;

    fn nav(dom: &Dom) -> Result<NavMenu> {
        NavMenu::discover(dom, dom.root(), &NavigationConfig::default())?
            .ok_or_else(|| Error::SelectorNotFound(".mobile-menu-toggle".into()))
    }

    #[test]
    fn missing_menu_disables_navigation() -> Result<()> {
        let dom = Dom::parse(r#"<button class="mobile-menu-toggle"></button>"#)?;
        assert!(NavMenu::discover(&dom, dom.root(), &NavigationConfig::default())?.is_none());
        Ok(())
    }

    #[test]
    fn click_routing() -> Result<()> {
        let dom = Dom::parse(NAV_HTML)?;
        let mut menu = nav(&dom)?;
        let bar = dom.query_selector(".hamburger")?.expect("bar");
        let link = dom.query_selector(".nav-link")?.expect("link");
        let inside = dom.by_id("menu-text").expect("menu text");
        let outside = dom.by_id("body-text").expect("body text");

        assert!(menu.handle_click(&dom, bar));
        assert!(menu.is_open());

        assert!(!menu.handle_click(&dom, inside));
        assert!(menu.is_open());

        assert!(menu.handle_click(&dom, link));
        assert!(!menu.is_open());

        menu.toggle();
        assert!(menu.handle_click(&dom, outside));
        assert!(!menu.is_open());
        Ok(())
    }

    #[test]
    fn escape_only_acts_on_open_menu() -> Result<()> {
        let dom = Dom::parse(NAV_HTML)?;
        let mut menu = nav(&dom)?;
        assert_eq!(menu.handle_escape(), None);
        menu.toggle();
        assert_eq!(menu.handle_escape(), Some(menu.toggle_node()));
        assert!(!menu.is_open());
        Ok(())
    }

    #[test]
    fn render_updates_toggle_menu_and_bars() -> Result<()> {
        let mut dom = Dom::parse(NAV_HTML)?;
        let mut menu = nav(&dom)?;
        menu.toggle();
        menu.render(&mut dom)?;

        let bars = dom.query_selector_all(".hamburger.active")?;
        assert_eq!(bars.len(), 2);
        assert!(dom.query_selector(".nav-menu.active")?.is_some());
        assert!(
            dom.query_selector(".mobile-menu-toggle[aria-expanded=true]")?
                .is_some()
        );

        menu.close();
        menu.render(&mut dom)?;
        assert!(dom.query_selector_all(".active")?.is_empty());
        Ok(())
    }
}
