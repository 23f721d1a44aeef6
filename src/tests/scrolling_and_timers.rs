use super::*;

#[test]
fn scroll_button_is_created_hidden() -> Result<()> {
    let page = Page::from_html(SITE_HTML)?;
    let button = page.scroll_button();
    assert_eq!(page.dom().tag_name(button), Some("button"));
    page.assert_attr("button.scroll-to-top", "aria-label", "Scroll to top of page")?;
    page.assert_text("button.scroll-to-top", "↑")?;
    assert_eq!(page.dom().style_get(button, "visibility").as_deref(), Some("hidden"));
    assert_eq!(page.dom().style_get(button, "opacity").as_deref(), Some("0"));
    Ok(())
}

#[test]
fn scroll_button_visibility_tracks_offset() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    let button = page.scroll_button();

    page.scroll_to(300)?;
    assert_eq!(page.dom().style_get(button, "visibility").as_deref(), Some("hidden"));

    page.scroll_to(301)?;
    assert_eq!(page.dom().style_get(button, "visibility").as_deref(), Some("visible"));
    assert_eq!(page.dom().style_get(button, "opacity").as_deref(), Some("1"));

    page.click("button.scroll-to-top")?;
    assert_eq!(page.viewport().scroll_y(), 0);
    assert_eq!(page.dom().style_get(button, "visibility").as_deref(), Some("hidden"));
    assert_eq!(
        page.viewport().last_scroll(),
        Some(&ScrollRequest {
            target: None,
            behavior: ScrollBehavior::Smooth,
            block: ScrollBlock::Start,
        })
    );
    Ok(())
}

#[test]
fn in_page_links_scroll_smoothly_and_focus_target() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.click("a[href='#contact']")?;

    let contact = page.select_one("#contact")?;
    page.assert_focused("#contact")?;
    assert_eq!(
        page.viewport().last_scroll(),
        Some(&ScrollRequest {
            target: Some(contact),
            behavior: ScrollBehavior::Smooth,
            block: ScrollBlock::Start,
        })
    );
    Ok(())
}

#[test]
fn links_to_missing_targets_are_ignored() -> Result<()> {
    let mut page = Page::from_html(
        r##"<body><a id="top-link" href="#">Top</a><a id="gone" href="#gone-section">Gone</a></body>"##,
    )?;
    page.click("#top-link")?;
    page.click("#gone")?;
    assert!(page.viewport().scroll_history().is_empty());
    assert_eq!(page.viewport().focused(), None);
    Ok(())
}

#[test]
fn tables_are_wrapped_at_mount() -> Result<()> {
    let page = Page::from_html(SITE_HTML)?;
    page.assert_exists(".table-container > #fees")?;
    assert_eq!(page.dom().query_selector_all(".table-container")?.len(), 1);
    Ok(())
}

#[test]
fn negative_time_is_rejected() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    assert!(matches!(page.advance_time(-1), Err(Error::InvalidArgument(_))));
    assert_eq!(page.now_ms(), 0);
    Ok(())
}

#[test]
fn timer_trace_lines_describe_each_advance() -> Result<()> {
    let mut page = Page::builder(SITE_HTML).trace(true).build()?;
    page.take_trace_logs();
    page.advance_time(1_000)?;
    assert_eq!(
        page.take_trace_logs(),
        vec!["[timer] advance delta_ms=1000 from=0 to=1000 ran_due=1".to_string()]
    );
    Ok(())
}

#[test]
fn trace_log_limit_drops_oldest_lines() -> Result<()> {
    let mut page = Page::builder(SITE_HTML).trace(true).build()?;
    page.take_trace_logs();
    page.set_trace_log_limit(2)?;
    page.advance_time(1)?;
    page.advance_time(2)?;
    page.advance_time(3)?;
    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 2);
    assert!(logs[0].contains("delta_ms=2"), "{logs:?}");
    assert!(page.set_trace_log_limit(0).is_err());
    Ok(())
}

#[test]
fn trace_is_off_by_default() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.click("#faq-fees")?;
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}
