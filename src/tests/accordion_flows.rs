use super::*;

#[test]
fn clicking_a_question_opens_its_answer() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.click("#faq-fees")?;

    page.assert_attr("#faq-fees", "aria-expanded", "true")?;
    page.assert_class("#faq-fees + .faq-answer", "active")?;
    page.assert_class("#faq-fees .faq-icon", "active")?;
    page.assert_attr("#faq-telehealth", "aria-expanded", "false")?;
    Ok(())
}

#[test]
fn opening_another_question_closes_the_first() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.click("#faq-fees")?;
    page.click("#faq-referral")?;

    page.assert_attr("#faq-fees", "aria-expanded", "false")?;
    page.assert_no_class("#faq-fees + .faq-answer", "active")?;
    page.assert_no_class("#faq-fees .faq-icon", "active")?;
    page.assert_attr("#faq-referral", "aria-expanded", "true")?;
    assert_eq!(page.accordion().expanded_count(), 1);
    Ok(())
}

#[test]
fn clicking_the_open_question_closes_everything() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.click("#faq-telehealth")?;
    page.click("#faq-telehealth")?;

    assert_eq!(page.accordion().expanded_count(), 0);
    assert!(page.dom().query_selector_all(".faq-answer.active")?.is_empty());
    Ok(())
}

#[test]
fn click_on_icon_inside_trigger_activates_the_panel() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.click("#faq-telehealth .faq-icon")?;
    page.assert_attr("#faq-telehealth", "aria-expanded", "true")?;
    Ok(())
}

#[test]
fn enter_and_space_match_pointer_activation() -> Result<()> {
    let mut by_key = Page::from_html(SITE_HTML)?;
    by_key.press_key("#faq-fees", "Enter")?;
    by_key.press_key("#faq-telehealth", " ")?;

    let mut by_click = Page::from_html(SITE_HTML)?;
    by_click.click("#faq-fees")?;
    by_click.click("#faq-telehealth")?;

    assert_eq!(by_key.accordion(), by_click.accordion());
    assert_eq!(by_key.dump_dom("#faq")?, by_click.dump_dom("#faq")?);
    Ok(())
}

#[test]
fn other_keys_do_not_activate() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.press_key("#faq-fees", "a")?;
    page.press_key("#faq-fees", "ArrowDown")?;
    assert_eq!(page.accordion().expanded_count(), 0);
    Ok(())
}

#[test]
fn activate_panel_by_id() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.activate_panel("faq-referral")?;
    page.assert_attr("#faq-referral", "aria-expanded", "true")?;

    assert_eq!(
        page.activate_panel("faq-missing"),
        Err(Error::UnknownPanel("faq-missing".into()))
    );
    assert_eq!(page.accordion().expanded_count(), 1);
    Ok(())
}

#[test]
fn accordion_trace_lines_are_recorded() -> Result<()> {
    let mut page = Page::builder(SITE_HTML).trace(true).build()?;
    page.take_trace_logs();
    page.click("#faq-fees")?;
    let logs = page.take_trace_logs();
    assert!(
        logs.iter()
            .any(|line| line == "[accordion] Pointer panel=faq-fees expanded=true"),
        "logs: {logs:?}"
    );
    Ok(())
}

#[test]
fn independent_panels_when_configured() -> Result<()> {
    let config = SiteConfig::from_toml_str("[accordion]\nexclusive = false\n")?;
    let mut page = Page::builder(SITE_HTML).config(config).build()?;
    page.click("#faq-fees")?;
    page.click("#faq-referral")?;
    assert_eq!(page.accordion().expanded_count(), 2);
    Ok(())
}

#[test]
fn keyboard_activation_works_without_a_body_element() -> Result<()> {
    let mut page = Page::from_html(
        r#"<button id="q1" class="faq-question" aria-expanded="false">Q</button><div class="faq-answer">A</div>"#,
    )?;
    page.press_key("#q1", "Enter")?;
    page.assert_attr("#q1", "aria-expanded", "true")?;

    page.press_key("#q1", "Tab")?;
    assert!(page.focus_mode().is_keyboard());
    page.mouse_down()?;
    assert!(!page.focus_mode().is_keyboard());

    page.press_key("#q1", " ")?;
    page.assert_attr("#q1", "aria-expanded", "false")?;
    assert_eq!(page.accordion().expanded_count(), 0);
    Ok(())
}
