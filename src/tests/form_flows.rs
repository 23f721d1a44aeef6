use std::sync::Arc;

use futures::executor::block_on;

use super::*;

#[test]
fn blur_on_empty_required_field_shows_inline_error() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.focus("#name")?;
    page.blur("#name")?;

    page.assert_class("#name", "error")?;
    page.assert_attr("#name", "aria-invalid", "true")?;
    page.assert_attr("#name", "aria-describedby", "name-error")?;
    page.assert_text("#name-error", "This field is required.")?;
    page.assert_class("#name-error", "error-message")?;
    Ok(())
}

#[test]
fn moving_focus_validates_the_field_left_behind() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.focus("#email")?;
    page.type_text("#email", "ada@example")?;
    page.focus("#phone")?;

    page.assert_text("#email-error", "Please enter a valid email address.")?;
    page.assert_focused("#phone")?;
    Ok(())
}

#[test]
fn typing_clears_the_error_before_revalidation() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.type_text("#phone", "555-CALL-NOW")?;
    page.blur("#phone")?;
    page.assert_text("#phone-error", "Please enter a valid phone number.")?;

    // Still invalid, but editing alone never shows an error.
    page.type_text("#phone", "555-CALL")?;
    page.assert_no_class("#phone", "error")?;
    page.assert_no_attr("#phone", "aria-invalid")?;
    page.assert_no_attr("#phone", "aria-describedby")?;
    page.assert_absent("#phone-error")?;

    page.blur("#phone")?;
    page.assert_exists("#phone-error")?;
    Ok(())
}

#[test]
fn optional_fields_accept_empty_values() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.blur("#phone")?;
    page.assert_absent(".error-message")?;
    Ok(())
}

#[test]
fn submitting_an_empty_form_marks_every_required_field() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    let outcome = page.submit("#contact-form")?;

    assert_eq!(outcome, SubmissionOutcome::Invalid);
    for id in ["name", "email", "message", "consent"] {
        page.assert_class(&format!("#{id}"), "error")?;
        page.assert_text(&format!("#{id}-error"), "This field is required.")?;
    }
    page.assert_no_class("#phone", "error")?;
    assert_eq!(page.pending_submissions(), 0);
    Ok(())
}

#[test]
fn one_message_per_field_after_repeated_submits() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    page.submit("#contact-form")?;
    page.submit("#contact-form")?;
    page.click("#send")?;
    assert_eq!(page.dom().query_selector_all(".error-message")?.len(), 4);
    Ok(())
}

#[test]
fn invalid_optional_phone_blocks_submission() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    fill_contact_form(&mut page)?;
    page.type_text("#phone", "call me maybe")?;

    assert_eq!(page.submit("#name")?, SubmissionOutcome::Invalid);
    page.assert_text("#phone-error", "Please enter a valid phone number.")?;
    assert_eq!(page.dom().query_selector_all(".error-message")?.len(), 1);
    Ok(())
}

#[test]
fn valid_submission_goes_pending_then_succeeds() -> Result<()> {
    let submitter = Arc::new(SimulatedSubmitter::new());
    let mut page = Page::builder(SITE_HTML)
        .submitter(submitter.clone())
        .build()?;
    fill_contact_form(&mut page)?;
    page.type_text("#phone", "+61 (02) 9999-0000")?;

    page.click("#send")?;
    assert_eq!(page.last_submission(), Some(&SubmissionOutcome::Pending));
    page.assert_text("#send", "Sending...")?;
    page.assert_attr("#send", "disabled", "true")?;

    // The disabled control swallows a second click.
    page.click("#send")?;
    assert_eq!(page.pending_submissions(), 1);

    let outcomes = block_on(page.settle_submissions())?;
    let expected =
        "Thank you! Your enquiry has been received. We'll get back to you as soon as possible.";
    assert_eq!(
        outcomes,
        vec![SubmissionOutcome::Accepted {
            message: expected.into()
        }]
    );
    page.assert_text("#contact-form .form-message", expected)?;
    page.assert_class(".form-message", "form-message--success")?;
    page.assert_attr(".form-message", "role", "status")?;
    page.assert_text("#send", "Send Message")?;
    page.assert_no_attr("#send", "disabled")?;

    page.assert_value("#name", "")?;
    page.assert_value("#message", "")?;
    page.assert_checked("#consent", false)?;

    let requests = submitter.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].form_id.as_deref(), Some("contact-form"));
    assert_eq!(requests[0].field("email"), Some("ada@example.com"));
    assert_eq!(requests[0].field("consent"), Some("yes"));
    assert_eq!(requests[0].field("website"), None);
    Ok(())
}

#[test]
fn success_message_is_scrolled_into_view() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    fill_contact_form(&mut page)?;
    page.submit("#contact-form")?;
    block_on(page.settle_submissions())?;

    let message = page.select_one(".form-message")?;
    assert_eq!(
        page.viewport().last_scroll(),
        Some(&ScrollRequest {
            target: Some(message),
            behavior: ScrollBehavior::Smooth,
            block: ScrollBlock::Nearest,
        })
    );
    Ok(())
}

#[test]
fn filled_honeypot_is_rejected_without_calling_the_submitter() -> Result<()> {
    let submitter = Arc::new(SimulatedSubmitter::new());
    let mut page = Page::builder(SITE_HTML)
        .submitter(submitter.clone())
        .build()?;
    fill_contact_form(&mut page)?;
    page.type_text("#website", "http://spam.example")?;

    let outcome = page.submit("#contact-form")?;
    let generic = "There was an error submitting your form. Please try again.";
    assert_eq!(
        outcome,
        SubmissionOutcome::Rejected {
            message: generic.into()
        }
    );
    page.assert_text(".form-message", generic)?;
    page.assert_class(".form-message", "form-message--error")?;
    page.assert_text("#send", "Send Message")?;
    page.assert_no_attr("#send", "disabled")?;

    assert!(block_on(page.settle_submissions())?.is_empty());
    assert_eq!(submitter.request_count(), 0);
    page.assert_value("#name", "Ada Lovelace")?;
    Ok(())
}

#[test]
fn submitter_failure_shows_generic_error_and_keeps_values() -> Result<()> {
    let mut page = Page::builder(SITE_HTML)
        .submitter(Arc::new(FailingSubmitter::new("503 from form relay")))
        .build()?;
    fill_contact_form(&mut page)?;
    page.submit("#contact-form")?;

    let outcomes = block_on(page.settle_submissions())?;
    assert!(matches!(outcomes.as_slice(), [SubmissionOutcome::Failed { .. }]));
    page.assert_text(
        ".form-message",
        "There was an error submitting your form. Please try again.",
    )?;
    page.assert_attr(".form-message", "role", "alert")?;
    page.assert_text("#send", "Send Message")?;
    page.assert_value("#name", "Ada Lovelace")?;
    Ok(())
}

#[test]
fn a_new_form_message_replaces_the_previous_one() -> Result<()> {
    let mut page = Page::builder(SITE_HTML)
        .submitter(Arc::new(FailingSubmitter::new("offline")))
        .build()?;
    fill_contact_form(&mut page)?;
    page.submit("#contact-form")?;
    block_on(page.settle_submissions())?;
    page.submit("#contact-form")?;
    block_on(page.settle_submissions())?;
    assert_eq!(page.dom().query_selector_all(".form-message")?.len(), 1);
    Ok(())
}

#[test]
fn appointment_form_needs_a_funding_option() -> Result<()> {
    let mut page = Page::from_html(APPOINTMENT_HTML)?;
    page.type_text("#client-name", "Grace")?;
    page.type_text("#client-email", "grace@example.com")?;

    assert_eq!(page.submit("#appointment-form")?, SubmissionOutcome::Invalid);
    page.assert_text(".form-message", "Please select at least one funding option.")?;
    page.assert_absent(".error-message")?;
    let message = page.select_one(".form-message")?;
    assert_eq!(
        page.viewport().last_scroll().and_then(|scroll| scroll.target),
        Some(message)
    );

    page.click("input[value=ndis]")?;
    assert_eq!(page.submit("#appointment-form")?, SubmissionOutcome::Pending);
    page.assert_absent(".form-message")?;

    let outcomes = block_on(page.settle_submissions())?;
    assert_eq!(
        outcomes[0].message(),
        Some("Thank you! Your appointment request has been received. We'll get back to you as soon as possible.")
    );
    page.assert_checked("input[value=ndis]", false)?;
    page.assert_value("#session", "telehealth")?;
    Ok(())
}

#[test]
fn select_option_updates_value_and_request() -> Result<()> {
    let submitter = Arc::new(SimulatedSubmitter::new());
    let mut page = Page::builder(APPOINTMENT_HTML)
        .submitter(submitter.clone())
        .build()?;
    page.assert_value("#session", "telehealth")?;
    page.select_option("#session", "in-person")?;
    page.type_text("#client-name", "Grace")?;
    page.type_text("#client-email", "grace@example.com")?;
    page.set_checked("input[value=medicare]", true)?;
    page.set_checked("input[value=private]", true)?;
    page.submit("#appointment-form")?;
    block_on(page.settle_submissions())?;

    let requests = submitter.requests();
    assert_eq!(requests[0].kind, FormKind::Appointment);
    assert_eq!(requests[0].field("session"), Some("in-person"));
    assert_eq!(requests[0].values("funding"), ["medicare", "private"]);
    assert!(page.select_option("#session", "phone").is_err());
    Ok(())
}

#[test]
fn type_text_rejects_non_text_controls() -> Result<()> {
    let mut page = Page::from_html(SITE_HTML)?;
    let err = page.type_text("#send", "x");
    assert!(matches!(err, Err(Error::TypeMismatch { .. })));
    assert!(matches!(
        page.set_checked("#name", true),
        Err(Error::TypeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn assertion_failures_carry_a_dom_snippet() -> Result<()> {
    let page = Page::from_html(SITE_HTML)?;
    match page.assert_value("#name", "Ada") {
        Err(Error::AssertionFailed {
            selector,
            expected,
            actual,
            dom_snippet,
        }) => {
            assert_eq!(selector, "#name");
            assert_eq!(expected, "Ada");
            assert_eq!(actual, "");
            assert!(dom_snippet.starts_with("<input"), "{dom_snippet}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[test]
fn radio_funding_choice_satisfies_the_appointment_form() -> Result<()> {
    let mut page = Page::from_html(
        r#"<body>
  <form id="appointment-form">
    <input type="text" id="client-name" name="client-name" required>
    <label><input type="radio" id="medicare" name="funding" value="medicare"> Medicare</label>
    <label><input type="radio" id="private" name="funding" value="private"> Private</label>
    <button type="submit">Request</button>
  </form>
</body>"#,
    )?;
    page.type_text("#client-name", "Grace")?;
    assert_eq!(page.submit("#appointment-form")?, SubmissionOutcome::Invalid);
    page.assert_text(".form-message", "Please select at least one funding option.")?;

    page.set_checked("#private", true)?;
    assert_eq!(page.submit("#appointment-form")?, SubmissionOutcome::Pending);
    let outcomes = block_on(page.settle_submissions())?;
    assert!(matches!(outcomes[..], [SubmissionOutcome::Accepted { .. }]));
    Ok(())
}

#[test]
fn button_without_type_is_disabled_while_pending() -> Result<()> {
    let submitter = Arc::new(SimulatedSubmitter::new());
    let mut page = Page::builder(
        r#"<body>
  <form id="contact-form">
    <input type="email" id="email" name="email" required>
    <button id="send">Send</button>
  </form>
</body>"#,
    )
    .submitter(submitter.clone())
    .build()?;
    page.type_text("#email", "ada@example.com")?;

    page.click("#send")?;
    page.assert_attr("#send", "disabled", "true")?;
    page.assert_text("#send", "Sending...")?;
    page.click("#send")?;
    assert_eq!(page.pending_submissions(), 1);

    let outcomes = block_on(page.settle_submissions())?;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(submitter.requests().len(), 1);
    page.assert_text("#send", "Send")?;
    page.assert_no_attr("#send", "disabled")?;
    Ok(())
}
