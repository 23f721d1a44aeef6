use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, join_all};

use super::*;

mod actions;
mod assertions;

/// Builds a [`Page`] from an HTML fixture. Everything except the markup has
/// a default: the site configuration, a [`SimulatedSubmitter`] and the
/// document root as scope.
pub struct PageBuilder {
    html: String,
    config: SiteConfig,
    submitter: Arc<dyn Submitter>,
    scope: Option<String>,
    trace: bool,
}

impl PageBuilder {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            config: SiteConfig::default(),
            submitter: Arc::new(SimulatedSubmitter::new()),
            scope: None,
            trace: false,
        }
    }

    pub fn config(mut self, config: SiteConfig) -> Self {
        self.config = config;
        self
    }

    pub fn submitter(mut self, submitter: Arc<dyn Submitter>) -> Self {
        self.submitter = submitter;
        self
    }

    /// Restricts every behaviour unit to the subtree matched by `selector`.
    pub fn scope(mut self, selector: impl Into<String>) -> Self {
        self.scope = Some(selector.into());
        self
    }

    pub fn trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    pub fn build(self) -> Result<Page> {
        let dom = Dom::parse(&self.html)?;
        let scope = match &self.scope {
            Some(selector) => dom
                .query_selector(selector)?
                .ok_or_else(|| Error::SelectorNotFound(selector.clone()))?,
            None => dom.root(),
        };
        Page::mount(dom, scope, self.config, self.submitter, self.trace)
    }
}

impl fmt::Debug for PageBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageBuilder")
            .field("html_len", &self.html.len())
            .field("config", &self.config)
            .field("scope", &self.scope)
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}

struct PendingSubmission {
    form: usize,
    future: BoxFuture<'static, Result<SubmissionReceipt>>,
}

struct TraceState {
    enabled: bool,
    logs: VecDeque<String>,
    log_limit: usize,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            logs: VecDeque::new(),
            log_limit: 10_000,
        }
    }
}

/// A mounted page: the document plus the state of every behaviour unit.
pub struct Page {
    dom: Dom,
    config: SiteConfig,
    scope: NodeId,
    accordion: Accordion,
    nav: Option<NavMenu>,
    forms: Vec<FormController>,
    skip_link: Option<NodeId>,
    live_region: LiveRegion,
    focus_mode: FocusMode,
    scroll_button: ScrollToTop,
    viewport: Viewport,
    scheduler: Scheduler,
    submitter: Arc<dyn Submitter>,
    pending: Vec<PendingSubmission>,
    last_submission: Option<SubmissionOutcome>,
    trace_state: TraceState,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("scope", &self.scope)
            .field("accordion", &self.accordion)
            .field("nav", &self.nav)
            .field("forms", &self.forms.len())
            .field("viewport", &self.viewport)
            .field("now_ms", &self.scheduler.now_ms())
            .field("pending_submissions", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Mounts `html` with the default configuration.
    pub fn from_html(html: &str) -> Result<Self> {
        PageBuilder::new(html).build()
    }

    pub fn builder(html: impl Into<String>) -> PageBuilder {
        PageBuilder::new(html)
    }

    fn mount(
        mut dom: Dom,
        scope: NodeId,
        config: SiteConfig,
        submitter: Arc<dyn Submitter>,
        trace: bool,
    ) -> Result<Self> {
        let wrapped = tables::wrap_tables(&mut dom, scope, &config.tables)?;

        let nav = NavMenu::discover(&dom, scope, &config.navigation)?;

        let accordion = Accordion::discover(&dom, scope, &config.accordion)?;
        accordion.render(&mut dom)?;

        let forms = dom
            .query_selector_all_from(scope, &config.forms.form_selector)?
            .into_iter()
            .map(|form| FormController::discover(&dom, form, &config.forms))
            .collect::<Result<Vec<_>>>()?;

        let skip_link = dom.query_selector_from(scope, &config.accessibility.skip_link_selector)?;

        let host = if dom.is_tag(scope, "body") {
            scope
        } else {
            dom.query_selector_from(scope, "body")?.unwrap_or(scope)
        };
        let live_region = LiveRegion::ensure(&mut dom, host, &config.accessibility)?;
        let focus_mode = FocusMode::new(host, &config.accessibility);
        let scroll_button = ScrollToTop::create(&mut dom, host, &config.scroll)?;
        scroll_button.render(&mut dom)?;

        let mut scheduler = Scheduler::default();
        if let Some(title) = dom.query_selector_from(scope, &config.accessibility.page_title_selector)? {
            let text = format!(
                "{}{}",
                config.accessibility.page_loaded_prefix,
                dom.text_content(title).trim()
            );
            scheduler.schedule(config.accessibility.announce_delay_ms, TaskKind::Announce(text));
        }

        tracing::info!(
            panels = accordion.panels().len(),
            forms = forms.len(),
            navigation = nav.is_some(),
            tables_wrapped = wrapped,
            "page mounted"
        );

        let mut page = Self {
            dom,
            config,
            scope,
            accordion,
            nav,
            forms,
            skip_link,
            live_region,
            focus_mode,
            scroll_button,
            viewport: Viewport::default(),
            scheduler,
            submitter,
            pending: Vec::new(),
            last_submission: None,
            trace_state: TraceState::default(),
        };
        page.enable_trace(trace);
        page.trace_line(format!(
            "[mount] panels={} forms={} tables_wrapped={}",
            page.accordion.panels().len(),
            page.forms.len(),
            wrapped
        ));
        Ok(page)
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn scope(&self) -> NodeId {
        self.scope
    }

    pub fn accordion(&self) -> &Accordion {
        &self.accordion
    }

    pub fn nav(&self) -> Option<&NavMenu> {
        self.nav.as_ref()
    }

    pub fn forms(&self) -> &[FormController] {
        &self.forms
    }

    /// The controller of the form matched by `selector`, or of the form
    /// enclosing the matched element.
    pub fn form(&self, selector: &str) -> Result<&FormController> {
        let index = self.form_index_for(selector)?;
        Ok(&self.forms[index])
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn live_region(&self) -> LiveRegion {
        self.live_region
    }

    pub fn focus_mode(&self) -> &FocusMode {
        &self.focus_mode
    }

    pub fn scroll_button(&self) -> NodeId {
        self.scroll_button.node()
    }

    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms()
    }

    pub fn pending_timers(&self) -> Vec<PendingTask> {
        self.scheduler.pending()
    }

    pub fn pending_submissions(&self) -> usize {
        self.pending.len()
    }

    /// Outcome of the most recent submit attempt or settled submission.
    pub fn last_submission(&self) -> Option<&SubmissionOutcome> {
        self.last_submission.as_ref()
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidArgument(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_state.log_limit = max_entries;
        while self.trace_state.logs.len() > self.trace_state.log_limit {
            self.trace_state.logs.pop_front();
        }
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_state.logs.drain(..).collect()
    }

    fn trace_line(&mut self, line: String) {
        tracing::debug!(target: "practice_site::trace", "{line}");
        if self.trace_state.enabled {
            if self.trace_state.logs.len() >= self.trace_state.log_limit {
                self.trace_state.logs.pop_front();
            }
            self.trace_state.logs.push_back(line);
        }
    }

    fn describe(&self, node: NodeId) -> String {
        let tag = self.dom.tag_name(node).unwrap_or("#node");
        match self.dom.attr(node, "id").filter(|id| !id.is_empty()) {
            Some(id) => format!("{tag}#{id}"),
            None => tag.to_string(),
        }
    }

    fn form_index_for(&self, selector: &str) -> Result<usize> {
        let target = self.select_one(selector)?;
        self.form_index_of(target)
            .ok_or_else(|| Error::SelectorNotFound(format!("form for {selector}")))
    }

    fn form_index_of(&self, node: NodeId) -> Option<usize> {
        self.forms.iter().position(|form| form.owns(&self.dom, node))
    }

    /// Toggles the panel with `panel_id` exactly as a click on its trigger
    /// would.
    pub fn activate_panel(&mut self, panel_id: &str) -> Result<()> {
        let index = self
            .accordion
            .panels()
            .iter()
            .position(|panel| panel.id == panel_id)
            .ok_or_else(|| Error::UnknownPanel(panel_id.to_string()))?;
        self.activate_panel_index(index, Activation::Pointer)
    }

    fn activate_panel_index(&mut self, index: usize, activation: Activation) -> Result<()> {
        self.accordion.activate_index(index)?;
        self.accordion.render(&mut self.dom)?;
        let (id, expanded) = self
            .accordion
            .panels()
            .get(index)
            .map(|panel| (panel.id.clone(), panel.expanded))
            .unwrap_or_default();
        self.trace_line(format!(
            "[accordion] {activation:?} panel={id} expanded={expanded}"
        ));
        Ok(())
    }

    /// Replaces the live region's text.
    pub fn announce(&mut self, text: &str) -> Result<()> {
        self.live_region.announce(&mut self.dom, text)?;
        self.trace_line(format!("[a11y] announce {text:?}"));
        Ok(())
    }

    /// Runs form validation without submitting.
    pub fn validate_form(&mut self, selector: &str) -> Result<bool> {
        let index = self.form_index_for(selector)?;
        let valid = self.forms[index].validate_form(&mut self.dom, &self.config)?;
        self.trace_line(format!("[form] validate form#{index} valid={valid}"));
        Ok(valid)
    }

    fn show_form_message(&mut self, index: usize, kind: MessageKind, text: &str) -> Result<()> {
        let node = self.forms[index].show_message(&mut self.dom, kind, text, &self.config.forms)?;
        self.viewport
            .scroll_into_view(node, ScrollBehavior::Smooth, ScrollBlock::Nearest);
        Ok(())
    }

    fn submit_form(&mut self, index: usize) -> Result<SubmissionOutcome> {
        let valid = self.forms[index].validate_form(&mut self.dom, &self.config)?;
        if !valid {
            if let Some(node) = self.forms[index].message_node() {
                self.viewport
                    .scroll_into_view(node, ScrollBehavior::Smooth, ScrollBlock::Nearest);
            }
            tracing::debug!(form = index, "submission withheld: form invalid");
            self.trace_line(format!("[form] submit form#{index} invalid"));
            return self.record(SubmissionOutcome::Invalid);
        }

        if self.forms[index].honeypot_tripped(&self.dom)? {
            let message = self.config.messages.submit_error.clone();
            self.show_form_message(index, MessageKind::Error, &message)?;
            tracing::info!(form = index, "submission rejected: honeypot filled");
            self.trace_line(format!("[form] submit form#{index} rejected"));
            return self.record(SubmissionOutcome::Rejected { message });
        }

        let sending = self.config.messages.sending.clone();
        self.forms[index].set_pending(&mut self.dom, true, &sending)?;
        let request = self.forms[index].build_request();
        tracing::info!(form = index, kind = ?request.kind, fields = request.fields.len(), "submission started");
        let submitter = Arc::clone(&self.submitter);
        let future = async move { submitter.submit(request).await }.boxed();
        self.pending.push(PendingSubmission {
            form: index,
            future,
        });
        self.trace_line(format!("[form] submit form#{index} pending"));
        self.record(SubmissionOutcome::Pending)
    }

    fn record(&mut self, outcome: SubmissionOutcome) -> Result<SubmissionOutcome> {
        self.last_submission = Some(outcome.clone());
        Ok(outcome)
    }

    /// Drives every pending submission to completion and applies each
    /// result to its form, in submission order.
    pub async fn settle_submissions(&mut self) -> Result<Vec<SubmissionOutcome>> {
        let (forms, futures): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .map(|pending| (pending.form, pending.future))
            .unzip();
        let results = join_all(futures).await;

        let mut outcomes = Vec::with_capacity(results.len());
        for (index, result) in forms.into_iter().zip(results) {
            outcomes.push(self.finish_submission(index, result)?);
        }
        Ok(outcomes)
    }

    fn finish_submission(
        &mut self,
        index: usize,
        result: Result<SubmissionReceipt>,
    ) -> Result<SubmissionOutcome> {
        let sending = self.config.messages.sending.clone();
        let outcome = match result {
            Ok(receipt) => {
                let message = self.config.success_message(self.forms[index].kind());
                self.show_form_message(index, MessageKind::Success, &message)?;
                self.forms[index].reset(&mut self.dom, &self.config.forms)?;
                tracing::info!(form = index, reference = ?receipt.reference, "submission accepted");
                SubmissionOutcome::Accepted { message }
            }
            Err(err) => {
                let message = self.config.messages.submit_error.clone();
                self.show_form_message(index, MessageKind::Error, &message)?;
                tracing::warn!(form = index, error = %err, "submission failed");
                SubmissionOutcome::Failed { message }
            }
        };
        self.forms[index].set_pending(&mut self.dom, false, &sending)?;
        self.trace_line(format!("[form] settle form#{index} {outcome:?}"));
        self.record(outcome)
    }

    /// Moves the virtual clock forward and runs every timer that fell due.
    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::InvalidArgument(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.scheduler.now_ms();
        let due = self.scheduler.advance(delta_ms);
        let ran = due.len();
        for task in due {
            match task {
                TaskKind::Announce(text) => self.live_region.announce(&mut self.dom, &text)?,
            }
        }
        self.trace_line(format!(
            "[timer] advance delta_ms={delta_ms} from={from} to={} ran_due={ran}",
            self.scheduler.now_ms()
        ));
        Ok(())
    }
}
