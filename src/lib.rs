//! Deterministic interaction model for the practice website.
//!
//! A page is parsed from HTML into an arena [`Dom`], then the behaviour units
//! (FAQ accordion, form validation and submission, mobile navigation, skip
//! link, live region, scroll-to-top, responsive tables) discover their markup
//! under a root scope and keep their state in plain structs. Every event entry
//! point on [`Page`] updates that state first and then projects it onto the
//! document in a single render pass.
//!
//! ```no_run
//! use practice_site::Page;
//!
//! # fn main() -> practice_site::Result<()> {
//! let mut page = Page::from_html(r#"
//!     <button class="faq-question" aria-expanded="false">Fees?</button>
//!     <div class="faq-answer">...</div>
//! "#)?;
//! page.click(".faq-question")?;
//! page.assert_attr(".faq-question", "aria-expanded", "true")?;
//! # Ok(())
//! # }
//! ```

mod accessibility;
mod accordion;
mod config;
mod dom;
mod form;
mod html;
mod navigation;
mod page;
mod scheduler;
mod scrolling;
mod selector;
mod submission;
mod tables;
mod validation;

pub use accessibility::{FocusMode, LiveRegion};
pub use accordion::{Accordion, Activation, Panel};
pub use config::{
    AccessibilityConfig, AccordionConfig, FormsConfig, MessagesConfig, NavigationConfig,
    ScrollConfig, SiteConfig, TablesConfig,
};
pub use dom::{Dom, NodeId};
pub use form::{FormController, FormKind, SubmissionOutcome};
pub use navigation::NavMenu;
pub use page::{Page, PageBuilder};
pub use scheduler::PendingTask;
pub use scrolling::{ScrollBehavior, ScrollBlock, ScrollRequest, Viewport};
pub use submission::{
    FailingSubmitter, SimulatedSubmitter, SubmissionReceipt, SubmissionRequest, Submitter,
};
pub use validation::{FieldKind, FormField, ValidationOutcome, validate_field};

use accessibility::fragment_target;
use dom::{ElementData, truncate_chars};
use form::{MessageKind, is_submit_control};
use html::parse_html;
use scheduler::{Scheduler, TaskKind};
use scrolling::ScrollToTop;
use selector::SelectorList;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("selector not found: {0}")]
    SelectorNotFound(String),
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    #[error("document error: {0}")]
    Dom(String),
    #[error("unknown panel: {0}")]
    UnknownPanel(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("submission failed: {0}")]
    Submission(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("type mismatch for {selector}: expected {expected}, actual {actual}")]
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    #[error(
        "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
    )]
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}
