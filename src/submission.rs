//! The seam between a validated form and whatever delivers it.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use super::*;

/// A validated form's payload, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRequest {
    pub form_id: Option<String>,
    pub kind: FormKind,
    pub fields: Vec<(String, String)>,
}

impl SubmissionRequest {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value submitted under `name`, e.g. a checkbox group.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub reference: Option<String>,
}

/// Delivers a form. Errors surface to the visitor as the generic failure
/// message; the form stays filled in so they can retry.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt>;
}

/// Accepts every request and keeps a copy of it.
#[derive(Debug, Default)]
pub struct SimulatedSubmitter {
    requests: Mutex<Vec<SubmissionRequest>>,
}

impl SimulatedSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<SubmissionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .map(|requests| requests.len())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Submitter for SimulatedSubmitter {
    async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt> {
        let mut requests = self
            .requests
            .lock()
            .map_err(|_| Error::Submission("request log poisoned".into()))?;
        requests.push(request);
        Ok(SubmissionReceipt {
            reference: Some(format!("sim-{}", requests.len())),
        })
    }
}

/// Rejects every request with the given reason.
#[derive(Debug, Clone)]
pub struct FailingSubmitter {
    reason: String,
}

impl FailingSubmitter {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Submitter for FailingSubmitter {
    async fn submit(&self, _request: SubmissionRequest) -> Result<SubmissionReceipt> {
        Err(Error::Submission(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    fn request() -> SubmissionRequest {
        SubmissionRequest {
            form_id: Some("contact-form".into()),
            kind: FormKind::Enquiry,
            fields: vec![
                ("name".into(), "Ada".into()),
                ("topic".into(), "fees".into()),
                ("topic".into(), "hours".into()),
            ],
        }
    }

    #[test]
    fn simulated_submitter_records_requests() -> Result<()> {
        let submitter = SimulatedSubmitter::new();
        let receipt = block_on(submitter.submit(request()))?;
        assert_eq!(receipt.reference.as_deref(), Some("sim-1"));
        assert_eq!(submitter.request_count(), 1);
        assert_eq!(submitter.requests()[0].field("name"), Some("Ada"));
        Ok(())
    }

    #[test]
    fn failing_submitter_reports_reason() {
        let submitter = FailingSubmitter::new("offline");
        assert_eq!(
            block_on(submitter.submit(request())),
            Err(Error::Submission("offline".into()))
        );
    }

    #[test]
    fn repeated_names_keep_every_value() {
        let request = request();
        assert_eq!(request.values("topic"), ["fees", "hours"]);
        assert!(request.values("missing").is_empty());
    }
}
