//! Outcome of a publish call.

use timeline_core::{Result, TimelineError};
use uuid::Uuid;

/// A single listener that errored or panicked during a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    /// Subscription that failed.
    pub subscription: Uuid,

    /// Position of the listener within its topic.
    pub slot: usize,

    /// Error or panic message.
    pub message: String,

    /// Whether the listener panicked rather than returning an error.
    pub panicked: bool,
}

/// Summary of one publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Topic published to.
    pub topic: String,

    /// Listeners that ran to completion without error.
    pub delivered: usize,

    /// Tombstoned slots passed over.
    pub skipped: usize,

    /// Listeners that failed, in invocation order.
    pub failures: Vec<ListenerFailure>,
}

impl PublishReport {
    pub(crate) fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            ..Default::default()
        }
    }

    /// Number of listeners invoked, failed ones included.
    pub fn invoked(&self) -> usize {
        self.delivered + self.failures.len()
    }

    /// True when no listener failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert into a `Result`, yielding the delivery count on success.
    pub fn into_result(self) -> Result<usize> {
        let Some(first) = self.failures.first() else {
            return Ok(self.delivered);
        };

        Err(TimelineError::ListenerFailed {
            failed: self.failures.len(),
            message: first.message.clone(),
            topic: self.topic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report() {
        let mut report = PublishReport::new("alerts");
        report.delivered = 3;

        assert!(report.is_clean());
        assert_eq!(report.invoked(), 3);
        assert_eq!(report.into_result().unwrap(), 3);
    }

    #[test]
    fn test_failed_report() {
        let mut report = PublishReport::new("alerts");
        report.delivered = 1;
        report.failures.push(ListenerFailure {
            subscription: Uuid::new_v4(),
            slot: 0,
            message: "disk full".to_string(),
            panicked: false,
        });

        assert_eq!(report.invoked(), 2);
        let err = report.into_result().unwrap_err();
        assert_eq!(
            err,
            TimelineError::ListenerFailed {
                topic: "alerts".to_string(),
                failed: 1,
                message: "disk full".to_string(),
            }
        );
    }
}
