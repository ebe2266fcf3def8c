use std::fmt;

use repostat_common::EnrichmentStatus;

/// Tally of one enrichment batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Items selected for the batch.
    pub total: usize,
    pub succeeded: usize,
    pub not_found: usize,
    /// API errors, persistence failures, malformed ids and the rate-limited item.
    pub errored: usize,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, status: EnrichmentStatus) {
        match status {
            EnrichmentStatus::Success => self.succeeded += 1,
            EnrichmentStatus::NotFound => self.not_found += 1,
            EnrichmentStatus::ApiError | EnrichmentStatus::Pending => self.errored += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.not_found + self.errored
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.failed()
    }

    /// Items never reached, or abandoned mid-lookup, because the batch stopped early.
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.processed())
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} not found, {} failed",
            self.succeeded, self.not_found, self.errored
        )?;
        let skipped = self.skipped();
        if skipped > 0 {
            write!(f, ", {skipped} skipped")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_derived_counts() {
        let mut summary = BatchSummary::new(6);
        summary.record(EnrichmentStatus::Success);
        summary.record(EnrichmentStatus::Success);
        summary.record(EnrichmentStatus::NotFound);
        summary.record(EnrichmentStatus::ApiError);

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed(), 2);
        assert_eq!(summary.processed(), 4);
        assert_eq!(summary.skipped(), 2);
    }

    #[test]
    fn test_display() {
        let mut summary = BatchSummary::new(3);
        summary.record(EnrichmentStatus::Success);
        summary.record(EnrichmentStatus::NotFound);
        summary.record(EnrichmentStatus::ApiError);
        assert_eq!(summary.to_string(), "1 succeeded, 1 not found, 1 failed");

        let partial = BatchSummary {
            total: 10,
            succeeded: 4,
            not_found: 0,
            errored: 1,
        };
        assert_eq!(
            partial.to_string(),
            "4 succeeded, 0 not found, 1 failed, 5 skipped"
        );
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::default();
        assert_eq!(summary.skipped(), 0);
        assert_eq!(summary.to_string(), "0 succeeded, 0 not found, 0 failed");
    }
}
