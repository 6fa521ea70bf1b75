use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Lifecycle of one migration job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    NotStarted,
    /// Target already held rows
    Skipped,
    Running,
    Completed,
    /// A source read or target count failed
    Aborted,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Skipped | JobState::Completed | JobState::Aborted
        )
    }
}

/// Accounting for one job. Owned by the task running the job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub name: String,
    pub state: JobState,
    pub total_processed: u64,
    pub success_count: u64,
    pub error_count: u64,
    /// `(id, message)` for every record that failed individually
    pub errors: Vec<(String, String)>,
    pub fatal_error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl MigrationResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: JobState::NotStarted,
            total_processed: 0,
            success_count: 0,
            error_count: 0,
            errors: Vec::new(),
            fatal_error: None,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    pub fn start(&mut self) {
        self.state = JobState::Running;
        self.start_time = Utc::now();
    }

    /// `count` records written
    pub fn add_success(&mut self, count: u64) {
        self.success_count += count;
        self.total_processed += count;
    }

    pub fn add_error(&mut self, id: impl Into<String>, message: impl Into<String>) {
        self.error_count += 1;
        self.total_processed += 1;
        self.errors.push((id.into(), message.into()));
    }

    pub fn skip(&mut self) {
        self.finish(JobState::Skipped);
    }

    pub fn complete(&mut self) {
        self.finish(JobState::Completed);
    }

    pub fn abort(&mut self, error: impl Into<String>) {
        self.fatal_error = Some(error.into());
        self.finish(JobState::Aborted);
    }

    fn finish(&mut self, state: JobState) {
        self.state = state;
        self.end_time = Some(Utc::now());
    }

    pub fn duration(&self) -> TimeDelta {
        self.end_time.unwrap_or_else(Utc::now) - self.start_time
    }

    /// Completed with every processed record written
    pub fn is_clean(&self) -> bool {
        self.state == JobState::Completed
            && self.fatal_error.is_none()
            && self.total_processed == self.success_count
    }
}

impl std::fmt::Display for MigrationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: processed {}, succeeded {}, failed {}, took {:.2}s",
            self.name,
            self.total_processed,
            self.success_count,
            self.error_count,
            self.duration().num_milliseconds() as f64 / 1000.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_stay_consistent() {
        let mut result = MigrationResult::new("user");
        result.start();
        result.add_success(498);
        result.add_error("a", "duplicate");
        result.add_error("b", "duplicate");
        result.complete();

        assert_eq!(result.total_processed, 500);
        assert_eq!(result.success_count, 498);
        assert_eq!(result.error_count, 2);
        assert_eq!(
            result.total_processed,
            result.success_count + result.error_count
        );
        assert!(!result.is_clean());
        assert!(result.end_time.is_some());
    }

    #[test]
    fn test_abort_stamps_end_time() {
        let mut result = MigrationResult::new("tag");
        result.start();
        result.abort("source unavailable");
        assert_eq!(result.state, JobState::Aborted);
        assert!(result.state.is_terminal());
        assert_eq!(result.fatal_error.as_deref(), Some("source unavailable"));
        assert!(result.end_time.is_some());
        assert!(result.duration() >= TimeDelta::zero());
    }

    #[test]
    fn test_display() {
        let mut result = MigrationResult::new("role");
        result.add_success(3);
        result.complete();
        assert!(result.to_string().starts_with("role: processed 3, succeeded 3, failed 0"));
    }
}
