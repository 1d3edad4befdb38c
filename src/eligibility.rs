// Run filtering and default selection for the enrollment picker

use crate::models::{Course, CourseRun};

/// Runs open for enrollment, in catalog order. Archived runs are kept here;
/// their certificate eligibility is decided by `certificate::resolve`.
pub fn eligible_runs(course: &Course) -> Vec<&CourseRun> {
    course.runs.iter().filter(|r| r.is_enrollable).collect()
}

/// A single eligible run is picked for the learner; zero or several leave the
/// picker on its placeholder.
pub fn default_selection(eligible: &[&CourseRun]) -> Option<i64> {
    match eligible {
        [only] => Some(only.id),
        _ => None,
    }
}

/// The server-designated next run if the course still lists it, otherwise the
/// first eligible run.
pub fn best_run(course: &Course) -> Option<&CourseRun> {
    course
        .next_run_id
        .and_then(|id| course.runs.iter().find(|r| r.id == id))
        .or_else(|| course.runs.iter().find(|r| r.is_enrollable))
}
