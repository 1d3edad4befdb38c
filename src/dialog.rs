// Enrollment dialog: which run is selected and what confirming it is allowed to do

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::certificate::resolve;
use crate::eligibility::{default_selection, eligible_runs};
use crate::models::{Course, Track};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open {
        course_id: i64,
        run_ids: Vec<i64>,
        selection: Option<i64>,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DialogError {
    #[error("enrollment dialog is closed")]
    Closed,
    #[error("no course run selected")]
    NoSelection,
    #[error("run {0} is not open for enrollment")]
    UnknownRun(i64),
    #[error("no certificate available for run {0}")]
    CertificateUnavailable(i64),
    #[error("dialog is open for course {open}, not course {given}")]
    CourseMismatch { open: i64, given: i64 },
}

/// What the I/O layer should do once the learner confirms.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EnrollmentAction {
    CreateEnrollment { run_id: i64 },
    RedirectToCart { product_id: i64, url: String },
}

#[derive(Debug, Clone)]
pub struct EnrollmentDialog {
    state: DialogState,
}

impl Default for EnrollmentDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl EnrollmentDialog {
    pub fn new() -> Self {
        Self { state: DialogState::Closed }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    /// Closed -> Open always restarts from the default selection. Re-opening an
    /// already open dialog keeps the current state only while the course and
    /// its eligible runs are unchanged.
    pub fn open(&mut self, course: &Course) {
        let eligible = eligible_runs(course);
        if let DialogState::Open { course_id, run_ids, .. } = &self.state {
            if *course_id == course.id && run_ids.iter().copied().eq(eligible.iter().map(|r| r.id)) {
                return;
            }
        }
        let selection = default_selection(&eligible);
        tracing::debug!(course_id = course.id, runs = eligible.len(), ?selection, "enrollment dialog opened");
        self.state = DialogState::Open {
            course_id: course.id,
            run_ids: eligible.iter().map(|r| r.id).collect(),
            selection,
        };
    }

    pub fn close(&mut self) {
        self.state = DialogState::Closed;
    }

    pub fn select(&mut self, run_id: i64) -> Result<(), DialogError> {
        match &mut self.state {
            DialogState::Closed => Err(DialogError::Closed),
            DialogState::Open { run_ids, selection, .. } => {
                if !run_ids.contains(&run_id) {
                    return Err(DialogError::UnknownRun(run_id));
                }
                *selection = Some(run_id);
                Ok(())
            }
        }
    }

    pub fn selection(&self) -> Option<i64> {
        match &self.state {
            DialogState::Open { selection, .. } => *selection,
            DialogState::Closed => None,
        }
    }

    pub fn can_confirm(&self) -> bool {
        self.selection().is_some()
    }

    /// Decides the effect of confirming the current selection of `course`.
    ///
    /// `course` must be the one the dialog was opened for, and the selected run
    /// must still be enrollable in it.
    pub fn confirm(&self, track: Track, course: &Course, cart_url: &Url) -> Result<EnrollmentAction, DialogError> {
        let (course_id, run_ids, selection) = match &self.state {
            DialogState::Closed => return Err(DialogError::Closed),
            DialogState::Open { course_id, run_ids, selection } => (*course_id, run_ids, *selection),
        };
        if course_id != course.id {
            return Err(DialogError::CourseMismatch { open: course_id, given: course.id });
        }
        let run_id = selection.ok_or(DialogError::NoSelection)?;
        let run = eligible_runs(course)
            .into_iter()
            .find(|r| r.id == run_id && run_ids.contains(&r.id))
            .ok_or(DialogError::UnknownRun(run_id))?;

        match track {
            Track::Audit => Ok(EnrollmentAction::CreateEnrollment { run_id }),
            Track::Certificate => {
                let product = match (resolve(run).eligible, run.first_product()) {
                    (true, Some(p)) => p,
                    _ => return Err(DialogError::CertificateUnavailable(run_id)),
                };
                let mut url = cart_url.clone();
                url.query_pairs_mut().append_pair("product_id", &product.id.to_string());
                Ok(EnrollmentAction::RedirectToCart { product_id: product.id, url: url.to_string() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseRun, Product};

    fn run(id: i64, enrollable: bool) -> CourseRun {
        CourseRun { id, is_enrollable: enrollable, ..Default::default() }
    }

    fn course(id: i64, runs: Vec<CourseRun>) -> Course {
        Course { id, runs, ..Default::default() }
    }

    fn cart() -> Url {
        Url::parse("https://mitxonline.example/cart/add/").unwrap()
    }

    #[test]
    fn single_run_is_preselected() {
        let c = course(1, vec![run(5, true), run(6, false)]);
        let mut d = EnrollmentDialog::new();
        assert!(!d.can_confirm());
        d.open(&c);
        assert_eq!(d.selection(), Some(5));
        assert!(d.can_confirm());
    }

    #[test]
    fn reopening_discards_user_selection() {
        let c = course(1, vec![run(1, true), run(2, true)]);
        let mut d = EnrollmentDialog::new();
        d.open(&c);
        assert_eq!(d.selection(), None);
        assert!(!d.can_confirm());

        d.select(2).unwrap();
        assert_eq!(d.selection(), Some(2));
        d.close();
        assert_eq!(d.state(), &DialogState::Closed);

        d.open(&c);
        assert_eq!(d.selection(), None);
    }

    #[test]
    fn double_open_keeps_state() {
        let c = course(1, vec![run(1, true), run(2, true)]);
        let mut d = EnrollmentDialog::new();
        d.open(&c);
        d.select(1).unwrap();
        d.open(&c);
        assert_eq!(d.selection(), Some(1));
    }

    #[test]
    fn switching_course_does_not_leak_selection() {
        let a = course(1, vec![run(1, true), run(2, true)]);
        let b = course(2, vec![run(3, true), run(4, true)]);
        let mut d = EnrollmentDialog::new();
        d.open(&a);
        d.select(2).unwrap();
        d.open(&b);
        assert_eq!(d.selection(), None);
        assert_eq!(d.select(2), Err(DialogError::UnknownRun(2)));
    }

    #[test]
    fn select_requires_open_dialog_and_eligible_run() {
        let c = course(1, vec![run(1, true), run(2, false)]);
        let mut d = EnrollmentDialog::new();
        assert_eq!(d.select(1), Err(DialogError::Closed));
        d.open(&c);
        assert_eq!(d.select(2), Err(DialogError::UnknownRun(2)));
    }

    #[test]
    fn confirm_audit_creates_enrollment() {
        let c = course(1, vec![run(9, true)]);
        let mut d = EnrollmentDialog::new();
        assert_eq!(d.confirm(Track::Audit, &c, &cart()), Err(DialogError::Closed));
        d.open(&c);
        assert_eq!(
            d.confirm(Track::Audit, &c, &cart()),
            Ok(EnrollmentAction::CreateEnrollment { run_id: 9 })
        );
    }

    #[test]
    fn confirm_without_selection_is_rejected() {
        let c = course(1, vec![run(1, true), run(2, true)]);
        let mut d = EnrollmentDialog::new();
        d.open(&c);
        assert_eq!(d.confirm(Track::Audit, &c, &cart()), Err(DialogError::NoSelection));
    }

    #[test]
    fn confirm_certificate_redirects_to_cart() {
        let mut r = run(9, true);
        r.is_upgradable = true;
        r.products = vec![Product { id: 77, price: "149.00".parse().unwrap(), is_active: true }];
        let c = course(1, vec![r]);
        let mut d = EnrollmentDialog::new();
        d.open(&c);
        match d.confirm(Track::Certificate, &c, &cart()).unwrap() {
            EnrollmentAction::RedirectToCart { product_id, url } => {
                assert_eq!(product_id, 77);
                assert_eq!(url, "https://mitxonline.example/cart/add/?product_id=77");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn confirm_certificate_on_archived_run_is_rejected() {
        let mut r = run(9, true);
        r.is_upgradable = true;
        r.is_archived = true;
        r.products = vec![Product { id: 77, price: "149.00".parse().unwrap(), is_active: true }];
        let c = course(1, vec![r]);
        let mut d = EnrollmentDialog::new();
        d.open(&c);
        assert_eq!(
            d.confirm(Track::Certificate, &c, &cart()),
            Err(DialogError::CertificateUnavailable(9))
        );
    }

    #[test]
    fn confirm_rejects_a_different_course() {
        let a = course(1, vec![run(5, true)]);
        let b = course(2, vec![run(5, false)]);
        let mut d = EnrollmentDialog::new();
        d.open(&a);
        assert_eq!(
            d.confirm(Track::Audit, &b, &cart()),
            Err(DialogError::CourseMismatch { open: 1, given: 2 })
        );
    }

    #[test]
    fn confirm_rejects_run_that_closed_after_selection() {
        let mut c = course(1, vec![run(1, true), run(2, true)]);
        let mut d = EnrollmentDialog::new();
        d.open(&c);
        d.select(2).unwrap();

        c.runs[1].is_enrollable = false;
        assert_eq!(d.confirm(Track::Audit, &c, &cart()), Err(DialogError::UnknownRun(2)));
    }

    #[test]
    fn reopening_with_changed_runs_restarts() {
        let mut c = course(1, vec![run(1, true), run(2, true)]);
        let mut d = EnrollmentDialog::new();
        d.open(&c);
        d.select(2).unwrap();

        c.runs[1].is_enrollable = false;
        d.open(&c);
        // run 1 is now the only eligible run
        assert_eq!(d.selection(), Some(1));
        assert_eq!(
            d.confirm(Track::Audit, &c, &cart()),
            Ok(EnrollmentAction::CreateEnrollment { run_id: 1 })
        );
    }

    #[test]
    fn cart_url_keeps_configured_query() {
        let mut r = run(9, true);
        r.is_upgradable = true;
        r.products = vec![Product { id: 77, price: "149.00".parse().unwrap(), is_active: true }];
        let c = course(1, vec![r]);
        let mut d = EnrollmentDialog::new();
        d.open(&c);
        let cart = Url::parse("https://shop.example/cart/add?src=learn").unwrap();
        assert_eq!(
            d.confirm(Track::Certificate, &c, &cart),
            Ok(EnrollmentAction::RedirectToCart {
                product_id: 77,
                url: "https://shop.example/cart/add?src=learn&product_id=77".into()
            })
        );
    }

    #[test]
    fn action_wire_shape() {
        let v = serde_json::to_value(EnrollmentAction::CreateEnrollment { run_id: 3 }).unwrap();
        assert_eq!(v, serde_json::json!({"action": "create_enrollment", "run_id": 3}));
    }
}
