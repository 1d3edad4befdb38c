use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::cmp::Ordering;

use crate::models::EnrollmentRecord;

/// Prefix that keeps card ids unique once other sources feed the dashboard.
pub const SOURCE_NAME: &str = "mitxonline";

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentViewModel {
    pub id: String,
    pub title: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub has_upgraded: bool,
    pub can_upgrade: bool,
    pub certificate_upgrade_deadline: Option<DateTime<Utc>>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub certificate_upgrade_price: Option<Decimal>,
    pub has_user_completed: bool,
    pub courseware_url: Option<String>,
    pub marketing_url: Option<String>,
}

pub fn to_view_model(record: &EnrollmentRecord) -> EnrollmentViewModel {
    let run = &record.run.run;
    EnrollmentViewModel {
        id: format!("{SOURCE_NAME}-{}", record.id),
        title: run.title.clone(),
        start_date: run.start_date,
        end_date: run.end_date,
        has_upgraded: record.has_upgraded(),
        can_upgrade: record.can_upgrade(),
        certificate_upgrade_deadline: run.upgrade_deadline,
        certificate_upgrade_price: run.first_product().map(|p| p.price),
        has_user_completed: record.grades.first().map(|g| g.passed).unwrap_or(false),
        courseware_url: run.courseware_url.clone(),
        marketing_url: record.run.course.page.as_ref().and_then(|p| p.page_url.clone()),
    }
}

fn is_ended(e: &EnrollmentViewModel, now: DateTime<Utc>) -> bool {
    e.has_user_completed || e.end_date.is_some_and(|d| d < now)
}

fn is_started(e: &EnrollmentViewModel, now: DateTime<Utc>) -> bool {
    e.start_date.is_some_and(|d| d < now)
}

fn by_title(a: &EnrollmentViewModel, b: &EnrollmentViewModel) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
}

fn by_start_date(a: &EnrollmentViewModel, b: &EnrollmentViewModel) -> Ordering {
    match (a.start_date, b.start_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Dashboard order: in-progress courses by title, then upcoming ones by start
/// date (undated last), then finished ones by title.
pub fn sort_enrollments(enrollments: Vec<EnrollmentViewModel>, now: DateTime<Utc>) -> Vec<EnrollmentViewModel> {
    let mut started = Vec::new();
    let mut not_started = Vec::new();
    let mut ended = Vec::new();
    for e in enrollments {
        if is_ended(&e, now) {
            ended.push(e);
        } else if is_started(&e, now) {
            started.push(e);
        } else {
            not_started.push(e);
        }
    }
    started.sort_by(by_title);
    not_started.sort_by(by_start_date);
    ended.sort_by(by_title);

    started.into_iter().chain(not_started).chain(ended).collect()
}
