use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::certificate::CertificateOffer;
use crate::dashboard::EnrollmentViewModel;

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub price: Decimal, // decimal string on the wire, e.g. "149.00"
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CourseRun {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub enrollment_start: Option<DateTime<Utc>>,
    pub enrollment_end: Option<DateTime<Utc>>,
    pub upgrade_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_enrollable: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_upgradable: bool,
    pub courseware_url: Option<String>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl CourseRun {
    /// Only the first product is ever shown; the order of the rest is not meaningful.
    pub fn first_product(&self) -> Option<&Product> {
        self.products.first()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CoursePage {
    pub page_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Course {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub next_run_id: Option<i64>,
    #[serde(default, alias = "courseruns")]
    pub runs: Vec<CourseRun>,
    pub page: Option<CoursePage>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentMode {
    Audit,
    Verified,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Grade {
    pub grade: f64,
    pub passed: bool,
    pub grade_percent: i32,
    pub letter_grade: Option<String>,
    #[serde(default)]
    pub set_by_admin: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnrolledRun {
    #[serde(flatten)]
    pub run: CourseRun,
    pub course: Course,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnrollmentRecord {
    pub id: i64,
    pub enrollment_mode: EnrollmentMode,
    pub run: EnrolledRun,
    #[serde(default)]
    pub grades: Vec<Grade>,
}

impl EnrollmentRecord {
    pub fn has_upgraded(&self) -> bool {
        self.enrollment_mode == EnrollmentMode::Verified
    }

    /// Flag check only. Archived runs and runs without products are not
    /// excluded here, unlike `certificate::resolve`.
    pub fn can_upgrade(&self) -> bool {
        self.run.run.is_upgradable && !self.has_upgraded()
    }
}

// --- HTTP request/response bodies ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunOption {
    pub id: i64,
    pub label: String,
    pub certificate: CertificateOffer,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnrollmentOptions {
    pub runs: Vec<RunOption>,
    pub default_run_id: Option<i64>,
    pub best_run_id: Option<i64>,
    pub price_range: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DashboardReq {
    pub enrollments: Vec<EnrollmentRecord>,
    pub now: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DashboardResp {
    pub enrollments: Vec<EnrollmentViewModel>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Audit,
    Certificate,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfirmEnrollmentReq {
    pub course: Course,
    pub run_id: Option<i64>,
    pub track: Track,
}
