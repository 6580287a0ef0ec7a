use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Canonical attendance status, the only form the aggregation and
/// classification layers ever see. Raw upstream text is normalized into this
/// enum once, at the ingestion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    LeftEarly,
    LeftOnTime,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::LeftEarly => "left_early",
            AttendanceStatus::LeftOnTime => "left_on_time",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of one teacher on one calendar date. `date` is unique
/// within a teacher's collection.
#[derive(Debug, Clone)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
}

/// A teacher's normalized attendance collection, records ordered by date.
#[derive(Debug, Clone)]
pub struct TeacherAttendance {
    pub id: Uuid,
    pub name: String,
    pub trade: Option<String>,
    pub records: Vec<AttendanceRecord>,
}

/// One joined row as fetched from the store. `status` is the un-normalized
/// upstream text; record fields are NULL for teachers with no records yet.
#[derive(Debug, Clone)]
pub struct AttendanceRow {
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub trade: Option<String>,
    pub record_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AttendanceStats {
    pub total_days: usize,
    pub present_days: usize,
    pub absent_days: usize,
    pub late_days: usize,
    pub left_early_days: usize,
    pub left_on_time_days: usize,
    pub attendance_rate: f64,
}

/// Qualitative severity bucket. Ordering follows severity: `Excellent`
/// compares greatest, `Critical` least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Critical,
    Weak,
    Good,
    Excellent,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Excellent => "excellent",
            Condition::Good => "good",
            Condition::Weak => "weak",
            Condition::Critical => "critical",
        }
    }

    /// Display color class used by the external rendering layer.
    pub fn color_class(self) -> &'static str {
        match self {
            Condition::Excellent => "success",
            Condition::Good => "info",
            Condition::Weak => "warning",
            Condition::Critical => "destructive",
        }
    }

    /// Condition name with the first character capitalized.
    pub fn label(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one teacher, rebuilt from current records on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionAnalysis {
    pub condition: Condition,
    pub reason: String,
    pub advice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub late_pattern: Option<String>,
}

/// Dashboard numbers for a roster on a given day. The `_today` counts cover
/// only records dated that day; `average_rate` is the mean of per-teacher
/// attendance rates.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSummary {
    pub total_teachers: usize,
    pub present_today: usize,
    pub late_today: usize,
    pub left_early_today: usize,
    pub left_on_time_today: usize,
    pub absent_today: usize,
    pub average_rate: f64,
}

/// Day count for one status across a scope; `share` is a percentage of all
/// recorded days.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTally {
    pub status: AttendanceStatus,
    pub days: usize,
    pub share: f64,
}

/// Per-week status counts, week starting on Sunday.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekSummary {
    pub week_start: NaiveDate,
    pub present: usize,
    pub late: usize,
    pub left_early: usize,
    pub left_on_time: usize,
    pub absent: usize,
}

/// One teacher's computed outputs in the shape the external display layer
/// consumes, with the condition already mapped to a label and color class.
#[derive(Debug, Clone, Serialize)]
pub struct TeacherAssessment {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade: Option<String>,
    pub stats: AttendanceStats,
    pub analysis: ConditionAnalysis,
    pub condition_label: String,
    pub color_class: String,
}
