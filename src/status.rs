use crate::models::AttendanceStatus;

/// Normalizes free-form status text into a canonical status.
///
/// Upstream systems hand over anything from a clean `"present"` to
/// comma-joined multi-token strings like `"Present, Late"`. Matching is
/// case-insensitive substring search in fixed priority order:
/// absent > late > left_early > left_on_time > present. The first category
/// that matches wins, so conflicting tokens resolve to the worse
/// interpretation. Text that matches nothing is treated as absent.
pub fn parse_status(raw: &str) -> AttendanceStatus {
    let normalized = raw.to_lowercase();

    if normalized.contains("absent") {
        return AttendanceStatus::Absent;
    }
    if normalized.contains("late") {
        return AttendanceStatus::Late;
    }
    if normalized.contains("left_early") || normalized.contains("left early") {
        return AttendanceStatus::LeftEarly;
    }
    if normalized.contains("left_on_time") || normalized.contains("left on time") {
        return AttendanceStatus::LeftOnTime;
    }
    if normalized.contains("present") {
        return AttendanceStatus::Present;
    }

    AttendanceStatus::Absent
}
