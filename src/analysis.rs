use crate::models::{
    AttendanceRecord, AttendanceStats, AttendanceStatus, Condition, ConditionAnalysis,
};

const FULL_DAY_CREDIT: f64 = 1.0;
const PARTIAL_DAY_CREDIT: f64 = 0.75;

const PERFECT_RATE_FLOOR: f64 = 95.0;
const EXCELLENT_RATE_FLOOR: f64 = 90.0;
const GOOD_RATE_FLOOR: f64 = 75.0;
const WEAK_RATE_FLOOR: f64 = 60.0;

const FREQUENT_LATE_SHARE: f64 = 0.30;
const EARLY_LEAVE_SHARE: f64 = 0.20;
const DECLINING_ABSENCE_SHARE: f64 = 0.15;

/// Weighted credit one record contributes to the attendance rate. Full
/// presence earns 1.0, late arrival or early departure 0.75, absence 0.
pub fn day_credit(status: AttendanceStatus) -> f64 {
    match status {
        AttendanceStatus::Present | AttendanceStatus::LeftOnTime => FULL_DAY_CREDIT,
        AttendanceStatus::Late | AttendanceStatus::LeftEarly => PARTIAL_DAY_CREDIT,
        AttendanceStatus::Absent => 0.0,
    }
}

/// Reduces a teacher's record collection to summary statistics in one pass.
/// Input order does not matter; an empty collection yields zeroed stats with
/// a rate of 0, never NaN.
pub fn compute_stats(records: &[AttendanceRecord]) -> AttendanceStats {
    let mut stats = AttendanceStats {
        total_days: records.len(),
        ..AttendanceStats::default()
    };
    let mut credit = 0.0;

    for record in records {
        credit += day_credit(record.status);
        match record.status {
            AttendanceStatus::Absent => stats.absent_days += 1,
            AttendanceStatus::Late => stats.late_days += 1,
            AttendanceStatus::LeftEarly => stats.left_early_days += 1,
            AttendanceStatus::LeftOnTime => stats.left_on_time_days += 1,
            AttendanceStatus::Present => {}
        }
    }

    // Every non-absent day counts as present in the broad sense.
    stats.present_days = stats.total_days - stats.absent_days;
    stats.attendance_rate = if stats.total_days == 0 {
        0.0
    } else {
        100.0 * credit / stats.total_days as f64
    };

    stats
}

struct ConditionRule {
    condition: Condition,
    applies: fn(&AttendanceStats) -> bool,
    reason: fn(&AttendanceStats) -> String,
    advice: fn(&AttendanceStats) -> String,
}

/// Threshold ladder evaluated top-down; the first matching rule decides the
/// condition. Stats that pass no rule fall through to `CRITICAL_RULE`.
const CONDITION_LADDER: &[ConditionRule] = &[
    ConditionRule {
        condition: Condition::Excellent,
        applies: |stats| {
            stats.attendance_rate >= PERFECT_RATE_FLOOR
                && stats.late_days == 0
                && stats.left_early_days == 0
                && stats.absent_days == 0
        },
        reason: |stats| format!("Perfect attendance record of {:.1}%", stats.attendance_rate),
        advice: |_| "Exemplary attendance. Consider formal recognition.".to_string(),
    },
    ConditionRule {
        condition: Condition::Excellent,
        applies: |stats| stats.attendance_rate >= EXCELLENT_RATE_FLOOR,
        reason: |stats| format!("Outstanding attendance rate of {:.1}%", stats.attendance_rate),
        advice: |stats| {
            if stats.late_days > 0 || stats.left_early_days > 0 {
                "Excellent overall. Minimize late arrivals and early departures to reach a perfect record."
                    .to_string()
            } else {
                "Excellent consistency. Keep encouraging.".to_string()
            }
        },
    },
    ConditionRule {
        condition: Condition::Good,
        applies: |stats| stats.attendance_rate >= GOOD_RATE_FLOOR,
        reason: |stats| format!("Good attendance rate of {:.1}%", stats.attendance_rate),
        advice: |_| "Generally reliable. Improve punctuality and reduce absences.".to_string(),
    },
    ConditionRule {
        condition: Condition::Weak,
        applies: |stats| stats.attendance_rate >= WEAK_RATE_FLOOR,
        reason: |stats| format!("Below average attendance rate of {:.1}%", stats.attendance_rate),
        advice: |_| "Irregular attendance. Schedule a meeting to review obstacles.".to_string(),
    },
];

const CRITICAL_RULE: ConditionRule = ConditionRule {
    condition: Condition::Critical,
    applies: |_| true,
    reason: |stats| format!("Poor attendance rate of {:.1}%", stats.attendance_rate),
    advice: |_| "Serious attendance issue. Urgent intervention required.".to_string(),
};

/// Maps summary statistics to a condition with rationale and advice.
///
/// The primary verdict comes from the first ladder rule that matches.
/// Pattern detectors then run independently of the verdict: heavy lateness or
/// any lateness sets `late_pattern`, and heavy early departures or absences
/// append warning clauses to the advice. An absence-heavy teacher keeps the
/// declining clause even when the rate verdict is high.
pub fn classify_condition(stats: &AttendanceStats) -> ConditionAnalysis {
    let rule = CONDITION_LADDER
        .iter()
        .find(|rule| (rule.applies)(stats))
        .unwrap_or(&CRITICAL_RULE);

    let mut advice = (rule.advice)(stats);
    for clause in advice_appendices(stats) {
        advice.push(' ');
        advice.push_str(&clause);
    }

    ConditionAnalysis {
        condition: rule.condition,
        reason: (rule.reason)(stats),
        advice,
        late_pattern: detect_late_pattern(stats),
    }
}

fn detect_late_pattern(stats: &AttendanceStats) -> Option<String> {
    if stats.total_days == 0 || stats.late_days == 0 {
        return None;
    }
    if stats.late_days as f64 > FREQUENT_LATE_SHARE * stats.total_days as f64 {
        return Some(format!(
            "Frequent lateness detected. Over {:.0}% of recorded days show late arrivals.",
            FREQUENT_LATE_SHARE * 100.0
        ));
    }
    let plural = if stats.late_days == 1 { "" } else { "s" };
    Some(format!(
        "{} late arrival{} recorded in this period.",
        stats.late_days, plural
    ))
}

fn advice_appendices(stats: &AttendanceStats) -> Vec<String> {
    let mut clauses = Vec::new();
    if stats.total_days == 0 {
        return clauses;
    }

    let total = stats.total_days as f64;
    if stats.left_early_days as f64 > EARLY_LEAVE_SHARE * total {
        clauses.push(format!(
            "Early departures exceed {:.0}% of recorded days. Review end-of-day commitments.",
            EARLY_LEAVE_SHARE * 100.0
        ));
    }
    if stats.absent_days as f64 > DECLINING_ABSENCE_SHARE * total {
        clauses.push("Declining pattern noticed. Investigate cause.".to_string());
    }

    clauses
}
