use std::fmt::Write;

use chrono::{Datelike, Duration, NaiveDate};

use crate::analysis;
use crate::models::{
    AttendanceRecord, AttendanceStatus, RosterSummary, StatusTally, TeacherAssessment,
    TeacherAttendance, WeekSummary,
};

pub fn summarize_roster(teachers: &[TeacherAttendance], today: NaiveDate) -> RosterSummary {
    let mut summary = RosterSummary {
        total_teachers: teachers.len(),
        present_today: 0,
        late_today: 0,
        left_early_today: 0,
        left_on_time_today: 0,
        absent_today: 0,
        average_rate: 0.0,
    };

    let mut rate_sum = 0.0;
    for teacher in teachers {
        rate_sum += analysis::compute_stats(&teacher.records).attendance_rate;

        if let Some(record) = teacher.records.iter().find(|record| record.date == today) {
            match record.status {
                AttendanceStatus::Present => summary.present_today += 1,
                AttendanceStatus::Late => summary.late_today += 1,
                AttendanceStatus::LeftEarly => summary.left_early_today += 1,
                AttendanceStatus::LeftOnTime => summary.left_on_time_today += 1,
                AttendanceStatus::Absent => summary.absent_today += 1,
            }
        }
    }

    if !teachers.is_empty() {
        summary.average_rate = rate_sum / teachers.len() as f64;
    }

    summary
}

pub fn summarize_status_mix(teachers: &[TeacherAttendance]) -> Vec<StatusTally> {
    let mut map: std::collections::HashMap<AttendanceStatus, usize> =
        std::collections::HashMap::new();
    let mut total = 0usize;

    for teacher in teachers {
        for record in &teacher.records {
            *map.entry(record.status).or_insert(0) += 1;
            total += 1;
        }
    }

    let mut tallies: Vec<StatusTally> = map
        .into_iter()
        .map(|(status, days)| StatusTally {
            status,
            days,
            share: if total == 0 {
                0.0
            } else {
                100.0 * days as f64 / total as f64
            },
        })
        .collect();

    tallies.sort_by(|a, b| {
        b.days
            .cmp(&a.days)
            .then_with(|| a.status.as_str().cmp(b.status.as_str()))
    });
    tallies
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Buckets one teacher's records into Sunday-started weeks, oldest first.
pub fn weekly_breakdown(records: &[AttendanceRecord]) -> Vec<WeekSummary> {
    let mut weeks: std::collections::BTreeMap<NaiveDate, WeekSummary> =
        std::collections::BTreeMap::new();

    for record in records {
        let start = week_start(record.date);
        let entry = weeks.entry(start).or_insert(WeekSummary {
            week_start: start,
            present: 0,
            late: 0,
            left_early: 0,
            left_on_time: 0,
            absent: 0,
        });

        match record.status {
            AttendanceStatus::Present => entry.present += 1,
            AttendanceStatus::Late => entry.late += 1,
            AttendanceStatus::LeftEarly => entry.left_early += 1,
            AttendanceStatus::LeftOnTime => entry.left_on_time += 1,
            AttendanceStatus::Absent => entry.absent += 1,
        }
    }

    weeks.into_values().collect()
}

/// Assesses every teacher in scope, worst condition first, ties broken by
/// the lower attendance rate. The entries carry the display lookups so the
/// CLI and the JSON export share one shape.
pub fn assess_roster(teachers: &[TeacherAttendance]) -> Vec<TeacherAssessment> {
    let mut assessments: Vec<TeacherAssessment> = teachers
        .iter()
        .map(|teacher| {
            let stats = analysis::compute_stats(&teacher.records);
            let verdict = analysis::classify_condition(&stats);
            TeacherAssessment {
                id: teacher.id,
                name: teacher.name.clone(),
                trade: teacher.trade.clone(),
                condition_label: verdict.condition.label(),
                color_class: verdict.condition.color_class().to_string(),
                stats,
                analysis: verdict,
            }
        })
        .collect();

    assessments.sort_by(|a, b| {
        a.analysis.condition.cmp(&b.analysis.condition).then(
            a.stats
                .attendance_rate
                .partial_cmp(&b.stats.attendance_rate)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    assessments
}

pub fn build_report(
    scope: Option<&str>,
    today: NaiveDate,
    teachers: &[TeacherAttendance],
) -> String {
    let summary = summarize_roster(teachers, today);
    let mix = summarize_status_mix(teachers);
    let assessments = assess_roster(teachers);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("the full roster");

    let _ = writeln!(output, "# Teacher Attendance Report");
    let _ = writeln!(output, "Generated for {} on {}", scope_label, today);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Roster Overview");

    if teachers.is_empty() {
        let _ = writeln!(output, "No teachers found for this scope.");
    } else {
        let _ = writeln!(output, "- Teachers tracked: {}", summary.total_teachers);
        let _ = writeln!(
            output,
            "- Average attendance rate: {:.1}%",
            summary.average_rate
        );
        let _ = writeln!(
            output,
            "- Today: {} present, {} late, {} left early, {} left on time, {} absent",
            summary.present_today,
            summary.late_today,
            summary.left_early_today,
            summary.left_on_time_today,
            summary.absent_today
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");

    if mix.is_empty() {
        let _ = writeln!(output, "No attendance recorded for this scope.");
    } else {
        for tally in mix.iter() {
            let _ = writeln!(
                output,
                "- {}: {} days ({:.1}% of records)",
                tally.status, tally.days, tally.share
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Conditions");

    if assessments.is_empty() {
        let _ = writeln!(output, "No teachers found for this scope.");
    } else {
        for entry in assessments.iter() {
            let _ = writeln!(
                output,
                "- {} ({}): {} across {} recorded days. {}.",
                entry.name,
                entry.trade.as_deref().unwrap_or("unassigned"),
                entry.condition_label,
                entry.stats.total_days,
                entry.analysis.reason
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");

    if assessments.is_empty() {
        let _ = writeln!(output, "No teachers found for this scope.");
    } else {
        for entry in assessments.iter() {
            let _ = writeln!(output, "- {}: {}", entry.name, entry.analysis.advice);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Flagged Patterns");

    let flagged: Vec<_> = assessments
        .iter()
        .filter_map(|entry| {
            entry
                .analysis
                .late_pattern
                .as_ref()
                .map(|pattern| (entry.name.as_str(), pattern))
        })
        .collect();

    if flagged.is_empty() {
        let _ = writeln!(output, "No lateness patterns flagged for this scope.");
    } else {
        for (name, pattern) in flagged {
            let _ = writeln!(output, "- {}: {}", name, pattern);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).expect("valid date")
    }

    fn teacher(name: &str, statuses: &[(u32, AttendanceStatus)]) -> TeacherAttendance {
        TeacherAttendance {
            id: Uuid::new_v4(),
            name: name.to_string(),
            trade: Some("Fitter".to_string()),
            records: statuses
                .iter()
                .map(|(d, status)| AttendanceRecord {
                    date: day(*d),
                    status: *status,
                    time_in: None,
                    time_out: None,
                })
                .collect(),
        }
    }

    #[test]
    fn roster_summary_counts_todays_statuses() {
        use AttendanceStatus::*;
        let teachers = vec![
            teacher("Meera Joshi", &[(2, Present), (3, Present)]),
            teacher("Daniel Okafor", &[(2, Late), (3, Absent)]),
            teacher("Sana Qureshi", &[(2, Present)]),
        ];

        let summary = summarize_roster(&teachers, day(3));
        assert_eq!(summary.total_teachers, 3);
        assert_eq!(summary.present_today, 1);
        assert_eq!(summary.absent_today, 1);
        assert_eq!(summary.late_today, 0);
    }

    #[test]
    fn roster_summary_averages_rates() {
        use AttendanceStatus::*;
        let teachers = vec![
            teacher("Meera Joshi", &[(2, Present), (3, Present)]),
            teacher("Sana Qureshi", &[(2, Absent), (3, Absent)]),
        ];

        let summary = summarize_roster(&teachers, day(3));
        assert!((summary.average_rate - 50.0).abs() < 0.001);
    }

    #[test]
    fn empty_roster_summary_is_all_zero() {
        let summary = summarize_roster(&[], day(3));
        assert_eq!(summary.total_teachers, 0);
        assert!((summary.average_rate - 0.0).abs() < 0.001);
    }

    #[test]
    fn status_mix_counts_and_shares_sum_up() {
        use AttendanceStatus::*;
        let teachers = vec![
            teacher("Meera Joshi", &[(2, Present), (3, Present), (4, Present)]),
            teacher("Daniel Okafor", &[(2, Late)]),
        ];

        let mix = summarize_status_mix(&teachers);
        assert_eq!(mix.len(), 2);
        assert_eq!(mix[0].status, Present);
        assert_eq!(mix[0].days, 3);
        assert!((mix[0].share - 75.0).abs() < 0.001);
        assert!((mix[1].share - 25.0).abs() < 0.001);
    }

    #[test]
    fn weeks_start_on_sunday() {
        use AttendanceStatus::*;
        // 2026-02-02 is a Monday; 2026-02-08 the following Sunday.
        let subject = teacher(
            "Meera Joshi",
            &[(2, Present), (6, Late), (9, Present), (10, Absent)],
        );

        let weeks = weekly_breakdown(&subject.records);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_start, day(1));
        assert_eq!(weeks[0].present, 1);
        assert_eq!(weeks[0].late, 1);
        assert_eq!(weeks[1].week_start, day(8));
        assert_eq!(weeks[1].present, 1);
        assert_eq!(weeks[1].absent, 1);
    }

    #[test]
    fn assessments_put_the_worst_condition_first() {
        use AttendanceStatus::*;
        let teachers = vec![
            teacher("Meera Joshi", &[(2, Present), (3, Present)]),
            teacher("Sana Qureshi", &[(2, Absent), (3, Absent)]),
            teacher("Daniel Okafor", &[(2, Present), (3, Absent)]),
        ];

        let assessments = assess_roster(&teachers);
        assert_eq!(assessments[0].name, "Sana Qureshi");
        assert_eq!(assessments[0].condition_label, "Critical");
        assert_eq!(assessments[0].color_class, "destructive");
        assert_eq!(assessments[2].name, "Meera Joshi");
        assert_eq!(assessments[2].condition_label, "Excellent");
    }

    #[test]
    fn report_lists_worst_conditions_first() {
        use AttendanceStatus::*;
        let teachers = vec![
            teacher("Meera Joshi", &[(2, Present), (3, Present)]),
            teacher("Sana Qureshi", &[(2, Absent), (3, Absent)]),
        ];

        let report = build_report(None, day(3), &teachers);
        assert!(report.contains("# Teacher Attendance Report"));
        assert!(report.contains("Generated for the full roster on 2026-02-03"));
        assert!(report.contains("## Roster Overview"));
        assert!(report.contains("## Status Mix"));
        assert!(report.contains("## Conditions"));
        assert!(report.contains("## Recommendations"));
        assert!(report.contains("## Flagged Patterns"));

        let sana = report
            .find("- Sana Qureshi (Fitter): Critical")
            .expect("sana listed");
        let meera = report
            .find("- Meera Joshi (Fitter): Excellent")
            .expect("meera listed");
        assert!(sana < meera);
    }

    #[test]
    fn assessments_serialize_for_the_display_layer() {
        use AttendanceStatus::*;
        let teachers = vec![teacher("Sana Qureshi", &[(2, Absent), (3, Present)])];

        let assessments = assess_roster(&teachers);
        let value = serde_json::to_value(&assessments).expect("serializable");
        let entry = &value[0];

        assert_eq!(entry["analysis"]["condition"], "critical");
        assert_eq!(entry["condition_label"], "Critical");
        assert_eq!(entry["color_class"], "destructive");
        assert_eq!(entry["stats"]["total_days"], 2);
        // No lateness recorded, so the optional pattern is omitted entirely.
        assert!(entry["analysis"].get("late_pattern").is_none());
    }

    #[test]
    fn report_flags_lateness_patterns() {
        use AttendanceStatus::*;
        let teachers = vec![teacher(
            "Daniel Okafor",
            &[(2, Late), (3, Late), (4, Present), (5, Present)],
        )];

        let report = build_report(None, day(5), &teachers);
        assert!(report.contains("- Daniel Okafor: Frequent lateness detected."));
    }

    #[test]
    fn empty_scope_report_still_has_every_section() {
        let report = build_report(Some("COPA"), day(3), &[]);
        assert!(report.contains("Generated for COPA on 2026-02-03"));
        assert!(report.contains("No teachers found for this scope."));
        assert!(report.contains("No attendance recorded for this scope."));
        assert!(report.contains("No lateness patterns flagged for this scope."));
    }
}
