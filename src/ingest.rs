use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{AttendanceRecord, AttendanceRow, TeacherAttendance};
use crate::status::parse_status;

/// Earliest record date to fetch when a recency window is requested.
pub fn cutoff_date(since_days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(since_days.max(1))
}

/// Groups raw store rows into per-teacher collections of canonical records.
///
/// This is the single place raw status text is parsed; everything downstream
/// of here sees canonical statuses only. Records come out ordered by date,
/// and a duplicate date keeps the later row, matching the overwrite
/// semantics of the upstream store. Teachers without records are preserved
/// with empty collections. The roster is sorted by name.
pub fn group_attendance(rows: &[AttendanceRow]) -> Vec<TeacherAttendance> {
    struct Grouped {
        name: String,
        trade: Option<String>,
        records: BTreeMap<NaiveDate, AttendanceRecord>,
    }

    let mut grouped: HashMap<Uuid, Grouped> = HashMap::new();
    for row in rows {
        let entry = grouped.entry(row.teacher_id).or_insert_with(|| Grouped {
            name: row.teacher_name.clone(),
            trade: row.trade.clone(),
            records: BTreeMap::new(),
        });

        if let (Some(date), Some(raw)) = (row.record_date, row.status.as_deref()) {
            entry.records.insert(
                date,
                AttendanceRecord {
                    date,
                    status: parse_status(raw),
                    time_in: row.time_in.clone(),
                    time_out: row.time_out.clone(),
                },
            );
        }
    }

    let mut teachers: Vec<TeacherAttendance> = grouped
        .into_iter()
        .map(|(id, entry)| TeacherAttendance {
            id,
            name: entry.name,
            trade: entry.trade,
            records: entry.records.into_values().collect(),
        })
        .collect();
    teachers.sort_by(|a, b| a.name.cmp(&b.name));
    teachers
}

/// One teacher decoded from a store snapshot. Status text stays raw here;
/// normalization happens on the read path, not at import time.
#[derive(Debug, Clone)]
pub struct TeacherImport {
    pub name: String,
    pub trade: Option<String>,
    pub records: Vec<RecordImport>,
}

#[derive(Debug, Clone)]
pub struct RecordImport {
    pub date: NaiveDate,
    pub status: String,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
}

#[derive(Deserialize)]
struct Snapshot {
    #[serde(default)]
    teachers: BTreeMap<String, TeacherNode>,
}

#[derive(Deserialize)]
struct TeacherNode {
    name: Option<String>,
    trade: Option<String>,
    attendance: Option<AttendanceNode>,
}

// Deployments exported attendance either as a map keyed by date or as a
// flat list of dated records.
#[derive(Deserialize)]
#[serde(untagged)]
enum AttendanceNode {
    ByDate(BTreeMap<NaiveDate, SnapshotRecord>),
    Listed(Vec<SnapshotRecord>),
}

#[derive(Deserialize)]
struct SnapshotRecord {
    date: Option<NaiveDate>,
    status: String,
    time_in: Option<String>,
    time_out: Option<String>,
}

/// Decodes a JSON snapshot export of the attendance store (a document with a
/// top-level `teachers` map).
///
/// In the date-keyed shape the map key is the authoritative date; in the
/// list shape every record must carry its own date or the snapshot is
/// rejected. A teacher with no usable name falls back to `"Teacher {key}"`.
pub fn parse_snapshot(json: &str) -> anyhow::Result<Vec<TeacherImport>> {
    let snapshot: Snapshot = serde_json::from_str(json).context("failed to decode snapshot")?;

    let mut imports = Vec::new();
    for (key, node) in snapshot.teachers {
        let name = node
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Teacher {key}"));

        let mut records = Vec::new();
        match node.attendance {
            Some(AttendanceNode::ByDate(by_date)) => {
                for (date, record) in by_date {
                    records.push(RecordImport {
                        date,
                        status: record.status,
                        time_in: record.time_in,
                        time_out: record.time_out,
                    });
                }
            }
            Some(AttendanceNode::Listed(listed)) => {
                for record in listed {
                    let date = record
                        .date
                        .with_context(|| format!("attendance record without a date for {name}"))?;
                    records.push(RecordImport {
                        date,
                        status: record.status,
                        time_in: record.time_in,
                        time_out: record.time_out,
                    });
                }
            }
            None => {}
        }

        imports.push(TeacherImport {
            name,
            trade: node.trade,
            records,
        });
    }

    Ok(imports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;

    fn row(
        teacher_id: Uuid,
        name: &str,
        date: Option<NaiveDate>,
        status: Option<&str>,
    ) -> AttendanceRow {
        AttendanceRow {
            teacher_id,
            teacher_name: name.to_string(),
            trade: Some("Fitter".to_string()),
            record_date: date,
            status: status.map(|s| s.to_string()),
            time_in: None,
            time_out: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).expect("valid date")
    }

    #[test]
    fn cutoff_respects_the_window() {
        let cutoff = cutoff_date(14);
        let expected = Utc::now().date_naive() - Duration::days(14);
        assert_eq!(cutoff, expected);
    }

    #[test]
    fn cutoff_floors_at_one_day() {
        let cutoff = cutoff_date(0);
        let expected = Utc::now().date_naive() - Duration::days(1);
        assert_eq!(cutoff, expected);
    }

    #[test]
    fn groups_rows_per_teacher_sorted_by_name() {
        let zoe = Uuid::new_v4();
        let alan = Uuid::new_v4();
        let rows = vec![
            row(zoe, "Zoe Park", Some(day(3)), Some("Present")),
            row(alan, "Alan Reyes", Some(day(3)), Some("Absent")),
            row(zoe, "Zoe Park", Some(day(4)), Some("Present")),
        ];

        let teachers = group_attendance(&rows);
        assert_eq!(teachers.len(), 2);
        assert_eq!(teachers[0].name, "Alan Reyes");
        assert_eq!(teachers[1].name, "Zoe Park");
        assert_eq!(teachers[1].records.len(), 2);
    }

    #[test]
    fn parses_raw_status_at_the_boundary() {
        let id = Uuid::new_v4();
        let rows = vec![
            row(id, "Zoe Park", Some(day(3)), Some("Present, Late")),
            row(id, "Zoe Park", Some(day(4)), Some("on duty elsewhere")),
        ];

        let teachers = group_attendance(&rows);
        assert_eq!(teachers[0].records[0].status, AttendanceStatus::Late);
        assert_eq!(teachers[0].records[1].status, AttendanceStatus::Absent);
    }

    #[test]
    fn orders_records_by_date_and_keeps_the_latest_duplicate() {
        let id = Uuid::new_v4();
        let rows = vec![
            row(id, "Zoe Park", Some(day(5)), Some("Absent")),
            row(id, "Zoe Park", Some(day(3)), Some("Present")),
            row(id, "Zoe Park", Some(day(5)), Some("Present")),
        ];

        let teachers = group_attendance(&rows);
        let records = &teachers[0].records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, day(3));
        assert_eq!(records[1].date, day(5));
        assert_eq!(records[1].status, AttendanceStatus::Present);
    }

    #[test]
    fn preserves_teachers_without_records() {
        let id = Uuid::new_v4();
        let rows = vec![row(id, "Alan Reyes", None, None)];

        let teachers = group_attendance(&rows);
        assert_eq!(teachers.len(), 1);
        assert!(teachers[0].records.is_empty());
    }

    #[test]
    fn snapshot_accepts_the_date_keyed_shape() {
        let json = r#"{
            "teachers": {
                "t-100": {
                    "name": "Asha Verma",
                    "trade": "Electrician",
                    "attendance": {
                        "2026-02-03": { "status": "Present", "time_in": "08:00" },
                        "2026-02-04": { "date": "2020-01-01", "status": "Present, Late" }
                    }
                }
            }
        }"#;

        let imports = parse_snapshot(json).expect("snapshot should parse");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].name, "Asha Verma");
        assert_eq!(imports[0].trade.as_deref(), Some("Electrician"));
        assert_eq!(imports[0].records.len(), 2);
        // The map key is authoritative, not the embedded date field.
        assert_eq!(imports[0].records[1].date, day(4));
        assert_eq!(imports[0].records[1].status, "Present, Late");
    }

    #[test]
    fn snapshot_accepts_the_list_shape() {
        let json = r#"{
            "teachers": {
                "t-200": {
                    "name": "Ravi Anand",
                    "attendance": [
                        { "date": "2026-02-03", "status": "Absent" },
                        { "date": "2026-02-04", "status": "left early", "time_in": "08:02", "time_out": "13:10" }
                    ]
                }
            }
        }"#;

        let imports = parse_snapshot(json).expect("snapshot should parse");
        assert_eq!(imports[0].records.len(), 2);
        assert_eq!(imports[0].records[1].status, "left early");
        assert_eq!(imports[0].records[1].time_out.as_deref(), Some("13:10"));
    }

    #[test]
    fn snapshot_falls_back_to_a_keyed_teacher_name() {
        let json = r#"{
            "teachers": {
                "t-300": { "attendance": {} },
                "t-301": { "name": "" }
            }
        }"#;

        let imports = parse_snapshot(json).expect("snapshot should parse");
        assert_eq!(imports[0].name, "Teacher t-300");
        assert_eq!(imports[1].name, "Teacher t-301");
    }

    #[test]
    fn snapshot_rejects_a_listed_record_without_a_date() {
        let json = r#"{
            "teachers": {
                "t-400": {
                    "name": "Ravi Anand",
                    "attendance": [ { "status": "Present" } ]
                }
            }
        }"#;

        let error = parse_snapshot(json).expect_err("snapshot should be rejected");
        assert!(error.to_string().contains("without a date"));
    }
}
