use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::ingest;
use crate::models::AttendanceRow;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let teachers = vec![
        (
            Uuid::parse_str("8a1d4c6e-53b9-4e21-9c07-6f2b8a9d14e3")?,
            "Meera Joshi",
            "Electronics Mechanic",
        ),
        (
            Uuid::parse_str("2f9b7a10-c44d-4a8f-b3e6-91d25c7e08aa")?,
            "Daniel Okafor",
            "Fitter",
        ),
        (
            Uuid::parse_str("b64e2d83-7f15-4c09-a5d2-40c8e19b63f7")?,
            "Sana Qureshi",
            "COPA",
        ),
    ];

    for (id, name, trade) in teachers {
        sqlx::query(
            r#"
            INSERT INTO teacher_attendance.teachers (id, full_name, trade)
            VALUES ($1, $2, $3)
            ON CONFLICT (full_name) DO UPDATE
            SET trade = EXCLUDED.trade
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(trade)
        .execute(pool)
        .await?;
    }

    // Status text is stored exactly as an upstream device would report it,
    // messy spellings included.
    let records = vec![
        (
            "Meera Joshi",
            NaiveDate::from_ymd_opt(2026, 2, 2).context("invalid date")?,
            "Present",
            Some("07:58"),
            Some("16:32"),
        ),
        (
            "Meera Joshi",
            NaiveDate::from_ymd_opt(2026, 2, 3).context("invalid date")?,
            "Present",
            Some("08:01"),
            Some("16:30"),
        ),
        (
            "Meera Joshi",
            NaiveDate::from_ymd_opt(2026, 2, 4).context("invalid date")?,
            "left_on_time",
            Some("07:55"),
            Some("16:30"),
        ),
        (
            "Meera Joshi",
            NaiveDate::from_ymd_opt(2026, 2, 5).context("invalid date")?,
            "Present",
            Some("08:00"),
            Some("16:35"),
        ),
        (
            "Meera Joshi",
            NaiveDate::from_ymd_opt(2026, 2, 6).context("invalid date")?,
            "Present",
            Some("07:59"),
            Some("16:31"),
        ),
        (
            "Daniel Okafor",
            NaiveDate::from_ymd_opt(2026, 2, 2).context("invalid date")?,
            "Present, Late",
            Some("08:27"),
            Some("16:30"),
        ),
        (
            "Daniel Okafor",
            NaiveDate::from_ymd_opt(2026, 2, 3).context("invalid date")?,
            "Present",
            Some("08:02"),
            Some("16:30"),
        ),
        (
            "Daniel Okafor",
            NaiveDate::from_ymd_opt(2026, 2, 4).context("invalid date")?,
            "Late",
            Some("08:41"),
            Some("16:30"),
        ),
        (
            "Daniel Okafor",
            NaiveDate::from_ymd_opt(2026, 2, 5).context("invalid date")?,
            "Present",
            Some("07:57"),
            Some("16:28"),
        ),
        (
            "Daniel Okafor",
            NaiveDate::from_ymd_opt(2026, 2, 6).context("invalid date")?,
            "left early",
            Some("08:05"),
            Some("13:45"),
        ),
        (
            "Sana Qureshi",
            NaiveDate::from_ymd_opt(2026, 2, 2).context("invalid date")?,
            "Absent",
            None,
            None,
        ),
        (
            "Sana Qureshi",
            NaiveDate::from_ymd_opt(2026, 2, 3).context("invalid date")?,
            "Present",
            Some("08:03"),
            Some("16:30"),
        ),
        (
            "Sana Qureshi",
            NaiveDate::from_ymd_opt(2026, 2, 4).context("invalid date")?,
            "Absent",
            None,
            None,
        ),
        (
            "Sana Qureshi",
            NaiveDate::from_ymd_opt(2026, 2, 5).context("invalid date")?,
            "Present",
            Some("08:06"),
            Some("16:29"),
        ),
        (
            "Sana Qureshi",
            NaiveDate::from_ymd_opt(2026, 2, 6).context("invalid date")?,
            "sick leave",
            None,
            None,
        ),
    ];

    for (name, record_date, status, time_in, time_out) in records {
        let teacher_id: Uuid =
            sqlx::query("SELECT id FROM teacher_attendance.teachers WHERE full_name = $1")
                .bind(name)
                .fetch_one(pool)
                .await?
                .get("id");

        upsert_record(pool, teacher_id, record_date, status, time_in, time_out).await?;
    }

    Ok(())
}

async fn upsert_teacher(pool: &PgPool, name: &str, trade: Option<&str>) -> anyhow::Result<Uuid> {
    let teacher_id: Uuid = sqlx::query(
        r#"
        INSERT INTO teacher_attendance.teachers AS t (id, full_name, trade)
        VALUES ($1, $2, $3)
        ON CONFLICT (full_name) DO UPDATE
        SET trade = COALESCE(EXCLUDED.trade, t.trade)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(trade)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(teacher_id)
}

// One row per teacher and date; a re-import overwrites the day in place.
async fn upsert_record(
    pool: &PgPool,
    teacher_id: Uuid,
    record_date: NaiveDate,
    status: &str,
    time_in: Option<&str>,
    time_out: Option<&str>,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO teacher_attendance.attendance_records
        (id, teacher_id, record_date, status, time_in, time_out)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (teacher_id, record_date) DO UPDATE
        SET status = EXCLUDED.status,
            time_in = EXCLUDED.time_in,
            time_out = EXCLUDED.time_out
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(teacher_id)
    .bind(record_date)
    .bind(status)
    .bind(time_in)
    .bind(time_out)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn fetch_attendance(
    pool: &PgPool,
    since: Option<NaiveDate>,
    trade: Option<&str>,
    teacher: Option<&str>,
) -> anyhow::Result<Vec<AttendanceRow>> {
    // LEFT JOIN keeps teachers with no rows in the window; they surface as
    // zero-day rosters downstream instead of vanishing.
    let mut query = String::from(
        "SELECT t.id as teacher_id, t.full_name, t.trade, \
         r.record_date, r.status, r.time_in, r.time_out \
         FROM teacher_attendance.teachers t \
         LEFT JOIN teacher_attendance.attendance_records r \
         ON r.teacher_id = t.id",
    );

    let mut position = 0;
    if since.is_some() {
        position += 1;
        query.push_str(&format!(" AND r.record_date >= ${position}"));
    }
    if trade.is_some() {
        position += 1;
        query.push_str(&format!(" WHERE t.trade = ${position}"));
    } else if teacher.is_some() {
        position += 1;
        query.push_str(&format!(" WHERE t.full_name = ${position}"));
    }

    let mut rows = sqlx::query(&query);

    if let Some(value) = since {
        rows = rows.bind(value);
    }
    if let Some(value) = trade {
        rows = rows.bind(value);
    } else if let Some(value) = teacher {
        rows = rows.bind(value);
    }

    let fetched = rows.fetch_all(pool).await?;
    let mut records = Vec::new();

    for row in fetched {
        records.push(AttendanceRow {
            teacher_id: row.get("teacher_id"),
            teacher_name: row.get("full_name"),
            trade: row.get("trade"),
            record_date: row.get("record_date"),
            status: row.get("status"),
            time_in: row.get("time_in"),
            time_out: row.get("time_out"),
        });
    }

    Ok(records)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        teacher: String,
        trade: Option<String>,
        date: NaiveDate,
        status: String,
        time_in: Option<String>,
        time_out: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut written = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let teacher_id = upsert_teacher(pool, &row.teacher, row.trade.as_deref()).await?;

        let affected = upsert_record(
            pool,
            teacher_id,
            row.date,
            &row.status,
            row.time_in.as_deref(),
            row.time_out.as_deref(),
        )
        .await?;

        if affected > 0 {
            written += 1;
        }
    }

    Ok(written)
}

pub async fn import_snapshot(
    pool: &PgPool,
    json_path: &std::path::Path,
) -> anyhow::Result<(usize, usize)> {
    let raw = std::fs::read_to_string(json_path)
        .with_context(|| format!("failed to read {}", json_path.display()))?;
    let imports = ingest::parse_snapshot(&raw)?;

    let mut teachers = 0usize;
    let mut written = 0usize;

    for import in imports {
        let teacher_id = upsert_teacher(pool, &import.name, import.trade.as_deref()).await?;
        teachers += 1;

        for record in import.records {
            let affected = upsert_record(
                pool,
                teacher_id,
                record.date,
                &record.status,
                record.time_in.as_deref(),
                record.time_out.as_deref(),
            )
            .await?;

            if affected > 0 {
                written += 1;
            }
        }
    }

    Ok((teachers, written))
}
