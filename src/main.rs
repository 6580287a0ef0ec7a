use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod analysis;
mod db;
mod ingest;
mod models;
mod report;
mod status;

#[derive(Parser)]
#[command(name = "attendance-insight")]
#[command(about = "Attendance condition tracker for a teaching roster", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a realistic seed roster
    Seed,
    /// Import attendance rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Import a JSON snapshot exported from the attendance store
    ImportSnapshot {
        #[arg(long)]
        json: PathBuf,
    },
    /// Assess attendance conditions across the roster
    #[command(group(
        ArgGroup::new("scope")
            .args(["trade", "teacher"])
            .multiple(false)
    ))]
    Assess {
        #[arg(long)]
        trade: Option<String>,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("scope")
            .args(["trade", "teacher"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        trade: Option<String>,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show one teacher's stats, condition, and recent records
    Detail {
        #[arg(long)]
        teacher: String,
        #[arg(long)]
        since_days: Option<i64>,
    },
    /// Export assessments as JSON for the display layer
    #[command(group(
        ArgGroup::new("scope")
            .args(["trade", "teacher"])
            .multiple(false)
    ))]
    Export {
        #[arg(long)]
        trade: Option<String>,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the attendance Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed roster inserted.");
        }
        Commands::Import { csv } => {
            let written = db::import_csv(&pool, &csv).await?;
            println!("Wrote {written} attendance rows from {}.", csv.display());
        }
        Commands::ImportSnapshot { json } => {
            let (teachers, records) = db::import_snapshot(&pool, &json).await?;
            println!(
                "Imported {teachers} teachers and {records} attendance rows from {}.",
                json.display()
            );
        }
        Commands::Assess {
            trade,
            teacher,
            since_days,
            limit,
        } => {
            let roster = load_roster(
                &pool,
                since_days,
                trade.as_deref(),
                teacher.as_deref(),
            )
            .await?;
            let assessments = report::assess_roster(&roster);

            if assessments.is_empty() {
                println!("No teachers found for this scope.");
                return Ok(());
            }

            println!("Teachers needing attention first:");
            for entry in assessments.iter().take(limit) {
                println!(
                    "- {} ({}) {} at {:.1}% across {} days",
                    entry.name,
                    entry.trade.as_deref().unwrap_or("unassigned"),
                    entry.condition_label,
                    entry.stats.attendance_rate,
                    entry.stats.total_days
                );
                println!("  {}. {}", entry.analysis.reason, entry.analysis.advice);
                if let Some(pattern) = &entry.analysis.late_pattern {
                    println!("  Pattern: {pattern}");
                }
            }
        }
        Commands::Report {
            trade,
            teacher,
            since_days,
            out,
        } => {
            let roster = load_roster(
                &pool,
                since_days,
                trade.as_deref(),
                teacher.as_deref(),
            )
            .await?;
            let today = chrono::Utc::now().date_naive();
            let report = report::build_report(
                trade.as_deref().or(teacher.as_deref()),
                today,
                &roster,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Detail {
            teacher,
            since_days,
        } => {
            let roster = load_roster(&pool, since_days, None, Some(teacher.as_str())).await?;

            match roster.into_iter().next() {
                Some(subject) => print_detail(&subject),
                None => println!("No teacher named {teacher} found."),
            }
        }
        Commands::Export {
            trade,
            teacher,
            since_days,
            out,
        } => {
            let roster = load_roster(
                &pool,
                since_days,
                trade.as_deref(),
                teacher.as_deref(),
            )
            .await?;
            let assessments = report::assess_roster(&roster);
            let payload = serde_json::to_string_pretty(&assessments)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, payload)?;
                    println!("Export written to {}.", path.display());
                }
                None => println!("{payload}"),
            }
        }
    }

    Ok(())
}

async fn load_roster(
    pool: &sqlx::PgPool,
    since_days: Option<i64>,
    trade: Option<&str>,
    teacher: Option<&str>,
) -> anyhow::Result<Vec<models::TeacherAttendance>> {
    let since = since_days.map(ingest::cutoff_date);
    let rows = db::fetch_attendance(pool, since, trade, teacher).await?;
    Ok(ingest::group_attendance(&rows))
}

fn print_detail(subject: &models::TeacherAttendance) {
    let stats = analysis::compute_stats(&subject.records);
    let verdict = analysis::classify_condition(&stats);

    println!(
        "{} ({})",
        subject.name,
        subject.trade.as_deref().unwrap_or("unassigned")
    );
    println!(
        "Condition: {} [{}]",
        verdict.condition.label(),
        verdict.condition.color_class()
    );
    println!("{}.", verdict.reason);
    println!("Advice: {}", verdict.advice);
    if let Some(pattern) = &verdict.late_pattern {
        println!("Pattern: {pattern}");
    }

    println!();
    println!(
        "Days: {} total, {} present, {} absent, {} late, {} left early, {} left on time",
        stats.total_days,
        stats.present_days,
        stats.absent_days,
        stats.late_days,
        stats.left_early_days,
        stats.left_on_time_days
    );
    println!("Attendance rate: {:.1}%", stats.attendance_rate);

    let weeks = report::weekly_breakdown(&subject.records);
    if !weeks.is_empty() {
        println!();
        println!("Weekly summary:");
        for week in weeks {
            println!(
                "- week of {}: {} present, {} late, {} left early, {} left on time, {} absent",
                week.week_start,
                week.present,
                week.late,
                week.left_early,
                week.left_on_time,
                week.absent
            );
        }
    }

    if !subject.records.is_empty() {
        println!();
        println!("Recent records:");
        for record in subject.records.iter().rev().take(5) {
            println!(
                "- {}: {} (in {}, out {})",
                record.date,
                record.status,
                record.time_in.as_deref().unwrap_or("-"),
                record.time_out.as_deref().unwrap_or("-")
            );
        }
    }
}
