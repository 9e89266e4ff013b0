use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use employer_training_fees::aggregate::{self, SummaryOrder};
use employer_training_fees::collect::{Collection, Collector, CollectorConfig, DEFAULT_MAX_PAGES};
use employer_training_fees::export::{self, Sheets};
use employer_training_fees::fetch::HttpPageSource;
use employer_training_fees::logging;
use employer_training_fees::models::CourseType;
use employer_training_fees::query::build_query;
use employer_training_fees::report;
use employer_training_fees::validate::Strictness;

#[derive(Parser)]
#[command(name = "training-fees")]
#[command(about = "Collects employer training rounds and summarizes fees per institution", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long, value_enum, default_value_t = CourseType::All)]
    course_type: CourseType,
    /// First course start date (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,
    /// Last course start date (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,
    /// Overrides the AUTH_KEY environment variable
    #[arg(long)]
    auth_key: Option<String>,
    #[arg(long, value_enum, default_value_t = Strictness::Lenient)]
    strictness: Strictness,
    /// Drop rows whose course type differs from --course-type
    #[arg(long)]
    enforce_course_type: bool,
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect rounds, print the institution summary and optionally export
    Collect {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, value_enum, default_value_t = SummaryOrder::Fee)]
        order: SummaryOrder,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Write the rounds and the institution summary as CSV files
        #[arg(long)]
        csv: bool,
        /// Write a workbook with rounds and institution sheets
        #[arg(long)]
        xlsx: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn resolve_auth_key(flag: Option<String>) -> anyhow::Result<String> {
    match flag {
        Some(key) => Ok(key),
        None => std::env::var("AUTH_KEY")
            .context("AUTH_KEY must be set (or pass --auth-key) to query the training API"),
    }
}

fn run_collection(query: &QueryArgs) -> anyhow::Result<Collection> {
    let params = build_query(query.course_type, query.start, query.end)?;
    let source = HttpPageSource::new(resolve_auth_key(query.auth_key.clone())?)?;
    let config = CollectorConfig {
        strictness: query.strictness,
        max_pages: query.max_pages,
        enforce_course_type: query.enforce_course_type,
    };

    // One run per process, so a run cache could never be hit here.
    Ok(Collector::new(source, config).collect(&params))
}

fn write_export(dir: &Path, name: String, bytes: Vec<u8>) -> anyhow::Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}.", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            query,
            order,
            out_dir,
            csv,
            xlsx,
        } => {
            let collection = run_collection(&query)?;

            if collection.is_no_data() {
                println!("No training rounds matched these conditions.");
                return Ok(());
            }

            let summaries = aggregate::summarize_by_institution(&collection.records);
            let ordered = aggregate::order_summaries(&summaries, order);

            println!(
                "Collected {} rounds across {} institutions:",
                collection.records.len(),
                ordered.len()
            );
            for (index, summary) in ordered.iter().enumerate() {
                println!(
                    "{:>4}. {} - {} rounds, {} enrolled, {} total fee",
                    index + 1,
                    summary.institution,
                    summary.round_count,
                    report::format_thousands(summary.enrollment_sum),
                    report::format_thousands(summary.total_fee_sum)
                );
            }

            let generated_at = Local::now().naive_local();
            if csv {
                let bytes = export::to_csv(&collection.records)?;
                let name = export::suggested_filename("training_rounds", "csv", generated_at);
                write_export(&out_dir, name, bytes)?;

                let bytes = export::institutions_to_csv(&ordered)?;
                let name = export::suggested_filename("training_institutions", "csv", generated_at);
                write_export(&out_dir, name, bytes)?;
            }
            if xlsx {
                let bytes = export::to_xlsx(Sheets {
                    detail: Some(collection.records.as_slice()),
                    institutions: Some(ordered.as_slice()),
                })?;
                let name = export::suggested_filename("training_rounds", "xlsx", generated_at);
                write_export(&out_dir, name, bytes)?;
            }

            if let Some(error) = collection.error() {
                bail!("collection incomplete, results above are partial: {error}");
            }
        }
        Commands::Report { query, out } => {
            let collection = run_collection(&query)?;
            let report =
                report::build_report(query.course_type, query.start, query.end, &collection);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());

            if let Some(error) = collection.error() {
                bail!("collection incomplete, report is partial: {error}");
            }
        }
    }

    Ok(())
}
