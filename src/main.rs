use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use uploadscan::config::settings::Settings;
use uploadscan::core::batch::BatchScanner;
use uploadscan::core::events::create_event_channel;
use uploadscan::core::filename::sanitize_file_name;
use uploadscan::core::scanner::FileScanner;
use uploadscan::export;
use uploadscan::models::batch::{BatchReport, FileReport};
use uploadscan::models::scan_result::{human_readable_size, AuditRecord};

#[derive(Parser, Debug)]
#[command(name = "uploadscan", version, about = "Heuristic security scanner for uploaded files")]
struct Cli {
    /// Files or directories to scan
    paths: Vec<PathBuf>,

    /// TOML settings file (missing keys use defaults)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Maximum concurrent scans
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Declared upload name to scan a single file under
    #[arg(long)]
    name: Option<String>,

    /// Export the batch report as JSON
    #[arg(long)]
    export_json: Option<PathBuf>,

    /// Export the batch report as Markdown
    #[arg(long)]
    export_markdown: Option<PathBuf>,

    /// Export the batch report as HTML
    #[arg(long)]
    export_html: Option<PathBuf>,

    /// Append one audit record per file to this JSON Lines log
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Print the default settings as TOML and exit
    #[arg(long)]
    print_default_config: bool,

    /// Print the sanitized form of NAME and exit
    #[arg(long, value_name = "NAME")]
    sanitize: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays clean for results
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.print_default_config {
        print!("{}", toml::to_string_pretty(&Settings::default())?);
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(ref name) = cli.sanitize {
        println!("{}", sanitize_file_name(name));
        return Ok(ExitCode::SUCCESS);
    }

    if cli.paths.is_empty() {
        anyhow::bail!("no paths given");
    }
    if cli.name.is_some() && cli.paths.len() != 1 {
        anyhow::bail!("--name requires exactly one path");
    }

    let mut settings = match cli.config {
        Some(ref path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(conc) = cli.concurrency {
        settings.max_concurrent_io = conc;
    }

    let scanner = Arc::new(FileScanner::new(settings).context("invalid scanner settings")?);

    let report = match cli.name {
        Some(ref name) => {
            let started = Instant::now();
            let path = cli.paths[0].clone();
            let task_scanner = Arc::clone(&scanner);
            let task_path = path.clone();
            let task_name = name.clone();
            let result = tokio::task::spawn_blocking(move || {
                task_scanner.scan_file(&task_path, Some(&task_name))
            })
            .await?;
            let file = FileReport {
                path: path.clone(),
                declared_name: name.clone(),
                result,
            };
            BatchReport::from_files(vec![file], vec![path], started.elapsed())
        }
        None => {
            // Nothing listens for events here; dropping the receiver makes sends no-ops.
            let (event_tx, event_rx) = create_event_channel();
            drop(event_rx);
            let max_io = scanner.settings().max_concurrent_io;
            let batch = BatchScanner::new(scanner, max_io, event_tx);
            batch.scan_paths(cli.paths.clone()).await?
        }
    };

    print_report(&report);

    if let Some(ref path) = cli.export_json {
        export::json::export_json(&report, path)?;
        println!("Exported to: {}", path.display());
    }
    if let Some(ref path) = cli.export_markdown {
        export::markdown::export_markdown(&report, path)?;
        println!("Exported to: {}", path.display());
    }
    if let Some(ref path) = cli.export_html {
        export::html::export_html(&report, path)?;
        println!("Exported to: {}", path.display());
    }
    if let Some(ref path) = cli.audit_log {
        let records: Vec<AuditRecord> = report
            .files
            .iter()
            .map(|f| f.result.audit_record(&f.declared_name))
            .collect();
        export::audit::append_audit_log(&records, path)?;
    }

    Ok(if report.all_safe() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_report(report: &BatchReport) {
    for file in &report.files {
        let verdict = if file.result.is_safe { "SAFE  " } else { "UNSAFE" };
        println!(
            "{} {} ({}, {})",
            verdict,
            file.path.display(),
            file.result.file_type,
            human_readable_size(file.result.file_size_bytes)
        );
        for threat in &file.result.threats {
            println!("       - {}", threat);
        }
    }
    println!(
        "\n{} files scanned, {} unsafe, {} threats in {:.2}s",
        report.total_files,
        report.unsafe_files,
        report.total_threats,
        report.scan_duration.as_secs_f64()
    );
}
