//! Command handlers for Freight Manifest CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! and configuration to the extraction engine.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use crate::app::{
    render_report, render_summary, run_upload, BatchIdentity, BatchSummary, CargoRecord,
    ManifestParser, ParseOutcome, PassthroughTranslator, Translator,
};
use crate::cli::{ConfigAction, ConfigArgs, InspectArgs, OutputFormat, ParseArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// JSON document printed by `parse --format json`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    source: &'a str,
    parsed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch: Option<&'a BatchIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<&'a [CargoRecord]>,
    summary: &'a BatchSummary,
}

fn spinner(message: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒"]),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    Some(spinner)
}

fn build_parser(config: &AppConfig, no_translate: bool) -> Result<ManifestParser> {
    let parser_config = config.parser_config()?;
    let translator: Arc<dyn Translator> = if no_translate {
        debug!("Translation disabled on the command line");
        Arc::new(PassthroughTranslator)
    } else {
        config.translation_config()?.build_translator()?
    };
    Ok(ManifestParser::new(parser_config, translator))
}

fn ensure_readable(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(AppError::generic(format!(
            "Cannot read manifest file: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Handle the parse command
///
/// An empty result is reported, not treated as an error.
pub async fn handle_parse(args: ParseArgs, config: &AppConfig, quiet: bool) -> Result<()> {
    let source_name = args.source_name();
    if !args.reads_stdin() {
        ensure_readable(&args.file)?;
    }

    let parser = Arc::new(build_parser(config, args.no_translate)?);
    let period = args.period.clone().unwrap_or_default();
    let start = Instant::now();

    let progress = spinner(&format!("Parsing {}...", source_name), quiet);
    let outcome = if args.reads_stdin() {
        run_upload(tokio::io::stdin(), "stdin", &period, parser).await?
    } else {
        let path = args.file.clone();
        tokio::task::spawn_blocking(move || parser.run_path(&path, &period))
            .await
            .map_err(|e| AppError::generic(format!("Parse task failed: {}", e)))?
    };
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }
    info!("Parsed {} in {:?}", source_name, start.elapsed());

    match args.format {
        OutputFormat::Json => print_json(&outcome, &source_name, args.summary_only),
        OutputFormat::Table => {
            print_table(&outcome, &source_name, args.summary_only);
            Ok(())
        }
    }
}

fn failure_message(outcome: &ParseOutcome) -> Option<String> {
    match outcome {
        ParseOutcome::Parsed(_) => None,
        ParseOutcome::StructuralFailure(e) => Some(e.to_string()),
        ParseOutcome::Failed { message } => Some(message.clone()),
    }
}

fn print_table(outcome: &ParseOutcome, source_name: &str, summary_only: bool) {
    match outcome.report() {
        Some(report) if summary_only => {
            println!("📦 Batch {} ({})", report.batch.batch_number, report.range);
            print!("{}", render_summary(&report.summary));
        }
        Some(report) => print!("{}", render_report(report, source_name)),
        None => {
            let reason = failure_message(outcome).unwrap_or_default();
            println!("⚠️  No records extracted from {}: {}", source_name, reason);
        }
    }
}

fn print_json(outcome: &ParseOutcome, source_name: &str, summary_only: bool) -> Result<()> {
    let empty_summary = BatchSummary::default();
    let report = outcome.report();

    let output = JsonOutput {
        source: source_name,
        parsed: outcome.is_parsed(),
        message: failure_message(outcome),
        batch: report.map(|r| &r.batch),
        records: if summary_only {
            None
        } else {
            Some(report.map(|r| r.records.as_slice()).unwrap_or(&[]))
        },
        summary: report.map(|r| &r.summary).unwrap_or(&empty_summary),
    };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| AppError::generic(format!("Failed to serialize records: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Handle the inspect command
pub async fn handle_inspect(args: InspectArgs, config: &AppConfig) -> Result<()> {
    ensure_readable(&args.file)?;
    let bytes = tokio::fs::read(&args.file).await?;
    let parser = ManifestParser::new(config.parser_config()?, Arc::new(PassthroughTranslator));

    let inspection = tokio::task::spawn_blocking(move || parser.inspect(&bytes))
        .await
        .map_err(|e| AppError::generic(format!("Inspect task failed: {}", e)))??;

    println!("🔍 Document Inspection: {}", args.file.display());
    println!("=======================");
    if let Some(format) = inspection.format {
        println!("Format: {:?}", format);
    }
    println!("Sheet: {}", inspection.sheet_name);
    println!(
        "Size: {} rows x {} columns, {} non-empty cells",
        inspection.rows, inspection.columns, inspection.cells
    );
    println!("Merged ranges: {}", inspection.merged_ranges);
    println!(
        "Tabular view: {}",
        if inspection.tabular_available {
            "available"
        } else {
            "unavailable (cell-by-cell fallback)"
        }
    );
    println!();

    match &inspection.batch {
        Some(batch) => println!(
            "✅ Batch number: {} (numeric part: {})",
            batch.batch_number, batch.batch_number_numeric
        ),
        None => println!("❌ Batch number: not found"),
    }
    match &inspection.range {
        Some(range) => println!("✅ Data range: {} ({} rows)", range, range.row_count()),
        None => println!("❌ Data range: not found"),
    }
    if let Some(mapping) = &inspection.mapping {
        println!("✅ Column mapping:");
        for (field, column) in mapping.iter() {
            println!("   {:<24} column {}", field.as_str(), column);
        }
        println!("Composite groups: {}", inspection.composite_groups);
    }

    Ok(())
}

/// Handle the config command
pub async fn handle_config(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let path = path
                .or_else(AppConfig::default_config_path)
                .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;
            AppConfig::write_default(&path, force).await?;

            println!("📁 Created default configuration file:");
            println!("   {}", path.display());
            println!("   You can customize settings by editing this file.");
            Ok(())
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{DataRange, ParseReport};
    use crate::errors::ExtractError;

    fn parsed_outcome() -> ParseOutcome {
        ParseOutcome::Parsed(ParseReport {
            batch: BatchIdentity {
                batch_number: "P12-A".to_string(),
                batch_number_numeric: "12".to_string(),
            },
            range: DataRange::new(6, 7),
            mapping: Default::default(),
            records: Vec::new(),
            summary: BatchSummary::default(),
            dropped_rows: Vec::new(),
        })
    }

    #[test]
    fn test_failure_message() {
        assert!(failure_message(&parsed_outcome()).is_none());

        let failure = ParseOutcome::StructuralFailure(ExtractError::DataRangeNotFound);
        assert!(failure_message(&failure).is_some());
    }

    #[test]
    fn test_build_parser_without_translation() {
        let parser = build_parser(&AppConfig::default(), true).unwrap();
        assert_eq!(parser.config().end_gap_rows, 3);
    }

    #[test]
    fn test_ensure_readable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(ensure_readable(file.path()).is_ok());
        assert!(ensure_readable(Path::new("/definitely/not/here.xlsx")).is_err());
    }

    #[tokio::test]
    async fn test_config_init_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("freight-manifest.toml");
        let args = ConfigArgs {
            action: ConfigAction::Init {
                path: Some(path.clone()),
                force: false,
            },
        };

        handle_config(args, &AppConfig::default()).await.unwrap();
        assert!(path.exists());
    }
}
