use crate::logic::batch::{run_batch_file, BatchOptions};
use crate::logic::encapsulate::encapsulate;
use crate::logic::plan::{plan_batch, PlanRequest};
use crate::models::ConversionRequest;
use crate::utils::logging::{write_logs, LogEntry};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

/// Wrap PDF reports as DICOM Encapsulated PDF files.
///
/// Single document: pdf2dicom <PDF> <OUTPUT> <PATIENT_NAME> <PATIENT_ID> <ACCESSION> [STUDY_DATE]
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// JSON batch descriptor: several PDFs of one study
    #[arg(long, value_name = "CONFIG")]
    pub batch: Option<PathBuf>,

    /// Encapsulate batch documents in parallel
    #[arg(long, default_value_t = false, requires = "batch")]
    pub parallel: bool,

    /// Append a CSV line per batch document to this file
    #[arg(long, value_name = "CSV", requires = "batch")]
    pub log_file: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// PDF to encapsulate
    #[arg(required_unless_present = "batch", conflicts_with = "batch")]
    pub pdf: Option<PathBuf>,

    /// Destination DICOM file
    #[arg(required_unless_present = "batch")]
    pub output: Option<PathBuf>,

    /// Patient name, e.g. DOE^JANE
    #[arg(required_unless_present = "batch")]
    pub patient_name: Option<String>,

    #[arg(required_unless_present = "batch")]
    pub patient_id: Option<String>,

    #[arg(required_unless_present = "batch")]
    pub accession_number: Option<String>,

    /// YYYYMMDD, defaults to today
    pub study_date: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a batch descriptor for every PDF in a folder
    Scan {
        /// Folder containing the report PDFs
        input: PathBuf,

        /// Root folder for DICOM output; files go under <ROOT>/<ACCESSION>/
        #[arg(short, long)]
        output_root: PathBuf,

        #[arg(long)]
        patient_name: String,

        #[arg(long)]
        patient_id: String,

        #[arg(long)]
        accession: String,

        /// YYYYMMDD
        #[arg(long)]
        study_date: Option<String>,

        #[arg(long)]
        study_description: Option<String>,
    },
}

pub fn run_cli(cli: Cli) -> ExitCode {
    if let Some(Commands::Scan {
        input,
        output_root,
        patient_name,
        patient_id,
        accession,
        study_date,
        study_description,
    }) = cli.command
    {
        let request = PlanRequest {
            input_folder: input,
            output_root,
            patient_name,
            patient_id,
            accession_number: accession,
            study_date,
            study_description,
        };
        let planned = plan_batch(&request)
            .and_then(|config| serde_json::to_string_pretty(&config).map_err(Into::into));
        return match planned {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{} {:#}", "✖".red(), e);
                ExitCode::FAILURE
            }
        };
    }

    if let Some(config_path) = cli.batch {
        let options = BatchOptions {
            parallel: cli.parallel,
        };
        let report = run_batch_file(&config_path, &options);

        if let Some(log_path) = &cli.log_file {
            let entries: Vec<LogEntry> = report.results.iter().map(LogEntry::from).collect();
            if let Err(e) = write_logs(log_path, &entries) {
                tracing::warn!("Unable to write conversion log: {e:#}");
            }
        }

        return match serde_json::to_string(&report) {
            Ok(json) => {
                println!("{json}");
                if report.success {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(e) => {
                eprintln!("ERROR:unable to serialize batch report: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let (Some(pdf), Some(output), Some(patient_name), Some(patient_id), Some(accession)) = (
        cli.pdf,
        cli.output,
        cli.patient_name,
        cli.patient_id,
        cli.accession_number,
    ) else {
        println!("ERROR:missing arguments, see --help");
        return ExitCode::FAILURE;
    };

    let request = ConversionRequest::new(pdf, output, patient_name, patient_id, accession)
        .with_study_date(cli.study_date);
    let result = encapsulate(&request);

    match (result.success, result.path) {
        (true, Some(path)) => {
            println!("OK:{}", path.display());
            ExitCode::SUCCESS
        }
        _ => {
            println!(
                "ERROR:{}",
                result.error.as_deref().unwrap_or("unknown error")
            );
            ExitCode::FAILURE
        }
    }
}
