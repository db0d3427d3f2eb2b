use clap::Parser;
use pdf2dicom::cli::Cli;
use pdf2dicom::utils::logging::init_tracing;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    pdf2dicom::cli::run_cli(cli)
}
