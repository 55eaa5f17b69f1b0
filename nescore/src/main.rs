use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use lib_nescore::{
    InputFormat,
    config::CostConfig,
    iag,
    report::{show_details, show_iag, show_summary},
};
use log::LevelFilter;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

/// NE scoring: aligns a hypothesis annotation against a reference and reports Slot Error Rate,
/// precision/recall/F, and (optionally) inter-annotator-agreement statistics.
#[derive(Parser)]
struct Cli {
    #[clap(long, short = 'l', default_value = "info")]
    log_level: LevelFilter,

    /// Cost model description, in TOML.
    descr: PathBuf,

    /// The reference annotation file.
    reference: PathBuf,

    /// The hypothesis annotation file.
    hypothesis: PathBuf,

    /// The reference file is in "aref" format. The hypothesis is always read in the embedded
    /// `<tag>...</tag>` format.
    #[clap(short = 'a')]
    aref: bool,

    /// Show the summary of results. The default if none of `-s`/`-d`/`-i` are given.
    #[clap(short = 's')]
    summary: bool,

    /// Show detail of errors.
    #[clap(short = 'd')]
    details: bool,

    /// Show detail of errors and corrects.
    #[clap(short = 'c')]
    details_correct: bool,

    /// Show IAG-type inter-annotator-agreement values, estimated against this population size.
    #[clap(short = 'i')]
    expected_count: Option<f64>,

    /// In IAG mode, there are no confusions between reference and hypothesis tags.
    #[clap(short = 'o')]
    open: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    TermLogger::init(
        cli.log_level,
        Default::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    let details = cli.details || cli.details_correct;
    let iag_mode = cli.expected_count.is_some();
    let summary = cli.summary || (!details && !iag_mode);

    let config = CostConfig::load(&cli.descr)?;
    let reference_text = std::fs::read_to_string(&cli.reference)?;
    let hypothesis_text = std::fs::read_to_string(&cli.hypothesis)?;

    let reference_file = cli.reference.to_string_lossy();
    let hypothesis_file = cli.hypothesis.to_string_lossy();
    let format = if cli.aref { InputFormat::Aref } else { InputFormat::Embedded };

    let outcome = lib_nescore::run(
        config.clone(),
        &reference_text,
        &hypothesis_text,
        &reference_file,
        &hypothesis_file,
        format,
    )?;

    if details {
        show_details(
            &outcome.store,
            &outcome.result,
            &outcome.text,
            &reference_file,
            &hypothesis_file,
            &outcome.interner,
            cli.details_correct,
        );
    }

    if summary {
        show_summary(&outcome.scores, &config, &outcome.interner);
    }

    if let Some(expected_count) = cli.expected_count {
        let report = iag::compute_iag(&outcome.scores, config.tags.len(), cli.open, expected_count);
        show_iag(&report);
    }

    Ok(())
}
