use std::{ffi::OsString, path::PathBuf};

use clap::Parser;
use color_eyre::eyre::{self, Context};
use slidesieve::{
    embed::DctFeatures,
    extract::ScanArgs,
    ocr::TesseractCli,
    pipeline,
    summarize::{Summarizer, DEFAULT_MODEL},
};
use slidesieve_common::{
    bin_common::{
        init::{init_eyre, init_logger},
        termination,
    },
    utils::fsutils::read_optional_file,
};

#[derive(Parser, Debug)]
#[command()]
/// Boils a lecture video down to slide keyframes, their text and a summary.
///
/// The workspace directory is cleared on every run, so everything in it
/// belongs to the latest video.
struct Cli {
    #[command(flatten)]
    scan_args: ScanArgs,

    /// Where to place all produced files
    #[arg(long, short = 'w', default_value = "./workspace")]
    workdir: PathBuf,

    /// Language for the text recognizer
    #[arg(long, default_value = "eng")]
    ocr_language: String,

    /// Do not ask Gemini for a summary
    #[arg(long)]
    no_summary: bool,

    /// Gemini model to ask for the summary
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// A file to additionally write the logs to
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// The lecture video to process
    videofile: PathBuf,
}

fn cli_arguments() -> eyre::Result<Cli> {
    const ARGS_FILE: &str = ".slidesieverc";
    let mut args: Vec<OsString> = std::env::args_os().collect();

    if args.len() == 1 {
        if let Some(flags) = read_optional_file(ARGS_FILE)
            .wrap_err_with(|| format!("Could not read config file at: {ARGS_FILE}"))?
        {
            args.extend(
                flags
                    .split_whitespace()
                    .map(|s| std::ffi::OsStr::new(s).to_owned()),
            );
        }
    }

    Ok(Cli::parse_from(args))
}

fn main() -> eyre::Result<()> {
    init_eyre()?;
    let cli = cli_arguments()?;
    init_logger(cli.logfile.as_deref())?;
    log::debug!("CLI arguments: {cli:#?}");

    let summarizer = if cli.no_summary {
        None
    } else {
        let summarizer = Summarizer::from_env()
            .wrap_err("need a Gemini API key for the summary, or pass --no-summary")?;
        Some(summarizer.with_model(&cli.model))
    };

    let term_cookie = termination::Cookie::new().wrap_err("failed to create term cookie")?;
    let mut features = DctFeatures::new();
    let mut recognizer = TesseractCli::new(&cli.ocr_language);

    let report = pipeline::run(
        &cli.videofile,
        &cli.workdir,
        &cli.scan_args,
        &mut features,
        &mut recognizer,
        summarizer.as_ref(),
        &term_cookie,
    )
    .wrap_err_with(|| format!("failed to process {}", cli.videofile.display()))?;

    log::info!(
        "Done: {} keyframes from {} decoded frames",
        report.keyframes.len(),
        report.frames_seen
    );
    if let Some(summary_file) = &report.summary_file {
        log::info!("The summary is at {}", summary_file.display());
    }
    if report.interrupted {
        log::warn!("The run was interrupted, the output is partial");
    }

    Ok(())
}
