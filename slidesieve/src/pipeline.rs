use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use slidesieve_common::{bin_common::termination, utils::fsutils};

use crate::{
    embed::FeatureExtractor,
    enhance::{self, EnhanceError},
    extract::{self, ExtractError, ScanArgs},
    ocr::{self, OcrError, TextRecognizer},
    sink::Keyframe,
    summarize::{SummarizeError, Summarizer},
};

pub const KEYFRAMES_DIR: &str = "01_keyframes";
pub const ENHANCED_DIR: &str = "02_enhanced";
pub const TEXT_FILE: &str = "03_extracted_text.txt";
pub const SUMMARY_FILE: &str = "lecture_summary.md";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to prepare the workspace at {path}: {source}")]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Enhance(#[from] EnhanceError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Summarize(#[from] SummarizeError),
    #[error("failed to write {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What one run produced. Stages that did not get to run leave their fields
/// empty or None.
#[derive(Debug)]
pub struct PipelineReport {
    pub keyframes: Vec<Keyframe>,
    pub enhanced: Vec<PathBuf>,
    pub text_file: Option<PathBuf>,
    pub summary_file: Option<PathBuf>,
    pub frames_seen: u64,
    pub frames_sampled: u64,
    pub interrupted: bool,
}

/// Runs the whole pipeline on one video: keyframes into
/// `workdir/01_keyframes`, enhanced copies into `workdir/02_enhanced`, their
/// text into `workdir/03_extracted_text.txt` and, when a summarizer is
/// given, a summary into `workdir/lecture_summary.md`.
///
/// The workspace is cleared up front so everything in it belongs to this
/// run. A termination request between stages stops the pipeline but keeps
/// everything already written.
pub fn run(
    video: &Path,
    workdir: &Path,
    scan_args: &ScanArgs,
    features: &mut dyn FeatureExtractor,
    recognizer: &mut dyn TextRecognizer,
    summarizer: Option<&Summarizer>,
    term: &termination::Cookie,
) -> Result<PipelineReport, PipelineError> {
    let keyframe_dir = workdir.join(KEYFRAMES_DIR);
    let enhanced_dir = workdir.join(ENHANCED_DIR);
    let text_file = workdir.join(TEXT_FILE);
    let summary_file = workdir.join(SUMMARY_FILE);

    prepare_workspace(
        workdir,
        &[&keyframe_dir, &enhanced_dir],
        &[&text_file, &summary_file],
    )?;

    let before = Instant::now();
    let outcome = extract::scan_video(video, &keyframe_dir, scan_args, features, term)?;
    let elapsed = humantime::Duration::from(before.elapsed());
    log::info!("It took {elapsed} to scan the video");

    let mut report = PipelineReport {
        keyframes: outcome.keyframes,
        enhanced: Vec::new(),
        text_file: None,
        summary_file: None,
        frames_seen: outcome.frames_seen,
        frames_sampled: outcome.frames_sampled,
        interrupted: outcome.interrupted,
    };

    if report.keyframes.is_empty() {
        log::warn!(
            "No keyframes came out of {}, there is nothing to process",
            video.display()
        );
        return Ok(report);
    }
    if report.interrupted {
        log::info!("Skipping the remaining stages, keeping what is already done");
        return Ok(report);
    }

    report.enhanced = enhance::enhance_dir(&keyframe_dir, &enhanced_dir)?;
    log::info!("Enhanced {} keyframes", report.enhanced.len());

    if term.is_terminating() {
        log::info!("Skipping the remaining stages, keeping what is already done");
        report.interrupted = true;
        return Ok(report);
    }

    let before = Instant::now();
    let text = ocr::recognize_slides(recognizer, &enhanced_dir)?;
    let elapsed = humantime::Duration::from(before.elapsed());
    log::info!("It took {elapsed} to read {} slides", report.enhanced.len());
    write_output(&text_file, &text)?;
    report.text_file = Some(text_file);

    if let Some(summarizer) = summarizer {
        if term.is_terminating() {
            log::info!("Skipping the summary, keeping what is already done");
            report.interrupted = true;
            return Ok(report);
        }
        let summary = summarizer.summarize(&text)?;
        write_output(&summary_file, &summary)?;
        report.summary_file = Some(summary_file);
    } else {
        log::info!("No summarizer is configured, skipping the summary");
    }

    Ok(report)
}

fn prepare_workspace(
    workdir: &Path,
    dirs: &[&Path],
    stale_files: &[&Path],
) -> Result<(), PipelineError> {
    std::fs::create_dir_all(workdir).map_err(|source| PipelineError::Workspace {
        path: workdir.to_owned(),
        source,
    })?;
    for dir in dirs {
        fsutils::clear_dir(dir).map_err(|source| PipelineError::Workspace {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    for file in stale_files {
        fsutils::remove_optional_file(file).map_err(|source| PipelineError::Workspace {
            path: file.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn write_output(path: &Path, content: &str) -> Result<(), PipelineError> {
    std::fs::write(path, content).map_err(|source| PipelineError::WriteOutput {
        path: path.to_owned(),
        source,
    })
}
