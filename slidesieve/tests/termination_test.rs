mod common;

use common::{cargo_tmpdir, create_test_video};
use image::RgbImage;
use signal_hook::{consts::SIGTERM, low_level};
use slidesieve::{
    embed::{vector::Embedding, DctFeatures, EmbedError, FeatureExtractor},
    extract::{self, ScanArgs},
    ocr::MockRecognizer,
    pipeline::{self, PipelineError, ENHANCED_DIR, KEYFRAMES_DIR, SUMMARY_FILE, TEXT_FILE},
};
use slidesieve_common::bin_common::termination;

/// Embeds like the real extractor, but raises a termination signal after the
/// first frame, as if the user hit ctrl-c mid scan.
struct InterruptingFeatures {
    inner: DctFeatures,
    raised: bool,
}

impl InterruptingFeatures {
    fn new() -> Self {
        Self {
            inner: DctFeatures::new(),
            raised: false,
        }
    }
}

impl FeatureExtractor for InterruptingFeatures {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn embed(&mut self, frame: &RgbImage) -> Result<Embedding, EmbedError> {
        let embedding = self.inner.embed(frame)?;
        if !self.raised {
            self.raised = true;
            low_level::raise(SIGTERM).expect("raising a signal at ourselves works");
        }
        Ok(embedding)
    }
}

// This is the only test in this binary on purpose: with the flag already up,
// a second signal would take the whole process down.
#[test]
fn a_termination_request_keeps_what_is_saved_and_skips_the_rest() -> Result<(), PipelineError> {
    let video = create_test_video();
    let workdir = cargo_tmpdir().join("pipeline_interrupted");
    let term = termination::Cookie::new().unwrap();
    let mut features = InterruptingFeatures::new();
    let mut recognizer = MockRecognizer::new(|_| panic!("the text stage must not run"));

    let report = pipeline::run(
        &video,
        &workdir,
        &ScanArgs::default(),
        &mut features,
        &mut recognizer,
        None,
        &term,
    )?;

    // the signal came in right after the first keyframe was saved
    assert!(report.interrupted);
    assert_eq!(1, report.frames_seen);
    assert_eq!(1, report.frames_sampled);
    assert_eq!(1, report.keyframes.len());
    assert!(workdir
        .join(KEYFRAMES_DIR)
        .join("keyframe_0001.png")
        .is_file());

    assert!(report.enhanced.is_empty());
    assert!(std::fs::read_dir(workdir.join(ENHANCED_DIR))
        .unwrap()
        .next()
        .is_none());
    assert_eq!(None, report.text_file);
    assert!(!workdir.join(TEXT_FILE).exists());
    assert_eq!(None, report.summary_file);
    assert!(!workdir.join(SUMMARY_FILE).exists());

    // the flag stays up, so a scan started afterwards winds down before
    // counting a single frame
    let outdir = cargo_tmpdir().join("scan_after_term");
    let mut features = DctFeatures::new();
    let outcome = extract::scan_video(&video, &outdir, &ScanArgs::default(), &mut features, &term)?;
    assert!(outcome.interrupted);
    assert!(outcome.keyframes.is_empty());
    assert_eq!(0, outcome.frames_seen);
    Ok(())
}
