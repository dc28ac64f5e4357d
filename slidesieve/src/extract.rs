use std::{path::Path, time::Duration};

use slidesieve_common::{bin_common::termination, utils::time::Every};

use crate::{
    embed::{vector::Similarity, EmbedError, FeatureExtractor},
    frame_source::{FrameSource, SourceError},
    gate::{GateError, SimilarityGate, DEFAULT_THRESHOLD},
    sink::{Keyframe, KeyframeSink, SinkError},
};

pub const DEFAULT_STRIDE: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("the stride must be at least 1")]
    BadStride,
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Embed(#[from] EmbedError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// How a scan samples and filters frames.
#[derive(Debug, Clone, Copy, PartialEq, clap::Args)]
pub struct ScanArgs {
    /// Only consider every n:th frame of the video
    #[arg(long, default_value_t = DEFAULT_STRIDE)]
    pub stride: u64,

    /// Cosine similarity at or above which a frame counts as the same slide
    /// as the previous keyframe
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: Similarity,
}

impl Default for ScanArgs {
    fn default() -> Self {
        Self {
            stride: DEFAULT_STRIDE,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Whether the frame at `index` falls on the sampling grid.
pub fn should_sample(index: u64, stride: u64) -> bool {
    index % stride == 0
}

/// What a whole scan produced.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Every saved keyframe, in acceptance order.
    pub keyframes: Vec<Keyframe>,
    /// Frames decoded from the video.
    pub frames_seen: u64,
    /// Frames that fell on the sampling grid and were embedded.
    pub frames_sampled: u64,
    /// Whether the scan stopped early on a termination request. The keyframes
    /// saved up to that point are kept.
    pub interrupted: bool,
}

/// Decodes `video` and saves one keyframe per distinct-enough sampled frame
/// into `keyframe_dir`, in a single sequential pass.
///
/// Within one scan every frame is compared against the latest keyframe, never
/// against frames that were filtered out.
pub fn scan_video(
    video: &Path,
    keyframe_dir: &Path,
    args: &ScanArgs,
    features: &mut dyn FeatureExtractor,
    term: &termination::Cookie,
) -> Result<ScanOutcome, ExtractError> {
    if args.stride == 0 {
        return Err(ExtractError::BadStride);
    }
    let mut gate = SimilarityGate::new(args.threshold)?;

    let mut source = FrameSource::open(video)?;
    let mut sink = KeyframeSink::create(keyframe_dir)?;

    let approx = source.approx_frame_count();
    log::info!(
        "Scanning {} with a stride of {} and a threshold of {}",
        video.display(),
        args.stride,
        args.threshold
    );

    let mut progress = Every::new(Duration::from_secs(10));
    let mut frames_seen: u64 = 0;
    let mut frames_sampled: u64 = 0;
    let mut interrupted = false;

    while let Some((index, frame)) = source.next_frame()? {
        if term.is_terminating() {
            log::info!("Stopping the scan early on request");
            interrupted = true;
            break;
        }

        frames_seen += 1;
        progress.perform(|| match approx {
            Some(total) => log::debug!("On frame {index} of about {total}"),
            None => log::debug!("On frame {index}"),
        });

        if !should_sample(index, args.stride) {
            continue;
        }
        frames_sampled += 1;

        let embedding = features.embed(&frame)?;
        let decision = gate.offer(embedding);
        log::trace!("Frame {index}: {}", decision.name());
        if decision.is_accepted() {
            let saved = sink.save(index, &frame)?;
            log::debug!("Saved {} from frame {index}", saved.path.display());
        }
    }

    log::info!(
        "Kept {} keyframes out of {} sampled frames ({} decoded)",
        sink.len(),
        frames_sampled,
        frames_seen
    );

    Ok(ScanOutcome {
        keyframes: sink.into_keyframes(),
        frames_seen,
        frames_sampled,
        interrupted,
    })
}
