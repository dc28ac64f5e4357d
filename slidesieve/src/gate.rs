use crate::embed::vector::{Embedding, Similarity};

pub const DEFAULT_THRESHOLD: Similarity = 0.98;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("the threshold {got} is not a cosine similarity within [-1, 1]")]
    ThresholdOutOfRange { got: Similarity },
}

/// What the gate decided about one sampled frame. The similarity is only
/// present when a cosine was actually computed; the first frame has no
/// reference to compare against and a zero-norm vector has no defined cosine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Nothing accepted yet, the frame becomes the first keyframe.
    FirstFrame,
    /// Similarity below the threshold, the frame starts a new slide.
    NewSlide(Similarity),
    /// The cosine is undefined, the frame is treated as dissimilar and
    /// accepted.
    ZeroNorm,
    /// Similarity at or above the threshold, the frame is discarded.
    SameSlide(Similarity),
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        match self {
            GateDecision::FirstFrame
            | GateDecision::NewSlide(_)
            | GateDecision::ZeroNorm => true,
            GateDecision::SameSlide(_) => false,
        }
    }

    pub fn similarity(&self) -> Option<Similarity> {
        match self {
            GateDecision::NewSlide(sim) | GateDecision::SameSlide(sim) => Some(*sim),
            GateDecision::FirstFrame | GateDecision::ZeroNorm => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GateDecision::FirstFrame => "first_frame",
            GateDecision::NewSlide(_) => "new_slide",
            GateDecision::ZeroNorm => "zero_norm",
            GateDecision::SameSlide(_) => "same_slide",
        }
    }
}

#[derive(Debug)]
struct SlideState {
    last_accepted: Option<Embedding>,
    accepted: u64,
}

/// Decides, one sampled frame at a time, whether the frame shows a new slide.
/// Comparisons are always made against the last accepted embedding, so the
/// decisions are order-dependent and must be made sequentially.
#[derive(Debug)]
pub struct SimilarityGate {
    threshold: Similarity,
    state: SlideState,
}

impl SimilarityGate {
    pub fn new(threshold: Similarity) -> Result<Self, GateError> {
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(GateError::ThresholdOutOfRange { got: threshold });
        }
        Ok(Self {
            threshold,
            state: SlideState {
                last_accepted: None,
                accepted: 0,
            },
        })
    }

    /// The number of embeddings accepted so far, which is also the ordinal of
    /// the most recently accepted keyframe.
    pub fn accepted_count(&self) -> u64 {
        self.state.accepted
    }

    /// Offer the embedding of the current sampled frame. On acceptance the
    /// embedding replaces the stored reference; on rejection it is dropped.
    pub fn offer(&mut self, embedding: Embedding) -> GateDecision {
        let decision = match self.state.last_accepted.as_ref() {
            None => GateDecision::FirstFrame,
            Some(last) => match embedding.cosine(last) {
                None => GateDecision::ZeroNorm,
                Some(sim) if sim < self.threshold => GateDecision::NewSlide(sim),
                Some(sim) => GateDecision::SameSlide(sim),
            },
        };

        if decision.is_accepted() {
            self.state.last_accepted = Some(embedding);
            self.state.accepted += 1;
        }

        decision
    }
}
