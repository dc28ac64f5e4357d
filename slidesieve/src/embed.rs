use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbImage;
use rustdct::{DctPlanner, TransformType2And3};
use slidesieve_common::utils::{imgutils, math::Variance};

use self::vector::Embedding;

pub mod vector;

const DCT_SIDE: u32 = 32;
const FEATURE_BLOCK: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("the feature model is not available: {0}")]
    ModelUnavailable(String),
    #[error("failed to compute features: {0}")]
    Failed(String),
}

/// Turns a frame into a fixed-dimension feature vector. Implementations are
/// constructed once and injected into the pipeline; the same instance is
/// reused for every frame of a run.
pub trait FeatureExtractor {
    fn dimension(&self) -> usize;

    fn embed(&mut self, frame: &RgbImage) -> Result<Embedding, EmbedError>;
}

/// The built-in extractor: a small grayscale thumbnail is run through a 2D
/// DCT-II and the low-frequency block, minus the DC term, becomes the vector,
/// normalized to zero mean and unit variance. Frames with no variation at all
/// come out as the zero vector.
pub struct DctFeatures {
    dct: Arc<dyn TransformType2And3<f32>>,
}

impl DctFeatures {
    pub fn new() -> Self {
        let mut planner = DctPlanner::<f32>::new();
        let dct = planner.plan_dct2(DCT_SIDE as usize);
        Self { dct }
    }
}

impl FeatureExtractor for DctFeatures {
    fn dimension(&self) -> usize {
        FEATURE_BLOCK * FEATURE_BLOCK - 1
    }

    fn embed(&mut self, frame: &RgbImage) -> Result<Embedding, EmbedError> {
        if imgutils::is_img_empty(frame) {
            return Err(EmbedError::Failed("the frame has no pixels".to_string()));
        }

        let side = DCT_SIDE as usize;
        let small = imageops::resize(frame, DCT_SIDE, DCT_SIDE, FilterType::Triangle);
        let gray = imgutils::grayscale(&small);

        // A single shade would leave nothing but rounding noise in the
        // coefficients, so it short-circuits before the transform.
        if let Some((lo, hi)) = imgutils::luma_bounds(&gray) {
            if lo == hi {
                return Ok(Embedding::new(vec![0.0; self.dimension()]));
            }
        }

        let mut coeffs: Vec<f32> = gray.pixels().map(|p| f32::from(p[0])).collect();

        for row in coeffs.chunks_exact_mut(side) {
            self.dct.process_dct2(row);
        }
        transpose_square(&mut coeffs, side);
        for column in coeffs.chunks_exact_mut(side) {
            self.dct.process_dct2(column);
        }

        let mut features = Vec::with_capacity(self.dimension());
        for row in 0..FEATURE_BLOCK {
            for col in 0..FEATURE_BLOCK {
                if row == 0 && col == 0 {
                    // the DC term only carries overall brightness
                    continue;
                }
                features.push(coeffs[row * side + col]);
            }
        }

        let mut stats = Variance::new();
        stats.extend(features.iter().copied());
        let std_dev = stats.std_dev();
        if std_dev == 0.0 {
            return Ok(Embedding::new(vec![0.0; features.len()]));
        }

        let mean = stats.average();
        let normalized = features
            .into_iter()
            .map(|c| ((f64::from(c) - mean) / std_dev) as f32)
            .collect();
        Ok(Embedding::new(normalized))
    }
}

fn transpose_square(data: &mut [f32], side: usize) {
    debug_assert_eq!(side * side, data.len());
    for row in 0..side {
        for col in (row + 1)..side {
            data.swap(row * side + col, col * side + row);
        }
    }
}
