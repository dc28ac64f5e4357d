use std::{fs, io, path::PathBuf};

use image::RgbImage;

const ORDINAL_PADDING: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to create the keyframe directory at {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write the keyframe at {path}: {source}")]
    Write {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// One accepted frame on disk. Ordinals are gapless and start at 1; the
/// source index is where in the video the frame came from.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Keyframe {
    pub ordinal: u64,
    pub source_index: u64,
    pub path: PathBuf,
}

/// Persists accepted frames in acceptance order under deterministic,
/// zero-padded names.
pub struct KeyframeSink {
    dir: PathBuf,
    saved: Vec<Keyframe>,
}

impl KeyframeSink {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| SinkError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            saved: Vec::new(),
        })
    }

    pub fn save(
        &mut self,
        source_index: u64,
        frame: &RgbImage,
    ) -> Result<&Keyframe, SinkError> {
        let ordinal = self.saved.len() as u64 + 1;
        let p = ORDINAL_PADDING;
        let path = self.dir.join(format!("keyframe_{ordinal:0p$}.png"));

        frame.save(&path).map_err(|source| SinkError::Write {
            path: path.clone(),
            source,
        })?;

        self.saved.push(Keyframe {
            ordinal,
            source_index,
            path,
        });
        Ok(self.saved.last().expect("just pushed"))
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.saved
    }

    pub fn into_keyframes(self) -> Vec<Keyframe> {
        self.saved
    }
}
