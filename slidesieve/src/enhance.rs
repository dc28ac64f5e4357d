use std::path::{Path, PathBuf};

use rayon::prelude::*;
use slidesieve_common::utils::{fsutils, imgutils};

#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    #[error("failed to list {dir}: {source}")]
    List {
        dir: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create {dir}: {source}")]
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to open the image at {path}: {source}")]
    Open {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to save the image at {path}: {source}")]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Grayscales every image in `src`, stretches its contrast to the full range
/// and writes the result under the same file name in `dst`.
///
/// The images are independent, so they are processed in parallel. The
/// returned paths are in file name order regardless.
pub fn enhance_dir(src: &Path, dst: &Path) -> Result<Vec<PathBuf>, EnhanceError> {
    let files = fsutils::sorted_files(src).map_err(|source| EnhanceError::List {
        dir: src.to_owned(),
        source,
    })?;

    std::fs::create_dir_all(dst).map_err(|source| EnhanceError::CreateDir {
        dir: dst.to_owned(),
        source,
    })?;

    files
        .par_iter()
        .map(|file| enhance_one(file, dst))
        .collect()
}

fn enhance_one(file: &Path, dst: &Path) -> Result<PathBuf, EnhanceError> {
    let img = image::open(file).map_err(|source| EnhanceError::Open {
        path: file.to_owned(),
        source,
    })?;
    let gray = imgutils::grayscale(&img);
    let stretched = imgutils::stretch_contrast(&gray);

    let target = dst.join(file.file_name().expect("listing only yields files"));
    stretched
        .save(&target)
        .map_err(|source| EnhanceError::Save {
            path: target.clone(),
            source,
        })?;
    Ok(target)
}
