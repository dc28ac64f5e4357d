use std::{
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    string::FromUtf8Error,
};

use slidesieve_common::utils::fsutils;

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Recognizer {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("the recognizer printed invalid utf8: {0}")]
    BadOutput(#[from] FromUtf8Error),
    #[error("failed to list {dir}: {source}")]
    List {
        dir: PathBuf,
        source: std::io::Error,
    },
}

/// Reads the text out of a single image. Implementations are free to shell
/// out, which is why recognition may fail with process errors.
pub trait TextRecognizer {
    fn recognize(&mut self, image: &Path) -> Result<String, OcrError>;
}

/// Runs the `tesseract` command line program on each image.
pub struct TesseractCli {
    program: String,
    language: String,
}

impl TesseractCli {
    pub fn new(language: impl Into<String>) -> Self {
        Self::with_program("tesseract", language)
    }

    pub fn with_program(program: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: language.into(),
        }
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize(&mut self, image: &Path) -> Result<String, OcrError> {
        let output = Command::new(&self.program)
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.language])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| OcrError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::Recognizer {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

/// Answers from a canned closure instead of a real OCR engine.
pub struct MockRecognizer {
    answer: Box<dyn FnMut(&Path) -> String>,
}

impl MockRecognizer {
    pub fn new(answer: impl FnMut(&Path) -> String + 'static) -> Self {
        Self {
            answer: Box::new(answer),
        }
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| text.clone())
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&mut self, image: &Path) -> Result<String, OcrError> {
        Ok((self.answer)(image))
    }
}

/// Runs the recognizer over every image in `dir` in file name order and
/// joins the results, each under a numbered slide header. An empty directory
/// gives an empty string.
pub fn recognize_slides(
    recognizer: &mut dyn TextRecognizer,
    dir: &Path,
) -> Result<String, OcrError> {
    let files = fsutils::sorted_files(dir).map_err(|source| OcrError::List {
        dir: dir.to_owned(),
        source,
    })?;

    let mut text = String::new();
    for (number, file) in files.iter().enumerate() {
        log::debug!("Recognizing text in {}", file.display());
        let recognized = recognizer.recognize(file)?;
        text.push_str(&format!("--- Slide {} ---\n", number + 1));
        text.push_str(recognized.trim());
        text.push_str("\n\n");
    }
    Ok(text)
}
