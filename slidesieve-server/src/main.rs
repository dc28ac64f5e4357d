use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use color_eyre::eyre::{self, Context};
use serde::Serialize;
use slidesieve::{
    embed::DctFeatures,
    extract::ScanArgs,
    ocr::TesseractCli,
    pipeline,
    sink::Keyframe,
    summarize::{Summarizer, DEFAULT_MODEL},
};
use slidesieve_common::{
    bin_common::{
        init::{init_eyre, init_logger},
        termination,
    },
    utils::fsutils,
};
use tokio::{io::AsyncWriteExt, sync::Mutex};

const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command()]
/// Serves the lecture pipeline over HTTP.
///
/// One workspace is shared by all uploads, so a new lecture replaces the
/// previous results.
struct Cli {
    #[command(flatten)]
    scan_args: ScanArgs,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:5000")]
    listen: SocketAddr,

    /// Where uploads land and the pipeline works
    #[arg(long, short = 'w', default_value = "./workspace")]
    workdir: PathBuf,

    /// Language for the text recognizer
    #[arg(long, default_value = "eng")]
    ocr_language: String,

    /// Do not ask Gemini for summaries
    #[arg(long)]
    no_summary: bool,

    /// Gemini model to ask for summaries
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// A file to additionally write the logs to
    #[arg(long)]
    logfile: Option<PathBuf>,
}

struct AppState {
    workdir: PathBuf,
    scan_args: ScanArgs,
    ocr_language: String,
    summarizer: Option<Summarizer>,
    term: termination::Cookie,
    run_lock: Mutex<()>,
}

#[derive(Debug, Serialize)]
struct ProcessedLecture {
    video: String,
    frames_seen: u64,
    frames_sampled: u64,
    keyframes: Vec<Keyframe>,
    text: Option<String>,
    summary: Option<String>,
    interrupted: bool,
}

async fn index() -> &'static str {
    "POST a lecture video to /lectures as the multipart field 'video'\n"
}

/// POST /lectures: store the uploaded video in the workspace and run the
/// whole pipeline on it.
async fn process_lecture(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ProcessedLecture>, (StatusCode, String)> {
    let mut video: Option<(String, PathBuf)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some("video") {
            continue;
        }
        let filename = field
            .file_name()
            .map(ToOwned::to_owned)
            .filter(|name| fsutils::is_basename(name))
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    "the video needs a plain file name".to_string(),
                )
            })?;

        tokio::fs::create_dir_all(&state.workdir)
            .await
            .map_err(internal_error)?;
        let upload_path = state.workdir.join(&filename);
        let mut file = tokio::fs::File::create(&upload_path)
            .await
            .map_err(internal_error)?;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
        {
            file.write_all(&chunk).await.map_err(internal_error)?;
        }
        file.flush().await.map_err(internal_error)?;

        video = Some((filename, upload_path));
    }

    let Some((filename, video)) = video else {
        return Err((
            StatusCode::BAD_REQUEST,
            "missing a 'video' form field".to_string(),
        ));
    };

    log::info!("Processing an upload at {}", video.display());
    // The pipeline clears its directories up front, so two runs must never
    // overlap in the shared workspace.
    let _running = state.run_lock.lock().await;
    let state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || -> eyre::Result<ProcessedLecture> {
        let mut features = DctFeatures::new();
        let mut recognizer = TesseractCli::new(&state.ocr_language);
        let report = pipeline::run(
            &video,
            &state.workdir,
            &state.scan_args,
            &mut features,
            &mut recognizer,
            state.summarizer.as_ref(),
            &state.term,
        )?;

        let text = match &report.text_file {
            Some(path) => fsutils::read_optional_file(path)
                .wrap_err("failed to read the transcript back")?,
            None => None,
        };
        let summary = match &report.summary_file {
            Some(path) => fsutils::read_optional_file(path)
                .wrap_err("failed to read the summary back")?,
            None => None,
        };

        Ok(ProcessedLecture {
            video: filename,
            frames_seen: report.frames_seen,
            frames_sampled: report.frames_sampled,
            keyframes: report.keyframes,
            text,
            summary,
            interrupted: report.interrupted,
        })
    })
    .await;

    match result {
        Ok(Ok(lecture)) => Ok(Json(lecture)),
        Ok(Err(e)) => {
            log::error!("Processing failed: {e:?}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))
        }
        Err(e) => {
            log::error!("The processing task died: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

fn internal_error(e: std::io::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/lectures", post(process_lecture))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_eyre()?;
    let cli = Cli::parse();
    init_logger(cli.logfile.as_deref())?;
    log::debug!("CLI arguments: {cli:#?}");

    let summarizer = if cli.no_summary {
        None
    } else {
        let summarizer = Summarizer::from_env()
            .wrap_err("need a Gemini API key for summaries, or pass --no-summary")?;
        Some(summarizer.with_model(&cli.model))
    };

    let term = termination::Cookie::new().wrap_err("failed to create term cookie")?;
    let state = Arc::new(AppState {
        workdir: cli.workdir,
        scan_args: cli.scan_args,
        ocr_language: cli.ocr_language,
        summarizer,
        term,
        run_lock: Mutex::new(()),
    });
    let app = app(state);

    log::info!("Listening on {}", cli.listen);
    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .wrap_err_with(|| format!("failed to bind to {}", cli.listen))?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use std::path::Path;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(workdir: &Path) -> Arc<AppState> {
        Arc::new(AppState {
            workdir: workdir.to_owned(),
            scan_args: ScanArgs::default(),
            ocr_language: "eng".to_string(),
            summarizer: None,
            term: termination::Cookie::new().unwrap(),
            run_lock: Mutex::new(()),
        })
    }

    fn multipart_upload(field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
        let boundary = "sieve-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::post("/lectures")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn the_index_page_says_how_to_upload() {
        let tmp = TempDir::new().unwrap();
        let app = app(test_state(tmp.path()));

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(StatusCode::OK, response.status());
    }

    #[tokio::test]
    async fn an_upload_without_a_video_field_is_a_bad_request() {
        let tmp = TempDir::new().unwrap();
        let app = app(test_state(tmp.path()));

        let request = multipart_upload("notes", "notes.txt", b"not the right field");
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(StatusCode::BAD_REQUEST, response.status());
    }

    // Uploads run the pipeline in one shared workspace, strictly one at a
    // time. Neither of these is a decodable video, but both requests must
    // come back instead of deadlocking on the run lock.
    #[tokio::test]
    async fn overlapping_uploads_both_get_an_answer() {
        let tmp = TempDir::new().unwrap();
        let app = app(test_state(tmp.path()));

        let first = app
            .clone()
            .oneshot(multipart_upload("video", "first.mkv", b"not a video"));
        let second = app
            .clone()
            .oneshot(multipart_upload("video", "second.mkv", b"still not a video"));
        let (first, second) = tokio::join!(first, second);

        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, first.unwrap().status());
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, second.unwrap().status());

        // the uploads themselves stay in the workspace even when decoding fails
        assert!(tmp.path().join("first.mkv").is_file());
        assert!(tmp.path().join("second.mkv").is_file());
    }
}
