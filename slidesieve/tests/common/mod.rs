// NOTE: every test will complain about the functions it doesn't use
#![allow(unused)]

use std::{path::PathBuf, process::Stdio, sync::Once};

/// Returns cargo's tmpdir
pub fn cargo_tmpdir() -> PathBuf {
    PathBuf::from(option_env!("CARGO_TARGET_TMPDIR").expect("no cargo tmpdir???"))
}

pub const TEST_VIDEO_FRAMES: u64 = 250;

/// A 10 second test pattern at 25 fps, rendered once per test binary
pub fn create_test_video() -> PathBuf {
    static ONCE: Once = Once::new();
    lavfi_video(&ONCE, "testvideo.mkv", "testsrc=duration=10:rate=25")
}

pub const FLAT_VIDEO_FRAMES: u64 = 25;

/// One second of a single flat color at 25 fps
pub fn create_flat_video() -> PathBuf {
    static ONCE: Once = Once::new();
    lavfi_video(
        &ONCE,
        "flatvideo.mkv",
        "color=c=gray:duration=1:rate=25:size=320x240",
    )
}

fn lavfi_video(once: &Once, filename: &str, filter: &str) -> PathBuf {
    let tmpvideo = cargo_tmpdir().join(filename);

    once.call_once(|| {
        std::fs::remove_file(&tmpvideo).ok();
        std::process::Command::new("ffmpeg")
            .args([
                "-f",
                "lavfi",
                "-i",
                filter,
                tmpvideo.as_os_str().to_str().expect("the path is valid utf8"),
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .status()
            .expect("failed to execute ffmpeg");
    });

    tmpvideo
}
