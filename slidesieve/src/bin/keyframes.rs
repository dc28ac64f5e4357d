use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre;
use slidesieve::{
    embed::DctFeatures,
    extract::{self, ScanArgs},
};
use slidesieve_common::bin_common::{
    init::{init_eyre, init_logger},
    termination,
};

#[derive(Parser)]
#[command()]
/// Extract distinct keyframes from a video file
struct Cli {
    #[command(flatten)]
    scan_args: ScanArgs,

    /// Where to place the keyframes as images
    #[arg(long)]
    outdir: PathBuf,

    /// The video file to extract from
    videofile: PathBuf,
}

fn main() -> eyre::Result<()> {
    init_eyre()?;
    init_logger(None)?;
    let cli = Cli::parse();

    let term = termination::Cookie::new()?;
    let mut features = DctFeatures::new();
    let outcome = extract::scan_video(
        &cli.videofile,
        &cli.outdir,
        &cli.scan_args,
        &mut features,
        &term,
    )?;

    for keyframe in &outcome.keyframes {
        println!(
            "{} <- frame {}",
            keyframe.path.display(),
            keyframe.source_index
        );
    }
    println!(
        "{} keyframes from {} sampled frames",
        outcome.keyframes.len(),
        outcome.frames_sampled
    );

    Ok(())
}
