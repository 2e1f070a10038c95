use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use rayon::prelude::*;
use rep_counter::{
    Config, Exercise, SessionSummary, build_counter,
    pipeline::{
        BlankFrameSource, Delivery, FrameSource, ImageDirSource, RecordedLandmarks, Session,
        spawn_session,
    },
};

const FOLLOW_CHANNEL_CAPACITY: usize = 256;

/// Count sit-ups or jumps from recorded body-landmark streams.
#[derive(Debug, Parser)]
#[command(name = "rep-counter", version)]
struct Args {
    /// situp or jump
    #[arg(short, long)]
    exercise: Exercise,

    /// TOML file overriding counter thresholds
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of frames matching the recording (single stream only)
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Write overlay-rendered frames here
    #[arg(long)]
    render: Option<PathBuf>,

    /// Frame width when neither frames nor the recording declare one
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Frame height when neither frames nor the recording declare one
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Print every per-frame result as a JSON line (single stream only)
    #[arg(long)]
    follow: bool,

    /// Landmark recordings, one JSON object per line
    #[arg(required = true)]
    landmarks: Vec<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if args.landmarks.len() > 1 && (args.frames.is_some() || args.follow) {
        bail!("--frames and --follow need exactly one landmark recording");
    }

    if args.follow {
        let summary = follow_stream(&args, &config, &args.landmarks[0])?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let results: Vec<(PathBuf, Result<SessionSummary>)> = args
        .landmarks
        .par_iter()
        .map(|path| (path.clone(), count_stream(&args, &config, path)))
        .collect();

    let mut failures = 0;
    for (path, result) in results {
        match result {
            Ok(summary) => println!(
                "{}: {}",
                path.display(),
                serde_json::to_string_pretty(&summary)?
            ),
            Err(err) => {
                failures += 1;
                log::error!("{}: {err:#}", path.display());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} streams failed", args.landmarks.len());
    }
    Ok(())
}

fn count_stream(args: &Args, config: &Config, path: &Path) -> Result<SessionSummary> {
    let session = open_session(args, config, path)?;
    Ok(session.run(|_| {})?)
}

fn follow_stream(args: &Args, config: &Config, path: &Path) -> Result<SessionSummary> {
    let session = open_session(args, config, path)?;
    let handle = spawn_session(session, FOLLOW_CHANNEL_CAPACITY, Delivery::Every);

    for update in handle.updates().iter() {
        println!("{}", serde_json::to_string(&update.info)?);
    }
    Ok(handle.join()?)
}

fn open_session(
    args: &Args,
    config: &Config,
    path: &Path,
) -> Result<Session<Box<dyn FrameSource>, rep_counter::pipeline::RecordedProvider>> {
    let recorded = RecordedLandmarks::load(path)?;

    let source: Box<dyn FrameSource> = match &args.frames {
        Some(dir) => Box::new(ImageDirSource::open(dir)?),
        None => {
            let (width, height) = recorded.frame_size().unwrap_or((args.width, args.height));
            Box::new(BlankFrameSource::new(
                width,
                height,
                Some(recorded.frame_count()),
            ))
        }
    };

    let counter = build_counter(args.exercise, config);
    let mut session = Session::new(source, recorded.into_provider(), counter);

    if let Some(render) = &args.render {
        let dir = if args.landmarks.len() > 1 {
            let stem = path
                .file_stem()
                .context("landmark recording has no file name")?;
            render.join(stem)
        } else {
            render.clone()
        };
        session = session.with_render_dir(dir)?;
    }
    Ok(session)
}
