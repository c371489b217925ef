use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "statreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the full progress reel (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single frame as a PNG, for previewing.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input user summary JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output video path. Defaults to `statreel-<displayName>.webm` in the
    /// current directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Audio track to play and sync with capture (optional).
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Font file for text rendering (defaults to probing system fonts).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Optional config JSON overriding fps/duration/bitrate/canvas knobs.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input user summary JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Font file for text rendering (defaults to probing system fonts).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Optional config JSON overriding fps/duration/bitrate/canvas knobs.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn read_summary(path: &Path) -> anyhow::Result<statreel::UserSummary> {
    let f = File::open(path).with_context(|| format!("open summary '{}'", path.display()))?;
    let summary: statreel::UserSummary =
        serde_json::from_reader(BufReader::new(f)).context("parse summary JSON")?;
    Ok(summary)
}

fn read_config(path: Option<&Path>) -> anyhow::Result<statreel::ReelConfig> {
    let Some(path) = path else {
        return Ok(statreel::ReelConfig::default());
    };
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let config: statreel::ReelConfig =
        serde_json::from_reader(BufReader::new(f)).context("parse config JSON")?;
    Ok(config)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let summary = read_summary(&args.in_path)?;
    summary.validate()?;

    let mut config = read_config(args.config.as_deref())?;
    if args.audio.is_some() {
        config.audio_source = args.audio;
    }
    if args.font.is_some() {
        config.font_source = args.font;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;

    runtime.block_on(async {
        let mut orchestrator = statreel::Orchestrator::new(config.clone());
        let mut sink = statreel::FfmpegSink::new(statreel::EncodeConfig::default());
        let mut audio = statreel::PlaybackSynchronizer::new(config.audio_source.as_deref());

        orchestrator
            .run(&summary, &mut sink, &mut audio, statreel::CancelToken::never())
            .await?;

        let asset = orchestrator
            .take_asset()
            .ok_or_else(|| anyhow::anyhow!("run completed without an asset (bug)"))?;

        let out = args
            .out
            .unwrap_or_else(|| PathBuf::from(asset.suggested_filename(&summary.display_name)));
        if let Some(parent) = out.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(&out, &asset.data)
            .with_context(|| format!("write video '{}'", out.display()))?;

        eprintln!("wrote {}", out.display());
        Ok(())
    })
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let summary = read_summary(&args.in_path)?;
    summary.validate()?;

    let mut config = read_config(args.config.as_deref())?;
    if args.font.is_some() {
        config.font_source = args.font;
    }
    config.validate()?;

    let schedule = config.schedule();
    let text = statreel::TextRenderer::load(config.font_source.as_deref());
    let mut surface = statreel::Surface::new(config.canvas_width, config.canvas_height)?;

    let state = statreel::compute_frame_state(args.frame, &schedule);
    statreel::scene::render_frame(&mut surface, &text, &state, &summary);
    let frame = surface.frame();

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
