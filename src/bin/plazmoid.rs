use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use futures::StreamExt as _;

use plazmoid::{
    Compositor, CropRect, EncoderSettings, FfmpegSink, FfmpegSinkOpts, OverlaySet, OwnerId,
    PipelineConfig, RenderParams, RenderRequest, RenderService, SinkConfig, TaskKey, TaskStatus,
    decode_image_file, encode_frames,
};

#[derive(Parser, Debug)]
#[command(name = "plazmoid", version)]
struct Cli {
    /// Pipeline configuration JSON. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Override the storage directory from the configuration.
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single composited frame as a PNG.
    Frame(FrameArgs),
    /// Render a clip straight to MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Submit a clip through the scheduling service and follow its status.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct MotionArgs {
    /// Source image.
    #[arg(long)]
    image: PathBuf,

    /// Crop window at start and end, as `x,y,w,h`.
    #[arg(long)]
    start: CropRect,

    /// Crop window at the midpoint, as `x,y,w,h`.
    #[arg(long)]
    end: CropRect,

    /// Saturation in [-100, 100]. Defaults to the configured value.
    #[arg(long, allow_hyphen_values = true)]
    saturation: Option<f32>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    motion: MotionArgs,

    /// Time in seconds to sample.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    motion: MotionArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    motion: MotionArgs,

    /// Owner the task is filed under.
    #[arg(long, default_value = "cli")]
    owner: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    plazmoid::logging::init_logging(&cli.log_level)?;

    let mut cfg = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = cli.storage_dir {
        cfg.storage_dir = dir;
    }
    cfg.validate()?;

    match cli.cmd {
        Command::Frame(args) => cmd_frame(&cfg, args),
        Command::Render(args) => cmd_render(&cfg, args),
        Command::Run(args) => {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("build tokio runtime")?;
            rt.block_on(cmd_run(&cfg, args))
        }
    }
}

fn load_overlays(cfg: &PipelineConfig) -> anyhow::Result<Arc<OverlaySet>> {
    let overlays = OverlaySet::load(
        &cfg.overlays.soft_light,
        &cfg.overlays.screen,
        cfg.overlay_fps()?,
    )
    .context("load overlay layers")?;
    Ok(Arc::new(overlays))
}

fn build_compositor(cfg: &PipelineConfig, motion: &MotionArgs) -> anyhow::Result<Compositor> {
    let source = decode_image_file(&motion.image)
        .with_context(|| format!("load source image '{}'", motion.image.display()))?;
    let params = RenderParams {
        crop_start: motion.start,
        crop_end: motion.end,
        saturation: motion.saturation.unwrap_or(cfg.default_saturation),
        duration_secs: cfg.duration_secs,
        fps: cfg.output_fps()?,
    };
    Ok(Compositor::new(
        Arc::new(source),
        load_overlays(cfg)?,
        cfg.canvas(),
        params,
    )?)
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_frame(cfg: &PipelineConfig, args: FrameArgs) -> anyhow::Result<()> {
    let compositor = build_compositor(cfg, &args.motion)?;
    let frame = compositor.render_at(args.time)?;

    create_parent(&args.out)?;
    std::fs::write(&args.out, frame.to_png()?)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(cfg: &PipelineConfig, args: RenderArgs) -> anyhow::Result<()> {
    let compositor = build_compositor(cfg, &args.motion)?;
    let sink_cfg = SinkConfig {
        width: cfg.width,
        height: cfg.height,
        fps: compositor.params().fps,
    };
    let settings: EncoderSettings = cfg.encoder.clone();
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&args.out, settings));

    let frames = encode_frames(compositor.frames(), sink_cfg, &mut sink, |_| Ok(()))?;

    eprintln!("wrote {} ({frames} frames)", args.out.display());
    Ok(())
}

async fn cmd_run(cfg: &PipelineConfig, args: RunArgs) -> anyhow::Result<()> {
    let service = RenderService::from_config(cfg)?;
    let owner = OwnerId::new(args.owner)?;

    let bytes = std::fs::read(&args.motion.image)
        .with_context(|| format!("read source image '{}'", args.motion.image.display()))?;
    let task = service.deposit_source(&owner, &bytes)?;
    let key = service.try_submit(RenderRequest {
        owner_id: owner.clone(),
        task_id: task.clone(),
        crop_start: args.motion.start,
        crop_end: args.motion.end,
        saturation: args.motion.saturation,
    })?;

    let mut updates = service.watch(owner);
    while let Some(snapshots) = updates.next().await {
        println!("{}", serde_json::to_string(&snapshots)?);
    }

    let outcome = report(&service, &key);
    service.shutdown().await;
    outcome
}

fn report(service: &RenderService, key: &TaskKey) -> anyhow::Result<()> {
    let record = service
        .registry()
        .get(key)
        .with_context(|| format!("task {key} vanished before completion"))?;
    match record.status {
        TaskStatus::Completed if service.is_ready(key) => {
            eprintln!("wrote {}", service.artifact_path(key).display());
            Ok(())
        }
        status => anyhow::bail!(
            "task {key} ended as {status}: {}",
            record.message.unwrap_or_default()
        ),
    }
}
