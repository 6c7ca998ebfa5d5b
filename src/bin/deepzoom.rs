use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use deepzoom::{
    ImageSource, JsonManifestResolver, ManifestResolver, Point, RasterSink, Size,
    ThreadedLoader, Viewer, ViewerConfig, ViewerContext,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "deepzoom", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print pyramid levels and tile counts of a manifest.
    Inspect(InspectArgs),
    /// Render one settled view of a manifest to PNG.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    #[arg(long)]
    manifest: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[arg(long)]
    manifest: PathBuf,
    /// Viewer configuration JSON; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 1024)]
    width: u32,
    #[arg(long, default_value_t = 768)]
    height: u32,
    /// Container pixels per plane unit; the home view when omitted.
    #[arg(long)]
    zoom: Option<f64>,
    #[arg(long, requires = "center_y")]
    center_x: Option<f64>,
    #[arg(long, requires = "center_x")]
    center_y: Option<f64>,
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value_t = 600)]
    max_frames: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let manifest = JsonManifestResolver
        .resolve(&ImageSource::Path(args.manifest.clone()))
        .with_context(|| format!("load manifest '{}'", args.manifest.display()))?;
    let ctx = ViewerContext::with_system_clock(ViewerConfig::default())?;
    let image = manifest.build(&ctx)?;

    println!(
        "{}x{} tile={} overlap={}",
        image.width(),
        image.height(),
        manifest.tile_size,
        manifest.tile_overlap
    );
    println!(
        "tiles: {}/{{level}}/{{x}}_{{y}}.{}",
        manifest.tiles_url.trim_end_matches('/'),
        manifest.format
    );
    for level in image.min_level()..=image.max_level() {
        let (nx, ny) = image.num_tiles(level);
        let scale = image.scaled_level(level);
        println!(
            "level {level:>2}: {:>6}x{:<6} {nx:>4}x{:<4} tiles",
            (f64::from(image.width()) * scale).ceil(),
            (f64::from(image.height()) * scale).ceil(),
            ny
        );
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(p) => ViewerConfig::from_path(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => ViewerConfig::default(),
    };
    let ctx = ViewerContext::with_system_clock(config)?;

    if let Some(dir) = args.out.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
    }

    let loader = ThreadedLoader::filesystem(".", &ctx)?;
    let container = Size::new(f64::from(args.width), f64::from(args.height));
    let mut viewer = Viewer::new(ctx, container, Box::new(loader))?;
    viewer
        .open_image(&JsonManifestResolver, &ImageSource::Path(args.manifest.clone()))
        .with_context(|| format!("open '{}'", args.manifest.display()))?;

    let mut sink = RasterSink::new();
    // First frame aligns and homes the viewport; explicit view overrides follow it.
    viewer.frame(&mut sink)?;
    if let Some(zoom) = args.zoom {
        viewer.viewport_mut().zoom_to(zoom, true, None);
    }
    if let (Some(x), Some(y)) = (args.center_x, args.center_y) {
        viewer.viewport_mut().pan_to(Point::new(x, y), true);
    }

    let mut frames = 1u32;
    while !viewer.is_settled() && frames < args.max_frames {
        viewer.frame(&mut sink)?;
        frames += 1;
        std::thread::sleep(Duration::from_millis(16));
    }
    if !viewer.is_settled() {
        tracing::warn!(frames, "frame cap reached before the view settled");
    }

    let stats = viewer.drawer().stats();
    tracing::info!(
        frames,
        tiles_loaded = stats.tiles_loaded,
        failures = stats.failures,
        "render finished"
    );

    sink.save_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

