use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use videoview_frame::{Dimensions, RawFrame, Rotation};
use videoview_magnifier::{
    DisplayGeometry, GeometryInput, LoupeTarget, MagnifierConfig, MagnifierStyle, Point, QueueDispatcher, Rect, Size,
    render_loupe,
};
use videoview_player::SequencePlayer;
use videoview_view::VideoView;

#[derive(Parser)]
#[command(name = "videoview")]
#[command(about = "Render and inspect the videoview magnifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the loupe geometry for a pointer position
    Geometry {
        /// Intrinsic video size, e.g. 1920x1080
        #[arg(long, value_parser = parse_size)]
        video: Size,
        /// Viewport size in points, e.g. 400x225
        #[arg(long, value_parser = parse_size)]
        viewport: Size,
        /// Decoded frame size if it differs from the video size
        #[arg(long, value_parser = parse_size)]
        frame: Option<Size>,
        #[command(flatten)]
        pointer: PointerArgs,
        #[command(flatten)]
        options: LoupeOptions,
    },
    /// Render a loupe PNG from a still image
    Render {
        /// Image used as the decoded frame
        image: PathBuf,
        /// Viewport size in points, e.g. 400x225
        #[arg(long, value_parser = parse_size)]
        viewport: Size,
        /// Rotation that makes the image upright (0, 90, -90, 180)
        #[arg(long, default_value = "0", value_parser = parse_rotation, allow_hyphen_values = true)]
        rotation: Rotation,
        /// Where to write the loupe
        #[arg(short, long, default_value = "loupe.png")]
        output: PathBuf,
        #[command(flatten)]
        pointer: PointerArgs,
        #[command(flatten)]
        options: LoupeOptions,
    },
    /// Drive a video view over a still image and report the loupe
    Pan {
        /// Image played as a still video
        image: PathBuf,
        /// Viewport size in points, e.g. 400x225
        #[arg(long, value_parser = parse_size)]
        viewport: Size,
        /// How long the still plays
        #[arg(long, default_value_t = 5_000)]
        duration_ms: u64,
        /// Also write the committed loupe here
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        pointer: PointerArgs,
        #[command(flatten)]
        options: LoupeOptions,
    },
}

#[derive(Args)]
struct PointerArgs {
    /// Pointer x in viewport points
    #[arg(long)]
    x: f64,
    /// Pointer y in viewport points
    #[arg(long)]
    y: f64,
}

impl PointerArgs {
    const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Args, Default)]
struct LoupeOptions {
    /// Magnifier configuration as JSON
    #[arg(long)]
    config: Option<PathBuf>,
    /// Center decoration: pointMarker or crosshair
    #[arg(long)]
    style: Option<MagnifierStyle>,
    /// Magnification
    #[arg(long)]
    zoom: Option<f64>,
    /// Output pixels per point
    #[arg(long)]
    pixel_ratio: Option<f64>,
}

impl LoupeOptions {
    fn load(&self) -> Result<MagnifierConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&json).with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => MagnifierConfig::new(),
        };
        if let Some(style) = self.style {
            config = config.style(style);
        }
        if let Some(zoom) = self.zoom {
            config = config.zoom(zoom);
        }
        if let Some(ratio) = self.pixel_ratio {
            config = config.pixel_ratio(ratio);
        }
        config.validate().context("Unusable magnifier settings")?;
        Ok(config)
    }
}

fn parse_size(value: &str) -> Result<Size, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let width: f64 = width.trim().parse().map_err(|_| format!("bad width in {value:?}"))?;
    let height: f64 = height.trim().parse().map_err(|_| format!("bad height in {value:?}"))?;
    Ok(Size::new(width, height))
}

fn parse_rotation(value: &str) -> Result<Rotation, String> {
    match value.trim() {
        "0" => Ok(Rotation::Deg0),
        "90" => Ok(Rotation::Deg90),
        "-90" | "270" => Ok(Rotation::DegNeg90),
        "180" | "-180" => Ok(Rotation::Deg180),
        other => Err(format!("unsupported rotation {other:?}")),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Geometry {
            video,
            viewport,
            frame,
            pointer,
            options,
        } => run_geometry(video, viewport, frame, pointer.point(), &options),
        Commands::Render {
            image,
            viewport,
            rotation,
            output,
            pointer,
            options,
        } => run_render(&image, viewport, rotation, pointer.point(), &output, &options).map(|geometry| {
            print_geometry(&geometry);
            println!("{} {}", "✅ Wrote".green().bold(), output.display());
        }),
        Commands::Pan {
            image,
            viewport,
            duration_ms,
            output,
            pointer,
            options,
        } => run_pan(&image, viewport, duration_ms, pointer.point(), output.as_deref(), &options),
    }
}

fn run_geometry(video: Size, viewport: Size, frame: Option<Size>, pointer: Point, options: &LoupeOptions) -> Result<()> {
    let config = options.load()?;
    let geometry = DisplayGeometry::compute(&GeometryInput {
        video,
        viewport,
        pointer,
        frame: frame.unwrap_or(video),
        loupe_size: config.loupe_size,
        zoom: config.zoom,
        pixel_ratio: config.pixel_ratio,
    })
    .context("Nothing to magnify: every size must be positive and finite")?;
    print_geometry(&geometry);
    Ok(())
}

fn run_render(
    image: &Path,
    viewport: Size,
    rotation: Rotation,
    pointer: Point,
    output: &Path,
    options: &LoupeOptions,
) -> Result<DisplayGeometry> {
    let config = options.load()?;
    let decoded = image::open(image)
        .with_context(|| format!("Failed to open {}", image.display()))?
        .to_rgba8();
    let raw = RawFrame::from_rgba(decoded, 0);
    let upright: Dimensions = raw.dimensions().oriented(rotation);

    let target = LoupeTarget {
        video: upright.into(),
        viewport,
        pointer,
    };
    let (loupe, geometry) = render_loupe(&raw, rotation, &target, &config)?;
    loupe
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(geometry)
}

fn run_pan(
    image: &Path,
    viewport: Size,
    duration_ms: u64,
    pointer: Point,
    output: Option<&Path>,
    options: &LoupeOptions,
) -> Result<()> {
    let config = options.load()?;
    let style = config.style;
    let path = image.to_str().context("Image path is not valid UTF-8")?;

    let player = SequencePlayer::new().still_duration(Duration::from_millis(duration_ms));
    let queue = QueueDispatcher::new();
    let mut view = VideoView::new(player, Arc::new(queue.clone()), config)?;
    view.set_viewport(viewport.width, viewport.height);
    view.set_on_failed(|message| eprintln!("{} {message}", "❌ Playback failed:".red().bold()));
    view.configure(path, false, style)?;
    view.pump_events();

    println!(
        "{} {}x{}, {} ms",
        "🎬 Loaded".green().bold(),
        view.video_width(),
        view.video_height(),
        view.duration()
    );

    view.on_pan_update(pointer.x, pointer.y);
    let deadline = Instant::now() + Duration::from_secs(10);
    while view.magnifier_stats().in_flight() > 0 {
        if Instant::now() > deadline {
            anyhow::bail!("Timed out waiting for the magnifier");
        }
        queue.run_pending();
        thread::sleep(Duration::from_millis(5));
    }

    let loupe = view.loupe();
    let stats = view.magnifier_stats();
    if loupe.visible {
        println!("{} at {}", "🔍 Loupe shown".green().bold(), format_rect(&loupe.frame));
    } else {
        println!("{}", "⚠️ Loupe not shown".yellow().bold());
    }
    println!(
        "   jobs: {} issued, {} committed, {} cancelled, {} failed",
        stats.issued, stats.committed, stats.cancelled, stats.failed
    );

    if let Some(output) = output {
        let committed = view.loupe_handle().lock().ok().and_then(|loupe| loupe.image());
        let committed = committed.context("No loupe image was committed")?;
        committed
            .save(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("{} {}", "✅ Wrote".green().bold(), output.display());
    }

    view.on_pan_end();
    view.destroy();
    Ok(())
}

fn format_rect(rect: &Rect) -> String {
    format!(
        "({:.1}, {:.1}) {:.1}x{:.1}",
        rect.origin.x, rect.origin.y, rect.size.width, rect.size.height
    )
}

fn print_geometry(geometry: &DisplayGeometry) {
    println!("{}", "📐 Loupe geometry".cyan().bold());
    println!("   display: {}", format_rect(&geometry.display));
    println!("   scale:   {:.4}", geometry.scale);
    println!("   offset:  ({:.1}, {:.1})", geometry.offset.x, geometry.offset.y);
    println!("   draw:    {}", format_rect(&geometry.draw));
    println!("   crop:    {}", format_rect(&geometry.crop));
    println!(
        "   output:  {}x{} px",
        geometry.render_size.width, geometry.render_size.height
    );
}
