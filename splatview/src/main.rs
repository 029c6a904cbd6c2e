mod display;

use clap::Parser;
use display::DisplayContext;
use glam::Vec3;
use splatview_lib::common::PITCH_LIMIT_DEG;
use splatview_lib::{
    load_scene_file, load_scene_file_async, Camera, CameraInput, PreviewBackend, SplatRenderer,
};
use std::error::Error;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "Gaussian Splat Viewer",
    version = "1.0",
    author = "Denis Avvakumov",
    about = "Loads a Gaussian splat PLY scene and renders it frame by frame"
)]
struct Cli {
    #[arg(
        value_name = "INPUT",
        help = "Path to the point cloud (.ply, optionally zstd-compressed)."
    )]
    input: String,

    #[arg(
        short = 'W',
        long = "width",
        default_value = "640",
        help = "Initial viewport width."
    )]
    width: u32,

    #[arg(
        short = 'H',
        long = "height",
        default_value = "480",
        help = "Initial viewport height."
    )]
    height: u32,

    #[arg(
        short = 'f',
        long = "frames",
        default_value = "1",
        help = "Number of frames to run."
    )]
    frames: u32,

    #[arg(long = "fov", default_value = "45.0", help = "Field of view in degrees.")]
    fov: f32,

    #[arg(
        short = 'p',
        long = "position",
        value_name = "X,Y,Z",
        value_delimiter = ',',
        num_args = 3,
        allow_hyphen_values = true,
        default_values_t = [0.0f32, 0.0, -5.0],
        help = "Initial camera position."
    )]
    position: Vec<f32>,

    #[arg(
        long = "yaw",
        default_value = "-90.0",
        allow_hyphen_values = true,
        help = "Initial yaw in degrees."
    )]
    yaw: f32,

    #[arg(
        long = "pitch",
        default_value = "0.0",
        allow_hyphen_values = true,
        help = "Initial pitch in degrees."
    )]
    pitch: f32,

    #[arg(
        long = "orbit",
        default_value = "0.0",
        allow_hyphen_values = true,
        help = "Horizontal mouse drag applied every frame after the first, in pixels."
    )]
    orbit: f32,

    #[arg(
        long = "dolly",
        default_value = "false",
        help = "Hold the walk-forward key every frame after the first."
    )]
    dolly: bool,

    #[arg(long = "boost", default_value = "false", help = "Hold the speed modifier.")]
    boost: bool,

    #[arg(
        short = 't',
        long = "threads",
        value_name = "THREADS",
        help = "Worker threads for decoding and post-processing."
    )]
    threads: Option<usize>,

    #[arg(
        short = 'a',
        long = "async",
        default_value = "false",
        help = "Read the input file asynchronously."
    )]
    async_mode: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "OUTPUT",
        help = "Write the last frame to this PNG file. Nothing is written for an empty scene."
    )]
    output: Option<PathBuf>,

    #[arg(
        long = "log-level",
        value_name = "FILTER",
        help = "Log filter, overrides RUST_LOG (e.g. 'debug')."
    )]
    log_level: Option<String>,
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let start = Instant::now();
    let loaded = if cli.async_mode {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        rt.block_on(load_scene_file_async(&cli.input))
    } else {
        load_scene_file(&cli.input)
    };
    let scene = loaded.unwrap_or_else(|e| {
        error!("Failed to load '{}': {}", cli.input, e);
        process::exit(1);
    });
    info!(
        "Loaded {} splats from '{}' in {} ms",
        scene.num_splats,
        cli.input,
        start.elapsed().as_millis()
    );

    let mut renderer = SplatRenderer::new(PreviewBackend::new());
    if let Err(e) = renderer.install(&scene) {
        error!("Failed to upload scene: {}", e);
        process::exit(1);
    }
    drop(scene);

    let mut display = DisplayContext::new(cli.width, cli.height);
    let mut camera = Camera {
        position: Vec3::from_slice(&cli.position),
        yaw: cli.yaw,
        pitch: cli.pitch.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG),
        ..Camera::default()
    };
    camera.set_fov(cli.fov);

    let input = CameraInput {
        drag: (cli.orbit != 0.0).then_some((cli.orbit, 0.0)),
        forward: cli.dolly,
        boost: cli.boost,
        ..CameraInput::default()
    };

    let mut pixels = Vec::new();
    for frame in 0..cli.frames {
        if frame > 0 {
            camera.apply_input(&input);
        }

        let (width, height) = display.viewport();
        let frame_start = Instant::now();
        match renderer.render(width, height, &camera, &mut pixels) {
            Ok(true) => display.present(width, height, &pixels),
            Ok(false) => debug!("Frame {}: no scene loaded", frame),
            Err(e) => error!("Frame {}: {}", frame, e),
        }
        debug!(
            "Frame {} ({}x{}, yaw {:.1}, pitch {:.1}) took {} ms",
            frame,
            width,
            height,
            camera.yaw,
            camera.pitch,
            frame_start.elapsed().as_millis()
        );
    }

    let frames_presented = display.frames_presented();
    info!("Presented {} of {} frames", frames_presented, cli.frames);
    if let Some(output) = &cli.output {
        if display.save_png(output)? {
            let (w, h) = display.texture().map_or((0, 0), |t| t.dimensions());
            info!("Successfully wrote {}x{} frame to '{}'.", w, h, output.display());
        } else if renderer.num_splats() == 0 {
            warn!("Scene is empty; '{}' not written.", output.display());
        } else {
            error!("No frame was rendered; '{}' not written.", output.display());
            process::exit(1);
        }
    }

    Ok(())
}
