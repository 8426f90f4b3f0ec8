use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use kaleido::encoding::FfmpegPipe;
use kaleido::engine::{MutationEngine, CHANNEL_COUNT};
use kaleido::manifest::{engine_from_manifest, load_and_validate_manifest};
use kaleido::scene::fitted_height;

#[derive(Debug, Parser)]
#[command(name = "kaleido")]
#[command(about = "Dual-channel kaleidoscopic image compositor")]
#[command(version = env!("KALEIDO_LONG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate a manifest and print a summary.
    Check { manifest: PathBuf },
    /// Render the manifest's full tick range into a video file.
    Build {
        manifest: PathBuf,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        /// Channel whose buffer is encoded. Both channels still tick.
        #[arg(long, default_value_t = 0)]
        channel: usize,
        /// Write per-frame hashes next to the output for regression checks.
        #[arg(long)]
        sidecar_json: bool,
    },
    /// Write both channels' buffers at one tick as PNG stills.
    Still {
        manifest: PathBuf,
        /// Directory the stills are written into.
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        #[arg(long, default_value_t = 0)]
        tick: u32,
    },
    /// Open an interactive preview window (requires the `preview` feature).
    Preview {
        manifest: PathBuf,
        #[arg(long, default_value_t = 0)]
        channel: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { manifest } => run_check(&manifest),
        Commands::Build {
            manifest,
            output,
            channel,
            sidecar_json,
        } => run_build(&manifest, &output, channel, sidecar_json),
        Commands::Still {
            manifest,
            output,
            tick,
        } => run_still(&manifest, &output, tick),
        Commands::Preview { manifest, channel } => run_preview(&manifest, channel),
    }
}

fn run_check(manifest_path: &Path) -> Result<()> {
    let manifest = load_and_validate_manifest(manifest_path)?;

    println!(
        "OK: {} ({} fps, {} frames, {:?})",
        manifest_path.display(),
        manifest.environment.fps,
        manifest.environment.total_frames(),
        manifest.environment.codec
    );

    for (index, channel) in manifest.channels.iter().enumerate() {
        let params = channel.initial_params(index);
        let image = channel
            .image
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "(no image)".to_owned());
        println!(
            "Channel {index}: {image} angle={} speed={} direction={:?} scale={} pan=({}, {})",
            params.angle(),
            params.rotation_speed(),
            params.rotation_direction(),
            params.scale(),
            params.pan_x(),
            params.pan_y()
        );
    }

    if let Some(scene) = &manifest.scene {
        println!(
            "Scene: {}x{}x{} room, boundary padding {}",
            scene.room.width, scene.room.height, scene.room.depth, scene.room.boundary_padding
        );
        for (index, screen) in scene.screens.iter().enumerate() {
            println!(
                "Screen {index}: width {} at ({}, {}, {})",
                screen.placement.width,
                screen.placement.position.x,
                screen.placement.position.y,
                screen.placement.position.z
            );
        }
        for artwork in &scene.artworks {
            let (image_width, image_height) = image::image_dimensions(&artwork.path)
                .with_context(|| {
                    format!("failed reading dimensions of {}", artwork.path.display())
                })?;
            println!(
                "Artwork {}: {:.2}x{:.2} at ({}, {}, {})",
                artwork.path.display(),
                artwork.placement.width,
                fitted_height(artwork.placement.width, image_width, image_height),
                artwork.placement.position.x,
                artwork.placement.position.y,
                artwork.placement.position.z
            );
        }
    }

    Ok(())
}

fn run_build(
    manifest_path: &Path,
    output_path: &Path,
    channel: usize,
    sidecar_json: bool,
) -> Result<()> {
    if channel >= CHANNEL_COUNT {
        bail!("--channel {channel} is out of range (0..{CHANNEL_COUNT})");
    }

    let manifest = load_and_validate_manifest(manifest_path)?;
    let total_frames = manifest.environment.total_frames();

    let mut engine = engine_from_manifest(&manifest)?;
    ensure_images_loaded(&mut engine)?;

    let (width, height) = engine.resolution();
    let ffmpeg = FfmpegPipe::spawn(
        width,
        height,
        manifest.environment.fps,
        manifest.environment.codec,
        output_path,
    )?;

    let mut frame_hashes = Vec::new();
    for frame_index in 0..total_frames {
        engine.tick();
        if engine.take_dirty(channel)? {
            let rgba = engine.buffer(channel)?.to_rgba();
            if sidecar_json {
                frame_hashes.push(fnv1a64(&rgba));
            }
            ffmpeg.write_frame(rgba)?;
        }

        if frame_index % manifest.environment.fps == 0 {
            eprintln!("rendered frame {}/{}", frame_index + 1, total_frames);
        }
    }

    ffmpeg.finish()?;

    if sidecar_json {
        write_build_sidecar(output_path, channel, width, height, &manifest, &frame_hashes)?;
    }

    println!("Wrote {}", output_path.display());
    Ok(())
}

fn run_still(manifest_path: &Path, output_dir: &Path, tick: u32) -> Result<()> {
    let manifest = load_and_validate_manifest(manifest_path)?;
    let mut engine = engine_from_manifest(&manifest)?;
    ensure_images_loaded(&mut engine)?;

    for _ in 0..tick {
        engine.tick();
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let (width, height) = engine.resolution();
    for channel in 0..CHANNEL_COUNT {
        let rgba = engine.buffer(channel)?.to_rgba();
        let image = image::RgbaImage::from_raw(width, height, rgba)
            .context("buffer export did not match the output resolution")?;
        let path = output_dir.join(format!("channel-{channel}-tick-{tick}.png"));
        image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

#[cfg(feature = "preview")]
fn run_preview(manifest_path: &Path, channel: usize) -> Result<()> {
    kaleido::preview::run_preview(manifest_path, channel)
}

#[cfg(not(feature = "preview"))]
fn run_preview(_manifest_path: &Path, _channel: usize) -> Result<()> {
    bail!("preview requested but kaleido was built without `preview`. Rebuild with `--features preview`.")
}

/// Block until every manifest image is decoded; a decode failure aborts the
/// render instead of silently encoding cleared frames.
fn ensure_images_loaded(engine: &mut MutationEngine) -> Result<()> {
    for outcome in engine.wait_for_pending_loads() {
        outcome
            .result
            .with_context(|| format!("failed loading image for channel {}", outcome.channel))?;
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct BuildSidecar {
    channel: usize,
    width: u32,
    height: u32,
    fps: u32,
    frame_hashes: Vec<String>,
    sequence_hash: String,
}

fn write_build_sidecar(
    output_path: &Path,
    channel: usize,
    width: u32,
    height: u32,
    manifest: &kaleido::schema::Manifest,
    frame_hashes: &[u64],
) -> Result<()> {
    let mut sequence_bytes = Vec::with_capacity(frame_hashes.len() * 8);
    for hash in frame_hashes {
        sequence_bytes.extend_from_slice(&hash.to_le_bytes());
    }

    let sidecar = BuildSidecar {
        channel,
        width,
        height,
        fps: manifest.environment.fps,
        frame_hashes: frame_hashes
            .iter()
            .map(|hash| format!("0x{hash:016x}"))
            .collect(),
        sequence_hash: format!("0x{:016x}", fnv1a64(&sequence_bytes)),
    };

    let sidecar_path = output_path.with_extension("json");
    let json = serde_json::to_string_pretty(&sidecar)?;
    fs::write(&sidecar_path, json)
        .with_context(|| format!("failed to write {}", sidecar_path.display()))?;
    println!("Wrote {}", sidecar_path.display());
    Ok(())
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0001_0000_01b3);
    }
    hash
}
