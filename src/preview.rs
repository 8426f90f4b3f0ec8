//! Interactive host render loop behind the `preview` feature: a raw-pixel
//! window showing one channel's buffer at half resolution, with the keyboard
//! standing in for the installation's parameter sliders. Every keypress goes
//! through the engine setters and the readout prints the value the engine
//! actually applied.

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::engine::{MutationEngine, OutputBuffer, CHANNEL_COUNT};
use crate::manifest::{engine_from_manifest, load_and_validate_manifest};
use crate::params::Param;

const PAN_STEP: f32 = 10.0;
const SPEED_STEP: f32 = 0.1;
const SCALE_STEP: f32 = 0.1;
const ANGLE_STEP: f32 = 5.0;

pub fn run_preview(manifest_path: &Path, initial_channel: usize) -> Result<()> {
    if initial_channel >= CHANNEL_COUNT {
        bail!("--channel {initial_channel} is out of range (0..{CHANNEL_COUNT})");
    }

    let manifest = load_and_validate_manifest(manifest_path)?;
    let mut engine = engine_from_manifest(&manifest)?;

    let (buffer_width, buffer_height) = engine.resolution();
    let window_width = (buffer_width / 2) as usize;
    let window_height = (buffer_height / 2) as usize;

    let mut window = Window::new(
        &format!("kaleido preview - {}", manifest_path.display()),
        window_width,
        window_height,
        WindowOptions::default(),
    )
    .map_err(|error| anyhow!("failed to open preview window: {error}"))?;
    window.set_target_fps(manifest.environment.fps as usize);

    print_controls();

    let mut channel = initial_channel;
    let mut paused = false;
    let mut pixels = vec![0_u32; window_width * window_height];

    while window.is_open() && !window.is_key_down(Key::Escape) {
        for outcome in engine.poll_loaded() {
            match outcome.result {
                Ok(()) => println!("[kaleido] channel {} image ready", outcome.channel),
                Err(error) => {
                    eprintln!("[kaleido] channel {} image failed: {error}", outcome.channel)
                }
            }
        }

        if window.is_key_pressed(Key::Key1, KeyRepeat::No) {
            channel = 0;
            println!("[kaleido] controlling channel 0");
        }
        if window.is_key_pressed(Key::Key2, KeyRepeat::No) {
            channel = 1;
            println!("[kaleido] controlling channel 1");
        }
        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            paused = !paused;
            println!("[kaleido] {}", if paused { "paused" } else { "running" });
        }

        if window.is_key_pressed(Key::H, KeyRepeat::No) {
            let flip = engine.toggle_flip_horizontal(channel)?;
            println!("[kaleido] channel {channel} flip_horizontal = {flip:?}");
        }
        if window.is_key_pressed(Key::V, KeyRepeat::No) {
            let flip = engine.toggle_flip_vertical(channel)?;
            println!("[kaleido] channel {channel} flip_vertical = {flip:?}");
        }
        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            let direction = engine.toggle_rotation_direction(channel)?;
            println!("[kaleido] channel {channel} rotation_direction = {direction:?}");
        }

        nudge_if_pressed(&window, Key::Left, &mut engine, channel, Param::PanX, -PAN_STEP)?;
        nudge_if_pressed(&window, Key::Right, &mut engine, channel, Param::PanX, PAN_STEP)?;
        nudge_if_pressed(&window, Key::Up, &mut engine, channel, Param::PanY, -PAN_STEP)?;
        nudge_if_pressed(&window, Key::Down, &mut engine, channel, Param::PanY, PAN_STEP)?;
        nudge_if_pressed(&window, Key::W, &mut engine, channel, Param::RotationSpeed, SPEED_STEP)?;
        nudge_if_pressed(&window, Key::S, &mut engine, channel, Param::RotationSpeed, -SPEED_STEP)?;
        nudge_if_pressed(&window, Key::X, &mut engine, channel, Param::Scale, SCALE_STEP)?;
        nudge_if_pressed(&window, Key::Z, &mut engine, channel, Param::Scale, -SCALE_STEP)?;
        nudge_if_pressed(&window, Key::E, &mut engine, channel, Param::Angle, ANGLE_STEP)?;
        nudge_if_pressed(&window, Key::Q, &mut engine, channel, Param::Angle, -ANGLE_STEP)?;

        if !paused {
            engine.tick();
        }

        if engine.take_dirty(channel)? {
            blit_half_resolution(engine.buffer(channel)?, &mut pixels, window_width, window_height);
            window
                .update_with_buffer(&pixels, window_width, window_height)
                .map_err(|error| anyhow!("failed to update preview window: {error}"))?;
        } else {
            window.update();
        }
    }

    Ok(())
}

fn nudge_if_pressed(
    window: &Window,
    key: Key,
    engine: &mut MutationEngine,
    channel: usize,
    param: Param,
    delta: f32,
) -> Result<()> {
    if !window.is_key_pressed(key, KeyRepeat::Yes) {
        return Ok(());
    }
    let current = engine.params(channel)?.get(param);
    let applied = engine.set_param(channel, param, current + delta)?;
    println!("[kaleido] channel {channel} {param:?} = {applied:.1}");
    Ok(())
}

/// 2x nearest downsample from the premultiplied buffer into minifb's
/// 0RGB u32 layout.
fn blit_half_resolution(
    buffer: &OutputBuffer,
    pixels: &mut [u32],
    window_width: usize,
    window_height: usize,
) {
    let stride = buffer.width() as usize;
    let source = buffer.pixmap().pixels();

    for y in 0..window_height {
        for x in 0..window_width {
            let pixel = source[(y * 2) * stride + x * 2].demultiply();
            pixels[y * window_width + x] =
                u32::from_be_bytes([0, pixel.red(), pixel.green(), pixel.blue()]);
        }
    }
}

fn print_controls() {
    println!("[kaleido] preview controls:");
    println!("  1/2        select channel");
    println!("  arrows     pan");
    println!("  q/e        rotate phase");
    println!("  w/s        rotation speed");
    println!("  z/x        scale");
    println!("  h/v        flip horizontal/vertical");
    println!("  r          reverse rotation");
    println!("  space      pause");
    println!("  esc        quit");
}
