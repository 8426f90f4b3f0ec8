use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::encoding::VideoCodec;
use crate::engine::CHANNEL_COUNT;
use crate::params::{ChannelParams, Flip, Param, RotationDirection};
use crate::scene::SceneConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub environment: Environment,
    pub channels: Vec<ChannelConfig>,
    #[serde(default)]
    pub scene: Option<SceneConfig>,
}

impl Manifest {
    pub fn validate(&self) -> Result<()> {
        self.environment.validate()?;

        if self.channels.len() != CHANNEL_COUNT {
            bail!(
                "manifest must define exactly {CHANNEL_COUNT} channels, got {}",
                self.channels.len()
            );
        }
        for (index, channel) in self.channels.iter().enumerate() {
            channel
                .validate()
                .map_err(|error| error.context(format!("channel {index}")))?;
        }

        if let Some(scene) = &self.scene {
            scene.validate()?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Environment {
    pub fps: u32,
    pub duration: Duration,
    #[serde(default)]
    pub codec: VideoCodec,
}

impl Environment {
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            bail!("fps must be > 0");
        }

        match self.duration {
            Duration::Seconds(seconds) => {
                if !seconds.is_finite() || seconds <= 0.0 {
                    bail!("duration in seconds must be > 0");
                }
            }
            Duration::Frames { frames } => {
                if frames == 0 {
                    bail!("duration frames must be > 0");
                }
            }
        }

        Ok(())
    }

    pub fn total_frames(&self) -> u32 {
        match self.duration {
            Duration::Seconds(seconds) => {
                let frames = (seconds * self.fps as f32).ceil();
                frames.max(1.0) as u32
            }
            Duration::Frames { frames } => frames.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum Duration {
    Seconds(f32),
    Frames { frames: u32 },
}

/// Startup state for one channel. Every field is optional; omitted fields
/// keep the channel's built-in defaults, and out-of-range values are clamped
/// by the same setters a live UI goes through.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub angle: Option<f32>,
    #[serde(default)]
    pub rotation_speed: Option<f32>,
    #[serde(default)]
    pub rotation_direction: Option<RotationDirection>,
    #[serde(default)]
    pub flip_horizontal: Option<Flip>,
    #[serde(default)]
    pub flip_vertical: Option<Flip>,
    #[serde(default)]
    pub scale: Option<f32>,
    #[serde(default)]
    pub pan_x: Option<f32>,
    #[serde(default)]
    pub pan_y: Option<f32>,
}

impl ChannelConfig {
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("angle", self.angle),
            ("rotation_speed", self.rotation_speed),
            ("scale", self.scale),
            ("pan_x", self.pan_x),
            ("pan_y", self.pan_y),
        ] {
            if let Some(value) = value {
                if !value.is_finite() {
                    bail!("{label} must be finite");
                }
            }
        }
        Ok(())
    }

    /// Channel defaults overridden by whatever the manifest pins down.
    pub fn initial_params(&self, channel_index: usize) -> ChannelParams {
        let mut params = ChannelParams::defaults_for_channel(channel_index);

        if let Some(angle) = self.angle {
            params.set(Param::Angle, angle);
        }
        if let Some(speed) = self.rotation_speed {
            params.set(Param::RotationSpeed, speed);
        }
        if let Some(direction) = self.rotation_direction {
            params.set_rotation_direction(direction);
        }
        if let Some(flip) = self.flip_horizontal {
            params.set_flip_horizontal(flip);
        }
        if let Some(flip) = self.flip_vertical {
            params.set_flip_vertical(flip);
        }
        if let Some(scale) = self.scale {
            params.set(Param::Scale, scale);
        }
        if let Some(pan) = self.pan_x {
            params.set(Param::PanX, pan);
        }
        if let Some(pan) = self.pan_y {
            params.set(Param::PanY, pan);
        }

        params
    }
}
