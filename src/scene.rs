//! Declarative description of the gallery installation: the wireframe room,
//! wall-mounted artworks, and the two screen surfaces that display the
//! channel buffers. The engine makes no assumption about where its output
//! lands; this module exists so manifests can describe the full installation
//! and `check` can validate placements before a host walks the room.
//! Rendering the 3D room itself is a host concern.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::engine::CHANNEL_COUNT;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    #[serde(default)]
    pub room: RoomConfig,
    #[serde(default)]
    pub artworks: Vec<ArtworkConfig>,
    /// Exactly one screen per channel, in channel order.
    pub screens: Vec<ScreenConfig>,
}

impl SceneConfig {
    pub fn validate(&self) -> Result<()> {
        self.room.validate()?;

        if self.screens.len() != CHANNEL_COUNT {
            bail!(
                "scene must place exactly {CHANNEL_COUNT} screens, got {}",
                self.screens.len()
            );
        }

        for (index, screen) in self.screens.iter().enumerate() {
            screen
                .placement
                .validate(&self.room)
                .map_err(|error| error.context(format!("screen {index}")))?;
        }

        for artwork in &self.artworks {
            artwork
                .placement
                .validate(&self.room)
                .map_err(|error| error.context(format!("artwork {}", artwork.path.display())))?;
        }

        Ok(())
    }
}

/// Room dimensions and movement-relevant margins. Defaults match the
/// original installation.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomConfig {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    #[serde(default = "default_grid_divisions")]
    pub grid_divisions: u32,
    #[serde(default = "default_eye_height")]
    pub eye_height: f32,
    #[serde(default = "default_boundary_padding")]
    pub boundary_padding: f32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 20.0,
            depth: 80.0,
            grid_divisions: default_grid_divisions(),
            eye_height: default_eye_height(),
            boundary_padding: default_boundary_padding(),
        }
    }
}

fn default_grid_divisions() -> u32 {
    20
}

fn default_eye_height() -> f32 {
    3.0
}

fn default_boundary_padding() -> f32 {
    1.0
}

impl RoomConfig {
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("width", self.width),
            ("height", self.height),
            ("depth", self.depth),
        ] {
            if !value.is_finite() || value <= 0.0 {
                bail!("room {label} must be a positive finite number, got {value}");
            }
        }

        if !self.boundary_padding.is_finite() || self.boundary_padding < 0.0 {
            bail!("room boundary_padding must be non-negative");
        }
        if self.boundary_padding >= self.width / 2.0 || self.boundary_padding >= self.depth / 2.0 {
            bail!(
                "room boundary_padding {} leaves no walkable area in a {}x{} floor",
                self.boundary_padding,
                self.width,
                self.depth
            );
        }

        if !self.eye_height.is_finite() || self.eye_height <= 0.0 || self.eye_height >= self.height
        {
            bail!(
                "room eye_height {} must sit between the floor and the {}-high ceiling",
                self.eye_height,
                self.height
            );
        }

        if self.grid_divisions == 0 {
            bail!("room grid_divisions must be > 0");
        }

        Ok(())
    }

    /// The walkable floor rectangle, padded in from the walls. The room is
    /// centered on the origin, so the extents are symmetric.
    pub fn boundaries(&self) -> Boundaries {
        Boundaries {
            min_x: -self.width / 2.0 + self.boundary_padding,
            max_x: self.width / 2.0 - self.boundary_padding,
            min_z: -self.depth / 2.0 + self.boundary_padding,
            max_z: self.depth / 2.0 - self.boundary_padding,
        }
    }

    fn contains(&self, position: Vec3) -> bool {
        position.x.abs() <= self.width / 2.0
            && position.y.abs() <= self.height / 2.0
            && position.z.abs() <= self.depth / 2.0
    }
}

/// Axis-aligned clamp box for anything that moves on the floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundaries {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Boundaries {
    pub fn clamp(&self, x: f32, z: f32) -> (f32, f32) {
        (x.clamp(self.min_x, self.max_x), z.clamp(self.min_z, self.max_z))
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vec3 {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

/// A flat plane mounted in the room: world position, Euler rotation in
/// degrees, and plane width. Plane height comes from the mounted image's
/// aspect ratio, so it is not declared here.
///
/// Flattened into the artwork/screen entries; `deny_unknown_fields` is
/// incompatible with flattening, so placement fields tolerate extras.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Placement {
    pub width: f32,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation_degrees: Vec3,
}

impl Placement {
    fn validate(&self, room: &RoomConfig) -> Result<()> {
        if !self.width.is_finite() || self.width <= 0.0 {
            bail!("plane width must be a positive finite number, got {}", self.width);
        }
        for (label, value) in [
            ("position.x", self.position.x),
            ("position.y", self.position.y),
            ("position.z", self.position.z),
            ("rotation.x", self.rotation_degrees.x),
            ("rotation.y", self.rotation_degrees.y),
            ("rotation.z", self.rotation_degrees.z),
        ] {
            if !value.is_finite() {
                bail!("{label} must be finite");
            }
        }
        if !room.contains(self.position) {
            bail!(
                "position ({}, {}, {}) is outside the {}x{}x{} room",
                self.position.x,
                self.position.y,
                self.position.z,
                room.width,
                room.height,
                room.depth
            );
        }
        Ok(())
    }
}

/// A still image mounted on a wall.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtworkConfig {
    pub path: PathBuf,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub preserve_transparency: bool,
}

/// A wall surface fed by one engine channel.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScreenConfig {
    #[serde(flatten)]
    pub placement: Placement,
}

/// Plane height for a mounted image: the declared width divided by the
/// image's aspect ratio.
pub fn fitted_height(plane_width: f32, image_width: u32, image_height: u32) -> f32 {
    if image_width == 0 {
        return 0.0;
    }
    plane_width * image_height as f32 / image_width as f32
}
