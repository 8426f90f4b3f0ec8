//! Per-channel transform state: rotation phase, speed, direction, flips,
//! scale and pan. Every field has a fixed valid range; setters clamp instead
//! of failing because these values stream in from continuously-moved sliders.

use serde::Deserialize;

pub const ROTATION_SPEED_MIN: f32 = 0.1;
pub const ROTATION_SPEED_MAX: f32 = 5.0;
pub const SCALE_MIN: f32 = 0.3;
pub const SCALE_MAX: f32 = 2.0;
pub const PAN_MIN: f32 = 10.0;
pub const PAN_MAX: f32 = 2000.0;

pub const DEFAULT_ROTATION_SPEED: f32 = 1.0;
pub const DEFAULT_SCALE: f32 = SCALE_MIN;
pub const DEFAULT_PAN: f32 = 1000.0;

/// Sign of the per-tick phase advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationDirection {
    Clockwise,
    Counterclockwise,
}

impl RotationDirection {
    pub fn sign(self) -> f32 {
        match self {
            Self::Clockwise => 1.0,
            Self::Counterclockwise => -1.0,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Clockwise => Self::Counterclockwise,
            Self::Counterclockwise => Self::Clockwise,
        }
    }
}

/// Mirroring applied to the source draw along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flip {
    Normal,
    Mirrored,
}

impl Flip {
    pub fn sign(self) -> f32 {
        match self {
            Self::Normal => 1.0,
            Self::Mirrored => -1.0,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Normal => Self::Mirrored,
            Self::Mirrored => Self::Normal,
        }
    }
}

/// The continuously-adjustable scalar fields of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Angle,
    RotationSpeed,
    Scale,
    PanX,
    PanY,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelParams {
    angle: f32,
    rotation_speed: f32,
    rotation_direction: RotationDirection,
    flip_horizontal: Flip,
    flip_vertical: Flip,
    scale: f32,
    pan_x: f32,
    pan_y: f32,
}

impl ChannelParams {
    /// Defaults from the original installation. The two channels counter-rotate
    /// out of the box, hence the per-index direction.
    pub fn defaults_for_channel(index: usize) -> Self {
        let rotation_direction = if index == 0 {
            RotationDirection::Clockwise
        } else {
            RotationDirection::Counterclockwise
        };

        Self {
            angle: 0.0,
            rotation_speed: DEFAULT_ROTATION_SPEED,
            rotation_direction,
            flip_horizontal: Flip::Normal,
            flip_vertical: Flip::Normal,
            scale: DEFAULT_SCALE,
            pan_x: DEFAULT_PAN,
            pan_y: DEFAULT_PAN,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    pub fn rotation_direction(&self) -> RotationDirection {
        self.rotation_direction
    }

    pub fn flip_horizontal(&self) -> Flip {
        self.flip_horizontal
    }

    pub fn flip_vertical(&self) -> Flip {
        self.flip_vertical
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pan_x(&self) -> f32 {
        self.pan_x
    }

    pub fn pan_y(&self) -> f32 {
        self.pan_y
    }

    /// Clamp `value` into the field's range, apply it, and return what was
    /// actually stored so a UI can reflect the engine's state.
    pub fn set(&mut self, param: Param, value: f32) -> f32 {
        match param {
            Param::Angle => self.set_angle(value),
            Param::RotationSpeed => self.set_rotation_speed(value),
            Param::Scale => self.set_scale(value),
            Param::PanX => self.set_pan_x(value),
            Param::PanY => self.set_pan_y(value),
        }
    }

    pub fn get(&self, param: Param) -> f32 {
        match param {
            Param::Angle => self.angle,
            Param::RotationSpeed => self.rotation_speed,
            Param::Scale => self.scale,
            Param::PanX => self.pan_x,
            Param::PanY => self.pan_y,
        }
    }

    pub fn set_angle(&mut self, degrees: f32) -> f32 {
        self.angle = normalize_angle(degrees);
        self.angle
    }

    pub fn set_rotation_speed(&mut self, speed: f32) -> f32 {
        self.rotation_speed = clamp_finite(speed, ROTATION_SPEED_MIN, ROTATION_SPEED_MAX);
        self.rotation_speed
    }

    pub fn set_scale(&mut self, scale: f32) -> f32 {
        self.scale = clamp_finite(scale, SCALE_MIN, SCALE_MAX);
        self.scale
    }

    pub fn set_pan_x(&mut self, pan: f32) -> f32 {
        self.pan_x = clamp_finite(pan, PAN_MIN, PAN_MAX);
        self.pan_x
    }

    pub fn set_pan_y(&mut self, pan: f32) -> f32 {
        self.pan_y = clamp_finite(pan, PAN_MIN, PAN_MAX);
        self.pan_y
    }

    pub fn set_rotation_direction(&mut self, direction: RotationDirection) {
        self.rotation_direction = direction;
    }

    pub fn set_flip_horizontal(&mut self, flip: Flip) {
        self.flip_horizontal = flip;
    }

    pub fn set_flip_vertical(&mut self, flip: Flip) {
        self.flip_vertical = flip;
    }

    pub fn toggle_rotation_direction(&mut self) -> RotationDirection {
        self.rotation_direction = self.rotation_direction.toggled();
        self.rotation_direction
    }

    pub fn toggle_flip_horizontal(&mut self) -> Flip {
        self.flip_horizontal = self.flip_horizontal.toggled();
        self.flip_horizontal
    }

    pub fn toggle_flip_vertical(&mut self) -> Flip {
        self.flip_vertical = self.flip_vertical.toggled();
        self.flip_vertical
    }

    /// One tick of phase evolution; returns the re-normalized angle.
    pub fn advance(&mut self) -> f32 {
        let step = self.rotation_speed * self.rotation_direction.sign();
        self.angle = normalize_angle(self.angle + step);
        self.angle
    }
}

/// Wrap into [0, 360). Non-finite input resets the phase rather than
/// poisoning every subsequent frame with NaN.
fn normalize_angle(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    degrees.rem_euclid(360.0)
}

fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_counter_rotate_across_channels() {
        let first = ChannelParams::defaults_for_channel(0);
        let second = ChannelParams::defaults_for_channel(1);

        assert_eq!(first.rotation_direction(), RotationDirection::Clockwise);
        assert_eq!(
            second.rotation_direction(),
            RotationDirection::Counterclockwise
        );
        assert_eq!(first.scale(), DEFAULT_SCALE);
        assert_eq!(first.pan_x(), DEFAULT_PAN);
        assert_eq!(first.pan_y(), DEFAULT_PAN);
    }

    #[test]
    fn advance_wraps_negative_phase_into_range() {
        let mut params = ChannelParams::defaults_for_channel(0);
        params.set_rotation_speed(2.0);
        params.set_rotation_direction(RotationDirection::Counterclockwise);

        for _ in 0..10 {
            params.advance();
        }

        assert!((params.angle() - 340.0).abs() < 1e-3, "got {}", params.angle());
    }

    #[test]
    fn advance_wraps_past_full_turn() {
        let mut params = ChannelParams::defaults_for_channel(0);
        params.set_angle(359.5);
        params.set_rotation_speed(1.0);

        let angle = params.advance();
        assert!((angle - 0.5).abs() < 1e-3, "got {angle}");
    }

    #[test]
    fn setters_clamp_to_documented_bounds() {
        let mut params = ChannelParams::defaults_for_channel(0);

        assert_eq!(params.set(Param::Scale, 9.0), SCALE_MAX);
        assert_eq!(params.set(Param::Scale, 0.0), SCALE_MIN);
        assert_eq!(params.set(Param::RotationSpeed, 100.0), ROTATION_SPEED_MAX);
        assert_eq!(params.set(Param::RotationSpeed, 0.0), ROTATION_SPEED_MIN);
        assert_eq!(params.set(Param::PanX, 1.0), PAN_MIN);
        assert_eq!(params.set(Param::PanY, 5000.0), PAN_MAX);
    }

    #[test]
    fn set_angle_normalizes_modulo_full_turn() {
        let mut params = ChannelParams::defaults_for_channel(0);

        assert_eq!(params.set(Param::Angle, 720.0), 0.0);
        assert_eq!(params.set(Param::Angle, -90.0), 270.0);
        assert_eq!(params.set(Param::Angle, f32::NAN), 0.0);
    }

    #[test]
    fn double_toggle_restores_every_sign() {
        let mut params = ChannelParams::defaults_for_channel(1);
        let before = params;

        params.toggle_flip_horizontal();
        params.toggle_flip_horizontal();
        params.toggle_flip_vertical();
        params.toggle_flip_vertical();
        params.toggle_rotation_direction();
        params.toggle_rotation_direction();

        assert_eq!(params, before);
    }
}
