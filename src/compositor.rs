//! The per-tick draw-and-mirror pass.
//!
//! The source image is drawn once, under the channel's affine stack, into a
//! scratch surface the size of the output's top-left quadrant; the full
//! output is then assembled as that quadrant reflected across both axes.
//! Writing through a scratch surface instead of repainting the output onto
//! itself keeps the reads and writes on separate buffers, so the mirror pass
//! never samples pixels it already overwrote.

use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::params::ChannelParams;
use crate::source::SourceImage;

/// Slider pan values are in a 10..2000 UI range; the original installation
/// maps them onto the working quadrant at a quarter of that.
pub const PAN_DIVISOR: f32 = 4.0;

/// Rewrite `target` from `source` and `params`.
///
/// `scratch` must be the quadrant surface for `target` (see
/// [`quadrant_size`]); it is fully cleared and repainted here. With no
/// source loaded the target comes out fully transparent.
pub fn composite_channel(
    source: Option<&SourceImage>,
    params: &ChannelParams,
    scratch: &mut Pixmap,
    target: &mut Pixmap,
) {
    scratch.fill(Color::TRANSPARENT);

    if let Some(source) = source {
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        scratch.draw_pixmap(
            0,
            0,
            source.pixmap().as_ref(),
            &paint,
            source_transform(source, params),
            None,
        );
    }

    target.fill(Color::TRANSPARENT);
    mirror_quadrant_into(scratch, target);
}

/// Quadrant scratch dimensions for an output surface. Integer halving: odd
/// output dimensions leave a one-pixel cleared seam on the mirror axis.
pub fn quadrant_size(width: u32, height: u32) -> (u32, u32) {
    (width / 2, height / 2)
}

/// The affine stack of the primary draw, innermost first: center the source
/// on its midpoint, rotate by the phase, apply signed uniform scale, then
/// place within the quadrant by the pan offsets.
fn source_transform(source: &SourceImage, params: &ChannelParams) -> Transform {
    let scale_x = params.scale() * params.flip_horizontal().sign();
    let scale_y = params.scale() * params.flip_vertical().sign();

    Transform::from_translate(params.pan_x() / PAN_DIVISOR, params.pan_y() / PAN_DIVISOR)
        .pre_concat(Transform::from_scale(scale_x, scale_y))
        .pre_concat(Transform::from_rotate(params.angle()))
        .pre_concat(Transform::from_translate(
            -(source.width() as f32) / 2.0,
            -(source.height() as f32) / 2.0,
        ))
}

/// Reflect the painted quadrant into all four quadrants of `target`:
/// the right half of every top row is the reversed quadrant row, and the
/// bottom half is the vertical reflection of the assembled top half.
fn mirror_quadrant_into(scratch: &Pixmap, target: &mut Pixmap) {
    let width = target.width() as usize;
    let height = target.height() as usize;
    let half_width = width / 2;
    let half_height = height / 2;

    debug_assert_eq!(scratch.width() as usize, half_width);
    debug_assert_eq!(scratch.height() as usize, half_height);

    let quadrant = scratch.pixels();
    let pixels = target.pixels_mut();

    for y in 0..half_height {
        let quadrant_row = &quadrant[y * half_width..(y + 1) * half_width];
        let row_start = y * width;

        pixels[row_start..row_start + half_width].copy_from_slice(quadrant_row);
        for x in 0..half_width {
            pixels[row_start + width - 1 - x] = quadrant_row[x];
        }
    }

    for y in 0..half_height {
        let top_row = y * width;
        let bottom_row = (height - 1 - y) * width;
        pixels.copy_within(top_row..top_row + width, bottom_row);
    }
}
