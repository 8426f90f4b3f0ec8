use kaleido::engine::MutationEngine;
use kaleido::params::Param;
use kaleido::source::SourceImage;
use tiny_skia::Pixmap;

fn test_source(width: u32, height: u32) -> SourceImage {
    // Deliberately asymmetric so mirroring bugs cannot hide.
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([
            (x * 31 % 256) as u8,
            (y * 57 % 256) as u8,
            ((x * 3 + y * 7) % 256) as u8,
            255,
        ])
    });
    SourceImage::from_rgba(image).expect("test source should build")
}

fn assert_four_way_symmetric(pixmap: &Pixmap) {
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let pixels = pixmap.pixels();

    for y in 0..height / 2 {
        for x in 0..width / 2 {
            let value = pixels[y * width + x];
            assert_eq!(
                value,
                pixels[y * width + (width - 1 - x)],
                "left/right mirror broken at ({x}, {y})"
            );
            assert_eq!(
                value,
                pixels[(height - 1 - y) * width + x],
                "top/bottom mirror broken at ({x}, {y})"
            );
        }
    }
}

#[test]
fn every_tick_produces_a_symmetric_buffer() {
    let mut engine = MutationEngine::with_resolution(128, 72).expect("engine should build");
    engine.set_source(0, test_source(48, 40)).expect("set source");
    engine.set_param(0, Param::PanX, 120.0).expect("set pan");
    engine.set_param(0, Param::PanY, 90.0).expect("set pan");
    engine.set_param(0, Param::Scale, 1.3).expect("set scale");
    engine
        .set_param(0, Param::RotationSpeed, 3.7)
        .expect("set speed");

    for tick in 0..25 {
        engine.tick();
        let buffer = engine.buffer(0).expect("channel 0 exists");
        assert_four_way_symmetric(buffer.pixmap());

        if tick == 0 {
            let painted = buffer.pixmap().pixels().iter().any(|pixel| pixel.alpha() != 0);
            assert!(painted, "loaded channel should paint pixels");
        }
    }
}

#[test]
fn imageless_channel_clears_on_every_tick_regardless_of_params() {
    let mut engine = MutationEngine::with_resolution(96, 54).expect("engine should build");
    engine.set_param(1, Param::Angle, 213.0).expect("set angle");
    engine.set_param(1, Param::Scale, 2.0).expect("set scale");
    engine.set_param(1, Param::PanX, 10.0).expect("set pan");
    engine.toggle_flip_vertical(1).expect("toggle flip");

    for _ in 0..10 {
        engine.tick();
        let all_clear = engine
            .buffer(1)
            .expect("channel 1 exists")
            .pixmap()
            .pixels()
            .iter()
            .all(|pixel| pixel.alpha() == 0);
        assert!(all_clear, "no source loaded means a fully cleared buffer");
    }
}

#[test]
fn channels_do_not_share_pixels() {
    let mut engine = MutationEngine::with_resolution(128, 72).expect("engine should build");
    engine.set_source(0, test_source(64, 64)).expect("set source");
    engine.set_param(0, Param::PanX, 100.0).expect("set pan");
    engine.set_param(0, Param::PanY, 70.0).expect("set pan");
    engine.tick();

    let loaded = engine
        .buffer(0)
        .expect("channel 0 exists")
        .pixmap()
        .pixels()
        .iter()
        .any(|pixel| pixel.alpha() != 0);
    assert!(loaded);

    let untouched = engine
        .buffer(1)
        .expect("channel 1 exists")
        .pixmap()
        .pixels()
        .iter()
        .all(|pixel| pixel.alpha() == 0);
    assert!(untouched, "channel 1 must stay imageless and cleared");
}

#[test]
fn symmetry_holds_under_flips_and_reversed_rotation() {
    let mut engine = MutationEngine::with_resolution(128, 72).expect("engine should build");
    engine.set_source(1, test_source(100, 30)).expect("set source");
    engine.set_param(1, Param::PanX, 130.0).expect("set pan");
    engine.set_param(1, Param::PanY, 80.0).expect("set pan");
    engine.toggle_flip_horizontal(1).expect("toggle flip");
    engine.toggle_rotation_direction(1).expect("toggle direction");

    for _ in 0..12 {
        engine.tick();
        assert_four_way_symmetric(engine.buffer(1).expect("channel 1 exists").pixmap());
    }
}
