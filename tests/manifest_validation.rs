use std::fs;
use std::path::Path;

use kaleido::manifest::load_and_validate_manifest;
use tempfile::tempdir;

fn write_manifest(path: &Path, yaml: &str) {
    fs::write(path, yaml).expect("manifest should write");
}

const VALID_MANIFEST: &str = r#"
environment:
  fps: 24
  duration:
    frames: 48

channels:
  - rotation_speed: 1.5
  - scale: 0.5
"#;

#[test]
fn minimal_manifest_loads() {
    let dir = tempdir().expect("tempdir should create");
    let path = dir.path().join("scene.yaml");
    write_manifest(&path, VALID_MANIFEST);

    let manifest = load_and_validate_manifest(&path).expect("manifest should load");
    assert_eq!(manifest.environment.total_frames(), 48);
    assert!(manifest.scene.is_none());
}

#[test]
fn unknown_fields_are_rejected() {
    let dir = tempdir().expect("tempdir should create");
    let path = dir.path().join("scene.yaml");
    write_manifest(
        &path,
        r#"
environment:
  fps: 24
  duration:
    frames: 48
  prores_vendor: apl0

channels:
  - {}
  - {}
"#,
    );

    let error = load_and_validate_manifest(&path).expect_err("unknown field must fail");
    assert!(error.to_string().contains("failed to parse yaml"));
}

#[test]
fn yaml_syntax_errors_carry_a_location() {
    let dir = tempdir().expect("tempdir should create");
    let path = dir.path().join("scene.yaml");
    write_manifest(&path, "environment: [unterminated");

    let error = load_and_validate_manifest(&path).expect_err("bad yaml must fail");
    assert!(error.to_string().contains("failed to parse yaml"));
}

#[test]
fn exactly_two_channels_are_required() {
    let dir = tempdir().expect("tempdir should create");

    for (name, channels) in [("one.yaml", "  - {}\n"), ("three.yaml", "  - {}\n  - {}\n  - {}\n")] {
        let path = dir.path().join(name);
        write_manifest(
            &path,
            &format!(
                "environment:\n  fps: 24\n  duration:\n    frames: 10\n\nchannels:\n{channels}"
            ),
        );

        let error = load_and_validate_manifest(&path).expect_err("channel count must fail");
        assert!(
            error.to_string().contains("exactly 2 channels"),
            "unexpected error: {error}"
        );
    }
}

#[test]
fn missing_channel_image_is_reported() {
    let dir = tempdir().expect("tempdir should create");
    let path = dir.path().join("scene.yaml");
    write_manifest(
        &path,
        r#"
environment:
  fps: 24
  duration:
    frames: 10

channels:
  - image: not-there.png
  - {}
"#,
    );

    let error = load_and_validate_manifest(&path).expect_err("missing image must fail");
    assert!(error.to_string().contains("does not exist"));
}

#[test]
fn zero_fps_is_rejected() {
    let dir = tempdir().expect("tempdir should create");
    let path = dir.path().join("scene.yaml");
    write_manifest(
        &path,
        "environment:\n  fps: 0\n  duration:\n    frames: 10\n\nchannels:\n  - {}\n  - {}\n",
    );

    let error = load_and_validate_manifest(&path).expect_err("zero fps must fail");
    assert!(error.to_string().contains("fps must be > 0"));
}

#[test]
fn scene_with_one_screen_is_rejected() {
    let dir = tempdir().expect("tempdir should create");
    let path = dir.path().join("scene.yaml");
    write_manifest(
        &path,
        r#"
environment:
  fps: 24
  duration:
    frames: 10

channels:
  - {}
  - {}

scene:
  screens:
    - width: 30
      position: { x: 0, y: 0, z: -39 }
"#,
    );

    let error = load_and_validate_manifest(&path).expect_err("single screen must fail");
    assert!(error.to_string().contains("exactly 2 screens"));
}

#[test]
fn screen_outside_the_room_is_rejected() {
    let dir = tempdir().expect("tempdir should create");
    let path = dir.path().join("scene.yaml");
    write_manifest(
        &path,
        r#"
environment:
  fps: 24
  duration:
    frames: 10

channels:
  - {}
  - {}

scene:
  room:
    width: 40
    height: 20
    depth: 80
  screens:
    - width: 30
      position: { x: 0, y: 0, z: -39 }
    - width: 30
      position: { x: 300, y: 0, z: 0 }
"#,
    );

    let error = load_and_validate_manifest(&path).expect_err("far screen must fail");
    let chain = format!("{error:#}");
    assert!(chain.contains("screen 1"), "unexpected error: {chain}");
    assert!(chain.contains("outside"), "unexpected error: {chain}");
}

#[test]
fn out_of_range_startup_values_are_clamped_not_rejected() {
    let dir = tempdir().expect("tempdir should create");
    let path = dir.path().join("scene.yaml");
    write_manifest(
        &path,
        r#"
environment:
  fps: 24
  duration:
    frames: 10

channels:
  - scale: 9.0
    rotation_speed: 100.0
    pan_x: 1.0
  - {}
"#,
    );

    let manifest = load_and_validate_manifest(&path).expect("manifest should load");
    let params = manifest.channels[0].initial_params(0);
    assert_eq!(params.scale(), 2.0);
    assert_eq!(params.rotation_speed(), 5.0);
    assert_eq!(params.pan_x(), 10.0);
}

#[test]
fn relative_image_paths_resolve_against_the_manifest() {
    let dir = tempdir().expect("tempdir should create");
    let image = image::RgbaImage::from_pixel(8, 8, image::Rgba([1, 2, 3, 255]));
    image
        .save(dir.path().join("input.png"))
        .expect("image should write");

    let path = dir.path().join("scene.yaml");
    write_manifest(
        &path,
        r#"
environment:
  fps: 24
  duration:
    frames: 10

channels:
  - image: input.png
  - {}
"#,
    );

    let manifest = load_and_validate_manifest(&path).expect("manifest should load");
    let resolved = manifest.channels[0]
        .image
        .as_ref()
        .expect("image should be set");
    assert!(resolved.is_absolute() || resolved.starts_with(dir.path()));
    assert!(resolved.exists());
}
