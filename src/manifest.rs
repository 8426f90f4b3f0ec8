use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::engine::MutationEngine;
use crate::schema::Manifest;

pub fn load_and_validate_manifest(path: &Path) -> Result<Manifest> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let mut manifest: Manifest = serde_yaml::from_str(&contents).map_err(|error| {
        let location = error
            .location()
            .map(|location| format!("line {}, column {}", location.line(), location.column()))
            .unwrap_or_else(|| "unknown location".to_owned());
        anyhow!(
            "failed to parse yaml in {} at {}: {}",
            path.display(),
            location,
            error
        )
    })?;

    manifest.validate()?;
    resolve_asset_paths(&mut manifest, path)?;
    Ok(manifest)
}

/// Build an engine at startup state: manifest parameters applied, images
/// queued on the decode worker. The caller decides whether to block on the
/// loads (`wait_for_pending_loads`) or to keep polling per frame.
pub fn engine_from_manifest(manifest: &Manifest) -> Result<MutationEngine> {
    let mut engine = MutationEngine::new();

    for (index, channel) in manifest.channels.iter().enumerate() {
        engine
            .set_params(index, channel.initial_params(index))
            .with_context(|| format!("failed configuring channel {index}"))?;
        if let Some(image) = &channel.image {
            engine
                .load_image_file(index, image)
                .with_context(|| format!("failed queueing image for channel {index}"))?;
        }
    }

    Ok(engine)
}

fn resolve_asset_paths(manifest: &mut Manifest, manifest_path: &Path) -> Result<()> {
    let manifest_dir = manifest_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    for (index, channel) in manifest.channels.iter_mut().enumerate() {
        if let Some(image) = &channel.image {
            let resolved = resolve_and_validate_asset_path(
                &manifest_dir,
                image,
                &format!("channel {index} image"),
            )?;
            channel.image = Some(resolved);
        }
    }

    if let Some(scene) = &mut manifest.scene {
        for artwork in &mut scene.artworks {
            let resolved = resolve_and_validate_asset_path(
                &manifest_dir,
                &artwork.path,
                &format!("artwork '{}'", artwork.path.display()),
            )?;
            artwork.path = resolved;
        }
    }

    Ok(())
}

fn resolve_and_validate_asset_path(
    manifest_dir: &Path,
    source_path: &Path,
    label: &str,
) -> Result<PathBuf> {
    let resolved = if source_path.is_absolute() {
        source_path.to_path_buf()
    } else {
        manifest_dir.join(source_path)
    };

    if !resolved.exists() {
        anyhow::bail!("{label} does not exist: {}", resolved.display());
    }
    if !resolved.is_file() {
        anyhow::bail!("{label} is not a file: {}", resolved.display());
    }

    Ok(resolved)
}
