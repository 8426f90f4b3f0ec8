//! Headless dual-channel kaleidoscopic image compositor.
//!
//! Two independent channels each hold an input image and a set of evolving
//! transform parameters; every tick the compositor draws the image into the
//! top-left quadrant of a fixed 2560x1440 surface and mirrors it across both
//! axes into a four-way symmetric tile. Hosts (the CLI's video/still
//! renderers, the optional preview window, or an embedding 3D gallery)
//! consume the buffers through a stable handle plus a dirty flag.

pub mod compositor;
pub mod encoding;
pub mod engine;
pub mod manifest;
pub mod params;
#[cfg(feature = "preview")]
pub mod preview;
pub mod scene;
pub mod schema;
pub mod source;
