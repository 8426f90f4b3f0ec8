//! The mutation engine: two independent channels, each a parameter set, an
//! optional source image, and a fixed-resolution output surface.
//!
//! `tick()` is synchronous and never suspends; hosts call it once per
//! displayed frame. Image decodes run on the loader thread and are applied
//! only inside `poll_loaded`/`wait_for_pending_loads`, on the host thread,
//! so a tick always sees a fully-formed source. A completed decode whose
//! load generation no longer matches its channel is discarded.

use std::fmt::{Display, Formatter};
use std::path::Path;

use tiny_skia::Pixmap;

use crate::compositor::{self, quadrant_size};
use crate::params::{ChannelParams, Flip, Param, RotationDirection};
use crate::source::{DecodeError, ImageLoader, LoadCompletion, LoadPayload, LoadRequest, SourceImage};

pub const CHANNEL_COUNT: usize = 2;

/// Fixed output surface resolution, matching the original installation's
/// wall textures. Arbitrary resolutions are deliberately unsupported.
pub const BUFFER_WIDTH: u32 = 2560;
pub const BUFFER_HEIGHT: u32 = 1440;

/// Caller-programming errors. Rejected before any state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    InvalidChannel { index: usize },
    InvalidResolution { width: u32, height: u32 },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidChannel { index } => {
                write!(f, "channel index {index} out of range (0..{CHANNEL_COUNT})")
            }
            Self::InvalidResolution { width, height } => {
                write!(f, "output resolution {width}x{height} has an empty quadrant")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// A channel's output surface plus the flag the texture-upload side consumes.
#[derive(Debug)]
pub struct OutputBuffer {
    pixmap: Pixmap,
    dirty: bool,
}

impl OutputBuffer {
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Straight-alpha RGBA bytes, demultiplied for consumers (encoders,
    /// window blits) that do not speak premultiplied pixels.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for pixel in self.pixmap.pixels() {
            let color = pixel.demultiply();
            bytes.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
        bytes
    }
}

/// Result of one finished image load, reported to the host. Failures keep
/// the channel's previous image rendering.
#[derive(Debug)]
pub struct LoadOutcome {
    pub channel: usize,
    pub result: Result<(), DecodeError>,
}

struct Channel {
    params: ChannelParams,
    source: Option<SourceImage>,
    buffer: OutputBuffer,
    generation: u64,
}

pub struct MutationEngine {
    channels: [Channel; CHANNEL_COUNT],
    scratch: Pixmap,
    loader: ImageLoader,
}

impl MutationEngine {
    pub fn new() -> Self {
        Self::with_resolution(BUFFER_WIDTH, BUFFER_HEIGHT)
            .expect("fixed output resolution is valid")
    }

    /// Non-default resolutions exist for tests and benches; production
    /// consumers use [`MutationEngine::new`].
    pub fn with_resolution(width: u32, height: u32) -> Result<Self, EngineError> {
        let (quadrant_width, quadrant_height) = quadrant_size(width, height);
        let scratch = Pixmap::new(quadrant_width, quadrant_height)
            .ok_or(EngineError::InvalidResolution { width, height })?;

        let make_channel = |index: usize| -> Result<Channel, EngineError> {
            Ok(Channel {
                params: ChannelParams::defaults_for_channel(index),
                source: None,
                buffer: OutputBuffer {
                    pixmap: Pixmap::new(width, height)
                        .ok_or(EngineError::InvalidResolution { width, height })?,
                    dirty: false,
                },
                generation: 0,
            })
        };

        Ok(Self {
            channels: [make_channel(0)?, make_channel(1)?],
            scratch,
            loader: ImageLoader::spawn(),
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (
            self.channels[0].buffer.width(),
            self.channels[0].buffer.height(),
        )
    }

    fn check_channel(&self, index: usize) -> Result<(), EngineError> {
        if index < CHANNEL_COUNT {
            Ok(())
        } else {
            Err(EngineError::InvalidChannel { index })
        }
    }

    pub fn params(&self, channel: usize) -> Result<&ChannelParams, EngineError> {
        self.check_channel(channel)?;
        Ok(&self.channels[channel].params)
    }

    /// Clamp-and-set one scalar field; returns the applied value. Takes
    /// effect on the next tick.
    pub fn set_param(&mut self, channel: usize, param: Param, value: f32) -> Result<f32, EngineError> {
        self.check_channel(channel)?;
        Ok(self.channels[channel].params.set(param, value))
    }

    /// Replace a channel's whole parameter set (manifest startup values).
    pub fn set_params(&mut self, channel: usize, params: ChannelParams) -> Result<(), EngineError> {
        self.check_channel(channel)?;
        self.channels[channel].params = params;
        Ok(())
    }

    pub fn toggle_flip_horizontal(&mut self, channel: usize) -> Result<Flip, EngineError> {
        self.check_channel(channel)?;
        Ok(self.channels[channel].params.toggle_flip_horizontal())
    }

    pub fn toggle_flip_vertical(&mut self, channel: usize) -> Result<Flip, EngineError> {
        self.check_channel(channel)?;
        Ok(self.channels[channel].params.toggle_flip_vertical())
    }

    pub fn toggle_rotation_direction(
        &mut self,
        channel: usize,
    ) -> Result<RotationDirection, EngineError> {
        self.check_channel(channel)?;
        Ok(self.channels[channel].params.toggle_rotation_direction())
    }

    /// Queue an asynchronous decode of raw image bytes for `channel`.
    pub fn load_image_bytes(&mut self, channel: usize, bytes: Vec<u8>) -> Result<(), EngineError> {
        self.submit_load(channel, LoadPayload::Bytes(bytes))
    }

    /// Queue an asynchronous decode of an image file for `channel`.
    pub fn load_image_file(&mut self, channel: usize, path: &Path) -> Result<(), EngineError> {
        self.submit_load(channel, LoadPayload::File(path.to_path_buf()))
    }

    fn submit_load(&mut self, channel: usize, payload: LoadPayload) -> Result<(), EngineError> {
        self.check_channel(channel)?;
        self.channels[channel].generation += 1;
        let generation = self.channels[channel].generation;
        self.loader.submit(LoadRequest {
            channel,
            generation,
            payload,
        });
        Ok(())
    }

    /// Atomically swap in an already-decoded source and redraw the channel
    /// immediately, without advancing its phase. This is the completion path
    /// of the async loads; hosts with pre-decoded pixels may call it directly.
    pub fn set_source(&mut self, channel: usize, source: SourceImage) -> Result<(), EngineError> {
        self.check_channel(channel)?;
        self.channels[channel].generation += 1;
        self.channels[channel].source = Some(source);
        self.redraw_channel(channel);
        Ok(())
    }

    /// Drop a channel's source; subsequent ticks produce a cleared buffer.
    /// Any in-flight decode for the channel is invalidated.
    pub fn clear_source(&mut self, channel: usize) -> Result<(), EngineError> {
        self.check_channel(channel)?;
        self.channels[channel].generation += 1;
        self.channels[channel].source = None;
        self.redraw_channel(channel);
        Ok(())
    }

    pub fn has_source(&self, channel: usize) -> Result<bool, EngineError> {
        self.check_channel(channel)?;
        Ok(self.channels[channel].source.is_some())
    }

    /// Apply decodes that finished since the last call. Call once per host
    /// frame; the swap and the immediate redraw happen here, never mid-tick.
    pub fn poll_loaded(&mut self) -> Vec<LoadOutcome> {
        let completions = self.loader.poll();
        self.apply_completions(completions)
    }

    /// Block until every queued decode has finished, then apply them.
    /// Headless hosts use this before entering the tick loop.
    pub fn wait_for_pending_loads(&mut self) -> Vec<LoadOutcome> {
        let completions = self.loader.wait_all();
        self.apply_completions(completions)
    }

    fn apply_completions(&mut self, completions: Vec<LoadCompletion>) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::with_capacity(completions.len());
        for completion in completions {
            if completion.channel >= CHANNEL_COUNT {
                continue;
            }
            if completion.generation != self.channels[completion.channel].generation {
                // Superseded by a newer load or a clear; stale result.
                continue;
            }
            let result = match completion.result {
                Ok(source) => {
                    self.channels[completion.channel].source = Some(source);
                    self.redraw_channel(completion.channel);
                    Ok(())
                }
                Err(error) => Err(error),
            };
            outcomes.push(LoadOutcome {
                channel: completion.channel,
                result,
            });
        }
        outcomes
    }

    /// Advance and redraw both channels, index order 0 then 1. The channels
    /// are independent; the order has no observable cross-channel effect.
    pub fn tick(&mut self) {
        for index in 0..CHANNEL_COUNT {
            self.channels[index].params.advance();
            self.redraw_channel(index);
        }
    }

    fn redraw_channel(&mut self, index: usize) {
        let channel = &mut self.channels[index];
        compositor::composite_channel(
            channel.source.as_ref(),
            &channel.params,
            &mut self.scratch,
            &mut channel.buffer.pixmap,
        );
        channel.buffer.dirty = true;
    }

    pub fn buffer(&self, channel: usize) -> Result<&OutputBuffer, EngineError> {
        self.check_channel(channel)?;
        Ok(&self.channels[channel].buffer)
    }

    /// Read and reset a channel's dirty flag; true means the buffer changed
    /// since the flag was last taken.
    pub fn take_dirty(&mut self, channel: usize) -> Result<bool, EngineError> {
        self.check_channel(channel)?;
        let dirty = self.channels[channel].buffer.dirty;
        self.channels[channel].buffer.dirty = false;
        Ok(dirty)
    }
}
