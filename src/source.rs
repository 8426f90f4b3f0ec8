//! Channel input images: decoding into premultiplied pixmaps, and the
//! background decode worker that keeps `tick()` free of suspending work.
//!
//! Decoding is the only off-thread operation in the engine. Requests are
//! tagged with the owning channel's load generation; the engine applies a
//! completed decode only if the generation still matches, so a decode that
//! was superseded (or that finished after `clear_source`) is dropped on the
//! floor instead of clobbering newer state.

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use image::{ImageReader, RgbaImage};
use tiny_skia::{ColorU8, Pixmap};

/// Why an image failed to become a [`SourceImage`]. Recovered locally: the
/// channel keeps rendering whatever it had before.
#[derive(Debug)]
pub enum DecodeError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Decode(image::ImageError),
    EmptyImage,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed reading image {}: {source}", path.display())
            }
            Self::Decode(error) => write!(f, "failed decoding image: {error}"),
            Self::EmptyImage => write!(f, "decoded image has zero pixel area"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// One channel's decoded input image. Replaced wholesale, never mutated.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixmap: Pixmap,
}

impl SourceImage {
    /// Decode an in-memory byte stream (an uploaded file, typically).
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let decoded = image::load_from_memory(bytes).map_err(DecodeError::Decode)?;
        Self::from_rgba(decoded.to_rgba8())
    }

    /// Decode directly from a file path.
    pub fn decode_file(path: &Path) -> Result<Self, DecodeError> {
        let reader = ImageReader::open(path).map_err(|source| DecodeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = reader.decode().map_err(DecodeError::Decode)?;
        Self::from_rgba(decoded.to_rgba8())
    }

    /// Build from already-decoded straight-alpha pixels.
    pub fn from_rgba(image: RgbaImage) -> Result<Self, DecodeError> {
        let (width, height) = image.dimensions();
        let mut pixmap = Pixmap::new(width, height).ok_or(DecodeError::EmptyImage)?;

        for (pixel, out) in image.pixels().zip(pixmap.pixels_mut()) {
            let [r, g, b, a] = pixel.0;
            *out = ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

#[derive(Debug)]
pub(crate) enum LoadPayload {
    Bytes(Vec<u8>),
    File(PathBuf),
}

#[derive(Debug)]
pub(crate) struct LoadRequest {
    pub channel: usize,
    pub generation: u64,
    pub payload: LoadPayload,
}

#[derive(Debug)]
pub(crate) struct LoadCompletion {
    pub channel: usize,
    pub generation: u64,
    pub result: Result<SourceImage, DecodeError>,
}

/// Dedicated decode thread plus its request/completion channels.
///
/// Dropping the loader drops the request sender; the worker drains what is
/// queued and exits, and undelivered completions die with the channel.
pub(crate) struct ImageLoader {
    requests: Option<mpsc::Sender<LoadRequest>>,
    completions: mpsc::Receiver<LoadCompletion>,
    worker: Option<JoinHandle<()>>,
    pending: usize,
}

impl ImageLoader {
    pub(crate) fn spawn() -> Self {
        let (request_tx, request_rx) = mpsc::channel::<LoadRequest>();
        let (completion_tx, completion_rx) = mpsc::channel::<LoadCompletion>();

        let worker = thread::Builder::new()
            .name("kaleido-image-decoder".to_owned())
            .spawn(move || {
                while let Ok(request) = request_rx.recv() {
                    let result = match request.payload {
                        LoadPayload::Bytes(bytes) => SourceImage::decode(&bytes),
                        LoadPayload::File(path) => SourceImage::decode_file(&path),
                    };
                    let completion = LoadCompletion {
                        channel: request.channel,
                        generation: request.generation,
                        result,
                    };
                    if completion_tx.send(completion).is_err() {
                        break;
                    }
                }
            })
            .ok();

        Self {
            requests: Some(request_tx),
            completions: completion_rx,
            worker,
            pending: 0,
        }
    }

    pub(crate) fn submit(&mut self, request: LoadRequest) {
        let Some(sender) = self.requests.as_ref() else {
            return;
        };
        if sender.send(request).is_ok() {
            self.pending += 1;
        }
    }

    /// Non-blocking drain of finished decodes.
    pub(crate) fn poll(&mut self) -> Vec<LoadCompletion> {
        let mut completed = Vec::new();
        while let Ok(completion) = self.completions.try_recv() {
            completed.push(completion);
        }
        self.pending = self.pending.saturating_sub(completed.len());
        completed
    }

    /// Block until every submitted request has completed.
    pub(crate) fn wait_all(&mut self) -> Vec<LoadCompletion> {
        let mut completed = Vec::new();
        while self.pending > 0 {
            match self.completions.recv() {
                Ok(completion) => {
                    completed.push(completion);
                    self.pending -= 1;
                }
                Err(_) => break,
            }
        }
        completed
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        drop(self.requests.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("png encoding should succeed");
        bytes.into_inner()
    }

    #[test]
    fn decode_reports_garbage_bytes() {
        let error = SourceImage::decode(b"definitely not an image").expect_err("must fail");
        assert!(matches!(error, DecodeError::Decode(_)));
    }

    #[test]
    fn decode_premultiplies_alpha() {
        let bytes = png_bytes(3, 2, [200, 100, 0, 128]);
        let source = SourceImage::decode(&bytes).expect("decode should succeed");

        assert_eq!(source.width(), 3);
        assert_eq!(source.height(), 2);

        let pixel = source.pixmap().pixels()[0];
        let expected = ColorU8::from_rgba(200, 100, 0, 128).premultiply();
        assert_eq!(pixel, expected);
    }

    #[test]
    fn decode_file_reports_missing_path() {
        let error = SourceImage::decode_file(Path::new("/nonexistent/kaleido-test.png"))
            .expect_err("must fail");
        assert!(matches!(error, DecodeError::Read { .. }));
    }

    #[test]
    fn loader_round_trips_a_request() {
        let mut loader = ImageLoader::spawn();
        loader.submit(LoadRequest {
            channel: 1,
            generation: 7,
            payload: LoadPayload::Bytes(png_bytes(4, 4, [10, 20, 30, 255])),
        });

        let completed = loader.wait_all();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].channel, 1);
        assert_eq!(completed[0].generation, 7);
        let source = completed[0].result.as_ref().expect("decode should succeed");
        assert_eq!((source.width(), source.height()), (4, 4));
    }

    #[test]
    fn loader_reports_failures_without_panicking() {
        let mut loader = ImageLoader::spawn();
        loader.submit(LoadRequest {
            channel: 0,
            generation: 1,
            payload: LoadPayload::Bytes(b"nope".to_vec()),
        });

        let completed = loader.wait_all();
        assert_eq!(completed.len(), 1);
        assert!(completed[0].result.is_err());
    }
}
