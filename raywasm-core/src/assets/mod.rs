//! Session-owned images and fonts addressed by index.
//!
//! Loads are fire-and-forget: `load_*` pushes a `Pending` slot, hands the file to a
//! background thread and returns the slot index at once. Results come back over a
//! channel and are applied by [`Assets::poll`], which the scheduler calls at the top of
//! every frame. Slots are never evicted; the whole table goes away with the session.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use fontdue::{Font, FontSettings};
use tracing::debug;

use crate::surface::Image;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode png `{path}`: {source}")]
    Png {
        path: PathBuf,
        #[source]
        source: png::DecodingError,
    },
    #[error("failed to encode png `{path}`: {source}")]
    PngEncode {
        path: PathBuf,
        #[source]
        source: png::EncodingError,
    },
    #[error("unsupported png layout in `{0}`")]
    UnsupportedPng(PathBuf),
    #[error("failed to parse font `{path}`: {reason}")]
    Font { path: PathBuf, reason: &'static str },
}

/// State of one loaded resource.
#[derive(Clone, Debug, Default)]
pub enum Slot<T> {
    #[default]
    Pending,
    Ready(T),
    Failed,
}

impl<T> Slot<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Slot::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending)
    }
}

enum Loaded {
    Image(usize, Result<Image, AssetError>),
    Font(usize, Result<Font, AssetError>),
}

pub struct Assets {
    root: PathBuf,
    images: Vec<Slot<Arc<Image>>>,
    fonts: Vec<Slot<Arc<Font>>>,
    default_font: Option<Arc<Font>>,
    tx: Sender<Loaded>,
    rx: Receiver<Loaded>,
    in_flight: usize,
}

impl Assets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            root: root.into(),
            images: Vec::new(),
            fonts: Vec::new(),
            default_font: None,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Guest paths are relative to the asset root; absolute paths are used as-is.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Load the default face synchronously. A failure leaves text unrasterized.
    pub fn set_default_font(&mut self, path: &Path) -> Result<(), AssetError> {
        let font = read_font(&self.root.join(path))?;
        self.default_font = Some(Arc::new(font));
        Ok(())
    }

    pub fn default_font(&self) -> Option<Arc<Font>> {
        self.default_font.clone()
    }

    pub fn load_image(&mut self, path: &str) -> u32 {
        let index = self.images.len();
        self.images.push(Slot::Pending);
        let full = self.resolve(path);
        self.spawn(move || Loaded::Image(index, read_png(&full)));
        index as u32
    }

    pub fn load_font(&mut self, path: &str) -> u32 {
        let index = self.fonts.len();
        self.fonts.push(Slot::Pending);
        let full = self.resolve(path);
        self.spawn(move || Loaded::Font(index, read_font(&full)));
        index as u32
    }

    fn spawn(&mut self, job: impl FnOnce() -> Loaded + Send + 'static) {
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            // The receiver only disappears with the session.
            let _ = tx.send(job());
        });
    }

    /// `None` when the index was never issued.
    pub fn image(&self, index: u32) -> Option<&Slot<Arc<Image>>> {
        self.images.get(index as usize)
    }

    pub fn font(&self, index: u32) -> Option<&Slot<Arc<Font>>> {
        self.fonts.get(index as usize)
    }

    /// Apply every finished load without blocking.
    pub fn poll(&mut self) {
        while let Ok(loaded) = self.rx.try_recv() {
            self.apply(loaded);
        }
    }

    /// Block until no load is in flight.
    pub fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv() {
                Ok(loaded) => self.apply(loaded),
                Err(_) => break,
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn apply(&mut self, loaded: Loaded) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match loaded {
            Loaded::Image(index, Ok(image)) => {
                debug!(index, width = image.width, height = image.height, "image loaded");
                self.images[index] = Slot::Ready(Arc::new(image));
            }
            Loaded::Image(index, Err(err)) => {
                debug!(index, error = %err, "image load failed");
                self.images[index] = Slot::Failed;
            }
            Loaded::Font(index, Ok(font)) => {
                debug!(index, "font loaded");
                self.fonts[index] = Slot::Ready(Arc::new(font));
            }
            Loaded::Font(index, Err(err)) => {
                debug!(index, error = %err, "font load failed");
                self.fonts[index] = Slot::Failed;
            }
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, AssetError> {
    std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_font(path: &Path) -> Result<Font, AssetError> {
    let bytes = read_file(path)?;
    Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| AssetError::Font {
        path: path.to_path_buf(),
        reason,
    })
}

fn read_png(path: &Path) -> Result<Image, AssetError> {
    decode_png(&read_file(path)?, path)
}

/// Decode to RGBA8, expanding palettes and low bit depths.
pub fn decode_png(bytes: &[u8], path: &Path) -> Result<Image, AssetError> {
    let png_err = |source| AssetError::Png {
        path: path.to_path_buf(),
        source,
    };
    let mut decoder = png::Decoder::new(std::io::Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(png_err)?;

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(png_err)?;
    let (width, height) = (info.width, info.height);
    let bytes = &buf[..info.buffer_size()];

    let rgba: Vec<u8> = match info.color_type {
        png::ColorType::Rgba => bytes.to_vec(),
        png::ColorType::Rgb => bytes
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::Grayscale => bytes.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::GrayscaleAlpha => bytes
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Indexed => return Err(AssetError::UnsupportedPng(path.to_path_buf())),
    };

    Ok(Image {
        width,
        height,
        rgba,
    })
}

/// Read only the PNG header. `None` for anything that is not a readable PNG.
pub fn probe_png_size(path: &Path) -> Option<(u32, u32)> {
    let file = File::open(path).ok()?;
    let reader = png::Decoder::new(std::io::BufReader::new(file))
        .read_info()
        .ok()?;
    let info = reader.info();
    Some((info.width, info.height))
}

/// Write RGBA8 pixels as a PNG file.
pub fn write_png(image: &Image, path: &Path) -> Result<(), AssetError> {
    let encode_err = |source| AssetError::PngEncode {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(encode_err)?;
    writer.write_image_data(&image.rgba).map_err(encode_err)?;
    writer.finish().map_err(encode_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> Image {
        let mut image = Image::new(3, 2);
        image.rgba[0..4].copy_from_slice(&[255, 0, 0, 255]);
        image.rgba[20..24].copy_from_slice(&[0, 0, 255, 128]);
        image
    }

    #[test]
    fn written_png_decodes_to_the_same_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let image = sample_image();
        write_png(&image, &path).unwrap();

        assert_eq!(probe_png_size(&path), Some((3, 2)));
        let decoded = read_png(&path).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn probe_rejects_non_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert_eq!(probe_png_size(&path), None);
        assert_eq!(probe_png_size(&dir.path().join("missing.png")), None);
    }

    #[test]
    fn background_image_load_settles_ready() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&sample_image(), &dir.path().join("tile.png")).unwrap();

        let mut assets = Assets::new(dir.path());
        let first = assets.load_image("tile.png");
        let second = assets.load_image("missing.png");
        assert_eq!((first, second), (0, 1));
        assert!(assets.image(first).unwrap().is_pending());

        assets.settle();
        assert_eq!(assets.in_flight(), 0);
        let ready = assets.image(first).unwrap().ready().unwrap();
        assert_eq!((ready.width, ready.height), (3, 2));
        assert!(matches!(assets.image(second), Some(Slot::Failed)));
        assert!(assets.image(2).is_none());
    }

    #[test]
    fn garbage_font_fails_its_slot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.ttf"), b"\0\0\0\0").unwrap();

        let mut assets = Assets::new(dir.path());
        let index = assets.load_font("bad.ttf");
        assets.settle();
        assert!(matches!(assets.font(index), Some(Slot::Failed)));
        assert!(
            assets
                .set_default_font(Path::new("bad.ttf"))
                .is_err()
        );
        assert!(assets.default_font().is_none());
    }
}
