use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageDecoder, ImageReader};

use super::CollageError;

/// Raw bytes of one uploaded photo. Clones share the buffer.
#[derive(Clone)]
pub struct ImageSource {
    bytes: Arc<[u8]>,
    name: Option<String>,
}

impl ImageSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
            name: None,
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());
        Ok(Self {
            bytes: Arc::from(bytes),
            name,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSource")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Decoded RGBA pixels of one source, alive for a single compose call.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub rgba: image::RgbaImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    #[cfg(test)]
    pub fn solid(width: u32, height: u32, px: [u8; 4]) -> Self {
        Self {
            rgba: image::RgbaImage::from_pixel(width, height, image::Rgba(px)),
        }
    }

    #[cfg(test)]
    pub fn blank(width: u32, height: u32) -> Self {
        Self::solid(width, height, [0, 0, 0, 255])
    }
}

pub fn decode_one(index: usize, bytes: &[u8]) -> Result<DecodedImage, CollageError> {
    if bytes.is_empty() {
        return Err(CollageError::Decode {
            index,
            reason: "empty input".to_string(),
        });
    }
    let img = load_oriented(bytes).map_err(|e| CollageError::Decode {
        index,
        reason: e.to_string(),
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(CollageError::Decode {
            index,
            reason: format!("degenerate size {width}x{height}"),
        });
    }
    Ok(DecodedImage { rgba })
}

// Camera photos are stored in sensor orientation; the EXIF tag says how to turn them upright.
fn load_oriented(bytes: &[u8]) -> image::ImageResult<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Decode every source concurrently on the blocking pool and wait for all of them.
/// Output order follows input order, whatever order the decodes finish in.
/// The first failure is returned; unfinished siblings are abandoned.
pub async fn decode_all(sources: &[ImageSource]) -> Result<Vec<DecodedImage>, CollageError> {
    let mut slots: Vec<Option<DecodedImage>> = vec![None; sources.len()];

    let mut set = tokio::task::JoinSet::new();
    for (idx, src) in sources.iter().enumerate() {
        let src = src.clone();
        set.spawn_blocking(move || (idx, decode_one(idx, src.bytes())));
    }

    while let Some(joined) = set.join_next().await {
        let (idx, res) = joined.map_err(|e| CollageError::Task(e.to_string()))?;
        match res {
            Ok(img) => {
                log::debug!("collage: decoded image {} ({}x{})", idx, img.width(), img.height());
                slots[idx] = Some(img);
            }
            Err(e) => {
                log::warn!("collage: {}", e);
                set.abort_all();
                return Err(e);
            }
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| {
            slot.ok_or_else(|| CollageError::Task(format!("image {idx} was never decoded")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collage::test_support::{jpeg_bytes_with_orientation, png_bytes};

    #[tokio::test]
    async fn decodes_in_input_order() {
        let sources = vec![
            ImageSource::new(png_bytes(40, 10, [255, 0, 0, 255])),
            ImageSource::new(png_bytes(5, 30, [0, 255, 0, 255])),
            ImageSource::new(png_bytes(20, 20, [0, 0, 255, 255])),
        ];
        let decoded = decode_all(&sources).await.unwrap();
        let sizes: Vec<(u32, u32)> = decoded.iter().map(|d| (d.width(), d.height())).collect();
        assert_eq!(sizes, vec![(40, 10), (5, 30), (20, 20)]);
        assert_eq!(decoded[1].rgba.get_pixel(0, 0).0, [0, 255, 0, 255]);
    }

    #[tokio::test]
    async fn corrupt_image_fails_whole_batch() {
        let sources = vec![
            ImageSource::new(png_bytes(4, 4, [0, 0, 0, 255])),
            ImageSource::new(b"definitely not an image".to_vec()),
        ];
        match decode_all(&sources).await {
            Err(CollageError::Decode { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn empty_bytes_are_a_decode_error() {
        assert!(matches!(
            decode_one(0, &[]),
            Err(CollageError::Decode { index: 0, .. })
        ));
    }

    #[test]
    fn exif_rotation_is_applied() {
        // 40x20 landscape sensor image, left half red, right half blue, tagged "rotate 90 CW"
        let bytes = jpeg_bytes_with_orientation(40, 20, 6);
        let img = decode_one(0, &bytes).unwrap();
        assert_eq!((img.width(), img.height()), (20, 40));

        // the left half ends up on top
        let top = img.rgba.get_pixel(10, 5).0;
        let bottom = img.rgba.get_pixel(10, 35).0;
        assert!(top[0] > 200 && top[2] < 60, "top should be red: {top:?}");
        assert!(bottom[2] > 200 && bottom[0] < 60, "bottom should be blue: {bottom:?}");
    }

    #[test]
    fn untagged_jpeg_keeps_its_shape() {
        let bytes = jpeg_bytes_with_orientation(40, 20, 1);
        let img = decode_one(0, &bytes).unwrap();
        assert_eq!((img.width(), img.height()), (40, 20));
    }

    #[tokio::test]
    async fn source_from_path_keeps_file_name() {
        let mut p = std::env::temp_dir();
        p.push(format!("intake_src_{}.png", std::process::id()));
        std::fs::write(&p, png_bytes(2, 2, [1, 2, 3, 255])).unwrap();

        let src = ImageSource::from_path(&p).await.unwrap();
        assert_eq!(src.name(), p.file_name().and_then(|n| n.to_str()));
        assert!(!src.is_empty());
        assert!(ImageSource::new(Vec::new()).is_empty());

        let _ = std::fs::remove_file(&p);
    }
}
