// Collage compositor: turns the ordered photo slots of one intake into a single
// upload. Public API:
//   - compose(&[Option<ImageSource>]) -> Result<Vec<u8>, CollageError>
//   - GridLayout, DecodedImage, ImageSource for callers that need the pieces
//
// One present photo is passed through untouched. Two or more are decoded in
// parallel, tiled on a grid of uniform cells and re-encoded as JPEG.

mod decode;
mod encode;
mod error;
mod layout;
mod raster;

pub use decode::{DecodedImage, ImageSource, decode_all};
pub use encode::{JPEG_QUALITY, encode_jpeg};
pub use error::CollageError;
pub use layout::GridLayout;
pub use raster::rasterize;

pub async fn compose(images: &[Option<ImageSource>]) -> Result<Vec<u8>, CollageError> {
    let present: Vec<ImageSource> = images.iter().flatten().cloned().collect();

    match present.len() {
        0 => Err(CollageError::NoImages),
        1 => {
            log::debug!("collage: single image, passing {} bytes through", present[0].len());
            Ok(present[0].bytes().to_vec())
        }
        n => {
            let decoded = decode_all(&present).await?;
            let layout = GridLayout::for_images(&decoded);
            log::info!(
                "collage: {} images on {}x{} grid, cell {}x{}",
                n,
                layout.columns,
                layout.rows,
                layout.cell_width,
                layout.cell_height
            );
            tokio::task::spawn_blocking(move || {
                let canvas = rasterize(&decoded, &layout)?;
                encode_jpeg(&canvas, JPEG_QUALITY)
            })
            .await
            .map_err(|e| CollageError::Task(e.to_string()))?
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{jpeg_bytes_with_orientation, png_bytes};
    use super::*;

    #[tokio::test]
    async fn no_present_images() {
        let res = compose(&[None, None]).await;
        assert!(matches!(res, Err(CollageError::NoImages)));
        assert!(matches!(compose(&[]).await, Err(CollageError::NoImages)));
    }

    #[tokio::test]
    async fn single_image_passes_through_byte_for_byte() {
        // not even a valid image: a single source is never decoded
        let raw = b"\x01\x02opaque".to_vec();
        let out = compose(&[None, Some(ImageSource::new(raw.clone())), None])
            .await
            .unwrap();
        assert_eq!(out, raw);
    }

    #[tokio::test]
    async fn pair_becomes_side_by_side_jpeg() {
        let a = ImageSource::new(png_bytes(100, 200, [255, 0, 0, 255]));
        let b = ImageSource::new(png_bytes(300, 100, [0, 0, 255, 255]));
        let out = compose(&[Some(a), None, Some(b)]).await.unwrap();

        assert_eq!(
            image::guess_format(&out).unwrap(),
            image::ImageFormat::Jpeg
        );
        let img = image::load_from_memory(&out).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (600, 200));

        let left = img.get_pixel(150, 100).0;
        assert!(left[0] > 200 && left[2] < 60, "cell 0 should be red: {left:?}");
        let right = img.get_pixel(450, 100).0;
        assert!(right[2] > 200 && right[0] < 60, "cell 1 should be blue: {right:?}");
        let gap = img.get_pixel(40, 100).0;
        assert!(gap.iter().all(|c| *c > 230), "padding should be white: {gap:?}");
    }

    #[tokio::test]
    async fn placement_follows_slot_order() {
        // the large image decodes slowest; it must still land in the first cell
        let big = ImageSource::new(png_bytes(400, 400, [0, 255, 0, 255]));
        let small = ImageSource::new(png_bytes(4, 4, [255, 0, 0, 255]));
        let out = compose(&[Some(big), Some(small.clone()), Some(small)])
            .await
            .unwrap();
        let img = image::load_from_memory(&out).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (800, 800));
        let first = img.get_pixel(200, 200).0;
        assert!(first[1] > 200 && first[0] < 60, "cell 0 should be green: {first:?}");
    }

    #[tokio::test]
    async fn rotated_camera_photo_sizes_the_grid_upright() {
        let portrait = ImageSource::new(jpeg_bytes_with_orientation(40, 20, 6));
        let square = ImageSource::new(png_bytes(10, 10, [0, 0, 0, 255]));
        let out = compose(&[Some(portrait), Some(square)]).await.unwrap();
        let img = image::load_from_memory(&out).unwrap();
        // cell 20x40, two columns
        assert_eq!((img.width(), img.height()), (40, 40));
    }

    #[tokio::test]
    async fn corrupt_member_voids_collage() {
        let good = ImageSource::new(png_bytes(8, 8, [0, 0, 0, 255]));
        let bad = ImageSource::new(Vec::new());
        let res = compose(&[Some(good), Some(bad)]).await;
        assert!(matches!(res, Err(CollageError::Decode { index: 1, .. })));
    }
}
