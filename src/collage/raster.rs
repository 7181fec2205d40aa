use image::{Rgba, RgbaImage, imageops};

use super::{CollageError, DecodedImage, GridLayout};

pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BORDER_COLOR: Rgba<u8> = Rgba([0xe0, 0xe0, 0xe0, 255]);
pub const BORDER_WIDTH: u32 = 2;

/// Draw every image into its cell on a white canvas.
///
/// Images are drawn unscaled and centered; each occupied cell then gets a
/// stroke centered on its outline. Cells past the last image stay plain white.
pub fn rasterize(images: &[DecodedImage], layout: &GridLayout) -> Result<RgbaImage, CollageError> {
    let (width, height) = layout.canvas_size()?;
    let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);

    for (idx, img) in images.iter().enumerate() {
        let idx = idx as u32;
        let (x, y) = layout.placement(idx, img.width(), img.height());
        imageops::overlay(&mut canvas, &img.rgba, i64::from(x), i64::from(y));

        let (cx, cy) = layout.cell_origin(idx);
        stroke_rect(
            &mut canvas,
            i64::from(cx),
            i64::from(cy),
            i64::from(layout.cell_width),
            i64::from(layout.cell_height),
        );
    }

    Ok(canvas)
}

// Stroke of BORDER_WIDTH centered on the rectangle edges, clipped to the canvas.
fn stroke_rect(canvas: &mut RgbaImage, x: i64, y: i64, w: i64, h: i64) {
    let half = i64::from(BORDER_WIDTH / 2);
    let bw = i64::from(BORDER_WIDTH);
    // top, bottom
    fill_rect(canvas, x - half, y - half, w + bw, bw);
    fill_rect(canvas, x - half, y + h - half, w + bw, bw);
    // left, right
    fill_rect(canvas, x - half, y - half, bw, h + bw);
    fill_rect(canvas, x + w - half, y - half, bw, h + bw);
}

fn fill_rect(canvas: &mut RgbaImage, x: i64, y: i64, w: i64, h: i64) {
    let cw = i64::from(canvas.width());
    let ch = i64::from(canvas.height());
    let x0 = x.clamp(0, cw);
    let y0 = y.clamp(0, ch);
    let x1 = (x + w).clamp(0, cw);
    let y1 = (y + h).clamp(0, ch);
    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px as u32, py as u32, BORDER_COLOR);
        }
    }
}
