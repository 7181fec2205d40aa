// Grid geometry for the collage: uniform cells sized to the largest input,
// filled row-major by input index.

use super::{CollageError, DecodedImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl GridLayout {
    /// Layout for `count` images sharing one `cell_width` x `cell_height` cell size.
    /// `count` must be non-zero.
    pub fn for_count(count: u32, cell_width: u32, cell_height: u32) -> Self {
        debug_assert!(count > 0, "layout needs at least one image");
        let columns = ceil_sqrt(count);
        let rows = count.div_ceil(columns);
        Self {
            columns,
            rows,
            cell_width,
            cell_height,
        }
    }

    /// Layout for a set of decoded images: cell size is the max width and max height.
    pub fn for_images(images: &[DecodedImage]) -> Self {
        let cell_width = images.iter().map(DecodedImage::width).max().unwrap_or(0);
        let cell_height = images.iter().map(DecodedImage::height).max().unwrap_or(0);
        Self::for_count(images.len() as u32, cell_width, cell_height)
    }

    /// Canvas size, or an error when it does not fit in `u32`.
    pub fn canvas_size(&self) -> Result<(u32, u32), CollageError> {
        let w = self.columns.checked_mul(self.cell_width);
        let h = self.rows.checked_mul(self.cell_height);
        match (w, h) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(CollageError::Encode(format!(
                "canvas {}x{} cells of {}x{} overflows",
                self.columns, self.rows, self.cell_width, self.cell_height
            ))),
        }
    }

    /// Top-left corner of the cell for input `index`.
    pub fn cell_origin(&self, index: u32) -> (u32, u32) {
        let row = index / self.columns;
        let col = index % self.columns;
        (col * self.cell_width, row * self.cell_height)
    }

    /// Where an image of `width` x `height` is drawn when centered in cell `index`.
    pub fn placement(&self, index: u32, width: u32, height: u32) -> (u32, u32) {
        let (x, y) = self.cell_origin(index);
        let dx = self.cell_width.saturating_sub(width) / 2;
        let dy = self.cell_height.saturating_sub(height) / 2;
        (x + dx, y + dy)
    }
}

fn ceil_sqrt(n: u32) -> u32 {
    let mut root = (n as f64).sqrt() as u32;
    while root * root < n {
        root += 1;
    }
    while root > 1 && (root - 1) * (root - 1) >= n {
        root -= 1;
    }
    root.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_shape_per_count() {
        let expected = [
            (1, 1, 1),
            (2, 2, 1),
            (3, 2, 2),
            (4, 2, 2),
            (5, 3, 2),
            (6, 3, 2),
            (7, 3, 3),
            (9, 3, 3),
            (10, 4, 3),
        ];
        for (n, cols, rows) in expected {
            let l = GridLayout::for_count(n, 10, 10);
            assert_eq!((l.columns, l.rows), (cols, rows), "n={n}");
            assert!(l.columns * l.rows >= n);
            assert!(l.columns * l.rows - l.columns < n, "empty trailing row for n={n}");
        }
    }

    #[test]
    fn two_mismatched_images() {
        let images = vec![
            DecodedImage::blank(100, 200),
            DecodedImage::blank(300, 100),
        ];
        let l = GridLayout::for_images(&images);
        assert_eq!((l.columns, l.rows), (2, 1));
        assert_eq!((l.cell_width, l.cell_height), (300, 200));
        assert_eq!(l.canvas_size().unwrap(), (600, 200));
        assert_eq!(l.placement(0, 100, 200), (100, 0));
        assert_eq!(l.placement(1, 300, 100), (300, 50));
    }

    #[test]
    fn third_image_wraps_to_second_row() {
        let l = GridLayout::for_count(3, 100, 100);
        assert_eq!(l.canvas_size().unwrap(), (200, 200));
        assert_eq!(l.cell_origin(2), (0, 100));
        assert_eq!(l.placement(2, 100, 100), (0, 100));
    }

    #[test]
    fn odd_difference_rounds_down() {
        let l = GridLayout::for_count(2, 101, 50);
        assert_eq!(l.placement(1, 100, 50), (101, 0));
    }

    #[test]
    fn overflowing_canvas_is_rejected() {
        let l = GridLayout::for_count(4, u32::MAX / 2 + 1, 1);
        assert!(matches!(l.canvas_size(), Err(CollageError::Encode(_))));
    }
}
