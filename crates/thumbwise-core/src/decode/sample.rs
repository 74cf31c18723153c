//! Streaming box-filter downsampling of decoded rows.
//!
//! Rows are pushed top to bottom and averaged into the output as soon as a
//! band of source rows is complete, so besides the output only one row of
//! accumulators is held. Source and output sizes need not divide evenly:
//! output pixel `i` covers source columns `i * src / dst .. (i + 1) * src / dst`.

use image::DynamicImage;

use super::DecodeError;
use crate::buffer::{checked_byte_len, PixelBuffer, BYTES_PER_PIXEL};

/// Channel layout of 8-bit source rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl RowLayout {
    pub(crate) fn channels(self) -> usize {
        match self {
            RowLayout::Gray => 1,
            RowLayout::GrayAlpha => 2,
            RowLayout::Rgb => 3,
            RowLayout::Rgba => 4,
        }
    }

    fn rgba(self, px: &[u8]) -> [u8; 4] {
        match self {
            RowLayout::Gray => [px[0], px[0], px[0], 255],
            RowLayout::GrayAlpha => [px[0], px[0], px[0], px[1]],
            RowLayout::Rgb => [px[0], px[1], px[2], 255],
            RowLayout::Rgba => [px[0], px[1], px[2], px[3]],
        }
    }
}

/// Averages source rows into a smaller (or equal) RGBA8 buffer.
pub(crate) struct BoxSampler {
    layout: RowLayout,
    src_width: u32,
    src_height: u32,
    width: u32,
    height: u32,
    col_starts: Vec<u32>,
    sums: Vec<u64>,
    rows_seen: u32,
    rows_in_band: u32,
    bands_done: u32,
    out: Vec<u8>,
}

impl BoxSampler {
    /// Prepare to sample a `src` sized image down to `dst`.
    ///
    /// `dst` is clamped to `1..=src` on each axis. The output is reserved
    /// up front and fallibly.
    pub(crate) fn new(
        layout: RowLayout,
        src: (u32, u32),
        dst: (u32, u32),
    ) -> Result<Self, DecodeError> {
        let (src_width, src_height) = src;
        if src_width == 0 || src_height == 0 {
            return Err(DecodeError::CorruptedFile("Image has no pixels".to_string()));
        }

        let width = dst.0.clamp(1, src_width);
        let height = dst.1.clamp(1, src_height);
        let len = checked_byte_len(width, height).ok_or(DecodeError::OutOfMemory)?;

        let mut out = Vec::new();
        out.try_reserve_exact(len)
            .map_err(|_| DecodeError::OutOfMemory)?;

        let mut sums = Vec::new();
        sums.try_reserve_exact(width as usize * BYTES_PER_PIXEL)
            .map_err(|_| DecodeError::OutOfMemory)?;
        sums.resize(width as usize * BYTES_PER_PIXEL, 0);

        let col_starts = (0..=width)
            .map(|i| band_start(i, src_width, width))
            .collect();

        Ok(Self {
            layout,
            src_width,
            src_height,
            width,
            height,
            col_starts,
            sums,
            rows_seen: 0,
            rows_in_band: 0,
            bands_done: 0,
            out,
        })
    }

    /// Output dimensions.
    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Feed the next source row. Rows beyond the source height are ignored.
    pub(crate) fn push_row(&mut self, row: &[u8]) -> Result<(), DecodeError> {
        if self.rows_seen >= self.src_height {
            return Ok(());
        }

        let channels = self.layout.channels();
        let row_len = self.src_width as usize * channels;
        if row.len() < row_len {
            return Err(DecodeError::CorruptedFile(format!(
                "Row {} has {} bytes, expected {row_len}",
                self.rows_seen,
                row.len()
            )));
        }

        for (i, cols) in self.col_starts.windows(2).enumerate() {
            let acc = &mut self.sums[i * BYTES_PER_PIXEL..(i + 1) * BYTES_PER_PIXEL];
            for x in cols[0] as usize..cols[1] as usize {
                let px = self.layout.rgba(&row[x * channels..(x + 1) * channels]);
                for (sum, v) in acc.iter_mut().zip(px) {
                    *sum += v as u64;
                }
            }
        }

        self.rows_seen += 1;
        self.rows_in_band += 1;
        if self.rows_seen == band_start(self.bands_done + 1, self.src_height, self.height) {
            self.flush_band();
        }
        Ok(())
    }

    fn flush_band(&mut self) {
        let rows = self.rows_in_band as u64;
        for (i, cols) in self.col_starts.windows(2).enumerate() {
            let count = (rows * (cols[1] - cols[0]) as u64).max(1);
            let acc = &mut self.sums[i * BYTES_PER_PIXEL..(i + 1) * BYTES_PER_PIXEL];
            for sum in acc.iter_mut() {
                self.out.push(((*sum + count / 2) / count) as u8);
                *sum = 0;
            }
        }
        self.rows_in_band = 0;
        self.bands_done += 1;
    }

    /// Finish sampling.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::CorruptedFile` if fewer rows than the source
    /// height were pushed.
    pub(crate) fn finish(self) -> Result<PixelBuffer, DecodeError> {
        if self.rows_seen < self.src_height {
            return Err(DecodeError::CorruptedFile(format!(
                "Image ended after {} of {} rows",
                self.rows_seen, self.src_height
            )));
        }
        PixelBuffer::from_rgba(self.width, self.height, self.out)
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
    }
}

/// First source index covered by output index `index`.
fn band_start(index: u32, src: u32, dst: u32) -> u32 {
    (index as u64 * src as u64 / dst as u64) as u32
}

/// Sample a tightly packed image held in `raw`.
pub(crate) fn sample_raw(
    layout: RowLayout,
    src: (u32, u32),
    dst: (u32, u32),
    raw: &[u8],
) -> Result<PixelBuffer, DecodeError> {
    let mut sampler = BoxSampler::new(layout, src, dst)?;
    let row_len = src.0 as usize * layout.channels();
    for row in raw.chunks_exact(row_len) {
        sampler.push_row(row)?;
    }
    sampler.finish()
}

/// Sample a fully decoded image, consuming it.
///
/// 8-bit images are read in their own layout; only other sample types are
/// converted to RGBA8 first. An RGBA8 image at its own size is moved into the
/// result without copying.
pub(crate) fn sample_image(image: DynamicImage, dst: (u32, u32)) -> Result<PixelBuffer, DecodeError> {
    let src = (image.width(), image.height());
    let (layout, raw) = match image {
        DynamicImage::ImageLuma8(img) => (RowLayout::Gray, img.into_raw()),
        DynamicImage::ImageLumaA8(img) => (RowLayout::GrayAlpha, img.into_raw()),
        DynamicImage::ImageRgb8(img) => (RowLayout::Rgb, img.into_raw()),
        DynamicImage::ImageRgba8(img) => (RowLayout::Rgba, img.into_raw()),
        other => (RowLayout::Rgba, other.into_rgba8().into_raw()),
    };

    if layout == RowLayout::Rgba && dst == src {
        return PixelBuffer::from_rgba(src.0, src.1, raw)
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()));
    }
    sample_raw(layout, src, dst, &raw)
}
