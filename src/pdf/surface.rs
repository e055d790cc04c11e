//! Drawing surface pages are rendered into

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};

use super::types::ContainerSize;

/// RGB raster with a separate client (display) size.
///
/// The client size follows the container the reader is mounted in; the
/// backing store is resized to each rendered page's viewport.
#[derive(Clone)]
pub struct Surface {
    client_width: u32,
    client_height: u32,
    width: u32,
    height: u32,
    /// Raw RGB pixel data (3 bytes per pixel)
    pixels: Vec<u8>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("client_width", &self.client_width)
            .field("client_height", &self.client_height)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Surface {
    pub const BYTES_PER_PIXEL: usize = 3;

    /// New surface with both client size and backing store set to the
    /// container's size
    #[must_use]
    pub fn for_container(container: ContainerSize) -> Self {
        let mut surface = Self {
            client_width: container.width,
            client_height: container.height,
            width: 0,
            height: 0,
            pixels: Vec::new(),
        };
        surface.resize_backing_store(container.width, container.height);
        surface
    }

    pub fn client_width(&self) -> u32 {
        self.client_width
    }

    pub fn client_height(&self) -> u32 {
        self.client_height
    }

    /// Backing store width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Backing store height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Row stride of the backing store in bytes
    pub fn stride(&self) -> usize {
        self.width as usize * Self::BYTES_PER_PIXEL
    }

    /// Container was resized
    pub fn set_client_size(&mut self, width: u32, height: u32) {
        self.client_width = width;
        self.client_height = height;
    }

    /// Resize the backing store, clearing it to white
    pub fn resize_backing_store(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels
            .resize(width as usize * height as usize * Self::BYTES_PER_PIXEL, 0xFF);
    }

    /// Copy an RGB raster into the top-left corner of the backing store.
    ///
    /// Anything outside the store is clipped.
    pub fn blit_rgb(&mut self, src: &[u8], src_width: u32, src_height: u32) {
        let stride = src_width as usize * Self::BYTES_PER_PIXEL;
        self.blit_samples(src, src_width, src_height, stride, Self::BYTES_PER_PIXEL);
    }

    /// Copy interleaved samples with `channels` bytes per pixel and
    /// `stride` bytes per row. The first three channels are taken as RGB;
    /// alpha and padding are dropped. Clipped like `blit_rgb`.
    pub fn blit_samples(
        &mut self,
        src: &[u8],
        src_width: u32,
        src_height: u32,
        stride: usize,
        channels: usize,
    ) {
        if channels < Self::BYTES_PER_PIXEL {
            return;
        }
        let copy_width = src_width.min(self.width) as usize;
        let copy_height = src_height.min(self.height) as usize;
        let dst_stride = self.stride();
        let dst_row_bytes = copy_width * Self::BYTES_PER_PIXEL;
        let src_row_bytes = copy_width * channels;

        for y in 0..copy_height {
            let src_start = y * stride;
            let Some(src_row) = src.get(src_start..src_start + src_row_bytes) else {
                break;
            };
            let dst_start = y * dst_stride;
            let dst_row = &mut self.pixels[dst_start..dst_start + dst_row_bytes];

            if channels == Self::BYTES_PER_PIXEL {
                dst_row.copy_from_slice(src_row);
            } else {
                for (dst, px) in dst_row
                    .chunks_exact_mut(Self::BYTES_PER_PIXEL)
                    .zip(src_row.chunks_exact(channels))
                {
                    dst.copy_from_slice(&px[..Self::BYTES_PER_PIXEL]);
                }
            }
        }
    }

    /// Write the backing store as an 8-bit RGB PNG
    pub fn write_png(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("creating {path:?}"))?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), self.width, self.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().context("writing PNG header")?;
        writer
            .write_image_data(&self.pixels)
            .context("writing PNG data")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_container_sizes_backing_store() {
        let surface = Surface::for_container(ContainerSize::new(4, 3));
        assert_eq!(surface.client_width(), 4);
        assert_eq!(surface.client_height(), 3);
        assert_eq!((surface.width(), surface.height()), (4, 3));
        assert_eq!(surface.pixels().len(), 4 * 3 * 3);
    }

    #[test]
    fn resize_keeps_client_size() {
        let mut surface = Surface::for_container(ContainerSize::new(800, 600));
        surface.resize_backing_store(800, 1200);
        assert_eq!(surface.client_width(), 800);
        assert_eq!(surface.height(), 1200);
        assert_eq!(surface.pixels().len(), 800 * 1200 * 3);
    }

    #[test]
    fn blit_clips_to_store() {
        let mut surface = Surface::for_container(ContainerSize::new(2, 2));
        // 3x1 source: red, green, blue
        let src = [255, 0, 0, 0, 255, 0, 0, 0, 255];
        surface.blit_rgb(&src, 3, 1);

        assert_eq!(&surface.pixels()[0..6], &[255, 0, 0, 0, 255, 0]);
        // second row untouched
        assert_eq!(&surface.pixels()[6..12], &[0xFF; 6]);
    }

    #[test]
    fn blit_samples_drops_alpha_and_row_padding() {
        let mut surface = Surface::for_container(ContainerSize::new(2, 2));
        // 2x2 RGBA source, rows padded to 10 bytes
        let src = [
            1, 2, 3, 9, 4, 5, 6, 9, 0, 0, //
            7, 8, 9, 9, 10, 11, 12, 9, 0, 0,
        ];
        surface.blit_samples(&src, 2, 2, 10, 4);

        assert_eq!(surface.pixels(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn blit_samples_ignores_short_rows() {
        let mut surface = Surface::for_container(ContainerSize::new(2, 2));
        surface.blit_samples(&[1, 2, 3, 4, 5, 6], 2, 2, 6, 3);

        assert_eq!(&surface.pixels()[0..6], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(&surface.pixels()[6..12], &[0xFF; 6]);
    }

    #[test]
    fn write_png_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        let surface = Surface::for_container(ContainerSize::new(3, 2));
        surface.write_png(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
