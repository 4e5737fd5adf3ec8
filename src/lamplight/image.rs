use std::path::Path;

use bytemuck::cast_slice;
use image::ColorType;
use winit::dpi::PhysicalSize;

use crate::error::Result;

/// 화면에 띄울 준비가 끝난 RGBA8 이미지.
///
/// `Renderer::final_image`가 빌려주는 읽기 전용 스냅샷이며, 다음 `render` 호출 전까지만 유효함.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Image {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 0xFF]; width as usize * height as usize],
        }
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    // GPU 텍스쳐에 바로 올릴 수 있는 형태
    pub fn as_bytes(&self) -> &[u8] {
        cast_slice(&self.pixels)
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        image::save_buffer_with_format(
            path,
            self.as_bytes(),
            self.width,
            self.height,
            ColorType::Rgba8,
            image::ImageFormat::Png,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_view_is_rgba_row_major() {
        let mut image = Image::new(2, 2);
        image.pixels_mut()[3] = [1, 2, 3, 4];

        assert_eq!(image.as_bytes().len(), 16);
        assert_eq!(&image.as_bytes()[12..], &[1, 2, 3, 4]);
        assert_eq!(image.pixel(1, 1), [1, 2, 3, 4]);
        assert_eq!(image.size(), PhysicalSize::new(2, 2));
    }

    #[test]
    fn png_export_round_trips_dimensions() {
        use image::GenericImageView;

        let image = Image::new(3, 2);
        let path = std::env::temp_dir().join(format!("lamplight-{}.png", std::process::id()));
        image.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (3, 2));
        let _ = std::fs::remove_file(path);
    }
}
