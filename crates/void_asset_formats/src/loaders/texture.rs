//! Image decoding for PNG, JPG, BMP and HDR textures

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Pixel layout of decoded texture data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA, sRGB
    Rgba8,
    /// 32-bit float RGBA, linear
    Rgba32Float,
}

impl TextureFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::Rgba32Float => 16,
        }
    }
}

/// Decoded pixels ready for GPU upload
#[derive(Clone, Debug)]
pub struct TextureData {
    /// Raw pixel data, tightly packed rows
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureData {
    /// Bytes per row (no padding)
    pub fn bytes_per_row(&self) -> u32 {
        self.width * self.format.bytes_per_pixel()
    }
}

/// Decoder for image textures
pub struct TextureLoader;

impl TextureLoader {
    /// Decode image bytes. HDR sources stay floating point, everything
    /// else is expanded to RGBA8.
    pub fn load(data: &[u8]) -> Result<TextureData, String> {
        let img = image::load_from_memory(data).map_err(|e| format!("Failed to decode image: {}", e))?;

        let is_hdr = matches!(
            img,
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)
        );

        if is_hdr {
            let rgba = img.to_rgba32f();
            let (width, height) = rgba.dimensions();
            Ok(TextureData {
                data: bytemuck::cast_slice::<f32, u8>(rgba.as_raw().as_slice()).to_vec(),
                width,
                height,
                format: TextureFormat::Rgba32Float,
            })
        } else {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            Ok(TextureData {
                data: rgba.into_raw(),
                width,
                height,
                format: TextureFormat::Rgba8,
            })
        }
    }

    /// Encode RGBA8 pixels for the given file extension (png or bmp)
    pub fn encode(texture: &TextureData, extension: &str) -> Result<Vec<u8>, String> {
        let format = match extension {
            "png" => ImageFormat::Png,
            "bmp" => ImageFormat::Bmp,
            other => return Err(format!("Cannot encode textures as .{}", other)),
        };
        if texture.format != TextureFormat::Rgba8 {
            return Err("Only RGBA8 textures can be encoded".to_string());
        }

        let img = image::RgbaImage::from_raw(texture.width, texture.height, texture.data.clone())
            .ok_or_else(|| "Pixel data does not match texture size".to_string())?;

        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .map_err(|e| format!("Failed to encode image: {}", e))?;
        Ok(bytes)
    }

    /// Create a 1x1 solid color texture
    pub fn solid_color(r: u8, g: u8, b: u8, a: u8) -> TextureData {
        TextureData {
            data: vec![r, g, b, a],
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8,
        }
    }

    /// Create a checkerboard pattern texture
    pub fn checkerboard(size: u32, tile_size: u32, color1: [u8; 4], color2: [u8; 4]) -> TextureData {
        let tile_size = tile_size.max(1);
        let mut data = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let color = if (x / tile_size + y / tile_size) % 2 == 0 {
                    color1
                } else {
                    color2
                };
                data.extend_from_slice(&color);
            }
        }

        TextureData {
            data,
            width: size,
            height: size,
            format: TextureFormat::Rgba8,
        }
    }
}
