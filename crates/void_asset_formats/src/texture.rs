//! Texture2D asset

use crate::loaders::{TextureData, TextureFormat, TextureLoader};
use void_asset::prelude::*;

/// Decoded 2D texture
#[derive(Debug)]
pub struct Texture2D {
    base: AssetBase,
    data: TextureData,
}

impl Texture2D {
    pub fn new(handle: AssetHandle, data: TextureData) -> Self {
        Self {
            base: AssetBase::new(handle),
            data,
        }
    }

    /// 1x1 opaque white, the stand-in while a texture loads
    pub fn white() -> Self {
        Self::new(AssetHandle::NULL, TextureLoader::solid_color(255, 255, 255, 255))
    }

    pub fn width(&self) -> u32 {
        self.data.width
    }

    pub fn height(&self) -> u32 {
        self.data.height
    }

    pub fn format(&self) -> TextureFormat {
        self.data.format
    }

    /// Pixel bytes, tightly packed
    pub fn pixels(&self) -> &[u8] {
        &self.data.data
    }

    pub fn data(&self) -> &TextureData {
        &self.data
    }
}

impl Asset for Texture2D {
    fn base(&self) -> &AssetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AssetBase {
        &mut self.base
    }

    fn asset_type(&self) -> AssetType {
        AssetType::Texture
    }
}

/// Loads image files; saves RGBA8 textures back as PNG or BMP
pub struct TextureSerializer;

impl AssetSerializer for TextureSerializer {
    fn serialize(&self, ctx: &SerializerContext, asset: &dyn Asset) -> AssetResult<()> {
        let texture = asset
            .downcast_ref::<Texture2D>()
            .ok_or_else(|| ctx.parse_error("asset is not a Texture2D"))?;
        let extension = ctx.extension().unwrap_or_default();
        let bytes = TextureLoader::encode(texture.data(), &extension).map_err(AssetError::UnsupportedFormat)?;
        ctx.write_bytes(&bytes)
    }

    fn try_load_data(&self, ctx: &SerializerContext) -> AssetResult<AssetRef> {
        let bytes = ctx.read_bytes()?;
        let data = TextureLoader::load(&bytes).map_err(|e| ctx.parse_error(e))?;
        log::debug!(
            "Decoded {} ({}x{} {:?})",
            ctx.path().display(),
            data.width,
            data.height,
            data.format
        );
        Ok(Arc::new(Texture2D::new(ctx.handle(), data)))
    }
}
