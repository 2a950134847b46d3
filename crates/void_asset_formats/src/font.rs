//! Font asset (.ttf, .ttc, .otf)

use void_asset::prelude::*;

/// Leading tags of the sfnt container formats
const SFNT_SIGNATURES: [[u8; 4]; 4] = [
    [0x00, 0x01, 0x00, 0x00], // TrueType
    *b"OTTO",                 // OpenType with CFF outlines
    *b"true",                 // Apple TrueType
    *b"ttcf",                 // Collection
];

/// Raw font file; glyph rasterization happens in the renderer
#[derive(Debug)]
pub struct Font {
    base: AssetBase,
    name: String,
    data: Vec<u8>,
}

impl Font {
    /// Wrap font bytes. An unrecognised signature flags the asset Invalid.
    pub fn from_bytes(handle: AssetHandle, name: impl Into<String>, data: Vec<u8>) -> Self {
        let font = Self {
            base: AssetBase::new(handle),
            name: name.into(),
            data,
        };
        if !is_sfnt(&font.data) {
            font.base.set_flag(AssetFlag::Invalid, true);
        }
        font
    }

    /// Empty stand-in used until a real font loads
    pub fn default_font() -> Self {
        Self {
            base: AssetBase::default(),
            name: "Default".to_string(),
            data: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Asset for Font {
    fn base(&self) -> &AssetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AssetBase {
        &mut self.base
    }

    fn asset_type(&self) -> AssetType {
        AssetType::Font
    }
}

pub fn is_sfnt(data: &[u8]) -> bool {
    data.get(..4)
        .map_or(false, |tag| SFNT_SIGNATURES.iter().any(|sig| sig == tag))
}

pub struct FontSerializer;

impl AssetSerializer for FontSerializer {
    fn serialize(&self, ctx: &SerializerContext, asset: &dyn Asset) -> AssetResult<()> {
        let font = asset
            .downcast_ref::<Font>()
            .ok_or_else(|| ctx.parse_error("asset is not a Font"))?;
        ctx.write_bytes(&font.data)
    }

    fn try_load_data(&self, ctx: &SerializerContext) -> AssetResult<AssetRef> {
        let data = ctx.read_bytes()?;
        let name = ctx
            .path()
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let font = Font::from_bytes(ctx.handle(), name, data);
        if !font.is_valid() {
            log::warn!("{} is not a TrueType/OpenType font", ctx.path().display());
        }
        Ok(Arc::new(font))
    }
}
