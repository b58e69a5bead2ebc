use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use image::{RgbaImage, imageops::FilterType};

use crate::{
    error::{Result, ViewerError},
    render::{GraphicsDevice, TextureId},
};

/// Decodes an image file and forces it to opaque RGBA.
///
/// Sources with an alpha channel lose it: every texel is read as RGB first.
pub fn decode_rgb(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path).map_err(|e| ViewerError::asset(path, e))?;
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(ViewerError::asset(path, "image has no pixels"));
    }
    Ok(image::DynamicImage::ImageRgb8(rgb).to_rgba8())
}

/// Builds the full mip chain for `base`, down to a 1x1 level.
pub fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let (width, height) = base.dimensions();
    let mut levels = Vec::with_capacity(mip_level_count(width, height) as usize);
    levels.push(base);
    loop {
        let (width, height) = levels[levels.len() - 1].dimensions();
        if width == 1 && height == 1 {
            break;
        }
        let next = image::imageops::resize(
            &levels[levels.len() - 1],
            (width / 2).max(1),
            (height / 2).max(1),
            FilterType::Triangle,
        );
        levels.push(next);
    }
    levels
}

/// Number of levels [`mip_chain`] produces for a `width` x `height` image.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

#[derive(Clone, Debug)]
enum CacheEntry {
    Ready(TextureId),
    /// Remembered so a broken file is only reported once.
    Failed(String),
}

/// Uploaded textures keyed by their resolved file path.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<PathBuf, CacheEntry>,
    uploads: usize,
}

impl TextureCache {
    /// Returns the texture for `path`, decoding and uploading it on first use.
    pub fn get<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        path: &Path,
    ) -> Result<TextureId> {
        match self.entries.get(path) {
            Some(CacheEntry::Ready(id)) => {
                log::debug!("texture cache hit for {path:?}");
                return Ok(*id);
            }
            Some(CacheEntry::Failed(reason)) => {
                return Err(ViewerError::asset(path, reason));
            }
            None => {}
        }

        match Self::load(device, path) {
            Ok(id) => {
                self.uploads += 1;
                self.entries.insert(path.to_path_buf(), CacheEntry::Ready(id));
                Ok(id)
            }
            Err(e) => {
                log::warn!("Texture {path:?} could not be loaded, drawing untextured: {e}");
                self.entries
                    .insert(path.to_path_buf(), CacheEntry::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn load<D: GraphicsDevice + ?Sized>(device: &mut D, path: &Path) -> Result<TextureId> {
        let levels = mip_chain(decode_rgb(path)?);
        let label = path.to_string_lossy();
        device.create_texture(&label, &levels)
    }

    /// Number of textures that were actually uploaded.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
