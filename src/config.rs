use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Texture units handed out to shadow maps. Units below `texture_units_offset`
/// belong to material textures; cube depth maps start at
/// `texture_units_offset` and 2D depth maps start at `plane_shadow_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TextureUnitLayout {
    pub texture_units_offset: u32,
    pub plane_shadow_offset: u32,
    pub max_plane_shadows: u32,
}

impl Default for TextureUnitLayout {
    fn default() -> Self {
        Self {
            texture_units_offset: 8,
            plane_shadow_offset: 13,
            max_plane_shadows: 8,
        }
    }
}

impl TextureUnitLayout {
    pub fn cube_capacity(&self) -> u32 {
        self.plane_shadow_offset.saturating_sub(self.texture_units_offset)
    }

    pub fn plane_capacity(&self) -> u32 {
        self.max_plane_shadows
    }

    /// Unit for the `index`-th cube depth map, or `None` past the range.
    pub fn cube_unit(&self, index: u32) -> Option<u32> {
        (index < self.cube_capacity()).then(|| self.texture_units_offset + index)
    }

    /// Unit for the `index`-th 2D depth map, or `None` past the range.
    pub fn plane_unit(&self, index: u32) -> Option<u32> {
        (index < self.plane_capacity()).then(|| self.plane_shadow_offset + index)
    }
}

/// Storage-buffer binding points, shared with the PBR shader source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LightBufferBindings {
    pub directional: u32,
    pub point: u32,
    pub spot: u32,
}

impl Default for LightBufferBindings {
    fn default() -> Self {
        Self {
            directional: 1,
            point: 2,
            spot: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Edge length in texels of every shadow map (cube faces included).
    pub shadow_resolution: u32,
    pub bindings: LightBufferBindings,
    pub units: TextureUnitLayout,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            shadow_resolution: 4096,
            bindings: LightBufferBindings::default(),
            units: TextureUnitLayout::default(),
        }
    }
}

impl LightingConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shadow_resolution == 0 {
            return Err(ConfigError::Invalid("shadow_resolution must be non-zero".into()));
        }
        if self.units.plane_shadow_offset <= self.units.texture_units_offset {
            return Err(ConfigError::Invalid(format!(
                "plane_shadow_offset ({}) must be above texture_units_offset ({})",
                self.units.plane_shadow_offset, self.units.texture_units_offset
            )));
        }
        let b = self.bindings;
        if b.directional == b.point || b.directional == b.spot || b.point == b.spot {
            return Err(ConfigError::Invalid(format!(
                "light buffer bindings must be distinct, got {} / {} / {}",
                b.directional, b.point, b.spot
            )));
        }
        Ok(())
    }
}
