//! Scene configuration
//!
//! Plain data supplied by the host: the preview background colour, the
//! brush shader location and the name of the virtual image the UI binds to.

/// Virtual image name the UI uses to reference the preview texture
pub const HEAD_MESH_IMAGE_NAME: &str = "headMesh";

/// Brush shader source, relative to the host's Data folder
pub const BRUSH_SHADER_PATH: &str = "SKSE/Plugins/CharGen/brush.hlsl";

/// RGBA background colour, each channel in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl BackgroundColor {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Copy with every channel clamped to [0, 1] (NaN becomes 0)
    pub fn clamped(&self) -> Self {
        fn unit(v: f32) -> f32 {
            if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
        }
        Self::new(unit(self.r), unit(self.g), unit(self.b), unit(self.a))
    }

    /// Channels in clear order: R, G, B, A
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for BackgroundColor {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl From<[f32; 4]> for BackgroundColor {
    fn from(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

/// Scene configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Colour the preview target is cleared to at the start of each bracket
    pub background: BackgroundColor,
    /// Brush shader source path (virtual file system)
    pub shader_path: String,
    /// Name under which the colour target is registered with the image loader
    pub virtual_image_name: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: BackgroundColor::default(),
            shader_path: BRUSH_SHADER_PATH.to_string(),
            virtual_image_name: HEAD_MESH_IMAGE_NAME.to_string(),
        }
    }
}

/// Per-setup parameters (caller supplied, no defaults)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneInitParams {
    pub viewport_width: u32,
    pub viewport_height: u32,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
