//! Sculpting brush enumeration
//!
//! Brush algorithms live with the mesh collaborators; the scene only owns
//! the list of available brushes and which one is selected.

/// Brush kinds, in the order the editor lists them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BrushType {
    MaskAdd,
    MaskSubtract,
    Inflate,
    Deflate,
    #[default]
    Smooth,
    Move,
}

impl BrushType {
    /// Every brush, in editor order
    pub const ALL: [BrushType; 6] = [
        BrushType::MaskAdd,
        BrushType::MaskSubtract,
        BrushType::Inflate,
        BrushType::Deflate,
        BrushType::Smooth,
        BrushType::Move,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            BrushType::MaskAdd => "Mask Add",
            BrushType::MaskSubtract => "Mask Subtract",
            BrushType::Inflate => "Inflate",
            BrushType::Deflate => "Deflate",
            BrushType::Smooth => "Smooth",
            BrushType::Move => "Move",
        }
    }

    /// Mask brushes paint the vertex mask instead of moving vertices
    pub fn is_mask(&self) -> bool {
        matches!(self, BrushType::MaskAdd | BrushType::MaskSubtract)
    }
}
