/// Camera: low-level passive data container.
///
/// The Camera computes nothing beyond its viewport. The caller (the editor)
/// is responsible for computing and setting the view and projection
/// matrices.

use glam::Mat4;
use crate::device::Viewport;

/// Preview camera: matrices plus the size of the area it renders to.
#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    width: u32,
    height: u32,
}

impl Camera {
    /// Create a new camera with the given parameters.
    pub fn new(view: Mat4, projection: Mat4, width: u32, height: u32) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
            width,
            height,
        }
    }

    /// Identity matrices, `width` x `height` output.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, width, height)
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width / height, or 1.0 for a degenerate size.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Full-size viewport at the origin with depth range [0, 1].
    pub fn viewport(&self) -> Viewport {
        Viewport {
            top_left_x: 0.0,
            top_left_y: 0.0,
            width: self.width as f32,
            height: self.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    // ===== SETTERS (store only) =====

    /// Set the view matrix.
    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    /// Set the projection matrix.
    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }

    /// Set the output size.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
