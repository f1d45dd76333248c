//! Camera module: passive camera data for the preview scene.
//!
//! The scene does NOT own cameras. The editor computes the matrices and
//! hands a camera to `NifScene::begin` / `NifScene::end` each frame.

mod camera;

pub use camera::Camera;
