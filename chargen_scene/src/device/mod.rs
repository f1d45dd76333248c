/// Device module - GPU object handles and the device collaborator surface

pub mod com;
pub mod types;
pub mod graphics_device;
#[cfg(test)]
pub mod mock_device;

pub use com::*;
pub use types::*;
pub use graphics_device::*;
