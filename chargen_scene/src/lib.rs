/*!
# CharGen Scene

Off-screen preview scene for the character-generation editor plug-in.

The scene renders a head/actor preview into its own render target, which the
UI consumes as the `"headMesh"` virtual image. Its draw passes run in the
middle of the host's frame, so every pass is bracketed by a full capture and
restore of the host's graphics pipeline state.

## Architecture

- **Plugin**: Singleton holding the logger and the shared `RenderManager`
- **RenderManager**: Render-manager lock plus setup-time collaborators
- **NifScene**: Render target lifecycle and the Begin/End render bracket
- **PipelineStateSnapshot**: Pipeline capture/restore around each bracket
- **RenderDevice / GraphicsDevice / DeviceContext**: Device collaborator traits
- **Com**: Reference-counted GPU interface handle

Backends implement the device traits over the host's D3D11 device.
*/

// Internal modules
mod error;
mod plugin;
pub mod log;
pub mod device;
pub mod camera;
pub mod scene;

// Main chargen namespace module
pub mod chargen {
    // Error types
    pub use crate::error::{Error, Result};

    // Plugin singleton
    pub use crate::plugin::Plugin;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device collaborator surface
    pub mod device {
        pub use crate::device::*;
    }

    // Camera sub-module
    pub mod camera {
        pub use crate::camera::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
