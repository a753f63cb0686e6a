pub mod batch;
pub mod camera;
pub mod error;
pub mod gpu_context;
pub mod mesh;
pub mod sprite_pipeline;
pub mod texture;
pub mod vertex;

pub use batch::{DrawCall, QuadSpec, SpriteBatch};
pub use camera::{CameraUniform, ScreenCamera};
pub use error::RenderError;
pub use gpu_context::GpuContext;
pub use mesh::MeshBuffers;
pub use sprite_pipeline::SpritePipeline;
pub use texture::{BoundTexture, Texture};
pub use vertex::SpriteVertex;
