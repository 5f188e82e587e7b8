pub mod render;
pub mod scene;

pub use render::SkiaRenderer;
pub use scene::Scene;
