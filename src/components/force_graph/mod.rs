mod component;
pub mod interaction;
pub mod loader;
pub mod paint;
mod render;
mod state;
pub mod types;

pub use component::ForceGraphCanvas;
