#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// Geometry handed to the renderer as one vertex buffer.
pub trait Layer {
    fn id(&self) -> LayerId;
    fn vertex_count(&self) -> usize;
}
