//! Hand-off point between the engine and whatever draws the particles.

/// Implemented by renderers that consume the particle buffer once per frame.
pub trait ParticleSink {
    fn name(&self) -> &str;

    /// Receives the particle radius and interleaved `[x0, y0, x1, y1, ...]` positions.
    fn upload(&mut self, radius: f32, positions: &[f32]);

    /// Issues the draw for `count` particles after an upload.
    fn draw(&mut self, _count: usize) {}
}

/// Sink that discards everything; used for headless runs.
#[derive(Debug, Default)]
pub struct NoopSink;

impl NoopSink {
    pub fn new() -> Self {
        Self
    }
}

impl ParticleSink for NoopSink {
    fn name(&self) -> &str {
        "headless-noop"
    }

    fn upload(&mut self, _radius: f32, _positions: &[f32]) {}
}
