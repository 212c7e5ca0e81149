use crate::context::ScopeContext;
use crate::types::RenderFrame;
use std::sync::Arc;

/// Result of one render tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// A fresh frame was pulled from the buffers.
    Updated,
    /// Paused: the previous frame is kept as it was.
    Held,
}

/// Pulls the visible window out of the shared buffers once per tick.
///
/// Holds only the last frame it produced, which is what a paused display
/// keeps showing.
pub struct Renderer {
    ctx: Arc<ScopeContext>,
    frame: RenderFrame,
}

impl Renderer {
    pub fn new(ctx: Arc<ScopeContext>) -> Self {
        let frame = RenderFrame {
            ch0: Vec::new(),
            ch1: Vec::new(),
            vertical_range: ctx.view.vertical_range(),
            window_width: ctx.view.window_width(),
        };
        Self { ctx, frame }
    }

    pub fn tick(&mut self) -> Tick {
        let view = self.ctx.view.snapshot();
        if view.paused {
            return Tick::Held;
        }
        let (ch0, ch1) = self.ctx.buffers.tail(view.window_width);
        self.frame = RenderFrame {
            ch0,
            ch1,
            vertical_range: view.vertical_range,
            window_width: view.window_width,
        };
        Tick::Updated
    }

    /// The most recently rendered frame. Empty until the first unpaused tick.
    pub fn frame(&self) -> &RenderFrame {
        &self.frame
    }

    pub fn context(&self) -> &Arc<ScopeContext> {
        &self.ctx
    }
}
