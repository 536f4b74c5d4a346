//! Renderer Actor: Dedicated thread that paints the terminal.
//!
//! This actor owns the output surface. Each frame it snapshots the component
//! registry, repaints the components that are dirty (or all of them on a
//! full refresh), flushes once, then sleeps out the rest of the frame
//! budget. It is the only writer to the terminal.

use super::engine::Shared;
use crate::error::EngineError;
use crate::terminal::Surface;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, trace, warn};

/// Render statistics for debugging/profiling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Total frames rendered.
    pub frames: u64,
    /// Total `draw` calls across all frames.
    pub components_drawn: u64,
    /// Frames that cleared and repainted the whole window.
    pub full_refreshes: u64,
    /// Frames that took longer than the frame budget.
    pub overruns: u64,
    /// Average frame time in microseconds.
    pub avg_frame_us: u64,
    /// Last frame time in microseconds.
    pub last_frame_us: u64,
}

impl RenderStats {
    pub(crate) fn record(&mut self, report: FrameReport, elapsed: Duration, overrun: bool) {
        self.frames += 1;
        self.components_drawn += report.drawn as u64;
        if report.full_refresh {
            self.full_refreshes += 1;
        }
        if overrun {
            self.overruns += 1;
        }
        self.last_frame_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        // Smoothed average
        if self.avg_frame_us == 0 {
            self.avg_frame_us = self.last_frame_us;
        } else {
            self.avg_frame_us = (self.avg_frame_us * 15 + self.last_frame_us) / 16;
        }
    }
}

/// What a single frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Number of components whose `draw` ran.
    pub drawn: usize,
    /// Whether the frame cleared the window first.
    pub full_refresh: bool,
}

/// Paint one frame onto `surface`.
///
/// Components are drawn in registration order from a snapshot, so the
/// registry lock is never held while user code runs.
pub(crate) fn render_frame(
    shared: &Shared,
    surface: &mut dyn Surface,
    viewport: Option<(u16, u16)>,
) -> FrameReport {
    let components = shared.snapshot();
    let full_refresh = shared.take_window_refresh();

    if full_refresh {
        surface.clear_all();
    }

    let mut drawn = 0;
    let mut refresh_next = false;
    for component in &components {
        let state = component.state();
        refresh_next |= state.requires_window_refresh();

        let dirty = state.take_requires_update();
        if full_refresh || dirty {
            state.clear_window_refresh();
            component.draw(surface);
            drawn += 1;
        }
    }

    if refresh_next {
        shared.trigger_window_refresh();
    }

    if let Some((width, height)) = viewport {
        surface.set_viewport_size(width, height);
    }
    surface.set_cursor_position(0, 0);
    surface.reset_style();

    if let Err(e) = surface.present() {
        warn!(error = %e, "failed to present frame");
    }

    FrameReport {
        drawn,
        full_refresh,
    }
}

/// Renderer actor that paces frames on its own thread.
pub(crate) struct RendererActor {
    /// Handle to the render thread.
    handle: Option<JoinHandle<()>>,
}

impl RendererActor {
    /// Spawn the render thread.
    ///
    /// The thread runs until the engine's cancel token fires, then clears
    /// the surface one last time.
    pub(crate) fn spawn(
        shared: Arc<Shared>,
        mut surface: Box<dyn Surface>,
        frame_interval: Duration,
        viewport: Option<(u16, u16)>,
    ) -> Result<Self, EngineError> {
        let name = "renderlite-render";
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                Self::run_loop(&shared, surface.as_mut(), frame_interval, viewport);
            })
            .map_err(|e| EngineError::spawn(name, e))?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the render thread to finish.
    pub(crate) fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("render thread panicked");
            }
        }
    }

    /// Main render loop.
    fn run_loop(
        shared: &Shared,
        surface: &mut dyn Surface,
        frame_interval: Duration,
        viewport: Option<(u16, u16)>,
    ) {
        let cancel = shared.cancel_token();

        loop {
            let frame_start = Instant::now();
            let report = render_frame(shared, surface, viewport);

            let elapsed = frame_start.elapsed();
            let overrun = elapsed > frame_interval;
            if overrun {
                trace!(elapsed = ?elapsed, "frame over budget");
            }
            shared.record_frame(report, elapsed, overrun);

            // A late frame is not skipped; the next one just starts late.
            if !cancel.sleep(frame_interval.saturating_sub(elapsed)) {
                break;
            }
        }

        surface.clear_all();
        surface.set_cursor_position(0, 0);
        if let Err(e) = surface.present() {
            warn!(error = %e, "failed to clear surface on shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentHandle, Position};
    use crate::testing::{Probe, RecordingSurface, SurfaceOp};

    fn shared_with(labels: &[&str]) -> (Arc<Shared>, Vec<ComponentHandle>) {
        let shared = Arc::new(Shared::for_tests());
        let handles: Vec<_> = labels
            .iter()
            .enumerate()
            .map(|(row, label)| {
                let y = u16::try_from(row).unwrap();
                ComponentHandle::spawn(Probe::new(label), Position::new(0, y), false).unwrap()
            })
            .collect();
        for h in &handles {
            shared.add_component(h);
        }
        (shared, handles)
    }

    #[test]
    fn test_first_frame_is_full_refresh() {
        let (shared, _handles) = shared_with(&["a", "b"]);
        let (mut surface, ops) = RecordingSurface::new();

        let report = render_frame(&shared, &mut surface, Some((100, 30)));
        assert!(report.full_refresh);
        assert_eq!(report.drawn, 2);
        assert_eq!(
            ops.snapshot(),
            vec![
                SurfaceOp::Clear,
                SurfaceOp::Cursor(0, 0),
                SurfaceOp::Print("a".into()),
                SurfaceOp::Cursor(0, 1),
                SurfaceOp::Print("b".into()),
                SurfaceOp::Viewport(100, 30),
                SurfaceOp::Cursor(0, 0),
                SurfaceOp::Reset,
                SurfaceOp::Present,
            ]
        );
    }

    #[test]
    fn test_only_dirty_components_redraw() {
        let (shared, handles) = shared_with(&["a", "b", "c"]);
        let (mut surface, ops) = RecordingSurface::new();
        render_frame(&shared, &mut surface, None);

        let report = render_frame(&shared, &mut surface, None);
        assert_eq!(report, FrameReport::default());

        handles[1].state().mark_dirty();
        let report = render_frame(&shared, &mut surface, None);
        assert_eq!(report.drawn, 1);
        assert!(!report.full_refresh);
        assert_eq!(ops.prints_of("b"), 2);
        assert_eq!(ops.prints_of("a"), 1);
    }

    #[test]
    fn test_window_refresh_request_repaints_everything_next_frame() {
        let (shared, handles) = shared_with(&["a", "b"]);
        let (mut surface, ops) = RecordingSurface::new();
        render_frame(&shared, &mut surface, None);

        handles[0].state().set_position(Position::new(5, 5));
        let report = render_frame(&shared, &mut surface, None);
        assert!(!report.full_refresh);
        assert_eq!(report.drawn, 1);

        let report = render_frame(&shared, &mut surface, None);
        assert!(report.full_refresh);
        assert_eq!(report.drawn, 2);
        assert_eq!(ops.count(&SurfaceOp::Clear), 2);

        let report = render_frame(&shared, &mut surface, None);
        assert_eq!(report, FrameReport::default());
    }

    #[test]
    fn test_render_thread_clears_on_shutdown() {
        let (shared, _handles) = shared_with(&["a"]);
        let (surface, ops) = RecordingSurface::new();

        let actor = RendererActor::spawn(
            Arc::clone(&shared),
            Box::new(surface),
            Duration::from_millis(5),
            None,
        )
        .unwrap();
        assert!(ops.wait_for(&SurfaceOp::Present, 3, Duration::from_secs(5)));

        shared.cancel_token().cancel();
        actor.join();

        let log = ops.snapshot();
        assert_eq!(log[log.len() - 3..], [
            SurfaceOp::Clear,
            SurfaceOp::Cursor(0, 0),
            SurfaceOp::Present,
        ]);
        assert!(shared.render_stats().frames >= 3);
    }

    #[test]
    fn test_pacing_respects_frame_interval() {
        let (shared, _handles) = shared_with(&["a"]);
        let (surface, ops) = RecordingSurface::new();

        let start = Instant::now();
        let actor = RendererActor::spawn(
            Arc::clone(&shared),
            Box::new(surface),
            Duration::from_millis(20),
            None,
        )
        .unwrap();
        assert!(ops.wait_for(&SurfaceOp::Present, 4, Duration::from_secs(5)));
        let elapsed = start.elapsed();

        shared.cancel_token().cancel();
        actor.join();

        // Four frames need at least three full intervals between them.
        assert!(elapsed >= Duration::from_millis(60));
    }
}
