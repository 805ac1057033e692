use crate::grid::{LightGrid, RenderProperties, SnapshotHandler};
use crate::scene::{SimulationLayout, SimulationSize};
use crate::tracer::{trace, CancellationToken};
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::sync::{Arc, Mutex};

/// Work-sizing knobs. The defaults match interactive editing: a tiny
/// low-quality batch while a gesture is in progress, and a deep
/// anti-aliased accumulation once the scene settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorSettings {
    /// Segments in the single low-quality batch traced during a gesture.
    pub interactive_segments_to_trace: usize,
    /// Total segments across all batches of a final pass.
    pub final_segments_to_trace: u64,
    /// Segments per final-pass tracer job.
    pub standard_tracer_size: usize,
}

impl Default for SimulatorSettings {
    fn default() -> SimulatorSettings {
        SimulatorSettings {
            interactive_segments_to_trace: 200,
            final_segments_to_trace: 10_000_000,
            standard_tracer_size: 100_000,
        }
    }
}

/// Folds the user-facing exposure slider and the light count into the
/// grid's brightness coefficient, keeping images comparable across segment
/// budgets and scene sizes.
fn effective_exposure(exposure: f64, light_count: usize) -> f64 {
    f64::exp(1.0 + 10.0 * exposure) * light_count as f64
}

struct Session {
    layout: Option<Arc<SimulationLayout>>,
    cancel: CancellationToken,
    exposure: f64,
    segments_remaining: u64,
}

struct SimulatorInner {
    size: SimulationSize,
    settings: SimulatorSettings,
    grid: LightGrid,
    orchestration_pool: ThreadPool,
    tracer_pool: ThreadPool,
    session: Mutex<Session>,
}

/// Drives the whole simulation: owns the grid, a serial orchestration pool
/// for session control, and a tracer pool one thread wide per core.
///
/// `restart`, `stop` and `set_exposure` only post orchestration tasks and
/// return immediately; in-flight tracers are never joined, just cancelled,
/// and the grid's layout-version gate swallows anything they still deliver.
pub struct Simulator {
    inner: Arc<SimulatorInner>,
}

impl Simulator {
    pub fn new(
        size: SimulationSize,
        initial_exposure: f64,
        settings: SimulatorSettings,
        snapshot_handler: SnapshotHandler,
    ) -> Result<Simulator, ThreadPoolBuildError> {
        let orchestration_pool = ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|_| "light-orchestration".into())
            .build()?;
        let tracer_pool = ThreadPoolBuilder::new()
            .thread_name(|i| format!("light-tracer-{i}"))
            .build()?;
        let grid = LightGrid::new(
            size.width,
            size.height,
            effective_exposure(initial_exposure, 0),
            snapshot_handler,
        );
        Ok(Simulator {
            inner: Arc::new(SimulatorInner {
                size,
                settings,
                grid,
                orchestration_pool,
                tracer_pool,
                session: Mutex::new(Session {
                    layout: None,
                    cancel: CancellationToken::new(),
                    exposure: initial_exposure,
                    segments_remaining: 0,
                }),
            }),
        })
    }

    /// Supersedes whatever is running with a new scene. With `interactive`
    /// a single small low-quality batch is traced for responsiveness;
    /// otherwise a full final pass is scheduled.
    pub fn restart(&self, layout: SimulationLayout, interactive: bool) {
        let inner = Arc::clone(&self.inner);
        let layout = Arc::new(layout);
        self.inner
            .orchestration_pool
            .spawn(move || inner.begin_session(layout, interactive));
    }

    /// Cancels all tracing. The grid keeps its accumulation.
    pub fn stop(&self) {
        let inner = Arc::clone(&self.inner);
        self.inner.orchestration_pool.spawn(move || {
            let mut session = inner.session.lock().unwrap();
            session.cancel.cancel();
            session.segments_remaining = 0;
            debug!("simulation stopped");
        });
    }

    /// Changes the exposure and re-emits a snapshot over the existing
    /// accumulation; no tracing is disturbed.
    pub fn set_exposure(&self, exposure: f64) {
        let inner = Arc::clone(&self.inner);
        self.inner.orchestration_pool.spawn(move || {
            let light_count = {
                let mut session = inner.session.lock().unwrap();
                session.exposure = exposure;
                session
                    .layout
                    .as_ref()
                    .map(|layout| layout.lights.len())
                    .unwrap_or(0)
            };
            inner.grid.set_render_properties(RenderProperties {
                exposure: effective_exposure(exposure, light_count),
            });
        });
    }
}

impl SimulatorInner {
    /// Runs on the orchestration pool. Cancels the previous session and
    /// dispatches the new one.
    fn begin_session(self: Arc<Self>, layout: Arc<SimulationLayout>, interactive: bool) {
        let cancel = CancellationToken::new();
        let exposure = {
            let mut session = self.session.lock().unwrap();
            session.cancel.cancel();
            session.cancel = cancel.clone();
            session.layout = Some(Arc::clone(&layout));
            session.segments_remaining = 0;
            session.exposure
        };
        debug!(
            "session restart: layout v{}, {} lights, interactive={interactive}",
            layout.version,
            layout.lights.len()
        );

        self.grid.set_render_properties(RenderProperties {
            exposure: effective_exposure(exposure, layout.lights.len()),
        });

        // Gate out the cancelled session's stragglers before clearing the
        // sums; anything they deliver from here on is version-rejected.
        self.grid.advance_layout_version(layout.version);

        if layout.lights.is_empty() {
            // Nothing to trace; present the black frame immediately.
            self.grid.reset(true);
            return;
        }

        // Keep the previous image on screen until the first batch lands.
        self.grid.reset(false);

        if interactive {
            self.spawn_interactive_tracer(layout, cancel);
        } else {
            {
                let mut session = self.session.lock().unwrap();
                session.segments_remaining = self.settings.final_segments_to_trace;
            }
            for _ in 0..self.tracer_pool.current_num_threads() {
                Arc::clone(&self).spawn_final_tracer(Arc::clone(&layout), cancel.clone());
            }
        }
    }

    fn spawn_interactive_tracer(self: Arc<Self>, layout: Arc<SimulationLayout>, cancel: CancellationToken) {
        let inner = Arc::clone(&self);
        self.tracer_pool.spawn(move || {
            let segments = trace(
                &layout,
                inner.size,
                inner.settings.interactive_segments_to_trace,
                &cancel,
            );
            if cancel.is_cancelled() {
                return;
            }
            inner.grid.draw_segments(&layout, &segments, true);
        });
    }

    /// Claims one batch of the session budget and traces it. Each
    /// completed batch posts an orchestration task that claims the next,
    /// keeping the pool full until the budget runs dry.
    fn spawn_final_tracer(self: Arc<Self>, layout: Arc<SimulationLayout>, cancel: CancellationToken) {
        let batch = self.take_batch(&cancel);
        if batch == 0 {
            return;
        }
        let inner = Arc::clone(&self);
        self.tracer_pool.spawn(move || {
            let segments = trace(&layout, inner.size, batch, &cancel);
            if cancel.is_cancelled() {
                // Superseded: results are dropped and the pool is not
                // refilled for this session.
                return;
            }
            inner.grid.draw_segments(&layout, &segments, false);

            let refill = Arc::clone(&inner);
            inner
                .orchestration_pool
                .spawn(move || refill.spawn_final_tracer(layout, cancel));
        });
    }

    /// Takes up to one standard tracer batch from the session budget.
    /// Returns 0 when the session was superseded or the budget is spent.
    fn take_batch(&self, cancel: &CancellationToken) -> usize {
        if cancel.is_cancelled() {
            return 0;
        }
        let mut session = self.session.lock().unwrap();
        let batch = session
            .segments_remaining
            .min(self.settings.standard_tracer_size as u64) as usize;
        session.segments_remaining -= batch as u64;
        if batch == 0 {
            debug!("segment budget exhausted");
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::LightColor;
    use crate::grid::SimulationSnapshot;
    use crate::scene::Light;
    use crate::vec2::Point;
    use std::sync::mpsc;
    use std::time::Duration;

    fn channel_handler() -> (SnapshotHandler, mpsc::Receiver<SimulationSnapshot>) {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let handler: SnapshotHandler =
            Box::new(move |snapshot| drop(tx.lock().unwrap().send(snapshot)));
        (handler, rx)
    }

    fn one_light_layout(version: u64) -> SimulationLayout {
        SimulationLayout::new(
            version,
            vec![Light::new(Point::new(50.0, 50.0), LightColor::WHITE)],
            vec![],
            vec![],
            vec![],
        )
    }

    fn small_settings() -> SimulatorSettings {
        SimulatorSettings {
            interactive_segments_to_trace: 50,
            final_segments_to_trace: 400,
            standard_tracer_size: 100,
        }
    }

    #[test]
    fn empty_scene_presents_black() {
        let (handler, rx) = channel_handler();
        let simulator = Simulator::new(
            SimulationSize::new(100, 100),
            0.5,
            small_settings(),
            handler,
        )
        .unwrap();
        simulator.restart(SimulationLayout::empty(1), false);

        // First the exposure re-emit, then the black reset frame; both are
        // all-zero and report no traced segments.
        for _ in 0..2 {
            let snapshot = rx.recv_timeout(Duration::from_secs(10)).unwrap();
            assert_eq!(snapshot.total_segments_traced, 0);
            assert!(snapshot
                .image
                .pixels()
                .all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0));
        }
    }

    #[test]
    fn final_pass_spends_the_whole_budget() {
        let (handler, rx) = channel_handler();
        let simulator = Simulator::new(
            SimulationSize::new(100, 100),
            0.5,
            small_settings(),
            handler,
        )
        .unwrap();
        simulator.restart(one_light_layout(1), false);

        let mut total = 0;
        while let Ok(snapshot) = rx.recv_timeout(Duration::from_secs(30)) {
            total = snapshot.total_segments_traced;
            if total >= 400 {
                break;
            }
        }
        assert_eq!(total, 400);
    }

    #[test]
    fn interactive_pass_traces_one_small_batch() {
        let (handler, rx) = channel_handler();
        let simulator = Simulator::new(
            SimulationSize::new(100, 100),
            0.5,
            small_settings(),
            handler,
        )
        .unwrap();
        simulator.restart(one_light_layout(1), true);

        let mut total = 0;
        while let Ok(snapshot) = rx.recv_timeout(Duration::from_secs(10)) {
            total = snapshot.total_segments_traced;
            if total > 0 {
                break;
            }
        }
        assert_eq!(total, 50);
    }

    #[test]
    fn restart_supersedes_previous_session() {
        let (handler, rx) = channel_handler();
        let simulator = Simulator::new(
            SimulationSize::new(100, 100),
            0.5,
            small_settings(),
            handler,
        )
        .unwrap();
        simulator.restart(one_light_layout(1), false);
        simulator.restart(one_light_layout(2), false);

        // Once the second session's budget is spent, totals never exceed
        // it: the first session's remaining batches were either cancelled
        // or version-gated away, and the reset cleared its partial count.
        let mut total = 0;
        while let Ok(snapshot) = rx.recv_timeout(Duration::from_secs(30)) {
            total = snapshot.total_segments_traced;
            if total >= 400 {
                break;
            }
        }
        assert_eq!(total, 400);
        // Give any stray late deliveries a moment, then confirm nothing
        // pushed the count past the second session's budget.
        std::thread::sleep(Duration::from_millis(200));
        while let Ok(snapshot) = rx.try_recv() {
            assert!(snapshot.total_segments_traced <= 400);
        }
    }

    #[test]
    fn stop_halts_refills() {
        let (handler, rx) = channel_handler();
        let simulator = Simulator::new(
            SimulationSize::new(100, 100),
            0.5,
            small_settings(),
            handler,
        )
        .unwrap();
        simulator.restart(one_light_layout(1), false);
        simulator.stop();

        // Drain until quiescent: whatever landed, the count can never
        // exceed the budget, and after stop it stops growing.
        let mut last = 0;
        while let Ok(snapshot) = rx.recv_timeout(Duration::from_secs(2)) {
            assert!(snapshot.total_segments_traced <= 400);
            last = snapshot.total_segments_traced;
        }
        assert!(last <= 400);
    }
}
