use crate::raster::{draw_line_fast, draw_line_smooth, PixelCanvas};
use crate::ray::LightSegment;
use crate::scene::SimulationLayout;
use crate::utils::clamp;
use image::RgbaImage;
use log::debug;
use std::sync::Mutex;

/// Callback handed each freshly rendered snapshot. Invoked on whatever
/// thread performed the triggering mutation; the consumer marshals to its
/// own thread if it needs to.
pub type SnapshotHandler = Box<dyn Fn(SimulationSnapshot) + Send + Sync>;

/// A rendered view of the accumulated light field. The image buffer is
/// owned by the snapshot alone, so consumers never observe a torn frame.
#[derive(Debug, Clone)]
pub struct SimulationSnapshot {
    pub image: RgbaImage,
    pub total_segments_traced: u64,
}

/// Knobs that affect rendering but not accumulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderProperties {
    /// Brightness coefficient divided by the segment count at render time.
    /// The simulator folds the user exposure and the light count into this.
    pub exposure: f64,
}

/// The accumulation buffer shared by all tracer workers.
///
/// Each pixel keeps one running u32 sum per channel; rasterized segments
/// only ever add to the sums, and a reset zeroes them. The grid refuses
/// batches traced against a layout older than the newest one it has seen,
/// which is what makes cancelled tracers harmless. All mutation happens
/// under one lock, so snapshot emissions are totally ordered.
pub struct LightGrid {
    width: u32,
    height: u32,
    state: Mutex<GridState>,
    snapshot_handler: SnapshotHandler,
}

struct GridState {
    sums: Vec<[u32; 3]>,
    total_segment_count: u64,
    latest_layout_version: u64,
    render: RenderProperties,
}

impl LightGrid {
    pub fn new(width: u32, height: u32, exposure: f64, snapshot_handler: SnapshotHandler) -> LightGrid {
        LightGrid {
            width,
            height,
            state: Mutex::new(GridState {
                sums: vec![[0; 3]; (width * height) as usize],
                total_segment_count: 0,
                latest_layout_version: 0,
                render: RenderProperties { exposure },
            }),
            snapshot_handler,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Zeroes every pixel sum and the segment count. With `update_image`
    /// a snapshot of the now-black image is emitted; without it the
    /// consumer keeps whatever frame it last received.
    pub fn reset(&self, update_image: bool) {
        let mut state = self.state.lock().unwrap();
        for pixel in state.sums.iter_mut() {
            *pixel = [0; 3];
        }
        state.total_segment_count = 0;
        if update_image {
            self.emit(&state);
        }
    }

    /// Rasterizes one tracer batch and emits a snapshot.
    ///
    /// Batches from a layout older than the newest seen are dropped whole:
    /// their tracer was superseded and its segments belong to a scene that
    /// no longer exists.
    pub fn draw_segments(
        &self,
        layout: &SimulationLayout,
        segments: &[LightSegment],
        low_quality: bool,
    ) {
        let mut state = self.state.lock().unwrap();
        if layout.version < state.latest_layout_version {
            debug!(
                "dropping stale batch of {} segments (layout v{} < v{})",
                segments.len(),
                layout.version,
                state.latest_layout_version
            );
            return;
        }
        state.latest_layout_version = layout.version;

        let mut canvas = PixelCanvas::new(&mut state.sums, self.width, self.height);
        for segment in segments {
            if low_quality {
                draw_line_fast(&mut canvas, segment);
            } else {
                draw_line_smooth(&mut canvas, segment);
            }
        }

        state.total_segment_count += segments.len() as u64;
        self.emit(&state);
    }

    /// Raises the newest-layout watermark without drawing anything, so
    /// batches from superseded layouts are rejected even before the new
    /// session delivers its first batch. Never lowers the watermark.
    pub fn advance_layout_version(&self, version: u64) {
        let mut state = self.state.lock().unwrap();
        if version > state.latest_layout_version {
            state.latest_layout_version = version;
        }
    }

    /// Re-renders with new properties over the existing sums; nothing is
    /// re-rasterized.
    pub fn set_render_properties(&self, render: RenderProperties) {
        let mut state = self.state.lock().unwrap();
        state.render = render;
        self.emit(&state);
    }

    /// Tone-maps the sums into an owned RGBA frame and hands it to the
    /// snapshot handler. Called with the state lock held.
    fn emit(&self, state: &GridState) {
        let brightness = if state.total_segment_count == 0 {
            0.0
        } else {
            state.render.exposure / state.total_segment_count as f64
        };

        let mut bytes = vec![0u8; (self.width * self.height * 4) as usize];
        for (pixel, out) in state.sums.iter().zip(bytes.chunks_exact_mut(4)) {
            out[0] = clamp(pixel[0] as f64 * brightness, 0.0, 255.0) as u8;
            out[1] = clamp(pixel[1] as f64 * brightness, 0.0, 255.0) as u8;
            out[2] = clamp(pixel[2] as f64 * brightness, 0.0, 255.0) as u8;
            out[3] = 255;
        }

        let image = RgbaImage::from_raw(self.width, self.height, bytes)
            .expect("pixel buffer dimensions always match the grid");
        (self.snapshot_handler)(SimulationSnapshot {
            image,
            total_segments_traced: state.total_segment_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::LightColor;
    use crate::vec2::Point;
    use std::sync::Arc;

    type Captured = Arc<Mutex<Vec<SimulationSnapshot>>>;

    fn capturing_grid(width: u32, height: u32, exposure: f64) -> (LightGrid, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        let grid = LightGrid::new(
            width,
            height,
            exposure,
            Box::new(move |snapshot| sink.lock().unwrap().push(snapshot)),
        );
        (grid, captured)
    }

    fn segment(y: f64) -> LightSegment {
        LightSegment::new(
            Point::new(10.0, y),
            Point::new(20.0, y),
            LightColor::new(100, 100, 100),
        )
    }

    fn layout(version: u64) -> SimulationLayout {
        SimulationLayout::empty(version)
    }

    #[test]
    fn snapshot_buffer_is_always_four_bytes_per_pixel() {
        let (grid, captured) = capturing_grid(33, 17, 1.0);
        grid.reset(true);
        let snapshots = captured.lock().unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].image.as_raw().len(), 33 * 17 * 4);
    }

    #[test]
    fn stale_batches_are_dropped() {
        let (grid, captured) = capturing_grid(40, 40, 1.0);
        grid.draw_segments(&layout(2), &[segment(5.0)], true);
        grid.draw_segments(&layout(1), &[segment(9.0), segment(11.0)], true);

        let snapshots = captured.lock().unwrap();
        // The stale batch emitted nothing and changed nothing.
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].total_segments_traced, 1);
    }

    #[test]
    fn equal_version_batches_accumulate() {
        let (grid, captured) = capturing_grid(40, 40, 1.0);
        grid.draw_segments(&layout(3), &[segment(5.0)], true);
        grid.draw_segments(&layout(3), &[segment(6.0), segment(7.0)], true);
        grid.draw_segments(&layout(4), &[segment(8.0)], true);

        let snapshots = captured.lock().unwrap();
        assert_eq!(
            snapshots.last().unwrap().total_segments_traced,
            4,
            "segment counts add across accepted batches"
        );
    }

    #[test]
    fn advancing_the_version_gates_older_batches() {
        let (grid, captured) = capturing_grid(40, 40, 1.0);
        grid.draw_segments(&layout(1), &[segment(5.0)], true);
        grid.advance_layout_version(2);
        grid.draw_segments(&layout(1), &[segment(6.0)], true);
        grid.draw_segments(&layout(2), &[segment(7.0)], true);

        let snapshots = captured.lock().unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots.last().unwrap().total_segments_traced, 2);
    }

    #[test]
    fn reset_is_idempotent() {
        let (grid, captured) = capturing_grid(40, 40, 1.0);
        grid.draw_segments(&layout(1), &[segment(5.0)], true);
        grid.reset(true);
        grid.reset(true);

        let snapshots = captured.lock().unwrap();
        assert_eq!(snapshots.len(), 3);
        for snapshot in &snapshots[1..] {
            assert_eq!(snapshot.total_segments_traced, 0);
            assert!(snapshot
                .image
                .pixels()
                .all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0));
        }
    }

    #[test]
    fn reset_without_update_stays_silent() {
        let (grid, captured) = capturing_grid(40, 40, 1.0);
        grid.reset(false);
        assert!(captured.lock().unwrap().is_empty());
    }

    #[test]
    fn exposure_scales_channels_linearly() {
        let (grid, captured) = capturing_grid(40, 40, 1.0);
        grid.draw_segments(&layout(1), &[segment(5.0)], true);
        grid.set_render_properties(RenderProperties { exposure: 2.0 });

        let snapshots = captured.lock().unwrap();
        let before = snapshots[0].image.get_pixel(15, 5);
        let after = snapshots[1].image.get_pixel(15, 5);
        assert_eq!(before[0], 100);
        assert_eq!(after[0], 200);
        assert_eq!(after[1], 200);
        // Re-rendering didn't touch the accumulation.
        assert_eq!(snapshots[1].total_segments_traced, 1);
    }

    #[test]
    fn empty_grid_renders_black_regardless_of_exposure() {
        let (grid, captured) = capturing_grid(40, 40, 1000.0);
        grid.set_render_properties(RenderProperties { exposure: 5000.0 });
        let snapshots = captured.lock().unwrap();
        assert!(snapshots[0]
            .image
            .pixels()
            .all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0));
    }
}
