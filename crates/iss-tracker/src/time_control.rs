//! Simulated clock with drag-to-scrub
//!
//! ```text
//! simulated(now) = simulated_epoch + (now - real_epoch) · effective_speed
//! effective_speed = 0        if -1 < speed < 0
//!                 = speed    otherwise
//! ```
//!
//! Every speed change first rebases both epochs to the current instant so the
//! simulated time is continuous across the change.
//!
//! | From | Event | To |
//! |------|-------|----|
//! | Idle | `start_drag(x)` | Dragging |
//! | Dragging | `move_drag(x)` | Dragging (speed = 1 - (x - origin)/divisor) |
//! | Dragging | `release()` | Idle (speed snapped to nearest marker) |
//! | any | `reset_to_live()` | Idle (speed 1, simulated = real) |

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::{SpeedMarker, TrackerConfig};

/// Keeps scaled offsets inside chrono's representable range (~31 700 years).
const MAX_SCALED_OFFSET_MS: f64 = 1.0e15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        origin_x: f64,
        /// Simulated minus real time when the drag started
        base_offset: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct TimeController {
    simulated_epoch: DateTime<Utc>,
    real_epoch: DateTime<Utc>,
    speed: f64,
    drag: DragState,
    markers: Vec<SpeedMarker>,
    drag_divisor: f64,
    debug_warp: f64,
}

impl TimeController {
    /// A live clock (simulated = real, speed 1) using the configured markers.
    pub fn new(config: &TrackerConfig, real_now: DateTime<Utc>) -> Self {
        Self {
            simulated_epoch: real_now,
            real_epoch: real_now,
            speed: 1.0,
            drag: DragState::Idle,
            markers: config.speed_markers.clone(),
            drag_divisor: config.drag_divisor,
            debug_warp: config.debug_time_warp,
        }
    }

    /// Simulated instant for `real_now`. Never fails; instants beyond chrono's
    /// range saturate.
    pub fn simulated_at(&self, real_now: DateTime<Utc>) -> DateTime<Utc> {
        let elapsed = real_now.signed_duration_since(self.real_epoch);
        let offset = scale(elapsed, self.effective_speed());

        self.simulated_epoch
            .checked_add_signed(offset)
            .unwrap_or(if offset > Duration::zero() {
                DateTime::<Utc>::MAX_UTC
            } else {
                DateTime::<Utc>::MIN_UTC
            })
    }

    /// The multiplier as set, for display.
    pub fn speed_multiplier(&self) -> f64 {
        self.speed
    }

    /// The multiplier actually applied: slow reverse speeds stall the clock.
    pub fn effective_speed(&self) -> f64 {
        if self.speed > -1.0 && self.speed < 0.0 {
            0.0
        } else {
            self.speed
        }
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Orbit/camera controls must stay off while the user scrubs time.
    pub fn camera_controls_enabled(&self) -> bool {
        !self.is_dragging()
    }

    pub fn markers(&self) -> &[SpeedMarker] {
        &self.markers
    }

    /// Simulated minus real time at `real_now`.
    pub fn offset_at(&self, real_now: DateTime<Utc>) -> Duration {
        self.simulated_at(real_now).signed_duration_since(real_now)
    }

    pub fn start_drag(&mut self, pointer_x: f64, real_now: DateTime<Utc>) {
        self.rebase(real_now);
        let base_offset = self.simulated_epoch.signed_duration_since(real_now);

        if self.is_dragging() {
            debug!(pointer_x, "drag restarted");
        } else {
            debug!(pointer_x, "drag started");
        }
        self.drag = DragState::Dragging {
            origin_x: pointer_x,
            base_offset,
        };
    }

    pub fn move_drag(&mut self, pointer_x: f64, real_now: DateTime<Utc>) {
        let DragState::Dragging { origin_x, .. } = self.drag else {
            debug!(pointer_x, "pointer move without drag ignored");
            return;
        };

        self.rebase(real_now);
        let speed = 1.0 - (pointer_x - origin_x) / self.drag_divisor;
        if speed.is_finite() {
            self.speed = speed;
        }
        debug!(pointer_x, speed = self.speed, "drag moved");
    }

    /// End the drag and snap to the nearest marker. Returns the marker chosen,
    /// or `None` when no drag was in progress.
    pub fn release(&mut self, real_now: DateTime<Utc>) -> Option<&SpeedMarker> {
        if !self.is_dragging() {
            debug!("release without drag ignored");
            return None;
        }

        self.rebase(real_now);
        self.drag = DragState::Idle;

        let index = nearest_marker(&self.markers, self.speed)?;
        let marker = &self.markers[index];
        debug!(from = self.speed, to = marker.multiplier, label = %marker.label, "speed snapped");
        self.speed = marker.multiplier;
        Some(marker)
    }

    /// Back to real time at speed 1, cancelling any drag.
    pub fn reset_to_live(&mut self, real_now: DateTime<Utc>) {
        self.simulated_epoch = real_now;
        self.real_epoch = real_now;
        self.speed = 1.0;
        self.drag = DragState::Idle;
        debug!("reset to live");
    }

    pub fn set_speed(&mut self, multiplier: f64, real_now: DateTime<Utc>) {
        if !multiplier.is_finite() {
            debug!(multiplier, "non-finite speed ignored");
            return;
        }
        self.rebase(real_now);
        self.speed = multiplier;
        debug!(speed = multiplier, "speed set");
    }

    /// Apply the marker at `index`. Returns `None` for an unknown index.
    pub fn select_marker(&mut self, index: usize, real_now: DateTime<Utc>) -> Option<&SpeedMarker> {
        let multiplier = self.markers.get(index)?.multiplier;
        self.set_speed(multiplier, real_now);
        self.markers.get(index)
    }

    pub fn enable_debug_warp(&mut self, real_now: DateTime<Utc>) {
        self.set_speed(self.debug_warp, real_now);
    }

    fn rebase(&mut self, real_now: DateTime<Utc>) {
        self.simulated_epoch = self.simulated_at(real_now);
        self.real_epoch = real_now;
    }
}

/// Index of the marker closest to `speed`; the first of equal candidates wins.
fn nearest_marker(markers: &[SpeedMarker], speed: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, marker) in markers.iter().enumerate() {
        let distance = (marker.multiplier - speed).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

fn scale(elapsed: Duration, factor: f64) -> Duration {
    if factor == 1.0 {
        return elapsed;
    }
    if factor == 0.0 {
        return Duration::zero();
    }

    let ms = elapsed.num_milliseconds() as f64 * factor;
    let ms = ms.clamp(-MAX_SCALED_OFFSET_MS, MAX_SCALED_OFFSET_MS);
    Duration::milliseconds(ms.round() as i64)
}
