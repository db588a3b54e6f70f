//! Marker motion between polling cycles.
//!
//! Every rendered entity owns at most one animation task. A new position
//! for an entity aborts the running task and starts a fresh one from the
//! currently displayed coordinate, so a marker never snaps back. Entities
//! that leave the merged list lose their task and their displayed state.


use dashmap::DashMap;
use fleetsync_types::{LatLng, TrackedEntity};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Where displayed positions go. Implemented by the rendering surface.
pub trait MarkerSink: Send + Sync + 'static {
    /// Position the surface currently shows for `id`, if it has a marker.
    fn marker_position(&self, _id: &str) -> Option<LatLng> {
        None
    }

    fn move_marker(&self, id: &str, position: LatLng);

    fn remove_marker(&self, _id: &str) {}
}

/// Sink for headless use; displayed state is still tracked.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMarkerSink;

impl MarkerSink for NoopMarkerSink {
    fn move_marker(&self, _id: &str, _position: LatLng) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionConfig {
    pub duration: Duration,
    pub frame_interval: Duration,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self { duration: Duration::from_millis(600), frame_interval: Duration::from_millis(16) }
    }
}

/// Linear path from one coordinate to another over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolation {
    pub from: LatLng,
    pub to: LatLng,
    pub duration: Duration,
}

impl Interpolation {
    pub fn position_at(&self, elapsed: Duration) -> LatLng {
        if self.duration.is_zero() {
            return self.to;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from.lerp(self.to, t)
    }
}

/// Render-facing state of one marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayedMarker {
    /// What the surface shows right now
    pub position: LatLng,
    /// Last authoritative coordinate
    pub target: LatLng,
    generation: u64,
}

/// What one [`MotionInterpolator::apply`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotionSummary {
    pub animated: usize,
    pub placed: usize,
    pub removed: usize,
}

pub struct MotionInterpolator {
    displayed: Arc<DashMap<String, DisplayedMarker>>,
    animations: DashMap<String, JoinHandle<()>>,
    sink: Arc<dyn MarkerSink>,
    config: MotionConfig,
    generation: AtomicU64,
}

impl MotionInterpolator {
    pub fn new(sink: Arc<dyn MarkerSink>, config: MotionConfig) -> Self {
        Self {
            displayed: Arc::new(DashMap::new()),
            animations: DashMap::new(),
            sink,
            config,
            generation: AtomicU64::new(0),
        }
    }

    /// Reconcile displayed markers with a freshly merged entity list.
    ///
    /// Must be called from within a tokio runtime; animations run as tasks.
    /// Entities without finite coordinates are treated as absent.
    pub fn apply(&self, entities: &[TrackedEntity]) -> MotionSummary {
        let incoming: HashMap<&str, LatLng> = entities
            .iter()
            .filter(|e| e.is_renderable())
            .map(|e| (e.id.as_str(), e.position()))
            .collect();

        let mut summary = MotionSummary::default();

        for (&id, &to) in &incoming {
            let from = self
                .displayed
                .get(id)
                .map(|m| m.position)
                .or_else(|| self.sink.marker_position(id))
                .filter(LatLng::is_finite)
                .unwrap_or(to);

            if from == to {
                self.place(id, to);
                summary.placed += 1;
            } else {
                self.animate(id, Interpolation { from, to, duration: self.config.duration });
                summary.animated += 1;
            }
        }

        let gone: Vec<String> = self
            .displayed
            .iter()
            .filter(|m| !incoming.contains_key(m.key().as_str()))
            .map(|m| m.key().clone())
            .collect();
        for id in gone {
            self.discard(&id);
            summary.removed += 1;
        }

        if summary.animated > 0 || summary.removed > 0 {
            tracing::trace!(
                "[motion] {} animated, {} placed, {} removed",
                summary.animated,
                summary.placed,
                summary.removed
            );
        }
        summary
    }

    pub fn displayed_position(&self, id: &str) -> Option<LatLng> {
        self.displayed.get(id).map(|m| m.position)
    }

    pub fn displayed(&self, id: &str) -> Option<DisplayedMarker> {
        self.displayed.get(id).map(|m| *m)
    }

    pub fn is_animating(&self, id: &str) -> bool {
        self.animations.get(id).is_some_and(|h| !h.is_finished())
    }

    pub fn len(&self) -> usize {
        self.displayed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displayed.is_empty()
    }

    /// Cancel every animation and forget all markers.
    pub fn clear(&self) {
        let ids: Vec<String> = self.displayed.iter().map(|m| m.key().clone()).collect();
        for id in ids {
            self.discard(&id);
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn cancel(&self, id: &str) {
        if let Some((_, handle)) = self.animations.remove(id) {
            handle.abort();
        }
    }

    fn place(&self, id: &str, position: LatLng) {
        self.cancel(id);
        let generation = self.next_generation();
        self.displayed.insert(id.to_string(), DisplayedMarker { position, target: position, generation });
        self.sink.move_marker(id, position);
    }

    fn animate(&self, id: &str, path: Interpolation) {
        self.cancel(id);
        let generation = self.next_generation();
        self.displayed
            .insert(id.to_string(), DisplayedMarker { position: path.from, target: path.to, generation });
        self.sink.move_marker(id, path.from);

        let task = tokio::spawn(run_animation(
            Arc::clone(&self.displayed),
            Arc::clone(&self.sink),
            id.to_string(),
            path,
            generation,
            self.config.frame_interval,
        ));
        self.animations.insert(id.to_string(), task);
    }

    fn discard(&self, id: &str) {
        self.cancel(id);
        if self.displayed.remove(id).is_some() {
            self.sink.remove_marker(id);
        }
    }
}

impl Drop for MotionInterpolator {
    fn drop(&mut self) {
        for entry in self.animations.iter() {
            entry.value().abort();
        }
    }
}

async fn run_animation(
    displayed: Arc<DashMap<String, DisplayedMarker>>,
    sink: Arc<dyn MarkerSink>,
    id: String,
    path: Interpolation,
    generation: u64,
    frame_interval: Duration,
) {
    let started = Instant::now();
    let mut frames = tokio::time::interval_at(started + frame_interval, frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        frames.tick().await;
        let elapsed = started.elapsed();
        let position = path.position_at(elapsed);

        {
            let Some(mut marker) = displayed.get_mut(&id) else {
                return;
            };
            // Superseded between abort and this frame.
            if marker.generation != generation {
                return;
            }
            marker.position = position;
        }
        sink.move_marker(&id, position);

        if elapsed >= path.duration {
            return;
        }
    }
}
