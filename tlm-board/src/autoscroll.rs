//! Edge auto-scroll while dragging
//!
//! Near a viewport edge the page scrolls toward that edge, faster the closer
//! the pointer gets. The velocity is recomputed on every pointer update and
//! applied by a fixed-tick task that lives exactly as long as the drag.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Distance from an edge, in pixels, at which scrolling starts
pub const SCROLL_THRESHOLD: f64 = 50.0;

/// Pixels per tick with the pointer on (or past) the edge
pub const MAX_SCROLL_SPEED: f64 = 24.0;

/// Interval between scroll steps
pub const SCROLL_TICK: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Scroll step applied per tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub dx: f64,
    pub dy: f64,
}

impl Velocity {
    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// Velocity for a pointer position
///
/// Per axis: zero outside the threshold band, growing linearly to
/// [`MAX_SCROLL_SPEED`] at the edge, negative toward the top/left.
pub fn scroll_velocity(pointer: Point, viewport: Viewport) -> Velocity {
    Velocity {
        dx: axis_velocity(pointer.x, viewport.width),
        dy: axis_velocity(pointer.y, viewport.height),
    }
}

fn axis_velocity(position: f64, extent: f64) -> f64 {
    if position < SCROLL_THRESHOLD {
        let factor = ((SCROLL_THRESHOLD - position) / SCROLL_THRESHOLD).min(1.0);
        -MAX_SCROLL_SPEED * factor
    } else if position > extent - SCROLL_THRESHOLD {
        let factor = ((position - (extent - SCROLL_THRESHOLD)) / SCROLL_THRESHOLD).min(1.0);
        MAX_SCROLL_SPEED * factor
    } else {
        0.0
    }
}

/// Whatever actually scrolls (a window, a terminal pager, a test recorder)
pub trait ScrollPort: Send + Sync + 'static {
    fn scroll_by(&self, dx: f64, dy: f64);
}

/// Running auto-scroll timer
///
/// Dropping it stops the timer, so it cannot outlive the drag that owns it.
pub struct AutoScroller {
    velocity: watch::Sender<Velocity>,
    task: JoinHandle<()>,
}

impl AutoScroller {
    /// Start the tick task; must be called inside a tokio runtime
    pub fn start(port: Arc<dyn ScrollPort>) -> Self {
        let (velocity, rx) = watch::channel(Velocity::default());
        let task = tokio::spawn(run_ticks(port, rx));
        debug!("Auto-scroll started");
        Self { velocity, task }
    }

    pub fn set_velocity(&self, velocity: Velocity) {
        self.velocity.send_replace(velocity);
    }

    /// Recompute the velocity from a pointer update
    pub fn update(&self, pointer: Point, viewport: Viewport) {
        self.set_velocity(scroll_velocity(pointer, viewport));
    }

    pub fn velocity(&self) -> Velocity {
        *self.velocity.borrow()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for AutoScroller {
    fn drop(&mut self) {
        self.task.abort();
        debug!("Auto-scroll stopped");
    }
}

async fn run_ticks(port: Arc<dyn ScrollPort>, velocity: watch::Receiver<Velocity>) {
    let mut ticker = tokio::time::interval(SCROLL_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        if velocity.has_changed().is_err() {
            // Sender gone: the drag is over.
            return;
        }
        let current = *velocity.borrow();
        if !current.is_zero() {
            trace!(dx = current.dx, dy = current.dy, "Auto-scroll step");
            port.scroll_by(current.dx, current.dy);
        }
    }
}
