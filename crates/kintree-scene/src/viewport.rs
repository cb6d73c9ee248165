//! View state: pan/zoom transform, clamping, and eased focus animation.
//!
//! The viewport outlives scenes. A scene rebuild never resets the
//! transform; only explicit calls (or a running [`ViewAnimation`]) move
//! the view.

use kintree_core::geometry::{Point, Size};
use std::time::Duration;

/// Smallest permitted zoom factor.
pub const MIN_ZOOM: f64 = 0.25;
/// Largest permitted zoom factor.
pub const MAX_ZOOM: f64 = 4.0;

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// Easing function signature: maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f64) -> f64;

/// Identity easing (constant velocity).
#[inline]
pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// An affine view transform: scale then translate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f64,
    pub pan: Point,
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        zoom: 1.0,
        pan: Point { x: 0.0, y: 0.0 },
    };

    /// Map a world-space point into view space.
    #[inline]
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: p.x * self.zoom + self.pan.x,
            y: p.y * self.zoom + self.pan.y,
        }
    }

    /// Componentwise linear interpolation between two transforms.
    #[must_use]
    pub fn lerp(from: Self, to: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            zoom: from.zoom + (to.zoom - from.zoom) * t,
            pan: Point {
                x: from.pan.x + (to.pan.x - from.pan.x) * t,
                y: from.pan.y + (to.pan.y - from.pan.y) * t,
            },
        }
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// Eased interpolation between two view transforms over a duration.
///
/// Tracks elapsed time as [`Duration`] internally for precise accumulation.
/// Ticked by the embedder; the viewport commits the target transform when
/// the animation completes.
#[derive(Debug, Clone, Copy)]
pub struct ViewAnimation {
    from: ViewTransform,
    to: ViewTransform,
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl ViewAnimation {
    pub fn new(from: ViewTransform, to: ViewTransform, duration: Duration) -> Self {
        Self {
            from,
            to,
            elapsed: Duration::ZERO,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: ease_in_out,
        }
    }

    /// Set the easing function (builder).
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    pub fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Raw linear progress (before easing), in [0.0, 1.0].
    #[must_use]
    pub fn raw_progress(&self) -> f64 {
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// The interpolated transform at the current time.
    #[must_use]
    pub fn current(&self) -> ViewTransform {
        ViewTransform::lerp(self.from, self.to, (self.easing)(self.raw_progress()))
    }

    #[must_use]
    pub fn target(&self) -> ViewTransform {
        self.to
    }
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Mutable view state over a fixed-size viewing surface.
#[derive(Debug, Clone)]
pub struct Viewport {
    size: Size,
    transform: ViewTransform,
    animation: Option<ViewAnimation>,
}

impl Viewport {
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            transform: ViewTransform::IDENTITY,
            animation: None,
        }
    }

    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// The effective transform: the in-flight animation's current frame
    /// when one is running, the settled transform otherwise.
    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        match &self.animation {
            Some(anim) => anim.current(),
            None => self.transform,
        }
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Map a world-space point through the effective transform.
    #[must_use]
    pub fn world_to_view(&self, p: Point) -> Point {
        self.transform().apply(p)
    }

    /// Set the zoom directly, clamped to [[`MIN_ZOOM`], [`MAX_ZOOM`]].
    /// Cancels any running animation at its current frame.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.settle();
        self.transform.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Multiply the zoom by `factor`, clamped.
    pub fn zoom_by(&mut self, factor: f64) {
        self.settle();
        self.transform.zoom = (self.transform.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Translate the view by a view-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.settle();
        self.transform.pan.x += dx;
        self.transform.pan.y += dy;
    }

    /// Animate toward a transform that places `target` (world space) at
    /// the viewport center at the given zoom.
    pub fn center_on(&mut self, target: Point, zoom: f64, duration: Duration) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let center = self.size.center();
        let to = ViewTransform {
            zoom,
            pan: Point {
                x: center.x - target.x * zoom,
                y: center.y - target.y * zoom,
            },
        };
        let from = self.transform();
        if duration.is_zero() {
            self.animation = None;
            self.transform = to;
        } else {
            self.animation = Some(ViewAnimation::new(from, to, duration));
        }
    }

    /// Advance the running animation, committing its target on completion.
    pub fn tick(&mut self, dt: Duration) {
        let Some(anim) = &mut self.animation else {
            return;
        };
        anim.tick(dt);
        if anim.is_complete() {
            self.transform = anim.target();
            self.animation = None;
        }
    }

    // Freeze the in-flight frame so direct manipulation starts from what
    // the user currently sees.
    fn settle(&mut self) {
        if let Some(anim) = self.animation.take() {
            self.transform = anim.current();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: Size = Size {
        width: 1200.0,
        height: 600.0,
    };

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identity_transform_maps_points_unchanged() {
        let vp = Viewport::new(SIZE);
        let p = Point { x: 42.0, y: -7.0 };
        let out = vp.world_to_view(p);
        assert!(approx(out.x, 42.0) && approx(out.y, -7.0));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::new(SIZE);
        vp.set_zoom(100.0);
        assert!(approx(vp.transform().zoom, MAX_ZOOM));
        vp.set_zoom(0.0);
        assert!(approx(vp.transform().zoom, MIN_ZOOM));
        vp.set_zoom(1.5);
        vp.zoom_by(0.0001);
        assert!(approx(vp.transform().zoom, MIN_ZOOM));
    }

    #[test]
    fn pan_accumulates() {
        let mut vp = Viewport::new(SIZE);
        vp.pan_by(10.0, -5.0);
        vp.pan_by(2.0, 2.0);
        let t = vp.transform();
        assert!(approx(t.pan.x, 12.0) && approx(t.pan.y, -3.0));
    }

    #[test]
    fn center_on_places_target_at_viewport_center() {
        let mut vp = Viewport::new(SIZE);
        let target = Point { x: 300.0, y: 150.0 };
        vp.center_on(target, 1.5, Duration::ZERO);
        let out = vp.world_to_view(target);
        assert!(approx(out.x, 600.0) && approx(out.y, 300.0));
        assert!(approx(vp.transform().zoom, 1.5));
    }

    #[test]
    fn animation_converges_to_target_at_completion() {
        let mut vp = Viewport::new(SIZE);
        let target = Point { x: 300.0, y: 150.0 };
        vp.center_on(target, 1.5, Duration::from_millis(750));
        assert!(vp.is_animating());

        // Mid-flight the view is somewhere between identity and target.
        vp.tick(Duration::from_millis(375));
        let mid = vp.transform();
        assert!(mid.zoom > 1.0 && mid.zoom < 1.5);

        vp.tick(Duration::from_millis(500));
        assert!(!vp.is_animating());
        let out = vp.world_to_view(target);
        assert!(approx(out.x, 600.0) && approx(out.y, 300.0));
    }

    #[test]
    fn direct_manipulation_cancels_animation_at_current_frame() {
        let mut vp = Viewport::new(SIZE);
        vp.center_on(Point { x: 300.0, y: 150.0 }, 1.5, Duration::from_millis(750));
        vp.tick(Duration::from_millis(100));
        vp.pan_by(1.0, 0.0);
        assert!(!vp.is_animating());
    }

    #[test]
    fn easing_endpoints() {
        assert!(approx(ease_in_out(0.0), 0.0));
        assert!(approx(ease_in_out(1.0), 1.0));
        assert!(approx(ease_in_out(0.5), 0.5));
        assert!(approx(linear(2.0), 1.0));
    }

    #[test]
    fn focus_zoom_is_within_clamp_range() {
        let mut vp = Viewport::new(SIZE);
        vp.center_on(Point { x: 0.0, y: 0.0 }, 1.5, Duration::ZERO);
        assert!(approx(vp.transform().zoom, 1.5));
    }
}
