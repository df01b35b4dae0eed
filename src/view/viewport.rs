use eframe::egui::{Pos2, Vec2, pos2};

pub(crate) const MIN_SCALE: f32 = 0.1;
pub(crate) const MAX_SCALE: f32 = 3.0;

/// Pan/zoom mapping between surface-local screen pixels and world
/// coordinates. The world origin projects at the center of the surface
/// region, so a host resize recenters on its own.
///
/// `screen = center + pan + world * scale`; this pair of conversions is the
/// single source of truth for both rendering and hit-testing.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pan: Vec2,
    scale: f32,
    size: Vec2,
}

impl Viewport {
    pub fn new(size: Vec2) -> Self {
        Self {
            pan: Vec2::ZERO,
            scale: 1.0,
            size,
        }
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    fn center(&self) -> Vec2 {
        self.size * 0.5
    }

    /// Accepts new surface dimensions from the host.
    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.scale = 1.0;
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Rescales by `factor`, keeping the world point under `anchor` fixed on
    /// screen. The pan is recomputed from the clamped scale, so hitting the
    /// scale bounds does not drift the anchor.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        assert!(
            factor.is_finite() && factor > 0.0,
            "zoom factor must be finite and positive"
        );

        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / self.scale;
        let offset = anchor.to_vec2() - self.center();
        self.pan = offset - (offset - self.pan) * ratio;
        self.scale = new_scale;
    }

    /// Keyboard zoom: no pointer anchor, so anchor at the region center.
    pub fn zoom_step(&mut self, factor: f32) {
        self.zoom_at(pos2(self.center().x, self.center().y), factor);
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.center() - self.pan) / self.scale
    }

    pub fn world_to_screen(&self, world: Vec2) -> Pos2 {
        (self.center() + self.pan + world * self.scale).to_pos2()
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    const TOLERANCE: f32 = 0.001;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < TOLERANCE
    }

    #[test]
    fn world_screen_round_trip() {
        let mut viewport = Viewport::new(vec2(800.0, 500.0));
        viewport.pan(vec2(37.0, -12.0));
        viewport.zoom_at(pos2(120.0, 80.0), 1.7);

        for point in [pos2(0.0, 0.0), pos2(400.0, 250.0), pos2(799.0, 13.0)] {
            let world = viewport.screen_to_world(point);
            let back = viewport.world_to_screen(world);
            assert!(close(back.to_vec2(), point.to_vec2()), "{point:?} -> {back:?}");
        }
    }

    #[test]
    fn zoom_keeps_the_anchor_point_fixed() {
        let mut viewport = Viewport::new(vec2(800.0, 500.0));
        viewport.pan(vec2(-40.0, 25.0));

        let anchor = pos2(230.0, 330.0);
        let before = viewport.screen_to_world(anchor);
        viewport.zoom_at(anchor, 1.6);
        let after = viewport.screen_to_world(anchor);

        assert!(close(before, after), "{before:?} vs {after:?}");
    }

    #[test]
    fn zoom_clamps_scale_without_breaking_the_anchor() {
        let mut viewport = Viewport::new(vec2(800.0, 500.0));

        let anchor = pos2(100.0, 100.0);
        let before = viewport.screen_to_world(anchor);
        viewport.zoom_at(anchor, 100.0);
        assert_eq!(viewport.scale(), MAX_SCALE);
        assert!(close(before, viewport.screen_to_world(anchor)));

        let before = viewport.screen_to_world(anchor);
        viewport.zoom_at(anchor, 1e-6);
        assert_eq!(viewport.scale(), MIN_SCALE);
        assert!(close(before, viewport.screen_to_world(anchor)));
    }

    #[test]
    fn resize_recenters_the_world_origin() {
        let mut viewport = Viewport::new(vec2(800.0, 500.0));
        assert_eq!(viewport.world_to_screen(Vec2::ZERO), pos2(400.0, 250.0));

        viewport.set_size(vec2(400.0, 300.0));
        assert_eq!(viewport.world_to_screen(Vec2::ZERO), pos2(200.0, 150.0));
    }

    #[test]
    fn reset_restores_identity() {
        let mut viewport = Viewport::new(vec2(800.0, 500.0));
        viewport.pan(vec2(55.0, 66.0));
        viewport.zoom_step(2.0);
        viewport.reset();

        assert_eq!(viewport.pan_offset(), Vec2::ZERO);
        assert_eq!(viewport.scale(), 1.0);
    }

    #[test]
    #[should_panic(expected = "zoom factor")]
    fn non_finite_zoom_factor_panics() {
        let mut viewport = Viewport::new(vec2(800.0, 500.0));
        viewport.zoom_at(pos2(0.0, 0.0), f32::NAN);
    }
}
