use eframe::egui::{Pos2, Vec2};

use crate::graph::EntityId;
use crate::sim::Simulation;

use super::viewport::Viewport;

/// Padding added to a node's screen radius when hit-testing, so touch
/// targets are not pixel-exact.
pub(crate) const HIT_PADDING: f32 = 6.0;

/// A press/release pair below both thresholds is a select, not a drag.
const CLICK_MAX_DISTANCE: f32 = 10.0;
const CLICK_MAX_DURATION: f64 = 0.3;

const KEY_ZOOM_STEP: f32 = 1.2;

/// Current interaction mode. Exactly one gesture is active at a time;
/// release and cancel events always return to `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    Idle,
    Panning,
    DraggingNode(EntityId),
    Pinching,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    SpacePressed,
    SpaceReleased,
    ZoomIn,
    ZoomOut,
    ClearSelection,
}

/// Input events lowered from the host's pointer/touch/keyboard streams.
/// Positions are surface-local screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerPressed { pos: Pos2, secondary: bool },
    PointerMoved { pos: Pos2 },
    PointerReleased { pos: Pos2 },
    TouchStarted { id: u64, pos: Pos2 },
    TouchMoved { id: u64, pos: Pos2 },
    TouchEnded { id: u64 },
    /// Pointer left the surface, focus was lost, or the gesture was
    /// cancelled by the platform.
    Cancel,
    Key(KeyCommand),
}

/// Selection change requested by a completed gesture; the owning view
/// applies it and notifies the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionAction {
    Toggle(EntityId),
    Clear,
}

struct PressTracker {
    time: f64,
    last: Pos2,
    moved: f32,
    hit: Option<EntityId>,
}

struct TouchPoint {
    id: u64,
    pos: Pos2,
}

/// State machine disambiguating pointer, touch, and keyboard input into
/// node drags, pans, pinch zooms, and selection clicks. It never mutates
/// positions or the transform directly; it only issues `pin`/`unpin`/
/// `pan`/`zoom_at` commands.
pub struct InteractionController {
    gesture: Gesture,
    press: Option<PressTracker>,
    touches: Vec<TouchPoint>,
    drag_touch: Option<u64>,
    pinch_span: f32,
    space_pan: bool,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
            press: None,
            touches: Vec::new(),
            drag_touch: None,
            pinch_span: 0.0,
            space_pan: false,
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Whether the Space pan affordance is held, so the view can show a
    /// grab cursor.
    pub fn space_pan(&self) -> bool {
        self.space_pan
    }

    /// Nearest node whose hit-region contains `pos`, in screen space.
    pub fn node_at(sim: &Simulation, viewport: &Viewport, pos: Pos2) -> Option<EntityId> {
        sim.nodes()
            .iter()
            .filter_map(|node| {
                let center = viewport.world_to_screen(node.pos);
                let distance = center.distance(pos);
                if distance <= node.radius() * viewport.scale() + HIT_PADDING {
                    Some((node.id, distance))
                } else {
                    None
                }
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _distance)| id)
    }

    /// Feeds one event through the state machine. `now` is the host clock in
    /// seconds, used only for click-vs-drag disambiguation.
    pub fn handle(
        &mut self,
        event: InputEvent,
        now: f64,
        sim: &mut Simulation,
        viewport: &mut Viewport,
    ) -> Option<SelectionAction> {
        match event {
            InputEvent::PointerPressed { pos, secondary } => {
                self.begin_press(pos, secondary, now, sim, viewport);
                None
            }
            InputEvent::PointerMoved { pos } => {
                self.move_press(pos, sim, viewport);
                None
            }
            InputEvent::PointerReleased { pos } => self.end_press(pos, now, sim),
            InputEvent::TouchStarted { id, pos } => {
                self.touch_started(id, pos, now, sim, viewport);
                None
            }
            InputEvent::TouchMoved { id, pos } => {
                self.touch_moved(id, pos, sim, viewport);
                None
            }
            InputEvent::TouchEnded { id } => self.touch_ended(id, now, sim),
            InputEvent::Cancel => {
                self.cancel(sim);
                None
            }
            InputEvent::Key(command) => self.key(command, viewport),
        }
    }

    fn begin_press(
        &mut self,
        pos: Pos2,
        secondary: bool,
        now: f64,
        sim: &mut Simulation,
        viewport: &Viewport,
    ) {
        if self.gesture != Gesture::Idle {
            return;
        }

        if secondary || self.space_pan {
            // Pans from anywhere, even over a node; never selects.
            self.gesture = Gesture::Panning;
            self.press = Some(PressTracker {
                time: now,
                last: pos,
                moved: f32::INFINITY,
                hit: None,
            });
            return;
        }

        let hit = Self::node_at(sim, viewport, pos);
        self.press = Some(PressTracker {
            time: now,
            last: pos,
            moved: 0.0,
            hit,
        });

        if let Some(id) = hit {
            self.gesture = Gesture::DraggingNode(id);
            sim.pin(id, viewport.screen_to_world(pos));
        } else {
            self.gesture = Gesture::Panning;
        }
    }

    fn move_press(&mut self, pos: Pos2, sim: &mut Simulation, viewport: &mut Viewport) {
        let delta = self.track_movement(pos);

        match self.gesture {
            Gesture::DraggingNode(id) => sim.pin(id, viewport.screen_to_world(pos)),
            Gesture::Panning => viewport.pan(delta),
            Gesture::Idle | Gesture::Pinching => {}
        }
    }

    fn end_press(&mut self, pos: Pos2, now: f64, sim: &mut Simulation) -> Option<SelectionAction> {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        let press = self.press.take();

        if let Gesture::DraggingNode(id) = gesture {
            sim.unpin(id);
        }

        self.click_selection(gesture, press, pos, now, sim)
    }

    fn touch_started(
        &mut self,
        id: u64,
        pos: Pos2,
        now: f64,
        sim: &mut Simulation,
        viewport: &Viewport,
    ) {
        if self.touches.iter().all(|touch| touch.id != id) {
            self.touches.push(TouchPoint { id, pos });
        }

        match self.touches.len() {
            1 => {
                if self.gesture != Gesture::Idle {
                    return;
                }

                let hit = if self.space_pan {
                    None
                } else {
                    Self::node_at(sim, viewport, pos)
                };
                self.press = Some(PressTracker {
                    time: now,
                    last: pos,
                    moved: 0.0,
                    hit,
                });

                if let Some(node_id) = hit {
                    self.gesture = Gesture::DraggingNode(node_id);
                    self.drag_touch = Some(id);
                    sim.pin(node_id, viewport.screen_to_world(pos));
                } else {
                    self.gesture = Gesture::Panning;
                }
            }
            2 => {
                // A second finger escalates a pan to a pinch, but never
                // interrupts an in-progress node drag.
                if matches!(self.gesture, Gesture::DraggingNode(_)) {
                    return;
                }

                self.gesture = Gesture::Pinching;
                self.press = None;
                self.pinch_span = self.touch_span();
            }
            _ => {}
        }
    }

    fn touch_moved(&mut self, id: u64, pos: Pos2, sim: &mut Simulation, viewport: &mut Viewport) {
        let Some(touch) = self.touches.iter_mut().find(|touch| touch.id == id) else {
            return;
        };
        let previous = touch.pos;
        touch.pos = pos;

        match self.gesture {
            Gesture::DraggingNode(node_id) => {
                if self.drag_touch == Some(id) {
                    self.track_movement(pos);
                    sim.pin(node_id, viewport.screen_to_world(pos));
                }
            }
            Gesture::Panning => {
                self.track_movement(pos);
                viewport.pan(pos - previous);
            }
            Gesture::Pinching => {
                let span = self.touch_span();
                if self.pinch_span > 0.0 && span > 0.0 {
                    viewport.zoom_at(self.touch_midpoint(), span / self.pinch_span);
                }
                self.pinch_span = span;
            }
            Gesture::Idle => {}
        }
    }

    fn touch_ended(&mut self, id: u64, now: f64, sim: &mut Simulation) -> Option<SelectionAction> {
        let Some(index) = self.touches.iter().position(|touch| touch.id == id) else {
            return None;
        };
        let ended = self.touches.remove(index);

        match self.gesture {
            Gesture::DraggingNode(node_id) if self.drag_touch == Some(id) => {
                self.gesture = Gesture::Idle;
                self.drag_touch = None;
                sim.unpin(node_id);
                let press = self.press.take();
                self.click_selection(Gesture::DraggingNode(node_id), press, ended.pos, now, sim)
            }
            Gesture::Panning if self.touches.is_empty() => {
                self.gesture = Gesture::Idle;
                let press = self.press.take();
                self.click_selection(Gesture::Panning, press, ended.pos, now, sim)
            }
            Gesture::Pinching if self.touches.len() < 2 => {
                self.gesture = Gesture::Idle;
                self.pinch_span = 0.0;
                None
            }
            _ => None,
        }
    }

    /// Deterministic teardown: any held pin is released so no node is left
    /// permanently stuck.
    fn cancel(&mut self, sim: &mut Simulation) {
        if let Gesture::DraggingNode(id) = self.gesture {
            sim.unpin(id);
        }
        self.gesture = Gesture::Idle;
        self.press = None;
        self.touches.clear();
        self.drag_touch = None;
        self.pinch_span = 0.0;
    }

    fn key(&mut self, command: KeyCommand, viewport: &mut Viewport) -> Option<SelectionAction> {
        match command {
            KeyCommand::SpacePressed => {
                self.space_pan = true;
                None
            }
            KeyCommand::SpaceReleased => {
                self.space_pan = false;
                None
            }
            KeyCommand::ZoomIn => {
                viewport.zoom_step(KEY_ZOOM_STEP);
                None
            }
            KeyCommand::ZoomOut => {
                viewport.zoom_step(1.0 / KEY_ZOOM_STEP);
                None
            }
            KeyCommand::ClearSelection => Some(SelectionAction::Clear),
        }
    }

    fn track_movement(&mut self, pos: Pos2) -> Vec2 {
        let Some(press) = self.press.as_mut() else {
            return Vec2::ZERO;
        };
        let delta = pos - press.last;
        press.moved += delta.length();
        press.last = pos;
        delta
    }

    fn click_selection(
        &self,
        gesture: Gesture,
        press: Option<PressTracker>,
        pos: Pos2,
        now: f64,
        sim: &Simulation,
    ) -> Option<SelectionAction> {
        let press = press?;
        let moved = press.moved + (pos - press.last).length();
        if moved >= CLICK_MAX_DISTANCE || now - press.time >= CLICK_MAX_DURATION {
            return None;
        }

        match gesture {
            // A node that vanished in a rebuild mid-press selects nothing.
            Gesture::DraggingNode(id) if sim.node_index(id).is_some() => {
                Some(SelectionAction::Toggle(id))
            }
            Gesture::Panning if press.hit.is_none() => Some(SelectionAction::Clear),
            _ => None,
        }
    }

    fn touch_span(&self) -> f32 {
        match self.touches.as_slice() {
            [first, second, ..] => first.pos.distance(second.pos),
            _ => 0.0,
        }
    }

    fn touch_midpoint(&self) -> Pos2 {
        match self.touches.as_slice() {
            [first, second, ..] => first.pos.lerp(second.pos, 0.5),
            [only] => only.pos,
            [] => Pos2::ZERO,
        }
    }
}
