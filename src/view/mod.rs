mod controller;
mod render;
pub(crate) mod viewport;

use std::collections::HashSet;

use eframe::egui::{self, CursorIcon, Event, Key, PointerButton, Pos2, Rect, Sense, TouchPhase, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

pub use controller::{Gesture, InputEvent, InteractionController, KeyCommand, SelectionAction};
pub use viewport::Viewport;

use crate::graph::{Entity, EntityId, GraphData, Relation, RelationType, build_graph};
use crate::sim::Simulation;

/// Host callback invoked whenever the selected entity changes.
pub type SelectionCallback = Box<dyn FnMut(Option<EntityId>)>;

const WHEEL_ZOOM_SENSITIVITY: f32 = 0.002;

struct SearchMatchCache {
    query: String,
    data_revision: u64,
    matches: HashSet<EntityId>,
}

/// One interactive graph view: owns the simulation, viewport transform,
/// gesture state machine, selection, and search state for a single mounted
/// surface region. Call [`GraphView::show`] every frame.
pub struct GraphView {
    sim: Simulation,
    viewport: Viewport,
    controller: InteractionController,
    selected: Option<EntityId>,
    search: String,
    hidden_types: HashSet<u64>,
    selection_changed: Option<SelectionCallback>,
    data_revision: u64,
    search_match_cache: Option<SearchMatchCache>,
    // Touch ids currently down; while non-empty, egui's synthesized pointer
    // events are dropped so a finger is not processed twice.
    session_touches: Vec<u64>,
}

impl GraphView {
    pub fn new(entities: &[Entity], relations: &[Relation], relation_types: &[RelationType]) -> Self {
        Self {
            sim: Simulation::start(build_graph(entities, relations, relation_types)),
            viewport: Viewport::new(egui::vec2(800.0, 600.0)),
            controller: InteractionController::new(),
            selected: None,
            search: String::new(),
            hidden_types: HashSet::new(),
            selection_changed: None,
            data_revision: 0,
            search_match_cache: None,
            session_touches: Vec::new(),
        }
    }

    /// Registers the host's selection-changed callback. Invoked with the
    /// selected entity id, or `None` on deselect.
    pub fn on_selection_changed(&mut self, callback: SelectionCallback) {
        self.selection_changed = Some(callback);
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    /// Rebuilds the graph from new collections. Surviving nodes keep their
    /// current position, velocity, and pin state; a selection pointing at a
    /// removed entity is cleared.
    pub fn set_data(
        &mut self,
        entities: &[Entity],
        relations: &[Relation],
        relation_types: &[RelationType],
    ) {
        self.data_revision = self.data_revision.wrapping_add(1);
        self.search_match_cache = None;

        let prior = std::mem::replace(&mut self.sim, Simulation::start(GraphData::default()))
            .into_data();
        let mut data = build_graph(entities, relations, relation_types);
        for node in &mut data.nodes {
            if let Some(previous) = prior.node(node.id) {
                node.pos = previous.pos;
                node.velocity = previous.velocity;
                node.pinned = previous.pinned;
            }
        }
        self.sim = Simulation::start(data);

        if let Some(selected) = self.selected
            && self.sim.node_index(selected).is_none()
        {
            self.apply_selection(SelectionAction::Clear);
        }
    }

    /// Free-text query; matching nodes are emphasized, the rest dimmed.
    pub fn search_mut(&mut self) -> &mut String {
        &mut self.search
    }

    /// Hides or shows links of the given relation type without rebuilding.
    pub fn set_type_hidden(&mut self, type_id: u64, hidden: bool) {
        if hidden {
            self.hidden_types.insert(type_id);
        } else {
            self.hidden_types.remove(&type_id);
        }
    }

    pub fn is_type_hidden(&self, type_id: u64) -> bool {
        self.hidden_types.contains(&type_id)
    }

    /// Releases every pin, recenters the viewport, and reheats the layout.
    pub fn reset(&mut self) {
        let ids = self.sim.nodes().iter().map(|node| node.id).collect::<Vec<_>>();
        for id in ids {
            self.sim.unpin(id);
        }
        self.viewport.reset();
        self.sim.restart();
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_step(1.2);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_step(1.0 / 1.2);
    }

    fn apply_selection(&mut self, action: SelectionAction) {
        let next = match action {
            SelectionAction::Toggle(id) if self.selected == Some(id) => None,
            SelectionAction::Toggle(id) => Some(id),
            SelectionAction::Clear => None,
        };

        if next != self.selected {
            self.selected = next;
            if let Some(callback) = self.selection_changed.as_mut() {
                callback(next);
            }
        }
    }

    fn search_matches(&mut self) -> Option<&HashSet<EntityId>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let stale = !self
            .search_match_cache
            .as_ref()
            .is_some_and(|cached| cached.data_revision == self.data_revision && cached.query == query);
        if stale {
            let matcher = SkimMatcherV2::default();
            let matches = self
                .sim
                .nodes()
                .iter()
                .filter(|node| matcher.fuzzy_match(&node.name, query).is_some())
                .map(|node| node.id)
                .collect::<HashSet<_>>();
            self.search_match_cache = Some(SearchMatchCache {
                query: query.to_owned(),
                data_revision: self.data_revision,
                matches,
            });
        }

        self.search_match_cache.as_ref().map(|cached| &cached.matches)
    }

    fn in_touch_session(&self) -> bool {
        !self.session_touches.is_empty()
    }

    /// Lowers egui's raw event stream into controller input. While another
    /// widget owns keyboard focus (`keyboard_owned`), key commands are
    /// dropped, except a Space release so the pan affordance cannot stick.
    fn lower_events(
        &mut self,
        rect: Rect,
        hovered: bool,
        keyboard_owned: bool,
        events: &[Event],
    ) -> Vec<InputEvent> {
        let to_local = |pos: Pos2| -> Pos2 { (pos - rect.min).to_pos2() };
        let mut lowered = Vec::new();

        for event in events {
            match event {
                Event::PointerButton {
                    pos,
                    button,
                    pressed,
                    ..
                } => {
                    if self.in_touch_session() {
                        continue;
                    }
                    if *pressed {
                        if rect.contains(*pos) {
                            lowered.push(InputEvent::PointerPressed {
                                pos: to_local(*pos),
                                secondary: !matches!(button, PointerButton::Primary),
                            });
                        }
                    } else {
                        lowered.push(InputEvent::PointerReleased { pos: to_local(*pos) });
                    }
                }
                Event::PointerMoved(pos) => {
                    if !self.in_touch_session() {
                        lowered.push(InputEvent::PointerMoved { pos: to_local(*pos) });
                    }
                }
                Event::PointerGone => {
                    if !self.in_touch_session() {
                        lowered.push(InputEvent::Cancel);
                    }
                }
                Event::Touch { id, phase, pos, .. } => match phase {
                    TouchPhase::Start => {
                        if rect.contains(*pos) || self.in_touch_session() {
                            if !self.session_touches.contains(&id.0) {
                                self.session_touches.push(id.0);
                            }
                            lowered.push(InputEvent::TouchStarted {
                                id: id.0,
                                pos: to_local(*pos),
                            });
                        }
                    }
                    TouchPhase::Move => {
                        if self.in_touch_session() {
                            lowered.push(InputEvent::TouchMoved {
                                id: id.0,
                                pos: to_local(*pos),
                            });
                        }
                    }
                    TouchPhase::End => {
                        if self.in_touch_session() {
                            self.session_touches.retain(|&touch| touch != id.0);
                            lowered.push(InputEvent::TouchEnded { id: id.0 });
                        }
                    }
                    TouchPhase::Cancel => {
                        self.session_touches.clear();
                        lowered.push(InputEvent::Cancel);
                    }
                },
                Event::Key { key, pressed, .. } => {
                    let command = match key {
                        Key::Space if *pressed => Some(KeyCommand::SpacePressed),
                        Key::Space => Some(KeyCommand::SpaceReleased),
                        Key::Plus | Key::Equals if *pressed && hovered => Some(KeyCommand::ZoomIn),
                        Key::Minus if *pressed && hovered => Some(KeyCommand::ZoomOut),
                        Key::Escape if *pressed => Some(KeyCommand::ClearSelection),
                        _ => None,
                    };
                    let command = match command {
                        Some(KeyCommand::SpaceReleased) => command,
                        Some(_) if keyboard_owned => None,
                        command => command,
                    };
                    if let Some(command) = command {
                        lowered.push(InputEvent::Key(command));
                    }
                }
                _ => {}
            }
        }

        lowered
    }

    /// Wheel zoom anchored at the pointer; Shift+wheel pans instead.
    fn handle_wheel(&mut self, ui: &Ui, rect: Rect, hovered: bool) {
        if !hovered {
            return;
        }

        let (scroll, shift, pointer) = ui.input(|input| {
            (
                input.raw_scroll_delta,
                input.modifiers.shift,
                input.pointer.hover_pos(),
            )
        });
        if scroll == egui::Vec2::ZERO {
            return;
        }

        if shift {
            self.viewport.pan(scroll);
            return;
        }

        if scroll.y.abs() <= f32::EPSILON {
            return;
        }
        let anchor = pointer
            .map(|pos| (pos - rect.min).to_pos2())
            .unwrap_or_else(|| (rect.center() - rect.min).to_pos2());
        let factor = (1.0 + (scroll.y * WHEEL_ZOOM_SENSITIVITY)).clamp(0.85, 1.15);
        self.viewport.zoom_at(anchor, factor);
    }

    /// Runs one frame: dispatch input, advance the simulation a tick, draw.
    /// Requests a repaint only while the layout is moving or a gesture is in
    /// progress; a settled or empty graph schedules nothing.
    pub fn show(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        self.viewport.set_size(rect.size());

        let hovered = response.hovered() || self.controller.gesture() != Gesture::Idle;
        let keyboard_owned = ui.ctx().wants_keyboard_input();
        let (events, now) = ui.input(|input| (input.events.clone(), input.time));
        for event in self.lower_events(rect, hovered, keyboard_owned, &events) {
            if let Some(action) =
                self.controller
                    .handle(event, now, &mut self.sim, &mut self.viewport)
            {
                self.apply_selection(action);
            }
        }
        self.handle_wheel(ui, rect, hovered);

        let hover_node = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pos| rect.contains(*pos) && self.controller.gesture() == Gesture::Idle)
            .and_then(|pos| {
                InteractionController::node_at(&self.sim, &self.viewport, (pos - rect.min).to_pos2())
            });
        if hover_node.is_some() {
            ui.output_mut(|output| output.cursor_icon = CursorIcon::PointingHand);
        } else if self.controller.space_pan() {
            ui.output_mut(|output| output.cursor_icon = CursorIcon::Grab);
        }

        let moving = self.sim.tick();
        if moving || self.controller.gesture() != Gesture::Idle {
            ui.ctx().request_repaint();
        }

        let selected = self.selected;
        let hidden_types = self.hidden_types.clone();
        let matches = self.search_matches().cloned();
        let scene = render::Scene {
            selected,
            hovered: hover_node,
            search_matches: matches.as_ref(),
            hidden_types: &hidden_types,
        };
        render::draw_scene(&painter, rect, &self.viewport, &self.sim, &scene);
    }
}
