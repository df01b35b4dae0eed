use std::collections::HashSet;

use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke};

use crate::graph::EntityId;
use crate::sim::Simulation;

use super::viewport::Viewport;

const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
const GRID_LINE: Color32 = Color32::from_rgba_premultiplied(60, 70, 80, 70);
const LABEL_COLOR: Color32 = Color32::from_gray(230);
const SELECTED_OUTLINE: Color32 = Color32::from_rgb(245, 206, 93);
const NODE_OUTLINE: Color32 = Color32::from_rgba_premultiplied(15, 15, 15, 190);

/// Opacity applied to links/nodes outside the active selection or search.
const DIM_FACTOR: f32 = 0.35;

pub(super) struct Scene<'a> {
    pub(super) selected: Option<EntityId>,
    pub(super) hovered: Option<EntityId>,
    /// Node ids matching the active search query, `None` when no query.
    pub(super) search_matches: Option<&'a HashSet<EntityId>>,
    /// Relation type ids currently filtered out of the view.
    pub(super) hidden_types: &'a HashSet<u64>,
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

fn draw_background(painter: &Painter, rect: Rect, viewport: &Viewport) {
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let step = (56.0 * viewport.scale().clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + viewport.world_to_screen(eframe::egui::Vec2::ZERO).to_vec2();

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, GRID_LINE),
        );
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, GRID_LINE),
        );
        y += step;
    }
}

fn finite(pos: Pos2) -> bool {
    pos.x.is_finite() && pos.y.is_finite()
}

/// Projects the current simulation, viewport, selection, and search state
/// into the painter: links first, then nodes, then labels. Unresolved or
/// non-finite positions skip their draw call instead of failing the frame.
pub(super) fn draw_scene(
    painter: &Painter,
    rect: Rect,
    viewport: &Viewport,
    sim: &Simulation,
    scene: &Scene<'_>,
) {
    draw_background(painter, rect, viewport);
    if sim.is_empty() {
        return;
    }

    let to_screen = |world: eframe::egui::Vec2| -> Pos2 {
        rect.min + viewport.world_to_screen(world).to_vec2()
    };
    let scale = viewport.scale();
    let nodes = sim.nodes();
    let selection_active = scene.selected.is_some();
    let search_active = scene.search_matches.is_some_and(|matches| !matches.is_empty());

    // Nodes one hop from the selection keep full opacity alongside it.
    let mut related: HashSet<EntityId> = HashSet::new();
    if let Some(selected) = scene.selected {
        for link in sim.links() {
            if link.source == selected {
                related.insert(link.target);
            } else if link.target == selected {
                related.insert(link.source);
            }
        }
    }

    for (link, &(from, to)) in sim.links().iter().zip(sim.edges().iter()) {
        if scene.hidden_types.contains(&link.type_id) {
            continue;
        }
        let (Some(source), Some(target)) = (nodes.get(from), nodes.get(to)) else {
            continue;
        };

        let start = to_screen(source.pos);
        let end = to_screen(target.pos);
        if !finite(start) || !finite(end) {
            continue;
        }

        let touches_selection =
            scene.selected.is_some_and(|id| link.source == id || link.target == id);
        let color = if selection_active && !touches_selection {
            dim_color(link.color, DIM_FACTOR)
        } else {
            link.color
        };
        let width = if touches_selection { 2.2 } else { 1.5 };
        painter.line_segment([start, end], Stroke::new(width, color));

        if scale > 0.7 || touches_selection {
            let midpoint = start.lerp(end, 0.5);
            painter.text(
                midpoint,
                Align2::CENTER_BOTTOM,
                &link.label,
                FontId::proportional(11.0),
                color,
            );
        }
    }

    for node in nodes {
        let position = to_screen(node.pos);
        if !finite(position) {
            continue;
        }

        let radius = (node.radius() * scale).max(2.5);
        let is_selected = scene.selected == Some(node.id);
        let is_related = related.contains(&node.id);
        let is_hovered = scene.hovered == Some(node.id);
        let is_search_match = scene
            .search_matches
            .is_some_and(|matches| matches.contains(&node.id));

        let fill = if is_hovered {
            blend_color(node.color, Color32::WHITE, 0.25)
        } else if is_selected || is_related {
            node.color
        } else if selection_active || (search_active && !is_search_match) {
            dim_color(node.color, DIM_FACTOR)
        } else {
            node.color
        };

        painter.circle_filled(position, radius, fill);
        if is_selected {
            painter.circle_stroke(position, radius + 3.0, Stroke::new(2.0, SELECTED_OUTLINE));
        }
        painter.circle_stroke(position, radius, Stroke::new(1.0, NODE_OUTLINE));

        let show_label = is_selected || is_related || is_hovered || is_search_match || radius > 9.0;
        if show_label {
            let label_color = if selection_active && !(is_selected || is_related) {
                dim_color(LABEL_COLOR, DIM_FACTOR)
            } else {
                LABEL_COLOR
            };
            painter.text(
                Pos2::new(position.x, position.y + radius + 4.0),
                Align2::CENTER_TOP,
                &node.name,
                FontId::proportional(12.0),
                label_color,
            );
        }
    }
}
