use eframe::egui::{Vec2, vec2};

#[derive(Clone, Copy)]
pub(super) struct ForceParams {
    pub(super) repulsion_strength: f32,
    pub(super) softening: f32,
    pub(super) link_rest_length: f32,
    pub(super) link_strength: f32,
    pub(super) center_strength: f32,
}

/// Deterministic unit direction for coincident points, derived from the pair
/// of node indices so repeated ticks keep pushing the same way.
fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

fn separation(from: usize, to: usize, positions: &[Vec2]) -> (Vec2, f32) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    if distance > 0.0001 {
        (delta / distance, distance)
    } else {
        (fallback_direction(from, to), 0.0)
    }
}

/// Softened inverse-square repulsion between every node pair, so the graph
/// spreads out and isolated nodes are not left stranded on top of others.
pub(super) fn accumulate_repulsion(positions: &[Vec2], params: ForceParams, forces: &mut [Vec2]) {
    for from in 0..positions.len() {
        for to in (from + 1)..positions.len() {
            let (direction, distance) = separation(from, to, positions);
            let push = direction * (params.repulsion_strength / (distance * distance + params.softening));
            forces[from] += push;
            forces[to] -= push;
        }
    }
}

/// Spring attraction along each link toward the rest length.
pub(super) fn accumulate_link_springs(
    edges: &[(usize, usize)],
    positions: &[Vec2],
    params: ForceParams,
    forces: &mut [Vec2],
) {
    for &(from, to) in edges {
        if from >= positions.len() || to >= positions.len() || from == to {
            continue;
        }

        let (direction, distance) = separation(from, to, positions);
        let correction = direction * ((distance - params.link_rest_length) * params.link_strength);
        forces[from] -= correction;
        forces[to] += correction;
    }
}

/// Weak pull toward the world origin, which the viewport projects at the
/// center of the surface region.
pub(super) fn accumulate_centering(positions: &[Vec2], params: ForceParams, forces: &mut [Vec2]) {
    for (position, force) in positions.iter().zip(forces.iter_mut()) {
        *force -= *position * params.center_strength;
    }
}

/// Positional overlap resolution between node discs. Applied directly to
/// positions rather than scaled by alpha, so separation still resolves while
/// the system cools. Pinned nodes do not move; their counterpart absorbs the
/// whole correction. Returns whether any overlap was corrected.
pub(super) fn relax_collisions(
    positions: &mut [Vec2],
    radii: &[f32],
    pinned: &[bool],
    padding: f32,
) -> bool {
    let mut corrected = false;
    for from in 0..positions.len() {
        for to in (from + 1)..positions.len() {
            if pinned[from] && pinned[to] {
                continue;
            }

            let (direction, distance) = separation(from, to, positions);
            let min_distance = radii[from] + radii[to] + padding;
            if distance >= min_distance {
                continue;
            }

            let overlap = min_distance - distance;
            if pinned[from] {
                positions[to] -= direction * overlap;
            } else if pinned[to] {
                positions[from] += direction * overlap;
            } else {
                positions[from] += direction * (overlap * 0.5);
                positions[to] -= direction * (overlap * 0.5);
            }
            corrected = true;
        }
    }
    corrected
}
