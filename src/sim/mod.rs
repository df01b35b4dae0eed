mod forces;

use eframe::egui::Vec2;

use crate::graph::{EntityId, GraphData, GraphLink, GraphNode};
use forces::{
    ForceParams, accumulate_centering, accumulate_link_springs, accumulate_repulsion,
    relax_collisions,
};

/// Cooling floor: below this alpha the tick loop stops on its own.
const ALPHA_MIN: f32 = 0.005;
/// Multiplicative cooling rate, applied once per tick.
const ALPHA_DECAY: f32 = 0.025;
/// Working alpha restored when a node is pinned mid-simulation, so the rest
/// of the graph visibly re-settles around it.
const REHEAT_ALPHA: f32 = 0.3;

const VELOCITY_DAMPING: f32 = 0.6;
const MAX_SPEED: f32 = 30.0;
const COLLISION_PADDING: f32 = 4.0;

const PARAMS: ForceParams = ForceParams {
    repulsion_strength: 30_000.0,
    softening: 100.0,
    link_rest_length: 100.0,
    link_strength: 0.08,
    center_strength: 0.01,
};

struct Scratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    pinned: Vec<bool>,
}

/// Force-directed layout over a built graph. Owns node positions and
/// velocities; everything else reads them through the accessors.
///
/// Each node is either free (integrated from forces) or pinned (held at an
/// externally commanded position until [`Simulation::unpin`]). Pin commands
/// are applied between ticks, never mid-integration: callers run on the same
/// thread and a tick runs to completion before the next event is handled.
pub struct Simulation {
    data: GraphData,
    // Link endpoints resolved to node indices, aligned with `data.links`.
    edges: Vec<(usize, usize)>,
    alpha: f32,
    running: bool,
    scratch: Scratch,
}

impl Simulation {
    /// Takes ownership of a built graph and starts the cooling cycle at full
    /// alpha. An empty graph starts stopped.
    pub fn start(data: GraphData) -> Self {
        let edges = data
            .links
            .iter()
            .filter_map(|link| {
                let from = data.index_by_id.get(&link.source).copied()?;
                let to = data.index_by_id.get(&link.target).copied()?;
                Some((from, to))
            })
            .collect();

        let running = !data.nodes.is_empty();
        Self {
            data,
            edges,
            alpha: 1.0,
            running,
            scratch: Scratch {
                forces: Vec::new(),
                positions: Vec::new(),
                radii: Vec::new(),
                pinned: Vec::new(),
            },
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.data.nodes
    }

    pub fn links(&self) -> &[GraphLink] {
        &self.data.links
    }

    /// Link endpoint indices into [`Simulation::nodes`], aligned with
    /// [`Simulation::links`].
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn node(&self, id: EntityId) -> Option<&GraphNode> {
        self.data.node(id)
    }

    pub fn node_index(&self, id: EntityId) -> Option<usize> {
        self.data.index_by_id.get(&id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Hands the graph back, preserving current positions and pin state.
    pub fn into_data(self) -> GraphData {
        self.data
    }

    /// Boosts alpha to at least `alpha` and resumes ticking.
    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
        self.running = !self.data.nodes.is_empty();
    }

    /// Full restart of the cooling cycle from the current positions.
    pub fn restart(&mut self) {
        self.alpha = 1.0;
        self.running = !self.data.nodes.is_empty();
    }

    /// Halts ticking without discarding positions.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Pins `id` at a world position and reheats so the surrounding graph
    /// re-settles. Unknown ids are ignored: a drag may outlive a rebuild.
    pub fn pin(&mut self, id: EntityId, position: Vec2) {
        let Some(index) = self.data.index_by_id.get(&id).copied() else {
            return;
        };

        let node = &mut self.data.nodes[index];
        node.pinned = Some(position);
        node.pos = position;
        node.velocity = Vec2::ZERO;
        self.reheat(REHEAT_ALPHA);
    }

    /// Releases `id` back to free motion at its current position. The node
    /// stays where the drag left it; nothing snaps back.
    pub fn unpin(&mut self, id: EntityId) {
        let Some(index) = self.data.index_by_id.get(&id).copied() else {
            return;
        };

        self.data.nodes[index].pinned = None;
    }

    /// Advances the simulation one step. Returns whether the system is still
    /// in motion; once alpha falls below the floor the loop reports settled
    /// and stops until reheated.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        let node_count = self.data.nodes.len();
        if node_count == 0 {
            self.running = false;
            return false;
        }

        let scratch = &mut self.scratch;
        scratch.forces.clear();
        scratch.forces.resize(node_count, Vec2::ZERO);
        scratch.positions.clear();
        scratch.radii.clear();
        scratch.pinned.clear();
        for node in &self.data.nodes {
            scratch.positions.push(node.pos);
            scratch.radii.push(node.radius());
            scratch.pinned.push(node.pinned.is_some());
        }

        accumulate_repulsion(&scratch.positions, PARAMS, &mut scratch.forces);
        accumulate_link_springs(&self.edges, &scratch.positions, PARAMS, &mut scratch.forces);
        accumulate_centering(&scratch.positions, PARAMS, &mut scratch.forces);

        for (node, force) in self.data.nodes.iter_mut().zip(scratch.forces.iter()) {
            if let Some(pinned) = node.pinned {
                node.pos = pinned;
                node.velocity = Vec2::ZERO;
                continue;
            }

            let mut velocity = (node.velocity + *force * self.alpha) * VELOCITY_DAMPING;
            let speed = velocity.length();
            if speed > MAX_SPEED {
                velocity *= MAX_SPEED / speed;
            }
            node.velocity = velocity;
            node.pos += velocity;
        }

        scratch.positions.clear();
        for node in &self.data.nodes {
            scratch.positions.push(node.pos);
        }
        if relax_collisions(
            &mut scratch.positions,
            &scratch.radii,
            &scratch.pinned,
            COLLISION_PADDING,
        ) {
            for (node, position) in self.data.nodes.iter_mut().zip(scratch.positions.iter()) {
                node.pos = *position;
            }
        }

        self.alpha *= 1.0 - ALPHA_DECAY;
        if self.alpha < ALPHA_MIN {
            self.running = false;
        }
        self.running
    }
}
