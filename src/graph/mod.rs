mod build;

use std::collections::HashMap;

use eframe::egui::{Color32, Vec2};
use serde::Deserialize;

pub use build::build_graph;

/// Identifier of an entity as assigned by the host application.
pub type EntityId = u64;

/// A character (or other cast member) supplied by the host application.
#[derive(Clone, Debug, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A directed relation between two entities. Multiple relations between the
/// same pair are allowed and stay individually addressable.
#[derive(Clone, Debug, Deserialize)]
pub struct Relation {
    #[serde(default)]
    pub id: Option<u64>,
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub type_id: u64,
    #[serde(default)]
    pub description: Option<String>,
}

/// A relation type mapping a type id to a display name and a CSS hex color.
#[derive(Clone, Debug, Deserialize)]
pub struct RelationType {
    pub id: u64,
    pub name: String,
    pub color: String,
}

/// Render-ready node derived from an [`Entity`]. Position and velocity are
/// owned by the simulation; `pinned`, when set, overrides simulated motion.
#[derive(Clone, Debug)]
pub struct GraphNode {
    pub id: EntityId,
    pub name: String,
    pub avatar: Option<String>,
    pub color: Color32,
    pub degree: usize,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub pinned: Option<Vec2>,
}

const BASE_RADIUS: f32 = 14.0;
const DEGREE_GROWTH: f32 = 0.15;
const MAX_DEGREE_MULTIPLIER: f32 = 2.2;

impl GraphNode {
    /// World-space disc radius, grown with degree up to a fixed multiplier.
    pub fn radius(&self) -> f32 {
        BASE_RADIUS * (1.0 + self.degree as f32 * DEGREE_GROWTH).min(MAX_DEGREE_MULTIPLIER)
    }
}

/// Render-ready link derived from a [`Relation`].
#[derive(Clone, Debug)]
pub struct GraphLink {
    pub id: String,
    pub source: EntityId,
    pub target: EntityId,
    pub type_id: u64,
    pub color: Color32,
    pub label: String,
}

/// Output of the graph builder: nodes, links, and an id-to-index map. Every
/// link endpoint is guaranteed to resolve through `index_by_id`.
#[derive(Clone, Debug, Default)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub index_by_id: HashMap<EntityId, usize>,
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: EntityId) -> Option<&GraphNode> {
        self.index_by_id.get(&id).map(|&index| &self.nodes[index])
    }
}
