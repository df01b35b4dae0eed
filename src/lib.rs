//! Interactive force-directed viewer for character relationship graphs.
//!
//! The host supplies flat entity/relation/relation-type collections;
//! [`GraphView`] turns them into a live node-link diagram with pan, zoom,
//! drag-to-pin, selection, and fuzzy name search.

pub mod graph;
pub mod sim;
pub mod view;
mod util;

pub use graph::{Entity, EntityId, GraphData, GraphLink, GraphNode, Relation, RelationType, build_graph};
pub use sim::Simulation;
pub use view::{GraphView, InputEvent, InteractionController, KeyCommand, SelectionAction, Viewport};
