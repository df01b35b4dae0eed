use std::collections::HashMap;

use eframe::egui::{Color32, Vec2};
use tracing::warn;

use crate::util::stable_jitter;

use super::{Entity, EntityId, GraphData, GraphLink, GraphNode, Relation, RelationType};

/// Fixed cyclic palette indexed by `entity id % len`, so node colors are
/// deterministic across rebuilds.
const NODE_PALETTE: [Color32; 10] = [
    Color32::from_rgb(0x1e, 0x88, 0xe5),
    Color32::from_rgb(0xe5, 0x39, 0x35),
    Color32::from_rgb(0x43, 0xa0, 0x47),
    Color32::from_rgb(0xfb, 0x8c, 0x00),
    Color32::from_rgb(0x8e, 0x24, 0xaa),
    Color32::from_rgb(0x00, 0xac, 0xc1),
    Color32::from_rgb(0xf9, 0xa8, 0x25),
    Color32::from_rgb(0x5e, 0x35, 0xb1),
    Color32::from_rgb(0x39, 0x49, 0xab),
    Color32::from_rgb(0x00, 0x89, 0x7b),
];

/// Fallback for links whose relation type id is unknown.
const NEUTRAL_LINK_COLOR: Color32 = Color32::from_rgb(0x94, 0xa3, 0xb8);
const UNKNOWN_LINK_LABEL: &str = "unknown";

/// Spread of the deterministic initial node placement, in world units.
const INITIAL_SCATTER: f32 = 120.0;

pub(crate) fn node_color(id: EntityId) -> Color32 {
    NODE_PALETTE[(id % NODE_PALETTE.len() as u64) as usize]
}

fn parse_hex_color(value: &str) -> Option<Color32> {
    let hex = value.strip_prefix('#')?;
    // Length is in bytes; non-ASCII input must be rejected before slicing.
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}

fn link_id(relation: &Relation, index: usize) -> String {
    match relation.id {
        Some(id) => format!("rel-{id}"),
        None => format!(
            "rel-{index}-{source}-{target}",
            source = relation.source_id,
            target = relation.target_id
        ),
    }
}

/// Derives a render-ready node/link collection from raw entities and
/// relations. Pure: re-invoke only when the identity of the input
/// collections changes, not per frame.
///
/// Relations referencing an unknown entity are dropped (and logged) rather
/// than producing a dangling link; an unknown relation type falls back to a
/// neutral color and an "unknown" label.
pub fn build_graph(
    entities: &[Entity],
    relations: &[Relation],
    relation_types: &[RelationType],
) -> GraphData {
    let mut index_by_id = HashMap::with_capacity(entities.len());
    for (index, entity) in entities.iter().enumerate() {
        index_by_id.insert(entity.id, index);
    }

    let mut degrees: HashMap<EntityId, usize> = HashMap::with_capacity(entities.len());
    for relation in relations {
        if index_by_id.contains_key(&relation.source_id)
            && index_by_id.contains_key(&relation.target_id)
        {
            *degrees.entry(relation.source_id).or_insert(0) += 1;
            *degrees.entry(relation.target_id).or_insert(0) += 1;
        }
    }

    let type_by_id = relation_types
        .iter()
        .map(|relation_type| (relation_type.id, relation_type))
        .collect::<HashMap<_, _>>();

    let nodes = entities
        .iter()
        .map(|entity| {
            let (jx, jy) = stable_jitter(entity.id);
            GraphNode {
                id: entity.id,
                name: entity.name.clone(),
                avatar: entity.avatar.clone(),
                color: node_color(entity.id),
                degree: degrees.get(&entity.id).copied().unwrap_or(0),
                pos: Vec2::new(jx, jy) * INITIAL_SCATTER,
                velocity: Vec2::ZERO,
                pinned: None,
            }
        })
        .collect::<Vec<_>>();

    let mut links = Vec::with_capacity(relations.len());
    for (index, relation) in relations.iter().enumerate() {
        if !index_by_id.contains_key(&relation.source_id)
            || !index_by_id.contains_key(&relation.target_id)
        {
            warn!(
                source = relation.source_id,
                target = relation.target_id,
                "dropping relation referencing unknown entity"
            );
            continue;
        }

        let relation_type = type_by_id.get(&relation.type_id);
        links.push(GraphLink {
            id: link_id(relation, index),
            source: relation.source_id,
            target: relation.target_id,
            type_id: relation.type_id,
            color: relation_type
                .and_then(|relation_type| parse_hex_color(&relation_type.color))
                .unwrap_or(NEUTRAL_LINK_COLOR),
            label: relation_type
                .map(|relation_type| relation_type.name.clone())
                .unwrap_or_else(|| UNKNOWN_LINK_LABEL.to_owned()),
        });
    }

    GraphData {
        nodes,
        links,
        index_by_id,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn entity(id: EntityId, name: &str) -> Entity {
        Entity {
            id,
            name: name.to_owned(),
            avatar: None,
        }
    }

    fn relation(id: Option<u64>, source_id: EntityId, target_id: EntityId) -> Relation {
        Relation {
            id,
            source_id,
            target_id,
            type_id: 1,
            description: None,
        }
    }

    fn sample_types() -> Vec<RelationType> {
        vec![RelationType {
            id: 1,
            name: "friend".to_owned(),
            color: "#ff8800".to_owned(),
        }]
    }

    #[test]
    fn every_link_endpoint_resolves_to_a_node() {
        let entities = vec![entity(1, "a"), entity(2, "b")];
        let relations = vec![
            relation(Some(10), 1, 2),
            relation(Some(11), 1, 99),
            relation(Some(12), 98, 2),
        ];

        let graph = build_graph(&entities, &relations, &sample_types());

        assert_eq!(graph.links.len(), 1);
        for link in &graph.links {
            assert!(graph.index_by_id.contains_key(&link.source));
            assert!(graph.index_by_id.contains_key(&link.target));
        }
    }

    #[test]
    fn duplicate_relation_pairs_get_unique_link_ids() {
        let entities = vec![entity(1, "a"), entity(2, "b")];
        let relations = vec![relation(None, 1, 2), relation(None, 1, 2)];

        let graph = build_graph(&entities, &relations, &sample_types());

        let ids = graph.links.iter().map(|link| link.id.as_str()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn degree_counts_both_endpoints_and_ignores_dropped_relations() {
        let entities = vec![entity(1, "a"), entity(2, "b"), entity(3, "c")];
        let relations = vec![
            relation(Some(1), 1, 2),
            relation(Some(2), 1, 3),
            relation(Some(3), 1, 42),
        ];

        let graph = build_graph(&entities, &relations, &sample_types());

        assert_eq!(graph.node(1).unwrap().degree, 2);
        assert_eq!(graph.node(2).unwrap().degree, 1);
        assert_eq!(graph.node(3).unwrap().degree, 1);
    }

    #[test]
    fn node_color_is_deterministic_across_rebuilds() {
        let entities = vec![entity(7, "a")];
        let first = build_graph(&entities, &[], &sample_types());
        let second = build_graph(&entities, &[], &sample_types());
        assert_eq!(first.nodes[0].color, second.nodes[0].color);
        assert_eq!(first.nodes[0].color, node_color(7));
    }

    #[test]
    fn unknown_relation_type_falls_back_to_neutral_color_and_label() {
        let entities = vec![entity(1, "a"), entity(2, "b")];
        let relations = vec![Relation {
            id: Some(5),
            source_id: 1,
            target_id: 2,
            type_id: 999,
            description: None,
        }];

        let graph = build_graph(&entities, &relations, &sample_types());

        assert_eq!(graph.links[0].color, NEUTRAL_LINK_COLOR);
        assert_eq!(graph.links[0].label, UNKNOWN_LINK_LABEL);
    }

    #[test]
    fn malformed_type_color_falls_back_to_neutral() {
        let entities = vec![entity(1, "a"), entity(2, "b")];
        let relations = vec![relation(Some(5), 1, 2)];

        // "#€abc" is six bytes but not six ASCII hex digits.
        for color in ["tomato", "#12345", "#1234567", "#€abc", "#gghhii", ""] {
            let types = vec![RelationType {
                id: 1,
                name: "rival".to_owned(),
                color: color.to_owned(),
            }];

            let graph = build_graph(&entities, &relations, &types);

            assert_eq!(graph.links[0].color, NEUTRAL_LINK_COLOR, "color {color:?}");
            assert_eq!(graph.links[0].label, "rival");
        }
    }

    #[test]
    fn initial_positions_are_distinct_and_deterministic() {
        let entities = (0..6).map(|id| entity(id, "n")).collect::<Vec<_>>();
        let graph = build_graph(&entities, &[], &sample_types());

        for (i, a) in graph.nodes.iter().enumerate() {
            assert!(a.pos.x.is_finite() && a.pos.y.is_finite());
            for b in graph.nodes.iter().skip(i + 1) {
                assert!((a.pos - b.pos).length() > f32::EPSILON);
            }
        }
    }
}
