use eframe::egui::{pos2, vec2};

use cast_graph::{
    Entity, InputEvent, InteractionController, Relation, RelationType, SelectionAction, Simulation,
    Viewport, build_graph,
};

fn entities(names: &[(u64, &str)]) -> Vec<Entity> {
    names
        .iter()
        .map(|&(id, name)| Entity {
            id,
            name: name.to_owned(),
            avatar: None,
        })
        .collect()
}

fn relations(pairs: &[(u64, u64)]) -> Vec<Relation> {
    pairs
        .iter()
        .enumerate()
        .map(|(index, &(source_id, target_id))| Relation {
            id: Some(index as u64 + 1),
            source_id,
            target_id,
            type_id: 1,
            description: None,
        })
        .collect()
}

fn relation_types() -> Vec<RelationType> {
    vec![RelationType {
        id: 1,
        name: "knows".to_owned(),
        color: "#64b5f6".to_owned(),
    }]
}

fn settle(sim: &mut Simulation) {
    let mut ticks = 0;
    while sim.tick() {
        ticks += 1;
        assert!(ticks < 2_000, "layout never settled");
    }
}

#[test]
fn settled_layout_keeps_every_link_endpoint_resolvable() {
    let cast = entities(&[(1, "ana"), (2, "bruno"), (3, "clara"), (4, "dario")]);
    let links = relations(&[(1, 2), (2, 3), (3, 4), (4, 1), (1, 3)]);
    let mut sim = Simulation::start(build_graph(&cast, &links, &relation_types()));
    settle(&mut sim);

    assert_eq!(sim.links().len(), sim.edges().len());
    for (link, &(from, to)) in sim.links().iter().zip(sim.edges().iter()) {
        assert_eq!(sim.nodes()[from].id, link.source);
        assert_eq!(sim.nodes()[to].id, link.target);
    }
    for node in sim.nodes() {
        assert!(node.pos.x.is_finite() && node.pos.y.is_finite());
    }
}

#[test]
fn hit_test_agrees_with_the_render_projection_under_pan_and_zoom() {
    let cast = entities(&[(1, "ana"), (2, "bruno")]);
    let mut sim = Simulation::start(build_graph(&cast, &relations(&[(1, 2)]), &relation_types()));
    settle(&mut sim);

    let mut viewport = Viewport::new(vec2(900.0, 600.0));
    viewport.pan(vec2(80.0, -40.0));
    viewport.zoom_at(pos2(450.0, 300.0), 1.8);

    for node in sim.nodes() {
        let screen = viewport.world_to_screen(node.pos);
        assert_eq!(
            InteractionController::node_at(&sim, &viewport, screen),
            Some(node.id),
            "projected center of {} must hit-test back to it",
            node.name
        );
    }
}

#[test]
fn click_drag_click_sequence_selects_then_repositions_then_toggles_off() {
    let cast = entities(&[(1, "ana"), (2, "bruno"), (3, "clara")]);
    let mut sim = Simulation::start(build_graph(&cast, &relations(&[(1, 2), (2, 3)]), &relation_types()));
    settle(&mut sim);

    let mut viewport = Viewport::new(vec2(900.0, 600.0));
    let mut controller = InteractionController::new();
    let start = viewport.world_to_screen(sim.node(1).unwrap().pos);

    // Quick click selects.
    controller.handle(
        InputEvent::PointerPressed { pos: start, secondary: false },
        0.0,
        &mut sim,
        &mut viewport,
    );
    let selected = controller.handle(
        InputEvent::PointerReleased { pos: start },
        0.1,
        &mut sim,
        &mut viewport,
    );
    assert_eq!(selected, Some(SelectionAction::Toggle(1)));

    // Drag repositions without selecting; the node stays where released.
    let target = pos2(start.x + 120.0, start.y + 60.0);
    controller.handle(
        InputEvent::PointerPressed { pos: start, secondary: false },
        1.0,
        &mut sim,
        &mut viewport,
    );
    controller.handle(InputEvent::PointerMoved { pos: target }, 1.1, &mut sim, &mut viewport);
    let dragged = controller.handle(
        InputEvent::PointerReleased { pos: target },
        1.2,
        &mut sim,
        &mut viewport,
    );
    assert_eq!(dragged, None);
    let resting = sim.node(1).unwrap();
    assert!(resting.pinned.is_none());
    assert_eq!(resting.pos, viewport.screen_to_world(target));
    assert!(sim.is_running(), "a drag reheats the layout");

    // A second quick click at the new position toggles again.
    controller.handle(
        InputEvent::PointerPressed { pos: target, secondary: false },
        2.0,
        &mut sim,
        &mut viewport,
    );
    let toggled = controller.handle(
        InputEvent::PointerReleased { pos: target },
        2.1,
        &mut sim,
        &mut viewport,
    );
    assert_eq!(toggled, Some(SelectionAction::Toggle(1)));
}

#[test]
fn parallel_relations_between_one_pair_stay_individually_addressable() {
    let cast = entities(&[(1, "ana"), (2, "bruno")]);
    let mut links = relations(&[(1, 2), (1, 2)]);
    links[1].id = None;
    let sim = Simulation::start(build_graph(&cast, &links, &relation_types()));

    assert_eq!(sim.links().len(), 2);
    assert_ne!(sim.links()[0].id, sim.links()[1].id);
    assert_eq!(sim.node(1).unwrap().degree, 2);
}

#[test]
fn pinned_node_holds_through_a_settle_and_release_stays_put() {
    let cast = entities(&[(1, "ana"), (2, "bruno"), (3, "clara")]);
    let mut sim = Simulation::start(build_graph(&cast, &relations(&[(1, 2), (1, 3)]), &relation_types()));

    let held = vec2(160.0, -90.0);
    sim.pin(1, held);
    settle(&mut sim);
    assert_eq!(sim.node(1).unwrap().pos, held);

    sim.unpin(1);
    assert_eq!(sim.node(1).unwrap().pos, held);
    assert!(!sim.is_running(), "unpin alone does not reheat");
}
