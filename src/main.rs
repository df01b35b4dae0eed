use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use eframe::egui;
use serde::Deserialize;

use cast_graph::{Entity, GraphView, Relation, RelationType};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with `entities`, `relations`, and `relation_types` arrays.
    /// Without it a built-in sample cast is shown.
    #[arg(long)]
    cast: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct CastFile {
    entities: Vec<Entity>,
    relations: Vec<Relation>,
    relation_types: Vec<RelationType>,
}

fn load_cast(path: &PathBuf) -> anyhow::Result<CastFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading cast file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing cast file {}", path.display()))
}

fn sample_cast() -> CastFile {
    let entities = [
        (1, "Mariana"),
        (2, "Teodoro"),
        (3, "Ilse"),
        (4, "Padre Anselmo"),
        (5, "Catalina"),
        (6, "El Forastero"),
        (7, "Rosa"),
    ]
    .into_iter()
    .map(|(id, name)| Entity {
        id,
        name: name.to_owned(),
        avatar: None,
    })
    .collect();

    let relations = [
        (1, 1, 2, 1, Some("childhood friends")),
        (2, 1, 3, 2, Some("rivals for the estate")),
        (3, 2, 4, 3, None),
        (4, 3, 5, 1, Some("confidants")),
        (5, 5, 6, 2, None),
        (6, 6, 1, 3, Some("owes a debt")),
        (7, 7, 1, 1, None),
        (8, 7, 4, 3, Some("keeps his secret")),
    ]
    .into_iter()
    .map(|(id, source_id, target_id, type_id, description)| Relation {
        id: Some(id),
        source_id,
        target_id,
        type_id,
        description: description.map(str::to_owned),
    })
    .collect();

    let relation_types = vec![
        RelationType {
            id: 1,
            name: "friendship".to_owned(),
            color: "#34d399".to_owned(),
        },
        RelationType {
            id: 2,
            name: "rivalry".to_owned(),
            color: "#f87171".to_owned(),
        },
        RelationType {
            id: 3,
            name: "secret".to_owned(),
            color: "#a78bfa".to_owned(),
        },
    ];

    CastFile {
        entities,
        relations,
        relation_types,
    }
}

struct DemoApp {
    view: GraphView,
    entities: Vec<Entity>,
    relation_types: Vec<RelationType>,
}

impl DemoApp {
    fn new(cast: CastFile) -> Self {
        let mut view = GraphView::new(&cast.entities, &cast.relations, &cast.relation_types);
        view.on_selection_changed(Box::new(|selected| match selected {
            Some(id) => tracing::info!(id, "entity selected"),
            None => tracing::info!("selection cleared"),
        }));

        Self {
            view,
            entities: cast.entities,
            relation_types: cast.relation_types,
        }
    }

    fn selected_name(&self) -> Option<&str> {
        let id = self.view.selected()?;
        self.entities
            .iter()
            .find(|entity| entity.id == id)
            .map(|entity| entity.name.as_str())
    }
}

impl eframe::App for DemoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Search:");
                ui.add(
                    egui::TextEdit::singleline(self.view.search_mut())
                        .hint_text("character name")
                        .desired_width(180.0),
                );
                if ui.button("Reset view").clicked() {
                    self.view.reset();
                }
                if ui.button("+").clicked() {
                    self.view.zoom_in();
                }
                if ui.button("-").clicked() {
                    self.view.zoom_out();
                }

                ui.separator();
                for relation_type in &self.relation_types {
                    let mut shown = !self.view.is_type_hidden(relation_type.id);
                    if ui.checkbox(&mut shown, &relation_type.name).changed() {
                        self.view.set_type_hidden(relation_type.id, !shown);
                    }
                }

                ui.separator();
                match self.selected_name() {
                    Some(name) => ui.label(format!("Selected: {name}")),
                    None => ui.label("Selected: none"),
                };
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.view.show(ui);
            });
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cast = match &args.cast {
        Some(path) => load_cast(path)?,
        None => sample_cast(),
    };
    tracing::info!(
        entities = cast.entities.len(),
        relations = cast.relations.len(),
        "cast loaded"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 840.0]),
        ..Default::default()
    };

    eframe::run_native(
        "cast-graph",
        options,
        Box::new(move |_cc| Ok(Box::new(DemoApp::new(cast)))),
    )
    .map_err(|error| anyhow::anyhow!("{error}"))
}
