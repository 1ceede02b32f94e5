use anyhow::Context as _;
use eframe::egui::{self, DragValue, Pos2, Ui};
use egui_node_flow::*;

/// Host widgets drawn in the middle of a node.
pub type NodeContent = Box<dyn FnMut(&mut Ui)>;

/// Pins carrying a single number.
const SCALAR: u32 = 0b01;
/// Pins carrying a 2d vector.
const VECTOR: u32 = 0b10;

#[cfg(feature = "persistence")]
const PERSISTENCE_KEY: &str = "egui_node_flow";

/// The kinds of node the demo can create.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeTemplate {
    Scalar,
    AddScalar,
    MakeVector,
    ScaleVector,
}

impl NodeTemplate {
    const ALL: [Self; 4] = [
        Self::Scalar,
        Self::AddScalar,
        Self::MakeVector,
        Self::ScaleVector,
    ];

    fn label(self) -> &'static str {
        match self {
            NodeTemplate::Scalar => "Scalar",
            NodeTemplate::AddScalar => "Add scalar",
            NodeTemplate::MakeVector => "Make vector",
            NodeTemplate::ScaleVector => "Scale vector",
        }
    }

    fn content(self) -> NodeContent {
        match self {
            NodeTemplate::Scalar => {
                let mut value = 0.0f32;
                Box::new(move |ui: &mut Ui| {
                    ui.add(DragValue::new(&mut value).speed(0.1));
                })
            }
            NodeTemplate::ScaleVector => {
                let mut uniform = true;
                Box::new(move |ui: &mut Ui| {
                    ui.checkbox(&mut uniform, "uniform");
                })
            }
            NodeTemplate::AddScalar | NodeTemplate::MakeVector => Box::new(|_: &mut Ui| {}),
        }
    }

    fn add_pins(
        self,
        graph: &mut Graph<NodeContent>,
        node_id: NodeId,
    ) -> Result<(), NodeFlowError> {
        match self {
            NodeTemplate::Scalar => {
                graph.add_output(node_id, "value", SCALAR)?;
            }
            NodeTemplate::AddScalar => {
                graph.add_input(node_id, "A", SCALAR)?;
                graph.add_input(node_id, "B", SCALAR)?;
                graph.add_output(node_id, "out", SCALAR)?;
            }
            NodeTemplate::MakeVector => {
                graph.add_input(node_id, "x", SCALAR)?;
                graph.add_input(node_id, "y", SCALAR)?;
                graph.add_output(node_id, "out", VECTOR)?;
            }
            NodeTemplate::ScaleVector => {
                graph.add_input(node_id, "vector", VECTOR)?;
                graph.add_input(node_id, "scale", PinFilter::ANY)?;
                graph.add_output(node_id, "out", VECTOR)?;
            }
        }
        Ok(())
    }

    fn build(self, graph: &mut Graph<NodeContent>, position: Pos2) -> NodeId {
        graph.add_node(self.label(), position, self.content(), |graph, node_id| {
            if let Err(err) = self.add_pins(graph, node_id) {
                log::error!("Could not add pins to {}: {err}", self.label());
            }
        })
    }
}

/// Wires a freshly built node to the pin a link was dropped from, using the
/// first pin on the opposite side that accepts it.
fn connect_dropped(
    graph: &mut Graph<NodeContent>,
    node_id: NodeId,
    dropped_from: PinId,
) -> anyhow::Result<LinkId> {
    let origin = graph
        .try_get_pin(dropped_from)
        .context("the pin the link was dragged from is gone")?;
    let (origin_kind, origin_filter) = (origin.kind(), origin.filter);
    let node = graph
        .try_get_node(node_id)
        .context("the new node is gone")?;
    let candidates = if origin_kind.is_output() {
        &node.inputs
    } else {
        &node.outputs
    };
    let target = candidates
        .iter()
        .copied()
        .find(|pin| graph.pins[*pin].filter.accepts(origin_filter))
        .with_context(|| format!("{} has no pin accepting {:?}", node.name, origin_filter))?;
    let link = if origin_kind.is_output() {
        graph.create_link(dropped_from, target)?
    } else {
        graph.create_link(target, dropped_from)?
    };
    Ok(link)
}

fn template_menu(ui: &mut Ui, popup: &mut PopupContext<'_, NodeContent>) {
    ui.label("Add node");
    ui.separator();
    for template in NodeTemplate::ALL {
        if ui.button(template.label()).clicked() {
            let node_id = template.build(popup.graph, popup.canvas_pos);
            if let Some(origin) = popup.dropped_from {
                if let Err(err) = connect_dropped(popup.graph, node_id, origin) {
                    log::warn!("Could not connect the new node: {err:#}");
                }
            }
            popup.close();
        }
    }
}

fn new_editor(style: FlowStyle) -> GraphEditorState<NodeContent> {
    let mut editor = GraphEditorState::with_style(style);
    editor.set_right_click_popup(template_menu);
    editor.set_dropped_link_popup(template_menu, None);
    editor
}

fn populate(graph: &mut Graph<NodeContent>) {
    let a = NodeTemplate::Scalar.build(graph, Pos2::new(40.0, 40.0));
    let b = NodeTemplate::Scalar.build(graph, Pos2::new(40.0, 160.0));
    let vector = NodeTemplate::MakeVector.build(graph, Pos2::new(260.0, 80.0));
    NodeTemplate::ScaleVector.build(graph, Pos2::new(480.0, 100.0));

    let wires = [
        (graph[a].outputs[0], graph[vector].inputs[0]),
        (graph[b].outputs[0], graph[vector].inputs[1]),
    ];
    for (output, input) in wires {
        if let Err(err) = graph.create_link(output, input) {
            log::warn!("Initial link failed: {err}");
        }
    }
}

/// The graph settings that survive a restart.
#[derive(Default)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
struct Settings {
    style: FlowStyle,
    canvas: VirtualCanvasConfig,
}

pub struct NodeFlowExample {
    editor: GraphEditorState<NodeContent>,
    /// A second graph, shown inside a zoomable canvas.
    zoomed_editor: GraphEditorState<NodeContent>,
    canvas: VirtualCanvas,
    event_log: Vec<String>,
}

impl NodeFlowExample {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        #[cfg(feature = "persistence")]
        let settings: Settings = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, PERSISTENCE_KEY))
            .unwrap_or_default();
        #[cfg(not(feature = "persistence"))]
        let settings = {
            let _ = cc;
            Settings::default()
        };

        let mut editor = new_editor(settings.style.clone());
        populate(&mut editor.graph);
        let mut zoomed_editor = new_editor(settings.style);
        populate(&mut zoomed_editor.graph);

        Self {
            editor,
            zoomed_editor,
            canvas: VirtualCanvas::new(settings.canvas),
            event_log: Vec::new(),
        }
    }

    fn record(&mut self, source: &str, response: GraphResponse<NodeContent>) {
        for event in response.events {
            let line = match event {
                GraphEvent::Connected { output, input, .. } => {
                    format!("{source}: connected {output:?} -> {input:?}")
                }
                GraphEvent::Disconnected { output, input } => {
                    format!("{source}: disconnected {output:?} -> {input:?}")
                }
                GraphEvent::DropRejected { reason, .. } => {
                    format!("{source}: link dropped ({reason:?})")
                }
                GraphEvent::NodeDeleted { node, .. } => {
                    format!("{source}: deleted {}", node.name)
                }
                GraphEvent::PopupOpened { dropped_from } => {
                    format!("{source}: popup (from pin: {})", dropped_from.is_some())
                }
            };
            log::info!("{line}");
            self.event_log.push(line);
        }
        let overflow = self.event_log.len().saturating_sub(200);
        self.event_log.drain(..overflow);
    }

    fn side_panel(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label("grid size");
            ui.add(DragValue::new(&mut self.editor.style.grid_size).range(8.0..=128.0));
        });
        self.zoomed_editor.style.grid_size = self.editor.style.grid_size;
        ui.separator();

        ui.heading("Zoomed graph");
        ui.label(format!("zoom: {:.2}", self.canvas.scale()));
        if ui.button("Reset view").clicked() {
            self.canvas.set_scroll(egui::Vec2::ZERO);
            self.zoomed_editor.set_scroll(egui::Vec2::ZERO);
        }
        ui.separator();

        let editor = &mut self.zoomed_editor;
        let response = self
            .canvas
            .show(ui, |ui| editor.draw_graph_editor(ui));
        self.record("zoomed", response);
    }
}

impl eframe::App for NodeFlowExample {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::bottom("event_log")
            .resizable(true)
            .default_height(120.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in &self.event_log {
                            ui.monospace(line);
                        }
                    });
            });
        egui::SidePanel::right("zoomed_graph")
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| self.side_panel(ui));
        let response = egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.editor.draw_graph_editor(ui))
            .inner;
        self.record("main", response);
    }

    #[cfg(feature = "persistence")]
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = Settings {
            style: self.editor.style.clone(),
            canvas: self.canvas.config.clone(),
        };
        eframe::set_value(storage, PERSISTENCE_KEY, &settings);
    }
}
