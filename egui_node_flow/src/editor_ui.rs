use std::collections::HashSet;

use super::*;
use crate::link_ui::link_ui;
use crate::node_ui::{node_ui, NodeFrame};
use crate::ui_state::{FrameInput, OpenPopup, PopupKind};
use egui::*;

/// Things that happened while drawing the graph. The graph has already been
/// updated when these are returned; they exist so host code can react.
#[derive(Clone, Debug)]
pub enum GraphEvent<C> {
    /// A link was created by dropping a dragged link onto a pin.
    Connected {
        link: LinkId,
        output: PinId,
        input: PinId,
    },
    /// A link went away: dragged onto again, replaced, deleted with the
    /// delete key, or torn down together with one of its nodes.
    Disconnected { output: PinId, input: PinId },
    /// A dragged link was released without connecting anything.
    DropRejected {
        origin: PinId,
        target: Option<PinId>,
        reason: DropRejection,
    },
    /// Emitted when a node is deleted. The node no longer exists in the graph,
    /// but its contents are passed along with the event.
    NodeDeleted { node_id: NodeId, node: Node<C> },
    /// A popup was opened. `dropped_from` is set for the dropped-link popup.
    PopupOpened { dropped_from: Option<PinId> },
}

/// The return value of [`GraphEditorState::draw_graph_editor`].
#[derive(Clone, Debug)]
pub struct GraphResponse<C> {
    pub events: Vec<GraphEvent<C>>,
}

impl<C> Default for GraphResponse<C> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

fn holds_modifiers(held: Modifiers, required: Modifiers) -> bool {
    (!required.alt || held.alt)
        && (!required.ctrl || held.ctrl)
        && (!required.shift || held.shift)
        && (!required.mac_cmd || held.mac_cmd)
        && (!required.command || held.command)
}

fn draw_grid_lines(painter: &Painter, rect: Rect, scroll: Vec2, step: f32, stroke: Stroke) {
    // Anything denser is just a filled rectangle.
    if !step.is_finite() || step < 2.0 {
        return;
    }
    let mut x = rect.min.x + scroll.x.rem_euclid(step);
    while x < rect.max.x {
        painter.line_segment([pos2(x, rect.min.y), pos2(x, rect.max.y)], stroke);
        x += step;
    }
    let mut y = rect.min.y + scroll.y.rem_euclid(step);
    while y < rect.max.y {
        painter.line_segment([pos2(rect.min.x, y), pos2(rect.max.x, y)], stroke);
        y += step;
    }
}

fn draw_grid(painter: &Painter, rect: Rect, scroll: Vec2, style: &FlowStyle) {
    painter.rect_filled(rect, 0.0, style.colors.background);
    draw_grid_lines(
        painter,
        rect,
        scroll,
        style.snap_step(),
        Stroke::new(1.0, style.colors.sub_grid),
    );
    draw_grid_lines(
        painter,
        rect,
        scroll,
        style.grid_size,
        Stroke::new(1.0, style.colors.grid),
    );
}

impl<C> GraphEditorState<C>
where
    C: NodeContentTrait,
{
    /// Draws the editor into all the space `ui` has left and runs one frame
    /// of interaction.
    #[must_use]
    pub fn draw_graph_editor(&mut self, ui: &mut Ui) -> GraphResponse<C> {
        let mut events = Vec::new();

        self.interaction.begin_frame();
        let input = FrameInput::gather(ui, self.scroll_button);
        self.interaction.pointer = input.pointer;
        if input.primary_pressed {
            self.interaction.press_pos = input.pointer;
        }

        /* Canvas region and grid */
        let canvas_rect = ui.available_rect_before_wrap();
        ui.allocate_rect(canvas_rect, Sense::hover());
        let canvas_hovered = ui.rect_contains_pointer(canvas_rect);
        let mut canvas_ui = ui.new_child(
            UiBuilder::new()
                .max_rect(canvas_rect)
                .layout(Layout::top_down(Align::Min)),
        );
        canvas_ui.set_clip_rect(canvas_rect.intersect(ui.clip_rect()));
        self.origin = canvas_rect.min;
        let offset = self.canvas_offset();
        let painter = canvas_ui.painter().clone();
        draw_grid(&painter, canvas_rect, self.scroll, &self.style);

        /* Deselection. A click on an already selected node keeps the
         * selection so that it can be dragged. */
        let clicked = canvas_hovered && input.primary_pressed;
        if clicked && !input.modifiers.command {
            for link in self.graph.links.values_mut() {
                link.selected = false;
            }
            if !self.on_selected_node() {
                for node in self.graph.nodes.values_mut() {
                    node.selected = false;
                }
            }
        }

        /* Nodes, then links */
        let linked_outputs: HashSet<PinId> = self.graph.links.values().map(|l| l.left).collect();
        let mut pressed_node = None;
        {
            let mut frame = NodeFrame {
                style: &self.style,
                input: &input,
                offset,
                canvas_hovered,
                press_pos: self.interaction.press_pos,
                linked_outputs: &linked_outputs,
                hovering: &mut self.interaction.hovering,
                dragging_node: &mut self.interaction.dragging_node,
            };
            let Graph {
                nodes,
                pins,
                node_order,
                ..
            } = &mut self.graph;
            for node_id in node_order.iter() {
                if let Some(node) = nodes.get_mut(*node_id) {
                    if node_ui(&mut canvas_ui, node, pins, &mut frame) {
                        pressed_node = Some(*node_id);
                    }
                }
            }
        }
        // The last pressed node is the topmost one under the pointer.
        if let Some(node_id) = pressed_node {
            self.graph.raise_node(node_id);
        }

        for link_id in self.links.iter().copied() {
            let Some(link) = self.graph.links.get(link_id) else {
                continue;
            };
            let (Some(left), Some(right)) =
                (self.graph.pins.get(link.left), self.graph.pins.get(link.right))
            else {
                continue;
            };
            let (src, dst) = (left.pin_point(), right.pin_point());
            if let Some(link) = self.graph.links.get_mut(link_id) {
                link_ui(&painter, link, src, dst, input.pointer, clicked, &self.style);
            }
        }

        /* Link drop-off */
        if let Some(origin) = self.interaction.drag_out {
            if input.primary_released {
                let modifiers_held = self
                    .dropped_link_modifiers
                    .map_or(true, |required| holds_modifiers(input.modifiers, required));
                let offer_popup = canvas_hovered
                    && modifiers_held
                    && self.dropped_link_popup.is_some()
                    && self.on_free_space();
                let target = self.interaction.hovering;
                let outcome = resolve_link_drop(&self.graph, origin, target, offer_popup);
                self.apply_drop(ui, outcome, origin, target, &input, &mut events);
            }
        }

        /* Link drag-out */
        if self.interaction.drag_out.is_none() && !self.interaction.dragging_node.get() && clicked {
            if let Some(pin) = self.interaction.hovering {
                self.interaction.drag_out = Some(pin);
            }
        }
        if let Some(origin) = self.interaction.drag_out {
            match (self.graph.try_get_pin(origin), input.pointer) {
                (Some(pin), Some(pointer)) => {
                    let start = pin.pin_point();
                    let (src, dst) = match pin.kind() {
                        PinKind::Output => (start, pointer),
                        PinKind::Input => (pointer, start),
                    };
                    bezier::draw_link(
                        &painter,
                        src,
                        dst,
                        self.style.link_min_bend,
                        Stroke::new(
                            self.style.drag_out_link_thickness,
                            self.style.colors.drag_out_link,
                        ),
                    );
                }
                (None, _) => self.interaction.drag_out = None,
                (Some(_), None) => {}
            }
            if input.primary_released {
                self.interaction.drag_out = None;
            }
        }

        /* Deletion */
        if input.delete_pressed {
            self.delete_selected(&mut events);
        }

        self.prune_links();

        /* Popups */
        if input.secondary_pressed
            && canvas_hovered
            && self.right_click_popup.is_some()
            && self.on_free_space()
        {
            if let Some(pointer) = input.pointer {
                self.open_popup(ui, PopupKind::RightClick, pointer, &mut events);
            }
        }
        self.show_popup(ui, &input);
        // Popup callbacks may have linked pins directly on the graph.
        self.prune_links();

        /* Scrolling */
        if canvas_hovered && input.scroll_button_down && !ui.ctx().is_using_pointer() {
            self.scroll += input.pointer_delta;
        }

        GraphResponse { events }
    }

    fn apply_drop(
        &mut self,
        ui: &Ui,
        outcome: DropOutcome,
        origin: PinId,
        target: Option<PinId>,
        input: &FrameInput,
        events: &mut Vec<GraphEvent<C>>,
    ) {
        match outcome {
            DropOutcome::Connected { output, input: input_pin } => {
                if let Some(replaced) = self.graph.link_of(input_pin).map(|l| l.left) {
                    events.push(GraphEvent::Disconnected {
                        output: replaced,
                        input: input_pin,
                    });
                }
                if let Ok(link) = self.create_link(output, input_pin) {
                    events.push(GraphEvent::Connected {
                        link,
                        output,
                        input: input_pin,
                    });
                }
            }
            DropOutcome::Disconnected { output, input: input_pin } => {
                if self.delete_link(input_pin).is_some() {
                    events.push(GraphEvent::Disconnected {
                        output,
                        input: input_pin,
                    });
                }
            }
            DropOutcome::OfferPopup { origin } => {
                if let Some(pointer) = input.pointer {
                    self.open_popup(ui, PopupKind::DroppedLink(origin), pointer, events);
                }
            }
            DropOutcome::Rejected(reason) => {
                log::trace!("link drop from {:?} onto {:?} rejected: {:?}", origin, target, reason);
                events.push(GraphEvent::DropRejected {
                    origin,
                    target,
                    reason,
                });
            }
        }
    }

    fn delete_selected(&mut self, events: &mut Vec<GraphEvent<C>>) {
        let doomed_links: SVec<PinId> = self
            .graph
            .links
            .values()
            .filter(|link| link.selected)
            .map(|link| link.right)
            .collect();
        for input in doomed_links {
            if let Some(link) = self.graph.delete_link(input) {
                events.push(GraphEvent::Disconnected {
                    output: link.left,
                    input: link.right,
                });
            }
        }

        let doomed_nodes: SVec<NodeId> = self.graph.selected_nodes().collect();
        for node_id in doomed_nodes {
            if let Some((node, disconnected)) = self.graph.remove_node(node_id) {
                if node.dragged {
                    self.interaction.dragging_node.set_next(false);
                }
                events.extend(
                    disconnected
                        .into_iter()
                        .map(|(output, input)| GraphEvent::Disconnected { output, input }),
                );
                events.push(GraphEvent::NodeDeleted { node_id, node });
            }
        }
    }

    fn open_popup(
        &mut self,
        ui: &Ui,
        kind: PopupKind,
        screen_pos: Pos2,
        events: &mut Vec<GraphEvent<C>>,
    ) {
        let dropped_from = match kind {
            PopupKind::DroppedLink(pin) => Some(pin),
            PopupKind::RightClick => None,
        };
        log::debug!("opening popup at {:?} (dropped from {:?})", screen_pos, dropped_from);
        self.popup = Some(OpenPopup {
            kind,
            screen_pos,
            canvas_pos: self.screen_to_canvas(screen_pos),
            opened_frame: ui.ctx().cumulative_pass_nr(),
        });
        events.push(GraphEvent::PopupOpened { dropped_from });
    }

    fn show_popup(&mut self, ui: &Ui, input: &FrameInput) {
        let Some(popup) = self.popup else {
            return;
        };
        let callback = match popup.kind {
            PopupKind::RightClick => self.right_click_popup.as_mut(),
            PopupKind::DroppedLink(_) => self.dropped_link_popup.as_mut(),
        };
        let Some(callback) = callback else {
            self.popup = None;
            return;
        };

        let mut popup_ctx = PopupContext::new(&mut self.graph, &popup);
        let area = Area::new(ui.id().with("node_flow_popup"))
            .order(Order::Foreground)
            .fixed_pos(popup.screen_pos)
            .show(ui.ctx(), |ui| {
                Frame::popup(ui.style()).show(ui, |ui| callback(ui, &mut popup_ctx));
            });

        let fresh = popup.opened_frame == ui.ctx().cumulative_pass_nr();
        let clicked_outside = !fresh
            && (input.primary_pressed || input.secondary_pressed)
            && input
                .pointer
                .is_some_and(|p| !area.response.rect.contains(p));
        if popup_ctx.should_close() || input.escape_pressed || clicked_outside {
            self.popup = None;
        }
    }
}
