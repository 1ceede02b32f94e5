use std::collections::HashSet;

use egui::{pos2, Pos2, Rect, Rounding, Shape, Ui, UiBuilder, Vec2};

use super::*;
use crate::pin_ui::{calc_width, pin_ui, PinFrame};
use crate::ui_state::FrameInput;
use crate::utils::ColorUtils;

/// Per-frame values shared by every node update.
pub(crate) struct NodeFrame<'a> {
    pub style: &'a FlowStyle,
    pub input: &'a FrameInput,
    /// Canvas to screen translation.
    pub offset: Vec2,
    /// Presses only count while the pointer is over the canvas itself.
    pub canvas_hovered: bool,
    pub press_pos: Option<Pos2>,
    /// Output pins with at least one link, so their glyph can be filled.
    pub linked_outputs: &'a HashSet<PinId>,
    pub hovering: &'a mut Option<PinId>,
    pub dragging_node: &'a mut DoubleBuffered<bool>,
}

impl<C> Node<C> {
    /// True if `pointer` lies within the padded node rect, where `offset`
    /// maps canvas space to screen space.
    pub fn hovered(&self, pointer: Option<Pos2>, offset: Vec2) -> bool {
        let rect = self.rect().translate(offset);
        pointer.is_some_and(|p| rect.contains(p))
    }
}

/// Lays out, draws and interacts with a single node.
///
/// Layout goes title, input pins, host content, output pins. The node's
/// background shapes are reserved before any of that is painted and filled
/// in afterwards, so they end up under the content.
///
/// Returns true when the primary button was pressed over the node.
pub(crate) fn node_ui<C: NodeContentTrait>(
    ui: &mut Ui,
    node: &mut Node<C>,
    pins: &mut SlotMap<PinId, Pin>,
    frame: &mut NodeFrame,
) -> bool {
    let style = frame.style;
    let painter = ui.painter().clone();
    let background_shape = painter.add(Shape::Noop);
    let header_shape = painter.add(Shape::Noop);
    let border_shape = painter.add(Shape::Noop);

    let screen_pos = node.position + frame.offset;
    let node_id = node.id;
    let linked_outputs = frame.linked_outputs;
    let mut pin_frame = PinFrame {
        style,
        pointer: frame.input.pointer,
        hovering: &mut *frame.hovering,
    };

    let node_rect = Rect::from_min_size(screen_pos, Vec2::INFINITY);
    let inner = ui.allocate_new_ui(UiBuilder::new().max_rect(node_rect), |ui| {
        ui.push_id(node_id, |ui| {
            ui.vertical(|ui| {
                let title = ui.colored_label(style.colors.node_header_title, node.name.as_str());
                let spacer = style.node_padding.top_left.y;
                ui.add_space(spacer);
                let header_bottom = title.rect.max.y + spacer / 2.0;

                ui.horizontal_top(|ui| {
                    ui.vertical(|ui| {
                        for pin_id in &node.inputs {
                            if let Some(pin) = pins.get_mut(*pin_id) {
                                let connected = pin.link.is_some();
                                pin_ui(ui, pin, None, connected, &mut pin_frame);
                            }
                        }
                    });

                    ui.vertical(|ui| node.content.content_ui(ui, node_id));

                    ui.vertical(|ui| {
                        let row_width = node
                            .outputs
                            .iter()
                            .filter_map(|id| pins.get(*id))
                            .map(|pin| calc_width(ui, pin, style))
                            .fold(0.0, f32::max);
                        for pin_id in &node.outputs {
                            if let Some(pin) = pins.get_mut(*pin_id) {
                                let connected = linked_outputs.contains(pin_id);
                                pin_ui(ui, pin, Some(row_width), connected, &mut pin_frame);
                            }
                        }
                    });
                });

                header_bottom
            })
            .inner
        })
        .inner
    });

    node.size = inner.response.rect.size();
    let rect = node.rect().translate(frame.offset);
    let header_rect = Rect::from_min_max(rect.min, pos2(rect.max.x, inner.inner));

    let input = frame.input;
    let mut pressed = false;
    if frame.canvas_hovered && input.primary_pressed {
        if let Some(pointer) = input.pointer.filter(|p| rect.contains(*p)) {
            pressed = true;
            node.selected = true;
            if header_rect.contains(pointer) {
                node.dragged = true;
                node.drag_origin = node.position;
                frame.dragging_node.set_next(true);
            }
        }
    }

    if node.dragged {
        if let (Some(pointer), Some(press_pos)) = (input.pointer, frame.press_pos) {
            let wanted = node.drag_origin + (pointer - press_pos);
            node.position = snap_to_grid(wanted, style.snap_step());
        }
        if input.primary_released {
            node.dragged = false;
            node.drag_origin = node.position;
            frame.dragging_node.set_next(false);
        }
    }

    let radius = style.node_radius;
    painter.set(
        background_shape,
        Shape::rect_filled(rect, radius, style.colors.node_background),
    );
    painter.set(
        header_shape,
        Shape::rect_filled(
            header_rect,
            Rounding {
                nw: radius,
                ne: radius,
                sw: 0.0,
                se: 0.0,
            },
            if node.dragged {
                style.colors.node_header.lighten(1.4)
            } else {
                style.colors.node_header
            },
        ),
    );
    painter.set(
        border_shape,
        Shape::rect_stroke(rect, radius, style.node_border(node.selected)),
    );
    pressed
}
