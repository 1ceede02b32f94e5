use std::sync::Arc;

use egui::{pos2, vec2, Galley, Pos2, Sense, Stroke, TextStyle, Ui};

use super::*;

fn label_galley(ui: &Ui, pin: &Pin, style: &FlowStyle) -> Arc<Galley> {
    let font_id = TextStyle::Body.resolve(ui.style());
    ui.painter()
        .layout_no_wrap(pin.name.clone(), font_id, style.colors.pin_label)
}

fn glyph_width(style: &FlowStyle) -> f32 {
    style.pin_radius * 2.0
}

/// Horizontal room a pin row takes: glyph, gap and label.
pub fn calc_width(ui: &Ui, pin: &Pin, style: &FlowStyle) -> f32 {
    glyph_width(style) + style.pin_spacing + label_galley(ui, pin, style).size().x
}

/// Per-frame values a pin needs while it lays itself out.
pub(crate) struct PinFrame<'a> {
    pub style: &'a FlowStyle,
    pub pointer: Option<Pos2>,
    /// Written when the pointer is within the pin's hit radius.
    pub hovering: &'a mut Option<PinId>,
}

/// Lays out and draws one pin row at the ui cursor.
///
/// Input pins draw their glyph on the left edge of the row. Output pins draw
/// it on the right edge of a row `row_width` wide, so that every output of a
/// node shares the same connector column.
pub(crate) fn pin_ui(
    ui: &mut Ui,
    pin: &mut Pin,
    row_width: Option<f32>,
    connected: bool,
    frame: &mut PinFrame,
) {
    let style = frame.style;
    let galley = label_galley(ui, pin, style);
    let own_width = glyph_width(style) + style.pin_spacing + galley.size().x;
    let width = row_width.unwrap_or(own_width).max(own_width);
    let height = galley.size().y.max(glyph_width(style));

    let (rect, _) = ui.allocate_exact_size(vec2(width, height), Sense::hover());
    let anchor = rect.min + vec2(width - own_width, 0.0);
    let mid_y = rect.center().y;
    let label_y = mid_y - galley.size().y / 2.0;
    let (glyph_center, label_pos) = match pin.kind {
        PinKind::Input => (
            pos2(anchor.x + style.pin_radius, mid_y),
            pos2(anchor.x + glyph_width(style) + style.pin_spacing, label_y),
        ),
        PinKind::Output => (
            pos2(rect.max.x - style.pin_radius, mid_y),
            pos2(anchor.x, label_y),
        ),
    };

    pin.set_anchor(anchor);
    pin.point_offset = glyph_center - anchor;

    let hovered = frame
        .pointer
        .is_some_and(|p| p.distance(glyph_center) <= style.pin_hit_radius);
    if hovered {
        *frame.hovering = Some(pin.id);
    }

    let painter = ui.painter();
    let color = if hovered {
        style.colors.pin_hovered
    } else {
        style.colors.pin
    };
    if connected || hovered {
        painter.circle_filled(glyph_center, style.pin_radius, color);
    } else {
        painter.circle_stroke(glyph_center, style.pin_radius, Stroke::new(1.5, color));
    }
    painter.galley(label_pos, galley, style.colors.pin_label);
}
