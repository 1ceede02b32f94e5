use egui::{Painter, Pos2, Stroke};

use super::*;

/// Hit-tests and draws one link between its two pin points.
///
/// `hovered` is recomputed from scratch. `selected` only ever turns on here:
/// clearing it is the editor's deselection pass.
pub(crate) fn link_ui(
    painter: &Painter,
    link: &mut Link,
    src: Pos2,
    dst: Pos2,
    pointer: Option<Pos2>,
    clicked: bool,
    style: &FlowStyle,
) {
    link.hovered = pointer.is_some_and(|p| {
        bezier::link_hit(p, src, dst, style.link_min_bend, style.link_hover_tolerance)
    });
    if link.hovered && clicked {
        link.selected = true;
    }

    let thickness = if link.hovered {
        style.link_hovered_thickness
    } else {
        style.link_thickness
    };

    if link.selected {
        let outline = Stroke::new(
            thickness + style.link_selected_outline_thickness * 2.0,
            style.colors.link_selected_outline,
        );
        bezier::draw_link(painter, src, dst, style.link_min_bend, outline);
    }
    bezier::draw_link(
        painter,
        src,
        dst,
        style.link_min_bend,
        Stroke::new(thickness, style.colors.link),
    );
}
