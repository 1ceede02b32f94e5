//! Drives the editor headlessly through `egui::Context::run` with synthetic
//! pointer and keyboard input.

use egui::{
    CentralPanel, Context, Event, Key, Modifiers, PointerButton, Pos2, RawInput, Rect, Vec2,
};
use egui_node_flow::*;

struct Harness {
    ctx: Context,
    editor: GraphEditorState<NoContent>,
}

impl Harness {
    fn new() -> Self {
        Self {
            ctx: Context::default(),
            editor: GraphEditorState::new(),
        }
    }

    fn frame(&mut self, events: Vec<Event>) -> Vec<GraphEvent<NoContent>> {
        self.frame_with(events, Modifiers::NONE)
    }

    /// Runs one frame with `modifiers` held throughout.
    fn frame_with(&mut self, events: Vec<Event>, modifiers: Modifiers) -> Vec<GraphEvent<NoContent>> {
        let input = RawInput {
            screen_rect: Some(screen()),
            modifiers,
            events,
            ..Default::default()
        };
        let mut events = Vec::new();
        let editor = &mut self.editor;
        let _ = self.ctx.run(input, |ctx| {
            CentralPanel::default().show(ctx, |ui| {
                events = editor.draw_graph_editor(ui).events;
            });
        });
        events
    }

    /// Press at `from`, move to `to`, release there. Returns every event
    /// reported along the way.
    fn drag(&mut self, from: Pos2, to: Pos2) -> Vec<GraphEvent<NoContent>> {
        let mut events = self.frame(vec![Event::PointerMoved(from), button(from, true)]);
        events.extend(self.frame(vec![Event::PointerMoved(to)]));
        events.extend(self.frame(vec![Event::PointerMoved(to), button(to, false)]));
        events
    }

    fn click(&mut self, at: Pos2) -> Vec<GraphEvent<NoContent>> {
        let mut events = self.frame(vec![Event::PointerMoved(at), button(at, true)]);
        events.extend(self.frame(vec![button(at, false)]));
        events
    }

    fn pin_point(&self, pin: PinId) -> Pos2 {
        self.editor.graph[pin].pin_point()
    }
}

fn screen() -> Rect {
    Rect::from_min_size(Pos2::ZERO, Vec2::new(1024.0, 768.0))
}

fn button(pos: Pos2, pressed: bool) -> Event {
    Event::PointerButton {
        pos,
        button: PointerButton::Primary,
        pressed,
        modifiers: Modifiers::NONE,
    }
}

fn key(key: Key) -> Event {
    Event::Key {
        key,
        physical_key: None,
        pressed: true,
        repeat: false,
        modifiers: Modifiers::NONE,
    }
}

/// Node A with one output "out" at the left, node B with one input "in" to
/// its right. Runs one frame so that pin points are laid out.
fn two_nodes(out_filter: u32, in_filter: u32) -> (Harness, NodeId, PinId, NodeId, PinId) {
    let mut h = Harness::new();
    let mut out = None;
    let a = h.editor.add_node("A", Pos2::new(50.0, 50.0), NoContent, |g, id| {
        out = g.add_output(id, "out", out_filter).ok();
    });
    let mut inp = None;
    let b = h.editor.add_node("B", Pos2::new(400.0, 50.0), NoContent, |g, id| {
        inp = g.add_input(id, "in", in_filter).ok();
    });
    h.frame(vec![]);
    (h, a, out.unwrap(), b, inp.unwrap())
}

#[test]
fn dragging_output_onto_input_connects_and_again_disconnects() {
    let (mut h, _, out, _, inp) = two_nodes(0, 0);

    let events = h.drag(h.pin_point(out), h.pin_point(inp));
    assert_eq!(h.editor.graph.link_count(), 1);
    let link = h.editor.graph.link_of(inp).expect("input should own the new link");
    assert_eq!((link.left, link.right), (out, inp));
    assert!(events
        .iter()
        .any(|e| matches!(e, GraphEvent::Connected { output, input, .. } if *output == out && *input == inp)));
    assert_eq!(h.editor.links().count(), 1);
    assert_eq!(h.editor.dragging_link(), None);

    let events = h.drag(h.pin_point(out), h.pin_point(inp));
    assert_eq!(h.editor.graph.link_count(), 0);
    assert!(events
        .iter()
        .any(|e| matches!(e, GraphEvent::Disconnected { output, input } if *output == out && *input == inp)));
    assert_eq!(h.editor.links().count(), 0);
}

#[test]
fn dragging_from_input_side_connects_the_same_way() {
    let (mut h, _, out, _, inp) = two_nodes(0, 0);
    h.drag(h.pin_point(inp), h.pin_point(out));
    let link = h.editor.graph.link_of(inp).expect("link should exist");
    assert_eq!(link.left, out);
}

#[test]
fn incompatible_filters_do_not_connect() {
    let (mut h, _, out, _, inp) = two_nodes(0b01, 0b10);
    let events = h.drag(h.pin_point(out), h.pin_point(inp));
    assert_eq!(h.editor.graph.link_count(), 0);
    assert!(events.iter().any(|e| matches!(
        e,
        GraphEvent::DropRejected {
            reason: DropRejection::IncompatibleFilter,
            ..
        }
    )));
}

#[test]
fn selecting_a_node_and_pressing_delete_removes_it_and_its_links() -> anyhow::Result<()> {
    let (mut h, a, out, b, inp) = two_nodes(0, 0);
    let mut c_in = None;
    let c = h.editor.add_node("C", Pos2::new(400.0, 300.0), NoContent, |g, id| {
        c_in = g.add_input(id, "in", 0).ok();
    });
    let mut d_out = None;
    h.editor.add_node("D", Pos2::new(50.0, 300.0), NoContent, |g, id| {
        d_out = g.add_output(id, "out", 0).ok();
    });
    h.editor.create_link(out, inp)?;
    h.editor.create_link(out, c_in.unwrap())?;
    h.editor.create_link(d_out.unwrap(), c_in.unwrap())?;
    assert_eq!(h.editor.graph.link_count(), 2, "c.in keeps only its last link");
    h.editor.create_link(out, c_in.unwrap())?;
    h.frame(vec![]);

    let header = h.editor.node_screen_rect(a).unwrap().min + Vec2::new(20.0, 6.0);
    h.click(header);
    assert!(h.editor.graph[a].selected());
    assert!(!h.editor.graph[b].selected());

    let events = h.frame(vec![key(Key::Delete)]);
    assert!(h.editor.graph.try_get_node(a).is_none());
    assert!(h.editor.graph.try_get_node(b).is_some());
    assert!(h.editor.graph.try_get_node(c).is_some());
    assert_eq!(h.editor.graph.link_count(), 0);
    assert_eq!(h.editor.links().count(), 0);
    assert!(events
        .iter()
        .any(|e| matches!(e, GraphEvent::NodeDeleted { node_id, .. } if *node_id == a)));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, GraphEvent::Disconnected { .. }))
            .count(),
        2
    );
    Ok(())
}

#[test]
fn deleting_a_node_keeps_unrelated_links() -> anyhow::Result<()> {
    let (mut h, a, out, _, inp) = two_nodes(0, 0);
    let mut e_out = None;
    let mut f_in = None;
    h.editor.add_node("E", Pos2::new(50.0, 400.0), NoContent, |g, id| {
        e_out = g.add_output(id, "out", 0).ok();
    });
    h.editor.add_node("F", Pos2::new(400.0, 400.0), NoContent, |g, id| {
        f_in = g.add_input(id, "in", 0).ok();
    });
    h.editor.create_link(out, inp)?;
    let kept = h.editor.create_link(e_out.unwrap(), f_in.unwrap())?;
    h.frame(vec![]);

    let header = h.editor.node_screen_rect(a).unwrap().min + Vec2::new(20.0, 6.0);
    h.click(header);
    h.frame(vec![key(Key::Delete)]);

    assert_eq!(h.editor.graph.link_count(), 1);
    assert!(h.editor.graph.try_get_link(kept).is_some());
    assert_eq!(h.editor.links().collect::<Vec<_>>(), vec![kept]);
    Ok(())
}

#[test]
fn clicking_a_link_selects_it_and_delete_removes_it() -> anyhow::Result<()> {
    let (mut h, _, out, _, inp) = two_nodes(0, 0);
    h.editor.create_link(out, inp)?;
    h.frame(vec![]);

    let src = h.pin_point(out);
    let dst = h.pin_point(inp);
    let on_curve = bezier::sample(&bezier::link_points(src, dst, h.editor.style.link_min_bend), 0.5);
    h.frame(vec![Event::PointerMoved(on_curve)]);
    h.click(on_curve);
    assert!(h.editor.graph.link_of(inp).is_some_and(|l| l.selected()));

    h.frame(vec![key(Key::Delete)]);
    assert_eq!(h.editor.graph.link_count(), 0);
    assert_eq!(h.editor.graph.node_count(), 2);
    Ok(())
}

#[test]
fn dragging_a_header_snaps_to_the_sub_grid() {
    let (mut h, a, _, _, _) = two_nodes(0, 0);
    let step = h.editor.style.snap_step();
    assert_eq!(step, 10.0);

    let from = h.editor.node_screen_rect(a).unwrap().min + Vec2::new(20.0, 6.0);
    h.drag(from, from + Vec2::new(27.0, 13.0));

    let node = &h.editor.graph[a];
    assert_eq!(node.position, Pos2::new(70.0, 60.0));
    assert!(!node.is_dragged());
    assert_eq!(snap_to_grid(node.position, step), node.position);

    h.frame(vec![]);
    assert!(!h.editor.is_dragging_node());
}

#[test]
fn click_on_empty_canvas_clears_selection() {
    let (mut h, a, _, _, _) = two_nodes(0, 0);
    let header = h.editor.node_screen_rect(a).unwrap().min + Vec2::new(20.0, 6.0);
    h.click(header);
    assert!(h.editor.graph[a].selected());

    h.click(Pos2::new(900.0, 700.0));
    assert!(!h.editor.graph[a].selected());
}

#[test]
fn dropping_a_link_on_free_space_opens_the_dropped_link_popup() {
    let (mut h, _, out, _, _) = two_nodes(0, 0);
    h.editor.set_dropped_link_popup(
        |_ui, popup| {
            let Some(origin) = popup.dropped_from else {
                return;
            };
            let mut input = None;
            popup.graph.add_node("New", popup.canvas_pos, NoContent, |g, id| {
                input = g.add_input(id, "in", 0).ok();
            });
            if let Some(input) = input {
                popup.graph.create_link(origin, input).ok();
            }
            popup.close();
        },
        None,
    );

    let free = Pos2::new(800.0, 600.0);
    let events = h.drag(h.pin_point(out), free);
    assert!(events
        .iter()
        .any(|e| matches!(e, GraphEvent::PopupOpened { dropped_from } if *dropped_from == Some(out))));
    assert_eq!(h.editor.graph.node_count(), 3);
    assert_eq!(h.editor.graph.link_count(), 1);
    // Linked from inside the popup, then adopted by the editor.
    assert_eq!(h.editor.links().count(), 1);
    assert!(!h.editor.is_popup_open());
}

#[test]
fn dropping_a_link_on_free_space_without_popup_is_rejected() {
    let (mut h, _, out, _, _) = two_nodes(0, 0);
    let events = h.drag(h.pin_point(out), Pos2::new(800.0, 600.0));
    assert_eq!(h.editor.graph.link_count(), 0);
    assert!(events.iter().any(|e| matches!(
        e,
        GraphEvent::DropRejected {
            reason: DropRejection::NoTarget,
            ..
        }
    )));
}

#[test]
fn middle_drag_scrolls_the_canvas() {
    let (mut h, a, _, _, _) = two_nodes(0, 0);
    let before = h.editor.node_screen_rect(a).unwrap();
    let start = Pos2::new(800.0, 600.0);
    let middle = |pos, pressed| Event::PointerButton {
        pos,
        button: PointerButton::Middle,
        pressed,
        modifiers: Modifiers::NONE,
    };
    h.frame(vec![Event::PointerMoved(start), middle(start, true)]);
    h.frame(vec![Event::PointerMoved(start + Vec2::new(30.0, -10.0))]);
    h.frame(vec![middle(start + Vec2::new(30.0, -10.0), false)]);

    assert_eq!(h.editor.scroll(), Vec2::new(30.0, -10.0));
    let after = h.editor.node_screen_rect(a).unwrap();
    assert_eq!(after.min, before.min + Vec2::new(30.0, -10.0));
    // Panning does not move nodes in canvas space.
    assert_eq!(h.editor.graph[a].position, Pos2::new(50.0, 50.0));
}

fn header_of(h: &Harness, node: NodeId) -> Pos2 {
    h.editor.node_screen_rect(node).unwrap().min + Vec2::new(20.0, 6.0)
}

#[test]
fn command_click_adds_to_the_selection() {
    let (mut h, a, _, b, _) = two_nodes(0, 0);
    h.click(header_of(&h, a));
    assert!(h.editor.graph[a].selected());

    // A plain click on another node starts a new selection.
    h.click(header_of(&h, b));
    assert!(!h.editor.graph[a].selected());
    assert!(h.editor.graph[b].selected());

    let at = header_of(&h, a);
    h.frame_with(vec![Event::PointerMoved(at), button(at, true)], Modifiers::COMMAND);
    h.frame_with(vec![button(at, false)], Modifiers::COMMAND);
    assert!(h.editor.graph[a].selected());
    assert!(h.editor.graph[b].selected());
    assert_eq!(h.editor.graph.selected_nodes().count(), 2);
}

#[test]
fn pressing_a_node_raises_it_above_the_others() {
    let (mut h, a, _, b, _) = two_nodes(0, 0);
    assert_eq!(h.editor.graph.iter_nodes().last(), Some(b));
    h.click(header_of(&h, a));
    assert_eq!(h.editor.graph.iter_nodes().last(), Some(a));
}

#[test]
fn right_click_on_free_space_opens_the_popup() {
    let (mut h, a, _, _, _) = two_nodes(0, 0);
    h.editor.set_right_click_popup(|ui, popup| {
        ui.label("Add node");
        popup.graph.add_node("Added", popup.canvas_pos, NoContent, |_, _| {});
        popup.close();
    });
    let secondary = |pos, pressed| Event::PointerButton {
        pos,
        button: PointerButton::Secondary,
        pressed,
        modifiers: Modifiers::NONE,
    };

    // Over a node nothing opens.
    let on_node = header_of(&h, a);
    let events = h.frame(vec![Event::PointerMoved(on_node), secondary(on_node, true)]);
    h.frame(vec![secondary(on_node, false)]);
    assert!(!events
        .iter()
        .any(|e| matches!(e, GraphEvent::PopupOpened { .. })));
    assert_eq!(h.editor.graph.node_count(), 2);

    let free = Pos2::new(800.0, 600.0);
    let events = h.frame(vec![Event::PointerMoved(free), secondary(free, true)]);
    h.frame(vec![secondary(free, false)]);
    assert!(events
        .iter()
        .any(|e| matches!(e, GraphEvent::PopupOpened { dropped_from: None })));
    assert_eq!(h.editor.graph.node_count(), 3);
    let added = h
        .editor
        .graph
        .nodes
        .values()
        .find(|node| node.name == "Added")
        .expect("popup should have added a node");
    assert_eq!(h.editor.canvas_to_screen(added.position), free);
    assert!(!h.editor.is_popup_open());
}

#[test]
fn dropped_link_popup_waits_for_its_modifier() {
    let (mut h, _, out, _, _) = two_nodes(0, 0);
    h.editor
        .set_dropped_link_popup(|_ui, popup| popup.close(), Some(Modifiers::SHIFT));
    let free = Pos2::new(800.0, 600.0);

    let events = h.drag(h.pin_point(out), free);
    assert!(!events
        .iter()
        .any(|e| matches!(e, GraphEvent::PopupOpened { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        GraphEvent::DropRejected {
            reason: DropRejection::NoTarget,
            ..
        }
    )));

    let from = h.pin_point(out);
    h.frame(vec![Event::PointerMoved(from), button(from, true)]);
    h.frame(vec![Event::PointerMoved(free)]);
    let events = h.frame_with(vec![button(free, false)], Modifiers::SHIFT);
    assert!(events
        .iter()
        .any(|e| matches!(e, GraphEvent::PopupOpened { dropped_from } if *dropped_from == Some(out))));
}

#[test]
fn no_link_drag_starts_while_a_node_is_dragged() {
    let (mut h, a, _, _, inp) = two_nodes(0, 0);
    let header = header_of(&h, a);
    h.frame(vec![Event::PointerMoved(header), button(header, true)]);
    assert!(h.editor.graph[a].is_dragged());

    // A second press lands on a pin while the header drag is still held.
    let target = h.pin_point(inp);
    h.frame(vec![Event::PointerMoved(target), button(target, true)]);
    assert!(h.editor.is_dragging_node());
    assert_eq!(h.editor.hovering(), Some(inp));
    assert_eq!(h.editor.dragging_link(), None);

    h.frame(vec![button(target, false)]);
    assert_eq!(h.editor.dragging_link(), None);
    assert_eq!(h.editor.graph.link_count(), 0);
}

#[test]
fn dragging_between_pins_of_one_node_is_rejected() {
    let mut h = Harness::new();
    let mut pins = (None, None);
    h.editor.add_node("Loop", Pos2::new(100.0, 100.0), NoContent, |g, id| {
        pins.0 = g.add_input(id, "in", 0).ok();
        pins.1 = g.add_output(id, "out", 0).ok();
    });
    h.frame(vec![]);
    let (inp, out) = (pins.0.unwrap(), pins.1.unwrap());

    let events = h.drag(h.pin_point(out), h.pin_point(inp));
    assert_eq!(h.editor.graph.link_count(), 0);
    assert!(events.iter().any(|e| matches!(
        e,
        GraphEvent::DropRejected {
            reason: DropRejection::SameNode,
            ..
        }
    )));
}

#[test]
fn editor_inside_a_zoomed_canvas_connects_pins() {
    let ctx = Context::default();
    let mut canvas = VirtualCanvas::new(VirtualCanvasConfig {
        default_zoom: 2.0,
        ..Default::default()
    });
    let mut editor = GraphEditorState::<NoContent>::new();
    let mut out = None;
    editor.add_node("A", Pos2::new(20.0, 20.0), NoContent, |g, id| {
        out = g.add_output(id, "out", 0).ok();
    });
    let mut inp = None;
    editor.add_node("B", Pos2::new(220.0, 20.0), NoContent, |g, id| {
        inp = g.add_input(id, "in", 0).ok();
    });
    let (out, inp) = (out.unwrap(), inp.unwrap());

    let (_, transform) = nested_frame(&ctx, &mut canvas, &mut editor, vec![]);
    let from = transform.to_screen(editor.graph[out].pin_point());
    let to = transform.to_screen(editor.graph[inp].pin_point());
    assert_eq!(transform.scale, 2.0);

    let mut events = Vec::new();
    for input in [
        vec![Event::PointerMoved(from), button(from, true)],
        vec![Event::PointerMoved(to)],
        vec![Event::PointerMoved(to), button(to, false)],
    ] {
        events.extend(nested_frame(&ctx, &mut canvas, &mut editor, input).0);
    }

    assert_eq!(editor.graph.link_count(), 1);
    assert_eq!(editor.graph.link_of(inp).map(|l| l.left), Some(out));
    assert!(events
        .iter()
        .any(|e| matches!(e, GraphEvent::Connected { output, input, .. } if *output == out && *input == inp)));
}

fn nested_frame(
    ctx: &Context,
    canvas: &mut VirtualCanvas,
    editor: &mut GraphEditorState<NoContent>,
    events: Vec<Event>,
) -> (Vec<GraphEvent<NoContent>>, CanvasTransform) {
    let input = RawInput {
        screen_rect: Some(screen()),
        events,
        ..Default::default()
    };
    let mut events = Vec::new();
    let _ = ctx.run(input, |ctx| {
        CentralPanel::default().show(ctx, |ui| {
            events = canvas.show(ui, |ui| editor.draw_graph_editor(ui)).events;
        });
    });
    (events, canvas.transform())
}
