use super::*;
use egui::{Event, InputState, Key, Modifiers, PointerButton, Pos2, Rect, Ui, Vec2};

/// A value written during one frame and read during the next. Readers see a
/// stable `current` for the whole frame while writers update `next`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubleBuffered<T: Copy> {
    current: T,
    next: T,
}

impl<T: Copy> DoubleBuffered<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: value,
            next: value,
        }
    }

    pub fn get(&self) -> T {
        self.current
    }

    pub fn set_next(&mut self, value: T) {
        self.next = value;
    }

    /// Publishes the value written last frame.
    pub fn advance(&mut self) {
        self.current = self.next;
    }
}

/// Interaction state that only lives from one frame to the next.
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    /// The pin under the pointer. Reset at the start of every frame and
    /// written by pins as they lay themselves out.
    pub hovering: Option<PinId>,
    /// Whether some node is being dragged by its header.
    pub dragging_node: DoubleBuffered<bool>,
    /// The pin an in-progress link drag started from.
    pub drag_out: Option<PinId>,
    /// Pointer position at the most recent primary press.
    pub press_pos: Option<Pos2>,
    /// Pointer position this frame.
    pub pointer: Option<Pos2>,
}

impl InteractionState {
    pub(crate) fn begin_frame(&mut self) {
        self.hovering = None;
        self.dragging_node.advance();
    }
}

/// True if `key` went down this frame, ignoring OS key repeat.
pub(crate) fn key_pressed_once(input: &InputState, key: Key) -> bool {
    input.events.iter().any(|event| {
        matches!(
            event,
            Event::Key {
                key: k,
                pressed: true,
                repeat: false,
                ..
            } if *k == key
        )
    })
}

/// Pointer and keyboard state sampled once at the start of a frame, so every
/// step of the update loop sees the same input.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameInput {
    pub pointer: Option<Pos2>,
    pub pointer_delta: Vec2,
    pub primary_pressed: bool,
    pub primary_released: bool,
    pub secondary_pressed: bool,
    pub scroll_button_down: bool,
    pub modifiers: Modifiers,
    pub delete_pressed: bool,
    pub escape_pressed: bool,
}

impl FrameInput {
    pub fn gather(ui: &Ui, scroll_button: Option<PointerButton>) -> Self {
        let wants_keyboard = ui.ctx().wants_keyboard_input();
        ui.input(|i| Self {
            pointer: i.pointer.hover_pos(),
            pointer_delta: i.pointer.delta(),
            primary_pressed: i.pointer.button_pressed(PointerButton::Primary),
            primary_released: i.pointer.button_released(PointerButton::Primary),
            secondary_pressed: i.pointer.button_pressed(PointerButton::Secondary),
            scroll_button_down: scroll_button.is_some_and(|b| i.pointer.button_down(b)),
            modifiers: i.modifiers,
            delete_pressed: !wants_keyboard && key_pressed_once(i, Key::Delete),
            escape_pressed: key_pressed_once(i, Key::Escape),
        })
    }
}

/// What a popup callback may inspect and change.
pub struct PopupContext<'a, C> {
    pub graph: &'a mut Graph<C>,
    /// Where the popup was opened, in canvas space. New nodes created here
    /// appear under the pointer.
    pub canvas_pos: Pos2,
    /// For the dropped-link popup, the pin the abandoned link started from.
    pub dropped_from: Option<PinId>,
    close: bool,
}

impl<'a, C> PopupContext<'a, C> {
    pub fn close(&mut self) {
        self.close = true;
    }

    pub(crate) fn new(graph: &'a mut Graph<C>, popup: &OpenPopup) -> Self {
        Self {
            graph,
            canvas_pos: popup.canvas_pos,
            dropped_from: match popup.kind {
                PopupKind::DroppedLink(pin) => Some(pin),
                PopupKind::RightClick => None,
            },
            close: false,
        }
    }

    pub(crate) fn should_close(&self) -> bool {
        self.close
    }
}

pub type PopupCallback<C> = Box<dyn FnMut(&mut Ui, &mut PopupContext<'_, C>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PopupKind {
    RightClick,
    DroppedLink(PinId),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenPopup {
    pub kind: PopupKind,
    pub screen_pos: Pos2,
    pub canvas_pos: Pos2,
    pub opened_frame: u64,
}

/// The editor: a graph plus everything needed to draw and interact with it.
pub struct GraphEditorState<C> {
    pub graph: Graph<C>,
    pub style: FlowStyle,
    /// Canvas pan, in screen pixels.
    pub scroll: Vec2,
    /// Mouse button that pans the canvas. `None` disables panning.
    pub scroll_button: Option<PointerButton>,
    /// Links known to the editor, in draw order. Pruned every frame.
    pub(crate) links: Vec<LinkId>,
    pub(crate) interaction: InteractionState,
    /// Screen-space top-left of the canvas region, from the last frame.
    pub(crate) origin: Pos2,
    pub(crate) popup: Option<OpenPopup>,
    pub(crate) right_click_popup: Option<PopupCallback<C>>,
    pub(crate) dropped_link_popup: Option<PopupCallback<C>>,
    /// Modifiers that must be held for the dropped-link popup to open.
    pub(crate) dropped_link_modifiers: Option<Modifiers>,
}

impl<C> Default for GraphEditorState<C> {
    fn default() -> Self {
        Self {
            graph: Graph::new(),
            style: FlowStyle::default(),
            scroll: Vec2::ZERO,
            scroll_button: Some(PointerButton::Middle),
            links: Vec::new(),
            interaction: InteractionState::default(),
            origin: Pos2::ZERO,
            popup: None,
            right_click_popup: None,
            dropped_link_popup: None,
            dropped_link_modifiers: None,
        }
    }
}

impl<C> GraphEditorState<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: FlowStyle) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    /// Adds a node at `position` in canvas space. See [`Graph::add_node`].
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        position: Pos2,
        content: C,
        f: impl FnOnce(&mut Graph<C>, NodeId),
    ) -> NodeId {
        self.graph.add_node(name, position, content, f)
    }

    /// Adds a node whose top-left lands on the screen position `screen_pos`.
    pub fn place_node_at(
        &mut self,
        name: impl Into<String>,
        screen_pos: Pos2,
        content: C,
        f: impl FnOnce(&mut Graph<C>, NodeId),
    ) -> NodeId {
        let position = self.screen_to_canvas(screen_pos);
        self.graph.add_node(name, position, content, f)
    }

    /// Connects two pins and starts tracking the new link.
    pub fn create_link(&mut self, output: PinId, input: PinId) -> Result<LinkId, NodeFlowError> {
        let link = self.graph.create_link(output, input)?;
        self.links.push(link);
        Ok(link)
    }

    /// Removes the link owned by `input`, if any.
    pub fn delete_link(&mut self, input: PinId) -> Option<Link> {
        let link = self.graph.delete_link(input)?;
        self.links.retain(|id| *id != link.id);
        Some(link)
    }

    /// Removes a node, its pins and their links.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<(Node<C>, Vec<(PinId, PinId)>)> {
        let removed = self.graph.remove_node(node_id)?;
        if removed.0.dragged {
            self.interaction.dragging_node.set_next(false);
        }
        self.prune_links();
        Some(removed)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Links the editor currently draws, in draw order.
    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.links.iter().copied()
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn set_scroll(&mut self, scroll: Vec2) {
        self.scroll = scroll;
    }

    /// Screen-space top-left of the canvas region, as of the last frame.
    pub fn origin(&self) -> Pos2 {
        self.origin
    }

    pub(crate) fn canvas_offset(&self) -> Vec2 {
        self.origin.to_vec2() + self.scroll
    }

    pub fn canvas_to_screen(&self, pos: Pos2) -> Pos2 {
        pos + self.canvas_offset()
    }

    pub fn screen_to_canvas(&self, pos: Pos2) -> Pos2 {
        pos - self.canvas_offset()
    }

    /// The pin under the pointer during the last frame.
    pub fn hovering(&self) -> Option<PinId> {
        self.interaction.hovering
    }

    /// The pin an in-progress link drag started from.
    pub fn dragging_link(&self) -> Option<PinId> {
        self.interaction.drag_out
    }

    pub fn is_dragging_node(&self) -> bool {
        self.interaction.dragging_node.get()
    }

    /// Registers the popup opened by a right click on free canvas space.
    pub fn set_right_click_popup(
        &mut self,
        popup: impl FnMut(&mut Ui, &mut PopupContext<'_, C>) + 'static,
    ) {
        self.right_click_popup = Some(Box::new(popup));
    }

    /// Registers the popup opened when a link drag is released over free
    /// canvas space. With `modifiers` set, those keys must be held at release.
    pub fn set_dropped_link_popup(
        &mut self,
        popup: impl FnMut(&mut Ui, &mut PopupContext<'_, C>) + 'static,
        modifiers: Option<Modifiers>,
    ) {
        self.dropped_link_popup = Some(Box::new(popup));
        self.dropped_link_modifiers = modifiers;
    }

    pub fn is_popup_open(&self) -> bool {
        self.popup.is_some()
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    /// Screen-space bounds of a node, padding included.
    pub fn node_screen_rect(&self, node_id: NodeId) -> Option<Rect> {
        let node = self.graph.try_get_node(node_id)?;
        Some(node.rect().translate(self.canvas_offset()))
    }

    fn node_hovered(&self, node: &Node<C>) -> bool {
        node.hovered(self.interaction.pointer, self.canvas_offset())
    }

    /// True if the pointer is over a node that is selected.
    pub fn on_selected_node(&self) -> bool {
        self.graph
            .nodes
            .values()
            .any(|node| node.selected && self.node_hovered(node))
    }

    /// True if the pointer is over neither a node nor a link.
    pub fn on_free_space(&self) -> bool {
        !self.graph.nodes.values().any(|node| self.node_hovered(node))
            && !self.graph.links.values().any(|link| link.hovered)
    }

    /// Drops tracked ids whose link is gone and starts tracking links that
    /// were created directly on the graph.
    pub(crate) fn prune_links(&mut self) {
        let graph = &self.graph;
        self.links.retain(|id| graph.links.contains_key(*id));
        if self.links.len() != graph.links.len() {
            for id in graph.links.keys() {
                if !self.links.contains(&id) {
                    self.links.push(id);
                }
            }
        }
    }
}
