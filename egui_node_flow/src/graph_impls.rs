use super::*;
use egui::Rect;

impl<C> Graph<C> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::default(),
            pins: SlotMap::default(),
            links: SlotMap::default(),
            node_order: Vec::new(),
        }
    }

    /// Inserts a new node at `position` (canvas space). The node starts with
    /// no pins; `f` runs right after insertion and is the place to add them.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        position: Pos2,
        content: C,
        f: impl FnOnce(&mut Graph<C>, NodeId),
    ) -> NodeId {
        let name = name.into();
        let node_id = self.nodes.insert_with_key(|node_id| Node {
            id: node_id,
            name,
            position,
            size: Vec2::ZERO,
            padding: NodePadding::default(),
            // These get filled in later by the user function
            inputs: Vec::default(),
            outputs: Vec::default(),
            content,
            selected: false,
            dragged: false,
            drag_origin: position,
        });
        self.node_order.push(node_id);

        f(self, node_id);

        node_id
    }

    pub fn add_input(
        &mut self,
        node_id: NodeId,
        name: impl Into<String>,
        filter: impl Into<PinFilter>,
    ) -> Result<PinId, NodeFlowError> {
        self.add_pin(node_id, name.into(), PinKind::Input, filter.into())
    }

    pub fn add_output(
        &mut self,
        node_id: NodeId,
        name: impl Into<String>,
        filter: impl Into<PinFilter>,
    ) -> Result<PinId, NodeFlowError> {
        self.add_pin(node_id, name.into(), PinKind::Output, filter.into())
    }

    /// Fails without touching the graph when `node_id` is stale.
    fn add_pin(
        &mut self,
        node_id: NodeId,
        name: String,
        kind: PinKind,
        filter: PinFilter,
    ) -> Result<PinId, NodeFlowError> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or(NodeFlowError::InvalidNodeId(node_id))?;
        let pin_id = self.pins.insert_with_key(|pin_id| Pin {
            id: pin_id,
            name,
            node: node_id,
            filter,
            kind,
            anchor: Pos2::ZERO,
            point_offset: Vec2::ZERO,
            link: None,
        });
        match kind {
            PinKind::Input => node.inputs.push(pin_id),
            PinKind::Output => node.outputs.push(pin_id),
        }
        Ok(pin_id)
    }

    /// Removes a node from the graph with given `node_id`, together with its
    /// pins and every link touching one of them.
    ///
    /// Returns the removed node and the removed links as `(output, input)`
    /// pin pairs. One of the two pins in each pair (the one on `node_id`'s
    /// end) is invalid after this call.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<(Node<C>, Vec<(PinId, PinId)>)> {
        let node = self.nodes.remove(node_id)?;
        self.node_order.retain(|id| *id != node_id);

        let owned_pins: SVec<PinId> = node.input_ids().chain(node.output_ids()).collect();
        let doomed_links: SVec<LinkId> = self
            .links
            .iter()
            .filter(|(_, link)| owned_pins.contains(&link.left) || owned_pins.contains(&link.right))
            .map(|(id, _)| id)
            .collect();

        let mut removed = Vec::with_capacity(doomed_links.len());
        for link_id in doomed_links {
            if let Some(link) = self.remove_link(link_id) {
                removed.push((link.left, link.right));
            }
        }
        for pin in owned_pins {
            self.pins.remove(pin);
        }

        log::debug!(
            "removed node {:?} ({}) and {} link(s)",
            node_id,
            node.name,
            removed.len()
        );
        Some((node, removed))
    }

    /// Connects `output` to `input`. The input pin owns the new link; any
    /// link it previously owned is removed first, so an input never has more
    /// than one incoming link.
    pub fn create_link(&mut self, output: PinId, input: PinId) -> Result<LinkId, NodeFlowError> {
        self.expect_kind(output, PinKind::Output)?;
        self.expect_kind(input, PinKind::Input)?;

        self.delete_link(input);
        let link_id = self.links.insert_with_key(|id| Link {
            id,
            left: output,
            right: input,
            hovered: false,
            selected: false,
        });
        self[input].link = Some(link_id);

        log::debug!("created link {:?}: {:?} -> {:?}", link_id, output, input);
        Ok(link_id)
    }

    /// Releases the link owned by the `input` pin, if any.
    pub fn delete_link(&mut self, input: PinId) -> Option<Link> {
        let link_id = self.pins.get_mut(input)?.link.take()?;
        let link = self.links.remove(link_id)?;
        log::debug!("removed link {:?}: {:?} -> {:?}", link_id, link.left, link.right);
        Some(link)
    }

    pub fn remove_link(&mut self, link_id: LinkId) -> Option<Link> {
        let input = self.links.get(link_id)?.right;
        self.delete_link(input)
    }

    fn expect_kind(&self, pin: PinId, expected: PinKind) -> Result<(), NodeFlowError> {
        let actual = self
            .pins
            .get(pin)
            .ok_or(NodeFlowError::InvalidPinId(pin))?
            .kind;
        if actual != expected {
            return Err(NodeFlowError::WrongPinKind {
                pin,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// The link owned by an input pin.
    pub fn link_of(&self, input: PinId) -> Option<&Link> {
        let link_id = self.pins.get(input)?.link?;
        self.links.get(link_id)
    }

    /// Every link touching `pin`, on either end.
    pub fn links_of(&self, pin: PinId) -> impl Iterator<Item = &Link> + '_ {
        self.links
            .values()
            .filter(move |link| link.left == pin || link.right == pin)
    }

    /// Node ids in update/draw order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_order.iter().copied()
    }

    pub fn iter_links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.links.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn try_get_node(&self, node: NodeId) -> Option<&Node<C>> {
        self.nodes.get(node)
    }

    pub fn try_get_pin(&self, pin: PinId) -> Option<&Pin> {
        self.pins.get(pin)
    }

    pub fn try_get_link(&self, link: LinkId) -> Option<&Link> {
        self.links.get(link)
    }

    /// Ids of the nodes currently selected, in draw order.
    pub fn selected_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter_nodes().filter(|id| self.nodes[*id].selected)
    }

    /// Moves `node_id` to the end of the draw order so it is drawn on top.
    pub fn raise_node(&mut self, node_id: NodeId) {
        if let Some(old_pos) = self.node_order.iter().position(|id| *id == node_id) {
            self.node_order.remove(old_pos);
            self.node_order.push(node_id);
        }
    }
}

impl<C> Default for Graph<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Node<C> {
    pub fn input_ids(&self) -> impl Iterator<Item = PinId> + '_ {
        self.inputs.iter().copied()
    }

    pub fn output_ids(&self) -> impl Iterator<Item = PinId> + '_ {
        self.outputs.iter().copied()
    }

    pub fn get_input(&self, name: &str, graph: &Graph<C>) -> Result<PinId, NodeFlowError> {
        self.input_ids()
            .find(|id| graph[*id].name == name)
            .ok_or_else(|| NodeFlowError::NoPinNamed(self.id, PinKind::Input, name.into()))
    }

    pub fn get_output(&self, name: &str, graph: &Graph<C>) -> Result<PinId, NodeFlowError> {
        self.output_ids()
            .find(|id| graph[*id].name == name)
            .ok_or_else(|| NodeFlowError::NoPinNamed(self.id, PinKind::Output, name.into()))
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn is_dragged(&self) -> bool {
        self.dragged
    }

    /// Content bounds grown by the padding, in canvas space.
    pub fn rect(&self) -> Rect {
        Rect::from_min_max(
            self.position - self.padding.top_left,
            self.position + self.size + self.padding.bottom_right,
        )
    }
}

impl Pin {
    pub fn kind(&self) -> PinKind {
        self.kind
    }

    /// Sets the screen-space anchor used this frame.
    pub fn set_anchor(&mut self, anchor: Pos2) {
        self.anchor = anchor;
    }

    pub fn anchor(&self) -> Pos2 {
        self.anchor
    }

    /// Where links attach: the centre of the pin glyph, in screen space.
    pub fn pin_point(&self) -> Pos2 {
        self.anchor + self.point_offset
    }

    /// The link owned by this pin. Always `None` for output pins.
    pub fn link(&self) -> Option<LinkId> {
        self.link
    }
}

impl Link {
    pub fn hovered(&self) -> bool {
        self.hovered
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}
