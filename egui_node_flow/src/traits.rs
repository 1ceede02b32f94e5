use super::*;

/// This trait must be implemented by the `Content` generic parameter of the
/// [`Graph`]. It draws the host widgets shown in the middle column of a node,
/// between the input and the output pins.
///
/// Any `FnMut(&mut egui::Ui)` closure implements it, so boxed closures
/// (`Box<dyn FnMut(&mut egui::Ui)>`) work as node content out of the box.
pub trait NodeContentTrait {
    fn content_ui(&mut self, ui: &mut egui::Ui, node_id: NodeId);
}

impl<F> NodeContentTrait for F
where
    F: FnMut(&mut egui::Ui) + ?Sized,
{
    fn content_ui(&mut self, ui: &mut egui::Ui, _node_id: NodeId) {
        self(ui)
    }
}

/// Content for nodes that only carry pins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoContent;

impl NodeContentTrait for NoContent {
    fn content_ui(&mut self, _ui: &mut egui::Ui, _node_id: NodeId) {}
}
