#![forbid(unsafe_code)]

use egui::{Pos2, Vec2};
use slotmap::SlotMap;

pub mod id_type;
pub use id_type::*;

pub mod index_impls;

pub mod graph_impls;

pub mod error;
pub use error::*;

pub mod bezier;

pub mod connection;
pub use connection::*;

pub mod style;
pub use style::*;

pub mod traits;
pub use traits::*;

pub mod pin_ui;
pub mod link_ui;
pub mod node_ui;

pub mod ui_state;
pub use ui_state::*;

pub mod editor_ui;
pub use editor_ui::*;

pub mod virtual_canvas;
pub use virtual_canvas::*;

mod utils;
pub use utils::snap_to_grid;

mod color_hex_utils;
pub use color_hex_utils::color_from_hex;

pub type SVec<T> = smallvec::SmallVec<[T; 4]>;

/// Extra room drawn around a node's content. The background, header band and
/// border all extend past the laid out content by these amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct NodePadding {
    pub top_left: Vec2,
    pub bottom_right: Vec2,
}

impl Default for NodePadding {
    fn default() -> Self {
        Self {
            top_left: Vec2::new(13.0, 8.0),
            bottom_right: Vec2::new(13.0, 7.0),
        }
    }
}

/// A box on the canvas with ordered input and output pins. The `content` is
/// supplied by the host and draws whatever widgets live between the two pin
/// columns.
#[derive(Debug, Clone)]
pub struct Node<Content> {
    pub id: NodeId,
    pub name: String,
    /// Top-left corner of the content, in canvas space.
    pub position: Pos2,
    /// Size of the content measured during the last layout pass.
    pub size: Vec2,
    pub padding: NodePadding,
    /// Input pins in display order.
    pub inputs: Vec<PinId>,
    /// Output pins in display order.
    pub outputs: Vec<PinId>,
    pub content: Content,
    pub(crate) selected: bool,
    pub(crate) dragged: bool,
    /// Canvas position snapshot taken when the current drag started.
    pub(crate) drag_origin: Pos2,
}

/// A typed connection point on a node.
#[derive(Debug, Clone)]
pub struct Pin {
    pub id: PinId,
    pub name: String,
    /// Back-reference to the node containing this pin.
    pub node: NodeId,
    pub filter: PinFilter,
    pub(crate) kind: PinKind,
    /// Top-left of the pin row in screen space, recomputed every frame.
    pub(crate) anchor: Pos2,
    /// Offset from `anchor` to the centre of the drawn glyph.
    pub(crate) point_offset: Vec2,
    /// The link this pin owns. Only input pins ever own a link.
    pub(crate) link: Option<LinkId>,
}

/// An edge from an output pin (`left`) to an input pin (`right`). The link is
/// owned by its input pin: removing that pin or its node removes the link.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: LinkId,
    pub left: PinId,
    pub right: PinId,
    pub(crate) hovered: bool,
    pub(crate) selected: bool,
}

/// The node graph. Because graphs are full of self-referential structures,
/// every inner reference is a `slotmap` key: stale keys simply resolve to
/// nothing once the value they pointed to is removed.
#[derive(Debug, Clone)]
pub struct Graph<Content> {
    pub nodes: SlotMap<NodeId, Node<Content>>,
    pub pins: SlotMap<PinId, Pin>,
    pub links: SlotMap<LinkId, Link>,
    /// Nodes are updated and drawn in this order. Later nodes end up on top.
    pub(crate) node_order: Vec<NodeId>,
}
