use super::*;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum NodeFlowError {
    #[error("Node {0:?} was not found in the graph. Has it been deleted?")]
    InvalidNodeId(NodeId),

    #[error("Pin {0:?} was not found in the graph. Has its node been deleted?")]
    InvalidPinId(PinId),

    #[error("Node {0:?} has no {1:?} pin named {2}")]
    NoPinNamed(NodeId, PinKind, String),

    #[error("Pin {pin:?} is an {actual:?} pin, expected an {expected:?} pin")]
    WrongPinKind {
        pin: PinId,
        expected: PinKind,
        actual: PinKind,
    },
}
