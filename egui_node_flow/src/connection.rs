//! Decides what releasing a dragged link does.

use super::*;

/// Why a link drop did not connect anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropRejection {
    /// Released away from any pin, with no dropped-link popup to offer.
    NoTarget,
    /// Both pins belong to the same node.
    SameNode,
    /// Both filters are non-wildcard and share no bit.
    IncompatibleFilter,
    /// Output onto output, or input onto input.
    SameKind,
    /// One of the pins no longer exists.
    StalePin,
}

/// The result of releasing a dragged link, computed once per frame and then
/// acted upon by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Rejected(DropRejection),
    /// Create a link from `output` to `input`, replacing whatever `input`
    /// held before.
    Connected { output: PinId, input: PinId },
    /// The pair was already connected: dropping onto it again disconnects.
    Disconnected { output: PinId, input: PinId },
    /// Released over free canvas space: offer the dropped-link popup for the
    /// pin the drag started from.
    OfferPopup { origin: PinId },
}

/// Resolves a link drag that started at `origin` and was released over
/// `target` (`None` when no pin was hovered). `offer_popup` tells whether
/// releasing away from every pin may open the dropped-link popup.
pub fn resolve_link_drop<C>(
    graph: &Graph<C>,
    origin: PinId,
    target: Option<PinId>,
    offer_popup: bool,
) -> DropOutcome {
    let Some(origin_pin) = graph.try_get_pin(origin) else {
        return DropOutcome::Rejected(DropRejection::StalePin);
    };
    let Some(target) = target else {
        return if offer_popup {
            DropOutcome::OfferPopup { origin }
        } else {
            DropOutcome::Rejected(DropRejection::NoTarget)
        };
    };
    let Some(target_pin) = graph.try_get_pin(target) else {
        return DropOutcome::Rejected(DropRejection::StalePin);
    };

    if origin_pin.node == target_pin.node {
        return DropOutcome::Rejected(DropRejection::SameNode);
    }
    if !origin_pin.filter.accepts(target_pin.filter) {
        return DropOutcome::Rejected(DropRejection::IncompatibleFilter);
    }

    if !origin_pin.kind.is_complementary(&target_pin.kind) {
        return DropOutcome::Rejected(DropRejection::SameKind);
    }
    let (output, input) = if origin_pin.kind.is_output() {
        (origin, target)
    } else {
        (target, origin)
    };

    match graph.link_of(input) {
        Some(link) if link.left == output => DropOutcome::Disconnected { output, input },
        _ => DropOutcome::Connected { output, input },
    }
}
