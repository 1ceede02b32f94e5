slotmap::new_key_type! { pub struct NodeId; }
slotmap::new_key_type! { pub struct PinId; }
slotmap::new_key_type! { pub struct LinkId; }

#[cfg(feature = "persistence")]
use serde::{Deserialize, Serialize};

/// Which side of a node a pin lives on. Links always flow from an `Output`
/// pin to an `Input` pin.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "persistence", derive(Serialize, Deserialize))]
pub enum PinKind {
    Input,
    Output,
}

impl PinKind {
    pub fn is_input(&self) -> bool {
        matches!(self, PinKind::Input)
    }

    pub fn is_output(&self) -> bool {
        matches!(self, PinKind::Output)
    }

    pub fn is_complementary(&self, other: &Self) -> bool {
        self != other
    }
}

/// Bitmask compatibility tag of a pin. Two pins may be connected when either
/// of them is the wildcard ([`PinFilter::ANY`]) or when their masks share at
/// least one bit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "persistence", derive(Serialize, Deserialize))]
pub struct PinFilter(pub u32);

impl PinFilter {
    /// Accepts anything.
    pub const ANY: PinFilter = PinFilter(0);

    pub fn is_wildcard(&self) -> bool {
        self.0 == 0
    }

    pub fn accepts(&self, other: PinFilter) -> bool {
        self.is_wildcard() || other.is_wildcard() || (self.0 & other.0) != 0
    }
}

impl From<u32> for PinFilter {
    fn from(mask: u32) -> Self {
        PinFilter(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_accepts_everything() {
        assert!(PinFilter::ANY.accepts(PinFilter(0b100)));
        assert!(PinFilter(0b100).accepts(PinFilter::ANY));
        assert!(PinFilter::ANY.accepts(PinFilter::ANY));
    }

    #[test]
    fn masks_need_a_common_bit() {
        assert!(PinFilter(0b011).accepts(PinFilter(0b010)));
        assert!(!PinFilter(0b01).accepts(PinFilter(0b10)));
    }

    #[test]
    fn kinds_complement_each_other() {
        assert!(PinKind::Input.is_complementary(&PinKind::Output));
        assert!(!PinKind::Output.is_complementary(&PinKind::Output));
    }
}
