use super::*;

/// Compact target encoding from the block header: 8-bit exponent, 24-bit
/// mantissa. Difficulty targets never set the mantissa sign bit, so it is
/// rejected on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct Nbits(CompactTarget);

impl Nbits {
    pub fn to_target(self) -> Target {
        Target::from_compact(self.0)
    }
}

impl FromStr for Nbits {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(s.len() == 8, "nbits hex must be 8 chars");

        let compact = CompactTarget::from_unprefixed_hex(s)?;

        ensure!(
            compact.to_consensus() & 0x0080_0000 == 0,
            "nbits sign bit set"
        );

        Ok(Nbits(compact))
    }
}

impl fmt::Display for Nbits {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0.to_consensus())
    }
}

impl From<Nbits> for CompactTarget {
    fn from(nbits: Nbits) -> CompactTarget {
        nbits.0
    }
}

impl From<CompactTarget> for Nbits {
    fn from(compact: CompactTarget) -> Nbits {
        Nbits(compact)
    }
}
