use super::*;

/// Previous block hash as it appears in mining.notify. Stratum transmits
/// the hash as eight 32-bit words, each hex encoded big-endian, while the
/// header wants the canonical byte order, so parsing and display swap the
/// bytes of every word.
#[derive(Debug, PartialEq, Eq, Clone, Copy, DeserializeFromStr, SerializeDisplay)]
pub struct PrevHash(BlockHash);

fn swap_words(bytes: &[u8; 32]) -> [u8; 32] {
    let mut swapped = [0u8; 32];
    for (src, dst) in bytes.chunks_exact(4).zip(swapped.chunks_mut(4)) {
        let word = BigEndian::read_u32(src);
        LittleEndian::write_u32(dst, word);
    }
    swapped
}

impl FromStr for PrevHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = <[u8; 32]>::from_hex(s)?;
        Ok(PrevHash(BlockHash::from_byte_array(swap_words(&bytes))))
    }
}

impl fmt::Display for PrevHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(swap_words(self.0.as_byte_array())))
    }
}

impl From<BlockHash> for PrevHash {
    fn from(blockhash: BlockHash) -> Self {
        PrevHash(blockhash)
    }
}

impl From<PrevHash> for BlockHash {
    fn from(prevhash: PrevHash) -> Self {
        prevhash.0
    }
}
