use super::*;

/// A pool- or client-chosen byte string spliced into the coinbase, hex
/// encoded on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Extranonce(Vec<u8>);

impl Extranonce {
    /// Serializes a counter value little-endian, padded or truncated to
    /// `size` bytes, so that the wire form is always `2 * size` hex chars.
    pub fn from_counter(value: u64, size: usize) -> Self {
        let le = value.to_le_bytes();
        let mut bytes = vec![0u8; size];
        let n = size.min(le.len());
        bytes[..n].copy_from_slice(&le[..n]);
        Self(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl Serialize for Extranonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Extranonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl fmt::Display for Extranonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Extranonce {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(hex::decode(s)?))
    }
}

/// Hands out extranonce2 values for header builds. Reservations are unique
/// across all workers for the lifetime of the session, which keeps their
/// coinbase inputs disjoint.
#[derive(Debug)]
pub struct ExtranonceCounter {
    next: AtomicU64,
    size: usize,
}

impl ExtranonceCounter {
    pub fn new(size: usize) -> Self {
        Self {
            next: AtomicU64::new(0),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn reserve(&self) -> Result<Extranonce> {
        let value = self.next.fetch_add(1, Ordering::Relaxed);

        // The increment above wrapped the counter, so uniqueness is gone.
        ensure!(value != u64::MAX, "extranonce2 counter saturated");

        Ok(Extranonce::from_counter(value, self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_odd_length_hex() {
        assert!(
            "abc"
                .parse::<Extranonce>()
                .unwrap_err()
                .to_string()
                .contains("Odd number of digits")
        );
    }

    #[test]
    fn rejects_non_hex() {
        assert!(
            "zz".parse::<Extranonce>()
                .unwrap_err()
                .to_string()
                .contains("Invalid character")
        );
    }

    #[test]
    fn valid_hex_roundtrip() {
        let extranonce: Extranonce = serde_json::from_str(r#""abcd""#).unwrap();
        assert_eq!(extranonce.len(), 2);
        assert_eq!(extranonce.to_hex(), "abcd");
        assert_eq!(serde_json::to_string(&extranonce).unwrap(), r#""abcd""#);
    }

    #[test]
    fn from_counter_is_little_endian() {
        assert_eq!(Extranonce::from_counter(1, 4).to_hex(), "01000000");
        assert_eq!(Extranonce::from_counter(0x0102, 4).to_hex(), "02010000");
        assert_eq!(Extranonce::from_counter(0xdeadbeef, 4).to_hex(), "efbeadde");
    }

    #[test]
    fn from_counter_pads_past_eight_bytes() {
        assert_eq!(
            Extranonce::from_counter(1, 12).to_hex(),
            "010000000000000000000000"
        );
    }

    #[test]
    fn from_counter_truncates_small_sizes() {
        assert_eq!(Extranonce::from_counter(0x0102030405, 2).to_hex(), "0504");
    }

    #[test]
    fn wire_width_matches_size() {
        for size in [1, 2, 4, 8, 16] {
            assert_eq!(Extranonce::from_counter(7, size).to_hex().len(), 2 * size);
        }
    }

    #[test]
    fn reservations_are_unique() {
        let counter = ExtranonceCounter::new(4);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(counter.reserve().unwrap().to_hex()));
        }
    }

    #[test]
    fn saturated_counter_is_fatal() {
        let counter = ExtranonceCounter::new(8);
        counter.next.store(u64::MAX, Ordering::Relaxed);

        assert!(
            counter
                .reserve()
                .is_err_and(|err| err.to_string() == "extranonce2 counter saturated")
        );
    }
}
