use super::*;

/// Pool share difficulty as announced by mining.set_difficulty. The share
/// target in this miner is always derived from the job's nbits, so the
/// difficulty is recorded and logged but never overrides the target.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Difficulty(pub f64);

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty(1.0)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Difficulty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0 >= 0.0 && self.0 <= u64::MAX as f64 {
            serializer.serialize_u64(self.0 as u64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let difficulty = f64::deserialize(deserializer)?;

        if !difficulty.is_finite() || difficulty <= 0.0 {
            return Err(de::Error::custom("difficulty must be finite and > 0"));
        }

        Ok(Difficulty(difficulty))
    }
}
