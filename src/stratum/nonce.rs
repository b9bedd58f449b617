use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct Nonce(u32);

impl FromStr for Nonce {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let nonce = u32::from_str_radix(s, 16)
            .map_err(|err| anyhow!("invalid nonce hex string '{s}': {err}"))?;
        Ok(Nonce(nonce))
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<Nonce> for u32 {
    fn from(nonce: Nonce) -> u32 {
        nonce.0
    }
}

impl From<u32> for Nonce {
    fn from(nonce: u32) -> Nonce {
        Nonce(nonce)
    }
}
