use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct Version(pub block::Version);

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = u32::from_str_radix(s, 16)?;
        // The as conversion matches Bitcoin's behaviour
        Ok(Self(block::Version::from_consensus(n as i32)))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0.to_consensus())
    }
}

impl From<block::Version> for Version {
    fn from(version: block::Version) -> Self {
        Self(version)
    }
}

impl From<Version> for block::Version {
    fn from(version: Version) -> Self {
        version.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn case(version_str: &str, expected_consensus: i32) {
        let version = Version::from_str(version_str).unwrap();

        assert_eq!(version.to_string(), version_str, "Display round-trip");
        assert_eq!(version.0.to_consensus(), expected_consensus);

        let serialized = serde_json::to_string(&version).unwrap();
        assert_eq!(serialized, format!("\"{version_str}\""));

        let deserialized = serde_json::from_str::<Version>(&serialized).unwrap();
        assert_eq!(deserialized, version);
    }

    #[test]
    fn bip9_signaling_default() {
        case("20000000", 0x20000000);
    }

    #[test]
    fn negative_consensus_version() {
        case("ffffffff", -1);
    }

    #[test]
    fn version_one() {
        case("00000001", 1);
    }

    #[test]
    fn rejects_invalid_hex() {
        assert!("".parse::<Version>().is_err());
        assert!("2000000g".parse::<Version>().is_err());
    }
}
