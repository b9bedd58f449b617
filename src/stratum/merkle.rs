use super::*;

/// A sibling hash on the authentication path from the coinbase to the
/// merkle root. Stratum transmits these in natural sha256d output order,
/// unlike txids, which Bitcoin displays byte reversed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct MerkleNode(sha256d::Hash);

impl MerkleNode {
    pub fn as_byte_array(&self) -> &[u8; 32] {
        self.0.as_byte_array()
    }

    pub fn from_byte_array(bytes: [u8; 32]) -> Self {
        Self(sha256d::Hash::from_byte_array(bytes))
    }

    pub fn to_raw_hash(self) -> sha256d::Hash {
        self.0
    }
}

impl fmt::Display for MerkleNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0.as_byte_array()))
    }
}

impl FromStr for MerkleNode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(s.len() == 64, "merkle node hex must be 64 chars");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(MerkleNode(sha256d::Hash::from_byte_array(bytes)))
    }
}

impl From<sha256d::Hash> for MerkleNode {
    fn from(hash: sha256d::Hash) -> Self {
        Self(hash)
    }
}

impl From<MerkleNode> for sha256d::Hash {
    fn from(node: MerkleNode) -> Self {
        node.0
    }
}

impl From<MerkleNode> for TxMerkleNode {
    fn from(node: MerkleNode) -> Self {
        node.0.into()
    }
}

/// Reassembles the coinbase transaction around the extranonces and folds
/// the merkle branches onto its hash. The branches are an authenticated
/// path, so the fold is linear with the running hash always on the left.
pub fn merkle_root(
    coinb1: &str,
    coinb2: &str,
    extranonce1: &Extranonce,
    extranonce2: &Extranonce,
    merkle_branches: &[MerkleNode],
) -> Result<MerkleNode> {
    let coinbase = hex::decode(format!("{coinb1}{extranonce1}{extranonce2}{coinb2}"))?;

    let mut root = sha256d::Hash::hash(&coinbase);

    for branch in merkle_branches {
        let mut concat = Vec::with_capacity(64);
        concat.extend_from_slice(&root[..]);
        concat.extend_from_slice(branch.as_byte_array());
        root = sha256d::Hash::hash(&concat);
    }

    Ok(MerkleNode(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extranonce1() -> Extranonce {
        "5e11aa00".parse().unwrap()
    }

    fn extranonce2() -> Extranonce {
        "00000000000003e9".parse().unwrap()
    }

    fn node(byte: u8) -> MerkleNode {
        MerkleNode::from_byte_array([byte; 32])
    }

    fn hash_pair(left: sha256d::Hash, right: sha256d::Hash) -> sha256d::Hash {
        let mut concat = Vec::with_capacity(64);
        concat.extend_from_slice(&left[..]);
        concat.extend_from_slice(&right[..]);
        sha256d::Hash::hash(&concat)
    }

    #[test]
    fn display_is_wire_order() {
        let s = "c4ef90812cb76287a5650673496ea46cfd973a658b99f9e72feddfb721e810b5";
        let parsed: MerkleNode = s.parse().unwrap();
        assert_eq!(parsed.to_string(), s);
        assert_eq!(
            serde_json::from_str::<MerkleNode>(&format!("\"{s}\"")).unwrap(),
            parsed
        );
    }

    #[test]
    fn rejects_wrong_length() {
        assert!("ab".parse::<MerkleNode>().is_err());
        assert!("a".repeat(63).parse::<MerkleNode>().is_err());
        assert!("a".repeat(65).parse::<MerkleNode>().is_err());
    }

    #[test]
    fn no_branches_is_hash_of_coinbase() {
        let coinb1 = "c01d";
        let coinb2 = "f00d";
        let extranonce1 = extranonce1();
        let extranonce2 = extranonce2();

        let want = {
            let coinbase =
                hex::decode(format!("{coinb1}{extranonce1}{extranonce2}{coinb2}")).unwrap();
            MerkleNode::from(sha256d::Hash::hash(&coinbase))
        };

        let got = merkle_root(coinb1, coinb2, &extranonce1, &extranonce2, &[]).unwrap();

        assert_eq!(want, got);
    }

    #[test]
    fn extranonces_are_spliced_between_coinbase_halves() {
        let with_extranonces =
            merkle_root("c01d", "f00d", &extranonce1(), &extranonce2(), &[]).unwrap();

        let flat = {
            let coinbase = hex::decode("c01d5e11aa0000000000000003e9f00d").unwrap();
            MerkleNode::from(sha256d::Hash::hash(&coinbase))
        };

        assert_eq!(with_extranonces, flat);
    }

    #[test]
    fn fold_keeps_running_hash_on_the_left() {
        let branches = [node(1), node(2)];

        let root = merkle_root("c01d", "f00d", &extranonce1(), &extranonce2(), &branches).unwrap();

        let coinbase_hash = merkle_root("c01d", "f00d", &extranonce1(), &extranonce2(), &[])
            .unwrap()
            .to_raw_hash();

        let first = hash_pair(coinbase_hash, node(1).into());
        let second = hash_pair(first, node(2).into());

        assert_eq!(root, MerkleNode::from(second));
    }

    #[test]
    fn fold_is_order_sensitive() {
        let forward = merkle_root("c01d", "f00d", &extranonce1(), &extranonce2(), &[node(1), node(2)])
            .unwrap();
        let reversed = merkle_root("c01d", "f00d", &extranonce1(), &extranonce2(), &[node(2), node(1)])
            .unwrap();

        assert_ne!(forward, reversed);
    }

    #[test]
    fn invalid_coinbase_hex_errors() {
        assert!(merkle_root("zz", "f00d", &extranonce1(), &extranonce2(), &[]).is_err());
    }
}
