use super::*;

/// Nonces hashed between preemption checks. Also the granularity of hash
/// counter updates, so a preempted worker forfeits at most one window of
/// accounting.
const PREEMPTION_WINDOW: u32 = 4096;

#[derive(Debug)]
pub(crate) struct Hasher {
    pub(crate) worker: usize,
    pub(crate) job_id: JobId,
    pub(crate) extranonce2: Extranonce,
    pub(crate) header: Header,
    pub(crate) target: Target,
}

impl Hasher {
    pub(crate) fn new(
        worker: usize,
        notify: &Notify,
        extranonce1: &Extranonce,
        extranonce2: Extranonce,
    ) -> Result<Self> {
        let header = build_header(notify, extranonce1, &extranonce2)?;

        Ok(Self {
            worker,
            job_id: notify.job_id.clone(),
            extranonce2,
            header,
            target: notify.nbits.to_target(),
        })
    }

    /// Walks the nonce space upward from the header's starting nonce until
    /// a hash meets the target, the space is exhausted, or the job is
    /// preempted.
    pub(crate) fn search(
        mut self,
        cancel: &CancellationToken,
        metrics: &Metrics,
    ) -> Result<Solution> {
        let mut window = 0u64;

        loop {
            if cancel.is_cancelled() {
                metrics.add(self.worker, window);
                bail!("search preempted");
            }

            for _ in 0..PREEMPTION_WINDOW {
                let hash = self.header.block_hash();
                window += 1;

                if self.target.is_met_by(hash) {
                    metrics.add(self.worker, window);

                    return Ok(Solution {
                        worker: self.worker,
                        job_id: self.job_id,
                        extranonce2: self.extranonce2,
                        header: self.header,
                    });
                }

                match self.header.nonce.checked_add(1) {
                    Some(nonce) => self.header.nonce = nonce,
                    None => {
                        metrics.add(self.worker, window);
                        bail!("nonce space exhausted");
                    }
                }
            }

            metrics.add(self.worker, window);
            window = 0;
        }
    }
}

/// Assembles the block header for one `(job, extranonce2)` pair: version,
/// word-swapped previous hash, and the merkle root over the coinbase
/// rebuilt around the extranonces. The consensus encoding lays out all
/// scalar fields little-endian.
pub(crate) fn build_header(
    notify: &Notify,
    extranonce1: &Extranonce,
    extranonce2: &Extranonce,
) -> Result<Header> {
    let merkle_root = stratum::merkle_root(
        &notify.coinb1,
        &notify.coinb2,
        extranonce1,
        extranonce2,
        &notify.merkle_branches,
    )?;

    Ok(Header {
        version: notify.version.into(),
        prev_blockhash: notify.prevhash.into(),
        merkle_root: merkle_root.into(),
        time: notify.ntime.into(),
        bits: notify.nbits.into(),
        nonce: 0,
    })
}

#[cfg(test)]
mod tests {
    use {super::*, bitcoin::consensus};

    // Wire form of the block 125551 hash, words byte-swapped.
    const PREVHASH_WIRE: &str = "ab02cd818b9e567ee21793cddef299feb29ad444a41b85b8000008a300000000";

    fn notify(nbits: &str) -> Notify {
        Notify {
            job_id: "109a".into(),
            prevhash: PREVHASH_WIRE.parse().unwrap(),
            coinb1: "c01d".into(),
            coinb2: "f00d".into(),
            merkle_branches: Vec::new(),
            version: "20000000".parse().unwrap(),
            nbits: nbits.parse().unwrap(),
            ntime: "64b8c1a5".parse().unwrap(),
            clean_jobs: true,
        }
    }

    fn extranonce1() -> Extranonce {
        "f002aa3c".parse().unwrap()
    }

    fn extranonce2() -> Extranonce {
        Extranonce::from_counter(1, 4)
    }

    fn hasher(nbits: &str) -> Hasher {
        Hasher::new(0, &notify(nbits), &extranonce1(), extranonce2()).unwrap()
    }

    #[test]
    fn header_is_eighty_bytes_with_little_endian_fields() {
        let header = build_header(&notify("1b0404cb"), &extranonce1(), &extranonce2()).unwrap();
        let bytes = consensus::serialize(&header);

        assert_eq!(bytes.len(), 80);

        // version, little-endian
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x00, 0x20]);

        // prev hash, wire words byte-swapped into canonical order
        assert_eq!(&bytes[4..8], &[0x81, 0xcd, 0x02, 0xab]);
        assert_eq!(&bytes[28..32], &[0xa3, 0x08, 0x00, 0x00]);
        assert_eq!(&bytes[32..36], &[0x00, 0x00, 0x00, 0x00]);

        // merkle root in natural sha256d order
        let root =
            stratum::merkle_root("c01d", "f00d", &extranonce1(), &extranonce2(), &[]).unwrap();
        assert_eq!(&bytes[36..68], &root.as_byte_array()[..]);

        // ntime, nbits, nonce, little-endian
        assert_eq!(&bytes[68..72], &[0xa5, 0xc1, 0xb8, 0x64]);
        assert_eq!(&bytes[72..76], &[0xcb, 0x04, 0x04, 0x1b]);
        assert_eq!(&bytes[76..80], &[0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn nonce_field_roundtrips_through_encoding() {
        let mut header = build_header(&notify("1b0404cb"), &extranonce1(), &extranonce2()).unwrap();
        header.nonce = 0x3d92a8c1;

        let bytes = consensus::serialize(&header);
        assert_eq!(&bytes[76..80], &[0xc1, 0xa8, 0x92, 0x3d]);
    }

    #[test]
    fn known_block_meets_its_own_target() {
        // Bitcoin mainnet block 125552.
        let header = Header {
            version: block::Version::ONE,
            prev_blockhash: "00000000000008a3a41b85b8b29ad444def299fee21793cd8b9e567eab02cd81"
                .parse()
                .unwrap(),
            merkle_root: "2b12fcf1b09288fcaff797d71e950e71ae42b91e8bdb2304758dfcffc2b620e3"
                .parse()
                .unwrap(),
            time: 0x4dd7f5c7,
            bits: CompactTarget::from_consensus(0x1a44b9f2),
            nonce: 0x9546a142,
        };

        assert_eq!(
            header.block_hash().to_string(),
            "00000000000000001e8d6829a8a21adc5d38d0a473b144b6765798e61f98bd1d"
        );

        assert!(header.validate_pow(header.target()).is_ok());
    }

    #[test]
    fn search_finds_share_against_trivial_target() {
        let mut hasher = hasher("207fffff");
        hasher.target = Target::MAX;

        let solution = hasher
            .search(&CancellationToken::new(), &Metrics::new(1))
            .unwrap();

        assert_eq!(solution.worker, 0);
        assert_eq!(solution.header.nonce, 0);
        assert!(Target::MAX.is_met_by(solution.header.block_hash()));
    }

    #[test]
    fn search_counts_hashes() {
        let metrics = Metrics::new(1);

        hasher("207fffff")
            .search(&CancellationToken::new(), &metrics)
            .unwrap();

        assert!(metrics.drain() >= 1);
    }

    #[test]
    fn search_preempted_by_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(
            hasher("207fffff")
                .search(&cancel, &Metrics::new(1))
                .is_err_and(|err| err.to_string() == "search preempted")
        );
    }

    #[test]
    fn search_exhausts_nonce_space() {
        let mut hasher = hasher("207fffff");
        hasher.header.nonce = u32::MAX - 1;
        hasher.target = Target::from_be_bytes([0u8; 32]);

        assert!(
            hasher
                .search(&CancellationToken::new(), &Metrics::new(1))
                .is_err_and(|err| err.to_string() == "nonce space exhausted")
        );
    }

    #[test]
    fn distinct_extranonce2_values_give_distinct_headers() {
        let notify = notify("1b0404cb");

        let first = build_header(&notify, &extranonce1(), &Extranonce::from_counter(1, 4)).unwrap();
        let second =
            build_header(&notify, &extranonce1(), &Extranonce::from_counter(2, 4)).unwrap();

        assert_ne!(first.merkle_root, second.merkle_root);
    }

    #[test]
    fn invalid_coinbase_hex_fails_header_build() {
        let mut notify = notify("1b0404cb");
        notify.coinb1 = "not-hex".into();

        assert!(build_header(&notify, &extranonce1(), &extranonce2()).is_err());
    }
}
