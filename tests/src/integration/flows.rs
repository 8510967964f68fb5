//! # Integration Test Flows
//!
//! A node's view of the consensus core:
//!
//! 1. **Chain growth**: difficulty for each new block from the trailing
//!    history, checked against a mined header hash
//! 2. **Relay**: peer blobs verified on the shared pool and admitted
//! 3. **Block import**: transactions kept by a block bypass the weight cap

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Context;
    use cc_01_difficulty::{
        check_hash_meets_difficulty, history_len, next_difficulty, DifficultyAlgorithm,
    };
    use cc_02_tx_verification::test_utils::{InMemoryChain, InMemoryMempool, TxBuilder};
    use cc_02_tx_verification::{
        SemanticsFailure, TransactionVerificationApi, TransactionVerificationService,
        TxRejection, TxVerdict, VerifierConfig,
    };
    use cc_compute::{PoolConfig, WorkPool};
    use cc_telemetry::{init_tracing, TelemetryConfig};
    use rand::RngCore;
    use shared_types::{keccak256, Hash};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Tracing for test output. Only the first call installs a subscriber.
    fn init_logging() {
        let _ = init_tracing(&TelemetryConfig::for_component("tests"));
    }

    struct Node {
        chain: Arc<InMemoryChain>,
        mempool: Arc<InMemoryMempool>,
        pool: Arc<WorkPool>,
        verifier: TransactionVerificationService<Arc<InMemoryChain>, Arc<InMemoryMempool>>,
    }

    fn node(threads: usize) -> anyhow::Result<Node> {
        let chain = Arc::new(InMemoryChain::default());
        let mempool = Arc::new(InMemoryMempool::default());
        let pool = Arc::new(WorkPool::new(PoolConfig::with_threads(threads))?);
        let verifier = TransactionVerificationService::new(
            Arc::clone(&chain),
            Arc::clone(&mempool),
            Arc::clone(&pool),
            VerifierConfig::default(),
        )?;
        Ok(Node {
            chain,
            mempool,
            pool,
            verifier,
        })
    }

    /// Smallest nonce whose header hash meets `difficulty`.
    fn mine(parent: &Hash, difficulty: u64) -> (u64, Hash) {
        let mut header = [0u8; 40];
        header[..32].copy_from_slice(parent);
        for nonce in 0u64.. {
            header[32..].copy_from_slice(&nonce.to_le_bytes());
            let hash = keccak256(&header);
            if check_hash_meets_difficulty(&hash, difficulty) {
                return (nonce, hash);
            }
        }
        unreachable!("nonce space exhausted")
    }

    // =============================================================================
    // CHAIN GROWTH
    // =============================================================================

    #[test]
    fn test_chain_growth_respects_jump_limit() -> anyhow::Result<()> {
        init_logging();
        let version = 16;
        let window = history_len(version);
        let limit = DifficultyAlgorithm::for_version(version)
            .params()
            .jump_limit
            .context("variant has a jump limit")?;

        let mut timestamps: Vec<u64> = (0..window as u64).map(|i| 1_000 + i * 120).collect();
        let mut cumulative: Vec<u64> = (1..=window as u64).map(|i| i * 50).collect();
        let mut tip = [0u8; 32];

        for height in 0..40u64 {
            let start = timestamps.len() - window;
            let difficulty =
                next_difficulty(&timestamps[start..], &cumulative[start..], version)?;
            let previous = cumulative[cumulative.len() - 1] - cumulative[cumulative.len() - 2];
            assert!(difficulty >= previous * limit.min_percent / 100, "height {}", height);
            assert!(difficulty <= previous * limit.max_percent / 100, "height {}", height);

            let (_, hash) = mine(&tip, difficulty);
            assert!(check_hash_meets_difficulty(&hash, difficulty));
            tip = hash;

            // Blocks arrive twice as fast as targeted.
            let last = timestamps[timestamps.len() - 1];
            timestamps.push(last + 60);
            let total = cumulative[cumulative.len() - 1];
            cumulative.push(total + difficulty);
        }

        // Sustained fast blocks push difficulty up.
        let start = timestamps.len() - window;
        let final_difficulty = next_difficulty(&timestamps[start..], &cumulative[start..], version)?;
        assert!(final_difficulty > 50, "difficulty {}", final_difficulty);
        Ok(())
    }

    #[test]
    fn test_every_version_bootstraps_from_genesis() -> anyhow::Result<()> {
        for version in 0..=16u8 {
            let params = DifficultyAlgorithm::for_version(version).params();
            assert_eq!(
                next_difficulty(&[], &[], version)?,
                params.bootstrap_difficulty
            );
        }
        Ok(())
    }

    // =============================================================================
    // RELAY
    // =============================================================================

    #[test]
    fn test_relay_flow() -> anyhow::Result<()> {
        init_logging();
        let node = node(4)?;
        let _span = cc_telemetry::component_span!("relay", component = "tests", blobs = 5).entered();

        let valid: Vec<_> = (0..3u64).map(|i| TxBuilder::new(1_000 + i).build()).collect();
        let double_spend = TxBuilder::new(1_010)
            .with_key_image(0, valid[1].key_images[0])
            .build();
        let forged = TxBuilder::new(1_011).tamper_signature(0).build();

        let blobs = vec![
            valid[0].blob.clone(),
            double_spend.blob.clone(),
            valid[1].blob.clone(),
            forged.blob.clone(),
            valid[2].blob.clone(),
        ];
        let batch = node.verifier.verify_and_admit(&blobs, false);
        let verdicts: Vec<_> = batch.verdicts().cloned().collect();

        // The double spend comes first, so it wins the key image.
        assert_eq!(
            verdicts,
            vec![
                TxVerdict::Accepted,
                TxVerdict::Accepted,
                TxVerdict::Rejected(SemanticsFailure::DuplicateKeyImage.into()),
                TxVerdict::Rejected(TxRejection::SignatureFailed),
                TxVerdict::Accepted,
            ]
        );
        assert_eq!(
            node.mempool.admitted_hashes(),
            vec![valid[0].hash, double_spend.hash, valid[2].hash]
        );

        // Relayed again by another peer: forged is answered from the cache,
        // the rest are known.
        let again = node.verifier.verify_and_admit(&blobs, false);
        let verdicts: Vec<_> = again.verdicts().cloned().collect();
        assert_eq!(verdicts[0], TxVerdict::AlreadyKnown);
        assert_eq!(
            verdicts[2],
            TxVerdict::Rejected(SemanticsFailure::DuplicateKeyImage.into())
        );
        assert_eq!(
            verdicts[3],
            TxVerdict::Rejected(SemanticsFailure::PreviouslyRejected.into())
        );

        let stats = node.pool.stats();
        assert_eq!(stats.threads, 4);
        assert!(stats.completed + stats.inlined > 0);
        Ok(())
    }

    #[test]
    fn test_random_blobs_are_parse_failures() -> anyhow::Result<()> {
        let node = node(2)?;
        let mut rng = rand::thread_rng();
        let blobs: Vec<Vec<u8>> = (0..100)
            .map(|_| {
                let mut blob = vec![0u8; (rng.next_u32() % 2_048) as usize];
                rng.fill_bytes(&mut blob);
                blob
            })
            .collect();

        let batch = node.verifier.verify_and_admit(&blobs, false);

        assert!(batch
            .verdicts()
            .all(|v| *v == TxVerdict::Rejected(TxRejection::ParseFailed)));
        assert!(node.mempool.admitted().is_empty());
        Ok(())
    }

    // =============================================================================
    // BLOCK IMPORT
    // =============================================================================

    #[test]
    fn test_block_transactions_skip_weight_cap() -> anyhow::Result<()> {
        let node = node(2)?;
        node.chain.set_block_weight_limit(1_500);
        let heavy = TxBuilder::new(2_000).with_inputs(3).with_outputs(8).build();

        let relayed = node.verifier.verify_and_admit(&[heavy.blob.clone()], false);
        assert_eq!(
            relayed.results[0].verdict,
            TxVerdict::Rejected(SemanticsFailure::TooLargeForBlock.into())
        );

        let imported = node.verifier.verify_and_admit(&[heavy.blob.clone()], true);
        assert!(imported.all_accepted);
        let admitted = node.mempool.admitted();
        assert!(admitted[0].kept_by_block);
        assert!(admitted[0].weight > heavy.blob.len() as u64);
        Ok(())
    }

    #[test]
    fn test_hard_fork_switches_size_limit() -> anyhow::Result<()> {
        let node = node(2)?;
        let oversized = vec![0u8; 200_000];

        node.chain.set_hard_fork_version(9);
        let before = node.verifier.verify_and_admit(&[oversized.clone()], false);
        assert_eq!(
            before.results[0].verdict,
            TxVerdict::Rejected(TxRejection::ParseFailed)
        );

        node.chain.set_hard_fork_version(10);
        let after = node.verifier.verify_and_admit(&[oversized], false);
        assert_eq!(
            after.results[0].verdict,
            TxVerdict::Rejected(TxRejection::TooBig {
                size: 200_000,
                limit: 100_000,
            })
        );
        Ok(())
    }
}
