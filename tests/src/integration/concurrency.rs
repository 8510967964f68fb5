//! # Concurrency
//!
//! Several callers share one verifier, one work pool and one rejected cache.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use cc_02_tx_verification::test_utils::{InMemoryChain, InMemoryMempool, TxBuilder};
    use cc_02_tx_verification::{
        TransactionVerificationApi, TransactionVerificationService, TxRejection, TxVerdict,
        VerifierConfig,
    };
    use cc_compute::{PoolConfig, TaskContext, WorkPool};
    use parking_lot::Mutex;

    type Verifier = TransactionVerificationService<Arc<InMemoryChain>, Arc<InMemoryMempool>>;

    fn verifier(threads: usize) -> (Arc<Verifier>, Arc<InMemoryMempool>, Arc<WorkPool>) {
        let mempool = Arc::new(InMemoryMempool::default());
        let pool = Arc::new(WorkPool::new(PoolConfig::with_threads(threads)).unwrap());
        let verifier = TransactionVerificationService::new(
            Arc::new(InMemoryChain::default()),
            Arc::clone(&mempool),
            Arc::clone(&pool),
            VerifierConfig::default(),
        )
        .unwrap();
        (Arc::new(verifier), mempool, pool)
    }

    #[test]
    fn test_parallel_callers_share_the_pool() {
        let (verifier, mempool, _pool) = verifier(3);

        let handles: Vec<_> = (0..4u64)
            .map(|caller| {
                let verifier = Arc::clone(&verifier);
                thread::spawn(move || {
                    let blobs: Vec<Vec<u8>> = (0..10u64)
                        .map(|i| TxBuilder::new(10_000 + caller * 100 + i).build().blob)
                        .collect();
                    verifier.verify_and_admit(&blobs, false)
                })
            })
            .collect();

        for handle in handles {
            let batch = handle.join().unwrap();
            assert!(batch.all_accepted);
            assert_eq!(batch.accepted_count(), 10);
        }
        assert_eq!(mempool.admitted().len(), 40);
    }

    #[test]
    fn test_rejections_are_visible_to_other_callers() {
        let (verifier, _, _pool) = verifier(2);
        let forged = TxBuilder::new(20_000).tamper_signature(0).build();

        let first = verifier.verify_and_admit(&[forged.blob.clone()], false);
        assert_eq!(
            first.results[0].verdict,
            TxVerdict::Rejected(TxRejection::SignatureFailed)
        );

        let other = Arc::clone(&verifier);
        let blob = forged.blob.clone();
        let second = thread::spawn(move || other.verify_and_admit(&[blob], false))
            .join()
            .unwrap();
        assert_eq!(
            second.results[0].verdict,
            TxVerdict::Rejected(TxRejection::Semantics(
                cc_02_tx_verification::SemanticsFailure::PreviouslyRejected
            ))
        );
        assert_eq!(verifier.rejection_cache_stats().current_entries, 1);
    }

    #[test]
    fn test_pool_work_alongside_verification() {
        let (verifier, _, pool) = verifier(2);
        let ctx = TaskContext::root();
        let sums = Arc::new(Mutex::new(Vec::new()));

        // Unrelated fork-join work queued on the same pool.
        let waiter = pool.waiter();
        for chunk in 0..8u64 {
            let sums = Arc::clone(&sums);
            pool.submit(
                &ctx,
                Some(&waiter),
                move |_| {
                    sums.lock().push((chunk * 1_000..(chunk + 1) * 1_000).sum::<u64>());
                    Ok(())
                },
                false,
            );
        }

        let blobs: Vec<Vec<u8>> = (0..6u64)
            .map(|i| TxBuilder::new(30_000 + i).with_inputs(2).build().blob)
            .collect();
        let batch = verifier.verify_and_admit(&blobs, false);

        waiter.wait(&ctx).unwrap();
        assert!(batch.all_accepted);
        assert_eq!(sums.lock().iter().sum::<u64>(), (0..8_000u64).sum::<u64>());
    }
}
