//! # Metrics
//!
//! Counters exported to the default Prometheus registry while the pipeline
//! runs on the shared pool.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cc_02_tx_verification::test_utils::{InMemoryChain, InMemoryMempool, TxBuilder};
    use cc_02_tx_verification::{
        TransactionVerificationApi, TransactionVerificationService, VerifierConfig,
    };
    use cc_compute::{PoolConfig, WorkPool};

    fn counter(name: &str, reason: Option<&str>) -> f64 {
        prometheus::gather()
            .iter()
            .filter(|family| family.get_name() == name)
            .flat_map(|family| family.get_metric().iter())
            .filter(|metric| match reason {
                Some(reason) => metric
                    .get_label()
                    .iter()
                    .any(|label| label.get_name() == "reason" && label.get_value() == reason),
                None => true,
            })
            .map(|metric| metric.get_counter().get_value())
            .sum()
    }

    #[test]
    fn test_pipeline_exports_counters() -> anyhow::Result<()> {
        let pool = Arc::new(WorkPool::new(PoolConfig::with_threads(2))?);
        let verifier = TransactionVerificationService::new(
            Arc::new(InMemoryChain::default()),
            Arc::new(InMemoryMempool::default()),
            pool,
            VerifierConfig::default(),
        )?;
        let good = TxBuilder::new(9_000).build();
        let forged = TxBuilder::new(9_001).tamper_signature(0).build();

        let batch = verifier.verify_and_admit(&[good.blob, forged.blob, vec![0xff; 3]], false);
        assert_eq!(batch.accepted_count(), 1);

        // The registry is process-wide; other tests only add to it.
        assert!(counter("txverify_batches_total", None) >= 1.0);
        assert!(counter("txverify_accepted_total", None) >= 1.0);
        assert!(counter("txverify_rejected_total", Some("signature_failed")) >= 1.0);
        assert!(counter("txverify_rejected_total", Some("parse_failed")) >= 1.0);
        assert!(counter("txverify_batch_fallbacks_total", None) >= 1.0);
        assert!(counter("pool_tasks_completed_total", None) >= 3.0);
        Ok(())
    }
}
