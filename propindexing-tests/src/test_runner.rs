use propindexing::{Config, Contract};

use crate::repo::InMemoryRepo;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Baseline config used across the suites: batch 1000, 3 confirmations,
/// checkpoint every 100 blocks. Individual tests override what they probe.
pub fn new_config(repo: &InMemoryRepo, contracts: Vec<Contract>) -> Config<InMemoryRepo> {
    contracts.into_iter().fold(
        Config::new(repo.clone(), "https://eth-node.internal.invalid/rpc")
            .with_blocks_per_batch(1_000)
            .with_min_confirmation_count(3)
            .with_checkpoint_interval(100),
        |config, contract| config.add_contract(contract),
    )
}
