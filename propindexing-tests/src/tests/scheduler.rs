#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use propindexing::hashes::Hashes;
    use propindexing::{scheduler, sync_status, EventCatalog, UnsavedIndexerState};

    use crate::factory::{
        block_hash, new_property_listings, new_token_holdings, property_created_log,
        property_registry_contract, property_registry_contract_with_failing_purchases,
        token_sale_contract, tokens_purchased_log, unknown_event_log, StubProvider,
        PROPERTY_REGISTRY_ADDRESS, TOKEN_SALE_ADDRESS,
    };
    use crate::repo::InMemoryRepo;
    use crate::test_runner;
    use propindexing::Repo;

    fn stored_hash(block_number: u64) -> String {
        Hashes::h256_to_string(&block_hash(block_number)).to_lowercase()
    }

    #[tokio::test]
    async fn creates_audit_events_and_advances_cursor() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract =
            property_registry_contract(&listings).with_start_block_number(50);
        let config = test_runner::new_config(&repo, vec![contract]);
        let catalog = EventCatalog::new(&config.contracts);

        let provider = Arc::new(StubProvider::new(100).with_logs(vec![
            property_created_log(PROPERTY_REGISTRY_ADDRESS, 60, 1, 7),
            property_created_log(PROPERTY_REGISTRY_ADDRESS, 75, 2, 8),
        ]));

        scheduler::run_tick(&config, &provider, &catalog).await;

        let events = repo.get_all_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|event| event.event_name == "PropertyCreated"));
        assert!(events
            .iter()
            .all(|event| event.match_contract_address(PROPERTY_REGISTRY_ADDRESS)));

        let state = repo
            .get_indexer_state(PROPERTY_REGISTRY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.last_processed_block, 97);
        assert_eq!(state.last_block_hash, Some(stored_hash(97)));
        // 97 is below the first checkpoint-interval boundary in the window
        assert_eq!(state.last_checkpoint_block, None);

        assert_eq!(listings.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn never_requests_unconfirmed_blocks() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract =
            property_registry_contract(&listings).with_start_block_number(50);
        let config = test_runner::new_config(&repo, vec![contract]);
        let catalog = EventCatalog::new(&config.contracts);

        let provider = Arc::new(StubProvider::new(100));

        scheduler::run_tick(&config, &provider, &catalog).await;

        let filters = provider.seen_filters();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].get_from_block().unwrap().as_u64(), 50);
        assert_eq!(filters[0].get_to_block().unwrap().as_u64(), 97);
    }

    #[tokio::test]
    async fn clamps_to_block_to_batch_size() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract =
            property_registry_contract(&listings).with_start_block_number(50);
        let config =
            test_runner::new_config(&repo, vec![contract]).with_blocks_per_batch(10);
        let catalog = EventCatalog::new(&config.contracts);

        let provider = Arc::new(StubProvider::new(100));

        scheduler::run_tick(&config, &provider, &catalog).await;

        let filters = provider.seen_filters();
        assert_eq!(filters[0].get_to_block().unwrap().as_u64(), 59);
    }

    #[tokio::test]
    async fn waits_when_cursor_is_past_confirmed_head() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract = property_registry_contract(&listings);
        let config = test_runner::new_config(&repo, vec![contract]);
        let catalog = EventCatalog::new(&config.contracts);

        repo.record_batch(
            &UnsavedIndexerState::new(PROPERTY_REGISTRY_ADDRESS, 97, &stored_hash(97), None),
            &[],
        )
        .await
        .unwrap();

        let provider = Arc::new(StubProvider::new(100));

        scheduler::run_tick(&config, &provider, &catalog).await;

        assert!(provider.seen_filters().is_empty());

        let state = repo
            .get_indexer_state(PROPERTY_REGISTRY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.last_processed_block, 97);
    }

    #[tokio::test]
    async fn starts_from_head_lookback_when_no_start_block_is_configured() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract = property_registry_contract(&listings);
        let config =
            test_runner::new_config(&repo, vec![contract]).with_start_block_lookback(10);
        let catalog = EventCatalog::new(&config.contracts);

        let provider = Arc::new(StubProvider::new(100));

        scheduler::run_tick(&config, &provider, &catalog).await;

        let filters = provider.seen_filters();
        assert_eq!(filters[0].get_from_block().unwrap().as_u64(), 90);
        assert_eq!(filters[0].get_to_block().unwrap().as_u64(), 97);
    }

    #[tokio::test]
    async fn records_checkpoint_when_batch_crosses_interval_boundary() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract = property_registry_contract(&listings);
        let config = test_runner::new_config(&repo, vec![contract]);
        let catalog = EventCatalog::new(&config.contracts);

        repo.record_batch(
            &UnsavedIndexerState::new(PROPERTY_REGISTRY_ADDRESS, 89, &stored_hash(89), None),
            &[],
        )
        .await
        .unwrap();

        let provider = Arc::new(StubProvider::new(103));

        scheduler::run_tick(&config, &provider, &catalog).await;

        let state = repo
            .get_indexer_state(PROPERTY_REGISTRY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.last_processed_block, 100);
        assert_eq!(state.last_checkpoint_block, Some(100));
        assert_eq!(state.last_checkpoint_hash, Some(stored_hash(100)));
    }

    #[tokio::test]
    async fn keeps_previous_checkpoint_when_no_boundary_is_crossed() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract = property_registry_contract(&listings);
        let config = test_runner::new_config(&repo, vec![contract]);
        let catalog = EventCatalog::new(&config.contracts);

        repo.record_batch(
            &UnsavedIndexerState {
                contract_address: PROPERTY_REGISTRY_ADDRESS.to_lowercase(),
                last_processed_block: 149,
                last_block_hash: Some(stored_hash(149)),
                last_checkpoint_block: Some(100),
                last_checkpoint_hash: Some(stored_hash(100)),
            },
            &[],
        )
        .await
        .unwrap();

        let provider = Arc::new(StubProvider::new(200));

        scheduler::run_tick(&config, &provider, &catalog).await;

        let state = repo
            .get_indexer_state(PROPERTY_REGISTRY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.last_processed_block, 197);
        assert_eq!(state.last_checkpoint_block, Some(100));
        assert_eq!(state.last_checkpoint_hash, Some(stored_hash(100)));
    }

    #[tokio::test]
    async fn skips_unknown_events_without_aborting_the_batch() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract =
            property_registry_contract(&listings).with_start_block_number(50);
        let config = test_runner::new_config(&repo, vec![contract]);
        let catalog = EventCatalog::new(&config.contracts);

        let provider = Arc::new(StubProvider::new(100).with_logs(vec![
            unknown_event_log(PROPERTY_REGISTRY_ADDRESS, 60, 1),
            property_created_log(PROPERTY_REGISTRY_ADDRESS, 60, 2, 7),
        ]));

        scheduler::run_tick(&config, &provider, &catalog).await;

        let events = repo.get_all_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name, "PropertyCreated");

        let state = repo
            .get_indexer_state(PROPERTY_REGISTRY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.last_processed_block, 97);
    }

    #[tokio::test]
    async fn continues_batch_and_advances_cursor_when_a_handler_fails() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract = property_registry_contract_with_failing_purchases(&listings)
            .with_start_block_number(50);
        let config = test_runner::new_config(&repo, vec![contract]);
        let catalog = EventCatalog::new(&config.contracts);

        let provider = Arc::new(StubProvider::new(100).with_logs(vec![
            property_created_log(PROPERTY_REGISTRY_ADDRESS, 60, 1, 1),
            tokens_purchased_log(PROPERTY_REGISTRY_ADDRESS, 61, 1, 1),
            property_created_log(PROPERTY_REGISTRY_ADDRESS, 62, 1, 2),
            tokens_purchased_log(PROPERTY_REGISTRY_ADDRESS, 63, 1, 2),
            property_created_log(PROPERTY_REGISTRY_ADDRESS, 64, 1, 3),
        ]));

        scheduler::run_tick(&config, &provider, &catalog).await;

        // every decoded log is audited, including the ones whose
        // projection failed
        let events = repo.get_all_events().await.unwrap();
        assert_eq!(events.len(), 5);

        let state = repo
            .get_indexer_state(PROPERTY_REGISTRY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.last_processed_block, 97);

        assert_eq!(listings.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn isolates_contract_failures_within_a_tick() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let holdings = new_token_holdings();
        let registry =
            property_registry_contract(&listings).with_start_block_number(50);
        let sale = token_sale_contract(&holdings).with_start_block_number(50);
        let config = test_runner::new_config(&repo, vec![registry, sale]);
        let catalog = EventCatalog::new(&config.contracts);

        let provider = Arc::new(
            StubProvider::new(100)
                .with_logs(vec![tokens_purchased_log(TOKEN_SALE_ADDRESS, 60, 1, 7)])
                .failing_get_logs_for(PROPERTY_REGISTRY_ADDRESS),
        );

        scheduler::run_tick(&config, &provider, &catalog).await;

        assert!(repo
            .get_indexer_state(PROPERTY_REGISTRY_ADDRESS)
            .await
            .unwrap()
            .is_none());

        let sale_state = repo
            .get_indexer_state(TOKEN_SALE_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sale_state.last_processed_block, 97);
        assert_eq!(repo.get_all_events().await.unwrap().len(), 1);
        assert_eq!(holdings.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replaying_a_block_range_is_idempotent() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract =
            property_registry_contract(&listings).with_start_block_number(50);
        let config = test_runner::new_config(&repo, vec![contract]);
        let catalog = EventCatalog::new(&config.contracts);

        let provider = Arc::new(StubProvider::new(100).with_logs(vec![
            property_created_log(PROPERTY_REGISTRY_ADDRESS, 60, 1, 7),
            property_created_log(PROPERTY_REGISTRY_ADDRESS, 75, 2, 8),
        ]));

        scheduler::run_tick(&config, &provider, &catalog).await;

        let events_after_first_run = repo.get_all_events().await.unwrap();
        let listings_after_first_run = listings.lock().unwrap().clone();

        // rewind the cursor and replay the same window
        repo.record_batch(
            &UnsavedIndexerState::new(PROPERTY_REGISTRY_ADDRESS, 49, &stored_hash(49), None),
            &[],
        )
        .await
        .unwrap();

        scheduler::run_tick(&config, &provider, &catalog).await;

        let events_after_replay = repo.get_all_events().await.unwrap();
        assert_eq!(events_after_replay, events_after_first_run);
        assert_eq!(*listings.lock().unwrap(), listings_after_first_run);

        let state = repo
            .get_indexer_state(PROPERTY_REGISTRY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.last_processed_block, 97);
    }

    #[tokio::test]
    async fn creates_state_even_when_the_batch_has_no_events() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract =
            property_registry_contract(&listings).with_start_block_number(50);
        let config = test_runner::new_config(&repo, vec![contract]);
        let catalog = EventCatalog::new(&config.contracts);

        let provider = Arc::new(StubProvider::new(100));

        scheduler::run_tick(&config, &provider, &catalog).await;

        assert!(repo.get_all_events().await.unwrap().is_empty());

        let state = repo
            .get_indexer_state(PROPERTY_REGISTRY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.last_processed_block, 97);
    }

    #[tokio::test]
    async fn skips_the_contract_batch_when_log_fetch_fails() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();
        let listings = new_property_listings();
        let contract =
            property_registry_contract(&listings).with_start_block_number(50);
        let config = test_runner::new_config(&repo, vec![contract]);
        let catalog = EventCatalog::new(&config.contracts);

        let provider =
            Arc::new(StubProvider::new(100).failing_get_logs_for(PROPERTY_REGISTRY_ADDRESS));

        scheduler::run_tick(&config, &provider, &catalog).await;

        assert!(repo
            .get_indexer_state(PROPERTY_REGISTRY_ADDRESS)
            .await
            .unwrap()
            .is_none());
        assert!(repo.get_all_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reports_blocks_behind_for_downstream_consumers() {
        test_runner::init_tracing();

        let repo = InMemoryRepo::new();

        repo.record_batch(
            &UnsavedIndexerState::new(PROPERTY_REGISTRY_ADDRESS, 97, &stored_hash(97), None),
            &[],
        )
        .await
        .unwrap();

        let provider = Arc::new(StubProvider::new(100));

        let status = sync_status::get(&repo, &provider, PROPERTY_REGISTRY_ADDRESS)
            .await
            .unwrap();
        assert_eq!(status.current_block_number, 100);
        assert_eq!(status.last_processed_block, Some(97));
        assert_eq!(status.blocks_behind, Some(3));

        let untracked = sync_status::get(&repo, &provider, TOKEN_SALE_ADDRESS).await.unwrap();
        assert_eq!(untracked.last_processed_block, None);
        assert_eq!(untracked.blocks_behind, None);
    }
}
