mod common;

use common::{
    collect_queue_events, test_config, test_wallets, wait_until, FakeChainClient, SubmissionKind,
};
use std::sync::Arc;
use std::time::Duration;
use swap_core::{
    ChainClient, ChainError, NonceManager, QueueError, QueueOptions, Reporter, RetryPolicy,
    SwapAction, SwapPair, Token, TransactionQueue, TxStatus, WalletAccount,
};
use tokio_util::sync::CancellationToken;

fn build_queue(
    client: &Arc<FakeChainClient>,
    wallets: &[WalletAccount],
    options: QueueOptions,
) -> (
    TransactionQueue,
    Arc<std::sync::Mutex<Vec<swap_core::QueueEvent>>>,
) {
    let (reporter, rx) = Reporter::new();
    let queue = TransactionQueue::new(
        Arc::clone(client) as Arc<dyn ChainClient>,
        Arc::new(NonceManager::new()),
        Arc::new(test_config()),
        wallets,
        reporter,
        options,
    );
    (queue, collect_queue_events(rx))
}

fn swap_action(wallet_id: usize) -> SwapAction {
    SwapAction::new(
        wallet_id,
        SwapPair::new(Token::Usdt, Token::Eth),
        Token::Usdt.default_amount(),
        2_000_000_000,
        120,
    )
}

#[tokio::test]
async fn three_enqueues_get_strictly_increasing_nonces() {
    let client = FakeChainClient::new();
    let wallets = test_wallets(1);
    let (queue, _events) = build_queue(&client, &wallets, QueueOptions::default());

    client.set_pending_nonce(&wallets[0].address, 5);

    let cancel = CancellationToken::new();
    for _ in 0..3 {
        queue
            .enqueue(swap_action(1), "swap", &cancel)
            .expect("enqueue");
    }

    wait_until(|| client.submissions().len() == 3).await;

    let nonces: Vec<u64> = client.submissions().iter().map(|s| s.nonce).collect();
    assert_eq!(nonces, vec![5, 6, 7]);
    assert_eq!(client.nonce_fetches(), 1);
    assert_eq!(client.overlap_violations(), 0);
}

#[tokio::test]
async fn missing_allowance_triggers_approval_before_swap() {
    let client = FakeChainClient::new();
    let wallets = test_wallets(1);
    let config = test_config();
    let (queue, _events) = build_queue(&client, &wallets, QueueOptions::default());

    client.set_pending_nonce(&wallets[0].address, 5);
    client.set_allowance(&config.usdt_address, &wallets[0].address, 0);

    let cancel = CancellationToken::new();
    queue
        .enqueue(swap_action(1), "swap", &cancel)
        .expect("enqueue");

    wait_until(|| client.submissions().len() == 2).await;

    let submissions = client.submissions();
    assert_eq!(submissions[0].kind, SubmissionKind::Approval);
    assert_eq!(submissions[1].kind, SubmissionKind::Swap);
    // Approval and swap each consume a nonce from the same cursor.
    assert_eq!(submissions[0].nonce, 5);
    assert_eq!(submissions[1].nonce, 6);
}

#[tokio::test]
async fn stale_nonce_invalidates_cursor_for_the_next_item() {
    let client = FakeChainClient::new();
    let wallets = test_wallets(1);
    let options = QueueOptions {
        retry_policy: RetryPolicy::Drop,
        ..QueueOptions::default()
    };
    let (queue, events) = build_queue(&client, &wallets, options);

    client.set_pending_nonce(&wallets[0].address, 5);
    client.fail_submission(
        2,
        ChainError::NonceMismatch {
            address: wallets[0].address.clone(),
            message: "nonce too low".to_string(),
        },
    );

    let cancel = CancellationToken::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(queue.enqueue(swap_action(1), "swap", &cancel).unwrap());
    }

    wait_until(|| client.submissions().len() == 3).await;

    let submissions = client.submissions();
    assert_eq!(submissions[0].nonce, 5);
    assert_eq!(submissions[1].nonce, 6);
    assert!(!submissions[1].ok);
    // The third item must re-fetch instead of reusing the stale cursor:
    // the chain never accepted nonce 6, so it hands out 6 again.
    assert_eq!(submissions[2].nonce, 6);
    assert_eq!(client.nonce_fetches(), 2);

    wait_until(|| {
        let events = events.lock().unwrap();
        events
            .iter()
            .any(|e| e.id == ids[1] && e.status == TxStatus::Failed)
            && events
                .iter()
                .any(|e| e.id == ids[2] && e.status == TxStatus::Complete)
    })
    .await;
}

#[tokio::test]
async fn rejected_submission_refetches_the_nonce_for_the_next_item() {
    let client = FakeChainClient::new();
    let wallets = test_wallets(1);
    let (queue, events) = build_queue(&client, &wallets, QueueOptions::default());

    client.set_pending_nonce(&wallets[0].address, 5);
    client.fail_submission(
        1,
        ChainError::InsufficientFunds {
            address: wallets[0].address.clone(),
            message: "insufficient funds for gas * price + value".to_string(),
        },
    );

    let cancel = CancellationToken::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(queue.enqueue(swap_action(1), "swap", &cancel).unwrap());
    }

    wait_until(|| client.submissions().len() == 3).await;

    // The rejected submission never consumed nonce 5 on chain, so the
    // next item must re-fetch and submit 5 again rather than a gapped 6
    // that would never confirm.
    let nonces: Vec<u64> = client.submissions().iter().map(|s| s.nonce).collect();
    assert_eq!(nonces, vec![5, 5, 6]);
    assert_eq!(client.nonce_fetches(), 2);

    wait_until(|| {
        let events = events.lock().unwrap();
        events
            .iter()
            .any(|e| e.id == ids[0] && e.status == TxStatus::Failed)
            && events
                .iter()
                .any(|e| e.id == ids[2] && e.status == TxStatus::Complete)
    })
    .await;
}

#[tokio::test]
async fn retry_once_resubmits_the_same_action_with_a_fresh_nonce() {
    let client = FakeChainClient::new();
    let wallets = test_wallets(1);
    let (queue, events) = build_queue(&client, &wallets, QueueOptions::default());

    client.set_pending_nonce(&wallets[0].address, 5);
    client.fail_submission(
        2,
        ChainError::NonceMismatch {
            address: wallets[0].address.clone(),
            message: "nonce too low".to_string(),
        },
    );

    let cancel = CancellationToken::new();
    let first = queue.enqueue(swap_action(1), "swap", &cancel).unwrap();
    let second = queue.enqueue(swap_action(1), "swap", &cancel).unwrap();

    wait_until(|| client.submissions().len() == 3).await;

    let submissions = client.submissions();
    assert_eq!(submissions[0].nonce, 5);
    assert!(!submissions[1].ok);
    // Retried with the re-fetched nonce, not the stale cached one.
    assert_eq!(submissions[2].nonce, 6);
    assert!(submissions[2].ok);

    wait_until(|| {
        let events = events.lock().unwrap();
        events
            .iter()
            .any(|e| e.id == first && e.status == TxStatus::Complete)
            && events
                .iter()
                .any(|e| e.id == second && e.status == TxStatus::Complete)
    })
    .await;
}

#[tokio::test]
async fn wallet_pipelines_are_serial_but_mutually_independent() {
    let client = FakeChainClient::new();
    let wallets = test_wallets(2);
    let (queue, _events) = build_queue(&client, &wallets, QueueOptions::default());

    let cancel = CancellationToken::new();
    for _ in 0..3 {
        queue.enqueue(swap_action(1), "w1 swap", &cancel).unwrap();
        queue.enqueue(swap_action(2), "w2 swap", &cancel).unwrap();
    }

    wait_until(|| client.submissions().len() == 6).await;

    assert_eq!(client.overlap_violations(), 0);
    for wallet in &wallets {
        let nonces: Vec<u64> = client
            .submissions()
            .iter()
            .filter(|s| s.owner == wallet.address)
            .map(|s| s.nonce)
            .collect();
        assert_eq!(nonces, vec![0, 1, 2]);
    }
}

#[tokio::test]
async fn item_walks_pending_processing_complete_then_is_pruned() {
    let client = FakeChainClient::new();
    let wallets = test_wallets(1);
    let options = QueueOptions {
        prune_grace: Duration::from_millis(50),
        ..QueueOptions::default()
    };
    let (queue, events) = build_queue(&client, &wallets, options);

    let cancel = CancellationToken::new();
    let id = queue.enqueue(swap_action(1), "swap", &cancel).unwrap();
    assert_eq!(queue.snapshot().len(), 1);

    wait_until(|| {
        let events = events.lock().unwrap();
        let statuses: Vec<TxStatus> = events
            .iter()
            .filter(|e| e.id == id)
            .map(|e| e.status)
            .collect();
        statuses == vec![TxStatus::Pending, TxStatus::Processing, TxStatus::Complete]
    })
    .await;

    wait_until(|| queue.snapshot().is_empty()).await;
}

#[tokio::test]
async fn cancelled_work_is_not_executed() {
    let client = FakeChainClient::new();
    let wallets = test_wallets(1);
    let (queue, events) = build_queue(&client, &wallets, QueueOptions::default());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let id = queue.enqueue(swap_action(1), "swap", &cancel).unwrap();

    wait_until(|| {
        events
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.id == id && e.status == TxStatus::Failed)
    })
    .await;
    assert!(client.submissions().is_empty());
}

#[tokio::test]
async fn unknown_wallet_is_rejected() {
    let client = FakeChainClient::new();
    let wallets = test_wallets(1);
    let (queue, _events) = build_queue(&client, &wallets, QueueOptions::default());

    let cancel = CancellationToken::new();
    let result = queue.enqueue(swap_action(7), "swap", &cancel);
    assert!(matches!(result, Err(QueueError::UnknownWallet(7))));
}
