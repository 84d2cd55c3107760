//! End-to-end workflow tests for Hello Midnight
//!
//! Two independent devnet handles on one snapshot stand in for two CLI
//! processes: one deploys and writes, the other joins and reads.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tempfile::TempDir;

use hello_core::contract::hello;
use hello_core::{
    sign_recipe, ContractAction, ContractAddress, Intent, IntentMarkers, Transaction,
    DEFAULT_SEGMENT,
};
use hello_wallet::local::LocalNetwork;
use hello_wallet::{
    create_providers, create_wallet, deploy_hello_contract, get_wallet_addresses,
    join_hello_contract, read_message, register_for_dust, store_message, wait_for_funds,
    wait_for_sync, AppConfig, WalletBackend, WalletContext,
};

const ALICE: &str = "a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1";
const BOB: &str = "b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0";
const THROTTLE: Duration = Duration::from_millis(10);

fn devnet_config(dir: &TempDir) -> AppConfig {
    let zk = dir.path().join("managed/hello");
    std::fs::create_dir_all(zk.join("keys")).unwrap();
    std::fs::create_dir_all(zk.join("zkir")).unwrap();
    std::fs::write(zk.join("keys/storeMessage.prover"), b"prover").unwrap();
    std::fs::write(zk.join("keys/storeMessage.verifier"), b"verifier").unwrap();
    std::fs::write(zk.join("zkir/storeMessage.bzkir"), b"zkir").unwrap();

    let mut config = AppConfig::default();
    config.contract.zk_config_path = zk;
    config.contract.private_state_dir = dir.path().join("private-state");
    config.devnet.snapshot_path = dir.path().join("devnet.json");
    config.devnet.sync_interval_ms = 20;
    config.devnet.auto_fund_delay_ms = 0;
    config
}

async fn ready_wallet(seed: &str, network: &LocalNetwork, config: &AppConfig) -> WalletContext {
    let ctx = create_wallet(seed, network, config).await.unwrap();
    wait_for_funds(ctx.wallet.as_ref(), THROTTLE).await.unwrap();
    register_for_dust(ctx.wallet.as_ref(), &ctx.unshielded_keystore, THROTTLE, |_| {})
        .await
        .unwrap();
    ctx
}

/// Deploy, store, then join and read from a second process
#[tokio::test]
async fn test_two_sessions_share_a_contract() {
    let dir = TempDir::new().unwrap();
    let config = devnet_config(&dir);
    let compiled = hello::compiled(&config.contract.zk_config_path);

    // ==========================================
    // STEP 1: Alice sets up a funded wallet
    // ==========================================
    let alice_net = LocalNetwork::open(&config).unwrap();
    let alice = Arc::new(ready_wallet(ALICE, &alice_net, &config).await);
    let state = wait_for_sync(alice.wallet.as_ref(), THROTTLE).await.unwrap();
    let addresses = get_wallet_addresses(&state, &alice.unshielded_keystore).unwrap();
    assert!(addresses.unshielded.starts_with("mn_addr_preprod1"));
    assert!(addresses.balance > 0);

    // ==========================================
    // STEP 2: Alice deploys and stores a message
    // ==========================================
    let alice_providers = create_providers(alice.clone(), &alice_net, &config)
        .await
        .unwrap();
    let contract = deploy_hello_contract(&alice_providers, &compiled)
        .await
        .unwrap();
    let address = contract.address().to_hex();
    store_message(&contract, "first").await.unwrap();
    alice.wallet.stop().await.unwrap();

    // ==========================================
    // STEP 3: Bob joins from his own handle
    // ==========================================
    let bob_net = LocalNetwork::open(&config).unwrap();
    let bob = Arc::new(ready_wallet(BOB, &bob_net, &config).await);
    let bob_providers = create_providers(bob.clone(), &bob_net, &config)
        .await
        .unwrap();
    let joined = join_hello_contract(&bob_providers, &compiled, &address)
        .await
        .unwrap();
    assert_eq!(
        read_message(&bob_providers, joined.address()).await.unwrap().as_deref(),
        Some("first")
    );

    // ==========================================
    // STEP 4: Bob overwrites, Alice's handle sees it
    // ==========================================
    store_message(&joined, "second").await.unwrap();
    assert_eq!(
        read_message(&alice_providers, contract.address())
            .await
            .unwrap()
            .as_deref(),
        Some("second")
    );
    assert!(alice_net.block_height().unwrap() >= bob_net.block_height().unwrap());

    bob.wallet.stop().await.unwrap();
}

/// After re-signing, every balancing input carries a valid owner signature
#[tokio::test]
async fn test_resigned_balancing_inputs_verify() {
    let dir = TempDir::new().unwrap();
    let config = devnet_config(&dir);
    let network = LocalNetwork::open(&config).unwrap();
    let ctx = ready_wallet(ALICE, &network, &config).await;

    let mut intent = Intent::new(
        Utc::now() + chrono::Duration::minutes(10),
        IntentMarkers::proven(),
    );
    intent.actions.push(ContractAction::Deploy {
        address: ContractAddress::derive(&rand::random()),
        initial_state: hello::initial_state(),
    });
    let tx = Transaction::new(network.network_id(), IntentMarkers::proven())
        .with_intent(DEFAULT_SEGMENT, intent);

    let mut recipe = ctx
        .wallet
        .balance_unbound_transaction(
            tx,
            &ctx.shielded_secret_keys,
            &ctx.dust_secret_key,
            Utc::now() + chrono::Duration::minutes(30),
        )
        .await
        .unwrap();
    let keystore = &ctx.unshielded_keystore;
    sign_recipe(&mut recipe, |payload| keystore.sign_data(payload)).unwrap();

    let balancing = recipe.balancing_transaction.as_ref().unwrap();
    let mut checked = 0;
    for (segment, intent) in balancing.iter_intents() {
        let payload = intent.signature_data(segment).unwrap();
        for offer in intent.unshielded_offers() {
            assert!(offer.is_fully_signed());
            for (i, input) in offer.inputs.iter().enumerate() {
                let signature = offer.signature_at(i).unwrap();
                input.owner.verify(&payload, signature).unwrap();
                checked += 1;
            }
        }
    }
    assert!(checked > 0);

    let finalized = ctx.wallet.finalize_recipe(recipe).await.unwrap();
    let tx_id = ctx.wallet.submit_transaction(finalized).await.unwrap();
    assert!(network.transaction(&tx_id).unwrap().is_some());

    ctx.wallet.stop().await.unwrap();
}
