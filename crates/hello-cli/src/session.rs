//! Interactive sessions
//!
//! `run_full` walks a user from wallet creation to the contract menus;
//! `run_interact` joins the contract recorded in a deployment file. Errors
//! from a single menu action are printed and the menu continues; errors while
//! setting up the session end it.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use hello_core::contract::hello;
use hello_core::ContractAddress;
use hello_wallet::{
    create_providers, create_wallet, deploy_hello_contract, generate_new_seed,
    get_dust_balance, get_wallet_addresses, join_hello_contract, read_message, register_for_dust,
    store_message, wait_for_funds, wait_for_sync, AppConfig, DeployedHelloContract, DustProgress,
    HelloProviders, WalletBackend, WalletContext,
};

use crate::console::Console;
use crate::deployment::Deployment;
use crate::error::Result;
use crate::format::{abbreviate, format_balance};

const BANNER: &str = "
╔══════════════════════════════════════════════════════════════╗
║                                                              ║
║              Midnight Hello World                            ║
║              ────────────────────                            ║
║              Store messages on the blockchain                ║
║                                                              ║
╚══════════════════════════════════════════════════════════════╝
";

const INTERACT_BANNER: &str = "
╔══════════════════════════════════════════════════════════════╗
║              Hello World Contract CLI                        ║
╚══════════════════════════════════════════════════════════════╝
";

const RULE: &str = "────────────────────────────────────────────────────────────────";

fn dust_progress_line(progress: &DustProgress) -> String {
    match progress {
        DustProgress::AlreadyAvailable(_) => "  DUST already available".to_string(),
        DustProgress::Registering { coins } => format!(
            "  Registering {} NIGHT UTXO(s) for dust generation...",
            coins
        ),
        DustProgress::Waiting => "  Waiting for dust tokens...".to_string(),
        DustProgress::Available(_) => "  DUST tokens available".to_string(),
    }
}

/// Create or restore a wallet, fund it, and run the contract menus
pub async fn run_full<C: Console>(
    console: &mut C,
    backend: &dyn WalletBackend,
    config: &AppConfig,
    deployment_path: &Path,
) -> Result<()> {
    console.println(BANNER);

    console.println("─── Wallet Setup ───────────────────────────────────────────────\n");
    let choice = console
        .question("  [1] Create new wallet\n  [2] Restore from seed\n  > ")
        .await?;
    let seed = if choice.trim() == "2" {
        console.question("\n  Enter seed: ").await?.trim().to_string()
    } else {
        generate_new_seed()
    };

    console.println("\n  Creating wallet...");
    let ctx = Arc::new(create_wallet(&seed, backend, config).await?);

    console.println("  Syncing with network...");
    let state = wait_for_sync(ctx.wallet.as_ref(), config.sync.sync_throttle()).await?;
    let addresses = get_wallet_addresses(&state, &ctx.unshielded_keystore)?;

    console.println(&format!(
        "\n─── Wallet Ready ───────────────────────────────────────────────\n  \
         Seed: {}\n\n  \
         Unshielded Address: {}\n  \
         Balance: {} tNight\n\n  \
         Faucet: {}\n  \
         Devnet: hello-cli faucet {}\n{}\n",
        seed,
        addresses.unshielded,
        format_balance(addresses.balance),
        config.network.faucet,
        addresses.unshielded,
        RULE
    ));

    if addresses.balance == 0 {
        console.println("  Waiting for funds from faucet...");
        let balance = wait_for_funds(ctx.wallet.as_ref(), config.sync.funds_throttle()).await?;
        console.println(&format!("  Received {} tNight\n", format_balance(balance)));
    }

    register_for_dust(
        ctx.wallet.as_ref(),
        &ctx.unshielded_keystore,
        config.sync.dust_throttle(),
        |progress| console.println(&dust_progress_line(progress)),
    )
    .await?;

    console.println("  Setting up providers...");
    let providers = create_providers(ctx.clone(), backend, config).await?;
    console.println("  Ready!\n");

    contract_menu(console, &ctx, &providers, config, deployment_path).await?;

    ctx.wallet.stop().await?;
    console.println("\n  Goodbye!\n");
    Ok(())
}

async fn contract_menu<C: Console>(
    console: &mut C,
    ctx: &WalletContext,
    providers: &HelloProviders,
    config: &AppConfig,
    deployment_path: &Path,
) -> Result<()> {
    let compiled = hello::compiled(&config.contract.zk_config_path);

    loop {
        let dust = get_dust_balance(ctx.wallet.as_ref()).await?;
        console.println(&format!(
            "─── Menu ─────────────────────────────────── DUST: {}",
            format_balance(dust)
        ));
        let action = console
            .question("  [1] Deploy new contract\n  [2] Join existing contract\n  [3] Exit\n  > ")
            .await?;

        let result = match action.trim() {
            "3" => break,
            "1" => {
                console.println("  Deploying hello contract...");
                deploy_hello_contract(providers, &compiled).await.map(|contract| {
                    let address = contract.address().to_hex();
                    console.println(&format!("  Contract deployed at: {}\n", address));
                    if let Err(e) = Deployment::new(address).save(deployment_path) {
                        warn!("Could not write {}: {}", deployment_path.display(), e);
                    }
                    contract
                })
            }
            "2" => {
                let address = console.question("  Contract address: ").await?;
                let address = address.trim();
                console.println(&format!("  Joining contract at {}...", address));
                join_hello_contract(providers, &compiled, address)
                    .await
                    .inspect(|_| console.println("  Joined contract successfully\n"))
            }
            _ => continue,
        };

        match result {
            Ok(contract) => message_menu(console, ctx, providers, &contract).await?,
            Err(e) => console.println(&format!("  Error: {}\n", e)),
        }
    }
    Ok(())
}

async fn message_menu<C: Console>(
    console: &mut C,
    ctx: &WalletContext,
    providers: &HelloProviders,
    contract: &DeployedHelloContract,
) -> Result<()> {
    let address = *contract.address();

    loop {
        let dust = get_dust_balance(ctx.wallet.as_ref()).await?;
        console.println(&format!(
            "\n─── Contract: {} ─── DUST: {}",
            abbreviate(&address.to_hex(), 16),
            format_balance(dust)
        ));
        let action = console
            .question("  [1] Store message\n  [2] Read message\n  [3] Back\n  > ")
            .await?;

        match action.trim() {
            "3" => break,
            "1" => {
                let message = console.question("  Message: ").await?;
                console.println(&format!("  Storing message: \"{}\"...", message));
                match store_message(contract, &message).await {
                    Ok(tx) => {
                        console.println(&format!(
                            "  Transaction {} added in block {}",
                            tx.tx_id, tx.block_height
                        ));
                        console.println("  Message stored!\n");
                    }
                    Err(e) => console.println(&format!("  Error: {}\n", e)),
                }
            }
            "2" => match read_message(providers, &address).await {
                Ok(message) => console.println(&format!(
                    "  Current message: \"{}\"\n",
                    message.as_deref().unwrap_or("(empty)")
                )),
                Err(e) => console.println(&format!("  Error: {}\n", e)),
            },
            _ => {}
        }
    }
    Ok(())
}

/// Join the contract in `deployment_path` and store or read messages
pub async fn run_interact<C: Console>(
    console: &mut C,
    backend: &dyn WalletBackend,
    config: &AppConfig,
    deployment_path: &Path,
) -> Result<()> {
    console.println(INTERACT_BANNER);

    let deployment = Deployment::load(deployment_path)?;
    console.println(&format!("  Contract: {}\n", deployment.contract_address));

    let seed = console.question("  Enter your wallet seed: ").await?;

    console.println(&format!(
        "\n  Connecting to Midnight {}...",
        backend.network_id()
    ));
    let ctx = Arc::new(create_wallet(seed.trim(), backend, config).await?);

    console.println("  Syncing wallet...");
    wait_for_sync(ctx.wallet.as_ref(), config.sync.sync_throttle()).await?;

    console.println("  Setting up providers...");
    let providers = create_providers(ctx.clone(), backend, config).await?;

    console.println("  Joining contract...");
    let compiled = hello::compiled(&config.contract.zk_config_path);
    let contract =
        join_hello_contract(&providers, &compiled, &deployment.contract_address).await?;
    info!("Joined contract {}", contract.address());
    console.println("  Connected!\n");

    loop {
        let dust = get_dust_balance(ctx.wallet.as_ref()).await?;
        console.println(RULE);
        console.println(&format!("  DUST: {}", format_balance(dust)));
        console.println(RULE);
        let choice = console
            .question("  [1] Store a message\n  [2] Read current message\n  [3] Exit\n  > ")
            .await?;

        match choice.trim() {
            "1" => {
                let message = console.question("\n  Enter message: ").await?;
                console.println("  Storing message (this may take 20-30 seconds)...\n");
                match store_message(&contract, &message).await {
                    Ok(tx) => {
                        console.println("  Message stored!");
                        console.println(&format!("  Transaction: {}", tx.tx_id));
                        console.println(&format!("  Block: {}\n", tx.block_height));
                    }
                    Err(e) => console.println(&format!("  Error: {}\n", e)),
                }
            }
            "2" => {
                console.println("\n  Reading message from blockchain...");
                match current_message(&providers, contract.address()).await {
                    Ok(Some(message)) => console.println(&format!(
                        "  Current message: \"{}\"\n",
                        message.unwrap_or_else(|| "(empty)".to_string())
                    )),
                    Ok(None) => console.println("  No message found.\n"),
                    Err(e) => console.println(&format!("  Error: {}\n", e)),
                }
            }
            "3" => break,
            _ => {}
        }
    }

    ctx.wallet.stop().await?;
    console.println("\n  Goodbye!\n");
    Ok(())
}

/// `None` if the contract has no state, `Some(None)` if its message is unset
async fn current_message(
    providers: &HelloProviders,
    address: &ContractAddress,
) -> Result<Option<Option<String>>> {
    let state = providers
        .public_data_provider
        .query_contract_state(address)
        .await?;
    match state {
        Some(state) => Ok(Some(hello::ledger(&state)?.message)),
        None => Ok(None),
    }
}
