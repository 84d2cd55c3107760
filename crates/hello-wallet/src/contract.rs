//! Hello contract API: deploy, join, store and read
//!
//! Every state-changing call goes through the same pipeline: build an
//! unproven transaction, prove it, let the wallet balance and finalize it,
//! submit, then wait for the indexer to report it in a block.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use hello_core::contract::hello;
use hello_core::{
    CompiledContract, ContractAction, ContractAddress, Error as CoreError, Intent, IntentMarkers,
    Transaction, TxId, DEFAULT_SEGMENT,
};

use crate::error::{Result, WalletError};
use crate::providers::{FinalizedTxData, HelloProviders, DEFAULT_TTL_MINUTES};

/// Private state id of the Hello contract
pub const HELLO_PRIVATE_STATE_ID: &str = "helloPrivateState";

/// Private state of the Hello contract (it keeps none)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloPrivateState {}

/// Public data of the transaction that deployed a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployTxData {
    pub contract_address: ContractAddress,
    pub tx_id: TxId,
    pub block_height: u64,
}

/// A deployed or joined Hello contract bound to a provider set
#[derive(Clone)]
pub struct DeployedHelloContract {
    pub deploy_tx_data: DeployTxData,
    compiled: CompiledContract,
    providers: HelloProviders,
}

impl DeployedHelloContract {
    pub fn address(&self) -> &ContractAddress {
        &self.deploy_tx_data.contract_address
    }

    pub fn compiled(&self) -> &CompiledContract {
        &self.compiled
    }
}

impl std::fmt::Debug for DeployedHelloContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployedHelloContract")
            .field("deploy_tx_data", &self.deploy_tx_data)
            .field("compiled", &self.compiled)
            .finish_non_exhaustive()
    }
}

fn single_action_tx(providers: &HelloProviders, action: ContractAction) -> Transaction {
    let ttl = Utc::now() + Duration::minutes(DEFAULT_TTL_MINUTES);
    let mut intent = Intent::new(ttl, IntentMarkers::unproven());
    intent.actions.push(action);
    Transaction::new(
        providers.wallet_provider.network_id(),
        IntentMarkers::unproven(),
    )
    .with_intent(DEFAULT_SEGMENT, intent)
}

/// Prove, balance, submit and wait for inclusion
async fn submit_tx(providers: &HelloProviders, tx: Transaction) -> Result<FinalizedTxData> {
    let proven = providers.proof_provider.prove_tx(tx).await?;
    let balanced = providers.wallet_provider.balance_tx(proven, None).await?;
    let tx_id = providers.midnight_provider.submit_tx(balanced).await?;
    providers.public_data_provider.watch_for_tx_data(&tx_id).await
}

async fn ensure_private_state(providers: &HelloProviders) -> Result<()> {
    if providers
        .private_state_provider
        .get(HELLO_PRIVATE_STATE_ID)
        .await?
        .is_none()
    {
        let initial = serde_json::to_value(HelloPrivateState::default())?;
        providers
            .private_state_provider
            .set(HELLO_PRIVATE_STATE_ID, initial)
            .await?;
    }
    Ok(())
}

/// Deploy a new Hello contract
pub async fn deploy_hello_contract(
    providers: &HelloProviders,
    compiled: &CompiledContract,
) -> Result<DeployedHelloContract> {
    info!("Deploying {} contract", compiled.name());

    for circuit in compiled.circuits() {
        providers.zk_config_provider.get_verifier_key(circuit).await?;
    }

    let nonce: [u8; 32] = rand::random();
    let contract_address = ContractAddress::derive(&nonce);
    let tx = single_action_tx(
        providers,
        ContractAction::Deploy {
            address: contract_address,
            initial_state: hello::initial_state(),
        },
    );

    let finalized = submit_tx(providers, tx).await?;
    providers
        .private_state_provider
        .set(
            HELLO_PRIVATE_STATE_ID,
            serde_json::to_value(HelloPrivateState::default())?,
        )
        .await?;

    info!("Contract deployed at: {}", contract_address);
    Ok(DeployedHelloContract {
        deploy_tx_data: DeployTxData {
            contract_address,
            tx_id: finalized.tx_id,
            block_height: finalized.block_height,
        },
        compiled: compiled.clone(),
        providers: providers.clone(),
    })
}

/// Join an existing Hello contract by its hex address
pub async fn join_hello_contract(
    providers: &HelloProviders,
    compiled: &CompiledContract,
    contract_address: &str,
) -> Result<DeployedHelloContract> {
    let address = ContractAddress::from_hex(contract_address)?;
    info!("Joining contract at {}", address);

    let state = providers
        .public_data_provider
        .query_contract_state(&address)
        .await?
        .ok_or_else(|| WalletError::ContractNotFound(address.to_hex()))?;
    if let Some(missing) = compiled.circuits().iter().find(|c| !state.has_operation(c)) {
        return Err(CoreError::Ledger(format!(
            "contract at {} has no {} circuit",
            address.short(),
            missing
        ))
        .into());
    }

    let deploy = providers
        .public_data_provider
        .query_deploy_tx_data(&address)
        .await?
        .ok_or_else(|| WalletError::ContractNotFound(address.to_hex()))?;
    ensure_private_state(providers).await?;

    Ok(DeployedHelloContract {
        deploy_tx_data: DeployTxData {
            contract_address: address,
            tx_id: deploy.tx_id,
            block_height: deploy.block_height,
        },
        compiled: compiled.clone(),
        providers: providers.clone(),
    })
}

/// Call `storeMessage(message)` on a contract
pub async fn store_message(
    contract: &DeployedHelloContract,
    message: &str,
) -> Result<FinalizedTxData> {
    if !contract.compiled.has_circuit(hello::STORE_MESSAGE) {
        return Err(CoreError::Ledger(format!(
            "{} has no {} circuit",
            contract.compiled.name(),
            hello::STORE_MESSAGE
        ))
        .into());
    }

    let tx = single_action_tx(
        &contract.providers,
        ContractAction::Call {
            address: *contract.address(),
            entry_point: hello::STORE_MESSAGE.to_string(),
            transcript: hello::store_message(message),
            proof: None,
        },
    );

    let finalized = submit_tx(&contract.providers, tx).await?;
    info!(
        "Transaction {} added in block {}",
        finalized.tx_id, finalized.block_height
    );
    Ok(finalized)
}

/// Current message of a contract; `None` if unset, empty, or nothing is deployed
pub async fn read_message(
    providers: &HelloProviders,
    contract_address: &ContractAddress,
) -> Result<Option<String>> {
    let Some(state) = providers
        .public_data_provider
        .query_contract_state(contract_address)
        .await?
    else {
        return Ok(None);
    };
    Ok(hello::ledger(&state)?.message)
}
