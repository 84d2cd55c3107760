//! Scripted sessions against a devnet snapshot in a temporary directory

use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use hello_cli::{run, CliError, Cli, Commands, Deployment, ScriptedConsole, DEFAULT_FAUCET_AMOUNT};
use hello_core::{NetworkId, UnshieldedKeystore};
use hello_wallet::local::LocalNetwork;
use hello_wallet::AppConfig;

const SEED: &str = "0303030303030303030303030303030303030303030303030303030303030303";

struct Fixture {
    dir: TempDir,
    config_path: PathBuf,
    config: AppConfig,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
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
        config.sync.sync_throttle_ms = 10;
        config.sync.funds_throttle_ms = 10;
        config.sync.dust_throttle_ms = 10;

        let config_path = dir.path().join("config.json");
        config.save(&config_path).unwrap();
        Self {
            dir,
            config_path,
            config,
        }
    }

    fn deployment_path(&self) -> PathBuf {
        self.dir.path().join("deployment.json")
    }

    fn cli(&self, args: &[&str]) -> Cli {
        let config = self.config_path.to_string_lossy().into_owned();
        let mut argv = vec!["hello-cli", "--config", config.as_str()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_parse_defaults() {
    let cli = Cli::try_parse_from(["hello-cli"]).unwrap();
    assert!(cli.command.is_none());
    assert!(cli.config.is_none());

    let cli = Cli::try_parse_from(["hello-cli", "faucet", "mn_addr_preprod1xyz"]).unwrap();
    match cli.command {
        Some(Commands::Faucet { address, amount }) => {
            assert_eq!(address, "mn_addr_preprod1xyz");
            assert_eq!(amount, DEFAULT_FAUCET_AMOUNT);
        }
        _ => panic!("expected faucet command"),
    }

    let cli = Cli::try_parse_from(["hello-cli", "interact"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Interact { deployment }) if deployment == Path::new("deployment.json")
    ));
}

#[tokio::test]
async fn test_full_session_then_interact() {
    let fixture = Fixture::new();
    let deployment = path_arg(&fixture.deployment_path());

    let mut console = ScriptedConsole::new([
        "2", SEED, // restore wallet
        "1", // deploy
        "2", // read before any store
        "1", "Hello, Midnight!", // store
        "2", // read
        "3", // back
        "3", // exit
    ]);
    run(fixture.cli(&["run", "--deployment", &deployment]), &mut console)
        .await
        .unwrap();

    let transcript = console.transcript();
    assert_eq!(console.remaining_answers(), 0);
    assert!(transcript.contains("Midnight Hello World"));
    assert!(transcript.contains(&format!("  Seed: {}", SEED)));
    assert!(transcript.contains("  Registering 1 NIGHT UTXO(s) for dust generation..."));
    assert!(transcript.contains("  DUST tokens available"));
    assert!(transcript.contains("  Current message: \"(empty)\""));
    assert!(transcript.contains("  Message stored!"));
    assert!(transcript.contains("  Current message: \"Hello, Midnight!\""));
    assert!(transcript.ends_with("\n  Goodbye!\n\n"));

    let saved = Deployment::load(&fixture.deployment_path()).unwrap();
    assert_eq!(saved.contract_address.len(), 64);
    assert!(transcript.contains("  Deploying hello contract..."));
    assert!(transcript.contains(&format!(
        "  Contract deployed at: {}",
        saved.contract_address
    )));
    assert!(transcript.contains("  Storing message: \"Hello, Midnight!\"..."));
    assert!(transcript.contains("  Transaction "));
    assert!(transcript.contains(" added in block "));

    let mut console = ScriptedConsole::new([
        SEED, // wallet seed
        "2",  // read
        "1", "gm", // store
        "2", // read
        "3", // exit
    ]);
    run(
        fixture.cli(&["interact", "--deployment", &deployment]),
        &mut console,
    )
    .await
    .unwrap();

    let transcript = console.transcript();
    assert!(transcript.contains(&format!("  Contract: {}", saved.contract_address)));
    assert!(transcript.contains("Connecting to Midnight preprod..."));
    assert!(transcript.contains("  Connected!"));
    assert!(transcript.contains("  Current message: \"Hello, Midnight!\""));
    assert!(transcript.contains("  Transaction: "));
    assert!(transcript.contains("  Current message: \"gm\""));
}

#[tokio::test]
async fn test_join_saved_contract_reports_progress() {
    let fixture = Fixture::new();
    let deployment = path_arg(&fixture.deployment_path());

    let mut console = ScriptedConsole::new(["2", SEED, "1", "3", "3"]);
    run(fixture.cli(&["run", "--deployment", &deployment]), &mut console)
        .await
        .unwrap();
    let address = Deployment::load(&fixture.deployment_path())
        .unwrap()
        .contract_address;

    let mut console = ScriptedConsole::new([
        "2", SEED, // restore wallet
        "2", address.as_str(), // join
        "1", "joined", // store
        "3", // back
        "3", // exit
    ]);
    run(fixture.cli(&["run", "--deployment", &deployment]), &mut console)
        .await
        .unwrap();

    let transcript = console.transcript();
    assert_eq!(console.remaining_answers(), 0);
    assert!(transcript.contains(&format!("  Joining contract at {}...", address)));
    assert!(transcript.contains("  Joined contract successfully"));
    assert!(transcript.contains("  Storing message: \"joined\"..."));
    assert!(transcript.contains(" added in block "));
    assert!(transcript.contains("  Message stored!"));
}

#[tokio::test]
async fn test_join_unknown_contract_stays_in_menu() {
    let fixture = Fixture::new();
    let deployment = path_arg(&fixture.deployment_path());
    let unknown = "ab".repeat(32);

    let mut console = ScriptedConsole::new(["2", SEED, "2", unknown.as_str(), "3"]);
    run(fixture.cli(&["run", "--deployment", &deployment]), &mut console)
        .await
        .unwrap();

    let transcript = console.transcript();
    assert!(transcript.contains("  Error: "));
    assert!(transcript.contains("  Goodbye!"));
    assert!(!fixture.deployment_path().exists());
}

#[tokio::test]
async fn test_interact_requires_deployment() {
    let fixture = Fixture::new();
    let deployment = path_arg(&fixture.deployment_path());

    let mut console = ScriptedConsole::new(Vec::<String>::new());
    let err = run(
        fixture.cli(&["interact", "--deployment", &deployment]),
        &mut console,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CliError::DeploymentMissing(_)));
    assert!(err.to_string().contains("Run `hello-cli run`"));
    assert!(console.transcript().contains("Hello World Contract CLI"));
}

#[tokio::test]
async fn test_faucet_funds_address() {
    let fixture = Fixture::new();
    let keystore = UnshieldedKeystore::new(&[0x44; 32], NetworkId::PreProd).unwrap();
    let address = keystore.bech32_address().unwrap();

    let mut console = ScriptedConsole::new(Vec::<String>::new());
    run(
        fixture.cli(&["faucet", &address, "--amount", "2500000"]),
        &mut console,
    )
    .await
    .unwrap();
    assert!(console.transcript().starts_with("Sent 2,500,000 tNight to "));

    let network = LocalNetwork::open(&fixture.config).unwrap();
    let coins = network.coins_of(&keystore.public_key()).unwrap();
    assert_eq!(coins.len(), 1);
    assert_eq!(coins[0].utxo.value, 2_500_000);
}
