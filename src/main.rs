// optctl - command-line client for the option escrow ledger

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use optledger::coin::Amount;
use optledger::host::{AppTx, Host, HostConfig, HostError, SignedTx};
use optledger::identity::{strip_hex, Address, Keypair};
use optledger::ledger::Receipt;
use optledger::option::{Action, OptionAddress, OptionRecord};
use optledger::storage::LedgerStore;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "optctl")]
#[command(about = "Create, trade, and exercise currency options", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the ledger store and the local key
    #[arg(long, global = true, env = "OPTLEDGER_HOME", default_value = ".optledger")]
    home: PathBuf,

    /// Blocks the chain advances after each submitted transaction
    #[arg(long, global = true, default_value_t = 1)]
    blocks_per_tx: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the local signing key
    Keygen {
        /// Replace an existing key
        #[arg(long)]
        force: bool,
    },

    /// Print the local account address
    Address,

    /// Mint funds into an account (genesis allocation)
    Fund {
        /// Amount as <quantity><denomination>, e.g. 100USD
        amount: Amount,

        /// Receiving account (defaults to the local account)
        #[arg(long)]
        to: Option<Address>,
    },

    /// Show an account balance
    Balance {
        /// Account to inspect (defaults to the local account)
        address: Option<Address>,
    },

    /// Show the current block height
    Height,

    /// Advance the chain
    Advance {
        /// Number of blocks to add
        #[arg(long, conflicts_with = "to")]
        blocks: Option<u64>,

        /// Absolute height to move to
        #[arg(long)]
        to: Option<u64>,
    },

    /// Submit a signed transaction printed earlier with --print-tx
    Submit {
        /// Hex-encoded signed transaction (0x prefix optional)
        tx: String,
    },

    /// Create, trade, and exercise currency options
    Options {
        #[command(subcommand)]
        command: OptionsCommand,
    },
}

#[derive(Subcommand)]
enum OptionsCommand {
    /// Create a new option by sending money
    Create {
        /// The block height when the option expires
        #[arg(long)]
        expire: u64,

        /// Amount of coins to trade
        #[arg(long)]
        trade: u64,

        /// Coin denomination to trade
        #[arg(long)]
        trade_coin: String,

        #[command(flatten)]
        submit: SubmitArgs,
    },

    /// Offer to sell this option
    Sell {
        /// The address of this option
        #[arg(long)]
        option: OptionAddress,

        /// Amount of coins for price
        #[arg(long)]
        price: u64,

        /// Coin denomination for price
        #[arg(long)]
        price_coin: String,

        /// Who to sell the option to (optional)
        #[arg(long)]
        sellto: Option<Address>,

        #[command(flatten)]
        submit: SubmitArgs,
    },

    /// Attempt to buy this option
    Buy {
        #[arg(long)]
        option: OptionAddress,

        #[command(flatten)]
        submit: SubmitArgs,
    },

    /// Exercise this option to trade currency at the given rate
    Exercise {
        #[arg(long)]
        option: OptionAddress,

        #[command(flatten)]
        submit: SubmitArgs,
    },

    /// Dissolve this option (if never offered, or already expired)
    #[command(alias = "disolve")]
    Dissolve {
        #[arg(long)]
        option: OptionAddress,

        #[command(flatten)]
        submit: SubmitArgs,
    },

    /// Return the contents of the given option
    Query {
        address: OptionAddress,
    },

    /// List every option on the ledger
    List,
}

#[derive(Args)]
struct SubmitArgs {
    /// Print the signed transaction as hex instead of submitting it (see `optctl submit`)
    #[arg(long)]
    print_tx: bool,
}

/// Settings every command receives explicitly
struct Config {
    home: PathBuf,
    host: HostConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config {
        home: cli.home,
        host: HostConfig {
            blocks_per_tx: cli.blocks_per_tx,
        },
    };

    match cli.command {
        Commands::Keygen { force } => keygen(&config, force),
        Commands::Address => {
            let (_, keypair) = open_with_key(&config)?;
            println!("{}", Address::from_public_key(&keypair.public_key()));
            Ok(())
        }
        Commands::Fund { amount, to } => fund(&config, amount, to),
        Commands::Balance { address } => balance(&config, address),
        Commands::Height => {
            let (_, host) = load_host(&config)?;
            println!("{}", host.height());
            Ok(())
        }
        Commands::Advance { blocks, to } => advance(&config, blocks, to),
        Commands::Submit { tx } => submit_hex(&config, &tx),
        Commands::Options { command } => options(&config, command),
    }
}

fn options(config: &Config, command: OptionsCommand) -> anyhow::Result<()> {
    let (action, submit) = match command {
        OptionsCommand::Create {
            expire,
            trade,
            trade_coin,
            submit,
        } => (Action::create(Amount::new(trade_coin, trade)?, expire), submit),
        OptionsCommand::Sell {
            option,
            price,
            price_coin,
            sellto,
            submit,
        } => (Action::sell(option, Amount::new(price_coin, price)?, sellto), submit),
        OptionsCommand::Buy { option, submit } => (Action::buy(option), submit),
        OptionsCommand::Exercise { option, submit } => (Action::exercise(option), submit),
        OptionsCommand::Dissolve { option, submit } => (Action::dissolve(option), submit),
        OptionsCommand::Query { address } => return query(config, &address),
        OptionsCommand::List => return list(config),
    };
    submit_action(config, &action, submit.print_tx)
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn keygen(config: &Config, force: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    if store.load_keypair()?.is_some() && !force {
        bail!("a key already exists in {}; pass --force to replace it", config.home.display());
    }
    let keypair = Keypair::generate();
    store.save_keypair(&keypair)?;
    store.flush()?;
    println!("{}", Address::from_public_key(&keypair.public_key()));
    Ok(())
}

fn fund(config: &Config, amount: Amount, to: Option<Address>) -> anyhow::Result<()> {
    let account = match to {
        Some(account) => account,
        None => local_address(config)?,
    };
    let (store, mut host) = load_host(config)?;

    let movement = host.fund(&account, &amount)?;
    save(&store, host)?;
    println!("{movement}");
    Ok(())
}

fn balance(config: &Config, address: Option<Address>) -> anyhow::Result<()> {
    let account = match address {
        Some(account) => account,
        None => local_address(config)?,
    };
    let (_, host) = load_host(config)?;
    println!("{}", host.ledger().escrow().balance(&account));
    Ok(())
}

fn advance(config: &Config, blocks: Option<u64>, to: Option<u64>) -> anyhow::Result<()> {
    let (store, mut host) = load_host(config)?;

    let height = match (blocks, to) {
        (_, Some(height)) => host.advance_to(height)?,
        (Some(blocks), None) => host.advance(blocks)?,
        (None, None) => host.advance(1)?,
    };
    save(&store, host)?;
    println!("{height}");
    Ok(())
}

fn submit_action(config: &Config, action: &Action, print_only: bool) -> anyhow::Result<()> {
    let (store, keypair) = open_with_key(config)?;
    let (ledger, sequences) = store.load_ledger()?;
    let mut host = Host::from_parts(config.host.clone(), ledger, sequences);

    let caller = Address::from_public_key(&keypair.public_key());
    let tx = SignedTx::sign(&keypair, host.next_sequence(&caller), AppTx::options(action));

    if print_only {
        println!("{}", hex::encode(tx.to_bytes()));
        return Ok(());
    }

    let result = host.submit(&tx);
    finish(&store, host, result)
}

fn submit_hex(config: &Config, tx: &str) -> anyhow::Result<()> {
    let bytes = hex::decode(strip_hex(tx.trim())).context("transaction is not valid hex")?;
    let (store, mut host) = load_host(config)?;
    let result = host.submit_bytes(&bytes);
    finish(&store, host, result)
}

fn finish(store: &LedgerStore, host: Host, result: Result<Receipt, HostError>) -> anyhow::Result<()> {
    // Rejected transactions still consume a sequence number and a block
    save(store, host)?;

    match result {
        Ok(receipt) => {
            print_receipt(&receipt);
            Ok(())
        }
        Err(HostError::Rejected(rejection)) => {
            if let Some(record) = &rejection.record {
                println!("{}", serde_json::to_string_pretty(&record_json(record))?);
            }
            Err(anyhow::Error::new(rejection.error).context("transaction rejected"))
        }
        Err(other) => Err(other.into()),
    }
}

fn query(config: &Config, address: &OptionAddress) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let record = store
        .load_option(address)?
        .with_context(|| format!("no option at {address}"))?;
    println!("{}", serde_json::to_string_pretty(&record_json(&record))?);
    Ok(())
}

fn list(config: &Config) -> anyhow::Result<()> {
    let (_, host) = load_host(config)?;
    let records: Vec<_> = host.ledger().options().map(record_json).collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

fn open_store(config: &Config) -> anyhow::Result<LedgerStore> {
    LedgerStore::open(&config.home).with_context(|| format!("opening {}", config.home.display()))
}

fn open_with_key(config: &Config) -> anyhow::Result<(LedgerStore, Keypair)> {
    let store = open_store(config)?;
    let keypair = store
        .load_keypair()?
        .context("no local key; run `optctl keygen` first")?;
    Ok((store, keypair))
}

fn local_address(config: &Config) -> anyhow::Result<Address> {
    let (_, keypair) = open_with_key(config)?;
    Ok(Address::from_public_key(&keypair.public_key()))
}

fn load_host(config: &Config) -> anyhow::Result<(LedgerStore, Host)> {
    let store = open_store(config)?;
    let (ledger, sequences) = store.load_ledger()?;
    let host = Host::from_parts(config.host.clone(), ledger, sequences);
    Ok((store, host))
}

fn save(store: &LedgerStore, host: Host) -> anyhow::Result<()> {
    let (ledger, sequences) = host.into_parts();
    store.save_ledger(&ledger, &sequences)?;
    store.flush()?;
    Ok(())
}

fn print_receipt(receipt: &Receipt) {
    println!(
        "{} {} -> {} at height {}",
        receipt.action, receipt.option, receipt.state, receipt.height
    );
    for movement in &receipt.movements {
        println!("  {movement}");
    }
}

fn record_json(record: &OptionRecord) -> serde_json::Value {
    json!({
        "address": record.address().to_string(),
        "state": record.state().to_string(),
        "creator": record.creator().to_string(),
        "holder": record.holder().to_string(),
        "trade": record.trade().to_string(),
        "price": record.price().map(|p| p.to_string()),
        "restricted_buyer": record.restricted_buyer().map(|b| b.to_string()),
        "expiration_height": record.expiration_height(),
        "created_height": record.created_height(),
    })
}
