//! disburse: operator interface for a local Disburse distribution.
//!
//! Keeps the distribution state and a simulated custody ledger on disk and
//! applies one operation per invocation: register payees, advance the
//! release, fund custody, withdraw, or inspect.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use disburse_core::error::DisburseError;
use disburse_core::types::{AccountId, Amount, PayeeSpec, PayeeView, Payout};
use disburse_engine::ledger::LedgerSnapshot;
use disburse_engine::{
    load_snapshot, save_snapshot, write_atomic, AdminAuthority, DistributionEngine, EngineConfig, LogConfig,
    LogFormat, MemoryLedger,
};

type Engine = DistributionEngine<MemoryLedger, AdminAuthority>;

/// Disburse operator CLI.
#[derive(Parser)]
#[command(name = "disburse")]
#[command(version, about = "Batch-released, fee-aware payee distributions.")]
struct Cli {
    /// State file (default: <data dir>/disburse/state.json).
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Account issuing the command (default: the administrator).
    #[arg(long, global = true)]
    caller: Option<AccountId>,

    /// Log level filter (overrides the config file).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (overrides the config file).
    #[arg(long, global = true, value_parser = ["text", "json"])]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new distribution from a TOML config.
    Init(InitArgs),
    /// Credit an account in the simulated ledger.
    Mint(MintArgs),
    /// Register payees, given as ACCOUNT:SHARES:FEE_RATE.
    Register(RegisterArgs),
    /// Advance the release by DELTA percentage points.
    Release {
        delta: u8,
    },
    /// Withdraw a payee's pending amount.
    Withdraw {
        /// Payee to pay (default: the caller).
        #[arg(long)]
        payee: Option<AccountId>,
    },
    /// Withdraw accrued fees to the fee recipient.
    WithdrawFees,
    /// Change the fee recipient.
    SetFeeRecipient {
        account: AccountId,
    },
    /// Change or clear the distributed token.
    SetToken(SetTokenArgs),
    /// Print the distribution.
    Show {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct InitArgs {
    /// TOML config file.
    #[arg(short, long)]
    config: PathBuf,

    /// Replace an existing state file.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct MintArgs {
    /// Amount in token base units.
    amount: Amount,

    /// Recipient (default: custody).
    #[arg(long)]
    to: Option<AccountId>,

    /// Token (default: the configured token).
    #[arg(long)]
    token: Option<AccountId>,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(required = true, value_parser = parse_payee)]
    payees: Vec<PayeeSpec>,
}

#[derive(Args)]
struct SetTokenArgs {
    #[arg(required_unless_present = "clear")]
    token: Option<AccountId>,

    /// Unset the token; withdrawals fail until a new one is set.
    #[arg(long, conflicts_with = "token")]
    clear: bool,
}

fn parse_payee(s: &str) -> Result<PayeeSpec, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [account, shares, fee_rate] = parts.as_slice() else {
        return Err(format!("expected ACCOUNT:SHARES:FEE_RATE, got {s:?}"));
    };
    let account = account.parse::<AccountId>().map_err(|e| e.to_string())?;
    let shares = shares.parse::<u64>().map_err(|e| format!("shares: {e}"))?;
    let fee_rate = fee_rate.parse::<u8>().map_err(|e| format!("fee rate: {e}"))?;
    Ok(PayeeSpec::new(account, shares, fee_rate))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // `init` reads its log settings from the config file; flags still win.
    let config = match &cli.command {
        Commands::Init(args) => Some(
            EngineConfig::load(Some(&args.config))
                .with_context(|| format!("Failed to load config: {}", args.config.display()))?,
        ),
        _ => None,
    };
    let base = config.as_ref().map(|c| c.log.clone()).unwrap_or_default();
    let log = resolve_log(base, cli.log_level.as_deref(), cli.log_format.as_deref());
    init_logging(&log);

    let workspace = Workspace::new(cli.state.clone().unwrap_or_else(default_state_path));

    match cli.command {
        Commands::Init(args) => init(&workspace, config, args.force),
        command => {
            let engine = workspace.open()?;
            run(&engine, cli.caller, command)?;
            workspace.save(&engine)
        }
    }
}

fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("disburse")
        .join("state.json")
}

fn resolve_log(base: LogConfig, level: Option<&str>, format: Option<&str>) -> LogConfig {
    LogConfig {
        level: level.map(str::to_string).unwrap_or(base.level),
        format: match format {
            Some("json") => LogFormat::Json,
            Some(_) => LogFormat::Text,
            None => base.format,
        },
    }
}

fn init_logging(log: &LogConfig) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    match log.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init(),
    }
}

/// On-disk location of a distribution: the state snapshot plus the
/// simulated ledger next to it.
struct Workspace {
    state_path: PathBuf,
    ledger_path: PathBuf,
}

impl Workspace {
    fn new(state_path: PathBuf) -> Self {
        let ledger_path = state_path.with_extension("ledger.json");
        Self {
            state_path,
            ledger_path,
        }
    }

    fn exists(&self) -> bool {
        self.state_path.exists()
    }

    fn open(&self) -> Result<Engine> {
        if !self.exists() {
            bail!(
                "No distribution at {} (run `disburse init` first)",
                self.state_path.display()
            );
        }
        let state = load_snapshot(&self.state_path)
            .with_context(|| format!("Failed to load state: {}", self.state_path.display()))?;
        let ledger = read_ledger(&self.ledger_path)?;
        let authority = AdminAuthority::for_settings(&state.settings);
        Ok(DistributionEngine::from_state(state, ledger, authority)?)
    }

    /// The ledger goes first: a state file never records a payout the
    /// ledger file is missing.
    fn save(&self, engine: &Engine) -> Result<()> {
        let json = serde_json::to_vec_pretty(&engine.ledger().snapshot())?;
        write_atomic(&self.ledger_path, &json)
            .with_context(|| format!("Failed to save ledger: {}", self.ledger_path.display()))?;
        save_snapshot(&self.state_path, &engine.snapshot())
            .with_context(|| format!("Failed to save state: {}", self.state_path.display()))
    }
}

fn read_ledger(path: &Path) -> Result<MemoryLedger> {
    if !path.exists() {
        return Ok(MemoryLedger::new());
    }
    let bytes = fs::read(path).with_context(|| format!("Failed to read ledger: {}", path.display()))?;
    let snapshot: LedgerSnapshot =
        serde_json::from_slice(&bytes).with_context(|| format!("Corrupt ledger: {}", path.display()))?;
    Ok(MemoryLedger::from_snapshot(snapshot))
}

fn init(workspace: &Workspace, config: Option<EngineConfig>, force: bool) -> Result<()> {
    let Some(config) = config else {
        bail!("init requires a config");
    };
    if workspace.exists() && !force {
        bail!(
            "Distribution already exists: {} (use --force to replace it)",
            workspace.state_path.display()
        );
    }
    let engine = config.build(MemoryLedger::new())?;
    workspace.save(&engine)?;
    info!(path = %workspace.state_path.display(), "distribution initialized");
    println!("Initialized \"{}\" at {}", engine.investment_name(), workspace.state_path.display());
    println!("Payees: {}", engine.payee_count());
    Ok(())
}

fn run(engine: &Engine, caller: Option<AccountId>, command: Commands) -> Result<()> {
    let admin = engine.administrator();
    let caller = caller.unwrap_or(admin);
    match command {
        Commands::Init(_) => bail!("Distribution already initialized"),
        Commands::Mint(args) => {
            let token = match args.token.or(engine.token_address()) {
                Some(token) => token,
                None => bail!("No token configured; pass --token"),
            };
            let to = args.to.unwrap_or(engine.custody());
            let balance = engine.ledger().mint(&token, &to, args.amount)?;
            println!("Minted {} to {} (balance {})", args.amount, to, balance);
        }
        Commands::Register(args) => {
            let ids = engine.register_specs(&caller, &args.payees)?;
            for (spec, id) in args.payees.iter().zip(ids) {
                println!("Registered {} as {} ({} shares, {}% fee)", spec.account, id, spec.shares, spec.fee_rate);
            }
        }
        Commands::Release { delta } => {
            let released = engine.advance_release(&caller, delta)?;
            println!("Released {released}%");
        }
        Commands::Withdraw { payee } => {
            let payee = payee.unwrap_or(caller);
            report_payout(engine.withdraw(&caller, &payee))?;
        }
        Commands::WithdrawFees => {
            report_payout(engine.withdraw_fees(&caller))?;
        }
        Commands::SetFeeRecipient { account } => {
            engine.set_fee_recipient(&caller, account)?;
            println!("Fee recipient: {account}");
        }
        Commands::SetToken(args) => {
            let token = if args.clear { None } else { args.token };
            engine.set_token_address(&caller, token)?;
            match token {
                Some(token) => println!("Token: {token}"),
                None => println!("Token cleared"),
            }
        }
        Commands::Show { json } => show(engine, json)?,
    }
    Ok(())
}

fn report_payout(result: Result<Payout, DisburseError>) -> Result<()> {
    match result {
        Ok(payout) => {
            println!(
                "Paid {} to {} (claimed {}, released {}%)",
                payout.amount, payout.recipient, payout.claimed, payout.released_percent
            );
            Ok(())
        }
        Err(e) if e.is_benign() => {
            println!("{e}");
            Ok(())
        }
        Err(e) if e.is_retryable() => Err(anyhow::Error::new(e).context("Transfer failed; nothing was recorded, retry later")),
        Err(e) => Err(e.into()),
    }
}

#[derive(Serialize)]
struct ShowView {
    investment_name: String,
    administrator: AccountId,
    fee_recipient: AccountId,
    token_address: Option<AccountId>,
    total_investment: Amount,
    released_percent: u8,
    total_shares: u64,
    total_claimed: Amount,
    fee_recipient_claimed: Amount,
    pending_fees: Amount,
    outstanding_liability: Amount,
    payees: Vec<PayeeView>,
}

fn show(engine: &Engine, json: bool) -> Result<()> {
    let payees = engine.payees()?;
    if json {
        let view = ShowView {
            investment_name: engine.investment_name(),
            administrator: engine.administrator(),
            fee_recipient: engine.fee_recipient(),
            token_address: engine.token_address(),
            total_investment: engine.total_investment(),
            released_percent: engine.released_percent(),
            total_shares: engine.total_shares(),
            total_claimed: engine.total_claimed(),
            fee_recipient_claimed: engine.fee_recipient_claimed(),
            pending_fees: engine.pending_fees()?,
            outstanding_liability: engine.outstanding_liability()?,
            payees,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Investment:       {}", engine.investment_name());
    println!("Administrator:    {}", engine.administrator());
    println!("Fee recipient:    {}", engine.fee_recipient());
    match engine.token_address() {
        Some(token) => println!("Token:            {token}"),
        None => println!("Token:            (not configured)"),
    }
    println!("Total investment: {}", engine.total_investment());
    println!("Released:         {}%", engine.released_percent());
    println!("Total claimed:    {}", engine.total_claimed());
    println!(
        "Fees:             {} claimed, {} pending",
        engine.fee_recipient_claimed(),
        engine.pending_fees()?
    );
    println!("Liability:        {}", engine.outstanding_liability()?);
    if let Ok(balance) = engine.custody_balance() {
        println!("Custody balance:  {balance}");
    }
    println!("\nPayees ({}):", payees.len());
    for p in &payees {
        let status = engine.claim_status(&p.account)?;
        println!(
            "  {:>4} {} shares={} fee={}% claimed={} pending={} {:?}",
            p.id.to_string(),
            p.account,
            p.shares,
            p.fee_rate,
            p.claimed,
            p.pending,
            status
        );
    }
    Ok(())
}
