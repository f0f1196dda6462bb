use anyhow::{bail, Context};
use clap::Parser;
use cipher_essentials::utils::rand::LabeledRng;
use ledger_card_protocol::ledger::{Category, InMemoryLedger, KeyedSigner};
use ledger_card_protocol::payload::encode_field;
use ledger_card_protocol::{Address, Ledger, Phase, PlayerNode, ProtocolConfig};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Deal a hand to every player of a simulated table sharing one in-memory
/// ledger.
#[derive(Parser, Debug)]
#[command(name = "deal")]
struct Args {
    /// Number of players at the table, creator included.
    #[arg(long, default_value_t = 3)]
    players: usize,

    /// Label the players' randomness is derived from.
    #[arg(long, default_value = "deal")]
    seed: String,

    /// YAML protocol configuration; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override every poll interval, in milliseconds.
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,

    /// Give up after this many seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    if args.players < 2 || args.players > 26 {
        bail!("a table seats between 2 and 26 players");
    }

    let mut config = match &args.config {
        Some(path) => ProtocolConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ProtocolConfig::default(),
    };
    config.min_players = args.players;
    let config = config.with_interval(Duration::from_millis(args.interval_ms));
    config.validate()?;

    let ledger = Arc::new(InMemoryLedger::new());
    let names: Vec<String> = (0..args.players)
        .map(|i| format!("player-{}", (b'a' + i as u8) as char))
        .collect();
    let creator = Address::new(names[0].clone());

    // the game is referenced by the transaction that created it
    let creator_signer = KeyedSigner::new(creator.as_str());
    let game_id = ledger
        .publish(
            &creator_signer,
            &Category::raw(format!("{}create", config.protocol_prefix)),
            &[],
            Vec::new(),
        )
        .await?;
    info!(game = %game_id, players = args.players, "game created");

    let root = LabeledRng::from_label(args.seed.as_bytes());
    let (shutdown, stop) = watch::channel(false);
    let mut phases = Vec::new();
    let mut handles = Vec::new();
    for name in &names {
        let node = PlayerNode::new(
            config.clone(),
            ledger.clone(),
            Arc::new(KeyedSigner::new(name.as_str())),
            game_id.clone(),
            creator.clone(),
            root.fork(name.as_bytes()),
        );
        phases.push(node.subscribe_phase());
        handles.push(tokio::spawn(node.run(stop.clone())));
    }

    let deadline = Duration::from_secs(args.timeout_secs);
    for phase in phases.iter_mut() {
        tokio::time::timeout(deadline, phase.wait_for(|p| *p == Phase::Ready))
            .await
            .context("table did not get ready in time")??;
    }
    shutdown.send(true)?;

    for handle in handles {
        let node = handle.await?;
        let session = node.session();
        let cards: Vec<String> = session
            .cards()
            .iter()
            .map(|card| {
                let digits = encode_field(card);
                format!("{}…", &digits[..digits.len().min(12)])
            })
            .collect();
        let role = if node.address() == session.dealer() {
            " (dealer)"
        } else {
            ""
        };
        println!("{}{}: {}", node.address(), role, cards.join(", "));
    }
    println!("{} transactions on the ledger", ledger.transactions().len());
    Ok(())
}
