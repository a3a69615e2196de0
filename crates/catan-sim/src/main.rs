//! Catan game simulator.
//!
//! Runs one or more games between agents and prints a JSON summary of each.
//!
//! Environment:
//! - `CATAN_CONFIG`: path to a JSON game config
//! - `CATAN_SEED`: seed for the first game, overriding the config
//! - `CATAN_GAMES`: number of games to play (default 1)
//! - `CATAN_AGENT`: `random`, `probability` or `mixed` (default `mixed`)

use anyhow::{bail, Context};
use catan_engine::{Agent, GameConfig, GameManager, GameOutcome, ProbabilityAgent, RandomAgent};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum AgentKind {
    Random,
    Probability,
    Mixed,
}

impl AgentKind {
    fn parse(name: &str) -> anyhow::Result<Self> {
        match name {
            "random" => Ok(Self::Random),
            "probability" => Ok(Self::Probability),
            "mixed" => Ok(Self::Mixed),
            other => bail!("unknown agent kind {other:?}, expected random, probability or mixed"),
        }
    }

    fn build(self, seed: Option<u64>) -> Vec<Box<dyn Agent>> {
        (0..4u64)
            .map(|i| -> Box<dyn Agent> {
                let random = || -> Box<dyn Agent> {
                    match seed {
                        Some(seed) => Box::new(RandomAgent::with_seed(seed.wrapping_add(i))),
                        None => Box::new(RandomAgent::new()),
                    }
                };
                match self {
                    Self::Random => random(),
                    Self::Probability => Box::new(ProbabilityAgent::new()),
                    Self::Mixed if i % 2 == 0 => Box::new(ProbabilityAgent::new()),
                    Self::Mixed => random(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct GameReport {
    game: u32,
    seed: Option<u64>,
    agents: AgentKind,
    #[serde(flatten)]
    outcome: GameOutcome,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match env_var("CATAN_CONFIG") {
        Some(path) => GameConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {path}"))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = env_var("CATAN_SEED") {
        config.seed = Some(seed.parse().context("CATAN_SEED must be an integer")?);
    }
    let games: u32 = match env_var("CATAN_GAMES") {
        Some(games) => games.parse().context("CATAN_GAMES must be an integer")?,
        None => 1,
    };
    let agents = AgentKind::parse(env_var("CATAN_AGENT").as_deref().unwrap_or("mixed"))?;

    info!("Simulating {} games with {:?} agents", games, agents);

    let mut wins = [0u32; 4];
    for game in 0..games {
        let seed = config.seed.map(|seed| seed.wrapping_add(u64::from(game)));
        let game_config = GameConfig {
            seed,
            ..config.clone()
        };

        let mut manager = GameManager::new(game_config, agents.build(seed))?;
        let outcome = manager.run();
        if let Some(winner) = outcome.winner {
            wins[usize::from(winner)] += 1;
        }

        let report = GameReport {
            game,
            seed,
            agents,
            outcome,
        };
        println!("{}", serde_json::to_string(&report)?);
    }

    info!("Wins by player: {:?}", wins);
    Ok(())
}
