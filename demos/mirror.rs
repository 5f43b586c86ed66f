use std::{path::PathBuf, time::Duration};

use task_lifecycle::{global, is_signaled, TaskResult};
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG_PATH: &str = "/etc/apt/mirror.toml";

struct Mirror {
    name: String,
    rounds: u32,
}

impl Mirror {
    async fn run(self, token: CancellationToken) -> TaskResult {
        for round in 1..=self.rounds {
            tokio::select! {
                _ = token.cancelled() => {
                    println!("{}: cancelled during round {round}", self.name);
                    return Ok(());
                }
                _ = tokio::time::sleep(Duration::from_millis(500)) => {
                    println!("{}: round {round} synced", self.name);
                }
            }
        }
        if self.name == "broken" {
            anyhow::bail!("{}: upstream returned an invalid Release file", self.name);
        }
        Ok(())
    }
}

/// `-f CONFIG` selects the configuration file, the remaining arguments
/// name the mirrors to sync.
fn parse_args(mut args: impl Iterator<Item = String>) -> Option<(PathBuf, Vec<String>)> {
    let mut config = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut mirrors = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "-f" {
            config = PathBuf::from(args.next()?);
        } else {
            mirrors.push(arg);
        }
    }
    if mirrors.is_empty() {
        return None;
    }
    Some((config, mirrors))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    global::init();

    let (config, mirrors) = match parse_args(std::env::args().skip(1)) {
        Some(parsed) => parsed,
        None => {
            eprintln!("usage: mirror [-f CONFIG] MIRROR...");
            std::process::exit(2);
        }
    };
    // The configuration is only named here; mirroring itself is simulated.
    println!("configuration file: {}", config.display());

    for name in mirrors {
        let mirror = Mirror { name, rounds: 5 };
        global::go(move |token| mirror.run(token));
    }
    global::stop();

    match global::wait().await {
        Ok(()) => println!("all mirrors synced"),
        Err(err) if is_signaled(&err) => println!("interrupted"),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
