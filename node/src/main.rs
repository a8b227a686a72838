use anyhow::Context;
use clap::Parser;
use commonware_runtime::{tokio, Metrics, Runner, Spawner};
use stakepot_node::{
    console::{execute, Command, HELP},
    lottery, Config, Loaded,
};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs stake-weighted lottery rounds.", long_about = None)]
struct Args {
    /// Path to the YAML config (created with defaults when missing)
    #[arg(short, long, default_value = "stakepot.yaml")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Load config
    let loaded = Config::load(&args.config)
        .with_context(|| format!("could not load {}", args.config.display()))?;
    let fallback = match &loaded {
        Loaded::Fallback(_, err) => Some(err.to_string()),
        _ => None,
    };
    let created = matches!(loaded, Loaded::Created(_));
    let config = loaded
        .into_config()
        .validate()
        .context("invalid config")?;

    // Initialize runtime
    let cfg = tokio::Config::default()
        .with_worker_threads(config.worker_threads)
        .with_catch_panics(true);
    let executor = tokio::Runner::new(cfg);

    // Start runtime
    executor.start(|context| async move {
        // Configure telemetry
        tokio::telemetry::init(
            context.with_label("telemetry"),
            tokio::telemetry::Logging {
                level: config.log_level,
                json: config.json_logs,
            },
            Some(SocketAddr::new(
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                config.metrics_port,
            )),
            None,
        );
        if created {
            info!(path = %args.config.display(), "wrote default config");
        }
        if let Some(err) = fallback {
            warn!(path = %args.config.display(), error = %err, "invalid config file, using defaults");
        }
        info!(
            countdown = config.round.countdown,
            auto_start = ?config.round.auto_start_interval,
            resource = %config.round.resource,
            broadcast_to_all = config.round.broadcast_to_all,
            "loaded config"
        );

        // Start lottery
        let resource = config.round.resource.clone();
        let (actor, mut mailbox) = lottery::Actor::new(
            context.with_label("lottery"),
            lottery::Config {
                round: config.round,
                starting_balance: config.starting_balance,
                mailbox_size: config.mailbox_size,
            },
        );
        actor.start();

        // Read commands until the console closes
        let console = context
            .with_label("console")
            .spawn(move |_| async move {
                use ::tokio::io::{AsyncBufReadExt, BufReader};

                println!("{HELP}");
                let mut lines = BufReader::new(::tokio::io::stdin()).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let command = match Command::parse(&line) {
                        Ok(command) => command,
                        Err(err) => {
                            println!("{err}");
                            continue;
                        }
                    };
                    match execute(&mut mailbox, command, &resource).await {
                        Ok(Some(reply)) => println!("{reply}"),
                        Ok(None) => return,
                        Err(err) => {
                            error!(?err, "lottery unavailable");
                            return;
                        }
                    }
                }

                // Stdin closed without a quit command
                if let Err(err) = mailbox.shutdown().await {
                    warn!(?err, "failed to stop lottery");
                }
            });

        if let Err(e) = console.await {
            error!(?e, "console failed");
        }
    });

    Ok(())
}
