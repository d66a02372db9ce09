//! p2pname-daemon: CLI entry point for running a DHT node, an introduction
//! server, or an in-process demo network.

mod config;
mod demo;

use clap::{Parser, Subcommand};
use p2pname_intro::server::IntroServer;
use p2pname_node::node::DhtNode;
use tracing::info;

use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "p2pname-daemon", version, about = "Kademlia name-resolution overlay")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single DHT node, optionally joining the network through an
    /// introduction server.
    Node {
        /// Listening IP. Defaults to the config file's `network.listen_ip`.
        #[arg(long)]
        ip: Option<String>,
        /// Listening port. Defaults to the config file's `network.listen_port`.
        #[arg(long)]
        port: Option<u16>,
        /// Join the network through an introduction server at this host.
        #[arg(long)]
        join: bool,
        /// Introduction server host (used with `--join`).
        #[arg(long)]
        intro_host: Option<String>,
        /// Introduction server port (used with `--join`).
        #[arg(long)]
        intro_port: Option<u16>,
    },
    /// Run an introduction server.
    Introserver {
        /// Listening host.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Listening port.
        #[arg(long, default_value_t = 8888)]
        port: u16,
    },
    /// Run an in-process demo network: N nodes, one introduction server,
    /// and a scripted register/lookup exercise.
    Demo {
        /// Number of nodes to spin up.
        #[arg(long, default_value_t = 10)]
        nodes: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("p2pname=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = DaemonConfig::load()?;

    match cli.command {
        Command::Node {
            ip,
            port,
            join,
            intro_host,
            intro_port,
        } => {
            let ip = ip.unwrap_or(config.network.listen_ip);
            let port = port.unwrap_or(config.network.listen_port);
            let node = DhtNode::new(ip.clone(), port);

            let serve_handle = tokio::spawn({
                let node = node.clone();
                async move { node.serve().await }
            });

            if join {
                let intro_host = intro_host.unwrap_or(config.network.intro_host);
                let intro_port = intro_port.unwrap_or(config.network.intro_port);
                let join_result =
                    p2pname_intro::client::join(&intro_host, intro_port, &ip, port).await?;
                info!(virtual_ip = %join_result.virtual_ip, "joined network");
                node.bootstrap(join_result.seeds).await;
            }

            serve_handle.await??;
        }
        Command::Introserver { host, port } => {
            let server = IntroServer::new();
            info!(%host, port, "starting introduction server");
            server.serve(&host, port).await?;
        }
        Command::Demo { nodes } => {
            demo::run(nodes).await?;
        }
    }

    Ok(())
}
