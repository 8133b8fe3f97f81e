use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use othello_net::{
    ConsoleInput, HostEngine, JoinerEngine, MoveSource, NetworkConfig, OpenBoard,
    ReceiverEngine, Session,
};
use protocol::Color;

#[derive(Parser)]
#[command(name = "othello-net", about = "Two-player networked Othello over TCP")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Wait for an opponent and play black
    Host {
        /// Port to listen on
        port: Option<u16>,
    },
    /// Connect to a host
    Join {
        /// Host address
        addr: String,
        /// Host port
        port: Option<u16>,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("othello_net=info".parse()?)
                .add_directive("protocol=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match cli.config {
        Some(path) => NetworkConfig::load(path)?,
        None => NetworkConfig::load_or_default()?,
    };

    let input = Box::new(ConsoleInput);
    let (local, session): (Box<dyn MoveSource>, Arc<Session>) = match cli.command {
        Command::Host { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            let engine = HostEngine::start(&config, input).context("无法建立主机")?;
            let session = engine.session();
            (Box::new(engine) as Box<dyn MoveSource>, session)
        }
        Command::Join { addr, port } => {
            config.server_host = addr;
            if let Some(port) = port {
                config.port = port;
            }
            let engine = JoinerEngine::start(&config, input).context("无法连接主机")?;
            let session = engine.session();
            (Box::new(engine) as Box<dyn MoveSource>, session)
        }
    };

    let remote: Box<dyn MoveSource> = Box::new(ReceiverEngine::new(Arc::clone(&session)));
    let (mut black, mut white) = match session.local_color() {
        Color::Black => (local, remote),
        Color::White => (remote, local),
    };

    let mut board = OpenBoard::new();
    let mut color = Color::FIRST;
    let outcome = loop {
        if board.is_full() {
            break "board full".to_string();
        }

        let engine = match color {
            Color::Black => &mut black,
            Color::White => &mut white,
        };

        match engine.get_move(&board, color) {
            Ok(mv) => {
                if board.place(mv, color) {
                    info!(%mv, %color, "move played");
                } else {
                    warn!(%mv, %color, "move rejected by board");
                }
                color = color.opponent();
            }
            Err(e) => {
                // 等待以超时结束时，区分是否其实是连接已断开
                let e = session.ensure_connected().err().unwrap_or(e);
                warn!(error = %e, "game interrupted");
                break e.to_string();
            }
        }
    };

    let summary = format!(
        "{}: black {}, white {}",
        outcome,
        board.count(Color::Black),
        board.count(Color::White)
    );
    info!("{}", summary);
    session.send_game_over(summary);
    session.close();

    Ok(())
}
