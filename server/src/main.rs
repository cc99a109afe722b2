use clap::Parser;
use log::{error, info};
use server::game::{GameLoop, LogObserver};
use server::network::NetworkServer;
use server::settings::GameSettings;
use server::world::WorldStore;
use shared::DEFAULT_PORT;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Path to the JSON game settings
    #[clap(short, long, default_value = "settings.json")]
    settings: String,
    /// Maximum number of concurrent players
    #[clap(short, long, default_value = "64")]
    max_clients: usize,
}

/// Loads the settings, then runs the network server and the game loop until
/// either stops or Ctrl+C arrives.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let settings = GameSettings::load(&args.settings).map_err(|e| {
        error!("Could not load {}: {}", args.settings, e);
        e
    })?;
    info!(
        "Loaded {}: world {}, {} walls, {} ms per frame",
        args.settings,
        settings.universe_size,
        settings.walls.len(),
        settings.ms_per_frame
    );

    let world = Arc::new(WorldStore::new(Arc::new(settings)));
    let (cmd_sender, cmd_receiver) = mpsc::unbounded_channel();

    let mut game = GameLoop::new(world, args.max_clients, cmd_receiver);
    game.add_observer(Box::new(LogObserver));

    let address = format!("{}:{}", args.host, args.port);
    let network = NetworkServer::bind(&address).await?;

    let server_handle = tokio::spawn(network.run(cmd_sender));
    let game_handle = tokio::spawn(game.run());

    tokio::select! {
        result = server_handle => {
            if let Err(e) = result {
                error!("Network task panicked: {}", e);
            }
        }
        result = game_handle => {
            if let Err(e) = result {
                error!("Game loop task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
