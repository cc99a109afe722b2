use clap::Parser;
use client::controller::{ControllerObserver, GameController};
use client::input::InputManager;
use client::network::Client;
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:11000")]
    server: String,

    /// Display name for the snake
    #[arg(short = 'n', long, default_value = "bot")]
    name: String,

    /// Stop after this many updates
    #[arg(short = 't', long)]
    ticks: Option<u64>,

    /// Ticks between random turns
    #[arg(long, default_value = "40")]
    turn_every: u32,
}

struct LogObserver;

impl ControllerObserver for LogObserver {
    fn connected(&self) {
        info!("Connected, joining");
    }

    fn dimensions_received(&self, size: u32) {
        info!("World is {} x {}", size, size);
    }

    fn player_connected(&self, name: &str) {
        info!("{} joined", name);
    }

    fn player_disconnected(&self, name: &str) {
        info!("{} left", name);
    }

    fn network_error(&self, message: &str) {
        warn!("Network error: {}", message);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("Connecting to {} as {}", args.server, args.name);

    let mut controller = GameController::new();
    controller.add_observer(Box::new(LogObserver));

    let mut client = Client::connect(&args.server, &args.name, controller).await?;
    let mut input = InputManager::new(args.turn_every);
    let mut last_score = 0;

    loop {
        client.poll().await?;

        let controller = client.controller();
        if let Some(limit) = args.ticks {
            if controller.updates() >= limit {
                info!("Stopping after {} updates", controller.updates());
                break;
            }
        }

        let key = match (controller.world(), controller.player_snake()) {
            (Some(world), Some(me)) => {
                if me.score != last_score {
                    info!("Score {} -> {}", last_score, me.score);
                    last_score = me.score;
                }
                input.decide(world, me)
            }
            _ => None,
        };

        if let Some(key) = key {
            client.send_key(key).await?;
        }
    }

    Ok(())
}
