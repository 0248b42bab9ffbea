mod script;

use clap::Parser;
use client::network::ControlClient;
use log::{error, info};
use script::Script;
use shared::{DEFAULT_PORT, NUM_CARTS};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Streams scripted sensor frames to a control server and logs the forces it
/// returns.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Control server address
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Number of carts; must match the server
    #[arg(short = 'n', long, default_value_t = NUM_CARTS)]
    carts: usize,

    /// Cart positions, comma separated, one per cart
    #[arg(short = 'p', long, value_delimiter = ',', allow_negative_numbers = true, default_values_t = [0.0, 2.0])]
    positions: Vec<f64>,

    /// Number of frames to send
    #[arg(short = 't', long, default_value_t = 10)]
    ticks: u32,

    /// Milliseconds between frames
    #[arg(short = 'i', long, default_value_t = 20)]
    interval_ms: u64,

    /// Largest random pole angle, in radians, added to each frame
    #[arg(short = 'j', long, default_value_t = 0.0)]
    jitter: f64,

    /// Informational string to send before the first frame
    #[arg(short = 'm', long)]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let script = match Script::new(args.positions.clone(), args.carts, args.jitter) {
        Ok(script) => script,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    let mut client = ControlClient::connect(&args.server, args.carts).await?;

    if let Some(message) = &args.message {
        client.send_text(message).await?;
    }

    let mut ticker = interval(Duration::from_millis(args.interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut rng = rand::thread_rng();

    for tick in 1..=args.ticks {
        ticker.tick().await;

        let frame = script.frame(&mut rng);
        match client.exchange(&frame).await {
            Ok(actions) => info!("tick {}: forces {:?}", tick, actions.forces()),
            Err(e) => {
                error!("tick {}: {}", tick, e);
                return Err(e.into());
            }
        }
    }

    let acknowledged = client.close().await?;
    info!("Server acknowledged bye: {}", acknowledged);

    Ok(())
}
