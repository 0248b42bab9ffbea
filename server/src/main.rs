use clap::Parser;
use log::{error, info};
use server::config::ControlConfig;
use server::network::Server;
use server::planner::Direction;
use shared::{
    ANGLE_GAIN, BRAKE_CLEARANCE, CART_WIDTH, DEFAULT_PORT, DEFAULT_TARGET, NUM_CARTS,
    TRACK_LIMIT,
};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Number of carts per session; must match the simulator
    #[arg(short = 'n', long, default_value_t = NUM_CARTS)]
    carts: usize,

    /// Track half-length
    #[arg(long, default_value_t = TRACK_LIMIT)]
    track_limit: f64,

    #[arg(long, default_value_t = CART_WIDTH)]
    cart_width: f64,

    /// Clearance added to the cart width when braking for an obstacle
    #[arg(long, default_value_t = BRAKE_CLEARANCE)]
    brake_clearance: f64,

    /// Force per radian of pole angle
    #[arg(long, default_value_t = ANGLE_GAIN)]
    angle_gain: f64,

    /// Target position for carts other than the leader
    #[arg(long, default_value_t = DEFAULT_TARGET)]
    default_target: f64,

    /// Travel direction assumed for the leader cart
    #[arg(long, value_enum, default_value_t = Direction::Right)]
    leader_direction: Direction,

    /// Close a session after this many milliseconds without a frame
    #[arg(long)]
    idle_timeout_ms: Option<u64>,
}

impl Args {
    fn control_config(&self) -> ControlConfig {
        ControlConfig {
            carts: self.carts,
            track_limit: self.track_limit,
            cart_width: self.cart_width,
            brake_clearance: self.brake_clearance,
            angle_gain: self.angle_gain,
            default_target: self.default_target,
            leader: 0,
            leader_direction: self.leader_direction,
            idle_timeout: self.idle_timeout_ms.map(Duration::from_millis),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for connection logs, RUST_LOG=debug for per-tick readings");
    }

    let args = Args::parse();

    let config = args.control_config();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(2);
    }

    let address = format!("{}:{}", args.host, args.port);
    let server = match Server::bind(&address, config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Unable to set up port {}: {}", address, e);
            std::process::exit(1);
        }
    };

    info!(
        "{} carts, track limit {}, leader heading {:?}",
        args.carts, args.track_limit, args.leader_direction
    );

    server
        .run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, shutting down"),
                Err(e) => {
                    error!("Unable to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await
                }
            }
        })
        .await;

    Ok(())
}
