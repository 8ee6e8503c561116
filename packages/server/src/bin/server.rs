//! Hiroba chat relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 127.0.0.1 --port 3001 --cors-origin http://localhost:3000
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use hiroba_server::{
    config::{DEFAULT_HEARTBEAT_SECS, DEFAULT_PORT, ServerConfig},
    domain::{ChatSession, DEFAULT_HISTORY_CAPACITY},
    infrastructure::publisher::WebSocketEventPublisher,
    ui::Server,
    usecase::SessionBroker,
};
use hiroba_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Real-time chat relay with live presence", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Allowed CORS origin (repeatable or comma separated; empty or "*" allows any)
    #[arg(long = "cors-origin", env = "CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Number of messages replayed to joiners (values below 1 are treated as 1)
    #[arg(long, env = "HISTORY_CAPACITY", default_value_t = DEFAULT_HISTORY_CAPACITY)]
    history_capacity: usize,

    /// Seconds between heartbeat log lines (0 disables the heartbeat)
    #[arg(long, env = "HEARTBEAT_SECS", default_value_t = DEFAULT_HEARTBEAT_SECS)]
    heartbeat_secs: u64,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            cors_origins: self.cors_origins,
            history_capacity: self.history_capacity,
            heartbeat_interval: (self.heartbeat_secs > 0)
                .then(|| Duration::from_secs(self.heartbeat_secs)),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = args.into_config();

    // Initialize dependencies in order:
    // 1. EventPublisher
    // 2. ChatSession
    // 3. SessionBroker
    // 4. Server
    let publisher = Arc::new(WebSocketEventPublisher::new());
    let session = ChatSession::new(config.history_capacity, Arc::new(SystemClock));
    let broker = Arc::new(SessionBroker::new(session, publisher));

    let server = Server::new(broker, config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
