use clap::Parser;
use connect_manager::application::{config::Args, startup};
use tracing::error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    if let Err(error) = startup::run(args).await {
        error!("server failed: {error}");
        eprintln!("connect-manager: {error}");
        std::process::exit(1);
    }
}
