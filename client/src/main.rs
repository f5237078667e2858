use clap::Parser;
use client::network::{Client, ExitReason};
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8888")]
    server: String,

    /// Display name to log in with
    #[arg(short = 'n', long)]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to {} as {:?}", args.server, args.name);
    info!("Type a line and press Enter to send it, Ctrl+D to leave");

    let client = Client::connect(&args.server, &args.name).await?;

    match client.run().await? {
        ExitReason::NameTaken => std::process::exit(1),
        ExitReason::ServerClosed | ExitReason::InputClosed => {}
    }

    Ok(())
}
