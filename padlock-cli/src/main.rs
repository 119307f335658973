//! Padlock command-line interface

mod role;
mod server;
mod status;
mod user;

use clap::{Parser, Subcommand};
use padlock_sdk::Client;
use role::Role;
use serde::Serialize;
use server::Server;
use status::handle_status;
use user::User;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(
        long,
        env = "PADLOCK_ADMIN_ADDR",
        default_value = "http://127.0.0.1:8080/v1"
    )]
    admin_addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "check liveness and readiness of the admin service")]
    Status,
    #[command(about = "start a Padlock sidecar")]
    Server(Server),
    #[command(about = "manage users")]
    User(User),
    #[command(about = "inspect configured roles")]
    Role(Role),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let sdk = Client::new(cli.admin_addr.clone());

    match cli.command {
        Commands::Status => handle_status(&sdk).await,
        Commands::Server(server) => server.handle().await,
        Commands::User(user) => user.handle(&sdk).await,
        Commands::Role(role) => role.handle(&sdk).await,
    }
}

pub(crate) fn handle_resp<T: Serialize>(resp: Result<T, String>) {
    match resp {
        Ok(resp) => {
            let resp = serde_json::to_string_pretty(&resp).unwrap();
            println!("{resp}");
        }
        Err(e) => {
            println!("Error: {e}");
        }
    }
}
