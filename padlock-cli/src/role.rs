use clap::{Args, Subcommand};
use padlock_sdk::Client;

use crate::handle_resp;

#[derive(Args, Debug)]
pub struct Role {
    #[command(subcommand)]
    command: RoleCommands,
}

#[derive(Subcommand, Debug)]
enum RoleCommands {
    #[command(about = "list configured roles")]
    List,
    #[command(about = "show one role")]
    Get { name: String },
}

impl Role {
    pub async fn handle(self, sdk: &Client) {
        match self.command {
            RoleCommands::List => handle_resp(sdk.role.list().await),
            RoleCommands::Get { name } => handle_resp(sdk.role.get(&name).await),
        }
    }
}
