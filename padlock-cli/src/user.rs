use clap::{Args, Subcommand};
use padlock_sdk::user::{CreateUserParams, SetUserRolesParams, UpdateUserParams, UserConfig};
use padlock_sdk::Client;

use crate::handle_resp;

#[derive(Args, Debug)]
pub struct User {
    #[command(subcommand)]
    command: UserCommands,
}

#[derive(Subcommand, Debug)]
enum UserCommands {
    #[command(about = "list users, optionally only those bound to a role")]
    List {
        #[arg(long)]
        role: Option<String>,
    },
    #[command(about = "show one user with its effective permissions")]
    Get { user_id: String },
    #[command(about = "create a user")]
    Create {
        user_id: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        role: Vec<String>,
    },
    #[command(about = "update a user's identity fields")]
    Update {
        user_id: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    #[command(about = "delete a user")]
    Delete { user_id: String },
    #[command(about = "replace a user's roles")]
    SetRoles {
        user_id: String,
        role: Vec<String>,
    },
}

impl User {
    pub async fn handle(self, sdk: &Client) {
        match self.command {
            UserCommands::List { role } => match role {
                Some(role) => handle_resp(sdk.user.list_by_role(&role).await),
                None => handle_resp(sdk.user.list().await),
            },
            UserCommands::Get { user_id } => handle_resp(sdk.user.get(&user_id).await),
            UserCommands::Create {
                user_id,
                username,
                email,
                first_name,
                last_name,
                role,
            } => {
                let params = CreateUserParams {
                    user: UserConfig {
                        user_id,
                        username,
                        email,
                        first_name,
                        last_name,
                    },
                    roles: role.into_iter().collect(),
                };
                handle_resp(sdk.user.create(&params).await);
            }
            UserCommands::Update {
                user_id,
                username,
                email,
                first_name,
                last_name,
            } => {
                let params = UpdateUserParams {
                    user: UserConfig {
                        user_id: user_id.clone(),
                        username,
                        email,
                        first_name,
                        last_name,
                    },
                };
                handle_resp(sdk.user.update(&user_id, &params).await);
            }
            UserCommands::Delete { user_id } => handle_resp(sdk.user.delete(&user_id).await),
            UserCommands::SetRoles { user_id, role } => {
                let params = SetUserRolesParams {
                    roles: role.into_iter().collect(),
                };
                handle_resp(sdk.user.set_roles(&user_id, &params).await);
            }
        }
    }
}
