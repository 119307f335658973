use padlock_sdk::Client;

pub async fn handle_status(sdk: &Client) {
    match sdk.status.alive().await {
        Ok(status) => println!("alive: {status}"),
        Err(e) => println!("alive: error: {e}"),
    }
    match sdk.status.ready().await {
        Ok(status) => println!("ready: {status}"),
        Err(e) => println!("ready: error: {e}"),
    }
}
