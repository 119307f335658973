use rust_embed::RustEmbed;
use sqlx::SqlitePool;

use crate::error::{Error, ErrorType};

#[derive(RustEmbed)]
#[folder = "migrations/"]
pub(crate) struct Migrations;

/// Apply the embedded migration scripts in filename order. One statement per
/// file.
pub(crate) async fn migrate(pool: &SqlitePool) -> Result<(), Error> {
    let mut filenames = Migrations::iter().collect::<Vec<_>>();
    filenames.sort();

    for filename in filenames {
        let file = Migrations::get(&filename).ok_or_else(|| {
            ErrorType::InternalError(anyhow::anyhow!("missing migration script `{filename}`"))
        })?;
        let script = String::from_utf8(file.data.into_owned()).map_err(|_| {
            ErrorType::InternalError(anyhow::anyhow!(
                "migration script `{filename}` is not valid utf-8"
            ))
        })?;
        sqlx::query(&script).execute(pool).await?;
    }
    Ok(())
}
