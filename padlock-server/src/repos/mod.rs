use sqlx::SqlitePool;

use self::user::UserRepo;

pub mod user;

#[derive(Clone)]
pub struct Repos {
    pub user: UserRepo,
    pub pool: SqlitePool,
}

impl Repos {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            user: UserRepo::new(pool.clone()),
            pool,
        }
    }

    /// Readiness probe against the store.
    pub async fn ping(&self) -> Result<(), crate::error::Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(Into::into)
    }
}
