//! SQLite connection helpers.
//!
//! Jobs construct their connection once at startup through
//! [`connect_sqlite`] and pass it down explicitly; nothing in this crate
//! holds a global handle.

use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query};

/// Open a SQLite connection and apply connection-wide PRAGMAs: WAL
/// journaling, foreign keys on, and a 5000ms busy timeout so concurrent
/// readers don't trip over the job.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)?;

    sql_query("PRAGMA journal_mode=WAL;").execute(&mut conn)?;
    sql_query("PRAGMA foreign_keys=ON;").execute(&mut conn)?;
    sql_query("PRAGMA busy_timeout=5000;").execute(&mut conn)?;
    Ok(conn)
}
