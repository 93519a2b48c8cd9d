#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use crm_client::contact::Contact;
use crm_client::directory::{ContactDirectory, errors::DirectoryError};
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use lead_sync::db::{connection, migrate};
use lead_sync::models::referral::{NewAmbassador, NewLead};
use lead_sync::schema::{ambassadors, leads};
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}
#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    n: i64,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_sqlite(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    diesel::sql_query(format!("SELECT COUNT(*) AS n FROM {table}"))
        .get_result::<CountRow>(conn)
        .expect("count")
        .n
}

pub fn seed_ambassador(conn: &mut SqliteConnection, name: &str, code: &str) -> i32 {
    diesel::insert_into(ambassadors::table)
        .values(&NewAmbassador {
            full_name: name,
            referral_code: code,
        })
        .returning(ambassadors::id)
        .get_result(conn)
        .expect("seed ambassador")
}

pub fn seed_lead(
    conn: &mut SqliteConnection,
    ambassador_id: Option<i32>,
    name: &str,
    phone: Option<&str>,
    whatsapp: Option<&str>,
    status: Option<&str>,
) -> i32 {
    diesel::insert_into(leads::table)
        .values(&NewLead {
            ambassador_id,
            full_name: name,
            phone,
            whatsapp_number: whatsapp,
            status,
        })
        .returning(leads::id)
        .get_result(conn)
        .expect("seed lead")
}

pub fn soft_delete_lead(conn: &mut SqliteConnection, lead_id: i32) {
    diesel::update(leads::table.filter(leads::id.eq(lead_id)))
        .set(leads::deleted_at.eq("2025-08-01T00:00:00Z"))
        .execute(conn)
        .expect("soft delete");
}

pub fn lead_status(conn: &mut SqliteConnection, lead_id: i32) -> Option<String> {
    leads::table
        .filter(leads::id.eq(lead_id))
        .select(leads::status)
        .first(conn)
        .expect("lead status")
}

/// In-memory CRM stand-in, keyed by canonical phone number.
#[derive(Default)]
pub struct FakeDirectory {
    contacts: HashMap<String, Contact>,
    failing: HashSet<String>,
    exhausted: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contact(mut self, phone: &str, lifecycle: &str) -> Self {
        self.contacts.insert(
            phone.to_string(),
            Contact {
                phone: Some(phone.to_string()),
                lifecycle: Some(lifecycle.to_string()),
            },
        );
        self
    }

    /// Lookups for this phone fail with a backend error.
    pub fn with_failure(mut self, phone: &str) -> Self {
        self.failing.insert(phone.to_string());
        self
    }

    /// Lookups for this phone exhaust the 429 retry budget.
    pub fn with_exhaustion(mut self, phone: &str) -> Self {
        self.exhausted.insert(phone.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl ContactDirectory for FakeDirectory {
    async fn contact_by_phone(&self, phone: &str) -> Result<Option<Contact>, DirectoryError> {
        self.calls.lock().expect("calls lock").push(phone.to_string());
        if self.failing.contains(phone) {
            return Err(DirectoryError::Api("injected backend failure".into()));
        }
        if self.exhausted.contains(phone) {
            return Err(DirectoryError::RateLimitExhausted { attempts: 5 });
        }
        Ok(self.contacts.get(phone).cloned())
    }
}
