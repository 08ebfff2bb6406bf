//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `accounts` - Account operations
//! - `transactions` - Transaction CRUD and occurrence grouping
//! - `patterns` - Detected recurring patterns and their review lifecycle
//! - `price_events` - Append-only price-change event log
//! - `alerts` - Alert creation and review
//! - `feedback` - Prediction feedback capture

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod accounts;
mod alerts;
mod feedback;
mod patterns;
mod price_events;
mod transactions;

pub use patterns::PatternUpsert;
pub use transactions::TransactionInsertResult;

// Connection-level write operations, so the detection pipeline can group a
// series' pattern, price-event, and alert writes in one transaction.
pub(crate) use alerts::create_alert;
pub(crate) use patterns::upsert_detected_pattern;
pub(crate) use price_events::{insert_price_event, latest_price_event_date};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "CADENCE_DB_KEY";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path. This allows moving/renaming/restoring the database freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Fixed application salt - changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"cadence-salt-v01";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    // Extract the hash portion for use as SQLCipher key (hex encoded)
    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `CADENCE_DB_KEY` environment variable to be set.
    /// The database will be encrypted using SQLCipher with a key derived
    /// from the passphrase via Argon2.
    ///
    /// Returns an error if `CADENCE_DB_KEY` is not set. Use `new_unencrypted()`
    /// for development/testing without encryption.
    pub fn new(path: &str) -> Result<Self> {
        let encryption_key = std::env::var(DB_KEY_ENV).ok();
        match encryption_key {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended for production).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    ///
    /// WARNING: This creates an unencrypted database. Only use for development
    /// or testing. For production, use `new()` with `CADENCE_DB_KEY` set.
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Use with_init to set the key on every new connection
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                Ok(())
            });

            Pool::builder().max_size(10).build(manager)?
        } else {
            Pool::builder().max_size(10).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an in-memory database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because SQLCipher
    /// has issues with in-memory databases in the connection pool.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!("/tmp/cadence_test_{}_{}.db", std::process::id(), id);

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Check if the database is encrypted
    pub fn is_encrypted(&self) -> Result<bool> {
        let conn = self.conn()?;
        // SQLCipher sets cipher_version if encryption is active
        let result: rusqlite::Result<String> =
            conn.query_row("PRAGMA cipher_version;", [], |row| row.get(0));
        Ok(result.is_ok() && std::env::var(DB_KEY_ENV).is_ok())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            -- Note: creates -wal and -shm sidecar files alongside the database
            PRAGMA journal_mode = WAL;

            -- Cache size: ~8MB (2000 pages * 4KB default page size)
            PRAGMA cache_size = 2000;

            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- Accounts
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Transactions
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                account_id INTEGER REFERENCES accounts(id),
                date DATE NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                merchant_normalized TEXT,
                import_hash TEXT UNIQUE,
                archived BOOLEAN DEFAULT 0,                -- hidden from detection/lists
                is_transfer BOOLEAN DEFAULT 0,             -- internal movement, never recurring spend
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_merchant ON transactions(merchant_normalized);
            CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_archived ON transactions(archived);

            -- Detected recurring patterns
            CREATE TABLE IF NOT EXISTS detected_patterns (
                id INTEGER PRIMARY KEY,
                merchant TEXT NOT NULL,
                account_id INTEGER REFERENCES accounts(id),
                pattern_type TEXT NOT NULL,                -- frequency name, or recurring_merchant
                confidence_score REAL NOT NULL,
                interval_days REAL,
                amount_min REAL,
                amount_max REAL,
                amount_avg REAL,
                occurrence_count INTEGER NOT NULL,
                typical_day_of_month INTEGER,
                typical_weekday INTEGER,                   -- 0 = Sunday .. 6 = Saturday
                first_occurrence DATE,
                last_occurrence DATE,
                next_expected DATE,
                status TEXT DEFAULT 'pending',             -- pending, accepted, rejected, expired
                resolved_at DATETIME,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_patterns_merchant ON detected_patterns(merchant);
            CREATE INDEX IF NOT EXISTS idx_patterns_status ON detected_patterns(status);
            CREATE INDEX IF NOT EXISTS idx_patterns_account ON detected_patterns(account_id);
            CREATE INDEX IF NOT EXISTS idx_patterns_next_expected ON detected_patterns(next_expected);

            -- At most one live pending suggestion per series key, enforced
            -- at the schema boundary rather than only by the upsert
            CREATE UNIQUE INDEX IF NOT EXISTS idx_patterns_pending_key
                ON detected_patterns(merchant, account_id, pattern_type)
                WHERE status = 'pending';

            -- Price change events (append-only)
            CREATE TABLE IF NOT EXISTS price_change_events (
                id INTEGER PRIMARY KEY,
                merchant TEXT NOT NULL,
                account_id INTEGER REFERENCES accounts(id),
                pattern_id INTEGER REFERENCES detected_patterns(id),
                previous_amount REAL NOT NULL,
                new_amount REAL NOT NULL,
                effective_date DATE NOT NULL,
                change_type TEXT NOT NULL,                 -- increase, decrease
                change_percentage REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_price_events_merchant ON price_change_events(merchant);
            CREATE INDEX IF NOT EXISTS idx_price_events_pattern ON price_change_events(pattern_id);
            CREATE INDEX IF NOT EXISTS idx_price_events_date ON price_change_events(effective_date);

            -- Alerts
            CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY,
                kind TEXT NOT NULL,                        -- new_pattern, price_change
                pattern_id INTEGER REFERENCES detected_patterns(id),
                price_event_id INTEGER REFERENCES price_change_events(id),
                message TEXT,
                status TEXT DEFAULT 'new',                 -- new, dismissed, actioned
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                resolved_at DATETIME
            );

            CREATE INDEX IF NOT EXISTS idx_alerts_kind ON alerts(kind);
            CREATE INDEX IF NOT EXISTS idx_alerts_status ON alerts(status);

            -- Prediction feedback (user corrections against predicted occurrences)
            CREATE TABLE IF NOT EXISTS prediction_feedback (
                id INTEGER PRIMARY KEY,
                pattern_id INTEGER NOT NULL REFERENCES detected_patterns(id),
                original_date DATE NOT NULL,
                original_amount REAL,
                original_confidence REAL,
                corrected_date DATE,
                corrected_amount REAL,
                was_accurate BOOLEAN NOT NULL,
                rating INTEGER,                            -- optional 1-5 usefulness rating
                note TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                resolved_at DATETIME
            );

            CREATE INDEX IF NOT EXISTS idx_feedback_pattern ON prediction_feedback(pattern_id);
            CREATE INDEX IF NOT EXISTS idx_feedback_created ON prediction_feedback(created_at);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
