use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};
use tracing::{debug, info};

use crate::db::PriceSink;
use crate::models::{Item, PriceSide};

/// SQLite store holding the latest price per item
pub struct ItemStore {
    pool: Pool<Sqlite>,
}

impl ItemStore {
    /// Create a new item store and initialize the database
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create data directory if needed
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .context("Failed to create database directory")?;
                }
            }
        }

        let in_memory = database_url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every in-memory connection is its own database, so the single
        // connection must never be reaped
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("Item store initialized");
        Ok(store)
    }

    /// Initialize database schema. Safe to run against an existing database.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                sell_side_price REAL NOT NULL DEFAULT 0,
                buy_side_price REAL NOT NULL DEFAULT 0,
                last_updated TEXT NOT NULL,
                sample_count INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create items table")?;

        // Databases created before sample_count existed
        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('items')")
                .fetch_all(&self.pool)
                .await
                .context("Failed to inspect items table")?;

        if !columns.iter().any(|c| c == "sample_count") {
            sqlx::query("ALTER TABLE items ADD COLUMN sample_count INTEGER NOT NULL DEFAULT 1")
                .execute(&self.pool)
                .await
                .context("Failed to add sample_count column")?;
            info!("Added sample_count column to items table");
        }

        Ok(())
    }

    /// Write one price observation in a single statement. Returns `true`
    /// if this write created the row.
    pub async fn upsert_price(&self, name: &str, price: f64, side: PriceSide) -> Result<bool> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let sql = match side {
            PriceSide::Sell => {
                r#"
                INSERT INTO items (name, sell_side_price, last_updated) VALUES (?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    sell_side_price = excluded.sell_side_price,
                    last_updated = excluded.last_updated,
                    sample_count = sample_count + 1
                RETURNING sample_count
                "#
            }
            PriceSide::Buy => {
                r#"
                INSERT INTO items (name, buy_side_price, last_updated) VALUES (?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    buy_side_price = excluded.buy_side_price,
                    last_updated = excluded.last_updated,
                    sample_count = sample_count + 1
                RETURNING sample_count
                "#
            }
        };

        let sample_count: i64 = sqlx::query_scalar(sql)
            .bind(name)
            .bind(price)
            .bind(&now)
            .fetch_one(&self.pool)
            .await
            .context("Failed to upsert item price")?;

        let created = sample_count == 1;
        if created {
            debug!("New item added: {} ({} {:.2})", name, side.as_str(), price);
        } else {
            debug!("Price updated: {} ({} {:.2})", name, side.as_str(), price);
        }

        Ok(created)
    }

    /// Get every stored item
    pub async fn get_all_items(&self) -> Result<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!("{} ORDER BY name", SELECT_ITEMS))
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch items")?;

        rows.into_iter().map(Item::try_from).collect()
    }

    /// Get a single item by name
    pub async fn get_item(&self, name: &str) -> Result<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("{} WHERE name = ?", SELECT_ITEMS))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch item")?;

        row.map(Item::try_from).transpose()
    }

    /// Get count of items
    pub async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count items")?;

        Ok(row.0)
    }
}

#[async_trait]
impl PriceSink for ItemStore {
    async fn upsert(&self, item_name: &str, price: f64, side: PriceSide) -> Result<()> {
        self.upsert_price(item_name, price, side).await.map(|_| ())
    }
}

const SELECT_ITEMS: &str =
    "SELECT id, name, sell_side_price, buy_side_price, last_updated FROM items";

/// Database row representation
#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    sell_side_price: f64,
    buy_side_price: f64,
    last_updated: String,
}

impl TryFrom<ItemRow> for Item {
    type Error = anyhow::Error;

    fn try_from(row: ItemRow) -> Result<Self> {
        let last_updated = DateTime::parse_from_rfc3339(&row.last_updated)
            .with_context(|| {
                format!(
                    "Invalid last_updated {:?} for item {}",
                    row.last_updated, row.name
                )
            })?
            .with_timezone(&Utc);

        Ok(Item {
            id: Some(row.id),
            name: row.name,
            sell_side_price: row.sell_side_price,
            buy_side_price: row.buy_side_price,
            last_updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    async fn memory_store() -> ItemStore {
        ItemStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let store = memory_store().await;
        store.upsert_price("AWP | Asiimov (Field-Tested)", 120.0, PriceSide::Buy).await.unwrap();

        store.init_schema().await.unwrap();
        store.init_schema().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let store = memory_store().await;
        let name = "AK-47 | Redline (Field-Tested)";

        assert!(store.upsert_price(name, 12.5, PriceSide::Buy).await.unwrap());
        assert!(!store.upsert_price(name, 16.0, PriceSide::Sell).await.unwrap());

        let item = store.get_item(name).await.unwrap().unwrap();
        assert_eq!(item.buy_side_price, 12.5);
        assert_eq!(item.sell_side_price, 16.0);
    }

    #[tokio::test]
    async fn test_new_row_defaults_other_side_to_zero() {
        let store = memory_store().await;
        store.upsert_price("Sticker | Crown (Foil)", 800.0, PriceSide::Sell).await.unwrap();

        let item = store.get_item("Sticker | Crown (Foil)").await.unwrap().unwrap();
        assert_eq!(item.sell_side_price, 800.0);
        assert_eq!(item.buy_side_price, 0.0);
        assert!(!item.has_both_prices());
    }

    #[tokio::test]
    async fn test_repeated_upsert_keeps_single_row() {
        let store = memory_store().await;
        let name = "M4A4 | Howl (Minimal Wear)";

        store.upsert(name, 4200.0, PriceSide::Sell).await.unwrap();
        let first = store.get_item(name).await.unwrap().unwrap();

        store.upsert(name, 4200.0, PriceSide::Sell).await.unwrap();
        let second = store.get_item(name).await.unwrap().unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(second.sell_side_price, 4200.0);
        assert!(second.last_updated >= first.last_updated);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_for_different_items() {
        let store = Arc::new(memory_store().await);

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let name = format!("Item {}", i);
                store.upsert(&name, i as f64 + 1.0, PriceSide::Sell).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let items = store.get_all_items().await.unwrap();
        assert_eq!(items.len(), 20);
        for item in items {
            let i: f64 = item.name.trim_start_matches("Item ").parse().unwrap();
            assert_eq!(item.sell_side_price, i + 1.0);
        }
    }

    #[tokio::test]
    async fn test_concurrent_creators_report_one_creation() {
        let store = Arc::new(memory_store().await);
        let name = "Glock-18 | Fade (Factory New)";

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.upsert_price(name, 900.0 + i as f64, PriceSide::Sell).await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.count().await.unwrap(), 1);
        let sample_count: i64 =
            sqlx::query_scalar("SELECT sample_count FROM items WHERE name = ?")
                .bind(name)
                .fetch_one(&store.pool)
                .await
                .unwrap();
        assert_eq!(sample_count, 10);
    }

    #[tokio::test]
    async fn test_init_schema_adds_sample_count_to_old_table() {
        let store = memory_store().await;
        sqlx::query("DROP TABLE items").execute(&store.pool).await.unwrap();
        sqlx::query(
            "CREATE TABLE items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                sell_side_price REAL NOT NULL DEFAULT 0,
                buy_side_price REAL NOT NULL DEFAULT 0,
                last_updated TEXT NOT NULL
            )",
        )
        .execute(&store.pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO items (name, buy_side_price, last_updated) VALUES (?, ?, ?)")
            .bind("AWP | Asiimov (Field-Tested)")
            .bind(120.0)
            .bind("2026-01-01T00:00:00Z")
            .execute(&store.pool)
            .await
            .unwrap();

        store.init_schema().await.unwrap();

        // The existing row is not reported as new
        let created = store
            .upsert_price("AWP | Asiimov (Field-Tested)", 150.0, PriceSide::Sell)
            .await
            .unwrap();
        assert!(!created);
        let item = store.get_item("AWP | Asiimov (Field-Tested)").await.unwrap().unwrap();
        assert_eq!(item.buy_side_price, 120.0);
        assert_eq!(item.sell_side_price, 150.0);
    }

    #[tokio::test]
    async fn test_memory_pool_keeps_its_connection() {
        let store = memory_store().await;
        let options = store.pool.options();

        assert_eq!(options.get_max_connections(), 1);
        assert!(options.get_idle_timeout().is_none());
        assert!(options.get_max_lifetime().is_none());

        store.upsert_price("P250 | Sand Dune (Field-Tested)", 0.03, PriceSide::Sell).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_timestamp_is_an_error() {
        let store = memory_store().await;
        sqlx::query("INSERT INTO items (name, sell_side_price, last_updated) VALUES (?, ?, ?)")
            .bind("Desert Eagle | Blaze (Factory New)")
            .bind(650.0)
            .bind("yesterday")
            .execute(&store.pool)
            .await
            .unwrap();

        let err = store
            .get_item("Desert Eagle | Blaze (Factory New)")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("last_updated"));
        assert!(store.get_all_items().await.is_err());
    }
}
