use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                is_verified INTEGER NOT NULL DEFAULT 0,
                join_date   TEXT NOT NULL
            );

            CREATE TABLE businesses (
                id                   INTEGER PRIMARY KEY AUTOINCREMENT,
                business_name        TEXT NOT NULL UNIQUE,
                city                 TEXT NOT NULL DEFAULT 'Unspecified',
                region               TEXT NOT NULL DEFAULT 'Unspecified',
                business_description TEXT,
                logo                 TEXT NOT NULL DEFAULT 'default.jpg',
                owner_id             INTEGER NOT NULL REFERENCES users(id)
            );

            CREATE INDEX idx_businesses_owner ON businesses(owner_id);

            CREATE TABLE products (
                id                    INTEGER PRIMARY KEY AUTOINCREMENT,
                name                  TEXT NOT NULL,
                category              TEXT NOT NULL,
                original_price        REAL NOT NULL,
                new_price             REAL NOT NULL,
                percentage_discount   INTEGER NOT NULL,
                offer_expiration_date TEXT NOT NULL,
                product_image         TEXT NOT NULL DEFAULT 'productDefault.jpg',
                date_published        TEXT NOT NULL,
                business_id           INTEGER NOT NULL REFERENCES businesses(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_products_name ON products(name);
            CREATE INDEX idx_products_category ON products(category);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
