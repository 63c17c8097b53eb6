use crate::models::{BusinessFields, NewAccount, ProductFields, UserRow};
use crate::Database;
use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use storefront_types::models::{Business, Product};

const MAX_BUSINESS_NAME_CHARS: usize = 30;

const USER_COLUMNS: &str = "id, username, email, password, is_verified, join_date";
const BUSINESS_COLUMNS: &str =
    "id, business_name, city, region, business_description, logo, owner_id";
const PRODUCT_COLUMNS: &str = "id, name, category, original_price, new_price, percentage_discount, \
     offer_expiration_date, product_image, date_published, business_id";

impl Database {
    // -- Users --

    /// Insert a user together with its storefront, named after the user.
    /// Both rows land in one transaction. When another business already
    /// carries the username, the storefront gets a numeric suffix instead.
    pub fn create_user_with_business(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<NewAccount> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_user(&tx, "username", &username)?.is_some() {
                return Ok(NewAccount::UsernameTaken);
            }
            if query_user(&tx, "email", &email)?.is_some() {
                return Ok(NewAccount::EmailTaken);
            }

            let inserted = tx.execute(
                "INSERT INTO users (username, email, password, is_verified, join_date)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                params![username, email, password_hash, Utc::now()],
            );
            match inserted {
                Ok(_) => {}
                // Another writer on the same file got there first.
                Err(e) if is_constraint_violation(&e) => {
                    return Ok(if query_user(&tx, "username", &username)?.is_some() {
                        NewAccount::UsernameTaken
                    } else {
                        NewAccount::EmailTaken
                    });
                }
                Err(e) => return Err(e.into()),
            }
            let user_id = tx.last_insert_rowid();

            let business_name = free_business_name(&tx, username)?;
            tx.execute(
                "INSERT INTO businesses (business_name, owner_id) VALUES (?1, ?2)",
                params![business_name, user_id],
            )?;
            let business_id = tx.last_insert_rowid();

            let user = query_user(&tx, "id", &user_id)?
                .ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", user_id))?;
            let business = query_business(&tx, "id", &business_id)?
                .ok_or_else(|| anyhow::anyhow!("Business {} vanished after insert", business_id))?;

            tx.commit()?;
            Ok(NewAccount::Created { user, business })
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", &id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", &username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", &email))
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.get_user_by_username(username)?.is_some())
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.get_user_by_email(email)?.is_some())
    }

    /// Flip the verified flag. Returns false if no such user exists.
    pub fn mark_verified(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("UPDATE users SET is_verified = 1 WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    pub fn list_users(&self, skip: u32, limit: u32) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id > ?1 AND id <= ?2 ORDER BY id"
            ))?;
            let (lo, hi) = id_window(skip, limit);
            let rows = stmt
                .query_map(params![lo, hi], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Businesses --

    pub fn get_business(&self, id: i64) -> Result<Option<Business>> {
        self.with_conn(|conn| query_business(conn, "id", &id))
    }

    pub fn get_business_by_owner(&self, owner_id: i64) -> Result<Option<Business>> {
        self.with_conn(|conn| query_business(conn, "owner_id", &owner_id))
    }

    /// True if `name` is used by a business other than `except_id`, or is the
    /// username of someone other than that business's owner. Usernames are
    /// reserved so that the owner's storefront can always be named after them.
    pub fn business_name_taken(&self, name: &str, except_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM businesses WHERE business_name = ?1 AND id != ?2)
                     OR EXISTS(SELECT 1 FROM users WHERE username = ?1
                               AND id != (SELECT owner_id FROM businesses WHERE id = ?2))",
                params![name, except_id],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    pub fn update_business(&self, id: i64, fields: &BusinessFields) -> Result<Option<Business>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE businesses
                 SET business_name = ?1, city = ?2, region = ?3, business_description = ?4
                 WHERE id = ?5",
                params![
                    fields.business_name,
                    fields.city,
                    fields.region,
                    fields.business_description,
                    id
                ],
            )?;
            query_business(conn, "id", &id)
        })
    }

    pub fn set_business_logo(&self, id: i64, logo: &str) -> Result<Option<Business>> {
        self.with_conn(|conn| {
            conn.execute("UPDATE businesses SET logo = ?1 WHERE id = ?2", params![logo, id])?;
            query_business(conn, "id", &id)
        })
    }

    // -- Products --

    pub fn insert_product(&self, business_id: i64, fields: &ProductFields) -> Result<Product> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO products (name, category, original_price, new_price,
                     percentage_discount, offer_expiration_date, date_published, business_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    fields.name,
                    fields.category,
                    fields.original_price,
                    fields.new_price,
                    fields.percentage_discount,
                    fields.offer_expiration_date,
                    Utc::now(),
                    business_id
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_product(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("Product {} vanished after insert", id))
        })
    }

    pub fn get_product(&self, id: i64) -> Result<Option<Product>> {
        self.with_conn(|conn| query_product(conn, id))
    }

    pub fn update_product(&self, id: i64, fields: &ProductFields) -> Result<Option<Product>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE products
                 SET name = ?1, category = ?2, original_price = ?3, new_price = ?4,
                     percentage_discount = ?5, offer_expiration_date = ?6
                 WHERE id = ?7",
                params![
                    fields.name,
                    fields.category,
                    fields.original_price,
                    fields.new_price,
                    fields.percentage_discount,
                    fields.offer_expiration_date,
                    id
                ],
            )?;
            query_product(conn, id)
        })
    }

    pub fn set_product_image(&self, id: i64, image: &str) -> Result<Option<Product>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE products SET product_image = ?1 WHERE id = ?2",
                params![image, id],
            )?;
            query_product(conn, id)
        })
    }

    /// Returns false if the product did not exist.
    pub fn delete_product(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM products WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    pub fn list_products(&self, skip: u32, limit: u32) -> Result<Vec<Product>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE id > ?1 AND id <= ?2 ORDER BY id"
            ))?;
            let (lo, hi) = id_window(skip, limit);
            let rows = stmt
                .query_map(params![lo, hi], product_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// `base` if no business uses it yet, otherwise `base-2`, `base-3`, ...
/// with `base` cut short so the result stays within the name limit.
fn free_business_name(conn: &Connection, base: &str) -> Result<String> {
    let mut candidate = base.to_string();
    let mut n = 1u32;
    while query_business(conn, "business_name", &candidate)?.is_some() {
        n += 1;
        let suffix = format!("-{n}");
        let stem: String = base
            .chars()
            .take(MAX_BUSINESS_NAME_CHARS.saturating_sub(suffix.len()))
            .collect();
        candidate = format!("{stem}{suffix}");
    }
    Ok(candidate)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn id_window(skip: u32, limit: u32) -> (i64, i64) {
    let lo = i64::from(skip);
    (lo, lo + i64::from(limit))
}

// `column` is always one of our own literals, never caller input.
fn query_user(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
            [value],
            user_from_row,
        )
        .optional()?;
    Ok(row)
}

fn query_business(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<Business>> {
    let row = conn
        .query_row(
            &format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE {column} = ?1"),
            [value],
            business_from_row,
        )
        .optional()?;
    Ok(row)
}

fn query_product(conn: &Connection, id: i64) -> Result<Option<Product>> {
    let row = conn
        .query_row(
            &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
            [id],
            product_from_row,
        )
        .optional()?;
    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        is_verified: row.get(4)?,
        join_date: row.get(5)?,
    })
}

fn business_from_row(row: &Row<'_>) -> rusqlite::Result<Business> {
    Ok(Business {
        id: row.get(0)?,
        business_name: row.get(1)?,
        city: row.get(2)?,
        region: row.get(3)?,
        business_description: row.get(4)?,
        logo: row.get(5)?,
        owner_id: row.get(6)?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        original_price: row.get(3)?,
        new_price: row.get(4)?,
        percentage_discount: row.get(5)?,
        offer_expiration_date: row.get(6)?,
        product_image: row.get(7)?,
        date_published: row.get(8)?,
        business_id: row.get(9)?,
    })
}
