//! Invoice database operations

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::invoice::{InvoiceRecord, InvoiceUpdate, NewInvoice};

/// Raw `invoices` row
#[derive(Debug, Clone, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    file_id: String,
    file_name: String,
    vendor: String,
    invoice: String,
    created_at: String,
    updated_at: Option<String>,
}

impl InvoiceRow {
    fn into_record(self) -> Result<InvoiceRecord> {
        Ok(InvoiceRecord {
            vendor: serde_json::from_str(&self.vendor)?,
            invoice: serde_json::from_str(&self.invoice)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_timestamp).transpose()?,
            id: self.id,
            file_id: self.file_id,
            file_name: self.file_name,
        })
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    // Fixed width so lexical order is chronological order
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| AppError::Internal(format!("Invalid stored timestamp {:?}: {}", raw, e)))
}

/// LIKE pattern matching `query` literally anywhere in a value
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

const SELECT_COLUMNS: &str =
    "SELECT id, file_id, file_name, vendor, invoice, created_at, updated_at FROM invoices";

/// Invoice repository
pub struct InvoiceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> InvoiceRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an invoice by id
    pub async fn get(&self, id: &str) -> Result<Option<InvoiceRecord>> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(InvoiceRow::into_record).transpose()
    }

    /// List invoices, newest first
    ///
    /// `query` matches vendor name or invoice number as a case-insensitive
    /// literal substring. SQLite folds ASCII letters only.
    pub async fn list(&self, query: Option<&str>) -> Result<Vec<InvoiceRecord>> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        let rows = match query {
            Some(q) => {
                let pattern = contains_pattern(q);
                sqlx::query_as::<_, InvoiceRow>(&format!(
                    r#"{}
                    WHERE vendor_name LIKE ? ESCAPE '\' OR invoice_number LIKE ? ESCAPE '\'
                    ORDER BY created_at DESC, rowid DESC"#,
                    SELECT_COLUMNS
                ))
                .bind(&pattern)
                .bind(&pattern)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, InvoiceRow>(&format!(
                    "{} ORDER BY created_at DESC, rowid DESC",
                    SELECT_COLUMNS
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        rows.into_iter().map(InvoiceRow::into_record).collect()
    }

    /// Insert a confirmed invoice
    ///
    /// Each stored file backs at most one record.
    pub async fn create(&self, data: &NewInvoice) -> Result<InvoiceRecord> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp(Utc::now());

        let result = sqlx::query(
            r#"
            INSERT INTO invoices (id, file_id, file_name, vendor, invoice, vendor_name, invoice_number, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.file_id)
        .bind(&data.file_name)
        .bind(serde_json::to_string(&data.vendor)?)
        .bind(serde_json::to_string(&data.invoice)?)
        .bind(&data.vendor.name)
        .bind(&data.invoice.number)
        .bind(&now)
        .execute(self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::Conflict(format!(
                    "An invoice already exists for file {}",
                    data.file_id
                )));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(invoice_id = %id, file_id = %data.file_id, "Created invoice");

        self.get(&id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created invoice".to_string()))
    }

    /// Replace every field present in `data`
    ///
    /// Absent fields are left untouched by the statement itself, so concurrent
    /// updates of different fields do not overwrite each other.
    pub async fn update(&self, id: &str, data: &InvoiceUpdate) -> Result<Option<InvoiceRecord>> {
        let mut set_clauses = vec!["updated_at = ?"];
        let mut binds: Vec<String> = vec![timestamp(Utc::now())];

        if let Some(ref file_name) = data.file_name {
            set_clauses.push("file_name = ?");
            binds.push(file_name.clone());
        }

        if let Some(ref vendor) = data.vendor {
            set_clauses.push("vendor = ?");
            set_clauses.push("vendor_name = ?");
            binds.push(serde_json::to_string(vendor)?);
            binds.push(vendor.name.clone());
        }

        if let Some(ref invoice) = data.invoice {
            set_clauses.push("invoice = ?");
            set_clauses.push("invoice_number = ?");
            binds.push(serde_json::to_string(invoice)?);
            binds.push(invoice.number.clone());
        }

        let query = format!(
            "UPDATE invoices SET {} WHERE id = ?",
            set_clauses.join(", ")
        );

        let mut sql_query = sqlx::query(&query);
        for bind in binds {
            sql_query = sql_query.bind(bind);
        }

        let result = sql_query.bind(id).execute(self.pool).await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        tracing::info!(invoice_id = %id, "Updated invoice");

        self.get(id).await
    }

    /// Delete an invoice
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all invoices
    #[cfg(test)]
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM invoices")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
