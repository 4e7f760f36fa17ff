use anyhow::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::models::{RawRecord, StoredRawRecord};
use crate::utils::parse_timestamp;

/// Append records to the raw store, stamping `fetched_at`. Returns the new row ids.
pub async fn insert_raw_records(pool: &SqlitePool, records: &[RawRecord]) -> Result<Vec<i64>> {
    let fetched_at = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(records.len());

    for record in records {
        let payload = serde_json::to_string(&record.payload)?;
        let result = sqlx::query(
            "INSERT INTO raw_records (sport, kind, source, payload, fetched_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(record.sport.as_str())
        .bind(record.kind.as_str())
        .bind(&record.source)
        .bind(payload)
        .bind(&fetched_at)
        .execute(&mut *tx)
        .await?;
        ids.push(result.last_insert_rowid());
    }

    tx.commit().await?;
    tracing::info!("Stored {} raw records", ids.len());
    Ok(ids)
}

/// Stored records in insertion order; processed rows only when asked for.
pub async fn pending_raw_records(
    pool: &SqlitePool,
    include_processed: bool,
) -> Result<Vec<StoredRawRecord>> {
    let rows = sqlx::query(
        "SELECT * FROM raw_records WHERE (?1 = 1 OR normalized_at IS NULL) ORDER BY id",
    )
    .bind(include_processed)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let payload: String = row.get("payload");
        let normalized_at: Option<String> = row.get("normalized_at");
        records.push(StoredRawRecord {
            id: row.get("id"),
            record: RawRecord {
                sport: row.get::<String, _>("sport").parse()?,
                kind: row.get::<String, _>("kind").parse()?,
                source: row.get("source"),
                payload: serde_json::from_str(&payload)?,
            },
            fetched_at: parse_timestamp(&row.get::<String, _>("fetched_at"))?,
            normalized_at: normalized_at.as_deref().map(parse_timestamp).transpose()?,
        });
    }
    Ok(records)
}

pub async fn mark_normalized(pool: &SqlitePool, ids: &[i64]) -> Result<()> {
    let stamp = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;
    for id in ids {
        sqlx::query("UPDATE raw_records SET normalized_at = ? WHERE id = ?")
            .bind(&stamp)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn count_raw_records(pool: &SqlitePool) -> Result<(i64, i64)> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS total, COUNT(normalized_at) AS processed FROM raw_records",
    )
    .fetch_one(pool)
    .await?;
    Ok((row.get("total"), row.get("processed")))
}
