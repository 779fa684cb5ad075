//! Source-of-record database adapter with runtime queries (no compile-time checking)

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::core::error::{IndexerResult, SourceError};
use crate::core::traits::LedgerSource;
use crate::core::types::SeqGap;
use crate::models::{FeeRow, LedgerRow, TransactionRow};
use crate::xdr::{Hash, LedgerEntryChange, LedgerHeader, ReadXdr, TransactionEnvelope, TransactionMeta, TransactionResultPair};

const LEDGER_COLUMNS: &str = "ledgerhash, ledgerseq, data";
const TX_COLUMNS: &str = "txid, ledgerseq, txindex, txbody, txresult, txmeta";
const FEE_COLUMNS: &str = "txid, ledgerseq, txindex, txchanges";

#[derive(Clone)]
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    pub async fn connect(config: &DatabaseConfig) -> IndexerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        info!("Connected to source database");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_ledgers(&self, query: &str, binds: LedgerBinds<'_>) -> IndexerResult<Vec<LedgerRow>> {
        let q = sqlx::query(query);
        let q = match binds {
            LedgerBinds::Range(start, end) => q.bind(start).bind(end),
            LedgerBinds::Seqs(seqs) => q.bind(seqs),
        };
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(decode_ledger).collect()
    }
}

enum LedgerBinds<'a> {
    Range(i64, i64),
    Seqs(&'a [i32]),
}

fn as_i32(seqs: &[u32]) -> Vec<i32> {
    seqs.iter().map(|seq| *seq as i32).collect()
}

fn decode_hash(table: &'static str, raw: &str) -> IndexerResult<Hash> {
    let malformed = |reason: String| SourceError::MalformedRow {
        table,
        key: raw.to_string(),
        reason,
    };
    let bytes = hex::decode(raw).map_err(|e| malformed(e.to_string()))?;
    let hash: Hash = bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| malformed(format!("hash is {} bytes", bytes.len())))?;
    Ok(hash)
}

fn seq_column(row: &PgRow) -> u32 {
    row.get::<i32, _>("ledgerseq") as u32
}

fn decode_ledger(row: &PgRow) -> IndexerResult<LedgerRow> {
    let hash = decode_hash("ledgerheaders", row.get("ledgerhash"))?;
    let header = LedgerHeader::from_xdr_base64(row.get("data"))?;
    if header.ledger_seq != seq_column(row) {
        return Err(SourceError::MalformedRow {
            table: "ledgerheaders",
            key: seq_column(row).to_string(),
            reason: format!("header carries sequence {}", header.ledger_seq),
        }
        .into());
    }
    LedgerRow::new(hash, header)
}

fn decode_transaction(row: &PgRow) -> IndexerResult<TransactionRow> {
    let hash = decode_hash("txhistory", row.get("txid"))?;
    let pair = TransactionResultPair::from_xdr_base64(row.get("txresult"))?;
    Ok(TransactionRow {
        hash,
        ledger_seq: seq_column(row),
        index: row.get::<i32, _>("txindex") as u32,
        envelope: TransactionEnvelope::from_xdr_base64(row.get("txbody"))?,
        result: pair.result,
        meta: TransactionMeta::from_xdr_base64(row.get("txmeta"))?,
    })
}

fn decode_fee(row: &PgRow) -> IndexerResult<FeeRow> {
    Ok(FeeRow {
        hash: decode_hash("txfeehistory", row.get("txid"))?,
        ledger_seq: seq_column(row),
        index: row.get::<i32, _>("txindex") as u32,
        changes: Vec::<LedgerEntryChange>::from_xdr_base64(row.get("txchanges"))?,
    })
}

#[async_trait]
impl LedgerSource for PostgresSource {
    async fn ledgers_in_range(&self, start: u32, count: u32) -> IndexerResult<Vec<LedgerRow>> {
        let query = format!(
            "SELECT {} FROM ledgerheaders WHERE ledgerseq >= $1 AND ledgerseq < $2 ORDER BY ledgerseq",
            LEDGER_COLUMNS
        );
        let end = i64::from(start) + i64::from(count);
        self.fetch_ledgers(&query, LedgerBinds::Range(i64::from(start), end)).await
    }

    async fn ledgers_by_seq(&self, seqs: &[u32]) -> IndexerResult<Vec<LedgerRow>> {
        if seqs.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {} FROM ledgerheaders WHERE ledgerseq = ANY($1) ORDER BY ledgerseq",
            LEDGER_COLUMNS
        );
        self.fetch_ledgers(&query, LedgerBinds::Seqs(&as_i32(seqs))).await
    }

    async fn next_ledger_after(&self, seq: u32) -> IndexerResult<Option<LedgerRow>> {
        let query = format!(
            "SELECT {} FROM ledgerheaders WHERE ledgerseq > $1 ORDER BY ledgerseq LIMIT 1",
            LEDGER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(i64::from(seq))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_ledger).transpose()
    }

    async fn transactions_for(&self, seqs: &[u32]) -> IndexerResult<Vec<TransactionRow>> {
        if seqs.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {} FROM txhistory WHERE ledgerseq = ANY($1) ORDER BY ledgerseq, txindex",
            TX_COLUMNS
        );
        let rows = sqlx::query(&query).bind(as_i32(seqs)).fetch_all(&self.pool).await?;
        debug!("Fetched {} transactions for {} ledgers", rows.len(), seqs.len());
        rows.iter().map(decode_transaction).collect()
    }

    async fn fee_changes_for(&self, seqs: &[u32]) -> IndexerResult<Vec<FeeRow>> {
        if seqs.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {} FROM txfeehistory WHERE ledgerseq = ANY($1) ORDER BY ledgerseq, txindex",
            FEE_COLUMNS
        );
        let rows = sqlx::query(&query).bind(as_i32(seqs)).fetch_all(&self.pool).await?;
        rows.iter().map(decode_fee).collect()
    }

    async fn first_ledger_seq(&self) -> IndexerResult<Option<u32>> {
        let seq: Option<i32> = sqlx::query_scalar("SELECT MIN(ledgerseq) FROM ledgerheaders")
            .fetch_one(&self.pool)
            .await?;
        Ok(seq.map(|seq| seq as u32))
    }

    async fn last_ledger_seq(&self) -> IndexerResult<Option<u32>> {
        let seq: Option<i32> = sqlx::query_scalar("SELECT MAX(ledgerseq) FROM ledgerheaders")
            .fetch_one(&self.pool)
            .await?;
        Ok(seq.map(|seq| seq as u32))
    }

    async fn ledger_gaps(&self) -> IndexerResult<Vec<SeqGap>> {
        let query = r#"
            SELECT prev + 1 AS gap_start, ledgerseq - 1 AS gap_end
            FROM (
                SELECT ledgerseq, LAG(ledgerseq) OVER (ORDER BY ledgerseq) AS prev
                FROM ledgerheaders
            ) seqs
            WHERE ledgerseq - prev > 1
            ORDER BY gap_start
        "#;
        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| SeqGap {
                start: row.get::<i32, _>("gap_start") as u32,
                end: row.get::<i32, _>("gap_end") as u32,
            })
            .collect())
    }
}
