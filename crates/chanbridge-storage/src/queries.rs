// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel CRUD operations.

use chanbridge_core::{Channel, ChanbridgeError};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

const SELECT_COLUMNS: &str = "SELECT id, group_id, name, joined_at, last_seen FROM channels";

fn encode_ts(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn decode_ts(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    })
    .transpose()
}

fn row_to_channel(row: &rusqlite::Row<'_>) -> rusqlite::Result<Channel> {
    Ok(Channel {
        id: row.get(0)?,
        group_id: row.get(1)?,
        name: row.get(2)?,
        joined_at: decode_ts(3, row.get(3)?)?,
        last_seen: decode_ts(4, row.get(4)?)?,
    })
}

/// Get a channel by id.
pub async fn get_channel(db: &Database, id: i64) -> Result<Option<Channel>, ChanbridgeError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
            match stmt.query_row(params![id], row_to_channel) {
                Ok(channel) => Ok(Some(channel)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace a channel record.
pub async fn upsert_channel(db: &Database, channel: &Channel) -> Result<(), ChanbridgeError> {
    let channel = channel.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO channels (id, group_id, name, joined_at, last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     group_id = excluded.group_id,
                     name = excluded.name,
                     joined_at = excluded.joined_at,
                     last_seen = excluded.last_seen",
                params![
                    channel.id,
                    channel.group_id,
                    channel.name,
                    encode_ts(channel.joined_at),
                    encode_ts(channel.last_seen),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a channel record. Missing ids are ignored.
pub async fn delete_channel(db: &Database, id: i64) -> Result<(), ChanbridgeError> {
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM channels WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// List every channel ordered by id.
pub async fn list_channels(db: &Database) -> Result<Vec<Channel>, ChanbridgeError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))?;
            let rows = stmt.query_map([], row_to_channel)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
