use chrono::{SubsecRound, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use helpline_types::api::AdminMessage;
use helpline_types::{Message, MessageBody, MessageId, UserId};

use crate::models::{MessageRow, format_timestamp};
use crate::{Database, DbError, Result};

const MESSAGE_COLUMNS: &str = "m.id, m.user_id, u.display_name, m.body, m.is_from_admin, m.read, m.created_at";

impl Database {
    // -- Accounts --

    pub fn create_user(&self, id: UserId, display_name: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, display_name) VALUES (?1, ?2)",
                params![id.0, display_name],
            )?;
            Ok(())
        })
    }

    /// `None` when the user has no account row or never set a name.
    pub fn display_name(&self, id: UserId) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let name = conn
                .query_row(
                    "SELECT display_name FROM users WHERE id = ?1",
                    [id.0],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()?;
            Ok(name.flatten())
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        user_id: Option<UserId>,
        body: &MessageBody,
        is_from_admin: bool,
    ) -> Result<Message> {
        // Stored with microsecond precision; keep the returned value identical.
        let created_at = Utc::now().trunc_subsecs(6);

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (user_id, body, is_from_admin, read, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                params![
                    user_id.map(|u| u.0),
                    body.as_str(),
                    is_from_admin,
                    format_timestamp(created_at)
                ],
            )
            .map_err(DbError::from_insert)?;

            Ok(Message {
                id: MessageId(conn.last_insert_rowid()),
                user_id,
                body: body.as_str().to_string(),
                is_from_admin,
                read: false,
                created_at,
            })
        })
    }

    pub fn get_message(&self, id: MessageId) -> Result<Option<Message>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 LEFT JOIN users u ON m.user_id = u.id
                 WHERE m.id = ?1"
            );
            let row = conn.query_row(&sql, [id.0], map_row).optional()?;
            Ok(row.map(MessageRow::into_message))
        })
    }

    /// Number of user-authored messages in a thread, the auto-responder's
    /// first-contact test.
    pub fn count_user_authored(&self, user_id: UserId) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE user_id = ?1 AND is_from_admin = 0",
                [user_id.0],
                |r| r.get(0),
            )?;
            Ok(count as usize)
        })
    }

    /// Every message with its sender's display name, newest first.
    pub fn list_all(&self) -> Result<Vec<AdminMessage>> {
        self.with_conn(|conn| {
            let rows = query_rows(conn, "ORDER BY m.created_at DESC, m.id DESC", [])?;
            Ok(rows.into_iter().map(MessageRow::into_admin_message).collect())
        })
    }

    /// One thread, oldest first. An unknown user simply has no messages.
    pub fn list_for_user(&self, user_id: UserId) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let rows = query_rows(
                conn,
                "WHERE m.user_id = ?1 ORDER BY m.created_at ASC, m.id ASC",
                [user_id.0],
            )?;
            Ok(rows.into_iter().map(MessageRow::into_message).collect())
        })
    }

    // -- Read state --

    /// Mark every unread user-authored message in the thread as read.
    pub fn mark_read_by_user(&self, user_id: UserId) -> Result<usize> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE messages SET read = 1
                 WHERE user_id = ?1 AND is_from_admin = 0 AND read = 0",
                [user_id.0],
            )?;
            Ok(updated)
        })
    }

    /// Mark exactly these user-authored messages as read. With an `owner`,
    /// ids outside that user's thread are ignored.
    pub fn mark_read_by_ids(&self, ids: &[MessageId], owner: Option<UserId>) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
            let owner_param = ids.len() + 1;
            let sql = format!(
                "UPDATE messages SET read = 1
                 WHERE id IN ({}) AND is_from_admin = 0 AND read = 0
                   AND (?{owner_param} IS NULL OR user_id = ?{owner_param})",
                placeholders.join(", ")
            );

            let updated = conn.execute(&sql, params_from_iter(id_params(ids, owner)))?;
            Ok(updated)
        })
    }

    // -- Deletion --

    /// Delete one message. With an `owner`, a message in another thread is
    /// left alone and reported as not deleted.
    pub fn delete_message(&self, id: MessageId, owner: Option<UserId>) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM messages WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2)",
                params![id.0, owner.map(|u| u.0)],
            )?;
            Ok(deleted)
        })
    }

    /// Remove a whole thread in one statement. Zero is a normal result.
    pub fn delete_thread(&self, user_id: UserId) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM messages WHERE user_id = ?1", [user_id.0])?;
            Ok(deleted)
        })
    }
}

fn id_params(ids: &[MessageId], owner: Option<UserId>) -> Vec<Value> {
    let mut values: Vec<Value> = ids.iter().map(|id| Value::Integer(id.0)).collect();
    values.push(owner.map_or(Value::Null, |u| Value::Integer(u.0)));
    values
}

fn query_rows<P: rusqlite::Params>(conn: &Connection, tail: &str, params: P) -> Result<Vec<MessageRow>> {
    // LEFT JOIN so anonymous messages come back with a null name
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages m
         LEFT JOIN users u ON m.user_id = u.id
         {tail}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_name: row.get(2)?,
        body: row.get(3)?,
        is_from_admin: row.get(4)?,
        read: row.get(5)?,
        created_at: row.get(6)?,
    })
}
