use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Uuid,
    pub recipient: Uuid,
    pub content: String,
    pub read: bool,
    /// Unix milliseconds, assigned at persistence time.
    pub created_at: i64,
}

/// Durable message store. Everything the coordinator and the history/unread
/// endpoints know about persisted messages goes through here.
#[derive(Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new message. The store assigns the id, the timestamp and
    /// read=false; (sender, recipient, created_at) never change afterwards.
    pub async fn insert(&self, sender: Uuid, recipient: Uuid, content: &str) -> AppResult<Message> {
        let message = Message {
            id: Uuid::now_v7(),
            sender,
            recipient,
            content: content.to_owned(),
            read: false,
            created_at: now_ms(),
        };

        sqlx::query("INSERT INTO messages (id,sender,recipient,content,read,created_at) VALUES (?,?,?,?,?,?)")
            .bind(message.id.to_string())
            .bind(message.sender.to_string())
            .bind(message.recipient.to_string())
            .bind(&message.content)
            .bind(message.read)
            .bind(message.created_at)
            .execute(&self.pool)
            .await?;

        Ok(message)
    }

    /// Full conversation between two users, both directions, oldest first.
    /// Symmetric: `history(a, b)` and `history(b, a)` are the same sequence.
    pub async fn history(&self, a: Uuid, b: Uuid) -> AppResult<Vec<Message>> {
        let rows: Vec<(String, String, String, String, bool, i64)> = sqlx::query_as(
            "SELECT id,sender,recipient,content,read,created_at FROM messages
             WHERE (sender=? AND recipient=?) OR (sender=? AND recipient=?)
             ORDER BY created_at ASC, id ASC",
        )
        .bind(a.to_string())
        .bind(b.to_string())
        .bind(b.to_string())
        .bind(a.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for (id, sender, recipient, content, read, created_at) in rows {
            messages.push(Message {
                id: Uuid::parse_str(&id)?,
                sender: Uuid::parse_str(&sender)?,
                recipient: Uuid::parse_str(&recipient)?,
                content,
                read,
                created_at,
            });
        }

        Ok(messages)
    }

    /// Unread message counts for `user_id`, grouped by sender. Senders with
    /// nothing unread have no entry.
    pub async fn unread_counts(&self, user_id: Uuid) -> AppResult<HashMap<Uuid, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT sender, COUNT(*) FROM messages WHERE recipient=? AND read=0 GROUP BY sender",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for (sender, count) in rows {
            counts.insert(Uuid::parse_str(&sender)?, count);
        }

        Ok(counts)
    }

    /// Flip read=true on every unread message from `sender` to `recipient`,
    /// returning how many rows changed. Safe to repeat; a second call finds
    /// nothing left to flip.
    pub async fn mark_read(&self, sender: Uuid, recipient: Uuid) -> AppResult<u64> {
        let result = sqlx::query("UPDATE messages SET read=1 WHERE sender=? AND recipient=? AND read=0")
            .bind(sender.to_string())
            .bind(recipient.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

pub(crate) fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn store() -> MessageStore {
        MessageStore::new(db::memory().await.unwrap())
    }

    #[tokio::test]
    async fn insert_assigns_timestamp_and_unread() {
        let store = store().await;
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());

        let message = store.insert(alice, bob, "hi").await.unwrap();

        assert!(!message.read);
        assert!(message.created_at > 0);
        assert_eq!(store.history(alice, bob).await.unwrap(), vec![message]);
    }

    #[tokio::test]
    async fn history_is_symmetric_and_ordered() {
        let store = store().await;
        let (alice, bob, carol) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());

        store.insert(alice, bob, "one").await.unwrap();
        store.insert(bob, alice, "two").await.unwrap();
        store.insert(alice, bob, "three").await.unwrap();
        store.insert(alice, carol, "elsewhere").await.unwrap();

        let forward = store.history(alice, bob).await.unwrap();
        let backward = store.history(bob, alice).await.unwrap();

        assert_eq!(forward, backward);
        assert_eq!(
            forward.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            vec!["one", "two", "three"]
        );
        assert!(forward.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn unread_counts_group_by_sender() {
        let store = store().await;
        let (alice, bob, carol) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());

        store.insert(bob, alice, "b1").await.unwrap();
        store.insert(bob, alice, "b2").await.unwrap();
        store.insert(carol, alice, "c1").await.unwrap();
        store.insert(alice, bob, "outbound").await.unwrap();

        let counts = store.unread_counts(alice).await.unwrap();
        assert_eq!(counts.get(&bob), Some(&2));
        assert_eq!(counts.get(&carol), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[tokio::test]
    async fn mark_read_is_idempotent_and_scoped() {
        let store = store().await;
        let (alice, bob, carol) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());

        store.insert(bob, alice, "b1").await.unwrap();
        store.insert(bob, alice, "b2").await.unwrap();
        store.insert(carol, alice, "c1").await.unwrap();

        assert_eq!(store.mark_read(bob, alice).await.unwrap(), 2);
        assert_eq!(store.mark_read(bob, alice).await.unwrap(), 0);

        let counts = store.unread_counts(alice).await.unwrap();
        assert_eq!(counts.get(&bob), None);
        assert_eq!(counts.get(&carol), Some(&1));

        assert!(store
            .history(alice, bob)
            .await
            .unwrap()
            .iter()
            .all(|m| m.read));
    }
}
