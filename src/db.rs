use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};

/// One entry on the message board.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub name: String,
    pub message: String,
    pub time: String,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                message TEXT NOT NULL,
                time TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_time
            ON messages(time DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Appends a message stamped with the current time.
    pub async fn add_message(&self, name: &str, message: &str) -> anyhow::Result<Message> {
        let now = Utc::now().to_rfc3339();

        let id = sqlx::query("INSERT INTO messages (name, message, time) VALUES (?, ?, ?)")
            .bind(name)
            .bind(message)
            .bind(&now)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(Message {
            id,
            name: name.to_string(),
            message: message.to_string(),
            time: now,
        })
    }

    /// Most recent first.
    pub async fn get_messages(&self, limit: i64) -> anyhow::Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, name, message, time FROM messages
            ORDER BY time DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    pub async fn get_message_count(&self) -> anyhow::Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_db() -> Database {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.initialize().await.unwrap();
        db
    }

    mod initialization_tests {
        use super::*;

        #[tokio::test]
        async fn test_database_creation() {
            let db = Database::new("sqlite::memory:").await;
            assert!(db.is_ok());
        }

        #[tokio::test]
        async fn test_database_initialization() {
            let db = create_test_db().await;
            let messages = db.get_messages(10).await.unwrap();
            assert!(messages.is_empty());
        }

        #[tokio::test]
        async fn test_double_initialization_is_safe() {
            let db = create_test_db().await;
            let result = db.initialize().await;
            assert!(result.is_ok());
        }
    }

    mod message_tests {
        use super::*;

        #[tokio::test]
        async fn test_add_message() {
            let db = create_test_db().await;

            let added = db.add_message("alice", "hello").await.unwrap();
            assert_eq!(added.name, "alice");
            assert!(!added.time.is_empty());

            let messages = db.get_messages(10).await.unwrap();
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].id, added.id);
            assert_eq!(messages[0].message, "hello");
        }

        #[tokio::test]
        async fn test_most_recent_first() {
            let db = create_test_db().await;

            for i in 1..=3 {
                db.add_message("bob", &format!("message {}", i)).await.unwrap();
            }

            let messages = db.get_messages(10).await.unwrap();
            let texts: Vec<&str> = messages.iter().map(|m| m.message.as_str()).collect();
            assert_eq!(texts, vec!["message 3", "message 2", "message 1"]);
        }

        #[tokio::test]
        async fn test_limit() {
            let db = create_test_db().await;

            for i in 1..=5 {
                db.add_message("carol", &format!("message {}", i)).await.unwrap();
            }

            let messages = db.get_messages(2).await.unwrap();
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0].message, "message 5");
            assert_eq!(db.get_message_count().await.unwrap(), 5);
        }

        #[tokio::test]
        async fn test_duplicates_are_kept() {
            let db = create_test_db().await;

            db.add_message("dave", "same").await.unwrap();
            db.add_message("dave", "same").await.unwrap();

            assert_eq!(db.get_message_count().await.unwrap(), 2);
        }
    }
}
