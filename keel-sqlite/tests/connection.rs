#[cfg(test)]
mod tests {
    use keel::{
        Connection, Driver, Executor, Pool, PoolConfig, PoolError, PoolState, Query, SqlWriter,
        Value, stream::TryStreamExt,
    };
    use keel_sqlite::{SqliteDriver, SqliteSqlWriter};
    use keel_tests::{init_logs, silent_logs};
    use std::{path::Path, time::Duration};
    use tokio::{fs, sync::Mutex};

    static MUTEX: Mutex<()> = Mutex::const_new(());

    #[tokio::test]
    async fn create_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().await;
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        let driver = SqliteDriver::new();
        let connection = driver
            .connect(&PoolConfig::new(DB_PATH))
            .await
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        connection
            .disconnect()
            .await
            .expect("Could not close the database");
        fs::remove_file(DB_PATH)
            .await
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
    }

    #[tokio::test]
    async fn native_statements() {
        init_logs();
        let driver = SqliteDriver::new();
        let mut connection = driver
            .connect(&PoolConfig::new(":memory:"))
            .await
            .expect("Could not open the database");
        connection
            .execute(Query::new(
                "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, data BLOB, ok BOOLEAN)",
                vec![],
            ))
            .await
            .expect("Could not create the table");
        let affected = connection
            .execute(Query::new(
                "INSERT INTO t (name, data, ok) VALUES (?1, ?2, ?3), (?1, NULL, ?4)",
                vec![
                    "alpha".into(),
                    Value::Blob(Some([1u8, 2, 3].into())),
                    true.into(),
                    false.into(),
                ],
            ))
            .await
            .expect("Could not insert");
        assert_eq!(affected.rows_affected, 2);
        assert_eq!(affected.last_affected_id, Some(2));
        let rows: Vec<_> = connection
            .fetch(Query::new("SELECT id, name, data, ok FROM t ORDER BY id", vec![]), Some(1))
            .try_collect()
            .await
            .expect("Could not select");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].names(), ["id", "name", "data", "ok"]);
        assert_eq!(
            rows[0].values(),
            [
                Value::Int64(Some(1)),
                Value::Varchar(Some("alpha".into())),
                Value::Blob(Some([1u8, 2, 3].into())),
                Value::Int64(Some(1)),
            ]
        );
        let error = connection
            .execute(Query::new("INSERT INTO missing VALUES (1)", vec![]))
            .await
            .expect_err("The table does not exist");
        assert!(format!("{:#}", error).contains("missing"));
        assert!(!connection.is_broken());
        connection.disconnect().await.expect("Could not close");
    }

    #[tokio::test]
    async fn memory_is_shared_by_the_pool() {
        init_logs();
        let pool = Pool::initialize(
            SqliteDriver::new(),
            PoolConfig::new(":memory:").min_size(2).max_size(2),
        )
        .await
        .expect("Could not open the pool");
        let (first, second) = (pool.acquire().await.unwrap(), pool.acquire().await.unwrap());
        drop((first, second));
        pool.execute("CREATE TABLE shared (v INTEGER)", &[])
            .await
            .expect("Could not create the table");
        pool.execute("INSERT INTO shared VALUES (?), (?)", &[1i64.into(), 2i64.into()])
            .await
            .expect("Could not insert");
        let held = pool.acquire().await.unwrap();
        let rows = pool
            .select("SELECT SUM(v) AS total FROM shared", &[], None)
            .await
            .expect("Could not select from the other connection");
        drop(held);
        assert_eq!(rows[0].get_column("total"), Some(&Value::Int64(Some(3))));

        // A different driver gets its own database
        let other = Pool::initialize(SqliteDriver::new(), PoolConfig::new(":memory:"))
            .await
            .unwrap();
        silent_logs! {
            assert!(other.select("SELECT * FROM shared", &[], None).await.is_err());
        }
    }

    #[tokio::test]
    async fn memory_survives_cancelled_statement() {
        init_logs();
        let pool = Pool::initialize(
            SqliteDriver::new(),
            PoolConfig::new(":memory:").max_size(1),
        )
        .await
        .expect("Could not open the pool");
        pool.execute("CREATE TABLE kept (id INTEGER)", &[])
            .await
            .expect("Could not create the table");
        pool.execute("INSERT INTO kept VALUES (?)", &[7i64.into()])
            .await
            .expect("Could not insert");
        let slow = pool.select(
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 20000000) SELECT SUM(x) FROM c",
            &[],
            None,
        );
        assert!(
            tokio::time::timeout(Duration::from_millis(5), slow)
                .await
                .is_err(),
            "The statement should still be running"
        );
        // The only pooled connection went away with the cancelled statement
        let rows = pool
            .select("SELECT id FROM kept", &[], None)
            .await
            .expect("The memory database is still there");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_column("id"), Some(&Value::Int64(Some(7))));
        assert_eq!(pool.size(), 1);
    }

    #[tokio::test]
    async fn backslash_is_literal() {
        init_logs();
        let (sql, count) = SqliteSqlWriter.rewrite_placeholders(r"SELECT 'C:\' AS p, ? AS q");
        assert_eq!(sql, r"SELECT 'C:\' AS p, ?1 AS q");
        assert_eq!(count, 1);
        let pool = Pool::initialize(SqliteDriver::new(), PoolConfig::new(":memory:"))
            .await
            .expect("Could not open the pool");
        let rows = pool
            .select(r"SELECT 'C:\' AS p, ? AS q", &[1i64.into()], None)
            .await
            .expect("One placeholder, one argument");
        assert_eq!(rows[0].get_column("p"), Some(&Value::Varchar(Some(r"C:\".into()))));
        assert_eq!(rows[0].get_column("q"), Some(&Value::Int64(Some(1))));
    }

    #[tokio::test]
    async fn pool_exhaustion() {
        init_logs();
        let pool = Pool::initialize(
            SqliteDriver::new(),
            PoolConfig::new(":memory:")
                .max_size(1)
                .acquire_timeout(Duration::from_millis(50)),
        )
        .await
        .expect("Could not open the pool");
        let held = pool.acquire().await.unwrap();
        silent_logs! {
            let error = pool
                .execute("SELECT 1", &[])
                .await
                .expect_err("The only connection is checked out");
            assert!(matches!(
                error.downcast_ref::<PoolError>(),
                Some(PoolError::Timeout(..))
            ));
        }
        drop(held);
        let rows = pool.select("SELECT 1 AS one", &[], None).await.unwrap();
        assert_eq!(rows[0].get_column("one"), Some(&Value::Int64(Some(1))));
        pool.shutdown().await.unwrap();
        assert_eq!(pool.state(), PoolState::Closed);
        assert!(pool.acquire().await.is_err());
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            let error = Pool::connect(SqliteDriver::new(), "mysql://some_value")
                .await
                .err()
                .expect("The scheme is not sqlite");
            assert!(matches!(
                error.downcast_ref::<PoolError>(),
                Some(PoolError::WrongScheme { expected, .. }) if *expected == "sqlite"
            ));
        }
    }

    #[tokio::test]
    async fn unreachable_database() {
        silent_logs! {
            let result = Pool::connect(
                SqliteDriver::new(),
                "sqlite://../target/debug/missing/directory/db.sqlite",
            )
            .await;
            assert!(result.is_err(), "The parent directory does not exist");
        }
    }
}
