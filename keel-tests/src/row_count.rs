use keel::{Entity, Executor, RowCountError, RowCountPolicy};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "tags")]
pub struct Tag {
    #[keel(primary_key, column_type = "varchar(50)")]
    pub label: String,
}

pub async fn row_count<E: Executor>(executor: &E) {
    let _lock = MUTEX.lock().await;

    let result = Tag::drop_table(executor, true).await;
    assert!(result.is_ok(), "Failed to Tag::drop_table: {:?}", result.unwrap_err());
    let result = Tag::create_table(executor, false).await;
    assert!(result.is_ok(), "Failed to Tag::create_table: {:?}", result.unwrap_err());

    let mut tag = Tag {
        label: "rust".into(),
    };
    tag.save(executor).await.expect("Failed to save the tag");
    // Only the primary key: it is assigned to itself
    tag.update(executor).await.expect("Failed to update the tag");
    tag.remove(executor).await.expect("Failed to remove the tag");

    // The row is gone, the same writes now touch no rows
    let results = [tag.update(executor).await, tag.remove(executor).await];
    for (operation, result) in ["update", "delete"].into_iter().zip(results) {
        match executor.row_count_policy() {
            RowCountPolicy::Warn => assert!(
                result.is_ok(),
                "A {operation} of a missing row should only warn: {:?}",
                result.unwrap_err()
            ),
            RowCountPolicy::Fail => {
                let error = result.expect_err("A write of a missing row should fail");
                let error = error
                    .downcast_ref::<RowCountError>()
                    .expect("The error should be a RowCountError");
                assert_eq!(error.operation, operation);
                assert_eq!(error.affected, 0);
            }
        }
    }
    assert!(Tag::find(executor, "rust").await.unwrap().is_none());
}
