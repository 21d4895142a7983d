use keel::{Entity, Executor, Filter, Order};
use std::sync::{
    LazyLock,
    atomic::{AtomicI64, Ordering},
};
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
static SEQUENCE: AtomicI64 = AtomicI64::new(0);

fn next_sequence() -> i64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1
}

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[keel(table = "counters")]
pub struct Counter {
    #[keel(primary_key)]
    pub id: i64,
    #[keel(default_with = next_sequence)]
    pub sequence: Option<i64>,
    #[keel(column_type = "varchar(20)", default = "n/a")]
    pub label: Option<String>,
    #[keel(name = "remark", column_type = "text")]
    pub note: Option<String>,
}

pub async fn defaults<E: Executor>(executor: &E) {
    let _lock = MUTEX.lock().await;

    let result = Counter::drop_table(executor, true).await;
    assert!(result.is_ok(), "Failed to Counter::drop_table: {:?}", result.unwrap_err());
    let result = Counter::create_table(executor, false).await;
    assert!(result.is_ok(), "Failed to Counter::create_table: {:?}", result.unwrap_err());

    // Factories run once per save, at save time
    let mut first = Counter {
        id: 1,
        ..Default::default()
    };
    let mut second = Counter {
        id: 2,
        ..Default::default()
    };
    let mut third = Counter {
        id: 3,
        sequence: Some(-5),
        label: Some("explicit".into()),
        note: Some("kept as is".into()),
    };
    second.save(executor).await.expect("Failed to save the second counter");
    first.save(executor).await.expect("Failed to save the first counter");
    third.save(executor).await.expect("Failed to save the third counter");
    let (Some(a), Some(b)) = (first.sequence, second.sequence) else {
        panic!("The sequence must be generated on save");
    };
    assert!(a > b, "The first counter was saved last");
    assert_eq!(first.label.as_deref(), Some("n/a"));
    assert_eq!(first.note, None);
    assert_eq!(third.sequence, Some(-5));
    assert_eq!(third.label.as_deref(), Some("explicit"));

    let counters = Counter::find_all(executor, &Filter::new().order_by("id", Order::Asc))
        .await
        .expect("Failed to find the counters");
    assert_eq!(counters, [first.clone(), second.clone(), third.clone()]);

    // Update never applies defaults, NULL is written as is
    first.label = None;
    first.sequence = None;
    first.note = Some("updated".into());
    first.update(executor).await.expect("Failed to update the counter");
    let stored = Counter::find(executor, 1i64)
        .await
        .unwrap()
        .expect("The counter must exist");
    assert_eq!(stored.label, None);
    assert_eq!(stored.sequence, None);
    assert_eq!(stored.note.as_deref(), Some("updated"));
    assert_eq!(
        Counter::count(executor, &Filter::new().eq("label", None::<String>))
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        Counter::count(executor, &Filter::new().eq("remark", "updated"))
            .await
            .unwrap(),
        1
    );
}
