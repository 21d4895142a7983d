use keel::{Entity, Executor, Filter, Order, Value};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Entity, Debug, Clone, PartialEq)]
#[keel(table = "articles")]
pub struct Article {
    #[keel(primary_key)]
    pub id: i64,
    #[keel(column_type = "varchar(20)")]
    pub category: String,
    pub score: i64,
    pub pinned: bool,
    #[keel(column_type = "varchar(50)")]
    pub author: Option<String>,
    #[keel(ignore)]
    pub cached: Option<String>,
}

fn ids(articles: &[Article]) -> Vec<i64> {
    articles.iter().map(|a| a.id).collect()
}

pub async fn filters<E: Executor>(executor: &E) {
    let _lock = MUTEX.lock().await;

    let result = Article::drop_table(executor, true).await;
    assert!(result.is_ok(), "Failed to Article::drop_table: {:?}", result.unwrap_err());
    let result = Article::create_table(executor, false).await;
    assert!(result.is_ok(), "Failed to Article::create_table: {:?}", result.unwrap_err());

    for id in 1..=10i64 {
        let mut article = Article {
            id,
            category: if id % 2 == 0 { "rust" } else { "sql" }.into(),
            score: id * 10,
            pinned: id % 3 == 0,
            author: (id % 4 != 0).then(|| "ann".into()),
            cached: Some("not stored".into()),
        };
        article.save(executor).await.expect("Failed to save an article");
    }

    // Everything
    let all = Article::find_all(executor, &Filter::new().order_by("id", Order::Asc))
        .await
        .unwrap();
    assert_eq!(ids(&all), (1..=10).collect::<Vec<_>>());
    assert!(all.iter().all(|a| a.cached.is_none()));
    assert_eq!(Article::count(executor, &Filter::new()).await.unwrap(), 10);

    // Equality
    let rust = Filter::new().eq("category", "rust");
    let found = Article::find_all(executor, &rust).await.unwrap();
    assert_eq!(found.len(), 5);
    assert!(found.iter().all(|a| a.category == "rust"));
    assert_eq!(
        Article::count(executor, &rust).await.unwrap(),
        found.len() as i64
    );
    let found = Article::find_all(executor, &rust.clone().eq("pinned", true))
        .await
        .unwrap();
    assert_eq!(ids(&found), [6]);
    let found = Article::find_all(executor, &Filter::new().eq("score", 70i64))
        .await
        .unwrap();
    assert_eq!(ids(&found), [7]);

    // Ordering and limits
    let found = Article::find_all(
        executor,
        &Filter::new().order_by("score", Order::Desc).limit(3),
    )
    .await
    .unwrap();
    assert_eq!(ids(&found), [10, 9, 8]);
    let page = Filter::new().order_by("id", Order::Asc).limit(3).offset(3);
    assert_eq!(ids(&Article::find_all(executor, &page).await.unwrap()), [4, 5, 6]);
    assert_eq!(Article::count(executor, &page).await.unwrap(), 10);
    let found = Article::find_all(
        executor,
        &rust
            .clone()
            .order_by("pinned", Order::Desc)
            .order_by("id", Order::Desc),
    )
    .await
    .unwrap();
    assert_eq!(ids(&found), [6, 10, 8, 4, 2]);

    // NULL matches with IS NULL
    let found = Article::find_all(
        executor,
        &Filter::new()
            .eq("author", Value::Null)
            .order_by("id", Order::Asc),
    )
    .await
    .unwrap();
    assert_eq!(ids(&found), [4, 8]);
    assert_eq!(
        Article::count(executor, &Filter::new().eq("author", "ann"))
            .await
            .unwrap(),
        8
    );

    // Unknown columns are rejected before reaching the database
    let result = Article::find_all(executor, &Filter::new().eq("title", "x")).await;
    assert!(result.is_err());
}
