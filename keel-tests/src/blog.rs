use keel::{Entity, Executor, Filter, Order};
use std::sync::LazyLock;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// 50 characters: milliseconds since the epoch, a random uuid and a padding suffix.
/// Ids generated later sort after the earlier ones.
pub fn next_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("{:015}{}000", millis, Uuid::new_v4().simple())
}

/// Seconds since the epoch.
pub fn now() -> f64 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1e9
}

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[keel(table = "users")]
pub struct User {
    #[keel(primary_key, column_type = "varchar(50)", default_with = next_id)]
    pub id: Option<String>,
    #[keel(column_type = "varchar(50)")]
    pub email: String,
    #[keel(column_type = "varchar(50)")]
    pub passwd: String,
    #[keel(default = false)]
    pub admin: Option<bool>,
    #[keel(column_type = "varchar(50)")]
    pub name: String,
    #[keel(column_type = "varchar(500)")]
    pub image: String,
    #[keel(default_with = now)]
    pub created_at: Option<f64>,
}

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[keel(table = "blogs")]
pub struct Blog {
    #[keel(primary_key, column_type = "varchar(50)", default_with = next_id)]
    pub id: Option<String>,
    #[keel(column_type = "varchar(50)")]
    pub user_id: String,
    #[keel(column_type = "varchar(50)")]
    pub user_name: String,
    #[keel(column_type = "varchar(500)")]
    pub user_image: String,
    #[keel(column_type = "varchar(50)")]
    pub name: String,
    #[keel(column_type = "varchar(200)")]
    pub summary: String,
    #[keel(column_type = "text")]
    pub content: String,
    #[keel(default_with = now)]
    pub created_at: Option<f64>,
}

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[keel(table = "comments")]
pub struct Comment {
    #[keel(primary_key, column_type = "varchar(50)", default_with = next_id)]
    pub id: Option<String>,
    #[keel(column_type = "varchar(50)")]
    pub blog_id: String,
    #[keel(column_type = "varchar(50)")]
    pub user_id: String,
    #[keel(column_type = "varchar(50)")]
    pub user_name: String,
    #[keel(column_type = "varchar(500)")]
    pub user_image: String,
    #[keel(column_type = "text")]
    pub content: String,
    #[keel(default_with = now)]
    pub created_at: Option<f64>,
}

pub async fn blog<E: Executor>(executor: &E) {
    let _lock = MUTEX.lock().await;

    // Cleanup
    let result = Comment::drop_table(executor, true).await;
    assert!(result.is_ok(), "Failed to Comment::drop_table: {:?}", result.unwrap_err());
    let result = Blog::drop_table(executor, true).await;
    assert!(result.is_ok(), "Failed to Blog::drop_table: {:?}", result.unwrap_err());
    let result = User::drop_table(executor, true).await;
    assert!(result.is_ok(), "Failed to User::drop_table: {:?}", result.unwrap_err());

    // Setup
    let result = User::create_table(executor, false).await;
    assert!(result.is_ok(), "Failed to User::create_table: {:?}", result.unwrap_err());
    let result = Blog::create_table(executor, false).await;
    assert!(result.is_ok(), "Failed to Blog::create_table: {:?}", result.unwrap_err());
    let result = Comment::create_table(executor, true).await;
    assert!(result.is_ok(), "Failed to Comment::create_table: {:?}", result.unwrap_err());

    // Save a user, the defaults are resolved and stored back
    let mut user = User {
        email: "test@example.com".into(),
        passwd: "1234567890".into(),
        name: "Test".into(),
        image: "about:blank".into(),
        ..Default::default()
    };
    let result = user.save(executor).await;
    assert!(result.is_ok(), "Failed to save the user: {:?}", result.unwrap_err());
    let user_id = user.id.clone().expect("The id must be generated on save");
    assert_eq!(user_id.len(), 50);
    assert_eq!(user.admin, Some(false));
    assert!(user.created_at.is_some_and(|v| v > 0.0));

    // Find
    let found = User::find(executor, user_id.clone())
        .await
        .expect("Failed to find the user");
    assert_eq!(found.as_ref(), Some(&user));
    let missing = User::find(executor, "001234567890123").await;
    assert!(matches!(missing, Ok(None)), "Absent rows are not an error");
    assert_eq!(User::count(executor, &Filter::new()).await.unwrap(), 1);

    // Blogs
    for (name, summary) in [
        ("Learn Rust", "Ownership and borrowing"),
        ("Learn SQL", "Selects and joins"),
        ("Learn Async", "Futures and executors"),
    ] {
        let mut blog = Blog {
            user_id: user_id.clone(),
            user_name: user.name.clone(),
            user_image: user.image.clone(),
            name: name.into(),
            summary: summary.into(),
            content: format!("{}: {}.", name, summary),
            ..Default::default()
        };
        let result = blog.save(executor).await;
        assert!(result.is_ok(), "Failed to save a blog: {:?}", result.unwrap_err());
    }
    let by_user = Filter::new().eq("user_id", user_id.clone());
    assert_eq!(Blog::count(executor, &by_user).await.unwrap(), 3);
    let blogs = Blog::find_all(executor, &by_user.clone().order_by("name", Order::Asc))
        .await
        .expect("Failed to find the blogs");
    assert_eq!(
        blogs.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(),
        ["Learn Async", "Learn Rust", "Learn SQL"]
    );
    assert!(blogs.iter().all(|b| b.id.as_ref().is_some_and(|id| id.len() == 50)));

    // Update, the stored row reflects the new values
    let mut blog = blogs[1].clone();
    blog.summary = "Lifetimes and traits".into();
    blog.content = "Updated".into();
    let result = blog.update(executor).await;
    assert!(result.is_ok(), "Failed to update the blog: {:?}", result.unwrap_err());
    let blog_id = blog.id.clone().unwrap();
    let updated = Blog::find(executor, blog_id.clone())
        .await
        .unwrap()
        .expect("The updated blog must exist");
    assert_eq!(updated, blog);

    // Comments
    for content in ["First", "Second"] {
        let mut comment = Comment {
            blog_id: blog_id.clone(),
            user_id: user_id.clone(),
            user_name: user.name.clone(),
            user_image: user.image.clone(),
            content: content.into(),
            ..Default::default()
        };
        comment.save(executor).await.expect("Failed to save a comment");
    }
    let comments = Comment::find_all(
        executor,
        &Filter::new()
            .eq("blog_id", blog_id.clone())
            .order_by("created_at", Order::Desc)
            .order_by("content", Order::Desc),
    )
    .await
    .unwrap();
    assert_eq!(comments.len(), 2);
    assert!(comments.iter().all(|c| c.user_id == user_id));

    // Remove
    for comment in &comments {
        comment.remove(executor).await.expect("Failed to remove a comment");
    }
    let result = blog.remove(executor).await;
    assert!(result.is_ok(), "Failed to remove the blog: {:?}", result.unwrap_err());
    assert!(Blog::find(executor, blog_id.clone()).await.unwrap().is_none());
    assert_eq!(Blog::count(executor, &by_user).await.unwrap(), 2);
    assert_eq!(
        Comment::count(executor, &Filter::new().eq("blog_id", blog_id))
            .await
            .unwrap(),
        0
    );
}
