mod blog;
mod defaults;
mod filters;
mod row_count;

pub use blog::{Blog, Comment, User, next_id, now};
use blog::blog;
use defaults::defaults;
use filters::filters;
use keel::Executor;
use log::LevelFilter;
use row_count::row_count;
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Exercise every entity operation through `executor`.
pub async fn execute_tests<E: Executor>(executor: &E) {
    blog(executor).await;
    defaults(executor).await;
    filters(executor).await;
    row_count(executor).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
