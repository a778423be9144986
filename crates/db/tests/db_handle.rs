//! Integration tests for the `Db` handle's retry/rebuild behavior against a
//! real database.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use leukoscan_db::{Db, RetryConfig};
use sqlx::PgPool;

fn fast_retry() -> RetryConfig {
    RetryConfig {
        base_delay: Duration::from_millis(1),
        ..Default::default()
    }
}

fn transient_error() -> sqlx::Error {
    sqlx::Error::Protocol("prepared statement \"s1\" does not exist".into())
}

/// A successful operation passes its value through with no reconnect.
#[sqlx::test(migrations = "./migrations")]
async fn run_passes_success_through(pool: PgPool) {
    let db = Db::from_pool(pool, "postgres://unused").with_retry_config(fast_retry());

    let result = db
        .run(|pool| async move {
            sqlx::query_scalar::<_, i64>("SELECT 41 + 1")
                .fetch_one(&pool)
                .await
        })
        .await
        .expect("no hard error");

    assert_eq!(result, Some(42));
    assert_eq!(db.reconnect_count(), 0);
}

/// Exhausting the budget on a transient error yields `None` and exactly one
/// pool rebuild attempt; the handle stays usable afterwards.
#[sqlx::test(migrations = "./migrations")]
async fn run_exhaustion_triggers_one_reconnect(pool: PgPool) {
    // The bogus URL makes the rebuild fail, which must keep the existing
    // pool alive rather than leaving the handle dead.
    let db = Db::from_pool(pool, "postgres://127.0.0.1:1/nowhere")
        .with_retry_config(fast_retry());

    let calls = AtomicU32::new(0);
    let result = db
        .run(|_pool| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<i64, _>(transient_error())
        })
        .await
        .expect("exhaustion is not a hard error");

    assert_eq!(result, None);
    assert_eq!(calls.load(Ordering::SeqCst), 4, "initial call + 3 retries");
    assert_eq!(db.reconnect_count(), 1, "exactly one reconnect");

    // The handle still answers queries on the retained pool.
    let result = db
        .run(|pool| async move {
            sqlx::query_scalar::<_, i64>("SELECT 7").fetch_one(&pool).await
        })
        .await
        .expect("no hard error");
    assert_eq!(result, Some(7));
}

/// A non-transient error propagates immediately with no reconnect.
#[sqlx::test(migrations = "./migrations")]
async fn run_propagates_hard_errors(pool: PgPool) {
    let db = Db::from_pool(pool, "postgres://unused").with_retry_config(fast_retry());

    let err = db
        .run(|pool| async move {
            // A constraint violation is permanent, never retried.
            sqlx::query("INSERT INTO prediction_logs (user_id, image_count) VALUES (999999, 0)")
                .execute(&pool)
                .await
        })
        .await
        .expect_err("foreign key violation must propagate");

    assert!(matches!(err, sqlx::Error::Database(_)));
    assert_eq!(db.reconnect_count(), 0);
}
