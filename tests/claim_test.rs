//! Concurrent dispatchers claiming from the pending queue.
//!
//! Unlike the accessor tests this one commits its rows, then removes them.

mod helpers;

use futures::future::join_all;
use job_tracker::{
    db::{jobs, users},
    models::job::{JobStatus, NewJob},
};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

const JOBS: usize = 8;
const DISPATCHERS: usize = 6;

async fn claim_one(pool: &PgPool, dispatcher: usize) -> Option<Uuid> {
    let mut tx = pool.begin().await.expect("Failed to begin transaction");
    let arn = format!("task-{dispatcher}");
    let claimed = jobs::claim_next_pending(&mut tx, Some(&arn))
        .await
        .expect("Claim failed");
    tx.commit().await.expect("Failed to commit claim");

    claimed.map(|job| job.id)
}

#[tokio::test]
#[ignore] // Run with: cargo test --test claim_test -- --ignored
async fn test_concurrent_claims_hand_out_each_job_once() {
    let _guard = helpers::serial().await;
    let pool = helpers::test_pool().await;

    let mut tx = pool.begin().await.unwrap();
    let user = helpers::create_user(&mut tx).await;
    let mut created = HashSet::new();
    for i in 0..JOBS {
        let job = jobs::create(
            &mut tx,
            &NewJob::pending(user.id, "job-inputs", format!("claims/{i}.csv")),
        )
        .await
        .unwrap();
        created.insert(job.id);
    }
    tx.commit().await.unwrap();

    let mut claimed = Vec::new();
    for _round in 0..JOBS * 2 {
        let results = join_all((0..DISPATCHERS).map(|d| claim_one(&pool, d))).await;
        claimed.extend(results.into_iter().flatten());
        if created.iter().all(|id| claimed.contains(id)) {
            break;
        }
    }

    let ours: Vec<Uuid> = claimed.into_iter().filter(|id| created.contains(id)).collect();
    let unique: HashSet<Uuid> = ours.iter().copied().collect();
    assert_eq!(unique.len(), ours.len(), "a job was claimed twice");
    assert_eq!(unique, created, "every job should be claimed exactly once");

    let mut conn = pool.acquire().await.unwrap();
    for id in &created {
        let job = jobs::get_by_id(&mut conn, *id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.fargate_task_arn.is_some());
    }

    sqlx::query("DELETE FROM jobs WHERE user_id = $1")
        .bind(user.id)
        .execute(&mut *conn)
        .await
        .unwrap();
    assert!(users::delete(&mut conn, user.id).await.unwrap());
}
