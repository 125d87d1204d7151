//! Integration tests for the job state machine against a real database.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use wayfinder_core::job::JobStateMachine;
use wayfinder_core::job::error::{JobErrorCode, JobFailure};
use wayfinder_db::models::{JobStage, JobStatus, JobType};
use wayfinder_db::queries::jobs as jobs_db;
use wayfinder_db::queries::trips::{self, NewTrip};

use wayfinder_test_utils::{create_test_db, drop_test_db};

async fn create_claimed_job(pool: &PgPool) -> Uuid {
    let trip = trips::insert_trip(
        pool,
        &NewTrip {
            user_id: "u1".to_owned(),
            origin: "SFO".to_owned(),
            destination: "Paris".to_owned(),
            start_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2030, 1, 5).unwrap(),
            flexible_days: 0,
            budget_total: 1000.0,
            currency: "USD".to_owned(),
            travelers: 1,
            preferences: serde_json::json!({}),
        },
    )
    .await
    .expect("insert trip");

    jobs_db::insert_job(pool, trip.id, "u1", JobType::Plan, None)
        .await
        .expect("insert job");
    let claimed = jobs_db::claim_next_queued(pool)
        .await
        .expect("claim")
        .expect("job available");
    claimed.id
}

#[tokio::test]
async fn advance_walks_the_success_path() {
    let (pool, db_name) = create_test_db().await;
    let job_id = create_claimed_job(&pool).await;

    let path = [
        (JobStage::Starting, JobStage::FetchCandidates),
        (JobStage::FetchCandidates, JobStage::Generate),
        (JobStage::Generate, JobStage::Validate),
        (JobStage::Validate, JobStage::Persist),
    ];
    for (from, to) in path {
        JobStateMachine::advance(&pool, job_id, from, to, "advancing")
            .await
            .expect("transition should succeed");
    }

    JobStateMachine::complete(
        &pool,
        job_id,
        JobStage::Persist,
        &serde_json::json!({"ok": true}),
        "done",
    )
    .await
    .expect("complete should succeed");

    let job = jobs_db::get_job(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.progress, 100);
    assert!(job.error_code.is_none());

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn invalid_edge_is_rejected_without_touching_the_row() {
    let (pool, db_name) = create_test_db().await;
    let job_id = create_claimed_job(&pool).await;

    let err = JobStateMachine::advance(
        &pool,
        job_id,
        JobStage::Starting,
        JobStage::Complete,
        "skipping ahead",
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("invalid stage transition"));

    let job = jobs_db::get_job(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.stage, JobStage::Starting);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn stale_from_stage_reports_lock_failure() {
    let (pool, db_name) = create_test_db().await;
    let job_id = create_claimed_job(&pool).await;

    JobStateMachine::advance(
        &pool,
        job_id,
        JobStage::Starting,
        JobStage::FetchCandidates,
        "advancing",
    )
    .await
    .unwrap();

    let err = JobStateMachine::advance(
        &pool,
        job_id,
        JobStage::Starting,
        JobStage::FetchCandidates,
        "advancing again",
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("optimistic lock failed"));

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn fail_is_terminal_and_idempotent_noop_afterwards() {
    let (pool, db_name) = create_test_db().await;
    let job_id = create_claimed_job(&pool).await;

    let failure = JobFailure::new(JobErrorCode::WorkerException);
    JobStateMachine::fail(&pool, job_id, &failure).await.unwrap();

    let job = jobs_db::get_job(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.stage, JobStage::Failed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.error_code.as_deref(), Some("INTERNAL.WORKER_EXCEPTION"));

    // Failing again (or advancing) leaves the terminal row alone.
    JobStateMachine::fail(&pool, job_id, &failure).await.unwrap();
    let again = jobs_db::get_job(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(again.updated_at, job.updated_at);

    drop_test_db(&db_name).await;
}
