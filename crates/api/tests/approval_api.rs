//! HTTP-level integration tests for the submission and approval workflow.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, body_text, build_test_app, complete_profile, get_auth, import_coffee_shop,
    post_json_auth, promote_to_admin, register_and_login, stored_approval_token, submit_story,
};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Submission gates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn submission_requires_completed_profile(pool: PgPool) {
    let app = build_test_app(pool);
    let (_, token) = register_and_login(&app, "dana").await;
    let story_id = import_coffee_shop(&app, &token).await;

    let response = post_json_auth(
        &app,
        &format!("/api/v1/stories/{story_id}/submit"),
        json!({ "consent": { "transfer": true, "contact": true } }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("creator profile"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submission_requires_full_consent(pool: PgPool) {
    let app = build_test_app(pool);
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;

    for consent in [
        json!({ "transfer": false, "contact": true }),
        json!({ "transfer": true, "contact": false }),
    ] {
        let response = post_json_auth(
            &app,
            &format!("/api/v1/stories/{story_id}/submit"),
            json!({ "consent": consent }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn suspended_profile_cannot_submit(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (user_id, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;

    sqlx::query("UPDATE creator_profiles SET is_suspended = TRUE WHERE user_id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let response = post_json_auth(
        &app,
        &format!("/api/v1/stories/{story_id}/submit"),
        json!({ "consent": { "transfer": true, "contact": true } }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submission_creates_pending_version_and_token(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;

    let response = post_json_auth(
        &app,
        &format!("/api/v1/stories/{story_id}/submit"),
        json!({ "consent": { "transfer": true, "contact": true } }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["version"]["version_number"], 1);
    assert_eq!(body["data"]["version"]["status"], "pending");
    // No SMTP configured in tests: success, but not notified.
    assert_eq!(body["data"]["notified"], false);

    // Token and expiry stamped on the story; ownership now pending transfer.
    let token_value = stored_approval_token(&pool, story_id).await;
    assert_eq!(token_value.len(), 64);
    let row: (String,) = sqlx::query_as("SELECT ownership_status FROM stories WHERE id = $1")
        .bind(story_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.0, "pending_transfer");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn version_numbers_increase_without_gaps(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;

    let first = submit_story(&app, &token, story_id).await;

    // Reject the first submission, then resubmit.
    register_and_login(&app, "admin-reviewer").await;
    let admin_token = promote_to_admin(&app, &pool, "admin-reviewer").await;
    let response = post_json_auth(
        &app,
        &format!("/api/v1/approvals/{first}"),
        json!({ "decision": "reject" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json_auth(
        &app,
        &format!("/api/v1/stories/{story_id}/submit"),
        json!({ "consent": { "transfer": true, "contact": true } }),
        &token,
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["version"]["version_number"], 2);
}

// ---------------------------------------------------------------------------
// Decision: admin session path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_approval_publishes_and_transfers_ownership(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;
    let version_id = submit_story(&app, &token, story_id).await;

    register_and_login(&app, "robin").await;
    let admin_token = promote_to_admin(&app, &pool, "robin").await;

    let response = post_json_auth(
        &app,
        &format!("/api/v1/approvals/{version_id}"),
        json!({ "decision": "approve" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["version"]["status"], "approved");
    assert_eq!(body["data"]["story"]["visibility"], "public");
    assert_eq!(body["data"]["story"]["ownership_status"], "platform_owned");
    assert_eq!(
        body["data"]["story"]["latest_version_id"].as_i64(),
        Some(version_id)
    );

    // The single-use token is cleared from the story.
    let row: (Option<String>,) =
        sqlx::query_as("SELECT approval_token FROM stories WHERE id = $1")
            .bind(story_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(row.0.is_none());

    // The story is now publicly fetchable by slug.
    let response = common::get(&app, "/api/v1/stories/slug/coffee-shop-dilemma").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn second_decision_conflicts_with_terminal_status(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;
    let version_id = submit_story(&app, &token, story_id).await;

    register_and_login(&app, "robin").await;
    let admin_token = promote_to_admin(&app, &pool, "robin").await;

    let response = post_json_auth(
        &app,
        &format!("/api/v1/approvals/{version_id}"),
        json!({ "decision": "approve" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Idempotency: deciding again conflicts and names the terminal status.
    let response = post_json_auth(
        &app,
        &format!("/api/v1/approvals/{version_id}"),
        json!({ "decision": "approve" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("approved"));

    // Flipping to reject after approval is equally refused.
    let response = post_json_auth(
        &app,
        &format!("/api/v1/approvals/{version_id}"),
        json!({ "decision": "reject" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rejection_returns_custody_without_publishing(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;
    let version_id = submit_story(&app, &token, story_id).await;

    register_and_login(&app, "robin").await;
    let admin_token = promote_to_admin(&app, &pool, "robin").await;

    let response = post_json_auth(
        &app,
        &format!("/api/v1/approvals/{version_id}"),
        json!({ "decision": "reject" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["version"]["status"], "rejected");
    assert_eq!(body["data"]["story"]["ownership_status"], "returned");
    // Approval-only side effects must not fire.
    assert_eq!(body["data"]["story"]["visibility"], "private");
    assert_eq!(body["data"]["avatars_activated"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn non_admin_session_without_token_is_forbidden(pool: PgPool) {
    let app = build_test_app(pool);
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;
    let version_id = submit_story(&app, &token, story_id).await;

    // The creator's own session does not authorize a decision.
    let response = post_json_auth(
        &app,
        &format!("/api/v1/approvals/{version_id}"),
        json!({ "decision": "approve" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Decision: token link path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn token_link_approval_flips_story_public(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;
    let version_id = submit_story(&app, &token, story_id).await;
    let approval_token = stored_approval_token(&pool, story_id).await;

    let response = common::get(
        &app,
        &format!("/api/v1/approvals/{version_id}?decision=approve&token={approval_token}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("approved and published"), "panel: {html}");

    let row: (String, String) =
        sqlx::query_as("SELECT visibility, ownership_status FROM stories WHERE id = $1")
            .bind(story_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(row.0, "public");
    assert_eq!(row.1, "platform_owned");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn wrong_token_is_rejected_without_state_change(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;
    let version_id = submit_story(&app, &token, story_id).await;

    let response = common::get(
        &app,
        &format!("/api/v1/approvals/{version_id}?decision=approve&token=not-the-token"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let row: (String,) = sqlx::query_as("SELECT status FROM story_versions WHERE id = $1")
        .bind(version_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.0, "pending");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn expired_token_is_rejected_on_the_decision_path(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;
    let version_id = submit_story(&app, &token, story_id).await;
    let approval_token = stored_approval_token(&pool, story_id).await;

    sqlx::query(
        "UPDATE stories SET approval_token_expires_at = now() - interval '1 day' WHERE id = $1",
    )
    .bind(story_id)
    .execute(&pool)
    .await
    .unwrap();

    let response = common::get(
        &app,
        &format!("/api/v1/approvals/{version_id}?decision=approve&token={approval_token}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let row: (String,) = sqlx::query_as("SELECT status FROM story_versions WHERE id = $1")
        .bind(version_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.0, "pending");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn approval_activates_referencing_avatars(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (user_id, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;

    sqlx::query("INSERT INTO avatars (story_id, user_id, name) VALUES ($1, $2, 'Junia')")
        .bind(story_id)
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let version_id = submit_story(&app, &token, story_id).await;
    let approval_token = stored_approval_token(&pool, story_id).await;

    let response = common::get(
        &app,
        &format!("/api/v1/approvals/{version_id}?decision=approve&token={approval_token}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let row: (bool,) = sqlx::query_as("SELECT is_playable FROM avatars WHERE story_id = $1")
        .bind(story_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(row.0, "avatar should be playable after approval");
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn preview_is_token_gated(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;
    let version_id = submit_story(&app, &token, story_id).await;
    let approval_token = stored_approval_token(&pool, story_id).await;

    let response = common::get(&app, &format!("/api/v1/approvals/{version_id}/preview")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = common::get(
        &app,
        &format!("/api/v1/approvals/{version_id}/preview?token={approval_token}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["version"]["status"], "pending");
    let snapshot_nodes = body["data"]["version"]["snapshot"]["nodes"].as_array().unwrap();
    assert_eq!(snapshot_nodes.len(), 2);
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn lifecycle_is_fully_audited(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = register_and_login(&app, "dana").await;
    complete_profile(&app, &token).await;
    let story_id = import_coffee_shop(&app, &token).await;
    let version_id = submit_story(&app, &token, story_id).await;

    register_and_login(&app, "robin").await;
    let admin_token = promote_to_admin(&app, &pool, "robin").await;
    let response = post_json_auth(
        &app,
        &format!("/api/v1/approvals/{version_id}"),
        json!({ "decision": "approve" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(
        &app,
        &format!("/api/v1/stories/{story_id}/audit-log"),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let actions: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"story_created"));
    assert!(actions.contains(&"graph_replaced"));
    assert!(actions.contains(&"submitted_for_approval"));
    assert!(actions.contains(&"approved"));
}
