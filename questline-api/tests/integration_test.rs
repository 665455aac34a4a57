/// Integration tests for the Questline API
///
/// These tests verify the full system works end-to-end:
/// - Registration, login, and token refresh
/// - Habit and task lifecycle with completion awards
/// - Reward redemption and the overdraw guard
/// - Friendship request/response flow
/// - Progress aggregation
/// - Admin gating
///
/// They need a running Postgres pointed at by DATABASE_URL (plus a
/// JWT_SECRET of at least 32 chars), so they are ignored by default:
///
/// ```bash
/// cargo test -p questline-api -- --ignored
/// ```

mod common;

use axum::http::StatusCode;
use common::{json_request, send, TestContext, TEST_PASSWORD};
use questline_shared::db::store::Store;
use questline_shared::models::habit::HabitCompletion;
use questline_shared::models::user::User;
use serde_json::json;

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(&ctx.app, json_request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_register_login_flow() {
    let ctx = TestContext::new().await.unwrap();

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let email = format!("test-{suffix}@example.com");
    let username = format!("newbie_{}", &suffix[..8]);

    // Register
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "email": email,
                "username": username,
                "password": TEST_PASSWORD,
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["accessToken"].is_string());
    assert!(body["refreshToken"].is_string());
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["points"], 0);
    assert_eq!(body["user"]["coins"], 0);
    assert_eq!(body["user"]["level"], 1);
    assert_eq!(body["user"]["role"], "USER");
    assert!(body["user"]["passwordHash"].is_null());

    // Duplicate registration conflicts
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "email": email,
                "username": username,
                "password": TEST_PASSWORD,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // Login
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": TEST_PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let refresh_token = body["refreshToken"].as_str().unwrap().to_string();

    // Wrong password gets the same message as a wrong email
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": "wrong-password" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    // Refresh
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/auth/refresh",
            None,
            Some(json!({ "refreshToken": refresh_token })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["accessToken"].is_string());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_register_validation_details() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "email": "not-an-email",
                "username": "x",
                "password": "short",
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    let details = body["details"].as_array().unwrap();
    let fields: Vec<&str> = details
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"password"));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_authentication_required() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = send(&ctx.app, json_request("GET", "/v1/habits", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &ctx.app,
        json_request("GET", "/v1/habits", Some("not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reward catalog stays public
    let (status, _) = send(&ctx.app, json_request("GET", "/v1/rewards", None, None)).await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_habit_lifecycle_and_award() {
    let ctx = TestContext::new().await.unwrap();

    // Create
    let (status, habit) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/habits",
            Some(&ctx.token),
            Some(json!({ "title": "Morning run", "frequency": "DAILY" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let habit_id = habit["id"].as_str().unwrap().to_string();
    assert_eq!(habit["targetCount"], 1);
    assert_eq!(habit["isActive"], true);

    // Complete twice; habits are repeatable and each completion awards
    for _ in 0..2 {
        let (status, completion) = send(
            &ctx.app,
            json_request(
                "POST",
                &format!("/v1/habits/{habit_id}/complete"),
                Some(&ctx.token),
                Some(json!({ "note": "done" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(completion["habitId"], habit_id.as_str());
    }

    let (status, me) = send(
        &ctx.app,
        json_request("GET", "/v1/auth/me", Some(&ctx.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["points"], 20);
    assert_eq!(me["coins"], 10);

    // Detail view carries recent completions
    let (status, detail) = send(
        &ctx.app,
        json_request(
            "GET",
            &format!("/v1/habits/{habit_id}"),
            Some(&ctx.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["recentCompletions"].as_array().unwrap().len(), 2);

    // Delete, then the habit reads as gone
    let (status, _) = send(
        &ctx.app,
        json_request(
            "DELETE",
            &format!("/v1/habits/{habit_id}"),
            Some(&ctx.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &ctx.app,
        json_request(
            "GET",
            &format!("/v1/habits/{habit_id}"),
            Some(&ctx.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_failed_award_leaves_no_completion_behind() {
    let ctx = TestContext::new().await.unwrap();

    let (status, habit) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/habits",
            Some(&ctx.token),
            Some(json!({ "title": "Meditate", "frequency": "DAILY" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let habit_id = uuid::Uuid::parse_str(habit["id"].as_str().unwrap()).unwrap();

    // Replay the completion sequence with a credit that matches zero user
    // rows, the failure the ledger aborts on after inserting the evidence.
    let store = Store::new(ctx.db.clone());
    let mut uow = store.begin().await.unwrap();
    HabitCompletion::create(uow.conn(), habit_id, ctx.user.id, None)
        .await
        .unwrap();
    let credited = User::apply_award(uow.conn(), uuid::Uuid::new_v4(), 10, 5)
        .await
        .unwrap();
    assert!(!credited);
    uow.rollback().await.unwrap();

    // Neither the completion row nor any balance change is observable
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM habit_completions WHERE habit_id = $1")
            .bind(habit_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(count, 0);

    let user = User::find_by_id(&ctx.db, ctx.user.id).await.unwrap().unwrap();
    assert_eq!(user.points, 0);
    assert_eq!(user.coins, 0);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_task_completion_awards_once() {
    let ctx = TestContext::new().await.unwrap();

    let (status, task) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/tasks",
            Some(&ctx.token),
            Some(json!({ "title": "Ship release", "priority": "HIGH" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["status"], "PENDING");
    let task_id = task["id"].as_str().unwrap().to_string();

    // First transition into COMPLETED awards
    let (status, task) = send(
        &ctx.app,
        json_request(
            "PUT",
            &format!("/v1/tasks/{task_id}"),
            Some(&ctx.token),
            Some(json!({ "status": "COMPLETED" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "COMPLETED");
    assert!(task["completedAt"].is_string());

    // A repeated COMPLETED update is a no-op for the balances
    let (status, _) = send(
        &ctx.app,
        json_request(
            "PUT",
            &format!("/v1/tasks/{task_id}"),
            Some(&ctx.token),
            Some(json!({ "status": "COMPLETED" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, me) = send(
        &ctx.app,
        json_request("GET", "/v1/auth/me", Some(&ctx.token), None),
    )
    .await;
    assert_eq!(me["points"], 15);
    assert_eq!(me["coins"], 10);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_concurrent_task_completion_awards_once() {
    let ctx = TestContext::new().await.unwrap();

    let (status, task) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/tasks",
            Some(&ctx.token),
            Some(json!({ "title": "File taxes" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = task["id"].as_str().unwrap().to_string();

    let uri = format!("/v1/tasks/{task_id}");
    let body = json!({ "status": "COMPLETED" });
    let ((a, _), (b, _)) = tokio::join!(
        send(
            &ctx.app,
            json_request("PUT", &uri, Some(&ctx.token), Some(body.clone())),
        ),
        send(
            &ctx.app,
            json_request("PUT", &uri, Some(&ctx.token), Some(body.clone())),
        ),
    );

    // Both updates land; the race loser applies its fields without awarding
    assert_eq!(a, StatusCode::OK);
    assert_eq!(b, StatusCode::OK);

    let user = User::find_by_id(&ctx.db, ctx.user.id).await.unwrap().unwrap();
    assert_eq!(user.points, 15, "exactly one concurrent completion may award");
    assert_eq!(user.coins, 10);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_reward_redemption_and_overdraw_guard() {
    let ctx = TestContext::new().await.unwrap();
    let (_, admin_token) = ctx.create_admin().await.unwrap();

    // Admin stocks the catalog
    let (status, reward) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/admin/rewards",
            Some(&admin_token),
            Some(json!({ "name": "Movie night", "cost": 10 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reward_id = reward["id"].as_str().unwrap().to_string();

    // Broke user can't redeem
    let (status, body) = send(
        &ctx.app,
        json_request(
            "POST",
            &format!("/v1/rewards/{reward_id}/redeem"),
            Some(&ctx.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "insufficient balance");

    // Credit exactly one redemption's worth and spend it
    assert!(User::apply_award(&ctx.db, ctx.user.id, 0, 10).await.unwrap());

    let (status, redemption) = send(
        &ctx.app,
        json_request(
            "POST",
            &format!("/v1/rewards/{reward_id}/redeem"),
            Some(&ctx.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(redemption["rewardId"], reward_id.as_str());

    let (_, me) = send(
        &ctx.app,
        json_request("GET", "/v1/auth/me", Some(&ctx.token), None),
    )
    .await;
    assert_eq!(me["coins"], 0);

    // The failed attempt must not have left a redemption row behind
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM user_rewards WHERE user_id = $1")
            .bind(ctx.user.id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(count, 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_concurrent_redemption_single_winner() {
    let ctx = TestContext::new().await.unwrap();
    let (_, admin_token) = ctx.create_admin().await.unwrap();

    let (_, reward) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/admin/rewards",
            Some(&admin_token),
            Some(json!({ "name": "One-off", "cost": 10 })),
        ),
    )
    .await;
    let reward_id = reward["id"].as_str().unwrap().to_string();

    // Balance covers exactly one redemption
    assert!(User::apply_award(&ctx.db, ctx.user.id, 0, 10).await.unwrap());

    let uri = format!("/v1/rewards/{reward_id}/redeem");
    let ((a, _), (b, _)) = tokio::join!(
        send(&ctx.app, json_request("POST", &uri, Some(&ctx.token), None)),
        send(&ctx.app, json_request("POST", &uri, Some(&ctx.token), None)),
    );

    let successes = [a, b]
        .iter()
        .filter(|s| **s == StatusCode::CREATED)
        .count();
    assert_eq!(successes, 1, "exactly one concurrent redemption may win");

    let user = User::find_by_id(&ctx.db, ctx.user.id).await.unwrap().unwrap();
    assert_eq!(user.coins, 0);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_friendship_flow() {
    let ctx = TestContext::new().await.unwrap();
    let (receiver, receiver_token) = ctx.create_user().await.unwrap();

    // Self-request is rejected outright
    let (status, _) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/friends/request",
            Some(&ctx.token),
            Some(json!({ "receiverId": ctx.user.id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Send
    let (status, friendship) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/friends/request",
            Some(&ctx.token),
            Some(json!({ "receiverId": receiver.id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(friendship["status"], "PENDING");
    let friendship_id = friendship["id"].as_str().unwrap().to_string();

    // Duplicate conflicts, in both directions
    let (status, _) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/friends/request",
            Some(&ctx.token),
            Some(json!({ "receiverId": receiver.id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/friends/request",
            Some(&receiver_token),
            Some(json!({ "receiverId": ctx.user.id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Receiver sees the incoming request with the sender's profile
    let (status, requests) = send(
        &ctx.app,
        json_request("GET", "/v1/friends/requests", Some(&receiver_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let requests = requests.as_array().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0]["sender"]["username"],
        ctx.user.username.as_str()
    );

    // Only the receiver may respond
    let (status, _) = send(
        &ctx.app,
        json_request(
            "PUT",
            &format!("/v1/friends/{friendship_id}"),
            Some(&ctx.token),
            Some(json!({ "status": "ACCEPTED" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Accept
    let (status, friendship) = send(
        &ctx.app,
        json_request(
            "PUT",
            &format!("/v1/friends/{friendship_id}"),
            Some(&receiver_token),
            Some(json!({ "status": "ACCEPTED" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(friendship["status"], "ACCEPTED");

    // Both sides now list each other
    let (_, friends_of_sender) = send(
        &ctx.app,
        json_request("GET", "/v1/friends", Some(&ctx.token), None),
    )
    .await;
    assert_eq!(
        friends_of_sender[0]["username"],
        receiver.username.as_str()
    );

    let (_, friends_of_receiver) = send(
        &ctx.app,
        json_request("GET", "/v1/friends", Some(&receiver_token), None),
    )
    .await;
    assert_eq!(
        friends_of_receiver[0]["username"],
        ctx.user.username.as_str()
    );

    // Either participant may remove the friendship
    let (status, _) = send(
        &ctx.app,
        json_request(
            "DELETE",
            &format!("/v1/friends/{friendship_id}"),
            Some(&ctx.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, friends) = send(
        &ctx.app,
        json_request("GET", "/v1/friends", Some(&receiver_token), None),
    )
    .await;
    assert!(friends.as_array().unwrap().is_empty());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_progress_and_comparison() {
    let ctx = TestContext::new().await.unwrap();
    let (friend, friend_token) = ctx.create_user().await.unwrap();

    // One habit completion for the context user
    let (_, habit) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/habits",
            Some(&ctx.token),
            Some(json!({ "title": "Stretch", "frequency": "DAILY" })),
        ),
    )
    .await;
    let habit_id = habit["id"].as_str().unwrap();
    send(
        &ctx.app,
        json_request(
            "POST",
            &format!("/v1/habits/{habit_id}/complete"),
            Some(&ctx.token),
            None,
        ),
    )
    .await;

    // One completed task for the friend
    let (_, task) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/tasks",
            Some(&friend_token),
            Some(json!({ "title": "Read a chapter" })),
        ),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();
    send(
        &ctx.app,
        json_request(
            "PUT",
            &format!("/v1/tasks/{task_id}"),
            Some(&friend_token),
            Some(json!({ "status": "COMPLETED" })),
        ),
    )
    .await;

    let (status, progress) = send(
        &ctx.app,
        json_request("GET", "/v1/progress", Some(&ctx.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["habitsCompleted"], 1);
    assert_eq!(progress["tasksCompleted"], 0);
    assert_eq!(progress["points"], 10);

    let (status, comparison) = send(
        &ctx.app,
        json_request(
            "GET",
            &format!("/v1/friends/compare/{}", friend.id),
            Some(&ctx.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comparison["user"]["habitsCompleted"], 1);
    assert_eq!(comparison["friend"]["tasksCompleted"], 1);
    assert_eq!(comparison["friend"]["points"], 15);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_admin_gating() {
    let ctx = TestContext::new().await.unwrap();
    let (_, admin_token) = ctx.create_admin().await.unwrap();

    // Regular user is forbidden
    let (status, body) = send(
        &ctx.app,
        json_request("GET", "/v1/admin/stats", Some(&ctx.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    // Admin gets the counters
    let (status, stats) = send(
        &ctx.app,
        json_request("GET", "/v1/admin/stats", Some(&admin_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats["totalUsers"].as_i64().unwrap() >= 2);

    // And the paginated listing with metadata
    let (status, listing) = send(
        &ctx.app,
        json_request("GET", "/v1/admin/users?page=1&limit=1", Some(&admin_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["users"].as_array().unwrap().len(), 1);
    assert_eq!(listing["meta"]["limit"], 1);
    assert!(listing["meta"]["totalPages"].as_i64().unwrap() >= 2);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_ownership_isolation() {
    let ctx = TestContext::new().await.unwrap();
    let (_, other_token) = ctx.create_user().await.unwrap();

    let (_, habit) = send(
        &ctx.app,
        json_request(
            "POST",
            "/v1/habits",
            Some(&ctx.token),
            Some(json!({ "title": "Private habit", "frequency": "DAILY" })),
        ),
    )
    .await;
    let habit_id = habit["id"].as_str().unwrap();

    // Another user's habit reads as not found, not forbidden
    let (status, _) = send(
        &ctx.app,
        json_request(
            "GET",
            &format!("/v1/habits/{habit_id}"),
            Some(&other_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &ctx.app,
        json_request(
            "POST",
            &format!("/v1/habits/{habit_id}/complete"),
            Some(&other_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}
