use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use studiodesk::create_router;
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{setup, TestApp};

fn router(app: &TestApp) -> Router {
    create_router(app.state.clone())
}

fn bearer(app: &TestApp, user_id: Uuid) -> String {
    let token = app
        .state
        .jwt_service
        .generate_token(user_id, None)
        .unwrap();
    format!("Bearer {}", token)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = setup().await;
    let response = router(&app)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = body_json(response).await;
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_missing_token_is_not_authenticated() {
    let app = setup().await;
    let response = router(&app)
        .oneshot(Request::get("/api/v1/students").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_AUTHENTICATED");
}

#[tokio::test]
async fn test_member_creates_and_lists_students() {
    let app = setup().await;
    let auth = bearer(&app, app.owner_id);

    let create = Request::post("/api/v1/students")
        .header("authorization", &auth)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "fullName": "Yara Campos",
                "enrollmentType": "Wellhub",
                "birthDate": "1990-03-14"
            })
            .to_string(),
        ))
        .unwrap();
    let response = router(&app).oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["repositionCredits"], 0);
    assert_eq!(body["data"]["enrollmentType"], "Wellhub");

    let list = Request::get("/api/v1/students")
        .header("authorization", &auth)
        .body(Body::empty())
        .unwrap();
    let response = router(&app).oneshot(list).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["fullName"], "Yara Campos");
}

#[tokio::test]
async fn test_non_member_is_forbidden() {
    let app = setup().await;
    let stranger = bearer(&app, Uuid::new_v4());

    let request = Request::get("/api/v1/organization")
        .header("authorization", &stranger)
        .header("x-organization-id", app.org_id.to_string())
        .body(Body::empty())
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_new_user_creates_organization() {
    let app = setup().await;
    let user_id = Uuid::new_v4();
    let auth = bearer(&app, user_id);

    let request = Request::post("/api/v1/organizations")
        .header("authorization", &auth)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": "Studio Norte", "classCapacity": 6 }).to_string()))
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["classCapacity"], 6);
    assert_eq!(body["data"]["role"], "owner");

    let request = Request::get("/api/v1/organization")
        .header("authorization", &auth)
        .body(Body::empty())
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Studio Norte");
}

#[tokio::test]
async fn test_invalid_body_uses_error_envelope() {
    let app = setup().await;
    let auth = bearer(&app, app.owner_id);

    let request = Request::post("/api/v1/students")
        .header("authorization", &auth)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "fullName": "" , "enrollmentType": "Particular" }).to_string()))
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_insufficient_credits_maps_to_unprocessable() {
    let app = setup().await;
    let auth = bearer(&app, app.owner_id);
    let student = app
        .student("Zeca", entity::sea_orm_active_enums::EnrollmentType::Particular)
        .await;

    let request = Request::post("/api/v1/bookings/reposition-series")
        .header("authorization", &auth)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "studentId": student.id,
                "firstStartTime": "2099-01-05T10:00:00Z",
                "weeks": 2
            })
            .to_string(),
        ))
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();

    // Partial failures are reported in the body
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["booked"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["failure"]["code"], "INSUFFICIENT_CREDITS");
    assert_eq!(body["data"]["failure"]["week"], 1);
}

#[tokio::test]
async fn test_staff_cannot_adjust_credits() {
    let app = setup().await;
    let owner = bearer(&app, app.owner_id);
    let staff_id = Uuid::new_v4();

    let request = Request::post("/api/v1/organization/members")
        .header("authorization", &owner)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "userId": staff_id, "role": "staff" }).to_string(),
        ))
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let student = app
        .student("Alice Staff", entity::sea_orm_active_enums::EnrollmentType::Particular)
        .await;
    let request = Request::post(format!("/api/v1/students/{}/credits/adjust", student.id))
        .header("authorization", bearer(&app, staff_id))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "amount": 1, "reason": "Bonus" }).to_string()))
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.credits(student.id).await, 0);
}
