use entity::{
    sea_orm_active_enums::{CreditEventKind, EnrollmentType},
    students,
};
use sea_orm::{ActiveModelTrait, Set};
use studiodesk::{models::organizations::CreateOrganizationRequest, ApiError};

use crate::common::setup;

#[tokio::test]
async fn test_new_student_starts_empty_and_renewed() {
    let app = setup().await;
    let student = app.student("Ana Souza", EnrollmentType::Particular).await;

    let balance = app
        .state
        .credits_service
        .get_balance(app.org_id, student.id)
        .await
        .unwrap();

    assert_eq!(balance.credits, 0);
    assert_eq!(balance.last_credit_renewal, Some(app.state.config.studio.today()));
    assert!(!balance.renewed_this_month);
}

#[tokio::test]
async fn test_monthly_renewal_is_idempotent() {
    let app = setup().await;
    let student = app.student_with_credits("Bruno Lima", 3).await;

    // Pretend the last renewal happened last month
    let stale = app.state.config.studio.today() - time::Duration::days(40);
    let mut active: students::ActiveModel = app
        .state
        .student_service
        .get_student(app.org_id, student.id)
        .await
        .unwrap()
        .into();
    active.last_credit_renewal = Set(Some(stale));
    active.update(&app.state.db).await.unwrap();

    let first = app
        .state
        .credits_service
        .get_balance(app.org_id, student.id)
        .await
        .unwrap();
    assert!(first.renewed_this_month);
    assert_eq!(first.credits, 0);
    assert_eq!(first.last_credit_renewal, Some(app.state.config.studio.today()));

    let second = app
        .state
        .credits_service
        .get_balance(app.org_id, student.id)
        .await
        .unwrap();
    assert!(!second.renewed_this_month);
    assert_eq!(
        (second.credits, second.last_credit_renewal),
        (first.credits, first.last_credit_renewal)
    );

    let history = app
        .state
        .credits_service
        .history(app.org_id, student.id, None)
        .await
        .unwrap();
    let resets: Vec<_> = history
        .iter()
        .filter(|e| e.kind == CreditEventKind::MonthlyReset)
        .collect();
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0].amount, -3);
}

#[tokio::test]
async fn test_consume_then_return_round_trip() {
    let app = setup().await;

    for start in [1, 2, 5] {
        let student = app
            .student_with_credits(&format!("Aluno {}", start), start)
            .await;

        app.state
            .credits_service
            .consume_credit(app.org_id, student.id, None)
            .await
            .unwrap();
        app.state
            .credits_service
            .return_credit(app.org_id, student.id, 1, None)
            .await
            .unwrap();

        assert_eq!(app.credits(student.id).await, start);
    }
}

#[tokio::test]
async fn test_consume_without_credits_fails() {
    let app = setup().await;
    let student = app.student("Carla Dias", EnrollmentType::Particular).await;

    let result = app
        .state
        .credits_service
        .consume_credit(app.org_id, student.id, None)
        .await;

    assert!(matches!(
        result,
        Err(ApiError::InsufficientCredits { student_id }) if student_id == student.id
    ));
    assert_eq!(app.credits(student.id).await, 0);
}

#[tokio::test]
async fn test_manual_adjustment_never_goes_negative() {
    let app = setup().await;
    let student = app.student_with_credits("Diego Rocha", 1).await;

    let result = app
        .state
        .credits_service
        .adjust_manual(app.org_id, student.id, -2, "Correction", Some(app.owner_id))
        .await;
    assert!(matches!(result, Err(ApiError::InsufficientCredits { .. })));
    assert_eq!(app.credits(student.id).await, 1);

    let balance = app
        .state
        .credits_service
        .adjust_manual(app.org_id, student.id, -1, "Correction", Some(app.owner_id))
        .await
        .unwrap();
    assert_eq!(balance.credits, 0);
}

#[tokio::test]
async fn test_manual_adjustment_requires_reason_and_amount() {
    let app = setup().await;
    let student = app.student("Elisa Prado", EnrollmentType::Particular).await;

    let blank_reason = app
        .state
        .credits_service
        .adjust_manual(app.org_id, student.id, 1, "   ", None)
        .await;
    assert!(matches!(blank_reason, Err(ApiError::BadRequest(_))));

    let zero = app
        .state
        .credits_service
        .adjust_manual(app.org_id, student.id, 0, "Nothing", None)
        .await;
    assert!(matches!(zero, Err(ApiError::BadRequest(_))));
}

#[tokio::test]
async fn test_history_records_each_movement() {
    let app = setup().await;
    let student = app.student_with_credits("Fabio Melo", 2).await;

    app.state
        .credits_service
        .consume_credit(app.org_id, student.id, None)
        .await
        .unwrap();

    let history = app
        .state
        .credits_service
        .history(app.org_id, student.id, Some(10))
        .await
        .unwrap();

    assert_eq!(history.len(), 2);
    let adjustment = history
        .iter()
        .find(|e| e.kind == CreditEventKind::ManualAdjustment)
        .unwrap();
    assert_eq!(adjustment.amount, 2);
    assert_eq!(adjustment.balance_after, 2);
    assert_eq!(adjustment.reason.as_deref(), Some("Test seed"));

    let consumed = history
        .iter()
        .find(|e| e.kind == CreditEventKind::Consumed)
        .unwrap();
    assert_eq!(consumed.amount, -1);
    assert_eq!(consumed.balance_after, 1);
}

#[tokio::test]
async fn test_balance_is_tenant_scoped() {
    let app = setup().await;
    let student = app.student_with_credits("Gabi Nunes", 1).await;

    let other_org = app
        .state
        .organization_service
        .create_organization(
            uuid::Uuid::new_v4(),
            CreateOrganizationRequest {
                name: "Outro Studio".to_string(),
                class_capacity: None,
            },
        )
        .await
        .unwrap();

    let result = app
        .state
        .credits_service
        .get_balance(other_org.id, student.id)
        .await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    let consume = app
        .state
        .credits_service
        .consume_credit(other_org.id, student.id, None)
        .await;
    assert!(matches!(consume, Err(ApiError::NotFound(_))));
    assert_eq!(app.credits(student.id).await, 1);
}
