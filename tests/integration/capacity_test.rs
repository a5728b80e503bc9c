use entity::sea_orm_active_enums::{AttendanceType, EnrollmentType};
use studiodesk::{
    models::{classes::AddAttendeeOutcome, organizations::UpdateOrganizationRequest},
    ApiError,
};

use crate::common::{assign, days_ahead, setup, TestApp};

/// Class at capacity 10: one Particular followed by nine Wellhub attendees
async fn full_class_with_partner_attendees(app: &TestApp) -> (uuid::Uuid, Vec<uuid::Uuid>) {
    let particular = app.student("Paula Reis", EnrollmentType::Particular).await;
    let mut attendees = vec![assign(particular.id, AttendanceType::Pontual)];
    let mut wellhub_ids = Vec::new();
    for i in 0..9 {
        let student = app
            .student(&format!("Wellhub {}", i), EnrollmentType::Wellhub)
            .await;
        wellhub_ids.push(student.id);
        attendees.push(assign(student.id, AttendanceType::Pontual));
    }

    let class = app.class_with(days_ahead(2), attendees).await.unwrap();
    assert_eq!(class.attendees.len(), 10);
    (class.class.id, wellhub_ids)
}

#[tokio::test]
async fn test_particular_student_displaces_first_partner_attendee() {
    let app = setup().await;
    let (class_id, wellhub_ids) = full_class_with_partner_attendees(&app).await;
    let joining = app.student("Rafael Particular", EnrollmentType::Particular).await;

    // First step only proposes the displacement
    let proposal = app
        .state
        .attendance_service
        .try_add_attendee(app.org_id, class_id, joining.id, AttendanceType::Pontual, false)
        .await
        .unwrap();
    match proposal {
        AddAttendeeOutcome::DisplacementRequired {
            candidate_student_id,
            ..
        } => assert_eq!(candidate_student_id, wellhub_ids[0]),
        other => panic!("expected a displacement proposal, got {:?}", other),
    }
    let unchanged = app.state.class_service.get_class(app.org_id, class_id).await.unwrap();
    assert_eq!(unchanged.attendees.len(), 10);
    assert!(unchanged.attendees.iter().all(|a| a.student_id != joining.id));

    // Confirmed: swap happens atomically
    let outcome = app
        .state
        .attendance_service
        .try_add_attendee(app.org_id, class_id, joining.id, AttendanceType::Pontual, true)
        .await
        .unwrap();
    match outcome {
        AddAttendeeOutcome::Displaced {
            removed_student_id,
            attendee,
        } => {
            assert_eq!(removed_student_id, wellhub_ids[0]);
            assert_eq!(attendee.student_id, joining.id);
        }
        other => panic!("expected a displacement, got {:?}", other),
    }

    let class = app.state.class_service.get_class(app.org_id, class_id).await.unwrap();
    assert_eq!(class.attendees.len(), 10);
    assert!(class.attendees.iter().any(|a| a.student_id == joining.id));
    assert!(class.attendees.iter().all(|a| a.student_id != wellhub_ids[0]));
}

#[tokio::test]
async fn test_full_class_of_private_students_refuses() {
    let app = setup().await;
    let mut attendees = Vec::new();
    for i in 0..10 {
        let student = app
            .student(&format!("Particular {}", i), EnrollmentType::Particular)
            .await;
        attendees.push(assign(student.id, AttendanceType::Recorrente));
    }
    let class = app.class_with(days_ahead(3), attendees).await.unwrap();
    let joining = app.student("Sofia Particular", EnrollmentType::Particular).await;

    let result = app
        .state
        .attendance_service
        .try_add_attendee(app.org_id, class.class.id, joining.id, AttendanceType::Pontual, true)
        .await;

    match result {
        Err(e @ ApiError::ClassFull(_)) => assert_eq!(e.code(), "CLASS_FULL_NO_DISPLACEABLE"),
        other => panic!("expected ClassFull, got {:?}", other),
    }
    let class = app
        .state
        .class_service
        .get_class(app.org_id, class.class.id)
        .await
        .unwrap();
    assert_eq!(class.attendees.len(), 10);
}

#[tokio::test]
async fn test_partner_network_student_cannot_displace() {
    let app = setup().await;
    let (class_id, _) = full_class_with_partner_attendees(&app).await;
    let joining = app.student("Tiago TotalPass", EnrollmentType::TotalPass).await;

    let result = app
        .state
        .attendance_service
        .try_add_attendee(app.org_id, class_id, joining.id, AttendanceType::Pontual, true)
        .await;
    assert!(matches!(result, Err(ApiError::ClassFull(_))));
}

#[tokio::test]
async fn test_displaced_reposition_attendee_gets_credit_back() {
    let app = setup().await;
    app.state
        .organization_service
        .update_settings(
            app.org_id,
            studiodesk::models::organizations::UpdateOrganizationRequest {
                name: None,
                class_capacity: Some(1),
            },
        )
        .await
        .unwrap();

    let partner = app.student("Wellhub Reposicao", EnrollmentType::Wellhub).await;
    app.state
        .credits_service
        .adjust_manual(app.org_id, partner.id, 1, "Test seed", None)
        .await
        .unwrap();
    let class = app
        .class_with(days_ahead(1), vec![assign(partner.id, AttendanceType::Reposicao)])
        .await
        .unwrap();
    assert_eq!(app.credits(partner.id).await, 0);

    let joining = app.student("Uma Particular", EnrollmentType::Particular).await;
    app.state
        .attendance_service
        .try_add_attendee(app.org_id, class.class.id, joining.id, AttendanceType::Pontual, true)
        .await
        .unwrap();

    assert_eq!(app.credits(partner.id).await, 1);
    let class = app
        .state
        .class_service
        .get_class(app.org_id, class.class.id)
        .await
        .unwrap();
    assert_eq!(class.class.student_id, Some(joining.id));
}

#[tokio::test]
async fn test_same_student_cannot_join_twice() {
    let app = setup().await;
    let student = app.student("Vera Lopes", EnrollmentType::Particular).await;
    let class = app
        .class_with(days_ahead(1), vec![assign(student.id, AttendanceType::Pontual)])
        .await
        .unwrap();

    let result = app
        .state
        .attendance_service
        .try_add_attendee(app.org_id, class.class.id, student.id, AttendanceType::Pontual, false)
        .await;
    assert!(matches!(result, Err(ApiError::Conflict(_))));
}

#[tokio::test]
async fn test_create_class_over_capacity_refused() {
    let app = setup().await;
    let mut attendees = Vec::new();
    for i in 0..11 {
        let student = app
            .student(&format!("Aluno {}", i), EnrollmentType::Particular)
            .await;
        attendees.push(assign(student.id, AttendanceType::Pontual));
    }

    let result = app.class_with(days_ahead(1), attendees).await;
    assert!(matches!(result, Err(ApiError::ClassFull(_))));
}

#[tokio::test]
async fn test_class_over_lowered_capacity_admits_nobody() {
    let app = setup().await;
    let paula = app.student("Paula", EnrollmentType::Particular).await;
    let wellhub = app.student("Walter", EnrollmentType::Wellhub).await;
    let class = app
        .class_with(
            days_ahead(3),
            vec![
                assign(paula.id, AttendanceType::Pontual),
                assign(wellhub.id, AttendanceType::Pontual),
            ],
        )
        .await
        .unwrap();

    app.state
        .organization_service
        .update_settings(
            app.org_id,
            UpdateOrganizationRequest {
                name: None,
                class_capacity: Some(1),
            },
        )
        .await
        .unwrap();

    let joining = app.student("Rita", EnrollmentType::Particular).await;
    let result = app
        .state
        .attendance_service
        .try_add_attendee(app.org_id, class.class.id, joining.id, AttendanceType::Pontual, true)
        .await;
    assert!(matches!(result, Err(ApiError::ClassFull(_))));

    let class = app
        .state
        .class_service
        .get_class(app.org_id, class.class.id)
        .await
        .unwrap();
    assert_eq!(class.attendees.len(), 2);
}
