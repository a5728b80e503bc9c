use entity::sea_orm_active_enums::{AttendanceStatus, AttendanceType, EnrollmentType};
use studiodesk::{models::classes::UpdateClassRequest, ApiError};

use crate::common::{assign, days_ahead, setup};

#[tokio::test]
async fn test_reposition_booking_consumes_credit() {
    let app = setup().await;
    let student = app.student_with_credits("Ana Reposicao", 1).await;

    let class = app
        .class_with(days_ahead(1), vec![assign(student.id, AttendanceType::Reposicao)])
        .await
        .unwrap();

    assert_eq!(app.credits(student.id).await, 0);
    assert_eq!(class.class.student_id, Some(student.id));
    assert_eq!(class.attendees[0].attendance_type, AttendanceType::Reposicao);
}

#[tokio::test]
async fn test_reposition_booking_without_credit_creates_nothing() {
    let app = setup().await;
    let student = app.student("Bia Sem Credito", EnrollmentType::Particular).await;
    let start = days_ahead(1);

    let result = app
        .class_with(start, vec![assign(student.id, AttendanceType::Reposicao)])
        .await;
    assert!(matches!(result, Err(ApiError::InsufficientCredits { .. })));

    let classes = app
        .state
        .class_service
        .list_classes(app.org_id, start, start + time::Duration::hours(1))
        .await
        .unwrap();
    assert!(classes.is_empty());
}

#[tokio::test]
async fn test_same_student_reposition_edit_keeps_balance() {
    let app = setup().await;
    let student = app.student_with_credits("Caio Mesmo", 2).await;
    let class = app
        .class_with(days_ahead(1), vec![assign(student.id, AttendanceType::Reposicao)])
        .await
        .unwrap();
    assert_eq!(app.credits(student.id).await, 1);

    let updated = app
        .state
        .class_service
        .update_class(
            app.org_id,
            class.class.id,
            UpdateClassRequest {
                title: Some("Reformer".to_string()),
                attendee: Some(assign(student.id, AttendanceType::Reposicao)),
                ..UpdateClassRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.class.title.as_deref(), Some("Reformer"));
    assert_eq!(app.credits(student.id).await, 1);
}

#[tokio::test]
async fn test_same_student_edit_succeeds_at_zero_balance() {
    let app = setup().await;
    let student = app.student_with_credits("Duda Zero", 1).await;
    let class = app
        .class_with(days_ahead(1), vec![assign(student.id, AttendanceType::Reposicao)])
        .await
        .unwrap();
    assert_eq!(app.credits(student.id).await, 0);

    app.state
        .class_service
        .update_class(
            app.org_id,
            class.class.id,
            UpdateClassRequest {
                attendee: Some(assign(student.id, AttendanceType::Reposicao)),
                ..UpdateClassRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(app.credits(student.id).await, 0);
}

#[tokio::test]
async fn test_swapping_reposition_seat_moves_the_credit() {
    let app = setup().await;
    let original = app.student_with_credits("Eva Original", 1).await;
    let replacement = app.student_with_credits("Fred Novo", 1).await;
    let class = app
        .class_with(days_ahead(1), vec![assign(original.id, AttendanceType::Reposicao)])
        .await
        .unwrap();

    let updated = app
        .state
        .class_service
        .update_class(
            app.org_id,
            class.class.id,
            UpdateClassRequest {
                attendee: Some(assign(replacement.id, AttendanceType::Reposicao)),
                ..UpdateClassRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(app.credits(original.id).await, 1);
    assert_eq!(app.credits(replacement.id).await, 0);
    assert_eq!(updated.class.student_id, Some(replacement.id));
    assert_eq!(updated.attendees.len(), 1);
    assert_eq!(updated.attendees[0].student_id, replacement.id);
}

#[tokio::test]
async fn test_edit_aborts_when_new_student_has_no_credit() {
    let app = setup().await;
    let original = app.student_with_credits("Gui Original", 1).await;
    let broke = app.student("Hugo Sem Credito", EnrollmentType::Particular).await;
    let class = app
        .class_with(days_ahead(1), vec![assign(original.id, AttendanceType::Reposicao)])
        .await
        .unwrap();

    let result = app
        .state
        .class_service
        .update_class(
            app.org_id,
            class.class.id,
            UpdateClassRequest {
                title: Some("Should not persist".to_string()),
                attendee: Some(assign(broke.id, AttendanceType::Reposicao)),
                ..UpdateClassRequest::default()
            },
        )
        .await;
    assert!(matches!(result, Err(ApiError::InsufficientCredits { .. })));

    // Refund to the original student was rolled back with the rest
    assert_eq!(app.credits(original.id).await, 0);
    let class = app
        .state
        .class_service
        .get_class(app.org_id, class.class.id)
        .await
        .unwrap();
    assert_eq!(class.class.title, None);
    assert_eq!(class.attendees[0].student_id, original.id);
}

#[tokio::test]
async fn test_sole_attendee_edit_rejects_group_classes() {
    let app = setup().await;
    let a = app.student("Iris", EnrollmentType::Particular).await;
    let b = app.student("Joao", EnrollmentType::Particular).await;
    let class = app
        .class_with(
            days_ahead(1),
            vec![
                assign(a.id, AttendanceType::Pontual),
                assign(b.id, AttendanceType::Pontual),
            ],
        )
        .await
        .unwrap();

    let result = app
        .state
        .class_service
        .update_class(
            app.org_id,
            class.class.id,
            UpdateClassRequest {
                attendee: Some(assign(a.id, AttendanceType::Recorrente)),
                ..UpdateClassRequest::default()
            },
        )
        .await;
    assert!(matches!(result, Err(ApiError::BadRequest(_))));
}

#[tokio::test]
async fn test_delete_class_refunds_every_reposition_attendee() {
    let app = setup().await;
    let first = app.student_with_credits("Karla", 1).await;
    let second = app.student_with_credits("Leo", 1).await;
    let regular = app.student("Marta", EnrollmentType::Particular).await;

    let class = app
        .class_with(
            days_ahead(1),
            vec![
                assign(first.id, AttendanceType::Reposicao),
                assign(second.id, AttendanceType::Reposicao),
                assign(regular.id, AttendanceType::Recorrente),
            ],
        )
        .await
        .unwrap();

    let deleted = app
        .state
        .class_service
        .delete_class(app.org_id, class.class.id)
        .await
        .unwrap();

    assert_eq!(deleted.credits_returned_to.len(), 2);
    assert!(deleted.credits_returned_to.contains(&first.id));
    assert!(deleted.credits_returned_to.contains(&second.id));
    assert_eq!(app.credits(first.id).await, 1);
    assert_eq!(app.credits(second.id).await, 1);
    assert_eq!(app.credits(regular.id).await, 0);

    let gone = app.state.class_service.get_class(app.org_id, class.class.id).await;
    assert!(matches!(gone, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_absence_grant_happens_once() {
    let app = setup().await;
    let student = app.student("Nina Pontual", EnrollmentType::Particular).await;
    let class = app
        .class_with(days_ahead(1), vec![assign(student.id, AttendanceType::Pontual)])
        .await
        .unwrap();
    let attendee_id = class.attendees[0].id;

    let first = app
        .state
        .attendance_service
        .update_status(app.org_id, attendee_id, AttendanceStatus::Faltou)
        .await
        .unwrap();
    assert!(first.credit_granted);
    assert!(first.attendee.absence_credit_granted);

    // Flip back and forth; no second credit
    app.state
        .attendance_service
        .update_status(app.org_id, attendee_id, AttendanceStatus::Presente)
        .await
        .unwrap();
    let again = app
        .state
        .attendance_service
        .update_status(app.org_id, attendee_id, AttendanceStatus::Faltou)
        .await
        .unwrap();
    assert!(!again.credit_granted);

    assert_eq!(app.credits(student.id).await, 1);
}

#[tokio::test]
async fn test_reposition_absence_earns_nothing() {
    let app = setup().await;
    let student = app.student_with_credits("Otto Reposicao", 1).await;
    let class = app
        .class_with(days_ahead(1), vec![assign(student.id, AttendanceType::Reposicao)])
        .await
        .unwrap();

    let result = app
        .state
        .attendance_service
        .update_status(app.org_id, class.attendees[0].id, AttendanceStatus::Faltou)
        .await
        .unwrap();

    assert!(!result.credit_granted);
    assert_eq!(result.attendee.status, AttendanceStatus::Faltou);
    assert_eq!(app.credits(student.id).await, 0);
}

#[tokio::test]
async fn test_absence_grant_can_be_disabled() {
    let mut config = crate::common::test_config();
    config.studio.auto_grant_on_absence = false;
    let app = crate::common::setup_with(config).await;

    let student = app.student("Pia Recorrente", EnrollmentType::Particular).await;
    let class = app
        .class_with(days_ahead(1), vec![assign(student.id, AttendanceType::Recorrente)])
        .await
        .unwrap();

    let result = app
        .state
        .attendance_service
        .update_status(app.org_id, class.attendees[0].id, AttendanceStatus::Faltou)
        .await
        .unwrap();
    assert!(!result.credit_granted);
    assert_eq!(app.credits(student.id).await, 0);
}

#[tokio::test]
async fn test_removing_reposition_attendee_refunds() {
    let app = setup().await;
    let student = app.student_with_credits("Quin", 1).await;
    let class = app
        .class_with(days_ahead(1), vec![assign(student.id, AttendanceType::Reposicao)])
        .await
        .unwrap();

    let credited = app
        .state
        .attendance_service
        .remove_attendee(app.org_id, class.attendees[0].id)
        .await
        .unwrap();

    assert_eq!(credited, Some(student.id));
    assert_eq!(app.credits(student.id).await, 1);
    let class = app
        .state
        .class_service
        .get_class(app.org_id, class.class.id)
        .await
        .unwrap();
    assert!(class.attendees.is_empty());
    assert_eq!(class.class.student_id, None);
}

#[tokio::test]
async fn test_list_classes_is_ordered_and_half_open() {
    let app = setup().await;
    let base = days_ahead(5);
    for offset in [3, 1, 2] {
        app.class_with(base + time::Duration::hours(offset), Vec::new())
            .await
            .unwrap();
    }

    let classes = app
        .state
        .class_service
        .list_classes(app.org_id, base, base + time::Duration::hours(3))
        .await
        .unwrap();

    let starts: Vec<_> = classes.iter().map(|c| c.class.start_time).collect();
    assert_eq!(
        starts,
        vec![base + time::Duration::hours(1), base + time::Duration::hours(2)]
    );
}
