use entity::sea_orm_active_enums::{AttendanceType, EnrollmentType};
use studiodesk::ApiError;

use crate::common::{assign, days_ahead, setup};

#[tokio::test]
async fn test_series_stops_at_first_week_without_credit() {
    let app = setup().await;
    let student = app.student_with_credits("Rita Serie", 2).await;
    let first = days_ahead(1);

    let booking = app
        .state
        .class_service
        .book_reposition_series(app.org_id, student.id, first, 4, None)
        .await
        .unwrap();

    assert_eq!(booking.booked.len(), 2);
    assert_eq!(booking.booked[0].week, 1);
    assert_eq!(booking.booked[1].week, 2);
    assert_eq!(booking.booked[1].start_time, first + time::Duration::weeks(1));

    let failure = booking.failure.expect("third week should fail");
    assert_eq!(failure.week, 3);
    assert_eq!(failure.code, "INSUFFICIENT_CREDITS");
    assert_eq!(failure.start_time, first + time::Duration::weeks(2));

    // The first two weeks stay booked; nothing exists from week three on
    let classes = app
        .state
        .class_service
        .list_classes(app.org_id, first, first + time::Duration::weeks(4))
        .await
        .unwrap();
    assert_eq!(classes.len(), 2);
    for class in &classes {
        assert_eq!(class.attendees.len(), 1);
        assert_eq!(class.attendees[0].student_id, student.id);
        assert_eq!(class.attendees[0].attendance_type, AttendanceType::Reposicao);
    }
    assert_eq!(app.credits(student.id).await, 0);
}

#[tokio::test]
async fn test_series_joins_existing_class_at_same_time() {
    let app = setup().await;
    let regular = app.student("Sara Fixa", EnrollmentType::Particular).await;
    let student = app.student_with_credits("Teo Serie", 2).await;
    let first = days_ahead(2);

    let existing = app
        .class_with(
            first + time::Duration::weeks(1),
            vec![assign(regular.id, AttendanceType::Recorrente)],
        )
        .await
        .unwrap();

    let booking = app
        .state
        .class_service
        .book_reposition_series(app.org_id, student.id, first, 2, Some(50))
        .await
        .unwrap();

    assert!(booking.failure.is_none());
    assert_eq!(booking.booked.len(), 2);
    assert_eq!(booking.booked[1].class_id, existing.class.id);

    let joined = app
        .state
        .class_service
        .get_class(app.org_id, existing.class.id)
        .await
        .unwrap();
    assert_eq!(joined.attendees.len(), 2);
    // Primary student stays the first attendee
    assert_eq!(joined.class.student_id, Some(regular.id));

    let created = app
        .state
        .class_service
        .get_class(app.org_id, booking.booked[0].class_id)
        .await
        .unwrap();
    assert_eq!(created.class.duration_minutes, 50);
}

#[tokio::test]
async fn test_series_length_is_bounded() {
    let app = setup().await;
    let student = app.student_with_credits("Ugo", 1).await;
    let max = app.state.config.studio.max_series_weeks;

    for weeks in [0, max + 1] {
        let result = app
            .state
            .class_service
            .book_reposition_series(app.org_id, student.id, days_ahead(1), weeks, None)
            .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
    assert_eq!(app.credits(student.id).await, 1);
}

#[tokio::test]
async fn test_series_for_unknown_student() {
    let app = setup().await;
    let result = app
        .state
        .class_service
        .book_reposition_series(app.org_id, uuid::Uuid::new_v4(), days_ahead(1), 2, None)
        .await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}
