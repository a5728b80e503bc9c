use entity::{
    classes,
    sea_orm_active_enums::{AttendanceType, EnrollmentType, StudentStatus},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use studiodesk::models::{
    students::UpdateStudentRequest,
    templates::{TemplateRequest, TemplateSlot},
};
use time::macros::time;
use uuid::Uuid;

use crate::common::{setup, TestApp};

fn every_weekday_at_six() -> Vec<TemplateSlot> {
    (0..7)
        .map(|weekday| TemplateSlot {
            weekday,
            time: time!(06:00),
        })
        .collect()
}

fn request(student_id: Option<Uuid>, days: i64) -> TemplateRequest {
    let today = time::OffsetDateTime::now_utc().date();
    TemplateRequest {
        student_id,
        title: Some("Mat Pilates".to_string()),
        start_date: today,
        end_date: Some(today + time::Duration::days(days)),
        duration_minutes: Some(55),
        is_active: true,
        slots: every_weekday_at_six(),
        generate: false,
    }
}

async fn template_class_starts(app: &TestApp, template_id: Uuid) -> Vec<time::OffsetDateTime> {
    classes::Entity::find()
        .filter(classes::Column::TemplateId.eq(template_id))
        .order_by_asc(classes::Column::StartTime)
        .all(&app.state.db)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.start_time)
        .collect()
}

#[tokio::test]
async fn test_regeneration_is_idempotent() {
    let app = setup().await;
    let student = app.student("Vivi Fixa", EnrollmentType::Particular).await;
    let saved = app
        .state
        .template_service
        .create_template(app.org_id, request(Some(student.id), 13))
        .await
        .unwrap();
    let template_id = saved.template.id;

    let first = app
        .state
        .template_service
        .generate_classes(app.org_id, template_id)
        .await
        .unwrap();
    let after_first = template_class_starts(&app, template_id).await;

    let second = app
        .state
        .template_service
        .generate_classes(app.org_id, template_id)
        .await
        .unwrap();
    let after_second = template_class_starts(&app, template_id).await;

    // 14 days of daily slots, today's may already be past
    assert!(first.created == 13 || first.created == 14);
    assert_eq!(after_first.len() as u64, first.created);
    assert_eq!(second.deleted, first.created);
    assert_eq!(second.created, first.created);
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_generated_classes_carry_recurring_student() {
    let app = setup().await;
    let student = app.student("Wagner Fixo", EnrollmentType::Particular).await;
    let saved = app
        .state
        .template_service
        .create_template(
            app.org_id,
            TemplateRequest {
                generate: true,
                ..request(Some(student.id), 6)
            },
        )
        .await
        .unwrap();

    let report = saved.generation.expect("generation requested");
    assert!(report.created > 0);

    let starts = template_class_starts(&app, saved.template.id).await;
    let class = app
        .state
        .class_service
        .list_classes(app.org_id, starts[0], starts[0] + time::Duration::minutes(1))
        .await
        .unwrap()
        .remove(0);
    assert_eq!(class.class.duration_minutes, 55);
    assert_eq!(class.class.student_id, Some(student.id));
    assert_eq!(class.attendees.len(), 1);
    assert_eq!(class.attendees[0].attendance_type, AttendanceType::Recorrente);
}

#[tokio::test]
async fn test_inactive_student_gets_empty_classes() {
    let app = setup().await;
    let student = app.student("Xena Inativa", EnrollmentType::Particular).await;
    app.state
        .student_service
        .update_student(
            app.org_id,
            student.id,
            UpdateStudentRequest {
                status: Some(StudentStatus::Inativo),
                ..UpdateStudentRequest::default()
            },
        )
        .await
        .unwrap();

    let saved = app
        .state
        .template_service
        .create_template(
            app.org_id,
            TemplateRequest {
                generate: true,
                ..request(Some(student.id), 3)
            },
        )
        .await
        .unwrap();
    assert!(saved.generation.unwrap().created > 0);

    let starts = template_class_starts(&app, saved.template.id).await;
    let classes = app
        .state
        .class_service
        .list_classes(app.org_id, starts[0], starts[0] + time::Duration::minutes(1))
        .await
        .unwrap();
    assert!(classes[0].attendees.is_empty());
}

#[tokio::test]
async fn test_inactive_template_generates_nothing() {
    let app = setup().await;
    let saved = app
        .state
        .template_service
        .create_template(
            app.org_id,
            TemplateRequest {
                is_active: false,
                generate: true,
                ..request(None, 7)
            },
        )
        .await
        .unwrap();

    assert_eq!(saved.generation.unwrap().created, 0);
    assert!(template_class_starts(&app, saved.template.id).await.is_empty());
}

#[tokio::test]
async fn test_deleting_template_removes_future_classes() {
    let app = setup().await;
    let saved = app
        .state
        .template_service
        .create_template(
            app.org_id,
            TemplateRequest {
                generate: true,
                ..request(None, 5)
            },
        )
        .await
        .unwrap();
    let created = saved.generation.unwrap().created;

    let report = app
        .state
        .template_service
        .delete_template(app.org_id, saved.template.id)
        .await
        .unwrap();

    assert_eq!(report.deleted, created);
    assert!(template_class_starts(&app, saved.template.id).await.is_empty());
    assert!(app
        .state
        .template_service
        .get_template(app.org_id, saved.template.id)
        .await
        .is_err());
}

#[tokio::test]
async fn test_update_replaces_slots() {
    let app = setup().await;
    let saved = app
        .state
        .template_service
        .create_template(app.org_id, request(None, 7))
        .await
        .unwrap();

    let updated = app
        .state
        .template_service
        .update_template(
            app.org_id,
            saved.template.id,
            TemplateRequest {
                slots: vec![TemplateSlot {
                    weekday: 2,
                    time: time!(19:30),
                }],
                ..request(None, 7)
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.template.slots.len(), 1);
    let fetched = app
        .state
        .template_service
        .get_template(app.org_id, saved.template.id)
        .await
        .unwrap();
    assert_eq!(fetched.slots, updated.template.slots);
}
