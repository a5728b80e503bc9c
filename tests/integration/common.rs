use entity::{sea_orm_active_enums::EnrollmentType, students};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use studiodesk::{
    config::{AuthConfig, Config, DatabaseConfig, LoggingConfig, ServerConfig, StudioConfig},
    models::{
        classes::{AttendeeAssignment, ClassDetail, CreateClassRequest},
        organizations::CreateOrganizationRequest,
        students::CreateStudentRequest,
    },
    AppState,
};
use uuid::Uuid;

pub struct TestApp {
    pub state: AppState,
    pub owner_id: Uuid,
    pub org_id: Uuid,
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
            cors_origins: Vec::new(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            run_migrations: true,
        },
        auth: AuthConfig {
            jwt_secret: "test-secret-key-with-minimum-32-characters-required".to_string(),
            access_token_expiration_minutes: 15,
        },
        studio: StudioConfig::default(),
        logging: LoggingConfig::default(),
    }
}

/// Fresh in-memory database with migrations applied
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// App state with one organization owned by a fresh user
pub async fn setup() -> TestApp {
    setup_with(test_config()).await
}

pub async fn setup_with(config: Config) -> TestApp {
    let db = setup_test_db().await;
    let state = AppState::from_parts(config, db);
    let owner_id = Uuid::new_v4();

    let org = state
        .organization_service
        .create_organization(
            owner_id,
            CreateOrganizationRequest {
                name: "Studio Pilates Centro".to_string(),
                class_capacity: None,
            },
        )
        .await
        .expect("Failed to create organization");

    TestApp {
        state,
        owner_id,
        org_id: org.id,
    }
}

impl TestApp {
    pub async fn student(&self, name: &str, enrollment_type: EnrollmentType) -> students::Model {
        self.state
            .student_service
            .create_student(
                self.org_id,
                CreateStudentRequest {
                    full_name: name.to_string(),
                    email: None,
                    phone: None,
                    birth_date: None,
                    enrollment_type,
                    notes: None,
                },
            )
            .await
            .expect("Failed to create student")
    }

    /// Student holding `credits` reposition credits
    pub async fn student_with_credits(&self, name: &str, credits: i32) -> students::Model {
        let student = self.student(name, EnrollmentType::Particular).await;
        if credits > 0 {
            self.state
                .credits_service
                .adjust_manual(self.org_id, student.id, credits, "Test seed", None)
                .await
                .expect("Failed to seed credits");
        }
        student
    }

    pub async fn credits(&self, student_id: Uuid) -> i32 {
        self.state
            .credits_service
            .get_balance(self.org_id, student_id)
            .await
            .expect("Failed to read balance")
            .credits
    }

    pub async fn class_with(
        &self,
        start_time: time::OffsetDateTime,
        attendees: Vec<AttendeeAssignment>,
    ) -> studiodesk::Result<ClassDetail> {
        self.state
            .class_service
            .create_class(
                self.org_id,
                CreateClassRequest {
                    start_time,
                    duration_minutes: None,
                    title: None,
                    notes: None,
                    attendees,
                },
            )
            .await
    }
}

/// Whole-hour instant `days` from now, safely in the future
pub fn days_ahead(days: i64) -> time::OffsetDateTime {
    let now = time::OffsetDateTime::now_utc() + time::Duration::days(days);
    now.replace_minute(0)
        .and_then(|t| t.replace_second(0))
        .and_then(|t| t.replace_nanosecond(0))
        .expect("valid time")
}

pub fn assign(
    student_id: Uuid,
    attendance_type: entity::sea_orm_active_enums::AttendanceType,
) -> AttendeeAssignment {
    AttendeeAssignment {
        student_id,
        attendance_type,
    }
}
