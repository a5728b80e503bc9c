use crate::{
    config::Config,
    services::{
        AttendanceService, ClassService, CreditsService, FinanceService, JWTService,
        OrganizationService, StudentService, TemplateService,
    },
};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_service: Arc<JWTService>,
    pub organization_service: Arc<OrganizationService>,
    pub student_service: Arc<StudentService>,
    pub credits_service: Arc<CreditsService>,
    pub attendance_service: Arc<AttendanceService>,
    pub class_service: Arc<ClassService>,
    pub template_service: Arc<TemplateService>,
    pub finance_service: Arc<FinanceService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        // Connect to database
        let db = sea_orm::Database::connect(&config.database.url).await?;

        if config.database.run_migrations {
            Migrator::up(&db, None).await?;
            tracing::info!("Applied pending migrations");
        }

        Ok(Self::from_parts(config, db))
    }

    /// Wire services over an existing connection
    pub fn from_parts(config: Config, db: DatabaseConnection) -> Self {
        let studio = &config.studio;

        let jwt_service = Arc::new(JWTService::new(Arc::new(config.auth.clone())));
        let organization_service = Arc::new(OrganizationService::new(db.clone(), studio));
        let student_service = Arc::new(StudentService::new(db.clone(), studio));
        let credits_service = Arc::new(CreditsService::new(db.clone(), studio));
        let attendance_service = Arc::new(AttendanceService::new(
            db.clone(),
            credits_service.clone(),
            studio,
        ));
        let class_service = Arc::new(ClassService::new(
            db.clone(),
            credits_service.clone(),
            attendance_service.clone(),
            studio,
        ));
        let template_service = Arc::new(TemplateService::new(
            db.clone(),
            class_service.clone(),
            studio,
        ));
        let finance_service = Arc::new(FinanceService::new(db.clone()));

        Self {
            db,
            jwt_service,
            organization_service,
            student_service,
            credits_service,
            attendance_service,
            class_service,
            template_service,
            finance_service,
            config: Arc::new(config),
        }
    }
}
