// Service modules
pub mod attendance_service;
pub mod class_service;
pub mod credits_service;
pub mod finance_service;
pub mod jwt_service;
pub mod organization_service;
pub mod student_service;
pub mod template_service;

pub use attendance_service::AttendanceService;
pub use class_service::ClassService;
pub use credits_service::CreditsService;
pub use finance_service::FinanceService;
pub use jwt_service::JWTService;
pub use organization_service::OrganizationService;
pub use student_service::StudentService;
pub use template_service::TemplateService;
