// Request/Response models
pub mod classes;
pub mod common;
pub mod credits;
pub mod finance;
pub mod organizations;
pub mod students;
pub mod templates;
