pub mod prelude;

pub mod class_attendees;
pub mod classes;
pub mod credit_events;
pub mod financial_transactions;
pub mod organization_members;
pub mod organizations;
pub mod recurring_class_templates;
pub mod recurring_template_slots;
pub mod sea_orm_active_enums;
pub mod students;
