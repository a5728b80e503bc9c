pub use super::class_attendees::Entity as ClassAttendees;
pub use super::classes::Entity as Classes;
pub use super::credit_events::Entity as CreditEvents;
pub use super::financial_transactions::Entity as FinancialTransactions;
pub use super::organization_members::Entity as OrganizationMembers;
pub use super::organizations::Entity as Organizations;
pub use super::recurring_class_templates::Entity as RecurringClassTemplates;
pub use super::recurring_template_slots::Entity as RecurringTemplateSlots;
pub use super::students::Entity as Students;
