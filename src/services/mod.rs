pub mod activity;
pub mod approval;
pub mod dashboard;
pub mod payroll;
pub mod payslip;
pub mod report;
pub mod user;
