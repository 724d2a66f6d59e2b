pub mod dashboard;
pub mod gender;
pub mod sizes;
pub mod training;
