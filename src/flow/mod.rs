pub mod consent;
pub mod login;
pub mod summary;
pub mod survey;
