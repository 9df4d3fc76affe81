pub mod extract;
pub mod merge;
pub mod repair;
pub mod status;
pub mod validate;
