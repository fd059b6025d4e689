pub mod errors;
pub mod office_manager;
pub mod paths;
