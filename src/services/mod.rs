pub mod file_service;
pub mod storage;
pub mod user_service;
