pub mod pdf;
pub mod storage;
