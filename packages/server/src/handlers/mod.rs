pub mod category;
pub mod magazine;
pub mod pdf;
pub mod preview;
pub mod storage;
