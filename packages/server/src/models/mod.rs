pub mod category;
pub mod magazine;
pub mod preview;
pub mod storage;
