pub mod category;
pub mod file_upload;
pub mod magazine;
pub mod magazine_category;
