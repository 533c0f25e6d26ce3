pub mod filename;
pub mod jwt;
pub mod range;
