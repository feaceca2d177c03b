pub mod json;
pub mod sentinel;
