pub mod aggregate;
pub mod entities;
pub mod log;
