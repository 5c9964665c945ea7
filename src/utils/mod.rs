pub mod date;
pub mod jwt;
pub mod phone;

pub use date::*;
pub use jwt::*;
pub use phone::*;
