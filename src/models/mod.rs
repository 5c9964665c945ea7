pub mod common;
pub mod pagination;
pub mod payment;
pub mod reminder;
pub mod subscription;

pub use common::*;
pub use pagination::*;
pub use payment::*;
pub use reminder::*;
pub use subscription::*;
