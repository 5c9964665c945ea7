pub mod payment_service;
pub mod reminder_service;
pub mod subscription_service;

pub use payment_service::*;
pub use reminder_service::*;
pub use subscription_service::*;
