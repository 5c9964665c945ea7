pub mod health;
pub mod payment;
pub mod reminder;
pub mod subscription;

pub use health::health_config;
pub use payment::payment_config;
pub use reminder::reminder_config;
pub use subscription::subscription_config;
