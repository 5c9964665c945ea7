pub mod packages;
pub mod payments;
pub mod period_extensions;
pub mod students;
pub mod subscription_periods;

pub use packages as package_entity;
pub use payments as payment_entity;
pub use payments::PaymentStatus;
pub use period_extensions as period_extension_entity;
pub use students as student_entity;
pub use subscription_periods as subscription_period_entity;
pub use subscription_periods::PeriodStatus;
