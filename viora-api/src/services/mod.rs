mod bookings;
mod notifier;
mod rating;

pub use bookings::*;
pub use notifier::*;
pub use rating::*;
