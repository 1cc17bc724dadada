pub(crate) mod bookings;
pub(crate) mod error;
pub(crate) mod favorites;
pub(crate) mod locations;
pub(crate) mod notifications;
pub(crate) mod promos;
pub(crate) mod providers;
pub(crate) mod response;
pub(crate) mod salons;
pub(crate) mod search;
pub(crate) mod services;
pub(crate) mod shorts;
pub(crate) mod taxonomy;
pub(crate) mod users;

pub(crate) use error::ApiError;
pub(crate) use response::{ApiResponse, Paginated};
