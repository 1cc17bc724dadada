mod booking_repo;
mod favorite_repo;
mod indexes;
mod location_repo;
mod notification_repo;
mod promo_repo;
mod provider_repo;
mod repo_error;
mod review_repo;
mod salon_repo;
mod service_repo;
mod short_repo;
mod taxonomy_repo;
mod user_repo;

pub use booking_repo::*;
pub use favorite_repo::*;
pub use indexes::ensure_indexes;
pub use location_repo::*;
pub use notification_repo::*;
pub use promo_repo::*;
pub use provider_repo::*;
pub use repo_error::RepositoryError;
pub use review_repo::*;
pub use salon_repo::*;
pub use service_repo::*;
pub use short_repo::*;
pub use taxonomy_repo::*;
pub use user_repo::*;
