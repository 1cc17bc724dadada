mod area;
mod booking;
mod favorite;
mod format;
mod notification;
mod promo;
mod provider;
mod review;
mod salon;
mod service;
mod short;
mod user;

pub use area::*;
pub use booking::*;
pub use favorite::*;
pub use format::*;
pub use notification::*;
pub use promo::*;
pub use provider::*;
pub use review::*;
pub use salon::*;
pub use service::*;
pub use short::*;
pub use user::*;
