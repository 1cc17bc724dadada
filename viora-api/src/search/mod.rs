mod filter;
mod pagination;
mod params;
mod pipeline;
mod sort;

pub use filter::*;
pub use pagination::*;
pub use params::*;
pub use pipeline::*;
pub use sort::*;
