mod moka;
mod null;

pub use moka::MokaNegativeCache;
pub use null::NullNegativeCache;
