mod moka;
mod null;

pub use moka::MokaObjectCache;
pub use null::NullObjectCache;
