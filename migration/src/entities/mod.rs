pub mod short_link;

pub use short_link::Entity as ShortLinkEntity;
