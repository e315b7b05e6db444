pub mod collection;
pub mod community_post;
pub mod product;
pub mod profile;
