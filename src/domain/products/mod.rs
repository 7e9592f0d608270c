pub mod product;
pub mod slug;
