// Client-side data: accounts, favorites, the local library, recent searches
pub mod auth;
pub mod favorites;
pub mod models;
pub mod recent;
pub mod store;
