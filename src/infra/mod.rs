pub mod factory;
pub mod meeting;
pub mod notification;
pub mod repositories;
