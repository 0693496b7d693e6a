mod client;
mod common;
mod meal;
mod menu;
mod nutri_facts;
mod recipe;
mod tag;
mod user;

pub use self::{client::*, common::*, meal::*, menu::*, nutri_facts::*, recipe::*, tag::*, user::*};
