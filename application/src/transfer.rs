mod client;
mod meal;
mod menu;
mod nutri_facts;
mod recipe;
mod schema;
mod tag;

pub use self::{client::*, meal::*, menu::*, nutri_facts::*, recipe::*, schema::*, tag::*};
