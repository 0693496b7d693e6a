mod client;
mod meal;
mod menu;
mod onboarding;
mod recipe;

pub use self::{client::*, meal::*, menu::*, onboarding::*, recipe::*};
