mod client;
mod meal;

pub use self::{client::*, meal::*};
