use destructure::Destructure;
use serde::{Deserialize, Serialize};
use vodca::References;

use crate::entity::MealId;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// A meal scheduled on a given week and day of a menu.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, References, Destructure)]
pub struct MenuMeal {
    meal_id: MealId,
    meal_name: String,
    week: u32,
    weekday: Weekday,
    meal_type: String,
}

impl MenuMeal {
    pub fn new(
        meal_id: MealId,
        meal_name: impl Into<String>,
        week: u32,
        weekday: Weekday,
        meal_type: impl Into<String>,
    ) -> Self {
        Self {
            meal_id,
            meal_name: meal_name.into(),
            week,
            weekday,
            meal_type: meal_type.into(),
        }
    }
}
