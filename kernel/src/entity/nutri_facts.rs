use std::ops::Add;

/// Nutrition facts of a recipe or of a whole meal. Masses are in grams,
/// except `sodium` and `cholesterol` which are in milligrams.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NutriFacts {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbohydrate: Option<f64>,
    pub total_fat: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub trans_fat: Option<f64>,
    pub dietary_fiber: Option<f64>,
    pub sodium: Option<f64>,
    pub sugar: Option<f64>,
    pub cholesterol: Option<f64>,
}

fn sum(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    match (left, right) {
        (Some(left), Some(right)) => Some(left + right),
        (value, None) | (None, value) => value,
    }
}

impl Add for NutriFacts {
    type Output = NutriFacts;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            calories: sum(self.calories, rhs.calories),
            protein: sum(self.protein, rhs.protein),
            carbohydrate: sum(self.carbohydrate, rhs.carbohydrate),
            total_fat: sum(self.total_fat, rhs.total_fat),
            saturated_fat: sum(self.saturated_fat, rhs.saturated_fat),
            trans_fat: sum(self.trans_fat, rhs.trans_fat),
            dietary_fiber: sum(self.dietary_fiber, rhs.dietary_fiber),
            sodium: sum(self.sodium, rhs.sodium),
            sugar: sum(self.sugar, rhs.sugar),
            cholesterol: sum(self.cholesterol, rhs.cholesterol),
        }
    }
}
