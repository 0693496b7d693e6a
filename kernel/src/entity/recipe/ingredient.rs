use destructure::Destructure;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vodca::References;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureUnit {
    Gram,
    Kilogram,
    Milliliter,
    Liter,
    Unit,
    Slice,
    Tablespoon,
    Teaspoon,
    Cup,
    Pinch,
}

/// One line of a recipe's ingredient list. `position` orders the list.
#[derive(Debug, Clone, PartialEq, References, Destructure)]
pub struct Ingredient {
    name: String,
    quantity: f64,
    unit: MeasureUnit,
    position: u32,
    full_text: Option<String>,
    product_id: Option<Uuid>,
}

impl Ingredient {
    pub fn new(
        name: impl Into<String>,
        quantity: f64,
        unit: MeasureUnit,
        position: u32,
        full_text: Option<String>,
        product_id: Option<Uuid>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit,
            position,
            full_text,
            product_id,
        }
    }
}
