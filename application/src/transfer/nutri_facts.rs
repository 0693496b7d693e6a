use serde::{Deserialize, Serialize};
use validator::Validate;

use kernel::prelude::entity::NutriFacts;

use crate::transfer::{ApiSchema, ConversionDirection, ConversionError, FieldError};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiNutriFacts {
    #[validate(range(min = 0.0))]
    pub calories: Option<f64>,
    #[validate(range(min = 0.0))]
    pub protein: Option<f64>,
    #[validate(range(min = 0.0))]
    pub carbohydrate: Option<f64>,
    #[validate(range(min = 0.0))]
    pub total_fat: Option<f64>,
    #[validate(range(min = 0.0))]
    pub saturated_fat: Option<f64>,
    #[validate(range(min = 0.0))]
    pub trans_fat: Option<f64>,
    #[validate(range(min = 0.0))]
    pub dietary_fiber: Option<f64>,
    #[validate(range(min = 0.0))]
    pub sodium: Option<f64>,
    #[validate(range(min = 0.0))]
    pub sugar: Option<f64>,
    #[validate(range(min = 0.0))]
    pub cholesterol: Option<f64>,
}

impl ApiSchema for ApiNutriFacts {
    const SCHEMA: &'static str = "ApiNutriFacts";

    fn check_invariants(&self) -> Vec<FieldError> {
        self.values()
            .into_iter()
            .filter(|(_, value)| value.is_some_and(|value| !value.is_finite()))
            .map(|(field, _)| FieldError::new(field, "finite", "must be a finite number"))
            .collect()
    }
}

impl ApiNutriFacts {
    fn values(&self) -> [(&'static str, Option<f64>); 10] {
        [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbohydrate", self.carbohydrate),
            ("total_fat", self.total_fat),
            ("saturated_fat", self.saturated_fat),
            ("trans_fat", self.trans_fat),
            ("dietary_fiber", self.dietary_fiber),
            ("sodium", self.sodium),
            ("sugar", self.sugar),
            ("cholesterol", self.cholesterol),
        ]
    }

    pub fn from_domain(facts: &NutriFacts) -> error_stack::Result<Self, ConversionError> {
        let api = Self {
            calories: facts.calories,
            protein: facts.protein,
            carbohydrate: facts.carbohydrate,
            total_fat: facts.total_fat,
            saturated_fat: facts.saturated_fat,
            trans_fat: facts.trans_fat,
            dietary_fiber: facts.dietary_fiber,
            sodium: facts.sodium,
            sugar: facts.sugar,
            cholesterol: facts.cholesterol,
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<NutriFacts, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        Ok(NutriFacts {
            calories: self.calories,
            protein: self.protein,
            carbohydrate: self.carbohydrate,
            total_fat: self.total_fat,
            saturated_fat: self.saturated_fat,
            trans_fat: self.trans_fat,
            dietary_fiber: self.dietary_fiber,
            sodium: self.sodium,
            sugar: self.sugar,
            cholesterol: self.cholesterol,
        })
    }
}
