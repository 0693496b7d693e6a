use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use application::transfer::{ApiNutriFacts, ApiTag};
use kernel::prelude::entity::TagType;

/// JSONB element of every `tags` column.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub(in crate::database) struct TagModel {
    pub key: String,
    pub value: String,
    pub author_id: Uuid,
    #[serde(rename = "type")]
    pub tag_type: TagType,
}

impl From<&ApiTag> for TagModel {
    fn from(tag: &ApiTag) -> Self {
        Self {
            key: tag.key.clone(),
            value: tag.value.clone(),
            author_id: tag.author_id,
            tag_type: tag.tag_type,
        }
    }
}

impl From<TagModel> for ApiTag {
    fn from(model: TagModel) -> Self {
        Self {
            key: model.key,
            value: model.value,
            author_id: model.author_id,
            tag_type: model.tag_type,
        }
    }
}

pub(in crate::database) fn tags_to_models(tags: &BTreeSet<ApiTag>) -> Vec<TagModel> {
    tags.iter().map(TagModel::from).collect()
}

pub(in crate::database) fn tags_from_models(tags: Vec<TagModel>) -> BTreeSet<ApiTag> {
    tags.into_iter().map(ApiTag::from).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub(in crate::database) struct NutriFactsModel {
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

impl From<&ApiNutriFacts> for NutriFactsModel {
    fn from(facts: &ApiNutriFacts) -> Self {
        Self {
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
        }
    }
}

impl From<NutriFactsModel> for ApiNutriFacts {
    fn from(model: NutriFactsModel) -> Self {
        Self {
            calories: model.calories,
            protein: model.protein,
            carbohydrate: model.carbohydrate,
            total_fat: model.total_fat,
            saturated_fat: model.saturated_fat,
            trans_fat: model.trans_fat,
            dietary_fiber: model.dietary_fiber,
            sodium: model.sodium,
            sugar: model.sugar,
            cholesterol: model.cholesterol,
        }
    }
}
