use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use kernel::prelude::entity::{
    AuthorId, DestructIngredient, DestructRecipe, Ingredient, MealId, MeasureUnit, Privacy,
    Rating, Recipe, RecipeId, TagType, UserId,
};

use crate::transfer::{
    check_chronology, check_tags, domain_rejected, restore_lifecycle, tags_from_domain, tags_to_domain, ApiNutriFacts,
    ApiSchema, ApiTag, ConversionDirection, ConversionError, FieldError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiIngredient {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub quantity: f64,
    pub unit: MeasureUnit,
    pub position: u32,
    #[validate(length(max = 1000))]
    pub full_text: Option<String>,
    pub product_id: Option<Uuid>,
}

impl ApiSchema for ApiIngredient {
    const SCHEMA: &'static str = "ApiIngredient";
}

impl ApiIngredient {
    pub fn from_domain(ingredient: &Ingredient) -> error_stack::Result<Self, ConversionError> {
        let DestructIngredient {
            name,
            quantity,
            unit,
            position,
            full_text,
            product_id,
        } = ingredient.clone().into_destruct();
        let api = Self {
            name,
            quantity,
            unit,
            position,
            full_text,
            product_id,
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<Ingredient, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        Ok(Ingredient::new(
            self.name.clone(),
            self.quantity,
            self.unit,
            self.position,
            self.full_text.clone(),
            self.product_id,
        ))
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiRating {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    #[validate(range(max = 5))]
    pub taste: u8,
    #[validate(range(max = 5))]
    pub convenience: u8,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

impl ApiSchema for ApiRating {
    const SCHEMA: &'static str = "ApiRating";
}

impl ApiRating {
    pub fn from_domain(rating: &Rating) -> error_stack::Result<Self, ConversionError> {
        let api = Self {
            user_id: *rating.user_id().as_ref(),
            recipe_id: *rating.recipe_id().as_ref(),
            taste: *rating.taste(),
            convenience: *rating.convenience(),
            comment: rating.comment().clone(),
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<Rating, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        Ok(Rating::new(
            UserId::new(self.user_id),
            RecipeId::new(self.recipe_id),
            self.taste,
            self.convenience,
            self.comment.clone(),
        ))
    }
}

/// Recipe as exchanged over the wire. Average ratings are derived from
/// `ratings` and ignored when rebuilding the domain recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiRecipe {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub author_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub instructions: String,
    #[validate(length(max = 1000))]
    pub utensils: Option<String>,
    pub total_time: Option<u32>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub tags: BTreeSet<ApiTag>,
    pub privacy: Privacy,
    #[validate(nested)]
    pub ingredients: Vec<ApiIngredient>,
    #[validate(nested)]
    pub ratings: Vec<ApiRating>,
    #[validate(nested)]
    pub nutri_facts: Option<ApiNutriFacts>,
    pub weight_in_grams: Option<u32>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub average_taste_rating: Option<f64>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub average_convenience_rating: Option<f64>,
    #[validate(range(min = 1))]
    pub version: i64,
    pub discarded: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ApiSchema for ApiRecipe {
    const SCHEMA: &'static str = "ApiRecipe";

    fn check_invariants(&self) -> Vec<FieldError> {
        let mut errors = check_tags("tags", &self.tags, &self.author_id, TagType::Recipe);
        let mut positions = HashSet::new();
        for (index, ingredient) in self.ingredients.iter().enumerate() {
            if !positions.insert(ingredient.position) {
                errors.push(FieldError::new(
                    format!("ingredients[{index}].position"),
                    "unique",
                    format!("position {} is used twice", ingredient.position),
                ));
            }
        }
        let mut raters = HashSet::new();
        for (index, rating) in self.ratings.iter().enumerate() {
            if rating.recipe_id != self.id {
                errors.push(FieldError::new(
                    format!("ratings[{index}].recipe_id"),
                    "owner",
                    "rating belongs to another recipe",
                ));
            }
            if !raters.insert(rating.user_id) {
                errors.push(FieldError::new(
                    format!("ratings[{index}].user_id"),
                    "unique",
                    "user already rated this recipe",
                ));
            }
        }
        if let Some(nutri_facts) = &self.nutri_facts {
            errors.extend(
                nutri_facts
                    .check_invariants()
                    .into_iter()
                    .map(|error| error.nested_in("nutri_facts")),
            );
        }
        errors.extend(check_chronology(self.created_at, self.updated_at));
        errors
    }
}

impl ApiRecipe {
    pub fn from_domain(recipe: &Recipe) -> error_stack::Result<Self, ConversionError> {
        let recipe = recipe.clone().into_destruct();
        let average_taste_rating = recipe.average_taste_rating();
        let average_convenience_rating = recipe.average_convenience_rating();
        let DestructRecipe {
            id,
            meal_id,
            author_id,
            name,
            description,
            instructions,
            utensils,
            total_time,
            notes,
            tags,
            privacy,
            ingredients,
            ratings,
            nutri_facts,
            weight_in_grams,
            image_url,
            lifecycle,
        } = recipe;
        let api = Self {
            id: id.into(),
            meal_id: meal_id.into(),
            author_id: author_id.into(),
            name,
            description,
            instructions,
            utensils,
            total_time,
            notes,
            tags: tags_from_domain(&tags)?,
            privacy,
            ingredients: ingredients
                .iter()
                .map(ApiIngredient::from_domain)
                .collect::<error_stack::Result<_, _>>()?,
            ratings: ratings
                .iter()
                .map(ApiRating::from_domain)
                .collect::<error_stack::Result<_, _>>()?,
            nutri_facts: nutri_facts
                .as_ref()
                .map(ApiNutriFacts::from_domain)
                .transpose()?,
            weight_in_grams,
            image_url,
            average_taste_rating,
            average_convenience_rating,
            version: *lifecycle.version().as_ref(),
            discarded: lifecycle.is_discarded(),
            created_at: *lifecycle.created_at().as_ref(),
            updated_at: *lifecycle.updated_at().as_ref(),
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<Recipe, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        let recipe = DestructRecipe {
            id: RecipeId::new(self.id),
            meal_id: MealId::new(self.meal_id),
            author_id: AuthorId::new(self.author_id),
            name: self.name.clone(),
            description: self.description.clone(),
            instructions: self.instructions.clone(),
            utensils: self.utensils.clone(),
            total_time: self.total_time,
            notes: self.notes.clone(),
            tags: tags_to_domain(&self.tags)?,
            privacy: self.privacy,
            ingredients: self
                .ingredients
                .iter()
                .map(ApiIngredient::to_domain)
                .collect::<error_stack::Result<_, _>>()?,
            ratings: self
                .ratings
                .iter()
                .map(ApiRating::to_domain)
                .collect::<error_stack::Result<_, _>>()?,
            nutri_facts: self
                .nutri_facts
                .as_ref()
                .map(ApiNutriFacts::to_domain)
                .transpose()?,
            weight_in_grams: self.weight_in_grams,
            image_url: self.image_url.clone(),
            lifecycle: restore_lifecycle(
                self.version,
                self.discarded,
                self.created_at,
                self.updated_at,
            ),
        };
        Recipe::restore(recipe).map_err(|report| domain_rejected(self, report))
    }
}
