use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use kernel::prelude::entity::{AuthorId, DestructMeal, Meal, MealId, MenuId, TagType};

use crate::transfer::{
    check_chronology, check_tags, domain_rejected, restore_lifecycle, tags_from_domain,
    tags_to_domain, ApiNutriFacts, ApiRecipe, ApiSchema, ApiTag, ConversionDirection,
    ConversionError, FieldError,
};

/// Meal as exchanged over the wire.
///
/// `nutri_facts`, `weight_in_grams`, `total_time`, `calorie_density` and the
/// macro percentages are computed from the recipes. They are validated on the
/// way in but never trusted: the domain recomputes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiMeal {
    pub id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub author_id: Uuid,
    pub menu_id: Option<Uuid>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub like: Option<bool>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub tags: BTreeSet<ApiTag>,
    #[validate(nested)]
    pub recipes: Vec<ApiRecipe>,
    #[validate(nested)]
    pub nutri_facts: Option<ApiNutriFacts>,
    pub weight_in_grams: Option<u32>,
    pub total_time: Option<u32>,
    #[validate(range(min = 0.0))]
    pub calorie_density: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub carbo_percentage: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub protein_percentage: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub total_fat_percentage: Option<f64>,
    #[validate(range(min = 1))]
    pub version: i64,
    pub discarded: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ApiSchema for ApiMeal {
    const SCHEMA: &'static str = "ApiMeal";

    fn check_invariants(&self) -> Vec<FieldError> {
        let mut errors = check_tags("tags", &self.tags, &self.author_id, TagType::Meal);
        for (index, recipe) in self.recipes.iter().enumerate() {
            let path = format!("recipes[{index}]");
            errors.extend(
                recipe
                    .check_invariants()
                    .into_iter()
                    .map(|error| error.nested_in(&path)),
            );
            if recipe.meal_id != self.id {
                errors.push(FieldError::new(
                    format!("{path}.meal_id"),
                    "owner",
                    "recipe belongs to another meal",
                ));
            }
            if recipe.author_id != self.author_id {
                errors.push(FieldError::new(
                    format!("{path}.author_id"),
                    "owner",
                    "recipe belongs to another author",
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

impl ApiMeal {
    pub fn from_domain(meal: &Meal) -> error_stack::Result<Self, ConversionError> {
        let meal = meal.clone().into_destruct();
        let figures = meal.figures();
        let DestructMeal {
            id,
            name,
            author_id,
            menu_id,
            description,
            notes,
            like,
            image_url,
            tags,
            recipes,
            lifecycle,
        } = meal;
        let api = Self {
            id: id.into(),
            name,
            author_id: author_id.into(),
            menu_id: menu_id.map(Into::into),
            description,
            notes,
            like,
            image_url,
            tags: tags_from_domain(&tags)?,
            recipes: recipes
                .iter()
                .map(ApiRecipe::from_domain)
                .collect::<error_stack::Result<_, _>>()?,
            nutri_facts: figures
                .nutri_facts
                .as_ref()
                .map(ApiNutriFacts::from_domain)
                .transpose()?,
            weight_in_grams: figures.weight_in_grams,
            total_time: figures.total_time,
            calorie_density: figures.calorie_density,
            carbo_percentage: figures.macro_division.map(|division| division.carbohydrate),
            protein_percentage: figures.macro_division.map(|division| division.protein),
            total_fat_percentage: figures.macro_division.map(|division| division.total_fat),
            version: *lifecycle.version().as_ref(),
            discarded: lifecycle.is_discarded(),
            created_at: *lifecycle.created_at().as_ref(),
            updated_at: *lifecycle.updated_at().as_ref(),
        };
        api.ensure_valid(ConversionDirection::DomainToApi)?;
        Ok(api)
    }

    pub fn to_domain(&self) -> error_stack::Result<Meal, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToDomain)?;
        let meal = DestructMeal {
            id: MealId::new(self.id),
            name: self.name.clone(),
            author_id: AuthorId::new(self.author_id),
            menu_id: self.menu_id.map(MenuId::new),
            description: self.description.clone(),
            notes: self.notes.clone(),
            like: self.like,
            image_url: self.image_url.clone(),
            tags: tags_to_domain(&self.tags)?,
            recipes: self
                .recipes
                .iter()
                .map(ApiRecipe::to_domain)
                .collect::<error_stack::Result<_, _>>()?,
            lifecycle: restore_lifecycle(
                self.version,
                self.discarded,
                self.created_at,
                self.updated_at,
            ),
        };
        Meal::restore(meal).map_err(|report| domain_rejected(self, report))
    }
}

#[cfg(test)]
mod test {
    use time::Duration;
    use uuid::Uuid;

    use kernel::prelude::entity::{AuthorId, Meal, MealDraft, NutriFacts, RecipeDraft};

    use super::ApiMeal;
    use crate::transfer::ApiSchema;

    fn meal() -> Meal {
        let mut rice = RecipeDraft::new("Rice", "Boil.");
        rice.nutri_facts = Some(NutriFacts {
            calories: Some(260.0),
            carbohydrate: Some(50.0),
            protein: Some(5.0),
            total_fat: Some(0.5),
            ..Default::default()
        });
        rice.weight_in_grams = Some(200);
        rice.total_time = Some(25);
        let mut chicken = RecipeDraft::new("Chicken", "Grill.");
        chicken.nutri_facts = Some(NutriFacts {
            calories: Some(240.0),
            carbohydrate: Some(0.0),
            protein: Some(35.5),
            total_fat: Some(9.0),
            ..Default::default()
        });
        chicken.weight_in_grams = Some(150);
        chicken.total_time = Some(15);
        let mut draft = MealDraft::new("Lunch");
        draft.recipes = vec![rice, chicken];
        Meal::create_meal(AuthorId::new(Uuid::new_v4()), draft).unwrap()
    }

    #[test]
    fn computed_fields_are_filled() {
        let api = ApiMeal::from_domain(&meal()).unwrap();
        assert_eq!(api.weight_in_grams, Some(350));
        assert_eq!(api.total_time, Some(25));
        assert_eq!(api.nutri_facts.and_then(|facts| facts.calories), Some(500.0));
        assert_eq!(api.carbo_percentage, Some(50.0));
        assert_eq!(api.protein_percentage, Some(40.5));
        assert_eq!(api.total_fat_percentage, Some(9.5));
    }

    #[test]
    fn carbo_percentage_out_of_range_is_rejected() {
        let mut api = ApiMeal::from_domain(&meal()).unwrap();
        api.carbo_percentage = Some(150.0);
        let report = api.to_json().unwrap_err();
        let error = report.current_context();
        assert!(error.has_error_on("carbo_percentage"));
        assert_eq!(error.errors[0].code, "range");

        api.carbo_percentage = Some(45.0);
        let json = api.to_json().unwrap();
        assert_eq!(ApiMeal::from_json(&json).unwrap(), api);
    }

    #[test]
    fn domain_recomputes_untrusted_fields() {
        let meal = meal();
        let mut api = ApiMeal::from_domain(&meal).unwrap();
        api.weight_in_grams = Some(1);
        api.calorie_density = Some(0.0);
        let domain = api.to_domain().unwrap();
        assert_eq!(domain, meal);
        assert_eq!(domain.weight_in_grams().unwrap(), Some(350));
    }

    #[test]
    fn recipe_of_other_meal_is_rejected() {
        let mut api = ApiMeal::from_domain(&meal()).unwrap();
        api.recipes[1].meal_id = Uuid::new_v4();
        let report = api.to_domain().unwrap_err();
        assert!(report.current_context().has_error_on("recipes[1].meal_id"));
    }

    #[test]
    fn discarded_meal_keeps_computed_fields() {
        let mut meal = meal();
        let live = ApiMeal::from_domain(&meal).unwrap();
        meal.delete();
        let api = ApiMeal::from_domain(&meal).unwrap();
        assert!(api.discarded);
        assert!(api.recipes.iter().all(|recipe| recipe.discarded));
        assert_eq!(api.weight_in_grams, Some(350));
        assert_eq!(api.nutri_facts, live.nutri_facts);
        assert_eq!(api.carbo_percentage, live.carbo_percentage);
        assert_eq!(api.total_time, live.total_time);
    }

    #[test]
    fn update_before_creation_is_rejected() {
        let mut api = ApiMeal::from_domain(&meal()).unwrap();
        api.updated_at = api.created_at - Duration::seconds(30);
        let report = api.to_domain().unwrap_err();
        assert!(report.current_context().has_error_on("updated_at"));
    }
}
