mod id;

use std::collections::BTreeSet;

use destructure::Destructure;
use error_stack::Report;
use uuid::Uuid;

pub use self::id::*;
use crate::entity::common::replace_if_changed;
use crate::entity::{
    AuthorId, CreatedAt, Lifecycle, MenuId, NutriFacts, Rating, Recipe, RecipeDraft, RecipeId,
    RecipeUpdates, Tag, TagType, UpdatedAt, Version,
};
use crate::rule::{check_rule, TagsOwnedBy};
use crate::KernelError;

/// Aggregate root of a meal and the recipes it is made of.
///
/// Nutrition figures of the meal are not fields of the aggregate: they are
/// derived from the live recipes every time they are read.
#[derive(Debug, Clone, PartialEq, Destructure)]
pub struct Meal {
    id: MealId,
    name: String,
    author_id: AuthorId,
    menu_id: Option<MenuId>,
    description: Option<String>,
    notes: Option<String>,
    like: Option<bool>,
    image_url: Option<String>,
    tags: BTreeSet<Tag>,
    recipes: Vec<Recipe>,
    lifecycle: Lifecycle<Meal>,
}

/// Content of a meal that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct MealDraft {
    pub name: String,
    pub menu_id: Option<MenuId>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub tags: BTreeSet<Tag>,
    pub recipes: Vec<RecipeDraft>,
}

impl MealDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            menu_id: None,
            description: None,
            notes: None,
            image_url: None,
            tags: BTreeSet::new(),
            recipes: Vec::new(),
        }
    }
}

/// Fields of a meal to change at once. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct MealUpdates {
    pub name: Option<String>,
    pub menu_id: Option<Option<MenuId>>,
    pub description: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub like: Option<Option<bool>>,
    pub image_url: Option<Option<String>>,
    pub tags: Option<BTreeSet<Tag>>,
}

/// Share of each macronutrient in the meal's macro grams, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroDivision {
    pub carbohydrate: f64,
    pub protein: f64,
    pub total_fat: f64,
}

/// Values derived from the recipes of a meal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MealFigures {
    pub nutri_facts: Option<NutriFacts>,
    pub weight_in_grams: Option<u32>,
    pub total_time: Option<u32>,
    pub calorie_density: Option<f64>,
    pub macro_division: Option<MacroDivision>,
}

impl MealFigures {
    /// A live meal counts its live recipes. A discarded meal counts the
    /// recipes it was discarded with.
    fn of(recipes: &[Recipe], meal_discarded: bool) -> Self {
        let counted = || {
            recipes
                .iter()
                .filter(move |recipe| meal_discarded || !recipe.is_discarded())
        };
        let nutri_facts = counted()
            .filter_map(Recipe::recorded_nutri_facts)
            .copied()
            .reduce(|total, facts| total + facts);
        let weight_in_grams = counted()
            .filter_map(Recipe::recorded_weight_in_grams)
            .try_fold(None, |total: Option<u32>, weight| match total {
                None => Some(Some(weight)),
                Some(total) => total.checked_add(weight).map(Some),
            })
            .flatten();
        let total_time = counted().filter_map(Recipe::recorded_total_time).max();
        let calorie_density = match (
            nutri_facts.and_then(|facts| facts.calories),
            weight_in_grams.filter(|weight| *weight > 0),
        ) {
            (Some(calories), Some(weight)) => Some(calories * 100.0 / f64::from(weight)),
            _ => None,
        };
        Self {
            nutri_facts,
            weight_in_grams,
            total_time,
            calorie_density,
            macro_division: nutri_facts.and_then(MacroDivision::of),
        }
    }
}

impl MacroDivision {
    fn of(facts: NutriFacts) -> Option<Self> {
        let carbohydrate = facts.carbohydrate.unwrap_or(0.0);
        let protein = facts.protein.unwrap_or(0.0);
        let total_fat = facts.total_fat.unwrap_or(0.0);
        let total = carbohydrate + protein + total_fat;
        if total <= 0.0 {
            return None;
        }
        Some(Self {
            carbohydrate: carbohydrate * 100.0 / total,
            protein: protein * 100.0 / total,
            total_fat: total_fat * 100.0 / total,
        })
    }
}

impl DestructMeal {
    /// Figures of the meal, available whether or not it was discarded.
    pub fn figures(&self) -> MealFigures {
        MealFigures::of(&self.recipes, self.lifecycle.is_discarded())
    }
}

impl Meal {
    pub fn create_meal(
        author_id: AuthorId,
        draft: MealDraft,
    ) -> error_stack::Result<Self, KernelError> {
        let MealDraft {
            name,
            menu_id,
            description,
            notes,
            image_url,
            tags,
            recipes,
        } = draft;
        check_rule(TagsOwnedBy::of(&tags, &author_id, TagType::Meal))?;
        let id = MealId::new(Uuid::new_v4());
        let recipes = recipes
            .into_iter()
            .map(|draft| Recipe::create_recipe(id, author_id, draft))
            .collect::<error_stack::Result<Vec<_>, _>>()?;
        Ok(Self {
            id,
            name,
            author_id,
            menu_id,
            description,
            notes,
            like: None,
            image_url,
            tags,
            recipes,
            lifecycle: Lifecycle::new(),
        })
    }

    /// Rebuilds a persisted meal. Its recipes must already be restored and
    /// belong to this meal and author.
    pub fn restore(meal: DestructMeal) -> error_stack::Result<Self, KernelError> {
        check_rule(TagsOwnedBy::of(&meal.tags, &meal.author_id, TagType::Meal))?;
        if let Some(recipe) = meal
            .recipes
            .iter()
            .find(|recipe| recipe.meal_id() != &meal.id || recipe.author_id() != &meal.author_id)
        {
            return Err(Report::new(KernelError::Validation).attach_printable(format!(
                "recipe {:?} does not belong to meal {:?}",
                recipe.id(),
                meal.id
            )));
        }
        Ok(meal.freeze())
    }

    pub fn id(&self) -> &MealId {
        &self.id
    }

    pub fn author_id(&self) -> &AuthorId {
        &self.author_id
    }

    pub fn version(&self) -> &Version<Meal> {
        self.lifecycle.version()
    }

    /// Version this meal was loaded at, `None` when it was never persisted.
    pub fn persisted_version(&self) -> Option<&Version<Meal>> {
        self.lifecycle.persisted_version()
    }

    pub fn is_discarded(&self) -> bool {
        self.lifecycle.is_discarded()
    }

    pub fn created_at(&self) -> &CreatedAt<Meal> {
        self.lifecycle.created_at()
    }

    pub fn updated_at(&self) -> &UpdatedAt<Meal> {
        self.lifecycle.updated_at()
    }

    pub fn name(&self) -> error_stack::Result<&String, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.name)
    }

    pub fn menu_id(&self) -> error_stack::Result<Option<&MenuId>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.menu_id.as_ref())
    }

    pub fn description(&self) -> error_stack::Result<Option<&String>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.description.as_ref())
    }

    pub fn notes(&self) -> error_stack::Result<Option<&String>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.notes.as_ref())
    }

    pub fn like(&self) -> error_stack::Result<Option<bool>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.like)
    }

    pub fn image_url(&self) -> error_stack::Result<Option<&String>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.image_url.as_ref())
    }

    pub fn tags(&self) -> error_stack::Result<&BTreeSet<Tag>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.tags)
    }

    pub fn recipes(&self) -> error_stack::Result<&[Recipe], KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.recipes)
    }

    pub fn find_recipe(
        &self,
        recipe_id: &RecipeId,
    ) -> error_stack::Result<Option<&Recipe>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.recipes.iter().find(|recipe| recipe.id() == recipe_id))
    }

    fn figures(&self) -> MealFigures {
        MealFigures::of(&self.recipes, self.lifecycle.is_discarded())
    }

    /// Sum of the nutrition facts of every recipe that has them.
    pub fn nutri_facts(&self) -> error_stack::Result<Option<NutriFacts>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.figures().nutri_facts)
    }

    /// Total weight of the recipes. `None` when no recipe has one or the sum
    /// does not fit in a `u32`.
    pub fn weight_in_grams(&self) -> error_stack::Result<Option<u32>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.figures().weight_in_grams)
    }

    /// Longest preparation time among the recipes, in minutes.
    pub fn total_time(&self) -> error_stack::Result<Option<u32>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.figures().total_time)
    }

    /// Kilocalories per 100 grams.
    pub fn calorie_density(&self) -> error_stack::Result<Option<f64>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.figures().calorie_density)
    }

    pub fn macro_division(&self) -> error_stack::Result<Option<MacroDivision>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.figures().macro_division)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> error_stack::Result<(), KernelError> {
        self.update_properties(MealUpdates {
            name: Some(name.into()),
            ..Default::default()
        })
    }

    pub fn set_menu_id(&mut self, menu_id: Option<MenuId>) -> error_stack::Result<(), KernelError> {
        self.update_properties(MealUpdates {
            menu_id: Some(menu_id),
            ..Default::default()
        })
    }

    pub fn set_description(
        &mut self,
        description: Option<String>,
    ) -> error_stack::Result<(), KernelError> {
        self.update_properties(MealUpdates {
            description: Some(description),
            ..Default::default()
        })
    }

    pub fn set_like(&mut self, like: Option<bool>) -> error_stack::Result<(), KernelError> {
        self.update_properties(MealUpdates {
            like: Some(like),
            ..Default::default()
        })
    }

    pub fn set_tags(&mut self, tags: BTreeSet<Tag>) -> error_stack::Result<(), KernelError> {
        self.update_properties(MealUpdates {
            tags: Some(tags),
            ..Default::default()
        })
    }

    pub fn update_properties(&mut self, updates: MealUpdates) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        let MealUpdates {
            name,
            menu_id,
            description,
            notes,
            like,
            image_url,
            tags,
        } = updates;
        if let Some(tags) = &tags {
            check_rule(TagsOwnedBy::of(tags, &self.author_id, TagType::Meal))?;
        }
        let mut changed = false;
        if let Some(name) = name {
            changed |= replace_if_changed(&mut self.name, name);
        }
        if let Some(menu_id) = menu_id {
            changed |= replace_if_changed(&mut self.menu_id, menu_id);
        }
        if let Some(description) = description {
            changed |= replace_if_changed(&mut self.description, description);
        }
        if let Some(notes) = notes {
            changed |= replace_if_changed(&mut self.notes, notes);
        }
        if let Some(like) = like {
            changed |= replace_if_changed(&mut self.like, like);
        }
        if let Some(image_url) = image_url {
            changed |= replace_if_changed(&mut self.image_url, image_url);
        }
        if let Some(tags) = tags {
            changed |= replace_if_changed(&mut self.tags, tags);
        }
        if changed {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn create_recipe(&mut self, draft: RecipeDraft) -> error_stack::Result<RecipeId, KernelError> {
        self.lifecycle.check_not_discarded()?;
        let recipe = Recipe::create_recipe(self.id, self.author_id, draft)?;
        let id = *recipe.id();
        self.recipes.push(recipe);
        self.lifecycle.increment_version();
        Ok(id)
    }

    pub fn update_recipe(
        &mut self,
        recipe_id: &RecipeId,
        updates: RecipeUpdates,
    ) -> error_stack::Result<(), KernelError> {
        self.with_recipe(recipe_id, |recipe| recipe.update_properties(updates))
    }

    pub fn rate_recipe(
        &mut self,
        recipe_id: &RecipeId,
        rating: Rating,
    ) -> error_stack::Result<(), KernelError> {
        self.with_recipe(recipe_id, |recipe| recipe.rate(rating))
    }

    /// Applies `change` to one live recipe and bumps the meal's version when
    /// the recipe's version moved.
    fn with_recipe<F>(&mut self, recipe_id: &RecipeId, change: F) -> error_stack::Result<(), KernelError>
    where
        F: FnOnce(&mut Recipe) -> error_stack::Result<(), KernelError>,
    {
        self.lifecycle.check_not_discarded()?;
        let recipe = self
            .recipes
            .iter_mut()
            .find(|recipe| recipe.id() == recipe_id)
            .ok_or_else(|| {
                Report::new(KernelError::NotFound)
                    .attach_printable(format!("recipe {recipe_id:?} is not part of this meal"))
            })?;
        let before = recipe.version().clone();
        change(recipe)?;
        if recipe.version() != &before {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    /// Discards the recipe and drops it from the live list, handing it back.
    ///
    /// Returns `None` without touching the version when the recipe is not
    /// (or no longer) part of this meal.
    pub fn delete_recipe(
        &mut self,
        recipe_id: &RecipeId,
    ) -> error_stack::Result<Option<Recipe>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        let Some(position) = self
            .recipes
            .iter()
            .position(|recipe| recipe.id() == recipe_id && !recipe.is_discarded())
        else {
            return Ok(None);
        };
        let mut recipe = self.recipes.remove(position);
        recipe.discard();
        self.lifecycle.increment_version();
        Ok(Some(recipe))
    }

    /// Discards the meal and all of its recipes. Deleting an already discarded
    /// meal does nothing.
    pub fn delete(&mut self) {
        if self.lifecycle.is_discarded() {
            return;
        }
        for recipe in &mut self.recipes {
            recipe.discard();
        }
        self.lifecycle.discard();
    }
}
