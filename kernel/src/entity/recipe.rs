mod id;
mod ingredient;
mod privacy;
mod rating;

use std::collections::BTreeSet;

use destructure::Destructure;
use error_stack::Report;
use uuid::Uuid;

pub use self::{id::*, ingredient::*, privacy::*, rating::*};
use crate::entity::common::replace_if_changed;
use crate::entity::{
    AuthorId, CreatedAt, Lifecycle, MealId, NutriFacts, Tag, TagType, UpdatedAt, UserId, Version,
};
use crate::rule::{
    check_rule, IngredientPositionsAreUnique, RatingsAreUniquePerUser, TagsOwnedBy,
};
use crate::KernelError;

/// A recipe that is part of a [`Meal`](crate::entity::Meal).
///
/// Recipes are created, changed and discarded through their meal, which
/// recomputes its own nutrition figures from them.
#[derive(Debug, Clone, PartialEq, Destructure)]
pub struct Recipe {
    id: RecipeId,
    meal_id: MealId,
    author_id: AuthorId,
    name: String,
    description: Option<String>,
    instructions: String,
    utensils: Option<String>,
    total_time: Option<u32>,
    notes: Option<String>,
    tags: BTreeSet<Tag>,
    privacy: Privacy,
    ingredients: Vec<Ingredient>,
    ratings: Vec<Rating>,
    nutri_facts: Option<NutriFacts>,
    weight_in_grams: Option<u32>,
    image_url: Option<String>,
    lifecycle: Lifecycle<Recipe>,
}

/// Content of a recipe that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub name: String,
    pub description: Option<String>,
    pub instructions: String,
    pub utensils: Option<String>,
    pub total_time: Option<u32>,
    pub notes: Option<String>,
    pub tags: BTreeSet<Tag>,
    pub privacy: Privacy,
    pub ingredients: Vec<Ingredient>,
    pub nutri_facts: Option<NutriFacts>,
    pub weight_in_grams: Option<u32>,
    pub image_url: Option<String>,
}

impl RecipeDraft {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            instructions: instructions.into(),
            utensils: None,
            total_time: None,
            notes: None,
            tags: BTreeSet::new(),
            privacy: Privacy::default(),
            ingredients: Vec::new(),
            nutri_facts: None,
            weight_in_grams: None,
            image_url: None,
        }
    }
}

/// Fields of a recipe to change at once. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeUpdates {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub instructions: Option<String>,
    pub utensils: Option<Option<String>>,
    pub total_time: Option<Option<u32>>,
    pub notes: Option<Option<String>>,
    pub tags: Option<BTreeSet<Tag>>,
    pub privacy: Option<Privacy>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub nutri_facts: Option<Option<NutriFacts>>,
    pub weight_in_grams: Option<Option<u32>>,
    pub image_url: Option<Option<String>>,
}

impl Recipe {
    pub(crate) fn create_recipe(
        meal_id: MealId,
        author_id: AuthorId,
        draft: RecipeDraft,
    ) -> error_stack::Result<Self, KernelError> {
        check_rule(TagsOwnedBy::of(&draft.tags, &author_id, TagType::Recipe))?;
        check_rule(IngredientPositionsAreUnique::new(&draft.ingredients))?;
        let RecipeDraft {
            name,
            description,
            instructions,
            utensils,
            total_time,
            notes,
            tags,
            privacy,
            ingredients,
            nutri_facts,
            weight_in_grams,
            image_url,
        } = draft;
        Ok(Self {
            id: RecipeId::new(Uuid::new_v4()),
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
            ratings: Vec::new(),
            nutri_facts,
            weight_in_grams,
            image_url,
            lifecycle: Lifecycle::new(),
        })
    }

    pub fn restore(recipe: DestructRecipe) -> error_stack::Result<Self, KernelError> {
        check_rule(TagsOwnedBy::of(
            &recipe.tags,
            &recipe.author_id,
            TagType::Recipe,
        ))?;
        check_rule(IngredientPositionsAreUnique::new(&recipe.ingredients))?;
        check_rule(RatingsAreUniquePerUser::new(&recipe.ratings))?;
        Ok(recipe.freeze())
    }

    pub fn id(&self) -> &RecipeId {
        &self.id
    }

    pub fn meal_id(&self) -> &MealId {
        &self.meal_id
    }

    pub fn author_id(&self) -> &AuthorId {
        &self.author_id
    }

    pub fn version(&self) -> &Version<Recipe> {
        self.lifecycle.version()
    }

    pub fn is_discarded(&self) -> bool {
        self.lifecycle.is_discarded()
    }

    pub fn created_at(&self) -> &CreatedAt<Recipe> {
        self.lifecycle.created_at()
    }

    pub fn updated_at(&self) -> &UpdatedAt<Recipe> {
        self.lifecycle.updated_at()
    }

    pub fn name(&self) -> error_stack::Result<&String, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.name)
    }

    pub fn description(&self) -> error_stack::Result<Option<&String>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.description.as_ref())
    }

    pub fn instructions(&self) -> error_stack::Result<&String, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.instructions)
    }

    pub fn utensils(&self) -> error_stack::Result<Option<&String>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.utensils.as_ref())
    }

    pub fn total_time(&self) -> error_stack::Result<Option<u32>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.total_time)
    }

    pub fn notes(&self) -> error_stack::Result<Option<&String>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.notes.as_ref())
    }

    pub fn tags(&self) -> error_stack::Result<&BTreeSet<Tag>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.tags)
    }

    pub fn privacy(&self) -> error_stack::Result<Privacy, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.privacy)
    }

    pub fn ingredients(&self) -> error_stack::Result<&[Ingredient], KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.ingredients)
    }

    pub fn ratings(&self) -> error_stack::Result<&[Rating], KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(&self.ratings)
    }

    pub fn nutri_facts(&self) -> error_stack::Result<Option<&NutriFacts>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.nutri_facts.as_ref())
    }

    pub fn weight_in_grams(&self) -> error_stack::Result<Option<u32>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.weight_in_grams)
    }

    pub fn image_url(&self) -> error_stack::Result<Option<&String>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(self.image_url.as_ref())
    }

    pub(crate) fn recorded_nutri_facts(&self) -> Option<&NutriFacts> {
        self.nutri_facts.as_ref()
    }

    pub(crate) fn recorded_weight_in_grams(&self) -> Option<u32> {
        self.weight_in_grams
    }

    pub(crate) fn recorded_total_time(&self) -> Option<u32> {
        self.total_time
    }

    pub fn average_taste_rating(&self) -> error_stack::Result<Option<f64>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(average(self.ratings.iter().map(|rating| *rating.taste())))
    }

    pub fn average_convenience_rating(&self) -> error_stack::Result<Option<f64>, KernelError> {
        self.lifecycle.check_not_discarded()?;
        Ok(average(self.ratings.iter().map(|rating| *rating.convenience())))
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> error_stack::Result<(), KernelError> {
        self.update_properties(RecipeUpdates {
            name: Some(name.into()),
            ..Default::default()
        })
    }

    pub fn set_description(
        &mut self,
        description: Option<String>,
    ) -> error_stack::Result<(), KernelError> {
        self.update_properties(RecipeUpdates {
            description: Some(description),
            ..Default::default()
        })
    }

    pub fn set_instructions(
        &mut self,
        instructions: impl Into<String>,
    ) -> error_stack::Result<(), KernelError> {
        self.update_properties(RecipeUpdates {
            instructions: Some(instructions.into()),
            ..Default::default()
        })
    }

    pub fn set_tags(&mut self, tags: BTreeSet<Tag>) -> error_stack::Result<(), KernelError> {
        self.update_properties(RecipeUpdates {
            tags: Some(tags),
            ..Default::default()
        })
    }

    pub fn set_privacy(&mut self, privacy: Privacy) -> error_stack::Result<(), KernelError> {
        self.update_properties(RecipeUpdates {
            privacy: Some(privacy),
            ..Default::default()
        })
    }

    pub fn set_ingredients(
        &mut self,
        ingredients: Vec<Ingredient>,
    ) -> error_stack::Result<(), KernelError> {
        self.update_properties(RecipeUpdates {
            ingredients: Some(ingredients),
            ..Default::default()
        })
    }

    pub fn set_nutri_facts(
        &mut self,
        nutri_facts: Option<NutriFacts>,
    ) -> error_stack::Result<(), KernelError> {
        self.update_properties(RecipeUpdates {
            nutri_facts: Some(nutri_facts),
            ..Default::default()
        })
    }

    pub fn set_weight_in_grams(
        &mut self,
        weight_in_grams: Option<u32>,
    ) -> error_stack::Result<(), KernelError> {
        self.update_properties(RecipeUpdates {
            weight_in_grams: Some(weight_in_grams),
            ..Default::default()
        })
    }

    pub fn update_properties(
        &mut self,
        updates: RecipeUpdates,
    ) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        let RecipeUpdates {
            name,
            description,
            instructions,
            utensils,
            total_time,
            notes,
            tags,
            privacy,
            ingredients,
            nutri_facts,
            weight_in_grams,
            image_url,
        } = updates;
        if let Some(tags) = &tags {
            check_rule(TagsOwnedBy::of(tags, &self.author_id, TagType::Recipe))?;
        }
        if let Some(ingredients) = &ingredients {
            check_rule(IngredientPositionsAreUnique::new(ingredients))?;
        }

        let mut changed = false;
        if let Some(name) = name {
            changed |= replace_if_changed(&mut self.name, name);
        }
        if let Some(description) = description {
            changed |= replace_if_changed(&mut self.description, description);
        }
        if let Some(instructions) = instructions {
            changed |= replace_if_changed(&mut self.instructions, instructions);
        }
        if let Some(utensils) = utensils {
            changed |= replace_if_changed(&mut self.utensils, utensils);
        }
        if let Some(total_time) = total_time {
            changed |= replace_if_changed(&mut self.total_time, total_time);
        }
        if let Some(notes) = notes {
            changed |= replace_if_changed(&mut self.notes, notes);
        }
        if let Some(tags) = tags {
            changed |= replace_if_changed(&mut self.tags, tags);
        }
        if let Some(privacy) = privacy {
            changed |= replace_if_changed(&mut self.privacy, privacy);
        }
        if let Some(ingredients) = ingredients {
            changed |= replace_if_changed(&mut self.ingredients, ingredients);
        }
        if let Some(nutri_facts) = nutri_facts {
            changed |= replace_if_changed(&mut self.nutri_facts, nutri_facts);
        }
        if let Some(weight_in_grams) = weight_in_grams {
            changed |= replace_if_changed(&mut self.weight_in_grams, weight_in_grams);
        }
        if let Some(image_url) = image_url {
            changed |= replace_if_changed(&mut self.image_url, image_url);
        }
        if changed {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    /// Records the user's rating, replacing an earlier one by the same user.
    pub fn rate(&mut self, rating: Rating) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        if rating.recipe_id() != &self.id {
            return Err(Report::new(KernelError::Validation).attach_printable(format!(
                "rating for recipe {:?} given to recipe {:?}",
                rating.recipe_id(),
                self.id
            )));
        }
        if *rating.taste() > Rating::MAX_SCORE || *rating.convenience() > Rating::MAX_SCORE {
            return Err(Report::new(KernelError::Validation)
                .attach_printable(format!("scores must be at most {}", Rating::MAX_SCORE)));
        }
        let changed = match self
            .ratings
            .iter()
            .position(|existing| existing.user_id() == rating.user_id())
        {
            Some(index) => replace_if_changed(&mut self.ratings[index], rating),
            None => {
                self.ratings.push(rating);
                true
            }
        };
        if changed {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub fn delete_rate(&mut self, user_id: &UserId) -> error_stack::Result<(), KernelError> {
        self.lifecycle.check_not_discarded()?;
        let before = self.ratings.len();
        self.ratings.retain(|rating| rating.user_id() != user_id);
        if self.ratings.len() != before {
            self.lifecycle.increment_version();
        }
        Ok(())
    }

    pub(crate) fn discard(&mut self) -> bool {
        self.lifecycle.discard()
    }
}

impl DestructRecipe {
    /// Average taste score, available whether or not the recipe was discarded.
    pub fn average_taste_rating(&self) -> Option<f64> {
        average(self.ratings.iter().map(|rating| *rating.taste()))
    }

    pub fn average_convenience_rating(&self) -> Option<f64> {
        average(self.ratings.iter().map(|rating| *rating.convenience()))
    }
}

fn average(scores: impl ExactSizeIterator<Item = u8>) -> Option<f64> {
    let count = scores.len();
    if count == 0 {
        return None;
    }
    let total: u32 = scores.map(u32::from).sum();
    Some(f64::from(total) / count as f64)
}
