use crate::entity::{
    AuthorId, MealDraft, MealId, MealUpdates, Rating, RecipeDraft, RecipeId, RecipeUpdates,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateMeal {
    pub author_id: AuthorId,
    pub draft: MealDraft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateMeal {
    pub meal_id: MealId,
    pub updates: MealUpdates,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DeleteMeal {
    pub meal_id: MealId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRecipe {
    pub meal_id: MealId,
    pub draft: RecipeDraft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRecipe {
    pub meal_id: MealId,
    pub recipe_id: RecipeId,
    pub updates: RecipeUpdates,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DeleteRecipe {
    pub meal_id: MealId,
    pub recipe_id: RecipeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateRecipe {
    pub meal_id: MealId,
    pub rating: Rating,
}
