use kernel::interface::command::{CreateRecipe, DeleteRecipe, RateRecipe, UpdateRecipe};
use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::DependOnMealQuery;
use kernel::interface::update::{DependOnMealModifier, MealModifier};
use kernel::prelude::entity::RecipeId;
use kernel::KernelError;

use crate::service::load_meal;

#[async_trait::async_trait]
pub trait CreateRecipeService:
    'static + Sync + Send + DependOnMealQuery + DependOnMealModifier
{
    async fn create_recipe(
        &self,
        command: CreateRecipe,
    ) -> error_stack::Result<RecipeId, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let mut meal = load_meal(self, &mut connection, &command.meal_id).await?;
        let recipe_id = meal.create_recipe(command.draft)?;
        self.meal_modifier()
            .update(&mut connection, &meal, &[])
            .await?;
        connection.commit().await?;

        tracing::info!(meal_id = ?meal.id(), recipe_id = ?recipe_id, "recipe created");
        Ok(recipe_id)
    }
}

impl<T> CreateRecipeService for T where T: DependOnMealQuery + DependOnMealModifier {}

#[async_trait::async_trait]
pub trait UpdateRecipeService:
    'static + Sync + Send + DependOnMealQuery + DependOnMealModifier
{
    async fn update_recipe(&self, command: UpdateRecipe) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let mut meal = load_meal(self, &mut connection, &command.meal_id).await?;
        meal.update_recipe(&command.recipe_id, command.updates)?;
        self.meal_modifier()
            .update(&mut connection, &meal, &[])
            .await?;
        connection.commit().await?;

        tracing::info!(meal_id = ?meal.id(), recipe_id = ?command.recipe_id, "recipe updated");
        Ok(())
    }
}

impl<T> UpdateRecipeService for T where T: DependOnMealQuery + DependOnMealModifier {}

#[async_trait::async_trait]
pub trait DeleteRecipeService:
    'static + Sync + Send + DependOnMealQuery + DependOnMealModifier
{
    /// Deleting a recipe the meal does not hold is a no-op.
    async fn delete_recipe(&self, command: DeleteRecipe) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let mut meal = load_meal(self, &mut connection, &command.meal_id).await?;
        let Some(recipe) = meal.delete_recipe(&command.recipe_id)? else {
            tracing::debug!(meal_id = ?meal.id(), recipe_id = ?command.recipe_id, "recipe already gone");
            connection.roll_back().await?;
            return Ok(());
        };
        self.meal_modifier()
            .update(&mut connection, &meal, &[recipe])
            .await?;
        connection.commit().await?;

        tracing::info!(meal_id = ?meal.id(), recipe_id = ?command.recipe_id, "recipe deleted");
        Ok(())
    }
}

impl<T> DeleteRecipeService for T where T: DependOnMealQuery + DependOnMealModifier {}

#[async_trait::async_trait]
pub trait RateRecipeService:
    'static + Sync + Send + DependOnMealQuery + DependOnMealModifier
{
    /// Records a rating, replacing the user's earlier one on the same recipe.
    async fn rate_recipe(&self, command: RateRecipe) -> error_stack::Result<(), KernelError> {
        let RateRecipe { meal_id, rating } = command;
        let recipe_id = *rating.recipe_id();
        let mut connection = self.database_connection().transact().await?;
        let mut meal = load_meal(self, &mut connection, &meal_id).await?;
        meal.rate_recipe(&recipe_id, rating)?;
        self.meal_modifier()
            .update(&mut connection, &meal, &[])
            .await?;
        connection.commit().await?;

        tracing::info!(meal_id = ?meal_id, recipe_id = ?recipe_id, "recipe rated");
        Ok(())
    }
}

impl<T> RateRecipeService for T where T: DependOnMealQuery + DependOnMealModifier {}
