use error_stack::Report;

use kernel::interface::command::{CreateMeal, DeleteMeal, UpdateMeal};
use kernel::interface::database::{
    DatabaseConnection, DependOnDatabaseConnection, Transaction, TransactionOf,
};
use kernel::interface::query::{DependOnMealQuery, MealQuery};
use kernel::interface::update::{DependOnMealModifier, MealModifier};
use kernel::prelude::entity::{Meal, MealId};
use kernel::KernelError;

/// Loads a live meal inside `con`, failing with `NotFound` when absent.
pub(crate) async fn load_meal<T>(
    deps: &T,
    con: &mut TransactionOf<T>,
    id: &MealId,
) -> error_stack::Result<Meal, KernelError>
where
    T: DependOnMealQuery + ?Sized,
{
    deps.meal_query()
        .find_by_id(con, id)
        .await?
        .ok_or_else(|| {
            Report::new(KernelError::NotFound).attach_printable(format!("meal {id:?} not found"))
        })
}

#[async_trait::async_trait]
pub trait CreateMealService: 'static + Sync + Send + DependOnMealModifier {
    async fn create_meal(&self, command: CreateMeal) -> error_stack::Result<MealId, KernelError> {
        let meal = Meal::create_meal(command.author_id, command.draft)?;

        let mut connection = self.database_connection().transact().await?;
        self.meal_modifier().create(&mut connection, &meal).await?;
        connection.commit().await?;

        tracing::info!(meal_id = ?meal.id(), "meal created");
        Ok(*meal.id())
    }
}

impl<T> CreateMealService for T where T: DependOnMealModifier {}

#[async_trait::async_trait]
pub trait UpdateMealService:
    'static + Sync + Send + DependOnMealQuery + DependOnMealModifier
{
    async fn update_meal(&self, command: UpdateMeal) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let mut meal = load_meal(self, &mut connection, &command.meal_id).await?;
        meal.update_properties(command.updates)?;
        self.meal_modifier()
            .update(&mut connection, &meal, &[])
            .await?;
        connection.commit().await?;

        tracing::info!(meal_id = ?meal.id(), version = meal.version().as_ref(), "meal updated");
        Ok(())
    }
}

impl<T> UpdateMealService for T where T: DependOnMealQuery + DependOnMealModifier {}

#[async_trait::async_trait]
pub trait DeleteMealService:
    'static + Sync + Send + DependOnMealQuery + DependOnMealModifier
{
    /// Discards the meal and its recipes.
    async fn delete_meal(&self, command: DeleteMeal) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let mut meal = load_meal(self, &mut connection, &command.meal_id).await?;
        meal.delete();
        self.meal_modifier()
            .update(&mut connection, &meal, &[])
            .await?;
        connection.commit().await?;

        tracing::info!(meal_id = ?meal.id(), "meal deleted");
        Ok(())
    }
}

impl<T> DeleteMealService for T where T: DependOnMealQuery + DependOnMealModifier {}
