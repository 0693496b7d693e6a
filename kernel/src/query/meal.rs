use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Meal, MealId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait MealQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    /// Loads the meal with its live recipes. Discarded meals are not found.
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &MealId,
    ) -> error_stack::Result<Option<Meal>, KernelError>;
}

pub trait DependOnMealQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type MealQuery: MealQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn meal_query(&self) -> &Self::MealQuery;
}
