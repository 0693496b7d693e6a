use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Meal, Recipe};
use crate::KernelError;

#[async_trait::async_trait]
pub trait MealModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn create(
        &self,
        con: &mut Self::Transaction,
        meal: &Meal,
    ) -> error_stack::Result<(), KernelError>;
    /// Persists the meal and its live recipes, and marks every recipe in
    /// `removed` as discarded.
    ///
    /// Fails with [`KernelError::Concurrency`] unless the stored version is
    /// still the one the meal was loaded at.
    async fn update(
        &self,
        con: &mut Self::Transaction,
        meal: &Meal,
        removed: &[Recipe],
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnMealModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type MealModifier: MealModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn meal_modifier(&self) -> &Self::MealModifier;
}
