use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Client, Menu};
use crate::KernelError;

#[async_trait::async_trait]
pub trait ClientModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn create(
        &self,
        con: &mut Self::Transaction,
        client: &Client,
    ) -> error_stack::Result<(), KernelError>;
    /// Persists the client and its live menus, and marks every menu in
    /// `removed` as discarded.
    ///
    /// Fails with [`KernelError::Concurrency`] unless the stored version is
    /// still the one the client was loaded at.
    async fn update(
        &self,
        con: &mut Self::Transaction,
        client: &Client,
        removed: &[Menu],
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnClientModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type ClientModifier: ClientModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn client_modifier(&self) -> &Self::ClientModifier;
}
