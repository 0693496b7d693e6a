use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Client, ClientId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait ClientQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    /// Loads the client with its live menus. Discarded clients are not found.
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &ClientId,
    ) -> error_stack::Result<Option<Client>, KernelError>;
}

pub trait DependOnClientQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type ClientQuery: ClientQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn client_query(&self) -> &Self::ClientQuery;
}
