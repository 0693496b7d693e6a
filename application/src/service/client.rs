use error_stack::Report;

use kernel::interface::command::{CreateClient, DeleteClient, UpdateClient};
use kernel::interface::database::{
    DatabaseConnection, DependOnDatabaseConnection, Transaction, TransactionOf,
};
use kernel::interface::query::{ClientQuery, DependOnClientQuery};
use kernel::interface::update::{ClientModifier, DependOnClientModifier};
use kernel::prelude::entity::{Client, ClientId};
use kernel::KernelError;

/// Loads a live client inside `con`, failing with `NotFound` when absent.
pub(crate) async fn load_client<T>(
    deps: &T,
    con: &mut TransactionOf<T>,
    id: &ClientId,
) -> error_stack::Result<Client, KernelError>
where
    T: DependOnClientQuery + ?Sized,
{
    deps.client_query()
        .find_by_id(con, id)
        .await?
        .ok_or_else(|| {
            Report::new(KernelError::NotFound).attach_printable(format!("client {id:?} not found"))
        })
}

#[async_trait::async_trait]
pub trait CreateClientService: 'static + Sync + Send + DependOnClientModifier {
    async fn create_client(
        &self,
        command: CreateClient,
    ) -> error_stack::Result<ClientId, KernelError> {
        let CreateClient {
            author_id,
            profile,
            contact_info,
            address,
            tags,
            notes,
        } = command;
        let client = Client::create_client(
            author_id,
            profile,
            contact_info,
            address,
            tags,
            notes,
            None,
        )?;

        let mut connection = self.database_connection().transact().await?;
        self.client_modifier()
            .create(&mut connection, &client)
            .await?;
        connection.commit().await?;

        tracing::info!(client_id = ?client.id(), "client created");
        Ok(*client.id())
    }
}

impl<T> CreateClientService for T where T: DependOnClientModifier {}

#[async_trait::async_trait]
pub trait UpdateClientService:
    'static + Sync + Send + DependOnClientQuery + DependOnClientModifier
{
    async fn update_client(&self, command: UpdateClient) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let mut client = load_client(self, &mut connection, &command.client_id).await?;
        client.update_properties(command.updates)?;
        self.client_modifier()
            .update(&mut connection, &client, &[])
            .await?;
        connection.commit().await?;

        tracing::info!(client_id = ?client.id(), version = client.version().as_ref(), "client updated");
        Ok(())
    }
}

impl<T> UpdateClientService for T where T: DependOnClientQuery + DependOnClientModifier {}

#[async_trait::async_trait]
pub trait DeleteClientService:
    'static + Sync + Send + DependOnClientQuery + DependOnClientModifier
{
    /// Discards the client and its menus.
    async fn delete_client(&self, command: DeleteClient) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let mut client = load_client(self, &mut connection, &command.client_id).await?;
        client.delete();
        self.client_modifier()
            .update(&mut connection, &client, &[])
            .await?;
        connection.commit().await?;

        tracing::info!(client_id = ?client.id(), "client deleted");
        Ok(())
    }
}

impl<T> DeleteClientService for T where T: DependOnClientQuery + DependOnClientModifier {}
