use kernel::interface::command::{CreateMenu, DeleteMenu, UpdateMenu};
use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::DependOnClientQuery;
use kernel::interface::update::{ClientModifier, DependOnClientModifier};
use kernel::prelude::entity::MenuId;
use kernel::KernelError;

use crate::service::load_client;

#[async_trait::async_trait]
pub trait CreateMenuService:
    'static + Sync + Send + DependOnClientQuery + DependOnClientModifier
{
    async fn create_menu(&self, command: CreateMenu) -> error_stack::Result<MenuId, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let mut client = load_client(self, &mut connection, &command.client_id).await?;
        let menu_id = client.create_menu(command.description, command.tags)?;
        self.client_modifier()
            .update(&mut connection, &client, &[])
            .await?;
        connection.commit().await?;

        tracing::info!(client_id = ?client.id(), menu_id = ?menu_id, "menu created");
        Ok(menu_id)
    }
}

impl<T> CreateMenuService for T where T: DependOnClientQuery + DependOnClientModifier {}

#[async_trait::async_trait]
pub trait UpdateMenuService:
    'static + Sync + Send + DependOnClientQuery + DependOnClientModifier
{
    async fn update_menu(&self, command: UpdateMenu) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let mut client = load_client(self, &mut connection, &command.client_id).await?;
        client.update_menu(&command.menu_id, command.updates)?;
        self.client_modifier()
            .update(&mut connection, &client, &[])
            .await?;
        connection.commit().await?;

        tracing::info!(client_id = ?client.id(), menu_id = ?command.menu_id, "menu updated");
        Ok(())
    }
}

impl<T> UpdateMenuService for T where T: DependOnClientQuery + DependOnClientModifier {}

#[async_trait::async_trait]
pub trait DeleteMenuService:
    'static + Sync + Send + DependOnClientQuery + DependOnClientModifier
{
    /// Deleting a menu the client does not own is a no-op.
    async fn delete_menu(&self, command: DeleteMenu) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let mut client = load_client(self, &mut connection, &command.client_id).await?;
        let Some(menu) = client.delete_menu(&command.menu_id)? else {
            tracing::debug!(client_id = ?client.id(), menu_id = ?command.menu_id, "menu already gone");
            connection.roll_back().await?;
            return Ok(());
        };
        self.client_modifier()
            .update(&mut connection, &client, &[menu])
            .await?;
        connection.commit().await?;

        tracing::info!(client_id = ?client.id(), menu_id = ?command.menu_id, "menu deleted");
        Ok(())
    }
}

impl<T> DeleteMenuService for T where T: DependOnClientQuery + DependOnClientModifier {}
