use error_stack::Report;

use kernel::interface::command::CreateClientFromFormResponse;
use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::onboarding::{
    ClientOnboardingProvider, DependOnClientOnboardingProvider, DependOnFormResponseMapper,
    FormResponseMapper,
};
use kernel::interface::update::{ClientModifier, DependOnClientModifier};
use kernel::prelude::entity::{Client, ClientId};
use kernel::KernelError;

#[async_trait::async_trait]
pub trait CreateClientFromFormResponseService:
    'static
    + Sync
    + Send
    + DependOnClientModifier
    + DependOnClientOnboardingProvider
    + DependOnFormResponseMapper
{
    /// Creates a client out of an onboarding form response.
    ///
    /// Values given in the command take precedence over what the form
    /// carries, and the raw response is kept as the client's onboarding data.
    async fn create_client_from_form_response(
        &self,
        command: CreateClientFromFormResponse,
    ) -> error_stack::Result<ClientId, KernelError> {
        let CreateClientFromFormResponse {
            form_response_id,
            author_id,
            profile,
            contact_info,
            address,
            tags,
            notes,
        } = command;
        let response = self
            .client_onboarding_provider()
            .get_form_response(&form_response_id)
            .await?;
        let candidates = self.form_response_mapper().map(&response)?;

        let tags = tags.unwrap_or_else(|| candidates.client_tags(author_id));
        let profile = profile.or(candidates.profile).ok_or_else(|| {
            Report::new(KernelError::Validation).attach_printable(format!(
                "form response {form_response_id} carries no profile"
            ))
        })?;
        let client = Client::create_client(
            author_id,
            profile,
            contact_info.or(candidates.contact_info),
            address.or(candidates.address),
            tags,
            notes.or(candidates.notes),
            Some(response),
        )?;

        let mut connection = self.database_connection().transact().await?;
        self.client_modifier()
            .create(&mut connection, &client)
            .await?;
        connection.commit().await?;

        tracing::info!(client_id = ?client.id(), form_response_id = %form_response_id, "client onboarded");
        Ok(*client.id())
    }
}

impl<T> CreateClientFromFormResponseService for T where
    T: DependOnClientModifier + DependOnClientOnboardingProvider + DependOnFormResponseMapper
{
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use serde_json::json;
    use uuid::Uuid;

    use kernel::interface::command::CreateClientFromFormResponse;
    use kernel::prelude::entity::{Address, AuthorId, Profile, TagType};
    use kernel::KernelError;

    use super::CreateClientFromFormResponseService;
    use crate::test_support::{init_tracing, InMemoryDatabase};

    fn database() -> InMemoryDatabase {
        InMemoryDatabase::default().with_form_response(
            "form-1",
            json!({
                "name": "Carla",
                "email": "carla@example.com",
                "city": "Olinda",
                "notes": "runs marathons",
                "tags": [{"key": "goal", "value": "endurance"}]
            }),
        )
    }

    #[tokio::test]
    async fn form_values_fill_the_client() {
        init_tracing();
        let database = database();
        let author = AuthorId::new(Uuid::new_v4());
        let id = database
            .create_client_from_form_response(CreateClientFromFormResponse::new("form-1", author))
            .await
            .unwrap();

        let client = database.stored_client(&id).unwrap();
        assert_eq!(client.profile().unwrap().name(), "Carla");
        assert_eq!(
            client.address().unwrap().and_then(|address| address.city.clone()),
            Some(String::from("Olinda"))
        );
        assert_eq!(client.notes().unwrap().map(String::as_str), Some("runs marathons"));
        let tags = client.tags().unwrap();
        assert_eq!(tags.len(), 1);
        assert!(tags.iter().all(|tag| tag.is_owned_by(&author, TagType::Client)));
        assert_eq!(
            client.onboarding_data().unwrap().and_then(|data| data.get("email")),
            Some(&json!("carla@example.com"))
        );
    }

    #[tokio::test]
    async fn command_values_win_over_form() {
        init_tracing();
        let database = database();
        let mut command = CreateClientFromFormResponse::new("form-1", AuthorId::new(Uuid::new_v4()));
        command.profile = Some(Profile::new("Carla Souza", None, None));
        command.address = Some(Address {
            city: Some(String::from("Recife")),
            ..Default::default()
        });
        command.tags = Some(BTreeSet::new());
        let id = database.create_client_from_form_response(command).await.unwrap();

        let client = database.stored_client(&id).unwrap();
        assert_eq!(client.profile().unwrap().name(), "Carla Souza");
        assert_eq!(
            client.address().unwrap().and_then(|address| address.city.clone()),
            Some(String::from("Recife"))
        );
        assert!(client.tags().unwrap().is_empty());
        assert!(client.contact_info().unwrap().is_some());
    }

    #[tokio::test]
    async fn unknown_form_response_is_not_found() {
        init_tracing();
        let database = database();
        let report = database
            .create_client_from_form_response(CreateClientFromFormResponse::new(
                "form-2",
                AuthorId::new(Uuid::new_v4()),
            ))
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::NotFound);
    }
}
