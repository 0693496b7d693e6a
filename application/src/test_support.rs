use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use error_stack::{Report, ResultExt};

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::onboarding::{
    ClientOnboardingProvider, DependOnClientOnboardingProvider, DependOnFormResponseMapper,
    FormResponseCandidates, FormResponseMapper,
};
use kernel::interface::query::{ClientQuery, DependOnClientQuery, DependOnMealQuery, MealQuery};
use kernel::interface::update::{
    ClientModifier, DependOnClientModifier, DependOnMealModifier, MealModifier,
};
use kernel::prelude::entity::{
    Address, Client, ClientId, ContactInfo, Meal, MealId, Menu, MenuId, Profile, Recipe, RecipeId,
};
use kernel::KernelError;

use crate::transfer::{ApiClient, ApiMeal};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[derive(Debug, Clone, Default)]
struct Store {
    clients: HashMap<ClientId, Client>,
    menus: HashMap<MenuId, Menu>,
    meals: HashMap<MealId, Meal>,
    recipes: HashMap<RecipeId, Recipe>,
}

/// Unit-of-work fake: a transaction works on a copy of the store that only
/// replaces the shared one on commit.
#[derive(Default)]
pub struct InMemoryDatabase {
    store: Arc<Mutex<Store>>,
    form_responses: HashMap<String, serde_json::Value>,
}

impl InMemoryDatabase {
    pub fn with_form_response(mut self, id: &str, response: serde_json::Value) -> Self {
        self.form_responses.insert(id.to_string(), response);
        self
    }

    pub fn stored_client(&self, id: &ClientId) -> Option<Client> {
        self.store.lock().unwrap().clients.get(id).cloned()
    }

    pub fn discarded_menu(&self, id: &MenuId) -> Option<Menu> {
        self.store.lock().unwrap().menus.get(id).cloned()
    }

    pub fn stored_meal(&self, id: &MealId) -> Option<Meal> {
        self.store.lock().unwrap().meals.get(id).cloned()
    }

    pub fn discarded_recipe(&self, id: &RecipeId) -> Option<Recipe> {
        self.store.lock().unwrap().recipes.get(id).cloned()
    }
}

pub struct InMemoryTransaction {
    shared: Arc<Mutex<Store>>,
    staged: Store,
}

#[async_trait::async_trait]
impl DatabaseConnection for InMemoryDatabase {
    type Transaction = InMemoryTransaction;

    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let staged = self.store.lock().unwrap().clone();
        Ok(InMemoryTransaction {
            shared: Arc::clone(&self.store),
            staged,
        })
    }
}

#[async_trait::async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        *self.shared.lock().unwrap() = self.staged;
        Ok(())
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}

/// Updates must start from the version that is stored right now.
fn check_version(stored: Option<i64>, loaded: Option<i64>) -> error_stack::Result<(), KernelError> {
    match (stored, loaded) {
        (None, _) => Err(Report::new(KernelError::NotFound)),
        (Some(_), None) => Err(Report::new(KernelError::Concurrency)
            .attach_printable("entity was never loaded")),
        (Some(stored), Some(loaded)) if stored != loaded => Err(Report::new(
            KernelError::Concurrency,
        )
        .attach_printable(format!("stored version {stored} differs from loaded {loaded}"))),
        (Some(_), Some(_)) => Ok(()),
    }
}

#[async_trait::async_trait]
impl ClientQuery for InMemoryDatabase {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &ClientId,
    ) -> error_stack::Result<Option<Client>, KernelError> {
        con.staged
            .clients
            .get(id)
            .filter(|client| !client.is_discarded())
            .map(|client| {
                ApiClient::from_domain(client)
                    .and_then(|api| api.to_domain())
                    .change_context(KernelError::Internal)
            })
            .transpose()
    }
}

#[async_trait::async_trait]
impl ClientModifier for InMemoryDatabase {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        client: &Client,
    ) -> error_stack::Result<(), KernelError> {
        if con.staged.clients.contains_key(client.id()) {
            return Err(Report::new(KernelError::Internal));
        }
        con.staged.clients.insert(*client.id(), client.clone());
        Ok(())
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        client: &Client,
        removed: &[Menu],
    ) -> error_stack::Result<(), KernelError> {
        let stored = con.staged.clients.get(client.id()).map(|c| *c.version().as_ref());
        check_version(stored, client.persisted_version().map(|v| *v.as_ref()))?;
        con.staged.clients.insert(*client.id(), client.clone());
        for menu in removed {
            con.staged.menus.insert(*menu.id(), menu.clone());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MealQuery for InMemoryDatabase {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &MealId,
    ) -> error_stack::Result<Option<Meal>, KernelError> {
        con.staged
            .meals
            .get(id)
            .filter(|meal| !meal.is_discarded())
            .map(|meal| {
                ApiMeal::from_domain(meal)
                    .and_then(|api| api.to_domain())
                    .change_context(KernelError::Internal)
            })
            .transpose()
    }
}

#[async_trait::async_trait]
impl MealModifier for InMemoryDatabase {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        meal: &Meal,
    ) -> error_stack::Result<(), KernelError> {
        if con.staged.meals.contains_key(meal.id()) {
            return Err(Report::new(KernelError::Internal));
        }
        con.staged.meals.insert(*meal.id(), meal.clone());
        Ok(())
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        meal: &Meal,
        removed: &[Recipe],
    ) -> error_stack::Result<(), KernelError> {
        let stored = con.staged.meals.get(meal.id()).map(|m| *m.version().as_ref());
        check_version(stored, meal.persisted_version().map(|v| *v.as_ref()))?;
        con.staged.meals.insert(*meal.id(), meal.clone());
        for recipe in removed {
            con.staged.recipes.insert(*recipe.id(), recipe.clone());
        }
        Ok(())
    }
}

impl DependOnClientQuery for InMemoryDatabase {
    type ClientQuery = Self;
    fn client_query(&self) -> &Self::ClientQuery {
        self
    }
}

impl DependOnClientModifier for InMemoryDatabase {
    type ClientModifier = Self;
    fn client_modifier(&self) -> &Self::ClientModifier {
        self
    }
}

impl DependOnMealQuery for InMemoryDatabase {
    type MealQuery = Self;
    fn meal_query(&self) -> &Self::MealQuery {
        self
    }
}

impl DependOnMealModifier for InMemoryDatabase {
    type MealModifier = Self;
    fn meal_modifier(&self) -> &Self::MealModifier {
        self
    }
}

#[async_trait::async_trait]
impl ClientOnboardingProvider for InMemoryDatabase {
    async fn get_form_response(
        &self,
        form_response_id: &str,
    ) -> error_stack::Result<serde_json::Value, KernelError> {
        self.form_responses
            .get(form_response_id)
            .cloned()
            .ok_or_else(|| Report::new(KernelError::NotFound))
    }
}

impl DependOnClientOnboardingProvider for InMemoryDatabase {
    type ClientOnboardingProvider = Self;
    fn client_onboarding_provider(&self) -> &Self::ClientOnboardingProvider {
        self
    }
}

/// Reads a flat `{name, email, city, notes, tags}` form.
impl FormResponseMapper for InMemoryDatabase {
    fn map(
        &self,
        form_response: &serde_json::Value,
    ) -> error_stack::Result<FormResponseCandidates, KernelError> {
        let text = |key: &str| form_response.get(key).and_then(|v| v.as_str()).map(String::from);
        let tags = form_response
            .get("tags")
            .and_then(|tags| tags.as_array())
            .into_iter()
            .flatten()
            .filter_map(|tag| Some((tag.get("key")?.as_str()?.to_string(), tag.get("value")?.as_str()?.to_string())))
            .collect();
        Ok(FormResponseCandidates {
            profile: text("name").map(|name| Profile::new(name, None, None)),
            contact_info: text("email").map(|email| {
                ContactInfo::new(
                    None,
                    Some(email.clone()),
                    BTreeSet::new(),
                    BTreeSet::from([email]),
                )
            }),
            address: text("city").map(|city| Address {
                city: Some(city),
                ..Default::default()
            }),
            tags,
            notes: text("notes"),
        })
    }
}

impl DependOnFormResponseMapper for InMemoryDatabase {
    type FormResponseMapper = Self;
    fn form_response_mapper(&self) -> &Self::FormResponseMapper {
        self
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use kernel::interface::database::DatabaseConnection;
    use kernel::interface::query::{ClientQuery, MealQuery};
    use kernel::interface::update::{ClientModifier, MealModifier};
    use kernel::prelude::entity::{AuthorId, Client, Meal, MealDraft, Profile};
    use kernel::KernelError;

    use super::InMemoryDatabase;

    #[tokio::test]
    async fn second_writer_from_same_client_version_conflicts() {
        let database = InMemoryDatabase::default();
        let mut con = database.transact().await.unwrap();
        let client = Client::create_client(
            AuthorId::new(Uuid::new_v4()),
            Profile::new("Ana", None, None),
            None,
            None,
            BTreeSet::new(),
            None,
            None,
        )
        .unwrap();
        ClientModifier::create(&database, &mut con, &client).await.unwrap();

        let unloaded = ClientModifier::update(&database, &mut con, &client, &[])
            .await
            .unwrap_err();
        assert_eq!(unloaded.current_context(), &KernelError::Concurrency);

        let mut first = ClientQuery::find_by_id(&database, &mut con, client.id())
            .await
            .unwrap()
            .unwrap();
        let mut second = ClientQuery::find_by_id(&database, &mut con, client.id())
            .await
            .unwrap()
            .unwrap();
        first.set_notes(Some(String::from("first"))).unwrap();
        second.set_notes(Some(String::from("second"))).unwrap();

        ClientModifier::update(&database, &mut con, &first, &[]).await.unwrap();
        let report = ClientModifier::update(&database, &mut con, &second, &[])
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Concurrency);
    }

    #[tokio::test]
    async fn second_writer_from_same_meal_version_conflicts() {
        let database = InMemoryDatabase::default();
        let mut con = database.transact().await.unwrap();
        let meal = Meal::create_meal(AuthorId::new(Uuid::new_v4()), MealDraft::new("Lunch")).unwrap();
        MealModifier::create(&database, &mut con, &meal).await.unwrap();

        let mut first = MealQuery::find_by_id(&database, &mut con, meal.id())
            .await
            .unwrap()
            .unwrap();
        let mut second = MealQuery::find_by_id(&database, &mut con, meal.id())
            .await
            .unwrap()
            .unwrap();
        first.set_name("Brunch").unwrap();
        second.set_like(Some(true)).unwrap();

        MealModifier::update(&database, &mut con, &first, &[]).await.unwrap();
        let report = MealModifier::update(&database, &mut con, &second, &[])
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Concurrency);

        let reloaded = MealQuery::find_by_id(&database, &mut con, meal.id())
            .await
            .unwrap()
            .unwrap();
        MealModifier::update(&database, &mut con, &reloaded, &[]).await.unwrap();
    }
}
