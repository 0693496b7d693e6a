use error_stack::Report;
use sqlx::{Error, PgConnection, Pool, Postgres};

use application::transfer::{ApiSchema, ConversionDirection, ConversionError, FieldError};
use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{DependOnClientQuery, DependOnMealQuery};
use kernel::interface::update::{DependOnClientModifier, DependOnMealModifier};
use kernel::KernelError;

use crate::env;
use crate::error::ConvertError;

pub use self::{client::*, meal::*};

mod client;
mod meal;
mod model;

static POSTGRES_URL: &str = "POSTGRES_URL";

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: Pool<Postgres>,
}

impl PostgresDatabase {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        let url = env(POSTGRES_URL)?;
        let pool = Pool::connect(&url).await.convert_error()?;
        tracing::debug!("postgres pool connected");
        Ok(Self { pool })
    }

    /// Applies the schema under `driver/migrations`.
    pub async fn migrate(&self) -> error_stack::Result<(), KernelError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|error| Report::from(error).change_context(KernelError::Internal))
    }
}

/// A running Postgres transaction. Dropped without commit, it rolls back.
pub struct PostgresConnection(sqlx::Transaction<'static, Postgres>);

impl PostgresConnection {
    pub(in crate::database) fn inner(&mut self) -> &mut PgConnection {
        &mut *self.0
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for PostgresDatabase {
    type Transaction = PostgresConnection;
    async fn transact(&self) -> error_stack::Result<PostgresConnection, KernelError> {
        let transaction = self.pool.begin().await.convert_error()?;
        Ok(PostgresConnection(transaction))
    }
}

#[async_trait::async_trait]
impl Transaction for PostgresConnection {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        self.0.commit().await.convert_error()
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        self.0.rollback().await.convert_error()
    }
}

impl DependOnClientQuery for PostgresDatabase {
    type ClientQuery = PostgresClientRepository;
    fn client_query(&self) -> &Self::ClientQuery {
        &PostgresClientRepository
    }
}

impl DependOnClientModifier for PostgresDatabase {
    type ClientModifier = PostgresClientRepository;
    fn client_modifier(&self) -> &Self::ClientModifier {
        &PostgresClientRepository
    }
}

impl DependOnMealQuery for PostgresDatabase {
    type MealQuery = PostgresMealRepository;
    fn meal_query(&self) -> &Self::MealQuery {
        &PostgresMealRepository
    }
}

impl DependOnMealModifier for PostgresDatabase {
    type MealModifier = PostgresMealRepository;
    fn meal_modifier(&self) -> &Self::MealModifier {
        &PostgresMealRepository
    }
}

impl<T> ConvertError for Result<T, Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| match error {
            Error::PoolTimedOut => Report::from(error).change_context(KernelError::Timeout),
            _ => Report::from(error).change_context(KernelError::Internal),
        })
    }
}

/// Unsigned domain quantities are stored as BIGINT.
pub(in crate::database) fn column_from_u32(value: Option<u32>) -> Option<i64> {
    value.map(i64::from)
}

pub(in crate::database) fn column_to_u32<S: ApiSchema>(
    field: &str,
    value: Option<i64>,
) -> error_stack::Result<Option<u32>, ConversionError> {
    value
        .map(|value| {
            u32::try_from(value).map_err(|error| {
                let context =
                    ConversionError::new(S::SCHEMA, ConversionDirection::OrmToApi, value.to_string())
                        .with_errors(vec![FieldError::new(field, "range", error.to_string())]);
                Report::new(error).change_context(context)
            })
        })
        .transpose()
}

/// Checks an API value rebuilt from a row before it leaves the driver.
pub(in crate::database) fn validated<S: ApiSchema>(
    api: S,
) -> error_stack::Result<S, ConversionError> {
    api.ensure_valid(ConversionDirection::OrmToApi)?;
    Ok(api)
}

#[cfg(test)]
pub(in crate::database) fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[cfg(test)]
mod test {
    use application::transfer::ApiNutriFacts;

    use super::{column_from_u32, column_to_u32};

    #[test]
    fn negative_column_is_rejected() {
        let report = column_to_u32::<ApiNutriFacts>("weight_in_grams", Some(-1)).unwrap_err();
        assert!(report.current_context().has_error_on("weight_in_grams"));
        assert_eq!(column_to_u32::<ApiNutriFacts>("weight_in_grams", None).unwrap(), None);
    }

    #[test]
    fn u32_columns_round_trip() {
        let column = column_from_u32(Some(u32::MAX));
        assert_eq!(column, Some(i64::from(u32::MAX)));
        assert_eq!(
            column_to_u32::<ApiNutriFacts>("total_time", column).unwrap(),
            Some(u32::MAX)
        );
    }
}
