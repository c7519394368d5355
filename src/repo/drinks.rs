use sqlx::PgExecutor;

use crate::model::Drink;

/// Repository for interfacing with the drinks menu
pub struct DrinksRepo;

impl DrinksRepo {
    #[tracing::instrument(name = "Insert drink", skip(executor))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        name: &str,
        description: Option<&str>,
    ) -> sqlx::Result<Drink> {
        sqlx::query_as::<_, Drink>(
            "insert into drinks(name, description) values ($1, $2) returning *",
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch all drinks", skip(executor))]
    pub async fn fetch_all<'con>(executor: impl PgExecutor<'con>) -> sqlx::Result<Vec<Drink>> {
        sqlx::query_as::<_, Drink>("select * from drinks order by id asc")
            .fetch_all(executor)
            .await
    }

    #[tracing::instrument(name = "Fetch drink by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: i32,
    ) -> sqlx::Result<Option<Drink>> {
        sqlx::query_as::<_, Drink>("select * from drinks where id=$1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    #[tracing::instrument(name = "Set drink availability", skip(executor))]
    pub async fn set_available<'con>(
        executor: impl PgExecutor<'con>,
        id: i32,
        available: bool,
    ) -> sqlx::Result<Option<Drink>> {
        sqlx::query_as::<_, Drink>("update drinks set available=$2 where id=$1 returning *")
            .bind(id)
            .bind(available)
            .fetch_optional(executor)
            .await
    }
}
