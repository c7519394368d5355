use sqlx::PgExecutor;

use uuid::Uuid;

use crate::model::{NewProfile, Profile};

/// Repository for interfacing with the profiles table
pub struct ProfilesRepo;

impl ProfilesRepo {
    #[tracing::instrument(name = "Insert profile", skip(executor))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        new_profile: &NewProfile,
    ) -> sqlx::Result<Profile> {
        sqlx::query_as::<_, Profile>(
            "insert into profiles(id, name, phone, photo_url)
             values (coalesce($1, gen_random_uuid()), $2, $3, $4)
             returning *",
        )
        .bind(new_profile.id)
        .bind(new_profile.name.as_ref())
        .bind(new_profile.phone.as_ref())
        .bind(&new_profile.photo_url)
        .fetch_one(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch profile by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Profile>> {
        sqlx::query_as::<_, Profile>("select * from profiles where id=$1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    #[tracing::instrument(name = "Update profile photo", skip(executor))]
    pub async fn update_photo<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        photo_url: &str,
    ) -> sqlx::Result<Option<Profile>> {
        sqlx::query_as::<_, Profile>("update profiles set photo_url=$2 where id=$1 returning *")
            .bind(id)
            .bind(photo_url)
            .fetch_optional(executor)
            .await
    }
}
