use crate::client::PostgresClient;
use async_trait::async_trait;
use nimbus_domain::{NewUser, PersistenceError, User, UserRepository};
use tracing::{debug, instrument};

/// PostgreSQL implementation of the user store.
#[derive(Clone)]
pub struct PostgresUserRepository {
    client: PostgresClient,
}

impl PostgresUserRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

fn row_to_user(row: &tokio_postgres::Row) -> User {
    User {
        id: row.get("id"),
        user_name: row.get("user_name"),
        email: row.get("email"),
        city: row.get("city"),
        notification_preference: row.get("notification_preference"),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, input), fields(email = %input.email))]
    async fn create_user(&self, input: NewUser) -> Result<Option<User>, PersistenceError> {
        let conn = self.client.get_connection().await.map_err(PersistenceError)?;

        let row = conn
            .query_opt(
                "INSERT INTO users (user_name, email, city, notification_preference)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (email) DO NOTHING
                 RETURNING id",
                &[
                    &input.user_name,
                    &input.email,
                    &input.city,
                    &input.notification_preference,
                ],
            )
            .await
            .map_err(|e| PersistenceError(e.into()))?;

        match row {
            Some(row) => {
                let id: i64 = row.get("id");
                debug!(user_id = id, "user registered");
                Ok(Some(User {
                    id,
                    user_name: input.user_name,
                    email: input.email,
                    city: input.city,
                    notification_preference: input.notification_preference,
                }))
            }
            None => {
                debug!(email = %input.email, "user already registered");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_by_city_and_preference(
        &self,
        city: &str,
        preference: &str,
    ) -> Result<Vec<User>, PersistenceError> {
        let conn = self.client.get_connection().await.map_err(PersistenceError)?;

        let rows = conn
            .query(
                "SELECT id, user_name, email, city, notification_preference
                 FROM users
                 WHERE city = $1 AND notification_preference = $2",
                &[&city, &preference],
            )
            .await
            .map_err(|e| PersistenceError(e.into()))?;

        Ok(rows.iter().map(row_to_user).collect())
    }
}
