use async_trait::async_trait;
use flickbook_core::repository::{RepoResult, UserRepository};
use flickbook_shared::pii::Masked;
use flickbook_shared::{NewUser, Role, User};
use sqlx::PgPool;
use tracing::warn;

pub struct StoreUserRepository {
    pool: PgPool,
}

impl StoreUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, salt, role";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    salt: String,
    role: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let role = Role::parse(&row.role).unwrap_or_else(|| {
            warn!("User {} has unknown role {:?}; treating as user", row.id, row.role);
            Role::User
        });

        User {
            id: row.id,
            username: row.username,
            password_hash: Masked(row.password_hash),
            salt: row.salt,
            role,
        }
    }
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, password_hash, salt, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(user.password_hash.expose())
        .bind(&user.salt)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn delete_user_cascade(&self, id: i64) -> RepoResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let username: Option<String> = sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(username) = username else {
            return Ok(None);
        };

        let deleted = sqlx::query("DELETE FROM bookings WHERE booked_by = $1")
            .bind(&username)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Dropping `tx` on any error above rolls everything back
        tx.commit().await?;

        Ok(Some(deleted))
    }
}
