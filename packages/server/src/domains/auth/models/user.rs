use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Access role. Closed set; capability checks happen on this type once at
/// the access-control boundary instead of string comparisons in handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Admin,
    Official,
}

impl Role {
    /// Staff roles may list, triage, assign and delete any issue.
    pub fn can_manage_issues(&self) -> bool {
        matches!(self, Role::Admin | Role::Official)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Admin => "admin",
            Role::Official => "official",
        }
    }
}

/// User identity record.
///
/// Email and mobile number are each globally unique. The credential is
/// stored hashed; plaintext never reaches a store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
    pub mobile_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user. The credential arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub password_hash: String,
    pub role: Role,
}

/// Public projection of a user: credential and internal fields excluded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub role: Role,
    pub is_email_verified: bool,
    pub is_mobile_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Materialize a full record from creation input.
    pub fn from_new(new: NewUser) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            full_name: new.full_name,
            email: new.email,
            mobile_number: new.mobile_number,
            password_hash: new.password_hash,
            role: new.role,
            email_verified: false,
            mobile_verified: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            mobile_number: self.mobile_number.clone(),
            role: self.role,
            is_email_verified: self.email_verified,
            is_mobile_verified: self.mobile_verified,
            last_login: self.last_login,
            created_at: self.created_at,
        }
    }
}

// =============================================================================
// SQL queries - the Postgres backend delegates here
// =============================================================================

impl User {
    pub async fn find_by_email(email: &str, pool: &PgPool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_mobile(mobile_number: &str, pool: &PgPool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE mobile_number = $1")
            .bind(mobile_number)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn insert(&self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users (
                id, full_name, email, mobile_number, password_hash, role,
                email_verified, mobile_verified, last_login, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.full_name)
        .bind(&self.email)
        .bind(&self.mobile_number)
        .bind(&self.password_hash)
        .bind(self.role)
        .bind(self.email_verified)
        .bind(self.mobile_verified)
        .bind(self.last_login)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await
    }

    pub async fn set_email_verified(id: Uuid, pool: &PgPool) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET email_verified = true, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_mobile_verified(id: Uuid, pool: &PgPool) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET mobile_verified = true, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn touch_last_login(id: Uuid, pool: &PgPool) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET last_login = now(), updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Replace the stored credential hash. The only write path for the
    /// credential after registration.
    pub async fn update_credential(
        id: Uuid,
        password_hash: &str,
        pool: &PgPool,
    ) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_check() {
        assert!(!Role::Citizen.can_manage_issues());
        assert!(Role::Admin.can_manage_issues());
        assert!(Role::Official.can_manage_issues());
    }

    #[test]
    fn profile_excludes_credential() {
        let user = User::from_new(NewUser {
            full_name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            mobile_number: "+919876543210".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            role: Role::Citizen,
        });
        let json = serde_json::to_value(user.profile()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["fullName"], "Test User");
        assert_eq!(json["role"], "citizen");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Official).unwrap(), "official");
    }
}
