use argon2::password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, PasswordHash};
use chrono::Utc;
use diesel::{insert_into, prelude::*};
use uuid::Uuid;

use crate::error::{unique_name, ServiceError, ServiceResult};
use crate::models::{Admin, User};
use crate::schema::{admins, users};

pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ServiceError::PasswordHash)
}

pub fn verify_password(password_hash: &str, password: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|hash| {
            Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok()
        })
        .unwrap_or(false)
}

fn require_credentials(name: &str, password: &str) -> ServiceResult<()> {
    if name.trim().is_empty() || password.is_empty() {
        return Err(ServiceError::validation("Name and password are required"));
    }
    Ok(())
}

pub fn register_user(conn: &mut PgConnection, name: &str, password: &str) -> ServiceResult<User> {
    require_credentials(name, password)?;

    let user = User {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        password_hash: hash_password(password)?,
        created_at: Utc::now(),
    };
    insert_into(users::table)
        .values(&user)
        .execute(conn)
        .map_err(|err| unique_name(err, "That name is already taken"))?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub fn authenticate_user(
    conn: &mut PgConnection,
    name: &str,
    password: &str,
) -> ServiceResult<User> {
    require_credentials(name, password)?;

    let user = users::table
        .filter(users::name.eq(name.trim()))
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or(ServiceError::InvalidCredentials)?;

    if verify_password(&user.password_hash, password) {
        Ok(user)
    } else {
        Err(ServiceError::InvalidCredentials)
    }
}

pub fn create_admin(conn: &mut PgConnection, name: &str, password: &str) -> ServiceResult<Admin> {
    require_credentials(name, password)?;

    let admin = Admin {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        password_hash: hash_password(password)?,
        created_at: Utc::now(),
    };
    insert_into(admins::table)
        .values(&admin)
        .execute(conn)
        .map_err(|err| unique_name(err, "That admin name is already taken"))?;

    tracing::info!(admin_id = %admin.id, "admin created");
    Ok(admin)
}

pub fn authenticate_admin(
    conn: &mut PgConnection,
    name: &str,
    password: &str,
) -> ServiceResult<Admin> {
    require_credentials(name, password)?;

    let admin = admins::table
        .filter(admins::name.eq(name.trim()))
        .select(Admin::as_select())
        .first(conn)
        .optional()?
        .ok_or(ServiceError::InvalidCredentials)?;

    if verify_password(&admin.password_hash, password) {
        Ok(admin)
    } else {
        Err(ServiceError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_database;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("passwordSA").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "passwordSA"));
        assert!(!verify_password(&hash, "passwordsa"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "anything"));
    }

    #[test]
    fn blank_credentials_are_rejected() {
        assert!(matches!(
            require_credentials(" ", "secret"),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            require_credentials("smith", ""),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_register_and_authenticate_user() {
        let conn = &mut setup_database();

        let user = register_user(conn, "Smith", "passwordSA").unwrap();
        assert_ne!(user.password_hash, "passwordSA");

        let authenticated = authenticate_user(conn, "Smith", "passwordSA").unwrap();
        assert_eq!(authenticated.id, user.id);
        assert!(matches!(
            authenticate_user(conn, "Smith", "wrong"),
            Err(ServiceError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate_user(conn, "Nobody", "passwordSA"),
            Err(ServiceError::InvalidCredentials)
        ));
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_register_duplicate_name() {
        let conn = &mut setup_database();

        register_user(conn, "Amanda", "passwordSA").unwrap();
        assert!(matches!(
            register_user(conn, "Amanda", "other"),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_admin_accounts_are_separate() {
        let conn = &mut setup_database();

        create_admin(conn, "admin", "admin").unwrap();
        assert!(authenticate_admin(conn, "admin", "admin").is_ok());
        assert!(matches!(
            authenticate_user(conn, "admin", "admin"),
            Err(ServiceError::InvalidCredentials)
        ));
    }
}
