// [libs/infra/db/src/repositories/users.rs]
//! Repositorio de usuarios. Los usuarios nunca se eliminan fisicamente;
//! `is_active` es el unico mecanismo de baja.

use libsql::{params, Connection};
use spine_domain_models::User;
use tracing::instrument;

use crate::errors::DbError;

pub struct UserRepository;

impl UserRepository {
    #[instrument(skip(conn))]
    pub async fn get(conn: &Connection, user_id: &str) -> Result<User, DbError> {
        let mut rows = conn
            .query(
                "SELECT user_id, handle, display_name, region_code, trust_score, consent_version, is_active, created_at
                 FROM users WHERE user_id = ?1",
                params![user_id],
            )
            .await?;

        let row = rows.next().await?.ok_or(DbError::UserNotFound)?;
        map_row(&row)
    }

    #[instrument(skip(conn))]
    pub async fn get_by_handle(conn: &Connection, handle: &str) -> Result<User, DbError> {
        let mut rows = conn
            .query(
                "SELECT user_id, handle, display_name, region_code, trust_score, consent_version, is_active, created_at
                 FROM users WHERE handle = ?1",
                params![handle],
            )
            .await?;

        let row = rows.next().await?.ok_or(DbError::UserNotFound)?;
        map_row(&row)
    }

    #[instrument(skip(conn, user))]
    pub async fn create(conn: &Connection, user: &User) -> Result<(), DbError> {
        conn.execute(
            "INSERT INTO users (user_id, handle, display_name, region_code, trust_score, consent_version, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.user_id.as_str(),
                user.handle.as_str(),
                user.display_name.as_str(),
                user.region_code.as_str(),
                user.trust_score,
                user.consent_version.as_str(),
                user.is_active as i64,
                user.created_at.to_rfc3339(),
            ],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(conn))]
    pub async fn update_trust_score(conn: &Connection, user_id: &str, trust_score: f64) -> Result<(), DbError> {
        let clamped = User::clamp_trust_score(trust_score);
        let affected = conn
            .execute("UPDATE users SET trust_score = ?1 WHERE user_id = ?2", params![clamped, user_id])
            .await?;
        if affected == 0 {
            return Err(DbError::UserNotFound);
        }
        Ok(())
    }

    #[instrument(skip(conn))]
    pub async fn deactivate(conn: &Connection, user_id: &str) -> Result<(), DbError> {
        let affected = conn.execute("UPDATE users SET is_active = 0 WHERE user_id = ?1", params![user_id]).await?;
        if affected == 0 {
            return Err(DbError::UserNotFound);
        }
        Ok(())
    }
}

fn map_row(row: &libsql::Row) -> Result<User, DbError> {
    Ok(User {
        user_id: row.get::<String>(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        handle: row.get::<String>(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        display_name: row.get::<String>(2).map_err(|e| DbError::MappingError(e.to_string()))?,
        region_code: row.get::<String>(3).map_err(|e| DbError::MappingError(e.to_string()))?,
        trust_score: row.get::<f64>(4).map_err(|e| DbError::MappingError(e.to_string()))?,
        consent_version: row.get::<String>(5).map_err(|e| DbError::MappingError(e.to_string()))?,
        is_active: row.get::<i64>(6).map_err(|e| DbError::MappingError(e.to_string()))? != 0,
        created_at: row
            .get::<String>(7)
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .parse()
            .map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?,
    })
}
