// [libs/infra/db/src/repositories/friendship.rs]
//! Repositorio del grafo de amistad. Las filas se almacenan con los
//! dos extremos en un orden arbitrario fijado al crear la amistad;
//! `status_between` normaliza la consulta para que el orden de los
//! argumentos del llamador no importe.

use libsql::{params, Connection};
use spine_domain_models::{FriendshipStatus, FriendsWith};
use tracing::instrument;

use crate::errors::DbError;

pub struct FriendshipRepository;

impl FriendshipRepository {
    #[instrument(skip(conn))]
    pub async fn status_between(conn: &Connection, user_a: &str, user_b: &str) -> Result<Option<FriendshipStatus>, DbError> {
        let mut rows = conn
            .query(
                "SELECT status FROM friends_with
                 WHERE (user_a_id = ?1 AND user_b_id = ?2) OR (user_a_id = ?2 AND user_b_id = ?1)",
                params![user_a, user_b],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let raw = row.get::<String>(0).map_err(|e| DbError::MappingError(e.to_string()))?;
                Ok(Some(parse_status(&raw)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(conn, friendship))]
    pub async fn create(conn: &Connection, friendship: &FriendsWith) -> Result<(), DbError> {
        conn.execute(
            "INSERT INTO friends_with (friendship_id, user_a_id, user_b_id, status, since) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                friendship.friendship_id.as_str(),
                friendship.user_a_id.as_str(),
                friendship.user_b_id.as_str(),
                status_str(friendship.status),
                friendship.since.to_rfc3339(),
            ],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(conn))]
    pub async fn set_status(conn: &Connection, friendship_id: &str, status: FriendshipStatus) -> Result<(), DbError> {
        let affected = conn
            .execute("UPDATE friends_with SET status = ?1 WHERE friendship_id = ?2", params![status_str(status), friendship_id])
            .await?;
        if affected == 0 {
            return Err(DbError::MappingError(format!("friendship {friendship_id} not found")));
        }
        Ok(())
    }
}

fn status_str(status: FriendshipStatus) -> &'static str {
    match status {
        FriendshipStatus::Active => "active",
        FriendshipStatus::Blocked => "blocked",
    }
}

fn parse_status(raw: &str) -> Result<FriendshipStatus, DbError> {
    match raw {
        "active" => Ok(FriendshipStatus::Active),
        "blocked" => Ok(FriendshipStatus::Blocked),
        other => Err(DbError::MappingError(format!("unknown friendship status {other}"))),
    }
}
