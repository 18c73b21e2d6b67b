// [libs/infra/db/src/repositories/consent.rs]
//! Repositorio de politicas de consentimiento. La resolucion de
//! especificidad (grantee > facet > asset > global) vive en
//! `spine-domain-policy`; este repositorio solo fetch-ea las filas
//! candidatas para una consulta dada.

use chrono::Utc;
use libsql::{params, Connection};
use spine_domain_models::{ConsentPolicy, ConsentScope, ConsentScopeKind, Visibility};
use tracing::instrument;

use crate::errors::DbError;

pub struct ConsentRepository;

impl ConsentRepository {
    /// Trae todas las politicas no-revocadas del propietario cuyo ambito
    /// pudiera aplicar a `asset_id`/`facet`/`grantee_user_id`: filas
    /// globales, especificas del activo, de la faceta, o del grantee.
    /// El llamador aplica la especificidad y el vencimiento.
    #[instrument(skip(conn))]
    pub async fn candidates(
        conn: &Connection,
        owner_user_id: &str,
        asset_id: &str,
        facet: &str,
        grantee_user_id: Option<&str>,
    ) -> Result<Vec<ConsentPolicy>, DbError> {
        let mut rows = conn
            .query(
                "SELECT policy_id, owner_user_id, scope_kind, scope_asset_id, scope_facet, scope_grantee_user_id,
                        visibility, policy_version, is_revoked, revoked_at, revoke_reason, expires_at, created_at, updated_at
                 FROM consent_policy
                 WHERE owner_user_id = ?1
                   AND (scope_kind = 'global'
                        OR (scope_kind = 'asset_specific' AND scope_asset_id = ?2)
                        OR (scope_kind = 'facet_specific' AND scope_asset_id = ?2 AND scope_facet = ?3)
                        OR (scope_kind = 'grantee_specific' AND scope_grantee_user_id = ?4))",
                params![owner_user_id, asset_id, facet, grantee_user_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(conn, policy))]
    pub async fn create(conn: &Connection, policy: &ConsentPolicy) -> Result<(), DbError> {
        conn.execute(
            "INSERT INTO consent_policy (policy_id, owner_user_id, scope_kind, scope_asset_id, scope_facet,
                                          scope_grantee_user_id, visibility, policy_version, is_revoked, revoked_at,
                                          revoke_reason, expires_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                policy.policy_id.as_str(),
                policy.owner_user_id.as_str(),
                scope_kind_str(policy.scope_kind),
                policy.scope.asset_id.as_deref(),
                policy.scope.facet.as_deref(),
                policy.scope.grantee_user_id.as_deref(),
                policy.visibility.as_str(),
                policy.policy_version.as_str(),
                policy.is_revoked as i64,
                policy.revoked_at.map(|t| t.to_rfc3339()),
                policy.revoke_reason.as_deref(),
                policy.expires_at.map(|t| t.to_rfc3339()),
                policy.created_at.to_rfc3339(),
                policy.updated_at.to_rfc3339(),
            ],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(conn))]
    pub async fn revoke(conn: &Connection, policy_id: &str, reason: &str) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();
        let affected = conn
            .execute(
                "UPDATE consent_policy SET is_revoked = 1, revoked_at = ?1, revoke_reason = ?2, updated_at = ?1 WHERE policy_id = ?3",
                params![now, reason, policy_id],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::ConsentPolicyNotFound);
        }
        Ok(())
    }

    /// Revoca de una sola pasada todas las politicas no-revocadas de un
    /// propietario, sin importar cuantas existan: un unico UPDATE, O(1)
    /// en ida y vuelta a la base, en lugar de revocar fila por fila.
    #[instrument(skip(conn))]
    pub async fn revoke_global(conn: &Connection, owner_user_id: &str, reason: &str) -> Result<u64, DbError> {
        let now = Utc::now().to_rfc3339();
        let affected = conn
            .execute(
                "UPDATE consent_policy SET is_revoked = 1, revoked_at = ?1, revoke_reason = ?2, updated_at = ?1
                 WHERE owner_user_id = ?3 AND is_revoked = 0",
                params![now, reason, owner_user_id],
            )
            .await?;
        Ok(affected)
    }

    /// Listado completo (revocadas incluidas) de las politicas de un
    /// propietario, usado por la vista de gobernanza; no participa en
    /// la resolucion de `check`, que solo ve candidatos vivos.
    #[instrument(skip(conn))]
    pub async fn list_all_for_owner(conn: &Connection, owner_user_id: &str) -> Result<Vec<ConsentPolicy>, DbError> {
        let mut rows = conn
            .query(
                "SELECT policy_id, owner_user_id, scope_kind, scope_asset_id, scope_facet, scope_grantee_user_id,
                        visibility, policy_version, is_revoked, revoked_at, revoke_reason, expires_at, created_at, updated_at
                 FROM consent_policy WHERE owner_user_id = ?1 ORDER BY created_at ASC",
                params![owner_user_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_row(&row)?);
        }
        Ok(out)
    }
}

fn scope_kind_str(kind: ConsentScopeKind) -> &'static str {
    match kind {
        ConsentScopeKind::Global => "global",
        ConsentScopeKind::AssetSpecific => "asset_specific",
        ConsentScopeKind::FacetSpecific => "facet_specific",
        ConsentScopeKind::GranteeSpecific => "grantee_specific",
    }
}

fn scope_kind_parse(raw: &str) -> Result<ConsentScopeKind, DbError> {
    match raw {
        "global" => Ok(ConsentScopeKind::Global),
        "asset_specific" => Ok(ConsentScopeKind::AssetSpecific),
        "facet_specific" => Ok(ConsentScopeKind::FacetSpecific),
        "grantee_specific" => Ok(ConsentScopeKind::GranteeSpecific),
        other => Err(DbError::MappingError(format!("unknown scope_kind {other}"))),
    }
}

fn map_row(row: &libsql::Row) -> Result<ConsentPolicy, DbError> {
    let visibility_raw = row.get::<String>(6).map_err(|e| DbError::MappingError(e.to_string()))?;
    let visibility =
        Visibility::parse(&visibility_raw).ok_or_else(|| DbError::MappingError(format!("unknown visibility {visibility_raw}")))?;

    let scope_kind_raw = row.get::<String>(2).map_err(|e| DbError::MappingError(e.to_string()))?;
    let scope_kind = scope_kind_parse(&scope_kind_raw)?;

    let revoked_at: Option<String> = row.get(9).map_err(|e| DbError::MappingError(e.to_string()))?;
    let revoked_at = revoked_at.map(|raw| raw.parse()).transpose().map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?;

    let expires_at: Option<String> = row.get(11).map_err(|e| DbError::MappingError(e.to_string()))?;
    let expires_at = expires_at.map(|raw| raw.parse()).transpose().map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?;

    Ok(ConsentPolicy {
        policy_id: row.get::<String>(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        owner_user_id: row.get::<String>(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        scope_kind,
        scope: ConsentScope {
            asset_id: row.get::<Option<String>>(3).map_err(|e| DbError::MappingError(e.to_string()))?,
            facet: row.get::<Option<String>>(4).map_err(|e| DbError::MappingError(e.to_string()))?,
            grantee_user_id: row.get::<Option<String>>(5).map_err(|e| DbError::MappingError(e.to_string()))?,
        },
        visibility,
        policy_version: row.get::<String>(7).map_err(|e| DbError::MappingError(e.to_string()))?,
        is_revoked: row.get::<i64>(8).map_err(|e| DbError::MappingError(e.to_string()))? != 0,
        revoked_at,
        revoke_reason: row.get::<Option<String>>(10).map_err(|e| DbError::MappingError(e.to_string()))?,
        expires_at,
        created_at: row
            .get::<String>(12)
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .parse()
            .map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?,
        updated_at: row
            .get::<String>(13)
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .parse()
            .map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?,
    })
}
