// [apps/integrity-spine/src/services/consent.rs]
//! Composicion de la lectura de consentimiento: trae las filas
//! candidatas y la fila de amistad, y delega la resolucion pura a
//! `spine-domain-policy`. El viewer-es-propietario se corta antes de
//! tocar la base: no hay politica que leer cuando el dueño se mira a
//! si mismo.

use chrono::Utc;
use libsql::Connection;
use spine_domain_models::FriendsWith;
use spine_domain_policy::{self as policy, ConsentCheck};
use spine_infra_db::repositories::{ConsentRepository, FriendshipRepository};

use crate::errors::SpineError;

/// Faceta generica usada para resolver consentimiento a nivel de
/// activo completo, cuando el llamador no apunta a una faceta
/// particular. No corresponde a ninguna politica `facet_specific`
/// real, asi que la resolucion cae siempre en el nivel asset/global/
/// default-por-amistad. Cualquier adaptador que evalue una accion a
/// nivel de activo entero (en vez de una faceta nombrada) debe pasar
/// este sentinel en lugar de un nombre de faceta real o del default de
/// `Facet::MolecularData`, que si existe como politica `facet_specific`.
pub const ASSET_LEVEL_FACET: &str = "_asset_level_scan";

#[allow(clippy::too_many_arguments)]
pub async fn resolve_consent(
    conn: &Connection,
    viewer_id: &str,
    owner_id: &str,
    asset_id: &str,
    facet: &str,
) -> Result<ConsentCheck, SpineError> {
    let now = Utc::now();
    if viewer_id == owner_id {
        return Ok(policy::check(viewer_id, owner_id, Some(asset_id), Some(facet), &[], None, now));
    }

    let candidates = ConsentRepository::candidates(conn, owner_id, asset_id, facet, Some(viewer_id)).await?;
    let friendship_status = FriendshipRepository::status_between(conn, viewer_id, owner_id).await?;
    let friendship = friendship_status.map(|status| FriendsWith {
        friendship_id: String::new(),
        user_a_id: owner_id.to_string(),
        user_b_id: viewer_id.to_string(),
        status,
        since: now,
    });

    Ok(policy::check(viewer_id, owner_id, Some(asset_id), Some(facet), &candidates, friendship.as_ref(), now))
}
