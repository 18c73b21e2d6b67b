// [libs/domain/policy/src/consent.rs]
//! Resolucion pura del grafo de consentimiento. No toca la base de
//! datos: recibe las filas candidatas ya leidas por
//! `spine-infra-db::repositories::consent` y decide.

use chrono::{DateTime, Utc};
use spine_domain_models::{ConsentPolicy, FriendsWith, FriendshipStatus, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedScope {
    Owner,
    GranteeSpecific,
    FacetSpecific,
    AssetSpecific,
    Global,
    DefaultFriendsOnly,
    DefaultPublic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsentCheck {
    pub allowed: bool,
    pub visibility: Visibility,
    pub scope: MatchedScope,
    pub policy_version: String,
    pub reason: String,
}

/// Canonicaliza el par de usuarios (orden lexicografico) y reporta si
/// son amigos aceptados. El llamador ya trajo la fila candidata (si
/// existe) desde el repositorio; aqui solo se interpreta.
pub fn check_friendship(viewer: &str, owner: &str, row: Option<&FriendsWith>) -> bool {
    let (_a, _b) = if viewer < owner { (viewer, owner) } else { (owner, viewer) };
    match row {
        Some(f) => f.status == FriendshipStatus::Active,
        None => false,
    }
}

fn policy_is_live(policy: &ConsentPolicy, now: DateTime<Utc>) -> bool {
    if policy.is_revoked {
        return false;
    }
    match policy.expires_at {
        Some(exp) => exp > now,
        None => true,
    }
}

/// Implementa el orden de resolucion: viewer==owner, luego
/// grantee-specific, facet-specific, asset-specific, global, y por
/// ultimo el default derivado de amistad.
pub fn check(
    viewer: &str,
    owner: &str,
    asset_id: Option<&str>,
    facet: Option<&str>,
    policies: &[ConsentPolicy],
    friendship: Option<&FriendsWith>,
    now: DateTime<Utc>,
) -> ConsentCheck {
    if viewer == owner {
        return ConsentCheck {
            allowed: true,
            visibility: Visibility::Private,
            scope: MatchedScope::Owner,
            policy_version: "owner".to_string(),
            reason: "viewer_is_owner".to_string(),
        };
    }

    let live: Vec<&ConsentPolicy> = policies.iter().filter(|p| policy_is_live(p, now)).collect();

    let grantee_match = live
        .iter()
        .find(|p| p.scope.grantee_user_id.as_deref() == Some(viewer));
    if let Some(p) = grantee_match {
        return from_policy(p, MatchedScope::GranteeSpecific, viewer, owner, friendship, "grantee_specific_match");
    }

    if let Some(facet) = facet {
        let facet_match = live.iter().find(|p| {
            p.scope.facet.as_deref() == Some(facet) && p.scope.asset_id.as_deref() == asset_id
        });
        if let Some(p) = facet_match {
            return from_policy(p, MatchedScope::FacetSpecific, viewer, owner, friendship, "facet_specific_match");
        }
    }

    if let Some(asset_id) = asset_id {
        let asset_match = live.iter().find(|p| {
            p.scope.asset_id.as_deref() == Some(asset_id)
                && p.scope.facet.is_none()
                && p.scope.grantee_user_id.is_none()
        });
        if let Some(p) = asset_match {
            return from_policy(p, MatchedScope::AssetSpecific, viewer, owner, friendship, "asset_specific_match");
        }
    }

    let global_match = live.iter().find(|p| {
        p.scope.asset_id.is_none() && p.scope.facet.is_none() && p.scope.grantee_user_id.is_none()
    });
    if let Some(p) = global_match {
        return from_policy(p, MatchedScope::Global, viewer, owner, friendship, "global_match");
    }

    if check_friendship(viewer, owner, friendship) {
        ConsentCheck {
            allowed: true,
            visibility: Visibility::FriendsOnly,
            scope: MatchedScope::DefaultFriendsOnly,
            policy_version: "default".to_string(),
            reason: "default_friends_only".to_string(),
        }
    } else {
        ConsentCheck {
            allowed: true,
            visibility: Visibility::Public,
            scope: MatchedScope::DefaultPublic,
            policy_version: "default".to_string(),
            reason: "default_public".to_string(),
        }
    }
}

fn from_policy(
    policy: &ConsentPolicy,
    scope: MatchedScope,
    viewer: &str,
    owner: &str,
    friendship: Option<&FriendsWith>,
    reason: &str,
) -> ConsentCheck {
    let allowed = match policy.visibility {
        Visibility::Public => true,
        Visibility::FriendsOnly => check_friendship(viewer, owner, friendship),
        Visibility::Private => false,
        Visibility::Custom => policy.scope.grantee_user_id.as_deref() == Some(viewer),
    };
    ConsentCheck {
        allowed,
        visibility: policy.visibility,
        scope,
        policy_version: policy.policy_version.clone(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use spine_domain_models::{ConsentScope, ConsentScopeKind, FriendshipStatus};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn policy(scope: ConsentScope, visibility: Visibility, revoked: bool) -> ConsentPolicy {
        ConsentPolicy {
            policy_id: "p1".to_string(),
            owner_user_id: "owner".to_string(),
            scope_kind: ConsentScopeKind::Global,
            scope,
            visibility,
            policy_version: "v1".to_string(),
            is_revoked: revoked,
            revoked_at: None,
            revoke_reason: None,
            expires_at: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn owner_always_allowed_private() {
        let check = check("owner", "owner", None, None, &[], None, now());
        assert!(check.allowed);
        assert_eq!(check.scope, MatchedScope::Owner);
    }

    #[test]
    fn falls_through_to_default_public_with_no_policies_and_no_friendship() {
        let check = check("viewer", "owner", None, None, &[], None, now());
        assert!(check.allowed);
        assert_eq!(check.visibility, Visibility::Public);
        assert_eq!(check.scope, MatchedScope::DefaultPublic);
    }

    #[test]
    fn falls_through_to_default_friends_only_when_accepted() {
        let friendship = FriendsWith {
            friendship_id: "f1".to_string(),
            user_a_id: "owner".to_string(),
            user_b_id: "viewer".to_string(),
            status: FriendshipStatus::Active,
            since: now(),
        };
        let check = check("viewer", "owner", None, None, &[], Some(&friendship), now());
        assert_eq!(check.visibility, Visibility::FriendsOnly);
        assert!(check.allowed);
    }

    #[test]
    fn private_global_policy_denies_stranger() {
        let global = policy(ConsentScope::default(), Visibility::Private, false);
        let check = check("viewer", "owner", None, None, &[global], None, now());
        assert!(!check.allowed);
        assert_eq!(check.scope, MatchedScope::Global);
    }

    #[test]
    fn revoked_policy_is_skipped_in_favor_of_default() {
        let revoked = policy(ConsentScope::default(), Visibility::Private, true);
        let check = check("viewer", "owner", None, None, &[revoked], None, now());
        assert!(check.allowed);
        assert_eq!(check.scope, MatchedScope::DefaultPublic);
    }

    #[test]
    fn grantee_specific_outranks_global() {
        let global = policy(ConsentScope::default(), Visibility::Private, false);
        let grantee = policy(
            ConsentScope { grantee_user_id: Some("viewer".to_string()), ..Default::default() },
            Visibility::Public,
            false,
        );
        let check = check("viewer", "owner", None, None, &[global, grantee], None, now());
        assert_eq!(check.scope, MatchedScope::GranteeSpecific);
        assert!(check.allowed);
    }
}
