use std::sync::Arc;
use std::sync::atomic::Ordering;

use leasewell_core::{AppError, RequestContext};
use leasewell_domain::{GrantKey, OrganizationId, UserProfileId};

use crate::test_fakes::{FakeCacheStore, FakeStore};
use crate::{AuthorizationEngine, PermissionCache, PermissionCacheKey, PermissionCheck};

struct Fixture {
    store: Arc<FakeStore>,
    cache_store: Arc<FakeCacheStore>,
    engine: AuthorizationEngine,
    subject: UserProfileId,
    organization_id: OrganizationId,
    lease_write: GrantKey,
}

async fn fixture() -> Fixture {
    let store = Arc::new(FakeStore::default());
    let cache_store = Arc::new(FakeCacheStore::default());
    let organization = store.seed_organization("Acme Lettings").await;
    let role = store.seed_role("Manager", None).await;
    let lease_read = store.seed_feature_permission("Lease", "Read").await;
    let lease_write = store.seed_feature_permission("Lease", "Write").await;
    store.seed_feature_permission("Property", "Read").await;
    store.seed_grant(role.id, &lease_read).await;
    let member = store.seed_member(organization.id, role.id).await;

    let engine = AuthorizationEngine::new(
        store.clone(),
        store.clone(),
        store.clone(),
        PermissionCache::new(cache_store.clone(), 60),
    );

    Fixture {
        store,
        cache_store,
        engine,
        subject: member.profile_id,
        organization_id: organization.id,
        lease_write: GrantKey {
            role_id: role.id,
            feature_id: lease_write.feature_id,
            permission_id: lease_write.permission_id,
        },
    }
}

#[tokio::test]
async fn granted_permission_is_allowed_and_cached() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();

    let allowed = fixture
        .engine
        .has_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Read")
        .await;

    assert!(allowed);
    let key = PermissionCacheKey::new(fixture.subject, fixture.organization_id, "Lease", "Read");
    assert_eq!(fixture.engine.cache().get(&key).await.ok(), Some(Some(true)));
}

#[tokio::test]
async fn missing_grant_is_denied() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();

    let allowed = fixture
        .engine
        .has_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Write")
        .await;

    assert!(!allowed);
}

#[tokio::test]
async fn names_are_matched_case_insensitively() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();

    assert!(
        fixture
            .engine
            .has_permission(&ctx, fixture.subject, fixture.organization_id, "lease", "READ")
            .await
    );
}

#[tokio::test]
async fn unknown_names_are_denied_without_a_cache_entry() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();
    let checks: Vec<PermissionCheck> = (0..50)
        .map(|index| {
            PermissionCheck::new(
                fixture.subject,
                fixture.organization_id,
                format!("Junk{index}"),
                "Read",
            )
        })
        .chain([PermissionCheck::new(
            fixture.subject,
            fixture.organization_id,
            "Lease",
            "Approve",
        )])
        .collect();

    let results = fixture.engine.has_permissions(&ctx, &checks).await;

    assert!(results.iter().all(|allowed| !allowed));
    assert_eq!(fixture.cache_store.len().await, 0);
}

#[tokio::test]
async fn padded_names_share_the_trimmed_decision() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();

    let padded = fixture
        .engine
        .has_permission(&ctx, fixture.subject, fixture.organization_id, "Lease ", " Read")
        .await;
    let exact = fixture
        .engine
        .has_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Read")
        .await;

    assert!(padded);
    assert!(exact);
    assert_eq!(fixture.cache_store.len().await, 1);
    assert_eq!(fixture.store.grant_queries.load(Ordering::SeqCst), 1);
}

#[test]
fn checks_trim_their_names() {
    let check =
        PermissionCheck::new(UserProfileId::new(), OrganizationId::new(), " Lease\t", "Read ");

    assert_eq!(check.feature, "Lease");
    assert_eq!(check.permission, "Read");
}

#[tokio::test]
async fn subject_without_membership_is_denied() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();

    assert!(
        !fixture
            .engine
            .has_permission(&ctx, UserProfileId::new(), fixture.organization_id, "Lease", "Read")
            .await
    );
    assert!(
        !fixture
            .engine
            .has_permission(&ctx, fixture.subject, OrganizationId::new(), "Lease", "Read")
            .await
    );
    assert_eq!(fixture.cache_store.len().await, 0);
}

#[tokio::test]
async fn cached_decision_skips_the_store() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();
    let key = PermissionCacheKey::new(fixture.subject, fixture.organization_id, "Lease", "Write");
    assert!(fixture.engine.cache().put(&key, true).await.is_ok());

    let allowed = fixture
        .engine
        .has_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Write")
        .await;

    assert!(allowed);
    assert_eq!(fixture.store.grant_queries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cache_outage_falls_through_to_the_store() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();
    fixture.cache_store.fail.store(true, Ordering::SeqCst);

    let allowed = fixture
        .engine
        .has_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Read")
        .await;

    assert!(allowed);
    assert_eq!(fixture.store.grant_queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn store_outage_denies_without_caching() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();
    fixture.store.fail_reads.store(true, Ordering::SeqCst);

    let allowed = fixture
        .engine
        .has_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Read")
        .await;

    assert!(!allowed);
    assert_eq!(fixture.cache_store.len().await, 0);

    fixture.store.fail_reads.store(false, Ordering::SeqCst);
    assert!(
        fixture
            .engine
            .has_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Read")
            .await
    );
}

#[tokio::test]
async fn batch_checks_share_one_grant_query_and_keep_positions() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();
    let checks = [
        PermissionCheck::new(fixture.subject, fixture.organization_id, "Lease", "Write"),
        PermissionCheck::new(fixture.subject, fixture.organization_id, "Lease", "Read"),
        PermissionCheck::new(fixture.subject, fixture.organization_id, "Property", "Read"),
        PermissionCheck::new(fixture.subject, fixture.organization_id, "Lease", "Read"),
    ];

    let results = fixture.engine.has_permissions(&ctx, &checks).await;

    assert_eq!(results, vec![false, true, false, true]);
    assert_eq!(fixture.store.grant_queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn revoked_grant_stays_allowed_until_the_entry_is_invalidated() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();
    let role = fixture.lease_write.role_id;
    let read_key = {
        let state = fixture.store.state.lock().await;
        state
            .grants
            .iter()
            .find(|grant| grant.role_id == role)
            .map(|grant| grant.key())
    };
    let Some(read_key) = read_key else {
        panic!("seeded grant missing");
    };

    assert!(
        fixture
            .engine
            .has_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Read")
            .await
    );

    fixture
        .store
        .state
        .lock()
        .await
        .grants
        .retain(|grant| grant.key() != read_key);
    assert!(
        fixture
            .engine
            .has_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Read")
            .await
    );

    let cache_key =
        PermissionCacheKey::new(fixture.subject, fixture.organization_id, "Lease", "Read");
    assert!(fixture.engine.cache().invalidate(&cache_key).await.is_ok());
    assert!(
        !fixture
            .engine
            .has_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Read")
            .await
    );
}

#[tokio::test]
async fn require_permission_maps_denial_to_forbidden() {
    let fixture = fixture().await;
    let ctx = RequestContext::anonymous();

    let denied = fixture
        .engine
        .require_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Write")
        .await;
    let allowed = fixture
        .engine
        .require_permission(&ctx, fixture.subject, fixture.organization_id, "Lease", "Read")
        .await;

    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    assert!(allowed.is_ok());
}
