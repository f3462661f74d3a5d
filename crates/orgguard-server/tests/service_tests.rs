//! End-to-end tests through the assembled service.

use std::io::Write;
use std::sync::Arc;

use orgguard_domain::model::CustomPermissions;
use orgguard_domain::{
    Caller, DecisionReason, Membership, Operation, OrganizationRole, ResourceDescriptor,
    FLEXIBLE_COLLECTIONS,
};
use orgguard_server::handlers::events::RawEvent;
use orgguard_server::handlers::groups::GroupError;
use orgguard_server::observability::init_logging;
use orgguard_server::{OrgGuardService, ServerConfig, ServiceError};
use orgguard_storage::{
    Cipher, CipherAccess, DataStore, Group, MemoryDataStore, MemoryEventSink, Organization,
};
use serial_test::serial;
use tempfile::NamedTempFile;
use uuid::Uuid;

struct World {
    service: OrgGuardService<MemoryDataStore, MemoryEventSink>,
    store: Arc<MemoryDataStore>,
    sink: Arc<MemoryEventSink>,
    org_x: Organization,
    org_y: Organization,
}

async fn world(flexible: bool) -> World {
    let mut config = ServerConfig::default();
    config.flags.insert(FLEXIBLE_COLLECTIONS.to_string(), flexible);
    world_with(config).await
}

async fn world_with(config: ServerConfig) -> World {
    let store = MemoryDataStore::new_shared();
    let sink = Arc::new(MemoryEventSink::new());
    let org_x = Organization {
        id: Uuid::new_v4(),
        name: "X".to_string(),
        use_events: true,
    };
    let org_y = Organization {
        id: Uuid::new_v4(),
        name: "Y".to_string(),
        use_events: true,
    };
    store.create_organization(org_x.clone()).await.unwrap();
    store.create_organization(org_y.clone()).await.unwrap();
    for org in [&org_x, &org_y] {
        let group = Group {
            id: Uuid::new_v4(),
            organization_id: org.id,
            name: format!("{}-team", org.name),
            access_all: false,
            external_id: None,
        };
        store.create_group(group, vec![], vec![]).await.unwrap();
    }

    let service =
        OrgGuardService::build(&config, Arc::clone(&store), Arc::clone(&sink)).unwrap();
    World {
        service,
        store,
        sink,
        org_x,
        org_y,
    }
}

fn manage_groups_in(organization_id: Uuid) -> Caller {
    Caller::user(Uuid::new_v4()).with_membership(Membership::custom(
        organization_id,
        CustomPermissions {
            manage_groups: true,
            ..CustomPermissions::default()
        },
    ))
}

#[tokio::test]
async fn test_manage_groups_reads_own_org_on_both_paths() {
    for flexible in [false, true] {
        let w = world(flexible).await;
        let caller = manage_groups_in(w.org_x.id);

        let allowed = w
            .service
            .authorize(
                Operation::ReadAllGroups,
                &ResourceDescriptor::groups_of(w.org_x.id),
                &caller,
            )
            .await;
        assert!(allowed.allowed, "flexible = {flexible}");

        let denied = w
            .service
            .authorize(
                Operation::ReadAllGroups,
                &ResourceDescriptor::groups_of(w.org_y.id),
                &caller,
            )
            .await;
        assert!(!denied.allowed);
        assert_eq!(denied.reason, DecisionReason::NotFound);

        let listed = w.service.groups().list(w.org_x.id, &caller).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(matches!(
            w.service.groups().list(w.org_y.id, &caller).await,
            Err(GroupError::NotFound)
        ));
    }
}

#[tokio::test]
async fn test_group_named_under_foreign_org_is_not_found_on_both_paths() {
    for flexible in [false, true] {
        let w = world(flexible).await;
        let group = Group {
            id: Uuid::new_v4(),
            organization_id: w.org_x.id,
            name: "Finance".to_string(),
            access_all: false,
            external_id: None,
        };
        w.store.create_group(group.clone(), vec![], vec![]).await.unwrap();
        let caller = Caller::user(Uuid::new_v4())
            .with_membership(Membership::new(w.org_y.id, OrganizationRole::Admin));

        let decision = w
            .service
            .authorize(
                Operation::DeleteGroup,
                &ResourceDescriptor::group(w.org_y.id, group.id),
                &caller,
            )
            .await;

        assert!(!decision.allowed, "flexible = {flexible}");
        assert_eq!(decision.reason, DecisionReason::NotFound);
    }
}

#[tokio::test]
async fn test_repeated_authorization_is_stable() {
    let w = world(true).await;
    let caller = Caller::user(Uuid::new_v4())
        .with_membership(Membership::new(w.org_x.id, OrganizationRole::Manager));
    let resource = ResourceDescriptor::groups_of(w.org_x.id);

    let first = w
        .service
        .authorize(Operation::ReadAllGroups, &resource, &caller)
        .await;
    for _ in 0..5 {
        let again = w
            .service
            .authorize(Operation::ReadAllGroups, &resource, &caller)
            .await;
        assert_eq!(again, first);
    }
}

#[tokio::test]
async fn test_ingest_through_service_persists_records() {
    let mut config = ServerConfig::default();
    config.events.chunk_size = 2;
    let w = world_with(config).await;
    let caller = Caller::user(Uuid::new_v4())
        .with_membership(Membership::new(w.org_x.id, OrganizationRole::User));
    let cipher = Cipher {
        id: Uuid::new_v4(),
        user_id: None,
        organization_id: Some(w.org_x.id),
    };
    w.store.create_cipher(cipher.clone()).await.unwrap();
    w.store
        .grant_cipher_access(cipher.id, caller.user_id().unwrap(), CipherAccess::Assigned)
        .await
        .unwrap();

    let body = format!(
        r#"[
            {{"type": 1007}},
            {{"type": 1107, "cipherId": "{cipher}"}},
            {{"type": 1111, "cipherId": "{cipher}"}},
            {{"type": 1602, "organizationId": "{org}"}},
            {{"type": 1107}},
            {{"type": 3000}}
        ]"#,
        cipher = cipher.id,
        org = w.org_x.id,
    );
    let raw: Vec<RawEvent> = serde_json::from_str(&body).unwrap();

    let result = w.service.events().ingest_events(raw, &caller).await.unwrap();

    assert_eq!(result.accepted, 4);
    assert_eq!(result.ignored, 2);
    assert_eq!(result.failed_chunks, 0);
    assert_eq!(w.sink.batches().len(), 2);
}

#[tokio::test]
async fn test_invalid_config_refuses_to_build() {
    let mut config = ServerConfig::default();
    config.events.chunk_size = 0;

    let result = OrgGuardService::build(
        &config,
        MemoryDataStore::new_shared(),
        Arc::new(MemoryEventSink::new()),
    );

    assert!(matches!(result, Err(ServiceError::Config(_))));
}

#[tokio::test]
#[serial]
async fn test_yaml_flag_switches_to_policy_path() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
flags:
  flexible-collections: true
"#
    )
    .unwrap();
    let config = ServerConfig::load(file.path()).unwrap();
    let w = world_with(config).await;

    // A plain member is denied on both paths; only the policy path says why.
    let caller = Caller::user(Uuid::new_v4())
        .with_membership(Membership::new(w.org_x.id, OrganizationRole::User));
    let decision = w
        .service
        .authorize(
            Operation::ReadAllGroups,
            &ResourceDescriptor::groups_of(w.org_x.id),
            &caller,
        )
        .await;

    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::InsufficientRole);
}

#[tokio::test]
#[serial]
async fn test_start_installs_configured_logging_once() {
    let mut config = ServerConfig::default();
    config.logging.level = "debug".to_string();
    config.logging.json = true;

    let first = OrgGuardService::start(
        &config,
        MemoryDataStore::new_shared(),
        Arc::new(MemoryEventSink::new()),
    );
    assert!(first.is_ok());
    // The subscriber from the first start is already global
    assert!(!init_logging(&config.logging));

    let second = OrgGuardService::start(
        &config,
        MemoryDataStore::new_shared(),
        Arc::new(MemoryEventSink::new()),
    );
    assert!(second.is_ok());
}

#[tokio::test]
#[serial]
async fn test_start_rejects_bad_log_level_before_installing() {
    let mut config = ServerConfig::default();
    config.logging.level = "loud".to_string();

    let result = OrgGuardService::start(
        &config,
        MemoryDataStore::new_shared(),
        Arc::new(MemoryEventSink::new()),
    );

    assert!(matches!(result, Err(ServiceError::Config(_))));
}
