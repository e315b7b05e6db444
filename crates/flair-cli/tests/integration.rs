use flair_core::config::FlairConfig;
use flair_core::error::FlairError;
use flair_core::models::collection::{Collection, CollectionPatch, NewCollection};
use flair_core::models::product::{Product, SavedItem};
use flair_db::{open_memory_db, ops, projector};
use flair_service::handlers;
use flair_service::{FlairService, ProjectionOutcome};

#[test]
fn test_config_defaults() {
    let config = FlairConfig::default();
    assert_eq!(config.store_timeout_ms, 5_000);
    assert_eq!(config.busy_timeout_ms, 2_000);
    assert!(config.seed_default_collections);
    assert!(config.db_path.is_none());
}

#[test]
fn test_config_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let config = FlairConfig {
        db_path: Some(dir.path().join("flair.db")),
        store_timeout_ms: 750,
        ..FlairConfig::default()
    };
    config.save_to(&path).unwrap();

    let loaded = FlairConfig::load_from(&path).unwrap();
    assert_eq!(loaded.store_timeout_ms, 750);
    assert_eq!(loaded.db_path, config.db_path);
}

#[tokio::test]
async fn test_idempotent_save() {
    let service = FlairService::in_memory().unwrap();
    let p = service.resolve_profile_id("user_prop1").await.unwrap();

    service.add_saved_item(&p, Product::new("sku-1", "Tote")).await.unwrap();
    service.add_saved_item(&p, Product::new("sku-1", "Tote")).await.unwrap();
    assert_eq!(service.list_saved_items(&p).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cascading_unsave() {
    let service = FlairService::in_memory().unwrap();
    let p = service.resolve_profile_id("user_prop2").await.unwrap();
    for sku in ["x", "y"] {
        service.add_saved_item(&p, Product::new(sku, sku)).await.unwrap();
    }

    let mut a = NewCollection::named("A");
    a.item_ids = vec!["x".into(), "y".into()];
    let a = service.create_collection(&p, a).await.unwrap();
    let mut b = NewCollection::named("B");
    b.item_ids = vec!["x".into()];
    let b = service.create_collection(&p, b).await.unwrap();

    service.remove_saved_item(&p, "x").await.unwrap();

    assert!(!service.is_saved(&p, "x").await.unwrap());
    let a = service.get_collection(&p, &a.id).await.unwrap();
    let b = service.get_collection(&p, &b.id).await.unwrap();
    assert!(!a.contains("x") && !b.contains("x"));
    assert_eq!(a.item_count, 1);
    assert_eq!(b.item_count, 0);
}

#[tokio::test]
async fn test_default_seeding_is_one_shot() {
    let service = FlairService::in_memory().unwrap();
    let p = service.resolve_profile_id("user_prop3").await.unwrap();

    assert_eq!(service.list_collections(&p).await.unwrap().len(), 5);
    assert_eq!(service.list_collections(&p).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_count_invariant_holds() {
    let service = FlairService::in_memory().unwrap();
    let p = service.resolve_profile_id("user_prop4").await.unwrap();
    for i in 0..4 {
        service
            .add_saved_item(&p, Product::new(format!("sku-{i}"), "item"))
            .await
            .unwrap();
    }
    let col = service.create_collection(&p, NewCollection::named("Mix")).await.unwrap();

    let steps: &[(bool, &str)] = &[
        (true, "sku-0"),
        (true, "sku-1"),
        (true, "sku-1"),
        (false, "sku-3"),
        (true, "sku-2"),
        (false, "sku-0"),
        (true, "sku-3"),
    ];
    for (add, sku) in steps {
        let col = if *add {
            service.add_item_to_collection(&p, sku, &col.id).await.unwrap()
        } else {
            service.remove_item_from_collection(&p, sku, &col.id).await.unwrap()
        };
        assert_eq!(col.item_count, col.item_ids.len());
    }

    for col in service.list_collections(&p).await.unwrap() {
        assert_eq!(col.item_count, col.item_ids.len());
    }
    let col = service.get_collection(&p, &col.id).await.unwrap();
    assert_eq!(col.item_ids, vec!["sku-1", "sku-2", "sku-3"]);
}

#[test]
fn test_projection_idempotence_at_store_level() {
    let conn = open_memory_db().unwrap();
    let p = ops::resolve_profile_id(&conn, "user_prop5").unwrap();
    ops::insert_saved_item(&conn, &SavedItem::new(p.clone(), Product::new("sku-1", "Ring"))).unwrap();
    let col = Collection::new(p.clone(), "Rings".into(), "#10B981".into());
    ops::insert_collection(&conn, &col).unwrap();
    ops::add_collection_item(&conn, &p, &col.id, "sku-1").unwrap();

    let col = ops::get_collection(&conn, &p, &col.id).unwrap().unwrap();
    assert!(matches!(
        projector::sync_post_for_collection(&conn, &p, &col).unwrap(),
        ProjectionOutcome::Created(_)
    ));
    assert!(matches!(
        projector::sync_post_for_collection(&conn, &p, &col).unwrap(),
        ProjectionOutcome::Unchanged(_)
    ));
    assert_eq!(ops::list_posts_for_profile(&conn, &p).unwrap().len(), 1);
}

#[tokio::test]
async fn test_privacy_toggle_keeps_at_most_one_post() {
    let service = FlairService::in_memory().unwrap();
    let p = service.resolve_profile_id("user_prop5b").await.unwrap();
    service.add_saved_item(&p, Product::new("sku-1", "Ring")).await.unwrap();
    let mut new = NewCollection::named("Rings");
    new.item_ids = vec!["sku-1".into()];
    let col = service.create_collection(&p, new).await.unwrap();

    for public in [false, true, false, true, true] {
        let patch = CollectionPatch {
            is_public: Some(public),
            ..Default::default()
        };
        service.update_collection(&p, &col.id, patch).await.unwrap();
        let posts = service.list_posts_for_profile(&p).await.unwrap();
        assert_eq!(posts.len(), usize::from(public));
    }
}

#[tokio::test]
async fn test_ownership_isolation() {
    let service = FlairService::in_memory().unwrap();
    let a = service.resolve_profile_id("user_alice").await.unwrap();
    let b = service.resolve_profile_id("user_bob").await.unwrap();
    let bobs = service.create_collection(&b, NewCollection::named("Bob's")).await.unwrap();

    let patch = CollectionPatch {
        name: Some("Hijacked".into()),
        is_public: Some(false),
        ..Default::default()
    };
    let err = service.update_collection(&a, &bobs.id, patch).await.unwrap_err();
    assert!(matches!(err, FlairError::NotFound { .. }));

    let untouched = service.get_collection(&b, &bobs.id).await.unwrap();
    assert_eq!(untouched.name, "Bob's");
    assert!(untouched.is_public);
}

#[tokio::test]
async fn test_end_to_end_wishlist() {
    let service = FlairService::in_memory().unwrap();
    let p = service.resolve_profile_id("user_e2e").await.unwrap();

    let wishlist = service
        .create_collection(&p, NewCollection::named("Wishlist"))
        .await
        .unwrap();
    assert!(service.get_post_for_collection(&p, &wishlist.id).await.unwrap().is_none());

    service
        .add_saved_item(&p, Product::new("sku-123", "Silk Scarf"))
        .await
        .unwrap();
    service
        .add_item_to_collection(&p, "sku-123", &wishlist.id)
        .await
        .unwrap();

    let posts = service.list_posts_for_profile(&p).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "✨ Wishlist");
    assert_eq!(posts[0].collection_id, wishlist.id);

    service.remove_saved_item(&p, "sku-123").await.unwrap();

    let wishlist = service.get_collection(&p, &wishlist.id).await.unwrap();
    assert!(!wishlist.contains("sku-123"));
    assert_eq!(wishlist.item_count, 0);
    assert!(service.list_posts_for_profile(&p).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_on_disk_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = FlairConfig {
        db_path: Some(dir.path().join("flair.db")),
        ..FlairConfig::default()
    };

    let collection_id = {
        let service = FlairService::open(&config).unwrap();
        let p = service.resolve_profile_id("user_disk").await.unwrap();
        service.add_saved_item(&p, Product::new("sku-1", "Lamp")).await.unwrap();
        let mut new = NewCollection::named("Home");
        new.item_ids = vec!["sku-1".into()];
        service.create_collection(&p, new).await.unwrap().id
    };

    let service = FlairService::open(&config).unwrap();
    let p = service.resolve_profile_id("user_disk").await.unwrap();
    let col = service.get_collection(&p, &collection_id).await.unwrap();
    assert_eq!(col.item_ids, vec!["sku-1"]);
    assert_eq!(service.list_community_posts(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_handlers_fail_closed_on_identity() {
    let service = FlairService::in_memory().unwrap();
    let resp = handlers::get_collections(&service, Some("")).await;
    assert_eq!(resp.status, 401);
    let resp = handlers::get_collections(&service, Some("user_web")).await;
    assert!(resp.is_success());
}
