mod common;

use std::collections::BTreeSet;

use engine::{
    CategoryPatch, Currency, EngineError, NewCategory, NewPocket, PageRequest, PocketFilter,
    PocketPatch, Role, SpendType,
};

use common::{engine, expense, pocket};

fn set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[tokio::test]
async fn new_pocket_defaults_members_and_categories() {
    let engine = engine().await;

    let pocket = engine
        .create_pocket("alice", NewPocket::new("  Household ", Currency::Idr))
        .await
        .unwrap();

    assert_eq!(pocket.name, "Household");
    assert_eq!(pocket.owner_id, "alice");
    assert_eq!(pocket.editor_ids, set(&["alice"]));
    assert_eq!(pocket.watcher_ids, set(&["alice"]));
    assert_eq!(pocket.balance, 0);
    assert_eq!(pocket.version, 1);

    let categories = engine
        .find_all_category("alice", pocket.id, None)
        .await
        .unwrap();
    assert_eq!(categories.len(), 25);
    let income = engine
        .find_all_category("alice", pocket.id, Some(true))
        .await
        .unwrap();
    assert!(income.iter().all(|c| c.is_income));
    assert!(income.iter().any(|c| c.name == "Salary"));
}

#[tokio::test]
async fn create_pocket_rejects_unknown_members_and_empty_name() {
    let engine = engine().await;

    let err = engine
        .create_pocket(
            "alice",
            NewPocket::new("Trip", Currency::Idr).editor("bob").watcher("mallory"),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("unknown user ids: mallory".to_string())
    );

    let err = engine
        .create_pocket("alice", NewPocket::new("   ", Currency::Idr))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .create_pocket("mallory", NewPocket::new("Trip", Currency::Idr))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn pocket_detail_resolves_names_and_role() {
    let engine = engine().await;
    let pocket = engine
        .create_pocket(
            "alice",
            NewPocket::new("Trip", Currency::Idr).editor("bob").watcher("carol"),
        )
        .await
        .unwrap();

    let detail = engine.pocket_detail("carol", pocket.id).await.unwrap();
    assert_eq!(detail.owner.name, "Alice");
    assert_eq!(detail.editors.len(), 1);
    assert_eq!(detail.editors[0].name, "Bob");
    assert_eq!(detail.watchers[0].user_id, "carol");
    assert_eq!(detail.role, Role::Watcher);

    let bob = engine.pocket_detail("bob", pocket.id).await.unwrap();
    assert_eq!(bob.role, Role::Editor);

    engine.register_user("dave", "Dave").await.unwrap();
    let err = engine.pocket_detail("dave", pocket.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn edit_pocket_enforces_expected_version() {
    let engine = engine().await;
    let pocket = pocket(&engine, "alice", "Trip").await;

    let edited = engine
        .edit_pocket(
            "alice",
            pocket.id,
            PocketPatch::default().name("Holiday").expected_version(1),
        )
        .await
        .unwrap();
    assert_eq!(edited.name, "Holiday");
    assert_eq!(edited.version, 2);

    let err = engine
        .edit_pocket(
            "alice",
            pocket.id,
            PocketPatch::default().icon("sun").expected_version(1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let err = engine
        .edit_pocket("alice", pocket.id, PocketPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Validation("nothing to update".to_string()));
}

#[tokio::test]
async fn currency_is_fixed_once_spends_exist() {
    let engine = engine().await;
    let pocket = pocket(&engine, "alice", "Trip").await;

    let switched = engine
        .edit_pocket("alice", pocket.id, PocketPatch::default().currency(Currency::Usd))
        .await
        .unwrap();
    assert_eq!(switched.currency, Currency::Usd);

    expense(&engine, "alice", &pocket, 100, 1).await;
    let err = engine
        .edit_pocket("alice", pocket.id, PocketPatch::default().currency(Currency::Eur))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn watchers_cannot_edit_pockets() {
    let engine = engine().await;
    let pocket = engine
        .create_pocket("alice", NewPocket::new("Trip", Currency::Idr).watcher("bob"))
        .await
        .unwrap();

    let err = engine
        .edit_pocket("bob", pocket.id, PocketPatch::default().name("Mine"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn add_and_remove_person_keep_lists_and_membership_in_step() {
    let engine = engine().await;
    let pocket = pocket(&engine, "alice", "Trip").await;

    let pocket = engine
        .add_person("alice", pocket.id, "bob", false)
        .await
        .unwrap();
    assert!(pocket.editor_ids.contains("bob"));
    let pocket = engine
        .add_person("alice", pocket.id, "carol", true)
        .await
        .unwrap();
    assert!(pocket.watcher_ids.contains("carol"));
    assert!(!pocket.editor_ids.contains("carol"));

    let carol_view = engine
        .find_all_pocket("carol", &PocketFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(carol_view.total, 1);

    let pocket = engine
        .remove_person("bob", pocket.id, "carol")
        .await
        .unwrap();
    assert!(!pocket.watcher_ids.contains("carol"));
    let carol_view = engine
        .find_all_pocket("carol", &PocketFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(carol_view.total, 0);

    let err = engine
        .remove_person("alice", pocket.id, "carol")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    let err = engine
        .remove_person("bob", pocket.id, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    let err = engine
        .add_person("alice", pocket.id, "mallory", false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn find_all_pocket_filters_sorts_and_pages() {
    let engine = engine().await;
    for name in ["Groceries", "Rent", "Road trip", "Savings"] {
        pocket(&engine, "alice", name).await;
    }
    pocket(&engine, "bob", "Bob only").await;

    let page = engine
        .find_all_pocket(
            "alice",
            &PocketFilter::default(),
            &PageRequest {
                page: Some(2),
                page_size: Some(3),
                sort: Some("name".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.total_pages(), 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Savings");

    let filtered = engine
        .find_all_pocket(
            "alice",
            &PocketFilter {
                name: Some("R".to_string()),
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    let names: Vec<_> = filtered.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(filtered.total, 3);
    assert!(names.contains(&"Groceries"));
    assert!(!names.contains(&"Savings"));

    let err = engine
        .find_all_pocket(
            "alice",
            &PocketFilter::default(),
            &PageRequest {
                sort: Some("balance".to_string()),
                ..PageRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn category_names_are_unique_per_pocket() {
    let engine = engine().await;
    let trip = pocket(&engine, "alice", "Trip").await;
    let home = pocket(&engine, "alice", "Home").await;

    let created = engine
        .create_category(
            "alice",
            trip.id,
            NewCategory::new("Souvenirs", false).default_spend_type(SpendType::Want),
        )
        .await
        .unwrap();
    assert_eq!(created.default_spend_type, Some(SpendType::Want));

    let err = engine
        .create_category("alice", trip.id, NewCategory::new("souvenirs", false))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    engine
        .create_category("alice", home.id, NewCategory::new("Souvenirs", false))
        .await
        .unwrap();
}

#[tokio::test]
async fn category_edits_keep_names_unique() {
    let engine = engine().await;
    let trip = pocket(&engine, "alice", "Trip").await;
    engine
        .add_person("alice", trip.id, "bob", true)
        .await
        .unwrap();

    let tickets = engine
        .create_category(
            "alice",
            trip.id,
            NewCategory::new("Tickets", false).default_spend_type(SpendType::Need),
        )
        .await
        .unwrap();
    engine
        .create_category("alice", trip.id, NewCategory::new("Hotels", false))
        .await
        .unwrap();

    let err = engine
        .edit_category(
            "alice",
            tickets.id,
            CategoryPatch {
                name: Some("HOTELS".to_string()),
                ..CategoryPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let edited = engine
        .edit_category(
            "alice",
            tickets.id,
            CategoryPatch {
                name: Some("tickets".to_string()),
                default_spend_type: Some(None),
                ..CategoryPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.name, "tickets");
    assert_eq!(edited.default_spend_type, None);

    let err = engine
        .edit_category(
            "bob",
            tickets.id,
            CategoryPatch {
                icon: Some("🎟".to_string()),
                ..CategoryPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .delete_category("bob", tickets.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn pocket_name_filter_matches_wildcards_literally() {
    let engine = engine().await;
    for name in ["Savings 100%", "100 cats", "Trip_2024", "Trip 2024"] {
        pocket(&engine, "alice", name).await;
    }

    for (needle, expected) in [("100%", "Savings 100%"), ("p_2", "Trip_2024")] {
        let found = engine
            .find_all_pocket(
                "alice",
                &PocketFilter {
                    name: Some(needle.to_string()),
                },
                &PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(found.total, 1, "needle {needle}");
        assert_eq!(found.items[0].name, expected);
    }
}
