//! End-to-end update tracking through application instance cycles.

use tandem_core::{
    Color, ComponentId, ComponentKind, LayoutData, PropertyName, PropertyValue, TreeError,
};
use tandem_sync::{
    ApplicationInstance, ClientMessage, PropertyUpdate, ServerComponentUpdate, SyncConfig,
    SyncOutcome,
};

/// content -> column -> row -> label
struct Fixture {
    app: ApplicationInstance,
    column: ComponentId,
    row: ComponentId,
    label: ComponentId,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    fn with_config(config: SyncConfig) -> Self {
        let mut app = ApplicationInstance::new(config).expect("instance");
        let mut ids = None;
        let _ = app
            .synchronize(ClientMessage::new(), |app| {
                let column = app.create(ComponentKind::Column)?;
                let row = app.create(ComponentKind::Row)?;
                let label = app.create(ComponentKind::Label)?;
                app.add(app.content_pane(), column)?;
                app.add(column, row)?;
                app.add(row, label)?;
                let _ = app.set_property(label, PropertyName::Text, "before")?;
                ids = Some((column, row, label));
                Ok::<(), TreeError>(())
            })
            .expect("build");
        let (column, row, label) = ids.expect("ids");
        Self {
            app,
            column,
            row,
            label,
        }
    }

    fn cycle<F>(&mut self, f: F) -> SyncOutcome
    where
        F: FnOnce(&mut ApplicationInstance) -> Result<(), TreeError>,
    {
        self.app
            .synchronize(ClientMessage::new(), f)
            .expect("cycle")
    }
}

fn parents(updates: &[ServerComponentUpdate]) -> Vec<ComponentId> {
    updates.iter().map(ServerComponentUpdate::parent).collect()
}

#[test]
fn build_cycle_reports_topmost_addition_only() {
    let mut app = ApplicationInstance::new(SyncConfig::default()).expect("instance");
    let content = app.content_pane();
    let outcome = app
        .synchronize(ClientMessage::new(), |app| {
            let column = app.create(ComponentKind::Column)?;
            let label = app.create(ComponentKind::Label)?;
            app.add(content, column)?;
            app.add(column, label)?;
            let _ = app.set_property(label, PropertyName::Text, "hello")?;
            Ok::<(), TreeError>(())
        })
        .expect("cycle");
    assert!(!outcome.full_refresh);
    assert_eq!(parents(&outcome.updates), vec![content]);
    assert_eq!(outcome.updates[0].added_children().len(), 1);
}

#[test]
fn property_change_then_removal_leaves_single_row_record() {
    let mut fx = Fixture::new();
    let (row, label) = (fx.row, fx.label);
    let outcome = fx.cycle(|app| {
        let _ = app.set_property(label, PropertyName::Text, "after")?;
        app.remove(row, label)
    });

    assert_eq!(parents(&outcome.updates), vec![row]);
    let record = &outcome.updates[0];
    assert!(record.removed_children().contains(&label));
    assert!(!record.has_updated_properties());
    assert_eq!(outcome.disposed, vec![label]);
    assert!(!fx.app.tree().contains(label));
}

#[test]
fn repeated_writes_merge_into_one_entry() {
    let mut fx = Fixture::new();
    let label = fx.label;
    let outcome = fx.cycle(|app| {
        for text in ["one", "two", "three"] {
            let _ = app.set_property(label, PropertyName::Text, text)?;
        }
        Ok(())
    });

    assert_eq!(outcome.updates.len(), 1);
    let record = &outcome.updates[0];
    assert_eq!(record.updated_properties().len(), 1);
    assert_eq!(
        record.updated_property(&PropertyName::Text),
        Some(&PropertyUpdate {
            old: "before".into(),
            new: "three".into(),
        })
    );
}

#[test]
fn sibling_additions_share_parent_record() {
    let mut fx = Fixture::new();
    let column = fx.column;
    let mut added = Vec::new();
    let outcome = fx.cycle(|app| {
        for _ in 0..3 {
            let label = app.create(ComponentKind::Label)?;
            app.add(column, label)?;
            added.push(label);
        }
        Ok(())
    });

    assert_eq!(parents(&outcome.updates), vec![column]);
    let order: Vec<_> = outcome.updates[0].added_children().iter().copied().collect();
    assert_eq!(order, added);
}

#[test]
fn write_back_to_original_cancels() {
    let mut fx = Fixture::new();
    let label = fx.label;
    let outcome = fx.cycle(|app| {
        let _ = app.set_property(label, PropertyName::Text, "changed")?;
        let _ = app.set_property(label, PropertyName::Text, "before")?;
        Ok(())
    });
    assert!(outcome.updates.is_empty());
}

#[test]
fn updates_are_ordered_by_depth() {
    let mut fx = Fixture::new();
    let (column, label) = (fx.column, fx.label);
    let outcome = fx.cycle(|app| {
        let _ = app.set_property(label, PropertyName::Foreground, Color::rgb(1, 2, 3))?;
        let _ = app.set_property(column, PropertyName::Background, Color::rgb(9, 9, 9))?;
        Ok(())
    });
    assert_eq!(parents(&outcome.updates), vec![column, label]);
}

#[test]
fn removal_reports_descendant_closure() {
    let mut fx = Fixture::new();
    let (column, row, label) = (fx.column, fx.row, fx.label);
    let content = fx.app.content_pane();
    let outcome = fx.cycle(|app| {
        let _ = app.set_property(row, PropertyName::Title, "doomed")?;
        app.remove(content, column)
    });

    assert_eq!(parents(&outcome.updates), vec![content]);
    let record = &outcome.updates[0];
    let removed: Vec<_> = record.removed_children().iter().copied().collect();
    let descendants: Vec<_> = record.removed_descendants().iter().copied().collect();
    assert_eq!(removed, vec![column]);
    assert_eq!(descendants, vec![row, label]);
    assert_eq!(outcome.disposed, vec![column, row, label]);
}

#[test]
fn moving_a_component_out_of_a_removed_subtree_keeps_it_alive() {
    let mut fx = Fixture::new();
    let (column, label) = (fx.column, fx.label);
    let content = fx.app.content_pane();
    let outcome = fx.cycle(|app| {
        app.remove(content, column)?;
        app.add(content, label)
    });

    let record = &outcome.updates[0];
    assert!(record.has_added_child(label));
    assert!(!record.removed_descendants().contains(&label));
    assert!(!outcome.disposed.contains(&label));
    assert!(fx.app.tree().is_attached(label));
}

#[test]
fn components_never_attached_are_disposed_with_the_cycle() {
    let mut fx = Fixture::new();
    let mut orphan = None;
    let outcome = fx.cycle(|app| {
        orphan = Some(app.create(ComponentKind::Button)?);
        Ok(())
    });
    let orphan = orphan.expect("created");
    assert!(outcome.updates.is_empty());
    assert_eq!(outcome.disposed, vec![orphan]);
    assert!(!fx.app.tree().contains(orphan));
}

#[test]
fn layout_data_changes_are_recorded_on_parent() {
    let mut fx = Fixture::new();
    let (row, label) = (fx.row, fx.label);
    let data = LayoutData::new().with_column_span(2).expect("span");
    let outcome = fx.cycle(|app| {
        let _ = app.set_layout_data(label, Some(data))?;
        Ok(())
    });
    assert_eq!(parents(&outcome.updates), vec![row]);
    assert!(outcome.updates[0].updated_layout_data_children().contains(&label));
}

#[test]
fn hiding_is_a_removal_and_showing_an_addition() {
    let mut fx = Fixture::new();
    let (row, label) = (fx.row, fx.label);

    let hidden = fx.cycle(|app| {
        let _ = app.set_property(label, PropertyName::Visible, false)?;
        Ok(())
    });
    assert_eq!(parents(&hidden.updates), vec![row]);
    assert!(hidden.updates[0].removed_children().contains(&label));
    assert!(!hidden.updates[0].has_updated_properties());
    assert!(hidden.disposed.is_empty());

    let shown = fx.cycle(|app| {
        let _ = app.set_property(label, PropertyName::Visible, true)?;
        Ok(())
    });
    assert_eq!(parents(&shown.updates), vec![row]);
    assert!(shown.updates[0].has_added_child(label));
}

#[test]
fn hidden_components_are_tracked_when_configured() {
    let mut fx = Fixture::with_config(SyncConfig::default().with_track_hidden_components(true));
    let label = fx.label;
    let outcome = fx.cycle(|app| {
        let _ = app.set_property(label, PropertyName::Visible, false)?;
        Ok(())
    });
    assert_eq!(parents(&outcome.updates), vec![label]);
    assert_eq!(
        outcome.updates[0].updated_property(&PropertyName::Visible),
        Some(&PropertyUpdate {
            old: PropertyValue::Null,
            new: false.into(),
        })
    );
}

#[test]
fn replacing_content_pane_requires_full_refresh() {
    let mut fx = Fixture::new();
    let (column, row, label) = (fx.column, fx.row, fx.label);
    let old_pane = fx.app.content_pane();
    let root = fx.app.root();
    let outcome = fx.cycle(|app| {
        let pane = app.create(ComponentKind::ContentPane)?;
        app.set_content_pane(pane)?;
        let _ = app.set_property(pane, PropertyName::Title, "fresh")?;
        Ok(())
    });

    assert!(outcome.full_refresh);
    assert_eq!(parents(&outcome.updates), vec![root]);
    let refresh = &outcome.updates[0];
    assert!(!refresh.has_updated_properties());
    let removed: Vec<_> = refresh.removed_descendants().iter().copied().collect();
    assert_eq!(removed, vec![old_pane, column, row, label]);
    assert_eq!(outcome.disposed.len(), 4);
    assert_ne!(fx.app.content_pane(), old_pane);

    let next = fx.cycle(|_| Ok(()));
    assert!(!next.full_refresh);
    assert!(next.updates.is_empty());
}

#[test]
fn root_replacement_without_full_refresh_is_incremental() {
    let mut fx = Fixture::with_config(SyncConfig::default().with_full_refresh_on_root_replace(false));
    let root = fx.app.root();
    let old_pane = fx.app.content_pane();
    let outcome = fx.cycle(|app| {
        let pane = app.create(ComponentKind::ContentPane)?;
        app.set_content_pane(pane)
    });
    assert!(!outcome.full_refresh);
    assert_eq!(parents(&outcome.updates), vec![root]);
    assert!(outcome.updates[0].removed_children().contains(&old_pane));
    assert!(outcome.updates[0].has_added_child(fx.app.content_pane()));
}

#[test]
fn explicit_full_refresh_keeps_earlier_removals() {
    let mut fx = Fixture::new();
    let (row, label) = (fx.row, fx.label);
    let outcome = fx.cycle(|app| {
        app.remove(row, label)?;
        app.process_full_refresh();
        Ok(())
    });
    assert!(outcome.full_refresh);
    assert_eq!(outcome.updates.len(), 1);
    assert!(outcome.updates[0].removed_descendants().contains(&label));
}

#[test]
fn purge_is_idempotent() {
    let mut fx = Fixture::new();
    let label = fx.label;
    let _ = fx
        .app
        .set_property(label, PropertyName::Text, "pending")
        .expect("set");
    assert_eq!(fx.app.server_component_updates().len(), 1);
    fx.app.purge();
    assert!(fx.app.server_component_updates().is_empty());
    fx.app.purge();
    assert!(fx.app.server_component_updates().is_empty());
    assert!(!fx.app.is_full_refresh_required());
}

#[test]
fn handler_error_is_returned_and_next_cycle_starts_clean() {
    let mut fx = Fixture::new();
    let label = fx.label;
    let err = fx
        .app
        .synchronize(ClientMessage::new(), |app| {
            let _ = app.set_property(label, PropertyName::Text, "partial")?;
            let window = app.root();
            app.add(label, window)
        })
        .expect_err("root cannot be a child");
    assert!(matches!(err, TreeError::RootAsChild { .. }));

    let next = fx.cycle(|_| Ok(()));
    assert!(next.updates.is_empty());
}

#[test]
fn outcome_serializes_for_the_renderer() {
    let mut fx = Fixture::new();
    let label = fx.label;
    let outcome = fx.cycle(|app| {
        let _ = app.set_property(label, PropertyName::Text, "json")?;
        Ok(())
    });
    let json = serde_json::to_value(&outcome).expect("serialize");
    assert_eq!(json["full_refresh"], false);
    assert_eq!(json["updates"][0]["parent"], label.get());
    let back: SyncOutcome = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, outcome);
}
