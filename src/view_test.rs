//! Tests for the view factory and the per-node view cache.

use std::sync::Arc;

use uuid::Uuid;

use crate::data_object::DataObject;
use crate::error::ViewError;
use crate::item_tree::ItemTree;
use crate::table::{Column, Table};
use crate::view::{View, ViewEvent, ViewFactory, ViewManager};

struct FakeView {
  view_type: &'static str,
  name: String,
  data: Option<Arc<DataObject>>,
}

impl FakeView {
  fn boxed(view_type: &'static str) -> Box<dyn View> {
    Box::new(Self {
      view_type,
      name: String::new(),
      data: None,
    })
  }
}

impl View for FakeView {
  fn view_type(&self) -> &str {
    self.view_type
  }

  fn name(&self) -> &str {
    &self.name
  }

  fn set_name(&mut self, name: &str) {
    self.name = name.to_string();
  }

  fn set_data_object(&mut self, data_object: Arc<DataObject>) {
    self.data = Some(data_object);
  }

  fn data_object(&self) -> Option<&Arc<DataObject>> {
    self.data.as_ref()
  }
}

fn factory() -> ViewFactory {
  let mut factory = ViewFactory::new();
  factory.register("table-view", || FakeView::boxed("table-view"));
  factory
}

fn data(name: &str) -> Arc<DataObject> {
  let mut table = Table::new();
  table.push_column(Column::numeric("S1", vec![1.0]));
  Arc::new(DataObject::table(name, table))
}

#[test]
fn test_factory_is_first_wins() {
  let mut factory = ViewFactory::new();
  factory.register("table-view", || FakeView::boxed("first"));
  factory.register("table-view", || FakeView::boxed("second"));
  let view = factory.create_view("table-view").unwrap();
  assert_eq!(view.view_type(), "first");
  assert_eq!(factory.registered_view_types(), vec!["table-view"]);
}

#[test]
fn test_factory_unknown_type_returns_none() {
  assert!(factory().create_view("missing").is_none());
}

#[test]
fn test_create_view_binds_data_and_name() {
  let mut tree = ItemTree::new();
  let node = tree.add_input("data.csv", data("data.csv"), None).unwrap();
  let uuid = tree.node(node).unwrap().uuid;

  let factory = factory();
  let mut manager = ViewManager::new();
  let view = manager.create_view(uuid, &tree, &factory).unwrap();
  assert_eq!(view.name(), "data.csv");
  assert!(view.data_object().is_some());
}

#[test]
fn test_view_is_reused_per_uuid_and_rebound() {
  let mut tree = ItemTree::new();
  let node = tree.add_input("data.csv", data("data.csv"), None).unwrap();
  let uuid = tree.node(node).unwrap().uuid;

  let factory = factory();
  let mut manager = ViewManager::new();
  manager.create_view(uuid, &tree, &factory).unwrap();
  assert_eq!(manager.len(), 1);

  // patch the node and ask again: same cached view, fresh payload
  let replacement = data("data.csv");
  tree.set_node_data(node, Arc::clone(&replacement)).unwrap();
  let bound_uuid = {
    let view = manager.create_view(uuid, &tree, &factory).unwrap();
    view.data_object().unwrap().uuid()
  };
  assert_eq!(manager.len(), 1);
  assert_eq!(bound_uuid, replacement.uuid());
}

#[test]
fn test_view_name_includes_analysis_name() {
  let mut tree = ItemTree::new();
  let input = tree.add_input("data.csv", data("data.csv"), None).unwrap();
  let analysis = Uuid::new_v4();
  let container = tree.add_container("PCA 0", Some(input)).unwrap();
  tree.set_owner_analysis(container, analysis);
  let output = tree
    .add_output(
      "Projection (Table)",
      "table-view",
      analysis,
      "x",
      data("x"),
      Some(container),
    )
    .unwrap();
  let uuid = tree.node(output).unwrap().uuid;

  let factory = factory();
  let mut manager = ViewManager::new();
  let view = manager.create_view(uuid, &tree, &factory).unwrap();
  assert_eq!(view.name(), "PCA 0 / Projection (Table)");
}

#[test]
fn test_unknown_uuid_and_view_type_errors() {
  let mut tree = ItemTree::new();
  let node = tree
    .add_input("data.csv", data("data.csv"), None)
    .unwrap();
  let uuid = tree.node(node).unwrap().uuid;

  let mut manager = ViewManager::new();
  let empty_factory = ViewFactory::new();
  assert!(matches!(
    manager.create_view(Uuid::new_v4(), &tree, &empty_factory),
    Err(ViewError::UnknownUuid(_))
  ));
  assert!(matches!(
    manager.create_view(uuid, &tree, &empty_factory),
    Err(ViewError::UnknownViewType(_))
  ));
}

#[test]
fn test_delete_view_drops_the_cache_entry() {
  let mut tree = ItemTree::new();
  let node = tree.add_input("data.csv", data("data.csv"), None).unwrap();
  let uuid = tree.node(node).unwrap().uuid;

  let factory = factory();
  let mut manager = ViewManager::new();
  manager.create_view(uuid, &tree, &factory).unwrap();
  manager.delete_view(uuid);
  assert!(manager.is_empty());
  assert!(manager.view(uuid).is_none());
}

#[test]
fn test_view_created_event_fires_once_per_construction() {
  let mut tree = ItemTree::new();
  let node = tree.add_input("data.csv", data("data.csv"), None).unwrap();
  let uuid = tree.node(node).unwrap().uuid;

  let factory = factory();
  let mut manager = ViewManager::new();
  let mut events = manager.take_event_receiver().unwrap();
  assert!(manager.take_event_receiver().is_none());

  manager.create_view(uuid, &tree, &factory).unwrap();
  assert_eq!(events.try_recv().ok(), Some(ViewEvent::ViewCreated(uuid)));

  // a cache hit rebinds silently
  manager.create_view(uuid, &tree, &factory).unwrap();
  assert!(events.try_recv().is_err());
}
