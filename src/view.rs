//! # View Layer
//!
//! Views are presentation components the workbench core manages but does
//! not render. The [`View`] trait is the seam a rendering frontend
//! implements; the [`ViewFactory`] maps view type names to constructors
//! (first-wins, like the analysis registry); the [`ViewManager`] caches
//! at most one live view per tree-node uuid and rebinds the current data
//! object on every request, so a re-run's patched payload is always
//! shown.

use std::collections::HashMap;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::data_object::DataObject;
use crate::error::ViewError;
use crate::item_tree::{ItemKind, ItemTree};

/// Notifications emitted by the [`ViewManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
  /// A view was freshly constructed for the tree node with this uuid.
  /// Reusing a cached view does not emit.
  ViewCreated(Uuid),
}

/// A presentation component bound to one data object.
pub trait View: Send {
  /// Returns the view component type name.
  fn view_type(&self) -> &str;

  /// Returns the view's display name.
  fn name(&self) -> &str;

  /// Sets the view's display name.
  fn set_name(&mut self, name: &str);

  /// Binds the data object this view presents.
  fn set_data_object(&mut self, data_object: std::sync::Arc<DataObject>);

  /// Returns the currently bound data object.
  fn data_object(&self) -> Option<&std::sync::Arc<DataObject>>;
}

type ViewConstructor = Box<dyn Fn() -> Box<dyn View> + Send + Sync>;

/// First-wins registry of view constructors by view type name.
#[derive(Default)]
pub struct ViewFactory {
  constructors: Vec<(String, ViewConstructor)>,
  by_type: HashMap<String, usize>,
}

impl ViewFactory {
  /// Creates an empty factory.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a view constructor; collisions and empty names are
  /// logged no-ops.
  pub fn register<F>(&mut self, view_type: &str, constructor: F)
  where
    F: Fn() -> Box<dyn View> + Send + Sync + 'static,
  {
    if view_type.trim().is_empty() {
      tracing::warn!("view registration needs a non-empty type name");
      return;
    }
    if self.by_type.contains_key(view_type) {
      tracing::warn!(view_type, "view type already registered");
      return;
    }
    let index = self.constructors.len();
    self
      .constructors
      .push((view_type.to_string(), Box::new(constructor)));
    self.by_type.insert(view_type.to_string(), index);
  }

  /// Instantiates a view by type name.
  pub fn create_view(&self, view_type: &str) -> Option<Box<dyn View>> {
    let index = *self.by_type.get(view_type)?;
    Some((self.constructors[index].1)())
  }

  /// Returns the registered view types, in registration order.
  pub fn registered_view_types(&self) -> Vec<&str> {
    self.constructors.iter().map(|(t, _)| t.as_str()).collect()
  }
}

/// Per-uuid cache of live views.
pub struct ViewManager {
  views: HashMap<Uuid, Box<dyn View>>,
  events: mpsc::UnboundedSender<ViewEvent>,
  event_receiver: Option<mpsc::UnboundedReceiver<ViewEvent>>,
}

impl Default for ViewManager {
  fn default() -> Self {
    Self::new()
  }
}

impl ViewManager {
  /// Creates an empty manager.
  pub fn new() -> Self {
    let (events, event_receiver) = mpsc::unbounded_channel();
    Self {
      views: HashMap::new(),
      events,
      event_receiver: Some(event_receiver),
    }
  }

  /// Takes the event receiver. Yields `Some` exactly once.
  pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<ViewEvent>> {
    self.event_receiver.take()
  }

  /// Creates (or reuses) the view for a tree node and rebinds its
  /// current data object.
  ///
  /// `Input` and `Output` nodes get their raw view type; `View` nodes
  /// get their own. The view is named `"<analysis name> / <node text>"`
  /// when the node sits under an analysis, the node text alone
  /// otherwise. The data object is rebound on every call, reused view
  /// or not.
  pub fn create_view(
    &mut self,
    uuid: Uuid,
    tree: &ItemTree,
    factory: &ViewFactory,
  ) -> Result<&mut dyn View, ViewError> {
    let id = tree
      .find_item_with_uuid(uuid)
      .ok_or(ViewError::UnknownUuid(uuid))?;
    let node = tree.node(id).ok_or(ViewError::UnknownUuid(uuid))?;
    let view_type = match node.kind {
      ItemKind::Input | ItemKind::Output | ItemKind::View => node
        .view_type
        .as_deref()
        .ok_or(ViewError::MissingViewType(uuid))?,
      ItemKind::Container => return Err(ViewError::MissingViewType(uuid)),
    };
    let data = node
      .data
      .clone()
      .ok_or(ViewError::MissingDataObject(uuid))?;
    let name = match node
      .owner_analysis
      .and_then(|a| tree.analysis_name_for_uuid(a))
    {
      Some(analysis_name) => format!("{analysis_name} / {}", node.text),
      None => node.text.clone(),
    };
    let view = match self.views.entry(uuid) {
      std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
      std::collections::hash_map::Entry::Vacant(entry) => {
        let view = factory
          .create_view(view_type)
          .ok_or_else(|| ViewError::UnknownViewType(view_type.to_string()))?;
        let _ = self.events.send(ViewEvent::ViewCreated(uuid));
        entry.insert(view)
      }
    };
    view.set_name(&name);
    view.set_data_object(data);
    Ok(view.as_mut())
  }

  /// Returns the cached view for a uuid, if any.
  pub fn view(&self, uuid: Uuid) -> Option<&dyn View> {
    self.views.get(&uuid).map(|v| v.as_ref())
  }

  /// Drops the cached view for a uuid.
  pub fn delete_view(&mut self, uuid: Uuid) {
    self.views.remove(&uuid);
  }

  /// Returns the number of live cached views.
  pub fn len(&self) -> usize {
    self.views.len()
  }

  /// Returns `true` when no views are cached.
  pub fn is_empty(&self) -> bool {
    self.views.is_empty()
  }
}
