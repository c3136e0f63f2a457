//! # Data Browser Tree
//!
//! The [`ItemTree`] is the provenance model of the workbench: a rooted
//! tree of containers, inputs, analysis outputs, and views, with every
//! node addressable by a uuid minted at insertion. An arena of nodes
//! backs the tree; removed slots are tombstoned so stored [`NodeId`]s
//! never alias a later node.
//!
//! ## Indices
//!
//! Two secondary indices keep driver lookups cheap: a uuid index over
//! every live node, and an output index keyed by
//! `(analysis uuid, output name)` over the nodes materialized for one
//! output, so a re-run can patch exactly the affected rows.
//!
//! ## Naming
//!
//! [`ItemTree::next_name`] hands out `"<base> 0"`, `"<base> 1"`, ... from
//! per-base counters that start at zero and are never reset for the life
//! of the tree. [`ItemTree::generate_unique_name`] instead probes the
//! existing node texts and suffixes `" 2"`, `" 3"`, ... until unused.
//!
//! ## Events
//!
//! Selection and removal emit [`TreeEvent`]s on an unbounded channel the
//! embedding application drains; events carry uuids, never node ids.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::data_object::DataObject;
use crate::error::TreeError;

/// Opaque handle onto one live tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The role of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
  /// A grouping node with no payload of its own.
  Container,
  /// An imported data object.
  Input,
  /// One materialized analysis output.
  Output,
  /// A supplementary view onto an output.
  View,
}

/// One node of the browser tree.
pub struct ItemNode {
  /// Display text.
  pub text: String,
  /// The node's role.
  pub kind: ItemKind,
  /// Uuid minted when the node was inserted.
  pub uuid: Uuid,
  /// View component type for `Output` and `View` nodes.
  pub view_type: Option<String>,
  /// Uuid of the analysis instance that produced this subtree, if any.
  pub owner_analysis: Option<Uuid>,
  /// Name of the output this node was materialized for, if any.
  pub output_name: Option<String>,
  /// Attached payload, if any.
  pub data: Option<Arc<DataObject>>,
  parent: Option<NodeId>,
  children: Vec<NodeId>,
}

/// Notifications emitted by the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
  /// A view-bearing node was selected.
  ViewSelected(Uuid),
  /// An input node was selected.
  InputSelected(Uuid),
  /// The active analysis changed; `None` clears it.
  ActiveAnalysisChanged(Option<Uuid>),
  /// A node (and its subtree) was removed.
  ObjectRemoved(Uuid),
}

/// Rooted provenance tree over inputs, analyses, outputs, and views.
pub struct ItemTree {
  nodes: Vec<Option<ItemNode>>,
  roots: Vec<NodeId>,
  uuid_index: HashMap<Uuid, NodeId>,
  output_index: HashMap<(Uuid, String), Vec<NodeId>>,
  name_counters: HashMap<String, u64>,
  active_analysis: Option<Uuid>,
  selected_inputs: Vec<NodeId>,
  events: mpsc::UnboundedSender<TreeEvent>,
  event_receiver: Option<mpsc::UnboundedReceiver<TreeEvent>>,
}

impl Default for ItemTree {
  fn default() -> Self {
    Self::new()
  }
}

impl ItemTree {
  /// Creates an empty tree.
  pub fn new() -> Self {
    let (events, event_receiver) = mpsc::unbounded_channel();
    Self {
      nodes: Vec::new(),
      roots: Vec::new(),
      uuid_index: HashMap::new(),
      output_index: HashMap::new(),
      name_counters: HashMap::new(),
      active_analysis: None,
      selected_inputs: Vec::new(),
      events,
      event_receiver: Some(event_receiver),
    }
  }

  /// Takes the event receiver; subsequent calls return `None`.
  pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<TreeEvent>> {
    self.event_receiver.take()
  }

  fn insert(&mut self, mut node: ItemNode, parent: Option<NodeId>) -> NodeId {
    node.parent = parent;
    let uuid = node.uuid;
    let id = NodeId(self.nodes.len());
    self.nodes.push(Some(node));
    match parent {
      Some(p) => {
        if let Some(Some(parent_node)) = self.nodes.get_mut(p.0) {
          parent_node.children.push(id);
        }
      }
      None => self.roots.push(id),
    }
    self.uuid_index.insert(uuid, id);
    id
  }

  /// Adds a container node; empty text is rejected.
  pub fn add_container(&mut self, text: &str, parent: Option<NodeId>) -> Result<NodeId, TreeError> {
    if text.trim().is_empty() {
      return Err(TreeError::EmptyName);
    }
    Ok(self.insert(
      ItemNode {
        text: text.to_string(),
        kind: ItemKind::Container,
        uuid: Uuid::new_v4(),
        view_type: None,
        owner_analysis: None,
        output_name: None,
        data: None,
        parent: None,
        children: Vec::new(),
      },
      parent,
    ))
  }

  /// Adds an input node carrying an imported data object.
  ///
  /// The node is addressed by a fresh uuid of its own, independent of the
  /// data object's uuid.
  pub fn add_input(
    &mut self,
    text: &str,
    data: Arc<DataObject>,
    parent: Option<NodeId>,
  ) -> Result<NodeId, TreeError> {
    if text.trim().is_empty() {
      return Err(TreeError::EmptyName);
    }
    Ok(self.insert(
      ItemNode {
        text: text.to_string(),
        kind: ItemKind::Input,
        uuid: Uuid::new_v4(),
        view_type: Some("table-view".to_string()),
        owner_analysis: None,
        output_name: None,
        data: Some(data),
        parent: None,
        children: Vec::new(),
      },
      parent,
    ))
  }

  /// Adds an output node bound to a raw view type.
  pub fn add_output(
    &mut self,
    text: &str,
    view_type: &str,
    owner_analysis: Uuid,
    output_name: &str,
    data: Arc<DataObject>,
    parent: Option<NodeId>,
  ) -> Result<NodeId, TreeError> {
    if text.trim().is_empty() {
      return Err(TreeError::EmptyName);
    }
    if view_type.trim().is_empty() {
      return Err(TreeError::EmptyViewType);
    }
    let id = self.insert(
      ItemNode {
        text: text.to_string(),
        kind: ItemKind::Output,
        uuid: Uuid::new_v4(),
        view_type: Some(view_type.to_string()),
        owner_analysis: Some(owner_analysis),
        output_name: Some(output_name.to_string()),
        data: Some(data),
        parent: None,
        children: Vec::new(),
      },
      parent,
    );
    self
      .output_index
      .entry((owner_analysis, output_name.to_string()))
      .or_default()
      .push(id);
    Ok(id)
  }

  /// Adds a supplementary view node onto an output.
  pub fn add_view(
    &mut self,
    text: &str,
    view_type: &str,
    owner_analysis: Uuid,
    output_name: &str,
    data: Arc<DataObject>,
    parent: Option<NodeId>,
  ) -> Result<NodeId, TreeError> {
    if text.trim().is_empty() {
      return Err(TreeError::EmptyName);
    }
    if view_type.trim().is_empty() {
      return Err(TreeError::EmptyViewType);
    }
    let id = self.insert(
      ItemNode {
        text: text.to_string(),
        kind: ItemKind::View,
        uuid: Uuid::new_v4(),
        view_type: Some(view_type.to_string()),
        owner_analysis: Some(owner_analysis),
        output_name: Some(output_name.to_string()),
        data: Some(data),
        parent: None,
        children: Vec::new(),
      },
      parent,
    );
    self
      .output_index
      .entry((owner_analysis, output_name.to_string()))
      .or_default()
      .push(id);
    Ok(id)
  }

  /// Returns a node by id.
  pub fn node(&self, id: NodeId) -> Option<&ItemNode> {
    self.nodes.get(id.0).and_then(Option::as_ref)
  }

  fn node_mut(&mut self, id: NodeId) -> Option<&mut ItemNode> {
    self.nodes.get_mut(id.0).and_then(Option::as_mut)
  }

  /// Tags a node (typically an analysis container) with the analysis
  /// instance that owns its subtree.
  pub fn set_owner_analysis(&mut self, id: NodeId, analysis: Uuid) {
    if let Some(node) = self.node_mut(id) {
      node.owner_analysis = Some(analysis);
    }
  }

  /// Replaces the payload attached to a node.
  pub fn set_node_data(&mut self, id: NodeId, data: Arc<DataObject>) -> Result<(), TreeError> {
    let node = self.node_mut(id).ok_or(TreeError::MissingNode)?;
    node.data = Some(data);
    Ok(())
  }

  /// Returns the node id for a uuid.
  pub fn find_item_with_uuid(&self, uuid: Uuid) -> Option<NodeId> {
    self.uuid_index.get(&uuid).copied()
  }

  /// Returns the nodes materialized for one `(analysis, output)` pair,
  /// in materialization order.
  pub fn find_items_with_output_name(&self, analysis: Uuid, output_name: &str) -> Vec<NodeId> {
    self
      .output_index
      .get(&(analysis, output_name.to_string()))
      .cloned()
      .unwrap_or_default()
  }

  /// Returns the children of a node, or the roots when `id` is `None`.
  pub fn children(&self, id: Option<NodeId>) -> Vec<NodeId> {
    match id {
      Some(id) => self
        .node(id)
        .map(|n| n.children.clone())
        .unwrap_or_default(),
      None => self.roots.clone(),
    }
  }

  /// Returns the parent of a node.
  pub fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.node(id).and_then(|n| n.parent)
  }

  // --- naming -------------------------------------------------------------

  /// Returns `"<base> N"` from a per-base counter starting at zero.
  ///
  /// Counters only move forward; removing nodes never frees a number.
  pub fn next_name(&mut self, base: &str) -> String {
    let counter = self.name_counters.entry(base.to_string()).or_insert(0);
    let name = format!("{base} {counter}");
    *counter += 1;
    name
  }

  /// Returns `name` unchanged when no node carries it, otherwise the
  /// first unused of `"<name> 2"`, `"<name> 3"`, ...
  pub fn generate_unique_name(&self, name: &str) -> String {
    if !self.text_in_use(name) {
      return name.to_string();
    }
    let mut suffix = 2u64;
    loop {
      let candidate = format!("{name} {suffix}");
      if !self.text_in_use(&candidate) {
        return candidate;
      }
      suffix += 1;
    }
  }

  fn text_in_use(&self, text: &str) -> bool {
    self
      .nodes
      .iter()
      .flatten()
      .any(|n| n.text == text)
  }

  // --- selection ----------------------------------------------------------

  /// Selects a node, emitting the matching [`TreeEvent`]s.
  ///
  /// Selecting a view-bearing node emits `ViewSelected`; selecting an
  /// input emits `InputSelected`. The active analysis follows the
  /// analysis subtree the selection sits in, and a change emits
  /// `ActiveAnalysisChanged`. The selected-input set is replaced with
  /// the input node the selection resolves to.
  pub fn select(&mut self, id: NodeId) -> Result<(), TreeError> {
    self.apply_selection(id, true)
  }

  /// Selects a node without clearing the current selected-input set,
  /// emitting the same events as [`ItemTree::select`].
  pub fn extend_selection(&mut self, id: NodeId) -> Result<(), TreeError> {
    self.apply_selection(id, false)
  }

  fn apply_selection(&mut self, id: NodeId, clear: bool) -> Result<(), TreeError> {
    let (kind, uuid, has_view) = {
      let node = self.node(id).ok_or(TreeError::MissingNode)?;
      (node.kind, node.uuid, node.view_type.is_some())
    };
    if clear {
      self.selected_inputs.clear();
    }
    if let Some(input) = self.input_above(id) {
      if !self.selected_inputs.contains(&input) {
        self.selected_inputs.push(input);
      }
    }
    let analysis = self.analysis_above_item(id);
    if analysis != self.active_analysis {
      self.active_analysis = analysis;
      let _ = self.events.send(TreeEvent::ActiveAnalysisChanged(analysis));
    }
    match kind {
      ItemKind::Input => {
        let _ = self.events.send(TreeEvent::InputSelected(uuid));
        let _ = self.events.send(TreeEvent::ViewSelected(uuid));
      }
      ItemKind::Output | ItemKind::View if has_view => {
        let _ = self.events.send(TreeEvent::ViewSelected(uuid));
      }
      _ => {}
    }
    Ok(())
  }

  /// Returns the input data objects a selection resolves to by walking
  /// up to the nearest input ancestor.
  ///
  /// For a node inside an analysis subtree this is the input the
  /// analysis was run on; for an input node it is the node itself.
  pub fn selected_input_objects(&self, id: NodeId) -> Vec<Arc<DataObject>> {
    self
      .input_above(id)
      .and_then(|input| self.node(input))
      .and_then(|node| node.data.clone())
      .into_iter()
      .collect()
  }

  /// Returns the input nodes the current selection resolves to.
  pub fn selected_input_nodes(&self) -> &[NodeId] {
    &self.selected_inputs
  }

  fn input_above(&self, id: NodeId) -> Option<NodeId> {
    let mut current = Some(id);
    while let Some(c) = current {
      let node = self.node(c)?;
      if node.kind == ItemKind::Input {
        return Some(c);
      }
      current = node.parent;
    }
    None
  }

  /// Returns the uuid of the currently active analysis container.
  pub fn active_analysis(&self) -> Option<Uuid> {
    self.active_analysis
  }

  /// Walks up from a node to the nearest analysis container and returns
  /// that analysis's uuid.
  pub fn analysis_above_item(&self, id: NodeId) -> Option<Uuid> {
    let mut current = Some(id);
    while let Some(c) = current {
      let node = self.node(c)?;
      if let Some(owner) = node.owner_analysis {
        return Some(owner);
      }
      current = node.parent;
    }
    None
  }

  /// Returns the input data object an analysis container sits under.
  pub fn input_target_for_analysis(&self, analysis: Uuid) -> Option<Arc<DataObject>> {
    let container = self
      .nodes
      .iter()
      .enumerate()
      .find_map(|(i, n)| match n {
        Some(n) if n.kind == ItemKind::Container && n.owner_analysis == Some(analysis) => {
          Some(NodeId(i))
        }
        _ => None,
      })?;
    let mut current = self.parent(container);
    while let Some(c) = current {
      let node = self.node(c)?;
      if node.kind == ItemKind::Input {
        return node.data.clone();
      }
      current = node.parent;
    }
    None
  }

  /// Returns the node id of the input item an analysis container sits under.
  pub fn input_node_for_analysis(&self, analysis: Uuid) -> Option<NodeId> {
    let container = self.nodes.iter().enumerate().find_map(|(i, n)| match n {
      Some(n) if n.kind == ItemKind::Container && n.owner_analysis == Some(analysis) => {
        Some(NodeId(i))
      }
      _ => None,
    })?;
    self.input_above(container)
  }

  /// Returns the display text of the container materialized for an
  /// analysis instance.
  pub fn analysis_name_for_uuid(&self, analysis: Uuid) -> Option<&str> {
    self.nodes.iter().flatten().find_map(|n| {
      (n.kind == ItemKind::Container && n.owner_analysis == Some(analysis))
        .then_some(n.text.as_str())
    })
  }

  // --- removal ------------------------------------------------------------

  /// Removes a node and its subtree, emitting `ObjectRemoved` for the
  /// removed root. Containers left empty by the removal are removed too.
  pub fn remove_object(&mut self, id: NodeId) -> Result<(), TreeError> {
    let uuid = self.node(id).ok_or(TreeError::MissingNode)?.uuid;
    let parent = self.parent(id);
    self.remove_subtree(id);
    match parent {
      Some(p) => {
        if let Some(parent_node) = self.node_mut(p) {
          parent_node.children.retain(|c| *c != id);
        }
        // an analysis container with nothing left under it goes too
        if let Some(parent_node) = self.node(p) {
          if parent_node.kind == ItemKind::Container && parent_node.children.is_empty() {
            self.remove_object(p)?;
          }
        }
      }
      None => self.roots.retain(|r| *r != id),
    }
    let _ = self.events.send(TreeEvent::ObjectRemoved(uuid));
    Ok(())
  }

  fn remove_subtree(&mut self, id: NodeId) {
    let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
      return;
    };
    self.uuid_index.remove(&node.uuid);
    self.selected_inputs.retain(|i| *i != id);
    if let (Some(owner), Some(output)) = (node.owner_analysis, &node.output_name) {
      if let Some(ids) = self.output_index.get_mut(&(owner, output.clone())) {
        ids.retain(|i| *i != id);
      }
    }
    if self.active_analysis.is_some() && self.active_analysis == node.owner_analysis {
      self.active_analysis = None;
      let _ = self.events.send(TreeEvent::ActiveAnalysisChanged(None));
    }
    for child in node.children {
      self.remove_subtree(child);
    }
  }

  // --- traversal ----------------------------------------------------------

  /// Returns every live node id, depth first from the roots.
  pub fn list_items(&self) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
      if let Some(node) = self.node(id) {
        out.push(id);
        stack.extend(node.children.iter().rev().copied());
      }
    }
    out
  }

  /// Returns every live node of one kind, depth first from the roots.
  pub fn list_items_of_kind(&self, kind: ItemKind) -> Vec<NodeId> {
    self
      .list_items()
      .into_iter()
      .filter(|id| self.node(*id).map(|n| n.kind == kind).unwrap_or(false))
      .collect()
  }

  /// Returns the total number of live nodes.
  pub fn len(&self) -> usize {
    self.nodes.iter().flatten().count()
  }

  /// Returns `true` when the tree holds no live nodes.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
