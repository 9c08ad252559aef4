use kube::ResourceExt;

use crate::catalog::{Catalog, ResourceKind};
use crate::model::{ListResult, ObjectHandle};

pub const FOLDER_ICON: &str = "folder";

/// Generational handle into a [`Tree`]. A handle to a removed node never
/// resolves again, even after its slot is reused.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTag {
    Folder {
        code: &'static str,
        namespace: Option<String>,
    },
    Group,
    Object {
        code: &'static str,
        namespace: Option<String>,
        object: ObjectHandle,
    },
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub label: String,
    pub icon_key: &'static str,
    pub tag: NodeTag,
    pub expanded: bool,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl TreeNode {
    pub fn folder(kind: &ResourceKind, namespace: Option<String>) -> Self {
        Self::new(
            kind.display_name.to_string(),
            FOLDER_ICON,
            NodeTag::Folder {
                code: kind.code,
                namespace,
            },
        )
    }

    pub fn group(label: impl Into<String>) -> Self {
        Self::new(label.into(), FOLDER_ICON, NodeTag::Group)
    }

    pub fn object(kind: &ResourceKind, namespace: Option<String>, object: ObjectHandle) -> Self {
        Self::new(
            object.object().name_any(),
            kind.icon_key,
            NodeTag::Object {
                code: kind.code,
                namespace,
                object,
            },
        )
    }

    fn new(label: String, icon_key: &'static str, tag: NodeTag) -> Self {
        Self {
            label,
            icon_key,
            tag,
            expanded: false,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.tag, NodeTag::Folder { .. } | NodeTag::Group)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct VisibleRow {
    pub id: NodeId,
    pub depth: usize,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    node: Option<TreeNode>,
}

#[derive(Debug, Default)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    roots: Vec<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, node: TreeNode) -> NodeId {
        let id = self.insert(node, None);
        self.roots.push(id);
        id
    }

    pub fn append_child(&mut self, parent: NodeId, node: TreeNode) -> Option<NodeId> {
        self.get(parent)?;
        let id = self.insert(node, Some(parent));
        self.get_mut(parent)?.children.push(id);
        Some(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(TreeNode::children).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        for id in std::mem::take(&mut self.roots) {
            self.remove_subtree(id);
        }
    }

    pub fn clear_children(&mut self, id: NodeId) {
        let Some(node) = self.get_mut(id) else {
            return;
        };
        for child in std::mem::take(&mut node.children) {
            self.remove_subtree(child);
        }
    }

    pub fn project(
        &mut self,
        parent: NodeId,
        items: ListResult,
        kind: &ResourceKind,
        owner_namespace: Option<&str>,
    ) -> Vec<NodeId> {
        if !self.contains(parent) {
            return Vec::new();
        }
        self.clear_children(parent);
        items
            .into_iter()
            .filter_map(|item| {
                let leaf = TreeNode::object(
                    kind,
                    owner_namespace.map(str::to_string),
                    ObjectHandle::new(item),
                );
                self.append_child(parent, leaf)
            })
            .collect()
    }

    pub fn scaffold_namespace(&mut self, namespace_node: NodeId, namespace: &str, catalog: &Catalog) {
        for kind in catalog.namespaced() {
            let mut parent = namespace_node;
            for section in kind.section {
                parent = match self.find_child(parent, section) {
                    Some(existing) => existing,
                    None => match self.append_child(parent, TreeNode::group(*section)) {
                        Some(created) => created,
                        None => return,
                    },
                };
            }
            self.append_child(parent, TreeNode::folder(kind, Some(namespace.to_string())));
        }
    }

    pub fn find_child(&self, parent: NodeId, label: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.get(*child).is_some_and(|node| node.label == label))
    }

    #[cfg(test)]
    pub fn find_path(&self, labels: &[&str]) -> Option<NodeId> {
        let (first, rest) = labels.split_first()?;
        let mut current = self
            .roots
            .iter()
            .copied()
            .find(|root| self.get(*root).is_some_and(|node| node.label == *first))?;
        for label in rest {
            current = self.find_child(current, label)?;
        }
        Some(current)
    }

    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = self.get(id).and_then(TreeNode::parent);
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.get(parent).and_then(TreeNode::parent);
        }
        depth
    }

    pub fn visible(&self) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        let mut stack = self
            .roots
            .iter()
            .rev()
            .map(|id| (*id, 0usize))
            .collect::<Vec<_>>();
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            rows.push(VisibleRow { id, depth });
            if node.expanded {
                stack.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
            }
        }
        rows
    }

    fn insert(&mut self, mut node: TreeNode, parent: Option<NodeId>) -> NodeId {
        node.parent = parent;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index: self.slots.len() - 1,
                generation: 0,
            }
        }
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(current.index)
                .filter(|slot| slot.generation == current.generation)
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                pending.extend(node.children);
                slot.generation += 1;
                self.free.push(current.index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeTag, Tree, TreeNode};
    use crate::api::fake::object;
    use crate::catalog::Catalog;

    fn catalog() -> Catalog {
        Catalog::builtin(&[]).expect("catalog")
    }

    #[test]
    fn project_appends_leaves_in_list_order_with_owner_namespace() {
        let catalog = catalog();
        let pods = catalog.lookup("pod").expect("pods");
        let mut tree = Tree::new();
        let folder = tree.add_root(TreeNode::folder(pods, Some("default".to_string())));

        let items = vec![
            object(pods, Some("default"), "b"),
            object(pods, Some("default"), "a"),
        ];
        let leaves = tree.project(folder, items, pods, Some("default"));

        let labels = leaves
            .iter()
            .map(|id| tree.get(*id).expect("leaf").label.clone())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["b", "a"]);
        for leaf in leaves {
            match &tree.get(leaf).expect("leaf").tag {
                NodeTag::Object {
                    code,
                    namespace,
                    object,
                } => {
                    assert_eq!(*code, "pod");
                    assert_eq!(namespace.as_deref(), Some("default"));
                    assert_eq!(object.object().metadata.namespace.as_deref(), Some("default"));
                }
                other => panic!("unexpected tag {other:?}"),
            }
        }
    }

    #[test]
    fn projecting_empty_result_clears_existing_children() {
        let catalog = catalog();
        let nodes = catalog.lookup("node").expect("nodes");
        let mut tree = Tree::new();
        let folder = tree.add_root(TreeNode::folder(nodes, None));
        tree.project(
            folder,
            vec![object(nodes, None, "n1"), object(nodes, None, "n2")],
            nodes,
            None,
        );
        assert_eq!(tree.children(folder).len(), 2);

        tree.project(folder, Vec::new(), nodes, None);
        assert!(tree.children(folder).is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn reprojection_replaces_leaves_and_invalidates_old_ids() {
        let catalog = catalog();
        let pods = catalog.lookup("pod").expect("pods");
        let mut tree = Tree::new();
        let folder = tree.add_root(TreeNode::folder(pods, Some("default".to_string())));
        let first = tree.project(folder, vec![object(pods, Some("default"), "a")], pods, Some("default"));
        let second =
            tree.project(folder, vec![object(pods, Some("default"), "a")], pods, Some("default"));

        assert!(!tree.contains(first[0]));
        assert!(tree.contains(second[0]));
        assert_ne!(first[0], second[0]);
    }

    #[test]
    fn scaffold_groups_namespaced_kinds_by_section() {
        let catalog = catalog();
        let namespaces = catalog.lookup("ns").expect("namespaces");
        let mut tree = Tree::new();
        let root = tree.add_root(TreeNode::folder(namespaces, None));
        let leaves = tree.project(root, vec![object(namespaces, None, "default")], namespaces, None);
        tree.scaffold_namespace(leaves[0], "default", &catalog);

        let pods = tree
            .find_path(&["Namespaces", "default", "Pods"])
            .expect("pods folder");
        assert_eq!(
            tree.get(pods).expect("pods").tag,
            NodeTag::Folder {
                code: "pod",
                namespace: Some("default".to_string()),
            }
        );
        assert!(tree
            .find_path(&["Namespaces", "default", "Applications", "Deployments"])
            .is_some());
        assert!(tree
            .find_path(&["Namespaces", "default", "Misc", "Role Based Access Control", "Roles"])
            .is_some());
        let misc_groups = tree.children(
            tree.find_path(&["Namespaces", "default", "Misc"])
                .expect("misc"),
        );
        assert_eq!(misc_groups.len(), 4);
    }

    #[test]
    fn visible_rows_follow_expansion() {
        let catalog = catalog();
        let nodes = catalog.lookup("node").expect("nodes");
        let mut tree = Tree::new();
        let folder = tree.add_root(TreeNode::folder(nodes, None));
        tree.add_root(TreeNode::group("Other"));
        tree.project(folder, vec![object(nodes, None, "n1")], nodes, None);

        assert_eq!(tree.visible().len(), 2);
        tree.get_mut(folder).expect("folder").expanded = true;
        let rows = tree.visible();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].depth, 1);
        assert_eq!(tree.get(rows[1].id).expect("leaf").label, "n1");
    }
}
