use crate::catalog::{Catalog, ResourceKind};
use crate::config::{DEFAULT_PAGE_SIZE, expand_home};
use crate::input::Action;
use crate::loader::InFlight;
use crate::model::{ObjectHandle, Scope};
use crate::session::{ClusterSession, source_label};
use crate::tree::{NodeId, NodeTag, Tree, TreeNode, VisibleRow};
use crate::viewer::DetailViewer;
use crate::worker::{DescribeRequest, ListRequest, LoadEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PAGE_STEP: usize = 10;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FocusPane {
    Tree,
    Detail,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct ViewId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    None,
    OpenSession {
        view: ViewId,
        path: PathBuf,
        context: Option<String>,
        page_size: u32,
    },
    List {
        view: ViewId,
        session: Arc<ClusterSession>,
        request: ListRequest,
    },
    Describe {
        view: ViewId,
        session: Arc<ClusterSession>,
        request: DescribeRequest,
    },
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SessionOptions {
    pub context: Option<String>,
    pub page_size: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            context: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug)]
pub struct View {
    id: ViewId,
    source: PathBuf,
    session: Option<Arc<ClusterSession>>,
    tree: Tree,
    viewer: DetailViewer,
    in_flight: InFlight,
    cursor: usize,
}

impl View {
    fn new(id: ViewId, source: PathBuf) -> Self {
        Self {
            id,
            source,
            session: None,
            tree: Tree::new(),
            viewer: DetailViewer::new(),
            in_flight: InFlight::new(),
            cursor: 0,
        }
    }

    pub fn label(&self) -> String {
        source_label(&self.source)
    }

    pub fn session(&self) -> Option<&ClusterSession> {
        self.session.as_deref()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn viewer(&self) -> &DetailViewer {
        &self.viewer
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    pub fn rows(&self) -> Vec<VisibleRow> {
        self.tree.visible()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.rows().get(self.cursor).map(|row| row.id)
    }

    fn select(&mut self, id: NodeId) -> bool {
        match self.rows().iter().position(|row| row.id == id) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }

    fn clamp_cursor(&mut self) {
        let len = self.rows().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn close(&mut self) {
        self.viewer.clear();
        self.tree.clear();
        self.session = None;
        info!("closed view {}", self.source.display());
    }
}

pub struct App {
    running: bool,
    mode: InputMode,
    focus: FocusPane,
    catalog: Catalog,
    options: SessionOptions,
    views: Vec<View>,
    active: usize,
    next_view_id: u64,
    input: String,
    status: String,
    notice: Option<String>,
    show_help: bool,
}

impl App {
    pub fn new(catalog: Catalog, options: SessionOptions) -> Self {
        Self {
            running: true,
            mode: InputMode::Normal,
            focus: FocusPane::Tree,
            catalog,
            options,
            views: Vec::new(),
            active: 0,
            next_view_id: 1,
            input: String::new(),
            status: "Ready".to_string(),
            notice: None,
            show_help: false,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn focus(&self) -> FocusPane {
        self.focus
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_view(&self) -> Option<&View> {
        self.views.get(self.active)
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn open_kubeconfig(&mut self, path: PathBuf) -> AppCommand {
        let id = ViewId(self.next_view_id);
        self.next_view_id += 1;
        self.views.push(View::new(id, path.clone()));
        self.active = self.views.len() - 1;
        self.status = format!("Opening {}…", path.display());
        AppCommand::OpenSession {
            view: id,
            path,
            context: self.options.context.clone(),
            page_size: self.options.page_size,
        }
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if self.notice.is_some() {
            match action {
                Action::Quit => self.running = false,
                Action::Dismiss | Action::Activate | Action::SubmitInput | Action::CancelInput => {
                    self.notice = None;
                }
                _ => {}
            }
            return AppCommand::None;
        }

        if self.show_help && !matches!(action, Action::ToggleHelp) {
            self.show_help = false;
        }

        match action {
            Action::Quit => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                AppCommand::None
            }
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    FocusPane::Tree => FocusPane::Detail,
                    FocusPane::Detail => FocusPane::Tree,
                };
                AppCommand::None
            }
            Action::Down => self.navigate(1),
            Action::Up => self.navigate(-1),
            Action::PageDown => self.navigate(PAGE_STEP as isize),
            Action::PageUp => self.navigate(-(PAGE_STEP as isize)),
            Action::Top => self.navigate(isize::MIN / 2),
            Action::Bottom => self.navigate(isize::MAX / 2),
            Action::Expand => self.expand_selected(),
            Action::Collapse => {
                self.collapse_selected();
                AppCommand::None
            }
            Action::Activate => self.activate_selected(),
            Action::Reload => self.reload_selected(),
            Action::NextDetailTab => {
                if let Some(view) = self.views.get_mut(self.active) {
                    view.viewer.select_next();
                }
                AppCommand::None
            }
            Action::PrevDetailTab => {
                if let Some(view) = self.views.get_mut(self.active) {
                    view.viewer.select_prev();
                }
                AppCommand::None
            }
            Action::CloseDetailTab => {
                if let Some(closed) = self
                    .views
                    .get_mut(self.active)
                    .and_then(|view| view.viewer.close_selected())
                {
                    self.status = format!("Closed {}", closed.title);
                }
                AppCommand::None
            }
            Action::SwitchView(number) => {
                self.switch_view(number);
                AppCommand::None
            }
            Action::StartCommand => {
                self.mode = InputMode::Command;
                self.input.clear();
                AppCommand::None
            }
            Action::Dismiss => AppCommand::None,
            Action::InputChar(c) => {
                if self.mode == InputMode::Command {
                    self.input.push(c);
                }
                AppCommand::None
            }
            Action::Backspace => {
                self.input.pop();
                AppCommand::None
            }
            Action::CancelInput => {
                self.mode = InputMode::Normal;
                self.input.clear();
                AppCommand::None
            }
            Action::SubmitInput => {
                let input = std::mem::take(&mut self.input);
                self.mode = InputMode::Normal;
                self.run_command(input.trim())
            }
        }
    }

    /// Applies a background completion. Completions for closed views or
    /// removed nodes are dropped.
    pub fn apply_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::SessionOpened { view, result } => self.session_opened(view, result),
            LoadEvent::Listed {
                view,
                request,
                result,
            } => {
                let Some(index) = self.view_index(view) else {
                    debug!("dropping list result for closed view");
                    return;
                };
                let target = &mut self.views[index];
                target
                    .in_flight
                    .finish(request.kind.code, &request.scope);
                match result {
                    Ok(items) => {
                        if !target.tree.contains(request.node) {
                            debug!("dropping list result for removed node");
                            return;
                        }
                        let count = items.len();
                        let leaves = target.tree.project(
                            request.node,
                            items,
                            &request.kind,
                            request.scope.namespace(),
                        );
                        if request.kind.is_namespace() {
                            for leaf in leaves {
                                let name = target.tree.get(leaf).map(|node| node.label.clone());
                                if let Some(name) = name {
                                    target.tree.scaffold_namespace(leaf, &name, &self.catalog);
                                }
                            }
                        }
                        if let Some(node) = target.tree.get_mut(request.node) {
                            node.expanded = true;
                        }
                        target.clamp_cursor();
                        self.status = format!(
                            "Loaded {count} {} ({})",
                            request.kind.display_name,
                            request.scope.label()
                        );
                    }
                    Err(error) => {
                        self.notice = Some(error.to_string());
                        self.status = format!("Failed to load {}", request.kind.display_name);
                    }
                }
            }
            LoadEvent::Described {
                view,
                key,
                described,
            } => {
                let Some(index) = self.view_index(view) else {
                    return;
                };
                let title = described.title.clone();
                if self.views[index].viewer.apply(&key, described) {
                    self.status = format!("Showing {title}");
                }
            }
        }
    }

    fn session_opened(&mut self, view: ViewId, result: anyhow::Result<ClusterSession>) {
        let Some(index) = self.view_index(view) else {
            debug!("dropping session for closed view");
            return;
        };
        match result {
            Ok(session) => {
                let target = &mut self.views[index];
                self.status = format!(
                    "Connected to {} ({})",
                    session.context(),
                    session.cluster_url()
                );
                target.session = Some(Arc::new(session));
                target.tree.clear();
                for kind in self.catalog.cluster_scoped() {
                    target.tree.add_root(TreeNode::folder(kind, None));
                }
                target.cursor = 0;
            }
            Err(error) => {
                self.notice = Some(format!("Cannot load config file due to error - {error:#}"));
                self.remove_view(index);
            }
        }
    }

    fn view_index(&self, id: ViewId) -> Option<usize> {
        self.views.iter().position(|view| view.id == id)
    }

    fn remove_view(&mut self, index: usize) {
        let mut view = self.views.remove(index);
        view.close();
        if self.active >= self.views.len() {
            self.active = self.views.len().saturating_sub(1);
        } else if self.active > index {
            self.active -= 1;
        }
    }

    fn switch_view(&mut self, number: u8) {
        let index = usize::from(number).saturating_sub(1);
        if number == 0 || index >= self.views.len() {
            self.status = format!("No view {number}");
            return;
        }
        self.active = index;
        self.status = format!("View {number}: {}", self.views[index].label());
    }

    fn navigate(&mut self, delta: isize) -> AppCommand {
        let focus = self.focus;
        let Some(view) = self.views.get_mut(self.active) else {
            return AppCommand::None;
        };
        match focus {
            FocusPane::Tree => view.move_cursor(delta),
            FocusPane::Detail => {
                let delta = delta.clamp(i32::MIN as isize, i32::MAX as isize) as i32;
                view.viewer.scroll(delta);
            }
        }
        AppCommand::None
    }

    fn selected(&self) -> Option<(usize, NodeId)> {
        let view = self.views.get(self.active)?;
        Some((self.active, view.selected_node()?))
    }

    fn expand_selected(&mut self) -> AppCommand {
        let Some((index, id)) = self.selected() else {
            return AppCommand::None;
        };
        let Some((tag, has_children)) = self.views[index]
            .tree
            .get(id)
            .map(|node| (node.tag.clone(), node.has_children()))
        else {
            return AppCommand::None;
        };
        match tag {
            NodeTag::Object { .. } if !has_children => self.open_detail(index, id),
            NodeTag::Folder { code, namespace } if !has_children => {
                self.request_list(index, id, code, namespace.as_deref())
            }
            _ => {
                if let Some(node) = self.views[index].tree.get_mut(id) {
                    node.expanded = true;
                }
                AppCommand::None
            }
        }
    }

    fn collapse_selected(&mut self) {
        let Some((index, id)) = self.selected() else {
            return;
        };
        let view = &mut self.views[index];
        let Some(node) = view.tree.get_mut(id) else {
            return;
        };
        if node.expanded {
            node.expanded = false;
        } else if let Some(parent) = node.parent() {
            view.select(parent);
        }
    }

    fn activate_selected(&mut self) -> AppCommand {
        let Some((index, id)) = self.selected() else {
            return AppCommand::None;
        };
        let Some((is_object, expanded)) = self.views[index]
            .tree
            .get(id)
            .map(|node| (matches!(node.tag, NodeTag::Object { .. }), node.expanded))
        else {
            return AppCommand::None;
        };
        if is_object {
            self.open_detail(index, id)
        } else if expanded {
            self.collapse_selected();
            AppCommand::None
        } else {
            self.expand_selected()
        }
    }

    fn reload_selected(&mut self) -> AppCommand {
        let Some((index, id)) = self.selected() else {
            return AppCommand::None;
        };
        let tree = &self.views[index].tree;
        let folder = match tree.get(id).map(|node| &node.tag) {
            Some(NodeTag::Folder { .. }) => Some(id),
            Some(NodeTag::Object { .. }) => tree.get(id).and_then(TreeNode::parent),
            _ => None,
        };
        let Some(folder) = folder else {
            self.status = "Nothing to reload here".to_string();
            return AppCommand::None;
        };
        match tree.get(folder).map(|node| node.tag.clone()) {
            Some(NodeTag::Folder { code, namespace }) => {
                self.request_list(index, folder, code, namespace.as_deref())
            }
            _ => {
                self.status = "Nothing to reload here".to_string();
                AppCommand::None
            }
        }
    }

    fn request_list(
        &mut self,
        index: usize,
        node: NodeId,
        code: &'static str,
        namespace: Option<&str>,
    ) -> AppCommand {
        let Some(kind) = self.catalog.lookup(code).copied() else {
            debug!("no loader registered for {code}");
            return AppCommand::None;
        };
        let view = &mut self.views[index];
        let Some(session) = view.session.clone() else {
            return AppCommand::None;
        };
        let scope = Scope::for_kind(&kind, namespace);
        if !view.in_flight.try_begin(kind.code, &scope) {
            debug!("{} list already running in {scope}, dropping request", kind.plural);
            return AppCommand::None;
        }
        self.status = format!("Loading {} ({})…", kind.display_name, scope.label());
        AppCommand::List {
            view: view.id,
            session,
            request: ListRequest { kind, scope, node },
        }
    }

    fn open_detail(&mut self, index: usize, id: NodeId) -> AppCommand {
        let view = &mut self.views[index];
        let Some(NodeTag::Object {
            code,
            namespace,
            object,
        }) = view.tree.get(id).map(|node| node.tag.clone())
        else {
            return AppCommand::None;
        };
        let Some(kind) = self.catalog.lookup(code).copied() else {
            return AppCommand::None;
        };
        let Some(session) = view.session.clone() else {
            return AppCommand::None;
        };
        let opened = view.viewer.open(code, object.clone(), namespace.clone());
        if !opened.describe {
            return AppCommand::None;
        }
        self.status = format!("Describing {} {}…", kind.title_label(), object.name());
        describe_command(view.id, session, kind, namespace, object)
    }

    fn run_command(&mut self, input: &str) -> AppCommand {
        let (verb, argument) = match input.split_once(char::is_whitespace) {
            Some((verb, argument)) => (verb, argument.trim()),
            None => (input, ""),
        };
        match verb {
            "" => AppCommand::None,
            "q" | "quit" => {
                self.running = false;
                AppCommand::None
            }
            "open" | "o" if argument.is_empty() => {
                self.status = "Usage: :open <kubeconfig path>".to_string();
                AppCommand::None
            }
            "open" | "o" => self.open_kubeconfig(expand_home(argument)),
            "close" => {
                if self.views.is_empty() {
                    self.status = "No view to close".to_string();
                } else {
                    let label = self.views[self.active].label();
                    self.remove_view(self.active);
                    self.status = if self.views.is_empty() {
                        format!("Closed {label}; use :open <path> to browse a cluster")
                    } else {
                        format!("Closed {label}")
                    };
                }
                AppCommand::None
            }
            "help" => {
                self.show_help = true;
                AppCommand::None
            }
            other => {
                warn!("unknown command {other}");
                self.status = format!("Unknown command: {other}");
                AppCommand::None
            }
        }
    }
}

fn describe_command(
    view: ViewId,
    session: Arc<ClusterSession>,
    kind: ResourceKind,
    namespace: Option<String>,
    object: ObjectHandle,
) -> AppCommand {
    AppCommand::Describe {
        view,
        session,
        request: DescribeRequest {
            kind,
            namespace,
            object,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{App, AppCommand, FocusPane, InputMode, SessionOptions, ViewId};
    use crate::api::fake::{Call, FakeApi, object};
    use crate::catalog::Catalog;
    use crate::input::Action;
    use crate::model::Scope;
    use crate::session::ClusterSession;
    use crate::tree::{NodeId, NodeTag};
    use crate::worker::{LoadEvent, dispatch};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::{Notify, mpsc};

    fn new_app() -> App {
        App::new(Catalog::builtin(&[]).expect("catalog"), SessionOptions::default())
    }

    fn connected(api: FakeApi) -> (App, ViewId, Arc<FakeApi>) {
        let mut app = new_app();
        let AppCommand::OpenSession { view, .. } =
            app.open_kubeconfig(PathBuf::from("/tmp/kubeconfig"))
        else {
            panic!("expected open session command");
        };
        let api = Arc::new(api);
        app.apply_event(LoadEvent::SessionOpened {
            view,
            result: Ok(ClusterSession::with_api("/tmp/kubeconfig", api.clone())),
        });
        (app, view, api)
    }

    fn select(app: &mut App, path: &[&str]) -> NodeId {
        let view = &mut app.views[app.active];
        let id = view.tree.find_path(path).expect("node on path");
        assert!(view.select(id), "node must be visible");
        id
    }

    async fn run(app: &mut App, command: AppCommand) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch(command, &tx);
        let event = rx.recv().await.expect("completion event");
        app.apply_event(event);
    }

    async fn open_default_namespace(app: &mut App) {
        select(app, &["Namespaces"]);
        let command = app.apply_action(Action::Expand);
        assert!(matches!(command, AppCommand::List { .. }));
        run(app, command).await;

        select(app, &["Namespaces", "default"]);
        assert_eq!(app.apply_action(Action::Expand), AppCommand::None);
    }

    fn labels(app: &App, parent: NodeId) -> Vec<String> {
        let tree = app.active_view().expect("view").tree();
        tree.children(parent)
            .iter()
            .map(|id| tree.get(*id).expect("child").label.clone())
            .collect()
    }

    #[test]
    fn connected_view_shows_cluster_kinds_as_roots() {
        let (app, _, _) = connected(FakeApi::new());
        let view = app.active_view().expect("view");
        assert_eq!(view.tree().roots().len(), 17);
        assert_eq!(view.rows().len(), 17);
        assert!(app.status().starts_with("Connected to test"));
    }

    #[test]
    fn failed_session_shows_notice_and_drops_view() {
        let mut app = new_app();
        let AppCommand::OpenSession { view, .. } =
            app.open_kubeconfig(PathBuf::from("/tmp/missing"))
        else {
            panic!("expected open session command");
        };
        app.apply_event(LoadEvent::SessionOpened {
            view,
            result: Err(anyhow::anyhow!("selected file does not exist")),
        });

        assert!(app.views().is_empty());
        assert_eq!(
            app.notice(),
            Some("Cannot load config file due to error - selected file does not exist")
        );

        app.apply_action(Action::Down);
        assert!(app.notice().is_some());
        app.apply_action(Action::Dismiss);
        assert!(app.notice().is_none());
    }

    #[tokio::test]
    async fn expanding_pods_in_default_lists_once_and_projects_leaves() {
        let catalog = Catalog::builtin(&[]).expect("catalog");
        let namespaces = catalog.lookup("ns").expect("ns");
        let pods = catalog.lookup("pod").expect("pods");
        let (mut app, _, api) = connected(
            FakeApi::new()
                .with_list(namespaces, None, &["default"])
                .with_list(pods, Some("default"), &["a", "b"]),
        );
        open_default_namespace(&mut app).await;

        let folder = select(&mut app, &["Namespaces", "default", "Pods"]);
        let command = app.apply_action(Action::Expand);
        match &command {
            AppCommand::List { request, .. } => {
                assert_eq!(request.scope, Scope::Namespace("default".to_string()));
                assert_eq!(request.node, folder);
            }
            other => panic!("unexpected command {other:?}"),
        }
        run(&mut app, command).await;

        let pod_calls = api
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::List { code, .. } if code == "pod"))
            .collect::<Vec<_>>();
        assert_eq!(
            pod_calls,
            vec![Call::List {
                code: "pod".to_string(),
                namespace: Some("default".to_string()),
            }]
        );
        assert_eq!(labels(&app, folder), vec!["a", "b"]);

        let tree = app.active_view().expect("view").tree();
        for (leaf, name) in tree.children(folder).iter().zip(["a", "b"]) {
            match &tree.get(*leaf).expect("leaf").tag {
                NodeTag::Object {
                    code,
                    namespace,
                    object,
                } => {
                    assert_eq!(*code, "pod");
                    assert_eq!(namespace.as_deref(), Some("default"));
                    assert_eq!(object.name(), name);
                    assert_eq!(object.object().metadata.namespace.as_deref(), Some("default"));
                }
                other => panic!("unexpected tag {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn expanding_a_populated_folder_issues_no_call() {
        let catalog = Catalog::builtin(&[]).expect("catalog");
        let nodes = catalog.lookup("node").expect("nodes");
        let (mut app, _, api) = connected(FakeApi::new().with_list(nodes, None, &["n1"]));

        select(&mut app, &["Nodes"]);
        let command = app.apply_action(Action::Expand);
        run(&mut app, command).await;
        assert_eq!(api.list_calls(), 1);

        select(&mut app, &["Nodes"]);
        app.apply_action(Action::Collapse);
        assert_eq!(app.apply_action(Action::Expand), AppCommand::None);
        assert_eq!(app.apply_action(Action::Activate), AppCommand::None);
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test]
    async fn second_expand_while_listing_is_dropped() {
        let catalog = Catalog::builtin(&[]).expect("catalog");
        let nodes = catalog.lookup("node").expect("nodes");
        let gate = Arc::new(Notify::new());
        let (mut app, _, api) = connected(
            FakeApi::new()
                .with_list(nodes, None, &["n1", "n2"])
                .with_list_gate(gate.clone()),
        );

        let folder = select(&mut app, &["Nodes"]);
        let first = app.apply_action(Action::Expand);
        assert!(matches!(first, AppCommand::List { .. }));
        assert_eq!(app.apply_action(Action::Expand), AppCommand::None);
        assert_eq!(app.apply_action(Action::Reload), AppCommand::None);

        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch(first, &tx);
        tokio::task::yield_now().await;
        gate.notify_one();
        let event = rx.recv().await.expect("list completion");
        app.apply_event(event);

        assert_eq!(api.list_calls(), 1);
        assert_eq!(labels(&app, folder), vec!["n1", "n2"]);
        let scope = Scope::Cluster;
        assert!(!app.active_view().expect("view").in_flight().is_busy("node", &scope));
    }

    #[tokio::test]
    async fn not_served_cluster_kind_expands_to_nothing() {
        let catalog = Catalog::builtin(&[]).expect("catalog");
        let psp = catalog.lookup("psp").expect("psp");
        let (mut app, _, _) =
            connected(FakeApi::new().with_list_status(psp, None, 404, "NotFound"));

        let folder = select(&mut app, &["Pod Security Policies"]);
        let command = app.apply_action(Action::Expand);
        run(&mut app, command).await;

        assert!(app.notice().is_none());
        assert!(labels(&app, folder).is_empty());
    }

    #[tokio::test]
    async fn missing_namespace_raises_notice_for_namespaced_kind() {
        let catalog = Catalog::builtin(&[]).expect("catalog");
        let namespaces = catalog.lookup("ns").expect("ns");
        let pods = catalog.lookup("pod").expect("pods");
        let (mut app, _, _) = connected(
            FakeApi::new()
                .with_list(namespaces, None, &["default"])
                .with_list_status(pods, Some("default"), 404, "NotFound"),
        );
        open_default_namespace(&mut app).await;

        let folder = select(&mut app, &["Namespaces", "default", "Pods"]);
        let command = app.apply_action(Action::Expand);
        run(&mut app, command).await;

        let notice = app.notice().expect("notice");
        assert!(notice.starts_with("Cannot load pods due to error - NotFound (404)"));
        assert!(labels(&app, folder).is_empty());
    }

    #[tokio::test]
    async fn empty_folder_collapses_in_place() {
        let catalog = Catalog::builtin(&[]).expect("catalog");
        let nodes = catalog.lookup("node").expect("nodes");
        let (mut app, _, api) = connected(FakeApi::new().with_list(nodes, None, &[]));

        let folder = select(&mut app, &["Nodes"]);
        let command = app.apply_action(Action::Expand);
        run(&mut app, command).await;
        let view = app.active_view().expect("view");
        assert!(view.tree().get(folder).expect("folder").expanded);
        let cursor = view.cursor();

        app.apply_action(Action::Collapse);
        let view = app.active_view().expect("view");
        assert!(!view.tree().get(folder).expect("folder").expanded);
        assert_eq!(view.cursor(), cursor);
        assert_eq!(view.selected_node(), Some(folder));

        let command = app.apply_action(Action::Activate);
        assert!(matches!(command, AppCommand::List { .. }));
        run(&mut app, command).await;
        assert_eq!(api.list_calls(), 2);

        app.apply_action(Action::Activate);
        assert!(!app.active_view().expect("view").tree().get(folder).expect("folder").expanded);
    }

    #[tokio::test]
    async fn list_error_raises_notice_and_leaves_branch_alone() {
        let catalog = Catalog::builtin(&[]).expect("catalog");
        let nodes = catalog.lookup("node").expect("nodes");
        let (mut app, _, _) = connected(FakeApi::new().with_list(nodes, None, &["n1"]));
        let folder = select(&mut app, &["Nodes"]);
        let command = app.apply_action(Action::Expand);
        run(&mut app, command).await;

        let view = app.views[app.active].session.clone().expect("session");
        let failing = Arc::new(FakeApi::new().with_list_status(nodes, None, 403, "Forbidden"));
        app.views[app.active].session = Some(Arc::new(ClusterSession::with_api(
            view.config_source(),
            failing,
        )));

        select(&mut app, &["Nodes"]);
        let command = app.apply_action(Action::Reload);
        run(&mut app, command).await;

        let notice = app.notice().expect("notice");
        assert!(notice.starts_with("Cannot load nodes due to error - Forbidden (403)"));
        assert_eq!(labels(&app, folder), vec!["n1"]);
    }

    #[tokio::test]
    async fn reload_replaces_leaves_and_keeps_stale_tabs() {
        let catalog = Catalog::builtin(&[]).expect("catalog");
        let nodes = catalog.lookup("node").expect("nodes");
        let (mut app, _, api) = connected(
            FakeApi::new()
                .with_list(nodes, None, &["n1"])
                .with_object(nodes, object(nodes, None, "n1")),
        );
        select(&mut app, &["Nodes"]);
        let command = app.apply_action(Action::Expand);
        run(&mut app, command).await;

        select(&mut app, &["Nodes", "n1"]);
        let describe = app.apply_action(Action::Activate);
        assert!(matches!(describe, AppCommand::Describe { .. }));
        run(&mut app, describe).await;

        let command = app.apply_action(Action::Reload);
        run(&mut app, command).await;
        assert_eq!(api.list_calls(), 2);

        select(&mut app, &["Nodes", "n1"]);
        let describe = app.apply_action(Action::Activate);
        run(&mut app, describe).await;

        let viewer = app.active_view().expect("view").viewer();
        assert_eq!(viewer.len(), 2);
        assert!(viewer.tabs().iter().all(|tab| tab.title == "Node - n1"));
    }

    #[tokio::test]
    async fn selecting_a_leaf_opens_and_reuses_one_tab() {
        let catalog = Catalog::builtin(&[]).expect("catalog");
        let nodes = catalog.lookup("node").expect("nodes");
        let (mut app, _, api) = connected(
            FakeApi::new()
                .with_list(nodes, None, &["n1"])
                .with_object(nodes, object(nodes, None, "n1")),
        );
        select(&mut app, &["Nodes"]);
        let command = app.apply_action(Action::Expand);
        run(&mut app, command).await;

        select(&mut app, &["Nodes", "n1"]);
        let describe = app.apply_action(Action::Activate);
        run(&mut app, describe).await;
        let again = app.apply_action(Action::Activate);
        assert!(matches!(again, AppCommand::Describe { .. }));
        run(&mut app, again).await;

        let viewer = app.active_view().expect("view").viewer();
        assert_eq!(viewer.len(), 1);
        assert_eq!(viewer.selected().expect("tab").title, "Node - n1");
        let gets = api
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Get { .. }))
            .count();
        assert_eq!(gets, 2);
    }

    #[tokio::test]
    async fn describe_failure_opens_an_error_tab() {
        let catalog = Catalog::builtin(&[]).expect("catalog");
        let nodes = catalog.lookup("node").expect("nodes");
        let (mut app, _, _) = connected(
            FakeApi::new()
                .with_list(nodes, None, &["gone"])
                .with_get_status(nodes, None, "gone", 404, "NotFound"),
        );
        select(&mut app, &["Nodes"]);
        let command = app.apply_action(Action::Expand);
        run(&mut app, command).await;

        select(&mut app, &["Nodes", "gone"]);
        let describe = app.apply_action(Action::Activate);
        run(&mut app, describe).await;

        let tab = app
            .active_view()
            .expect("view")
            .viewer()
            .selected()
            .expect("tab")
            .clone();
        assert_eq!(tab.title, "Error");
        assert!(tab.body.contains("NotFound (404)"));
        assert!(app.notice().is_none());
    }

    #[tokio::test]
    async fn late_completion_for_closed_view_is_dropped() {
        let catalog = Catalog::builtin(&[]).expect("catalog");
        let nodes = catalog.lookup("node").expect("nodes");
        let (mut app, _, _) = connected(FakeApi::new().with_list(nodes, None, &["n1"]));
        select(&mut app, &["Nodes"]);
        let command = app.apply_action(Action::Expand);

        app.apply_action(Action::StartCommand);
        for c in "close".chars() {
            app.apply_action(Action::InputChar(c));
        }
        app.apply_action(Action::SubmitInput);
        assert!(app.views().is_empty());

        run(&mut app, command).await;
        assert!(app.views().is_empty());
        assert!(app.notice().is_none());
    }

    #[test]
    fn open_command_adds_a_view_and_digits_switch_between_views() {
        let (mut app, first, _) = connected(FakeApi::new());

        app.apply_action(Action::StartCommand);
        for c in "open /tmp/other".chars() {
            app.apply_action(Action::InputChar(c));
        }
        let command = app.apply_action(Action::SubmitInput);
        let AppCommand::OpenSession { view, path, .. } = command else {
            panic!("expected open session command");
        };
        assert_ne!(view, first);
        assert_eq!(path, PathBuf::from("/tmp/other"));
        assert_eq!(app.mode(), InputMode::Normal);
        assert_eq!(app.active_index(), 1);

        app.apply_action(Action::SwitchView(1));
        assert_eq!(app.active_view().map(|view| view.id), Some(first));
        app.apply_action(Action::SwitchView(5));
        assert_eq!(app.active_index(), 0);
        assert_eq!(app.status(), "No view 5");
    }

    #[test]
    fn unknown_kind_code_is_ignored() {
        let (mut app, _, _) = connected(FakeApi::new());
        let mut catalog = Catalog::new();
        for kind in app.catalog.all().iter().filter(|kind| kind.code != "node") {
            catalog.register(*kind).expect("register");
        }
        app.catalog = catalog;

        select(&mut app, &["Nodes"]);
        assert_eq!(app.apply_action(Action::Expand), AppCommand::None);
    }

    #[test]
    fn focus_toggles_and_detail_focus_scrolls_instead_of_moving() {
        let (mut app, _, _) = connected(FakeApi::new());
        app.apply_action(Action::Down);
        assert_eq!(app.active_view().expect("view").cursor(), 1);

        app.apply_action(Action::ToggleFocus);
        assert_eq!(app.focus(), FocusPane::Detail);
        app.apply_action(Action::Down);
        assert_eq!(app.active_view().expect("view").cursor(), 1);

        app.apply_action(Action::ToggleFocus);
        app.apply_action(Action::Bottom);
        assert_eq!(app.active_view().expect("view").cursor(), 16);
        app.apply_action(Action::Top);
        assert_eq!(app.active_view().expect("view").cursor(), 0);
    }

    #[test]
    fn help_toggles_and_closes_on_next_action() {
        let mut app = new_app();
        app.apply_action(Action::ToggleHelp);
        assert!(app.show_help());
        app.apply_action(Action::Down);
        assert!(!app.show_help());
    }

    #[test]
    fn quit_command_stops_the_app() {
        let mut app = new_app();
        app.apply_action(Action::StartCommand);
        app.apply_action(Action::InputChar('q'));
        app.apply_action(Action::SubmitInput);
        assert!(!app.running());
    }
}
