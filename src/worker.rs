use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::{AppCommand, ViewId};
use crate::catalog::ResourceKind;
use crate::loader::{LoadError, ResourceLoader};
use crate::model::{Described, ListResult, ObjectHandle, Scope};
use crate::session::ClusterSession;
use crate::tree::NodeId;

pub type EventSender = mpsc::UnboundedSender<LoadEvent>;

#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub kind: ResourceKind,
    pub scope: Scope,
    pub node: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescribeRequest {
    pub kind: ResourceKind,
    pub namespace: Option<String>,
    pub object: ObjectHandle,
}

#[derive(Debug)]
pub enum LoadEvent {
    SessionOpened {
        view: ViewId,
        result: anyhow::Result<ClusterSession>,
    },
    Listed {
        view: ViewId,
        request: ListRequest,
        result: Result<ListResult, LoadError>,
    },
    Described {
        view: ViewId,
        key: ObjectHandle,
        described: Described,
    },
}

/// Starts the background work a command asks for. Requests always run to
/// completion; nothing here cancels or retries.
pub fn dispatch(command: AppCommand, tx: &EventSender) {
    match command {
        AppCommand::None => {}
        AppCommand::OpenSession {
            view,
            path,
            context,
            page_size,
        } => spawn_open(view, path, context, page_size, tx.clone()),
        AppCommand::List {
            view,
            session,
            request,
        } => spawn_list(view, session, request, tx.clone()),
        AppCommand::Describe {
            view,
            session,
            request,
        } => spawn_describe(view, session, request, tx.clone()),
    }
}

fn spawn_open(
    view: ViewId,
    path: PathBuf,
    context: Option<String>,
    page_size: u32,
    tx: EventSender,
) {
    tokio::spawn(async move {
        let result = ClusterSession::open(&path, context.as_deref(), page_size).await;
        if let Err(error) = &result {
            warn!("failed to open {}: {error:#}", path.display());
        }
        send(&tx, LoadEvent::SessionOpened { view, result });
    });
}

fn spawn_list(view: ViewId, session: Arc<ClusterSession>, request: ListRequest, tx: EventSender) {
    tokio::spawn(async move {
        debug!("listing {} in {}", request.kind.plural, request.scope);
        let result = ResourceLoader::new(request.kind)
            .list(&session, &request.scope)
            .await;
        match &result {
            Ok(items) => info!(
                "loaded {} {} in {}",
                items.len(),
                request.kind.plural,
                request.scope
            ),
            Err(error) => warn!("{error}"),
        }
        send(
            &tx,
            LoadEvent::Listed {
                view,
                request,
                result,
            },
        );
    });
}

fn spawn_describe(
    view: ViewId,
    session: Arc<ClusterSession>,
    request: DescribeRequest,
    tx: EventSender,
) {
    tokio::spawn(async move {
        let described = ResourceLoader::new(request.kind)
            .describe(&session, request.namespace.as_deref(), request.object.object())
            .await;
        if described.is_error() {
            warn!("describe of {} {} failed", request.kind.kind, request.object.name());
        } else {
            debug!("described {} {}", request.kind.kind, request.object.name());
        }
        send(
            &tx,
            LoadEvent::Described {
                view,
                key: request.object,
                described,
            },
        );
    });
}

fn send(tx: &EventSender, event: LoadEvent) {
    if tx.send(event).is_err() {
        debug!("event loop closed, dropping load completion");
    }
}
