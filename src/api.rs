use futures::FutureExt;
use futures::future::BoxFuture;
use kube::api::ListParams;
use kube::core::DynamicObject;
use kube::{Api, Client};
use thiserror::Error;
use tracing::debug;

use crate::catalog::ResourceKind;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{reason} ({code}): {message}")]
    Status {
        code: u16,
        reason: String,
        message: String,
    },
    #[error(transparent)]
    Transport(kube::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { code: 404, .. })
    }
}

impl From<kube::Error> for ApiError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) => Self::Status {
                code: response.code,
                reason: response.reason,
                message: response.message,
            },
            other => Self::Transport(other),
        }
    }
}

/// Read-only cluster transport shared by every loader of a session.
pub trait ClusterApi: Send + Sync {
    fn list<'a>(
        &'a self,
        kind: &'a ResourceKind,
        namespace: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<DynamicObject>, ApiError>>;

    fn get<'a>(
        &'a self,
        kind: &'a ResourceKind,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> BoxFuture<'a, Result<DynamicObject, ApiError>>;
}

#[derive(Clone)]
pub struct KubeApi {
    client: Client,
    page_size: u32,
}

impl KubeApi {
    pub fn new(client: Client, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    fn dynamic(&self, kind: &ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let resource = kind.api_resource();
        match namespace {
            Some(namespace) if kind.namespaced => {
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
            _ => Api::all_with(self.client.clone(), &resource),
        }
    }
}

impl ClusterApi for KubeApi {
    fn list<'a>(
        &'a self,
        kind: &'a ResourceKind,
        namespace: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<DynamicObject>, ApiError>> {
        async move {
            let api = self.dynamic(kind, namespace);
            let mut items = Vec::new();
            let mut params = ListParams::default().limit(self.page_size);
            loop {
                let page = api.list(&params).await?;
                items.extend(page.items);
                match page.metadata.continue_.filter(|token| !token.is_empty()) {
                    Some(token) => {
                        debug!("continuing {} list", kind.plural);
                        params = params.continue_token(&token);
                    }
                    None => break,
                }
            }
            Ok(items)
        }
        .boxed()
    }

    fn get<'a>(
        &'a self,
        kind: &'a ResourceKind,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> BoxFuture<'a, Result<DynamicObject, ApiError>> {
        async move {
            let api = self.dynamic(kind, namespace);
            Ok(api.get(name).await?)
        }
        .boxed()
    }
}


#[cfg(test)]
mod tests {
    use super::ApiError;

    #[test]
    fn kube_api_errors_keep_their_status_code() {
        let error = ApiError::from(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "the server could not find the requested resource".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        }));
        assert!(error.is_not_found());
        assert!(error.to_string().contains("NotFound (404)"));

        let forbidden = ApiError::from(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "pods is forbidden".to_string(),
            reason: "Forbidden".to_string(),
            code: 403,
        }));
        assert!(!forbidden.is_not_found());
    }
}
