// vizboard_app/src/map_service.rs

//! Saving and loading maps through the remote map services.

use crate::error::{DashboardError, UserNotice};
use crate::transport::{FeedTransport, MapFileRequest};
use tracing::{info, warn};

/// The saver writes `<path>.pgm` and `<path>.yaml` itself, so any extension
/// the operator typed is dropped.
pub fn normalize_save_path(path: &str) -> String {
    let path = path.trim();
    path.strip_suffix(".pgm")
        .or_else(|| path.strip_suffix(".yaml"))
        .unwrap_or(path)
        .to_string()
}

/// The loader reads the `.yaml` descriptor, never the image.
pub fn normalize_load_path(path: &str) -> String {
    let path = path.trim();
    if let Some(stem) = path.strip_suffix(".pgm") {
        format!("{stem}.yaml")
    } else if path.ends_with(".yaml") {
        path.to_string()
    } else {
        format!("{path}.yaml")
    }
}

pub async fn save_map<T: FeedTransport>(
    transport: &mut T,
    service: &str,
    path: &str,
    topic: &str,
) -> UserNotice {
    let request = MapFileRequest {
        file_path: normalize_save_path(path),
        topic: topic.to_string(),
    };
    call(transport, service, request).await
}

pub async fn load_map<T: FeedTransport>(
    transport: &mut T,
    service: &str,
    path: &str,
    topic: &str,
) -> UserNotice {
    let request = MapFileRequest {
        file_path: normalize_load_path(path),
        topic: topic.to_string(),
    };
    call(transport, service, request).await
}

/// Either way the operator sees what the service said. Failures are not
/// retried.
async fn call<T: FeedTransport>(transport: &mut T, service: &str, request: MapFileRequest) -> UserNotice {
    let file_path = request.file_path.clone();
    match transport.call_service(service, request).await {
        Ok(reply) => {
            info!(service, file_path = %file_path, success = reply.success, "Map service replied");
            UserNotice::new(reply.message)
        }
        Err(DashboardError::ServiceFailed { message, .. }) => {
            warn!(service, file_path = %file_path, reply = %message, "Map service failed");
            UserNotice::new(message)
        }
        Err(e) => {
            warn!(service, file_path = %file_path, error = %e, "Map service call failed");
            UserNotice::new(e.to_string())
        }
    }
}
