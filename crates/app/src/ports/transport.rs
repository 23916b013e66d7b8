//! Transport port — deliver an action payload to the upstream API.

use std::future::Future;

use presence_domain::error::PresenceError;

/// Sends one authenticated API call.
///
/// Implementations own the base URL and credentials; the engine only names
/// the method (`chat.postMessage`, …) and provides the JSON body. Every kind
/// of failure is reported as `Err`, and the engine does not distinguish
/// between them.
pub trait ActionTransport: Send + Sync {
    /// POST `payload` to the API method `endpoint`.
    fn post(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send;
}

impl<T: ActionTransport> ActionTransport for std::sync::Arc<T> {
    fn post(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        (**self).post(endpoint, payload)
    }
}
