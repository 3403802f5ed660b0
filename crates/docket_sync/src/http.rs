//! HTTP mapping of the remote transport.
//!
//! The actual HTTP client is abstracted via a trait so different
//! implementations (reqwest, ureq, a test double) can be plugged in.
//! Bodies are JSON; the endpoint surface is:
//!
//! - `POST   /entities` — create, returns the entity with its version
//! - `PUT    /entities/{id}` — update, body carries `baseVersion`
//! - `DELETE /entities/{id}?version={v}` — delete at a version
//!
//! HTTP 409 carries the server's current version and becomes
//! [`MutationError::VersionConflict`]; 404 becomes `NotFound`; 5xx is a
//! retriable transport error, any other 4xx a fatal one.

use crate::config::SyncConfig;
use crate::error::{MutationError, MutationResult};
use crate::transport::RemoteTransport;
use docket_core::{Entity, EntityId, Version};
use serde::{Deserialize, Serialize};

/// A minimal HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual transport. The client is
/// responsible for honoring [`SyncConfig::timeout`] and for setting the
/// `Content-Type: application/json` header on bodies.
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response, or a transport-level
    /// error message (DNS failure, refused connection, timeout).
    fn request(
        &self,
        method: &str,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<HttpResponse, String>;
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    #[serde(rename = "baseVersion")]
    base_version: Version,
    entity: &'a Entity,
}

#[derive(Deserialize)]
struct ConflictBody {
    #[serde(rename = "currentVersion")]
    current_version: Version,
}

/// Remote transport over HTTP.
pub struct HttpRemote<C: HttpClient> {
    config: SyncConfig,
    client: C,
}

impl<C: HttpClient> HttpRemote<C> {
    /// Creates a transport for the configured endpoint.
    pub fn new(config: SyncConfig, client: C) -> Self {
        Self { config, client }
    }

    /// Returns the endpoint configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<Vec<u8>>,
        entity_id: &EntityId,
        base_version: Version,
    ) -> MutationResult<Vec<u8>> {
        let url = self.url(path);
        let response = self
            .client
            .request(method, &url, body)
            .map_err(MutationError::transport_retryable)?;

        match response.status {
            200 | 201 | 204 => Ok(response.body),
            404 => Err(MutationError::NotFound {
                entity_id: entity_id.clone(),
            }),
            409 => {
                let conflict: ConflictBody = serde_json::from_slice(&response.body)
                    .map_err(|e| MutationError::Protocol(format!("malformed 409 body: {e}")))?;
                Err(MutationError::VersionConflict {
                    entity_id: entity_id.clone(),
                    base_version,
                    server_version: conflict.current_version,
                })
            }
            status if status >= 500 => Err(MutationError::transport_retryable(format!(
                "{method} {url}: server error {status}"
            ))),
            status => Err(MutationError::transport_fatal(format!(
                "{method} {url}: unexpected status {status}"
            ))),
        }
    }

    fn decode_entity(body: &[u8]) -> MutationResult<Entity> {
        serde_json::from_slice(body)
            .map_err(|e| MutationError::Protocol(format!("malformed entity body: {e}")))
    }
}

impl<C: HttpClient> RemoteTransport for HttpRemote<C> {
    fn create(&self, entity: &Entity) -> MutationResult<Entity> {
        let body = serde_json::to_vec(entity)
            .map_err(|e| MutationError::Protocol(format!("encoding entity: {e}")))?;
        let response = self.send("POST", "/entities", Some(body), &entity.id, entity.version)?;
        Self::decode_entity(&response)
    }

    fn update(
        &self,
        id: &EntityId,
        entity: &Entity,
        base_version: Version,
    ) -> MutationResult<Entity> {
        let body = serde_json::to_vec(&UpdateBody {
            base_version,
            entity,
        })
        .map_err(|e| MutationError::Protocol(format!("encoding update: {e}")))?;
        let path = format!("/entities/{id}");
        let response = self.send("PUT", &path, Some(body), id, base_version)?;
        Self::decode_entity(&response)
    }

    fn delete(&self, id: &EntityId, base_version: Version) -> MutationResult<()> {
        let path = format!("/entities/{id}?version={}", base_version.as_u64());
        self.send("DELETE", &path, None, id, base_version)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::Timestamp;
    use parking_lot::Mutex;

    struct ScriptedClient {
        responses: Mutex<Vec<Result<HttpResponse, String>>>,
        requests: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<HttpResponse, String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for ScriptedClient {
        fn request(
            &self,
            method: &str,
            url: &str,
            _body: Option<Vec<u8>>,
        ) -> Result<HttpResponse, String> {
            self.requests.lock().push((method.to_string(), url.to_string()));
            self.responses.lock().remove(0)
        }
    }

    fn remote(responses: Vec<Result<HttpResponse, String>>) -> HttpRemote<ScriptedClient> {
        HttpRemote::new(
            SyncConfig::new("https://api.example.com"),
            ScriptedClient::new(responses),
        )
    }

    fn entity_json(id: &str, version: u64) -> Vec<u8> {
        serde_json::to_vec(
            &Entity::new(id, "accepted")
                .with_version(Version::new(version))
                .with_updated_at(Timestamp::from_millis(1_000)),
        )
        .unwrap()
    }

    #[test]
    fn update_hits_put_with_id_in_path() {
        let remote = remote(vec![Ok(HttpResponse {
            status: 200,
            body: entity_json("c1", 4),
        })]);

        let confirmed = remote
            .update(
                &EntityId::from("c1"),
                &Entity::new("c1", "accepted"),
                Version::new(3),
            )
            .unwrap();
        assert_eq!(confirmed.version, Version::new(4));

        let requests = remote.client.requests.lock().clone();
        assert_eq!(
            requests,
            vec![(
                "PUT".to_string(),
                "https://api.example.com/entities/c1".to_string()
            )]
        );
    }

    #[test]
    fn conflict_response_carries_server_version() {
        let remote = remote(vec![Ok(HttpResponse {
            status: 409,
            body: br#"{"currentVersion": 7}"#.to_vec(),
        })]);

        let err = remote
            .update(
                &EntityId::from("c1"),
                &Entity::new("c1", "accepted"),
                Version::new(3),
            )
            .unwrap_err();
        match err {
            MutationError::VersionConflict {
                base_version,
                server_version,
                ..
            } => {
                assert_eq!(base_version, Version::new(3));
                assert_eq!(server_version, Version::new(7));
            }
            other => panic!("expected conflict, got {other}"),
        }
    }

    #[test]
    fn delete_encodes_version_as_query() {
        let remote = remote(vec![Ok(HttpResponse {
            status: 204,
            body: Vec::new(),
        })]);

        remote.delete(&EntityId::from("c1"), Version::new(3)).unwrap();
        let requests = remote.client.requests.lock().clone();
        assert_eq!(requests[0].0, "DELETE");
        assert_eq!(requests[0].1, "https://api.example.com/entities/c1?version=3");
    }

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        let remote = remote(vec![
            Ok(HttpResponse {
                status: 503,
                body: Vec::new(),
            }),
            Ok(HttpResponse {
                status: 400,
                body: Vec::new(),
            }),
            Err("connection refused".to_string()),
        ]);

        let entity = Entity::new("c1", "new");
        assert!(remote.create(&entity).unwrap_err().is_retryable());
        assert!(!remote.create(&entity).unwrap_err().is_retryable());
        assert!(remote.create(&entity).unwrap_err().is_retryable());
    }

    #[test]
    fn missing_entity_maps_to_not_found() {
        let remote = remote(vec![Ok(HttpResponse {
            status: 404,
            body: Vec::new(),
        })]);

        assert!(matches!(
            remote.delete(&EntityId::from("ghost"), Version::new(1)),
            Err(MutationError::NotFound { .. })
        ));
    }

    #[test]
    fn malformed_bodies_are_protocol_errors() {
        let remote = remote(vec![Ok(HttpResponse {
            status: 200,
            body: b"not json".to_vec(),
        })]);

        assert!(matches!(
            remote.create(&Entity::new("c1", "new")),
            Err(MutationError::Protocol(_))
        ));
    }
}
