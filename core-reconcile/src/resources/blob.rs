//! Content blob reconciler for custom data files and custom rule sets
//!
//! Both families upload an opaque file, cannot be modified in place, and
//! are addressed by filename. The appliance stores blobs under the stem of
//! the uploaded name, so deletion strips the extension before calling out.

use std::sync::Arc;

use async_trait::async_trait;
use client_traits::{ApplianceClient, ContentResponse, StatusResponse};
use core_retry::{CancellationToken, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::address::parse_flat;
use crate::classify::classify_client_error;
use crate::content;
use crate::drift::BLOB_ABSENT;
use crate::error::{Op, ReconcileError, Result};
use crate::reconciler::{Outcome, Reconcile};

/// The two upload families share one reconciler; the family picks the
/// endpoint set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobFamily {
    CustomData,
    CustomRule,
}

impl BlobFamily {
    pub fn kind_name(self) -> &'static str {
        match self {
            BlobFamily::CustomData => "custom_data",
            BlobFamily::CustomRule => "custom_rule",
        }
    }
}

/// Caller-declared blob: a filename and its plain-text content
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlobDesired {
    pub filename: String,
    pub data: String,
}

/// Last-synchronized view of an uploaded blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlobState {
    pub filename: String,
    pub data: String,
}

pub struct ContentBlobReconciler {
    client: Arc<dyn ApplianceClient>,
    retry: RetryPolicy,
    family: BlobFamily,
}

impl ContentBlobReconciler {
    pub fn new(client: Arc<dyn ApplianceClient>, retry: RetryPolicy, family: BlobFamily) -> Self {
        Self {
            client,
            retry,
            family,
        }
    }

    async fn upload(
        &self,
        cancel: &CancellationToken,
        filename: &str,
        encoded: &str,
    ) -> std::result::Result<StatusResponse, core_retry::RetryError<client_traits::ClientError>>
    {
        self.retry
            .run(cancel, classify_client_error, || match self.family {
                BlobFamily::CustomData => self.client.add_custom_data(filename, encoded),
                BlobFamily::CustomRule => self.client.add_custom_rule(filename, encoded),
            })
            .await
    }

    async fn fetch(
        &self,
        cancel: &CancellationToken,
        filename: &str,
    ) -> std::result::Result<ContentResponse, core_retry::RetryError<client_traits::ClientError>>
    {
        self.retry
            .run(cancel, classify_client_error, || match self.family {
                BlobFamily::CustomData => self.client.show_custom_data(filename),
                BlobFamily::CustomRule => self.client.show_custom_rule(filename),
            })
            .await
    }

    async fn remove(
        &self,
        cancel: &CancellationToken,
        filename: &str,
    ) -> std::result::Result<StatusResponse, core_retry::RetryError<client_traits::ClientError>>
    {
        self.retry
            .run(cancel, classify_client_error, || match self.family {
                BlobFamily::CustomData => self.client.delete_custom_data(filename),
                BlobFamily::CustomRule => self.client.delete_custom_rule(filename),
            })
            .await
    }
}

/// Filename without its final extension; a leading dot is not an
/// extension separator.
fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(i) if i > 0 => &filename[..i],
        _ => filename,
    }
}

#[async_trait]
impl Reconcile for ContentBlobReconciler {
    type Desired = ContentBlobDesired;
    type State = ContentBlobState;

    fn kind(&self) -> &'static str {
        self.family.kind_name()
    }

    #[instrument(skip_all, fields(kind = self.family.kind_name(), filename = %desired.filename))]
    async fn create(
        &self,
        cancel: &CancellationToken,
        desired: Self::Desired,
    ) -> Result<Self::State> {
        debug!("uploading content blob");
        let encoded = content::normalize(&desired.data);

        self.upload(cancel, &desired.filename, &encoded)
            .await
            .map_err(|e| {
                ReconcileError::operation(Op::Create, self.family.kind_name(), &desired.filename, e)
            })?;

        Ok(ContentBlobState {
            filename: desired.filename,
            data: desired.data,
        })
    }

    #[instrument(skip_all, fields(kind = self.family.kind_name(), filename = %state.filename))]
    async fn read(
        &self,
        cancel: &CancellationToken,
        state: Self::State,
    ) -> Result<Outcome<Self::State>> {
        let result = self.fetch(cancel, &state.filename).await;

        match result {
            Ok(response) => {
                let data = content::denormalize(&response.data)?;
                Ok(Outcome::Present(ContentBlobState {
                    filename: state.filename,
                    data,
                }))
            }
            Err(e) if BLOB_ABSENT.matches_retry(&e) => {
                debug!(filename = %state.filename, "blob vanished remotely");
                Ok(Outcome::Absent)
            }
            Err(e) => Err(ReconcileError::operation(
                Op::Read,
                self.family.kind_name(),
                &state.filename,
                e,
            )),
        }
    }

    async fn update(
        &self,
        _cancel: &CancellationToken,
        _state: Self::State,
        _desired: Self::Desired,
    ) -> Result<Self::State> {
        // Uploads are immutable; callers replace the blob instead.
        Err(ReconcileError::UnsupportedUpdate {
            kind: self.family.kind_name(),
        })
    }

    #[instrument(skip_all, fields(kind = self.family.kind_name(), filename = %state.filename))]
    async fn delete(&self, cancel: &CancellationToken, state: Self::State) -> Result<()> {
        let stored = strip_extension(&state.filename);

        self.remove(cancel, stored).await.map_err(|e| {
            ReconcileError::operation(Op::Delete, self.family.kind_name(), &state.filename, e)
        })?;

        Ok(())
    }

    #[instrument(skip_all, fields(kind = self.family.kind_name(), id = id))]
    async fn import_state(&self, cancel: &CancellationToken, id: &str) -> Result<Self::State> {
        let filename = parse_flat(id)?;

        let response = self
            .fetch(cancel, filename)
            .await
            .map_err(|e| ReconcileError::operation(Op::Import, self.family.kind_name(), id, e))?;

        let data = content::denormalize(&response.data)?;

        Ok(ContentBlobState {
            filename: filename.to_string(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing::{ok_status, test_retry, MockClient};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use client_traits::ClientError;

    #[tokio::test]
    async fn test_create_uploads_marked_base64_payload() {
        let mut client = MockClient::new();
        client
            .expect_add_custom_data()
            .times(1)
            .withf(|filename, payload| {
                let expected = STANDARD.encode(format!(
                    "{}Data{}",
                    crate::content::CONTENT_MARKER,
                    crate::content::CONTENT_TERMINATOR
                ));
                filename == "geo.txt" && payload == expected
            })
            .returning(|_, _| Ok(ok_status()));

        let reconciler =
            ContentBlobReconciler::new(Arc::new(client), test_retry(), BlobFamily::CustomData);
        let desired: ContentBlobDesired =
            serde_json::from_str(r#"{"filename": "geo.txt", "data": "Data"}"#).unwrap();

        let state = reconciler
            .create(&CancellationToken::new(), desired)
            .await
            .unwrap();
        assert_eq!(state.data, "Data");
    }

    #[tokio::test]
    async fn test_read_round_trips_non_ascii_content() {
        let text = "SecRule REQUEST_URI \"@contains Universität\" deny";
        let wire = content::normalize(text);

        let mut client = MockClient::new();
        client
            .expect_show_custom_rule()
            .times(1)
            .returning(move |_| Ok(ContentResponse { data: wire.clone() }));

        let reconciler =
            ContentBlobReconciler::new(Arc::new(client), test_retry(), BlobFamily::CustomRule);
        let state = ContentBlobState {
            filename: "waf.conf".to_string(),
            data: text.to_string(),
        };

        let outcome = reconciler
            .read(&CancellationToken::new(), state)
            .await
            .unwrap();
        assert_eq!(outcome.into_present().unwrap().data, text);
    }

    #[tokio::test]
    async fn test_read_heals_404() {
        let mut client = MockClient::new();
        client
            .expect_show_custom_data()
            .times(1)
            .returning(|_| Err(ClientError::api(404, "no such file")));

        let reconciler =
            ContentBlobReconciler::new(Arc::new(client), test_retry(), BlobFamily::CustomData);
        let state = ContentBlobState {
            filename: "geo.txt".to_string(),
            data: String::new(),
        };

        let outcome = reconciler
            .read(&CancellationToken::new(), state)
            .await
            .unwrap();
        assert!(outcome.is_absent());
    }

    #[tokio::test]
    async fn test_update_is_refused() {
        let reconciler = ContentBlobReconciler::new(
            Arc::new(MockClient::new()),
            test_retry(),
            BlobFamily::CustomRule,
        );
        let state = ContentBlobState {
            filename: "waf.conf".to_string(),
            data: String::new(),
        };
        let desired: ContentBlobDesired =
            serde_json::from_str(r#"{"filename": "waf.conf", "data": "x"}"#).unwrap();

        let result = reconciler
            .update(&CancellationToken::new(), state, desired)
            .await;
        assert!(matches!(
            result,
            Err(ReconcileError::UnsupportedUpdate { kind: "custom_rule" })
        ));
    }

    #[tokio::test]
    async fn test_delete_strips_extension() {
        let mut client = MockClient::new();
        client
            .expect_delete_custom_data()
            .times(1)
            .withf(|filename| filename == "geo")
            .returning(|_| Ok(ok_status()));

        let reconciler =
            ContentBlobReconciler::new(Arc::new(client), test_retry(), BlobFamily::CustomData);
        let state = ContentBlobState {
            filename: "geo.txt".to_string(),
            data: String::new(),
        };

        reconciler
            .delete(&CancellationToken::new(), state)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_import_decodes_stored_payload() {
        let wire = content::normalize("allow 10.0.0.0/8");

        let mut client = MockClient::new();
        client
            .expect_show_custom_data()
            .times(1)
            .withf(|filename| filename == "acl")
            .returning(move |_| Ok(ContentResponse { data: wire.clone() }));

        let reconciler =
            ContentBlobReconciler::new(Arc::new(client), test_retry(), BlobFamily::CustomData);
        let state = reconciler
            .import_state(&CancellationToken::new(), "acl")
            .await
            .unwrap();

        assert_eq!(state.data, "allow 10.0.0.0/8");
    }

    #[test]
    fn test_strip_extension_edge_cases() {
        assert_eq!(strip_extension("geo.txt"), "geo");
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }
}
