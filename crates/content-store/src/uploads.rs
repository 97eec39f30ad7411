//! File upload collaborator contract

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;

/// Links uploaded files to an entity after its root row is written.
///
/// Invoked only when a create/update payload carries a `files` map; the
/// engine re-fetches the entity afterward to pick up the resulting links.
#[async_trait]
pub trait FileUploadService: Send + Sync {
    async fn upload_files(&self, uid: &str, entity: &Value, files: &Value) -> StoreResult<()>;
}

/// A recorded upload request
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub uid: String,
    pub entity_id: Option<i64>,
    pub files: Value,
}

/// Recording implementation for tests
#[derive(Debug, Default)]
pub struct MemoryUploadService {
    calls: std::sync::Mutex<Vec<UploadCall>>,
}

impl MemoryUploadService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileUploadService for MemoryUploadService {
    async fn upload_files(&self, uid: &str, entity: &Value, files: &Value) -> StoreResult<()> {
        self.calls.lock().unwrap().push(UploadCall {
            uid: uid.to_string(),
            entity_id: entity.get("id").and_then(Value::as_i64),
            files: files.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upload_calls_are_recorded() {
        let service = MemoryUploadService::new();
        service
            .upload_files("api::post.post", &json!({"id": 3}), &json!({"cover": "a.png"}))
            .await
            .unwrap();

        let calls = service.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].entity_id, Some(3));
        assert_eq!(calls[0].files["cover"], "a.png");
    }
}
