use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use super::KeyValueStore;
use crate::config::Storage;
use crate::error::KvError;

/// Keeps every key as its own object in a single bucket.
pub struct ObjectStore {
    client: Client,
    bucket: String,
}

impl ObjectStore {
    pub async fn new(storage: &Storage) -> Self {
        let mut loader =
            aws_config::from_env().region(aws_config::Region::new(storage.aws_region.clone()));
        if let Some(endpoint_url) = &storage.aws_endpoint_url_s3 {
            loader = loader.endpoint_url(endpoint_url);
        }
        let config = loader.load().await;

        Self::with_client(Client::new(&config), &storage.bucket)
    }

    pub fn with_client(client: Client, bucket: &str) -> Self {
        ObjectStore {
            client,
            bucket: bucket.to_string(),
        }
    }
}

impl KeyValueStore for ObjectStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    return Ok(None);
                }
                return Err(KvError::ObjectStorage(Box::new(err)));
            }
        };

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| KvError::ObjectStorage(Box::new(e)))?
            .into_bytes();

        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|_| KvError::Encoding {
                key: key.to_string(),
            })
    }

    async fn put(&self, key: &str, value: String) -> Result<(), KvError> {
        tracing::debug!(bucket = %self.bucket, key, "writing object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(value.into_bytes()))
            .send()
            .await
            .map_err(|e| KvError::ObjectStorage(Box::new(e)))?;
        Ok(())
    }
}
