use std::sync::Arc;

use bytes::Bytes;

use crate::cache::cache::KeyType;
use crate::cache::engine::LruCache;
use crate::cache::error::CacheError;
use crate::protocol::text::{StoreRequest, TextRequest, TextResponse, ValueReply};

use super::stats::Stats;

pub const MAX_KEY_LENGTH: usize = 250;

/// Dispatches parsed requests against the cache engine and produces the
/// reply for each. Returns `None` only for `quit`, which closes the
/// connection without a reply.
pub struct TextHandler {
    store: Arc<LruCache>,
    stats: Arc<Stats>,
}

impl TextHandler {
    pub fn new(store: Arc<LruCache>, stats: Arc<Stats>) -> TextHandler {
        TextHandler { store, stats }
    }

    pub fn handle_request(&self, request: TextRequest) -> Option<TextResponse> {
        match request {
            TextRequest::Quit => None,
            TextRequest::Malformed(err) => Some(TextResponse::ClientError(err.to_string())),
            TextRequest::Unsupported { cmd } => {
                tracing::debug!("unsupported command: {:?}", cmd);
                self.stats.incr_unsupported();
                Some(TextResponse::Error)
            }
            TextRequest::Get { keys } => {
                if let Some(reply) = validate_keys(&keys) {
                    return Some(reply);
                }
                let response = self.lookup(&keys, false);
                self.stats.incr_get();
                Some(response)
            }
            TextRequest::Gets { keys } => {
                if let Some(reply) = validate_keys(&keys) {
                    return Some(reply);
                }
                let response = self.lookup(&keys, true);
                self.stats.incr_gets();
                Some(response)
            }
            TextRequest::Set(store) => {
                if let Some(reply) = validate_key(&store.key) {
                    return Some(reply);
                }
                self.store.add(store.key, store.data, store.flags);
                self.stats.incr_set();
                Some(TextResponse::Stored)
            }
            TextRequest::Cas(store) => {
                if let Some(reply) = validate_key(&store.key) {
                    return Some(reply);
                }
                let response = self.compare_and_swap(store);
                self.stats.incr_cas();
                Some(response)
            }
            TextRequest::Delete { key } => {
                if let Some(reply) = validate_key(&key) {
                    return Some(reply);
                }
                let response = match self.store.delete(&key) {
                    Ok(()) => TextResponse::Deleted,
                    Err(_) => TextResponse::NotFound,
                };
                self.stats.incr_delete();
                Some(response)
            }
        }
    }

    /// Multi-key lookup: one `VALUE` block per hit, misses are silently
    /// omitted. Keys are resolved one at a time, so no two shard locks are
    /// ever held together.
    fn lookup(&self, keys: &[Bytes], with_cas: bool) -> TextResponse {
        let mut values = Vec::new();
        for key in keys {
            if let Ok(record) = self.store.get(key) {
                values.push(ValueReply {
                    key: key.clone(),
                    flags: record.flags,
                    data: record.value,
                    cas: with_cas.then_some(record.cas),
                });
            }
        }
        TextResponse::Values(values)
    }

    fn compare_and_swap(&self, store: StoreRequest) -> TextResponse {
        match self
            .store
            .compare_and_swap(store.key, store.data, store.flags, store.cas)
        {
            Ok(_) => TextResponse::Stored,
            Err(CacheError::NotFound) => TextResponse::NotFound,
            Err(CacheError::KeyExists) => TextResponse::Exists,
        }
    }
}

fn validate_key(key: &KeyType) -> Option<TextResponse> {
    if key.len() > MAX_KEY_LENGTH {
        return Some(TextResponse::ClientError(format!(
            "key is too long (max is {} bytes)",
            MAX_KEY_LENGTH
        )));
    }
    None
}

fn validate_keys(keys: &[KeyType]) -> Option<TextResponse> {
    keys.iter().find_map(|key| validate_key(key))
}
