use std::sync::Arc;

use fedgate_federation::CacheType;
use fedgate_state::DistributedLock;
use fedgate_state_filelock::FileDistributedLock;
use fedgate_state_memory::MemoryDistributedLock;
use fedgate_state_redis::{RedisConfig, RedisDistributedLock};

use crate::error::ServerError;

/// Construct the `DistributedLock` backend named by `cache_type` (§4.4),
/// mirroring the teacher's `create_state` backend-selection factory.
pub fn create_lock(
    cache_type: CacheType,
    redis_url: Option<&str>,
    filelock_path: Option<&str>,
) -> Result<Arc<dyn DistributedLock>, ServerError> {
    match cache_type {
        CacheType::None => Ok(Arc::new(MemoryDistributedLock::new())),
        CacheType::Redis => {
            let url = redis_url.ok_or_else(|| ServerError::Config("cache_type = \"redis\" requires redis_url".into()))?;
            let config = RedisConfig {
                url: url.to_owned(),
                ..RedisConfig::default()
            };
            let lock = RedisDistributedLock::new(&config)
                .map_err(|e| ServerError::Config(format!("redis lock: {e}")))?;
            Ok(Arc::new(lock))
        }
        CacheType::File => {
            let path = filelock_path
                .ok_or_else(|| ServerError::Config("cache_type = \"file\" requires filelock_path".into()))?;
            Ok(Arc::new(FileDistributedLock::new(path)))
        }
    }
}
