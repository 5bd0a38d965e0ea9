//! Lua scripts backing [`crate::lock::RedisDistributedLock`].
//!
//! Every lock operation that reads then writes is expressed as a script so
//! Redis executes it atomically; there is no window between "check owner"
//! and "act on it" for a concurrent client to land in.

/// `SET key owner PX ttl_ms NX`. Returns `1` on success, `0` if the key is
/// already held.
pub const LOCK_ACQUIRE: &str = r"
local ok = redis.call('SET', KEYS[1], ARGV[1], 'NX', 'PX', ARGV[2])
if ok then
    return 1
else
    return 0
end
";

/// Refreshes the TTL only if `owner` still matches the stored value.
/// Returns `1` on success, `0` if the lock expired or is held by another
/// owner.
pub const LOCK_EXTEND: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('PEXPIRE', KEYS[1], ARGV[2])
    return 1
else
    return 0
end
";

/// Deletes the key only if `owner` still matches the stored value. Returns
/// `1` on success, `0` if the lock was not held by this owner.
pub const LOCK_RELEASE: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('DEL', KEYS[1])
    return 1
else
    return 0
end
";
