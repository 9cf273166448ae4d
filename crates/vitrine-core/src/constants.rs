//! Limits for the Vitrine runtime
//!
//! All limits are explicit, use big-endian naming (most significant first),
//! and include units in the name.

// =============================================================================
// Identity Limits
// =============================================================================

/// Maximum length of a component type name in bytes
pub const TYPE_NAME_LENGTH_BYTES_MAX: usize = 128;

/// Maximum length of a full instance id (type name plus counter) in bytes
pub const INSTANCE_ID_LENGTH_BYTES_MAX: usize = 160;

// =============================================================================
// Render Limits
// =============================================================================

/// Maximum size of rendered markup in bytes (10 MB)
pub const MARKUP_SIZE_BYTES_MAX: usize = 10 * 1024 * 1024;

/// Maximum size of component style text in bytes (1 MB)
pub const STYLE_SIZE_BYTES_MAX: usize = 1024 * 1024;

// =============================================================================
// Subscription Limits
// =============================================================================

/// Maximum number of watchers on a single prop or state key
pub const WATCHERS_PER_KEY_COUNT_MAX: usize = 1024;

/// Maximum number of named refs per instance
pub const REFS_COUNT_MAX: usize = 1024;

/// Maximum number of global store subscribers
pub const STORE_SUBSCRIBERS_COUNT_MAX: usize = 10_000;

// =============================================================================
// Registry Limits
// =============================================================================

/// Maximum number of live component instances per registry
pub const INSTANCES_CONCURRENT_COUNT_MAX: usize = 100_000;

/// Maximum length of a message-bus event name in bytes
pub const EVENT_NAME_LENGTH_BYTES_MAX: usize = 128;

// Compile-time assertions for constant validity
const _: () = {
    assert!(TYPE_NAME_LENGTH_BYTES_MAX >= 32);
    assert!(INSTANCE_ID_LENGTH_BYTES_MAX > TYPE_NAME_LENGTH_BYTES_MAX);
    assert!(MARKUP_SIZE_BYTES_MAX <= 100 * 1024 * 1024);
    assert!(STYLE_SIZE_BYTES_MAX <= MARKUP_SIZE_BYTES_MAX);
    assert!(WATCHERS_PER_KEY_COUNT_MAX >= 16);
    assert!(INSTANCES_CONCURRENT_COUNT_MAX >= 1000);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_have_units_in_names() {
        // Documents the naming convention: byte limits end in _BYTES_MAX,
        // count limits in _COUNT_MAX.
        let _: usize = TYPE_NAME_LENGTH_BYTES_MAX;
        let _: usize = MARKUP_SIZE_BYTES_MAX;
        let _: usize = WATCHERS_PER_KEY_COUNT_MAX;
    }

    #[test]
    fn test_instance_id_fits_counter_suffix() {
        // A u64 counter renders to at most 20 digits plus the separator.
        assert!(INSTANCE_ID_LENGTH_BYTES_MAX - TYPE_NAME_LENGTH_BYTES_MAX >= 21);
    }
}
