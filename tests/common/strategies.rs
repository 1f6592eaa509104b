use proptest::prelude::*;

/// Strategy for generating up to three parallel source sequences of small integers
pub fn parallel_sources_strategy() -> impl Strategy<Value = Vec<Vec<u32>>> {
    prop::collection::vec(prop::collection::vec(0u32..1000, 0..40), 1..4)
}

/// Strategy for generating valid chunk sizes
pub fn chunk_size_strategy() -> impl Strategy<Value = usize> {
    1usize..16
}

/// Strategy for generating screen names accepted by the remote service
pub fn screen_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,15}"
}

/// Strategy for generating user id and screen name lists, possibly empty
pub fn identity_lists_strategy() -> impl Strategy<Value = (Vec<u64>, Vec<String>)> {
    (
        prop::collection::vec(1u64..u64::MAX, 0..20),
        prop::collection::vec(screen_name_strategy(), 0..20),
    )
}
