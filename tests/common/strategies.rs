//! Proptest strategies for generating tokens, queue items and pagination metadata.

use ahjo_sync::auth::AuthToken;
use ahjo_sync::constants::queues;
use ahjo_sync::source::PaginationCursor;
use proptest::prelude::*;

pub fn auth_token_strategy() -> impl Strategy<Value = AuthToken> {
    (
        "[A-Za-z0-9._~+/=-]{0,64}",
        any::<i64>(),
        "[A-Za-z0-9._~+/=-]{0,64}",
    )
        .prop_map(|(access, expires, refresh)| AuthToken::new(access, expires, refresh))
}

pub fn entity_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "U[0-9]{11}",
        "HEL 20[0-9]{2}-[0-9]{6}",
        "\\{[0-9A-F]{8}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{12}\\}",
    ]
}

pub fn endpoint_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["meetings", "decisions", "cases", "agenda-items", "trustees"])
        .prop_map(str::to_string)
}

pub fn update_type_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Added", "Updated", "Removed", "Updated - ahjo_api_subscriber_queue"])
        .prop_map(str::to_string)
}

pub fn queue_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(queues::ALL.to_vec())
}

pub fn cursor_strategy() -> impl Strategy<Value = PaginationCursor> {
    (1u64..=500, 0u64..5_000, 0u64..100_000).prop_map(|(limit, offset, total_count)| {
        PaginationCursor {
            limit,
            offset,
            total_count,
        }
    })
}
