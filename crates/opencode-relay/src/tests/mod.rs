//! Integration tests for the relay.
//!
//! - `harness.rs`   - Mock chat transport and a throwaway desktop (fake
//!                    terminal, work dir, X socket dir, audit file)
//! - `scenarios.rs` - One event in, one outcome out: authorization, input
//!                    validation, launches and their replies
//! - `polling.rs`   - The relay loop: ordering, backoff, fatal errors

mod polling;
