/// Re-export `Config` from `campaign-core` for use within this crate.
///
/// All environment-variable parsing lives in `campaign-core` so it can be
/// shared with integration tests without depending on the full server.
pub use campaign_core::config::{Backend, Config};
