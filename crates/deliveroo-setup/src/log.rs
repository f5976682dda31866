/// Sink for diagnostic lines emitted while validating a token.
pub trait ValidationLog: Send + Sync {
    fn debug(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards validation diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl ValidationLog for TracingLog {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "deliveroo_setup::validator", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "deliveroo_setup::validator", "{message}");
    }
}

const VISIBLE_SUFFIX: usize = 4;
const MIN_REVEAL_LEN: usize = 8;

/// Render a bearer token for logs. Tokens longer than eight characters keep
/// their last four; anything shorter is hidden entirely.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= MIN_REVEAL_LEN {
        return "****".to_string();
    }
    let suffix: String = chars[chars.len() - VISIBLE_SUFFIX..].iter().collect();
    format!("****{suffix}")
}
