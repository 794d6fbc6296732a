use dashmap::DashMap;

/// Sender id → NLU session token.
///
/// Entries are created on a sender's first message and live for the life of
/// the process.
#[derive(Debug, Default)]
pub struct SessionMap {
    tokens: DashMap<String, String>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sender's session token, minting one on first contact.
    pub fn token_for(&self, sender: &str) -> String {
        if let Some(token) = self.tokens.get(sender) {
            return token.clone();
        }
        self.tokens
            .entry(sender.to_string())
            .or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
