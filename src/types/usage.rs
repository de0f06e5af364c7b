//! Token usage accounting.

use serde::{Deserialize, Serialize};

/// Token usage for one model call, or the sum over several.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_tokens: Option<u32>,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    /// Merge another usage into this one (accumulate).
    pub fn merge(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        if let Some(v) = other.cache_read_tokens {
            *self.cache_read_tokens.get_or_insert(0) += v;
        }
        if let Some(v) = other.cache_creation_tokens {
            *self.cache_creation_tokens.get_or_insert(0) += v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_accumulates_optional_counters_only_when_present() {
        let mut total = Usage {
            input_tokens: 10,
            output_tokens: 5,
            ..Default::default()
        };
        total.merge(&Usage {
            input_tokens: 3,
            output_tokens: 2,
            cache_read_tokens: Some(7),
            cache_creation_tokens: None,
        });

        assert_eq!(total.input_tokens, 13);
        assert_eq!(total.output_tokens, 7);
        assert_eq!(total.total_tokens(), 20);
        assert_eq!(total.cache_read_tokens, Some(7));
        assert_eq!(total.cache_creation_tokens, None);
    }
}
