//! Multi-strategy duplicate detection against stored history.
//!
//! Three strategies run in strict order, short-circuiting on first match:
//! exact URL equality, content-hash containment, then a company-scoped
//! case-insensitive title-prefix match. The order is cheapest and most
//! precise first: the URL lookup is an equality index scan, the hash lookup
//! a GIN containment scan, and the prefix match a pattern scan that is also
//! the most prone to false positives, so it is bound to the same company.

use sha2::{Digest, Sha256};

use sigdex_core::Signal;

use crate::store::SignalStore;
use crate::DbError;

/// Hex characters kept from the SHA-256 digest.
pub const CONTENT_HASH_CHARS: usize = 32;

/// Title characters compared by the prefix strategy.
pub const TITLE_PREFIX_CHARS: usize = 50;

/// Deterministic content hash over (title, company).
///
/// Both inputs are lower-cased and trimmed, joined with `|`, hashed with
/// SHA-256, and truncated to [`CONTENT_HASH_CHARS`] hex characters. Stable
/// across process restarts.
#[must_use]
pub fn content_hash(title: &str, company: &str) -> String {
    let content = format!(
        "{}|{}",
        title.trim().to_lowercase(),
        company.trim().to_lowercase()
    );
    let digest = format!("{:x}", Sha256::digest(content.as_bytes()));
    digest[..CONTENT_HASH_CHARS].to_string()
}

/// Insert `metadata.content_hash` if the signal does not already carry one.
pub fn ensure_content_hash(signal: &mut Signal) {
    if !signal.metadata.contains_key("content_hash") {
        let hash = content_hash(&signal.title, &signal.company_name);
        signal
            .metadata
            .insert("content_hash".to_string(), hash.into());
    }
}

/// Check whether a candidate signal duplicates a stored one.
///
/// Storage errors propagate; the caller decides the fail-open/fail-closed
/// policy (the orchestrator logs and allows the candidate through).
///
/// # Errors
///
/// Returns [`DbError`] if any backing-store query fails.
pub async fn is_duplicate<S: SignalStore + ?Sized>(
    store: &S,
    title: &str,
    company_name: &str,
    source_url: &str,
) -> Result<bool, DbError> {
    // Strategy 1: exact URL match.
    if store.exists_by_url(source_url).await? {
        tracing::debug!(strategy = "url", url = source_url, "duplicate found");
        return Ok(true);
    }

    // Strategy 2: content hash — same story republished under another URL.
    let hash = content_hash(title, company_name);
    if store.exists_by_content_hash(&hash).await? {
        tracing::debug!(strategy = "hash", hash = %hash, "duplicate found");
        return Ok(true);
    }

    // Strategy 3: same company, near-identical title start.
    let prefix: String = title.chars().take(TITLE_PREFIX_CHARS).collect();
    if store.exists_by_title_prefix(company_name, &prefix).await? {
        tracing::debug!(strategy = "prefix", company = company_name, "duplicate found");
        return Ok(true);
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;

    /// Fake store that answers each strategy from a fixed flag and counts
    /// how many times each strategy was consulted.
    #[derive(Default)]
    struct CountingStore {
        url_hit: bool,
        hash_hit: bool,
        prefix_hit: bool,
        url_calls: AtomicU32,
        hash_calls: AtomicU32,
        prefix_calls: AtomicU32,
    }

    #[async_trait]
    impl SignalStore for CountingStore {
        async fn exists_by_url(&self, _source_url: &str) -> Result<bool, DbError> {
            self.url_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.url_hit)
        }

        async fn exists_by_content_hash(&self, _hash: &str) -> Result<bool, DbError> {
            self.hash_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hash_hit)
        }

        async fn exists_by_title_prefix(
            &self,
            _company_name: &str,
            _prefix: &str,
        ) -> Result<bool, DbError> {
            self.prefix_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.prefix_hit)
        }

        async fn insert_signal(
            &self,
            _signal: &Signal,
            _user_id: Option<Uuid>,
        ) -> Result<Uuid, DbError> {
            Ok(Uuid::new_v4())
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let a = content_hash("Stripe raises $100M", "Stripe");
        let b = content_hash("Stripe raises $100M", "Stripe");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_is_case_and_whitespace_insensitive() {
        assert_eq!(
            content_hash("VP Sales", "Stripe"),
            content_hash("  vp sales  ", "STRIPE")
        );
    }

    #[test]
    fn hash_is_exactly_32_hex_chars() {
        let hash = content_hash("Some Title", "Some Company");
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_inputs_produce_distinct_hashes() {
        let pairs = [
            ("Stripe raises $100M", "Stripe"),
            ("Stripe raises $100M", "Shopify"),
            ("Shopify expands to EU", "Shopify"),
            ("Vercel launches v2", "Vercel"),
        ];
        let hashes: Vec<String> = pairs
            .iter()
            .map(|(t, c)| content_hash(t, c))
            .collect();
        for i in 0..hashes.len() {
            for j in (i + 1)..hashes.len() {
                assert_ne!(hashes[i], hashes[j], "pairs {i} and {j} collided");
            }
        }
    }

    #[test]
    fn ensure_content_hash_inserts_when_absent() {
        let mut signal = Signal::new(
            "Stripe",
            sigdex_core::SignalType::Funding,
            "Stripe raises $100M",
            "summary",
            "https://example.com/a",
            "TechCrunch",
        )
        .unwrap();
        ensure_content_hash(&mut signal);
        assert_eq!(
            signal.metadata["content_hash"].as_str().unwrap(),
            content_hash("Stripe raises $100M", "Stripe")
        );
    }

    #[test]
    fn ensure_content_hash_keeps_existing_value() {
        let mut signal = Signal::new(
            "Stripe",
            sigdex_core::SignalType::Funding,
            "Stripe raises $100M",
            "summary",
            "https://example.com/a",
            "TechCrunch",
        )
        .unwrap();
        signal
            .metadata
            .insert("content_hash".to_string(), "precomputed".into());
        ensure_content_hash(&mut signal);
        assert_eq!(signal.metadata["content_hash"], "precomputed");
    }

    #[tokio::test]
    async fn url_match_short_circuits_remaining_strategies() {
        let store = CountingStore {
            url_hit: true,
            ..CountingStore::default()
        };
        let dup = is_duplicate(&store, "title", "Stripe", "https://example.com/a")
            .await
            .unwrap();
        assert!(dup);
        assert_eq!(store.url_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.hash_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.prefix_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn hash_match_skips_prefix_strategy() {
        let store = CountingStore {
            hash_hit: true,
            ..CountingStore::default()
        };
        let dup = is_duplicate(&store, "title", "Stripe", "https://example.com/a")
            .await
            .unwrap();
        assert!(dup);
        assert_eq!(store.url_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.hash_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.prefix_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn prefix_match_is_last_resort() {
        let store = CountingStore {
            prefix_hit: true,
            ..CountingStore::default()
        };
        let dup = is_duplicate(&store, "title", "Stripe", "https://example.com/a")
            .await
            .unwrap();
        assert!(dup);
        assert_eq!(store.prefix_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_strategy_match_is_not_duplicate() {
        let store = CountingStore::default();
        let dup = is_duplicate(&store, "title", "Stripe", "https://example.com/a")
            .await
            .unwrap();
        assert!(!dup);
        assert_eq!(store.url_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.hash_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.prefix_calls.load(Ordering::SeqCst), 1);
    }
}
