use crate::domain::ports::SessionStore;
use crate::error::AppError;
use tracing::debug;

pub const MAX_SLUG_SUFFIX: u32 = 100;

/// Lowercases, turns whitespace into hyphens and drops anything outside `[a-z0-9-]`.
pub fn base_slug(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// `base`, then `base-1` up to `base-100`.
pub fn slug_candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string())
        .chain((1..=MAX_SLUG_SUFFIX).map(move |n| format!("{}-{}", base, n)))
}

/// Picks the first free candidate. The unique index on `live_sessions.slug`
/// still has the final say if a concurrent insert takes it first.
pub async fn generate_unique_slug<S>(store: &mut S, title: &str) -> Result<String, AppError>
where
    S: SessionStore + ?Sized,
{
    let base = base_slug(title);
    if !base.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation("Title must contain at least one letter or digit".into()));
    }

    for candidate in slug_candidates(&base) {
        if !store.slug_exists(&candidate).await? {
            return Ok(candidate);
        }
        debug!("Slug {} taken, trying next suffix", candidate);
    }

    Err(AppError::Validation("slug generation exhausted".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_slug_normalizes_title() {
        assert_eq!(base_slug("Intro to Rust"), "intro-to-rust");
        assert_eq!(base_slug("Q&A: Week 3!"), "qa-week-3");
        assert_eq!(base_slug("Already-Hyphenated Title"), "already-hyphenated-title");
        assert_eq!(base_slug("Tabs\tand  spaces"), "tabs-and--spaces");
    }

    #[test]
    fn test_base_slug_is_deterministic() {
        assert_eq!(base_slug("Office Hours"), base_slug("Office Hours"));
    }

    #[test]
    fn test_candidates_are_bounded() {
        let all: Vec<String> = slug_candidates("office-hours").collect();
        assert_eq!(all.len(), 1 + MAX_SLUG_SUFFIX as usize);
        assert_eq!(all[0], "office-hours");
        assert_eq!(all[1], "office-hours-1");
        assert_eq!(all.last().unwrap(), "office-hours-100");
    }
}
