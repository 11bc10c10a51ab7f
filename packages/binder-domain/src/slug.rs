//! Slug derivation and collision-avoiding allocation.

use unicode_normalization::UnicodeNormalization;

/// Slug used when normalization leaves nothing printable behind.
pub const FALLBACK_SLUG: &str = "untitled";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
	#[error("No free slug for {base:?} within {attempts} candidates.")]
	Exhausted { base: String, attempts: u32 },
}

/// Derives a URL-safe slug from a display name.
///
/// The name is NFKD-folded so accented letters keep their base character,
/// ASCII alphanumerics are lowercased, and every other run of characters
/// collapses into a single `-`. A trailing separator is trimmed; a leading one
/// never forms. Names that normalize to nothing fall back to
/// [`FALLBACK_SLUG`].
pub fn slugify(name: &str) -> String {
	let mut slug = String::with_capacity(name.len());

	for ch in name.nfkd() {
		if ch.is_ascii_alphanumeric() {
			slug.push(ch.to_ascii_lowercase());
		} else if unicode_normalization::char::is_combining_mark(ch) {
			// Diacritics split off by the NFKD pass carry no slug content.
		} else if !slug.is_empty() && !slug.ends_with('-') {
			slug.push('-');
		}
	}

	let slug = slug.trim_end_matches('-');

	if slug.is_empty() { FALLBACK_SLUG.to_owned() } else { slug.to_owned() }
}

/// Picks the first free candidate among `base`, `base-1`, `base-2`, ...
///
/// `is_taken` answers whether a candidate is already in use within the target
/// scope. The caller decides what that scope is (owner for collections,
/// collection for notes) and must still hold a unique index on it, since a
/// concurrent writer can take a candidate between this check and the insert.
pub fn allocate<F>(name: &str, mut is_taken: F, max_attempts: u32) -> Result<String, SlugError>
where
	F: FnMut(&str) -> bool,
{
	let base = slugify(name);
	let mut candidate = base.clone();

	for n in 1..=max_attempts {
		if !is_taken(&candidate) {
			return Ok(candidate);
		}

		candidate = format!("{base}-{n}");
	}

	Err(SlugError::Exhausted { base, attempts: max_attempts })
}
