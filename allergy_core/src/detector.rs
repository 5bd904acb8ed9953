//! Allergen detection in label text.
//!
//! Matching is plain case-insensitive substring containment, restricted to
//! the allergens a user has registered.

use crate::AllergenCatalog;
use std::collections::BTreeSet;

/// Detect which of the user's allergens appear in `text`.
///
/// Allergens missing from the catalog are skipped. Scanning an allergen stops
/// at its first matching synonym.
pub fn detect<S: AsRef<str>>(
    text: &str,
    user_allergens: &[S],
    catalog: &AllergenCatalog,
) -> BTreeSet<String> {
    let mut detected = BTreeSet::new();
    if user_allergens.is_empty() {
        return detected;
    }

    let lowered = text.to_lowercase();

    for allergen in user_allergens.iter().map(AsRef::as_ref) {
        let Some(entry) = catalog.get(allergen) else {
            tracing::debug!("Allergen {:?} not in catalog, skipping", allergen);
            continue;
        };

        if let Some(synonym) = entry.first_match(&lowered) {
            tracing::debug!("Detected {:?} via synonym {:?}", allergen, synonym);
            detected.insert(entry.name.clone());
        }
    }

    detected
}
