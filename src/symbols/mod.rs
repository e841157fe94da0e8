//! Symbol normalization across asset-naming conventions.
//!
//! The oracle program reports symbols in several raw shapes: a plain ticker,
//! a `BASE/QUOTE` pair, or `TICKER:SUFFIX` where the suffix names the venue
//! session (`USLF24` for the overnight funds feed, `BFX` for CFDs). Before
//! results can be merged with what the caller asked for, each raw symbol has
//! to be mapped back onto one of the requested asset ids.

use crate::types::AssetId;

/// What the raw symbol's shape tells us about the category it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CategoryHint {
    /// `TICKER:USLF24` — overnight funds feed; the raw form cannot say
    /// whether it was a quote or a trade query.
    Uslf(String),
    /// `TICKER:BFX` — CFD feed.
    Cfd(String),
    /// `BASE/QUOTE` pair.
    SlashPair { from: String, to: String },
    /// `prefix:rest` — the prefix is the category verbatim.
    Exact { category: String, base: String },
    /// Bare ticker, no category information at all.
    Bare(String),
}

fn classify(raw: &str) -> CategoryHint {
    if let Some(base) = raw.strip_suffix(":USLF24") {
        return CategoryHint::Uslf(base.to_string());
    }
    if let Some(base) = raw.strip_suffix(":BFX") {
        return CategoryHint::Cfd(base.to_string());
    }
    if raw.contains('/') {
        if let Some((from, to)) = raw.split_once('/') {
            return CategoryHint::SlashPair {
                from: from.to_string(),
                to: to.to_string(),
            };
        }
    }
    if let Some((category, base)) = raw.split_once(':') {
        if !category.is_empty() && !base.is_empty() {
            return CategoryHint::Exact {
                category: category.to_string(),
                base: base.to_string(),
            };
        }
    }
    CategoryHint::Bare(raw.to_string())
}

/// Maps raw result symbols back to requested asset ids.
///
/// The known set is scanned in the order the caller requested, so an
/// ambiguous raw symbol (a `USLF24` ticker that could be either the quote or
/// the trade category) resolves to whichever category was actually asked
/// for first.
#[derive(Debug, Clone)]
pub struct SymbolCodec {
    known: Vec<AssetId>,
}

impl SymbolCodec {
    pub fn new(known: Vec<AssetId>) -> Self {
        Self { known }
    }

    pub fn known(&self) -> &[AssetId] {
        &self.known
    }

    /// Resolve a raw result symbol to a requested asset id, or `None` when
    /// nothing in the known set corresponds to it.
    pub fn normalize(&self, raw: &str) -> Option<AssetId> {
        // Exact id match wins before any shape inference.
        if let Some(id) = self.known.iter().find(|id| id.to_string() == raw) {
            return Some(id.clone());
        }

        let hint = classify(raw);
        if let Some(id) = self.known.iter().find(|id| matches_hint(id, &hint)) {
            return Some(id.clone());
        }

        // Last resort: compare bases only, ignoring category entirely.
        let bare = match &hint {
            CategoryHint::Uslf(base)
            | CategoryHint::Cfd(base)
            | CategoryHint::Bare(base) => base.as_str(),
            CategoryHint::Exact { base, .. } => base.as_str(),
            CategoryHint::SlashPair { .. } => raw,
        };
        self.known.iter().find(|id| id.base() == bare).cloned()
    }
}

fn matches_hint(id: &AssetId, hint: &CategoryHint) -> bool {
    match hint {
        CategoryHint::Uslf(base) => id.category().starts_with("uslf_") && id.base() == base,
        CategoryHint::Cfd(base) => id.category() == "cfd" && id.base() == base,
        CategoryHint::SlashPair { from, to } => {
            if to == "USD" && id.category() == "fx" && id.base() == from {
                return true;
            }
            if from == "USD" && id.category() == "fx_r" && id.base() == to {
                return true;
            }
            // Commodity pairs keep both legs; the requested form joins them
            // with a colon where the feed uses a slash.
            id.category() == "cfd" && id.base().replace(':', "/") == format!("{}/{}", from, to)
        }
        CategoryHint::Exact { category, base } => id.category() == category && id.base() == base,
        CategoryHint::Bare(base) => id.base() == base,
    }
}
