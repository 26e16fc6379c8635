//! Resolving a user's reference to wines from the current context.
//!
//! Resolution order: positional grammar against the last shown list, then
//! free-text matching against the same list, then a catalog text search.
//! A tie is never guessed — several free-text matches come back as
//! [`Resolution::Ambiguous`] so the caller can show a numbered list and
//! wait for an ordinal.

use catalog::{Catalog, WineBrief};
use sqlgate::fold_case;

use crate::context::ContextEntry;
use crate::reference::{parse_position_reference, PositionReference};

/// Candidate lists longer than this are cut before being shown.
const MAX_CANDIDATES: u32 = 10;

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Exactly one wine.
    One(ContextEntry),
    /// A deliberate multi-selection ("1 и 3", "all of them").
    Several(Vec<ContextEntry>),
    /// More than one plausible match; the user must choose.
    Ambiguous(Vec<ContextEntry>),
    /// Nothing matched, or a position fell outside the list.
    None,
}

/// Resolves references against a context list, with catalog fallback.
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    catalog: Catalog,
}

impl ReferenceResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Resolve `reference` against the entries last shown to the user.
    ///
    /// Positional references never fall through to text matching: "5"
    /// against a three-wine list is `None`, not a search for "5".
    pub async fn resolve(
        &self,
        reference: &str,
        context: &[ContextEntry],
    ) -> catalog::Result<Resolution> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Ok(Resolution::None);
        }

        if let Some(positional) = parse_position_reference(reference) {
            return Ok(Self::resolve_positions(positional, context));
        }

        let mut matches = text_matches(reference, context);
        match matches.len() {
            1 => return Ok(Resolution::One(matches.remove(0))),
            0 => {}
            _ => return Ok(Resolution::Ambiguous(matches)),
        }

        let briefs = self.catalog.search_by_text(reference, MAX_CANDIDATES).await?;
        let mut candidates: Vec<ContextEntry> = briefs.iter().map(entry_from_brief).collect();
        Ok(match candidates.len() {
            0 => Resolution::None,
            1 => Resolution::One(candidates.remove(0)),
            _ => Resolution::Ambiguous(candidates),
        })
    }

    fn resolve_positions(positional: PositionReference, context: &[ContextEntry]) -> Resolution {
        if context.is_empty() {
            return Resolution::None;
        }
        let mut picked: Vec<ContextEntry> = match positional {
            PositionReference::All => context.to_vec(),
            PositionReference::Positions(positions) => {
                let mut picked = Vec::with_capacity(positions.len());
                for position in positions {
                    let index = position.checked_sub(1).map(|i| i as usize);
                    match index.and_then(|i| context.get(i)) {
                        Some(entry) => picked.push(entry.clone()),
                        None => return Resolution::None,
                    }
                }
                picked
            }
        };
        match picked.len() {
            0 => Resolution::None,
            1 => Resolution::One(picked.remove(0)),
            _ => Resolution::Several(picked),
        }
    }
}

/// Context entries whose folded label contains every folded token of the
/// reference.
fn text_matches(reference: &str, context: &[ContextEntry]) -> Vec<ContextEntry> {
    let tokens = catalog::search_tokens(reference);
    if tokens.is_empty() {
        return Vec::new();
    }
    context
        .iter()
        .filter(|entry| {
            let label = fold_case(&entry.label);
            tokens.iter().all(|token| label.contains(token.as_str()))
        })
        .cloned()
        .collect()
}

/// How catalog search hits become context entries: keyed by card key,
/// labelled for display.
pub fn entry_from_brief(brief: &WineBrief) -> ContextEntry {
    ContextEntry {
        wine_id: brief.card_key.clone(),
        label: brief.label(),
    }
}
