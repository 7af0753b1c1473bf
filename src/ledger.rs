// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Stock ledger - keeps spool mass in step with the print log
//!
//! Every committed print charges its weight to its spool. Editing a print
//! first refunds the weight recorded in the pre-edit snapshot to the spool
//! it was charged to, then charges the edited weight to the edited spool,
//! so only the change in consumption lands on an unchanged spool.
//!
//! Deleting a print never refunds anything. The user may already have
//! corrected the spool by hand, and an automatic refund would then count
//! the mass twice. `Catalog::remove_print` is therefore the whole of a
//! delete and this module is not involved.
//!
//! Balances are never clamped: a spool may go negative, and a draft that
//! would push a spool below zero is only flagged by [`StockPreview`].

use crate::catalog::Catalog;
use crate::error::SpoolError;
use crate::types::{Filament, FilamentId, Print};
use serde::Serialize;
use tracing::debug;

// =============================================================================
// Deltas
// =============================================================================

/// One adjustment of a spool balance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Delta {
    /// The spool was found and `amount` was subtracted from it
    Applied {
        /// Spool adjusted
        filament: FilamentId,
        /// Grams subtracted (negative for a refund)
        amount: f64,
        /// Balance before
        before: f64,
        /// Balance after
        after: f64,
    },
    /// No spool matched; nothing changed
    Skipped {
        /// Reference that did not resolve
        filament: Option<FilamentId>,
        /// Grams that would have been subtracted
        amount: f64,
    },
}

impl Delta {
    /// Whether a spool balance changed
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Subtract `amount` grams from the spool `filament`.
///
/// A negative amount is a refund. A reference that names no spool is
/// skipped silently; dangling references are normal.
pub fn apply_delta(filaments: &mut [Filament], filament: Option<&FilamentId>, amount: f64) -> Delta {
    let Some(spool) = filament.and_then(|id| filaments.iter_mut().find(|f| &f.id == id)) else {
        debug!("Skipping {}g for unknown spool {:?}", amount, filament);
        return Delta::Skipped {
            filament: filament.cloned(),
            amount,
        };
    };

    let before = spool.weight;
    spool.weight -= amount;
    debug!("Spool {}: {}g -> {}g", spool.id, before, spool.weight);

    Delta::Applied {
        filament: spool.id.clone(),
        amount,
        before,
        after: spool.weight,
    }
}

/// Charge a newly created print to its spool
pub fn post_create(filaments: &mut [Filament], print: &Print) -> Delta {
    apply_delta(filaments, print.filament_id.as_ref(), print.weight)
}

/// Re-charge an edited print.
///
/// Refund the snapshot first, then charge the draft. Without a snapshot
/// the draft is charged as if new.
pub fn post_edit(filaments: &mut [Filament], original: Option<&Print>, draft: &Print) -> Vec<Delta> {
    let mut deltas = Vec::with_capacity(2);
    if let Some(original) = original {
        deltas.push(apply_delta(
            filaments,
            original.filament_id.as_ref(),
            -original.weight,
        ));
    }
    deltas.push(apply_delta(filaments, draft.filament_id.as_ref(), draft.weight));
    deltas
}

// =============================================================================
// Preview
// =============================================================================

/// Projected spool balance if a draft were committed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockPreview {
    /// Spool the draft would charge
    pub filament: FilamentId,
    /// Current balance
    pub current: f64,
    /// Balance after commit
    pub projected: f64,
    /// Consumption change against the snapshot, when editing
    pub change: Option<f64>,
}

impl StockPreview {
    /// Whether the commit would leave the spool below zero
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.projected < 0.0
    }
}

/// Project the balance of the draft's spool without touching it.
///
/// The snapshot's weight is added back only when it was charged to the
/// same spool. `None` when the draft names no existing spool.
#[must_use]
pub fn preview_stock(filaments: &[Filament], draft: &Print, original: Option<&Print>) -> Option<StockPreview> {
    let id = draft.filament_id.as_ref()?;
    let spool = filaments.iter().find(|f| &f.id == id)?;

    let refund = original
        .filter(|o| o.filament_id.as_ref() == Some(id))
        .map_or(0.0, |o| o.weight);

    Some(StockPreview {
        filament: spool.id.clone(),
        current: spool.weight,
        projected: spool.weight + refund - draft.weight,
        change: original.map(|o| draft.weight - o.weight),
    })
}

// =============================================================================
// Drafts
// =============================================================================

/// Where a draft came from
#[derive(Debug, Clone, PartialEq)]
pub enum DraftMode {
    /// A print that does not exist yet
    New,
    /// An existing print, with the snapshot taken when editing began
    Edit {
        /// Pre-edit copy of the record
        original: Option<Print>,
    },
}

/// A print being created or edited.
///
/// Nothing is charged while a draft is open; dropping it has no effect.
/// [`commit`] is the only way a draft reaches the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintDraft {
    /// Candidate values. The id is ignored for new prints.
    pub print: Print,
    mode: DraftMode,
}

impl PrintDraft {
    /// Draft a new print
    #[must_use]
    pub fn new(print: Print) -> Self {
        Self {
            print,
            mode: DraftMode::New,
        }
    }

    /// Draft an edit of `existing`, keeping a snapshot of it
    #[must_use]
    pub fn edit(existing: &Print) -> Self {
        Self {
            print: existing.clone(),
            mode: DraftMode::Edit {
                original: Some(existing.clone()),
            },
        }
    }

    /// Draft an edit with no snapshot; the commit charges the draft only
    #[must_use]
    pub fn edit_without_snapshot(print: Print) -> Self {
        Self {
            print,
            mode: DraftMode::Edit { original: None },
        }
    }

    /// Whether this draft creates a print
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self.mode, DraftMode::New)
    }

    /// The pre-edit snapshot, if any
    #[must_use]
    pub fn original(&self) -> Option<&Print> {
        match &self.mode {
            DraftMode::Edit { original } => original.as_ref(),
            DraftMode::New => None,
        }
    }

    /// Put `tag` on the draft unless present. Returns whether it was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.print.has_tag(tag) {
            return false;
        }
        self.print.tags.push(tag.to_string());
        true
    }

    /// Flip `tag` on the draft. Returns whether the draft now carries it.
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        if self.print.has_tag(tag) {
            self.print.tags.retain(|t| t != tag);
            false
        } else {
            self.print.tags.push(tag.to_string());
            true
        }
    }

    /// Projected balance of the draft's spool
    #[must_use]
    pub fn preview(&self, filaments: &[Filament]) -> Option<StockPreview> {
        preview_stock(filaments, &self.print, self.original())
    }

    /// Check the draft can be saved
    pub fn validate(&self) -> Result<(), SpoolError> {
        if self.print.name.trim().is_empty() {
            return Err(SpoolError::MissingPrintName);
        }
        Ok(())
    }
}

/// A committed draft
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Committed {
    /// The print as stored
    pub print: Print,
    /// Whether the print was created (as opposed to edited)
    pub created: bool,
    /// Spool adjustments, in the order applied
    pub deltas: Vec<Delta>,
}

/// Commit a draft to the catalog and charge the ledger.
///
/// Validation and the existence check run before anything changes, so a
/// failed commit leaves the catalog untouched. New prints get an id at or
/// after `now_millis` and are placed first.
pub fn commit(catalog: &mut Catalog, draft: PrintDraft, now_millis: i64) -> Result<Committed, SpoolError> {
    draft.validate()?;

    let PrintDraft { mut print, mode } = draft;
    match mode {
        DraftMode::New => {
            print.id = catalog.next_print_id(now_millis);
            let delta = post_create(&mut catalog.filaments, &print);
            catalog.insert_print(print.clone());
            Ok(Committed {
                print,
                created: true,
                deltas: vec![delta],
            })
        }
        DraftMode::Edit { original } => {
            if catalog.print(print.id).is_none() {
                return Err(SpoolError::UnknownPrint(print.id));
            }
            let deltas = post_edit(&mut catalog.filaments, original.as_ref(), &print);
            catalog.replace_print(print.clone())?;
            Ok(Committed {
                print,
                created: false,
                deltas,
            })
        }
    }
}
