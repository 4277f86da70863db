//! Cost modifiers.
//!
//! Modifiers adjust the ink cost of cards that match their filter while
//! their source's condition holds. They are grouped by source so a card
//! entering or leaving play can switch all of its modifiers at once.
//!
//! ## Folding
//!
//! Applicable modifiers are sorted by descending priority (ties keep
//! registration order) and folded left to right:
//!
//! - `FreePlay` returns 0 immediately
//! - `AlternativeCost` returns its fixed cost immediately
//! - `Reduction` / `Increase` apply every time when they stack, otherwise
//!   only the first of each polarity applies
//!
//! The result never drops below 0.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cards::{CardInstance, CardKind};
use crate::core::{EntityId, GameState};
use crate::error::Result;
use crate::zones::Zone;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostModifierKind {
    Reduction,
    Increase,
    FreePlay,
    AlternativeCost,
}

impl CostModifierKind {
    pub const ALL: [CostModifierKind; 4] = [
        CostModifierKind::Reduction,
        CostModifierKind::Increase,
        CostModifierKind::FreePlay,
        CostModifierKind::AlternativeCost,
    ];
}

pub type CostFilterFn = Rc<dyn Fn(&CardInstance, &GameState) -> bool>;

/// Which cards a modifier applies to.
#[derive(Clone)]
pub enum CostFilter {
    Any,
    /// Has at least one of these subtypes.
    Subtype(Vec<String>),
    /// Sits in some player's hand.
    HandOnly,
    Kind(CardKind),
    All(Vec<CostFilter>),
    Custom(CostFilterFn),
}

impl CostFilter {
    pub fn subtypes<S: Into<String>>(subtypes: impl IntoIterator<Item = S>) -> Self {
        CostFilter::Subtype(subtypes.into_iter().map(Into::into).collect())
    }

    pub fn custom(f: impl Fn(&CardInstance, &GameState) -> bool + 'static) -> Self {
        CostFilter::Custom(Rc::new(f))
    }

    #[must_use]
    pub fn and(self, other: CostFilter) -> Self {
        match self {
            CostFilter::All(mut filters) => {
                filters.push(other);
                CostFilter::All(filters)
            }
            first => CostFilter::All(vec![first, other]),
        }
    }

    #[must_use]
    pub fn matches(&self, card: &CardInstance, state: &GameState) -> bool {
        match self {
            CostFilter::Any => true,
            CostFilter::Subtype(subtypes) => subtypes.iter().any(|s| card.definition.has_subtype(s)),
            CostFilter::HandOnly => state.zone_of(card.entity_id) == Some(Zone::Hand),
            CostFilter::Kind(kind) => card.definition.kind == *kind,
            CostFilter::All(filters) => filters.iter().all(|f| f.matches(card, state)),
            CostFilter::Custom(f) => f(card, state),
        }
    }
}

impl fmt::Debug for CostFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostFilter::Any => f.write_str("Any"),
            CostFilter::Subtype(s) => f.debug_tuple("Subtype").field(s).finish(),
            CostFilter::HandOnly => f.write_str("HandOnly"),
            CostFilter::Kind(k) => f.debug_tuple("Kind").field(k).finish(),
            CostFilter::All(filters) => f.debug_tuple("All").field(filters).finish(),
            CostFilter::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Source-side condition, e.g. "while this character is exerted".
pub type CostCondition = Rc<dyn Fn(&GameState, EntityId) -> Result<bool>>;

#[derive(Clone)]
pub struct CostModifier {
    pub id: String,
    pub source: EntityId,
    pub kind: CostModifierKind,
    /// Reduction or increase amount.
    pub amount: i64,
    /// Fixed cost for `AlternativeCost`.
    pub alternative_cost: Option<i64>,
    pub filter: CostFilter,
    condition: Option<CostCondition>,
    /// Higher applies first.
    pub priority: i32,
    pub stacks_with_others: bool,
    active: bool,
}

impl CostModifier {
    /// An inactive modifier that applies to every card.
    pub fn new(id: impl Into<String>, source: EntityId, kind: CostModifierKind, amount: i64) -> Self {
        Self {
            id: id.into(),
            source,
            kind,
            amount,
            alternative_cost: None,
            filter: CostFilter::Any,
            condition: None,
            priority: 0,
            stacks_with_others: true,
            active: false,
        }
    }

    pub fn reduction(id: impl Into<String>, source: EntityId, amount: i64, filter: CostFilter) -> Self {
        Self::new(id, source, CostModifierKind::Reduction, amount).with_filter(filter)
    }

    pub fn free_play(id: impl Into<String>, source: EntityId, filter: CostFilter) -> Self {
        Self::new(id, source, CostModifierKind::FreePlay, 0).with_filter(filter)
    }

    pub fn alternative(id: impl Into<String>, source: EntityId, cost: i64, filter: CostFilter) -> Self {
        let mut modifier = Self::new(id, source, CostModifierKind::AlternativeCost, 0).with_filter(filter);
        modifier.alternative_cost = Some(cost);
        modifier
    }

    #[must_use]
    pub fn with_filter(mut self, filter: CostFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: impl Fn(&GameState, EntityId) -> Result<bool> + 'static) -> Self {
        self.condition = Some(Rc::new(condition));
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Apply only the first modifier of this polarity.
    #[must_use]
    pub fn exclusive(mut self) -> Self {
        self.stacks_with_others = false;
        self
    }

    /// Start active (builder pattern).
    #[must_use]
    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Active, condition met, and the card passes the filter.
    #[must_use]
    pub fn is_applicable_to(&self, card: &CardInstance, state: &GameState) -> bool {
        if !self.active {
            return false;
        }
        let condition_met = self.condition.as_ref().map_or(true, |condition| {
            condition(state, self.source).unwrap_or_else(|err| {
                tracing::warn!(modifier = %self.id, %err, "cost modifier condition failed");
                false
            })
        });
        condition_met && self.filter.matches(card, state)
    }
}

impl fmt::Debug for CostModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CostModifier")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("kind", &self.kind)
            .field("amount", &self.amount)
            .field("alternative_cost", &self.alternative_cost)
            .field("filter", &self.filter)
            .field("priority", &self.priority)
            .field("stacks_with_others", &self.stacks_with_others)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Counts for debugging.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostModifierDebugInfo {
    pub total_modifiers: usize,
    pub active_modifiers: usize,
    pub by_kind: Vec<(CostModifierKind, usize)>,
    pub sources_with_modifiers: usize,
}

/// Every registered cost modifier.
#[derive(Debug, Default)]
pub struct CostModifierManager {
    modifiers: FxHashMap<String, CostModifier>,
    /// Registration order.
    order: Vec<String>,
    by_source: FxHashMap<EntityId, Vec<String>>,
}

impl CostModifierManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a modifier. Returns `false` if its id is taken.
    pub fn register(&mut self, modifier: CostModifier) -> bool {
        if self.modifiers.contains_key(&modifier.id) {
            return false;
        }
        self.order.push(modifier.id.clone());
        self.by_source
            .entry(modifier.source)
            .or_default()
            .push(modifier.id.clone());
        self.modifiers.insert(modifier.id.clone(), modifier);
        true
    }

    pub fn unregister(&mut self, id: &str) -> Option<CostModifier> {
        let modifier = self.modifiers.remove(id)?;
        self.order.retain(|m| m != id);
        if let Some(ids) = self.by_source.get_mut(&modifier.source) {
            ids.retain(|m| m != id);
            if ids.is_empty() {
                self.by_source.remove(&modifier.source);
            }
        }
        Some(modifier)
    }

    /// Applicable modifiers in fold order.
    #[must_use]
    pub fn get_applicable_modifiers(&self, card: &CardInstance, state: &GameState) -> Vec<&CostModifier> {
        let mut applicable: Vec<&CostModifier> = self
            .order
            .iter()
            .filter_map(|id| self.modifiers.get(id))
            .filter(|m| m.is_applicable_to(card, state))
            .collect();
        applicable.sort_by_key(|m| std::cmp::Reverse(m.priority));
        applicable
    }

    /// The card's cost after every applicable modifier, never below 0.
    #[must_use]
    pub fn get_modified_cost(&self, card: &CardInstance, state: &GameState) -> i64 {
        let mut cost = card.definition.cost;
        let mut reductions = 0;
        let mut increases = 0;

        for modifier in self.get_applicable_modifiers(card, state) {
            match modifier.kind {
                CostModifierKind::FreePlay => return 0,
                CostModifierKind::AlternativeCost => {
                    if let Some(fixed) = modifier.alternative_cost {
                        return fixed.max(0);
                    }
                }
                CostModifierKind::Reduction => {
                    if modifier.stacks_with_others || reductions == 0 {
                        cost = (cost - modifier.amount).max(0);
                        reductions += 1;
                    }
                }
                CostModifierKind::Increase => {
                    if modifier.stacks_with_others || increases == 0 {
                        cost += modifier.amount;
                        increases += 1;
                    }
                }
            }
        }
        cost.max(0)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CostModifier> {
        self.modifiers.get(id)
    }

    #[must_use]
    pub fn get_modifiers_by_source(&self, source: EntityId) -> Vec<&CostModifier> {
        self.by_source
            .get(&source)
            .map(|ids| ids.iter().filter_map(|id| self.modifiers.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn activate_modifiers_by_source(&mut self, source: EntityId) -> usize {
        self.set_active_by_source(source, true)
    }

    pub fn deactivate_modifiers_by_source(&mut self, source: EntityId) -> usize {
        self.set_active_by_source(source, false)
    }

    fn set_active_by_source(&mut self, source: EntityId, active: bool) -> usize {
        let Some(ids) = self.by_source.get(&source) else {
            return 0;
        };
        let mut count = 0;
        for id in ids {
            if let Some(modifier) = self.modifiers.get_mut(id) {
                modifier.active = active;
                count += 1;
            }
        }
        count
    }

    pub fn clear_all(&mut self) {
        self.modifiers.clear();
        self.order.clear();
        self.by_source.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    #[must_use]
    pub fn debug_info(&self) -> CostModifierDebugInfo {
        let by_kind = CostModifierKind::ALL
            .iter()
            .map(|kind| (*kind, self.modifiers.values().filter(|m| m.kind == *kind).count()))
            .filter(|(_, count)| *count > 0)
            .collect();
        CostModifierDebugInfo {
            total_modifiers: self.modifiers.len(),
            active_modifiers: self.modifiers.values().filter(|m| m.active).count(),
            by_kind,
            sources_with_modifiers: self.by_source.len(),
        }
    }
}
