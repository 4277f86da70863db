//! Target selector algebra.
//!
//! A `TargetSelector` maps the current action context to an ordered list
//! of candidate cards. Selectors are pure: they read state, never write it.
//!
//! - Base selectors: the ability owner, the event target, the event source,
//!   nothing, or a filtered pool of cards
//! - Combinators: union (`|`), difference (`-`), intersection (`&`), all
//!   preserving first-seen order and comparing cards by id
//!
//! A filtered pool asks for a player choice when it has more candidates
//! than requested and the requested count is strictly between zero and
//! the "select all" sentinel.
//!
//! ## Example
//!
//! ```
//! use ccg_rules::cards::CardDefinition;
//! use ccg_rules::core::{EngineConfig, GameState, PlayerId};
//! use ccg_rules::effects::{ActionContext, CardFilter, SelectionContext, TargetSelector};
//! use ccg_rules::zones::Zone;
//!
//! let mut state = GameState::new(2, 0);
//! let me = state.add_card(CardDefinition::character("Me", 1, 1, 1, 1), PlayerId::new(0), Zone::Play);
//! let foe = state.add_card(CardDefinition::character("Foe", 1, 1, 1, 1), PlayerId::new(1), Zone::Play);
//!
//! let ctx = ActionContext::for_ability(me, "TEST");
//! let sel = SelectionContext::new(&state, &ctx, EngineConfig::SELECT_ALL);
//!
//! let enemies = TargetSelector::all_characters(CardFilter::Enemy);
//! assert_eq!(enemies.select(&sel), vec![foe]);
//!
//! let everyone_but_me = TargetSelector::all_characters(CardFilter::Any) - TargetSelector::SelfCard;
//! assert_eq!(everyone_but_me.select(&sel), vec![foe]);
//! ```

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::context::ActionContext;
use crate::cards::{CardInstance, CardKind, Keyword};
use crate::core::{EntityId, GameState, PlayerId};
use crate::zones::Zone;

/// What a selector reads from.
pub struct SelectionContext<'a> {
    pub state: &'a GameState,
    pub context: &'a ActionContext,
    /// Count meaning "every candidate".
    pub select_all: usize,
}

impl<'a> SelectionContext<'a> {
    pub fn new(state: &'a GameState, context: &'a ActionContext, select_all: usize) -> Self {
        Self {
            state,
            context,
            select_all,
        }
    }

    /// The player whose perspective "friendly" and "enemy" use.
    #[must_use]
    pub fn acting_player(&self) -> Option<PlayerId> {
        self.context.acting_player(self.state)
    }
}

/// Signature for ad-hoc card predicates.
pub type FilterFn = Rc<dyn Fn(&CardInstance, &SelectionContext<'_>) -> bool>;

/// A named ad-hoc predicate.
#[derive(Clone)]
pub struct CustomFilter {
    pub name: String,
    pub predicate: FilterFn,
}

impl fmt::Debug for CustomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomFilter({})", self.name)
    }
}

/// Predicate over a candidate card.
#[derive(Clone, Debug)]
pub enum CardFilter {
    Any,

    // === Control ===
    /// Controlled by the acting player.
    Friendly,
    /// Controlled by someone other than the acting player.
    Enemy,
    /// Not the ability owner.
    NotSelf,

    // === State ===
    Ready,
    Exerted,
    Damaged,
    Undamaged,

    // === Printed Data ===
    CostAtMost(i64),
    CostAtLeast(i64),
    Subtype(String),
    /// Name contains this text.
    Named(String),
    Kind(CardKind),
    HasKeyword(Keyword),
    /// Printed or granted Bodyguard.
    Bodyguard,

    // === Composition ===
    All(Vec<CardFilter>),
    AnyOf(Vec<CardFilter>),
    Not(Box<CardFilter>),

    Custom(CustomFilter),
}

impl CardFilter {
    /// Cost between `min` and `max`, inclusive.
    #[must_use]
    pub fn cost_between(min: i64, max: i64) -> Self {
        CardFilter::All(vec![CardFilter::CostAtLeast(min), CardFilter::CostAtMost(max)])
    }

    /// Wrap a closure.
    pub fn custom(
        name: impl Into<String>,
        predicate: impl Fn(&CardInstance, &SelectionContext<'_>) -> bool + 'static,
    ) -> Self {
        CardFilter::Custom(CustomFilter {
            name: name.into(),
            predicate: Rc::new(predicate),
        })
    }

    /// Both filters must hold.
    #[must_use]
    pub fn and(self, other: CardFilter) -> Self {
        match self {
            CardFilter::All(mut filters) => {
                filters.push(other);
                CardFilter::All(filters)
            }
            first => CardFilter::All(vec![first, other]),
        }
    }

    /// Either filter may hold.
    #[must_use]
    pub fn or(self, other: CardFilter) -> Self {
        CardFilter::AnyOf(vec![self, other])
    }

    /// Negate this filter.
    #[must_use]
    pub fn negate(self) -> Self {
        CardFilter::Not(Box::new(self))
    }

    /// Does `card` pass this filter?
    pub fn matches(&self, card: &CardInstance, sel: &SelectionContext<'_>) -> bool {
        match self {
            CardFilter::Any => true,
            CardFilter::Friendly => sel.acting_player() == Some(card.controller),
            CardFilter::Enemy => sel.acting_player().is_some_and(|p| p != card.controller),
            CardFilter::NotSelf => sel.context.ability_owner() != Some(card.entity_id),
            CardFilter::Ready => !card.exerted,
            CardFilter::Exerted => card.exerted,
            CardFilter::Damaged => card.is_damaged(),
            CardFilter::Undamaged => !card.is_damaged(),
            CardFilter::CostAtMost(max) => card.definition.cost <= *max,
            CardFilter::CostAtLeast(min) => card.definition.cost >= *min,
            CardFilter::Subtype(subtype) => card.definition.has_subtype(subtype),
            CardFilter::Named(name) => card.definition.name.contains(name.as_str()),
            CardFilter::Kind(kind) => card.definition.kind == *kind,
            CardFilter::HasKeyword(keyword) => card.definition.has_keyword(*keyword),
            CardFilter::Bodyguard => {
                card.definition.has_keyword(Keyword::Bodyguard) || card.has_flag("bodyguard")
            }
            CardFilter::All(filters) => filters.iter().all(|f| f.matches(card, sel)),
            CardFilter::AnyOf(filters) => filters.iter().any(|f| f.matches(card, sel)),
            CardFilter::Not(inner) => !inner.matches(card, sel),
            CardFilter::Custom(custom) => (custom.predicate)(card, sel),
        }
    }
}

/// Whose zone a card pool is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Whose {
    /// The acting player's.
    Own,
    /// Every opponent's.
    Opponents,
    /// Every player's.
    Anyone,
}

/// Selects target cards from the action context.
#[derive(Clone, Debug)]
pub enum TargetSelector {
    // === Base ===
    /// The ability owner, falling back to the event source.
    SelfCard,
    EventTarget,
    EventSource,
    NoTarget,

    /// Characters in play passing `filter`, across all players.
    Characters { filter: CardFilter, count: usize },

    /// Cards in a zone passing `filter`.
    CardsInZone {
        zone: Zone,
        whose: Whose,
        filter: CardFilter,
        count: usize,
    },

    // === Combinators ===
    Union(Vec<TargetSelector>),
    Difference(Box<TargetSelector>, Box<TargetSelector>),
    Intersection(Box<TargetSelector>, Box<TargetSelector>),
}

impl TargetSelector {
    /// One character passing `filter`.
    #[must_use]
    pub fn character(filter: CardFilter) -> Self {
        TargetSelector::Characters { filter, count: 1 }
    }

    /// Every character passing `filter`.
    #[must_use]
    pub fn all_characters(filter: CardFilter) -> Self {
        TargetSelector::Characters {
            filter,
            count: crate::core::EngineConfig::SELECT_ALL,
        }
    }

    /// Up to `count` characters passing `filter`.
    #[must_use]
    pub fn characters(filter: CardFilter, count: usize) -> Self {
        TargetSelector::Characters { filter, count }
    }

    /// One card from a zone.
    #[must_use]
    pub fn card_in(zone: Zone, whose: Whose, filter: CardFilter) -> Self {
        TargetSelector::CardsInZone {
            zone,
            whose,
            filter,
            count: 1,
        }
    }

    #[must_use]
    pub fn friendly_character() -> Self {
        Self::character(CardFilter::Friendly)
    }

    #[must_use]
    pub fn enemy_character() -> Self {
        Self::character(CardFilter::Enemy)
    }

    #[must_use]
    pub fn damaged_character() -> Self {
        Self::character(CardFilter::Damaged)
    }

    #[must_use]
    pub fn all_friendly_characters() -> Self {
        Self::all_characters(CardFilter::Friendly)
    }

    #[must_use]
    pub fn all_enemy_characters() -> Self {
        Self::all_characters(CardFilter::Enemy)
    }

    #[must_use]
    pub fn other_friendly_characters() -> Self {
        Self::all_characters(CardFilter::Friendly.and(CardFilter::NotSelf))
    }

    /// Every candidate before truncation to the requested count.
    pub fn candidates(&self, sel: &SelectionContext<'_>) -> Vec<EntityId> {
        match self {
            TargetSelector::SelfCard => sel.context.ability_owner().into_iter().collect(),
            TargetSelector::EventTarget => event_field(sel, |e| e.target),
            TargetSelector::EventSource => event_field(sel, |e| e.source),
            TargetSelector::NoTarget => Vec::new(),
            TargetSelector::Characters { filter, .. } => sel
                .state
                .all_characters_in_play()
                .into_iter()
                .filter(|id| passes(*id, filter, sel))
                .collect(),
            TargetSelector::CardsInZone {
                zone, whose, filter, ..
            } => zone_players(*whose, sel)
                .into_iter()
                .flat_map(|p| sel.state.zones.cards_in(p, *zone))
                .filter(|id| passes(*id, filter, sel))
                .collect(),
            TargetSelector::Union(selectors) => dedup(selectors.iter().flat_map(|s| s.candidates(sel))),
            TargetSelector::Difference(left, right) => {
                let removed: FxHashSet<EntityId> = right.candidates(sel).into_iter().collect();
                dedup(left.candidates(sel).into_iter().filter(|id| !removed.contains(id)))
            }
            TargetSelector::Intersection(left, right) => {
                let kept: FxHashSet<EntityId> = right.candidates(sel).into_iter().collect();
                dedup(left.candidates(sel).into_iter().filter(|id| kept.contains(id)))
            }
        }
    }

    /// Resolve to an ordered target list without asking anyone.
    ///
    /// Pools are truncated to their requested count unless the count is
    /// the "select all" sentinel. A union keeps what each member selects;
    /// a difference or intersection is truncated to its left side's count.
    pub fn select(&self, sel: &SelectionContext<'_>) -> Vec<EntityId> {
        if let TargetSelector::Union(selectors) = self {
            return dedup(selectors.iter().flat_map(|s| s.select(sel)));
        }
        let mut picked = self.candidates(sel);
        if let Some(count) = self.requested_count() {
            if count < sel.select_all {
                picked.truncate(count);
            }
        }
        picked
    }

    /// Does resolving this selector need a player decision?
    ///
    /// Bounded selectors ask when their combined pool holds more cards
    /// than they resolve to.
    pub fn requires_choice(&self, sel: &SelectionContext<'_>) -> bool {
        if let TargetSelector::Union(selectors) = self {
            return selectors.iter().any(|s| s.requires_choice(sel));
        }
        match self.requested_count() {
            Some(count) => count > 0 && count < sel.select_all && self.candidates(sel).len() > count,
            None => false,
        }
    }

    /// How many cards this selector resolves to, when bounded.
    ///
    /// A difference or intersection takes its left side's count.
    #[must_use]
    pub fn requested_count(&self) -> Option<usize> {
        match self {
            TargetSelector::Characters { count, .. } | TargetSelector::CardsInZone { count, .. } => Some(*count),
            TargetSelector::Difference(left, _) | TargetSelector::Intersection(left, _) => left.requested_count(),
            _ => None,
        }
    }
}

fn passes(id: EntityId, filter: &CardFilter, sel: &SelectionContext<'_>) -> bool {
    sel.state.get_card(id).is_some_and(|card| filter.matches(card, sel))
}

fn event_field(
    sel: &SelectionContext<'_>,
    field: impl Fn(&crate::events::EventContext) -> Option<EntityId>,
) -> Vec<EntityId> {
    sel.context.event.as_ref().and_then(field).into_iter().collect()
}

fn zone_players(whose: Whose, sel: &SelectionContext<'_>) -> Vec<PlayerId> {
    let acting = sel.acting_player();
    sel.state
        .player_ids()
        .filter(|p| match whose {
            Whose::Own => Some(*p) == acting,
            Whose::Opponents => acting.is_some_and(|a| a != *p),
            Whose::Anyone => true,
        })
        .collect()
}

fn dedup(ids: impl Iterator<Item = EntityId>) -> Vec<EntityId> {
    let mut seen = FxHashSet::default();
    ids.filter(|id| seen.insert(*id)).collect()
}

impl std::ops::BitOr for TargetSelector {
    type Output = TargetSelector;

    fn bitor(self, rhs: TargetSelector) -> TargetSelector {
        match self {
            TargetSelector::Union(mut selectors) => {
                selectors.push(rhs);
                TargetSelector::Union(selectors)
            }
            lhs => TargetSelector::Union(vec![lhs, rhs]),
        }
    }
}

impl std::ops::Sub for TargetSelector {
    type Output = TargetSelector;

    fn sub(self, rhs: TargetSelector) -> TargetSelector {
        TargetSelector::Difference(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::BitAnd for TargetSelector {
    type Output = TargetSelector;

    fn bitand(self, rhs: TargetSelector) -> TargetSelector {
        TargetSelector::Intersection(Box::new(self), Box::new(rhs))
    }
}

impl fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSelector::SelfCard => f.write_str("self"),
            TargetSelector::EventTarget => f.write_str("event target"),
            TargetSelector::EventSource => f.write_str("event source"),
            TargetSelector::NoTarget => f.write_str("no target"),
            TargetSelector::Characters { count, .. } if *count >= crate::core::EngineConfig::SELECT_ALL => {
                f.write_str("all matching characters")
            }
            TargetSelector::Characters { count, .. } => write!(f, "{count} character(s)"),
            TargetSelector::CardsInZone { zone, count, .. } => write!(f, "{count} card(s) in {zone}"),
            TargetSelector::Union(selectors) => {
                let parts: Vec<String> = selectors.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(" | "))
            }
            TargetSelector::Difference(l, r) => write!(f, "({l} - {r})"),
            TargetSelector::Intersection(l, r) => write!(f, "({l} & {r})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardDefinition;
    use crate::core::EngineConfig;
    use crate::events::{EventContext, EventKind};

    struct Board {
        state: GameState,
        mine: Vec<EntityId>,
        theirs: Vec<EntityId>,
    }

    fn board() -> Board {
        let mut state = GameState::new(2, 0);
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        let mine = vec![
            state.add_card(CardDefinition::character("Hero", 2, 2, 3, 1).with_subtype("Hero"), p0, Zone::Play),
            state.add_card(CardDefinition::character("Sidekick", 5, 1, 1, 1), p0, Zone::Play),
        ];
        let theirs = vec![
            state.add_card(CardDefinition::character("Villain", 4, 3, 3, 1), p1, Zone::Play),
            state.add_card(
                CardDefinition::character("Guard", 3, 1, 4, 0).with_keyword(Keyword::Bodyguard),
                p1,
                Zone::Play,
            ),
        ];
        Board { state, mine, theirs }
    }

    fn select(board: &Board, ctx: &ActionContext, selector: &TargetSelector) -> Vec<EntityId> {
        selector.select(&SelectionContext::new(&board.state, ctx, EngineConfig::SELECT_ALL))
    }

    #[test]
    fn test_self_and_event_selectors() {
        let b = board();
        let event = EventContext::new(EventKind::CharacterChallenges)
            .with_source(b.theirs[0])
            .with_target(b.mine[1]);
        let ctx = ActionContext::for_ability(b.mine[0], "T").with_event(event);

        assert_eq!(select(&b, &ctx, &TargetSelector::SelfCard), vec![b.mine[0]]);
        assert_eq!(select(&b, &ctx, &TargetSelector::EventTarget), vec![b.mine[1]]);
        assert_eq!(select(&b, &ctx, &TargetSelector::EventSource), vec![b.theirs[0]]);
        assert!(select(&b, &ctx, &TargetSelector::NoTarget).is_empty());
    }

    #[test]
    fn test_self_falls_back_to_event_source() {
        let b = board();
        let event = EventContext::new(EventKind::CharacterQuests).with_source(b.theirs[1]);
        let ctx = ActionContext::default().with_event(event);

        assert_eq!(select(&b, &ctx, &TargetSelector::SelfCard), vec![b.theirs[1]]);
    }

    #[test]
    fn test_filters() {
        let mut b = board();
        b.state.exert(b.theirs[0]).unwrap();
        b.state.damage(b.mine[1], 1).unwrap();
        let ctx = ActionContext::for_ability(b.mine[0], "T");

        assert_eq!(select(&b, &ctx, &TargetSelector::all_friendly_characters()), b.mine);
        assert_eq!(select(&b, &ctx, &TargetSelector::all_enemy_characters()), b.theirs);
        assert_eq!(select(&b, &ctx, &TargetSelector::all_characters(CardFilter::Exerted)), vec![b.theirs[0]]);
        assert_eq!(select(&b, &ctx, &TargetSelector::all_characters(CardFilter::Damaged)), vec![b.mine[1]]);
        assert_eq!(select(&b, &ctx, &TargetSelector::all_characters(CardFilter::Bodyguard)), vec![b.theirs[1]]);
        assert_eq!(
            select(&b, &ctx, &TargetSelector::all_characters(CardFilter::Subtype("Hero".into()))),
            vec![b.mine[0]]
        );
        assert_eq!(
            select(&b, &ctx, &TargetSelector::all_characters(CardFilter::cost_between(3, 4))),
            b.theirs
        );
        assert_eq!(select(&b, &ctx, &TargetSelector::other_friendly_characters()), vec![b.mine[1]]);
    }

    #[test]
    fn test_count_truncates_and_requires_choice() {
        let b = board();
        let ctx = ActionContext::for_ability(b.mine[0], "T");
        let sel = SelectionContext::new(&b.state, &ctx, EngineConfig::SELECT_ALL);

        let one_enemy = TargetSelector::enemy_character();
        assert_eq!(one_enemy.select(&sel), vec![b.theirs[0]]);
        assert!(one_enemy.requires_choice(&sel));

        let two_enemies = TargetSelector::characters(CardFilter::Enemy, 2);
        assert!(!two_enemies.requires_choice(&sel));

        let all = TargetSelector::all_enemy_characters();
        assert!(!all.requires_choice(&sel));

        let zero = TargetSelector::characters(CardFilter::Any, 0);
        assert!(!zero.requires_choice(&sel));
        assert!(zero.select(&sel).is_empty());
    }

    #[test]
    fn test_combinators_dedupe_in_first_seen_order() {
        let b = board();
        let ctx = ActionContext::for_ability(b.mine[0], "T");

        let union = TargetSelector::all_enemy_characters()
            | TargetSelector::SelfCard
            | TargetSelector::all_characters(CardFilter::Bodyguard);
        assert_eq!(select(&b, &ctx, &union), vec![b.theirs[0], b.theirs[1], b.mine[0]]);

        let difference = TargetSelector::all_characters(CardFilter::Any) - TargetSelector::all_enemy_characters();
        assert_eq!(select(&b, &ctx, &difference), b.mine);

        let intersection =
            TargetSelector::all_enemy_characters() & TargetSelector::all_characters(CardFilter::CostAtMost(3));
        assert_eq!(select(&b, &ctx, &intersection), vec![b.theirs[1]]);
    }

    #[test]
    fn test_difference_draws_from_the_whole_pool() {
        let b = board();
        let ctx = ActionContext::for_ability(b.mine[0], "T");
        let sel = SelectionContext::new(&b.state, &ctx, EngineConfig::SELECT_ALL);

        // The owner is first in the pool; removing it must not empty the pick.
        let another = TargetSelector::character(CardFilter::Any) - TargetSelector::SelfCard;
        assert_eq!(another.candidates(&sel), vec![b.mine[1], b.theirs[0], b.theirs[1]]);
        assert_eq!(another.select(&sel), vec![b.mine[1]]);
        assert!(another.requires_choice(&sel));

        let another_friend = TargetSelector::character(CardFilter::Friendly) - TargetSelector::SelfCard;
        assert_eq!(another_friend.select(&sel), vec![b.mine[1]]);
        assert!(!another_friend.requires_choice(&sel));

        let cheap_enemy =
            TargetSelector::enemy_character() & TargetSelector::all_characters(CardFilter::CostAtMost(3));
        assert_eq!(cheap_enemy.select(&sel), vec![b.theirs[1]]);
        assert!(!cheap_enemy.requires_choice(&sel));
    }

    #[test]
    fn test_cards_in_zone() {
        let mut b = board();
        let p0 = PlayerId::new(0);
        let held = b.state.add_card(CardDefinition::character("Held", 1, 1, 1, 1), p0, Zone::Hand);
        b.state.add_card(CardDefinition::character("Other", 1, 1, 1, 1), PlayerId::new(1), Zone::Hand);
        let ctx = ActionContext::for_ability(b.mine[0], "T");

        let own_hand = TargetSelector::CardsInZone {
            zone: Zone::Hand,
            whose: Whose::Own,
            filter: CardFilter::Any,
            count: EngineConfig::SELECT_ALL,
        };
        assert_eq!(select(&b, &ctx, &own_hand), vec![held]);
    }

    #[test]
    fn test_custom_filter() {
        let b = board();
        let ctx = ActionContext::for_ability(b.mine[0], "T");
        let strong = CardFilter::custom("strength >= 3", |card, _| card.strength() >= 3);

        assert_eq!(select(&b, &ctx, &TargetSelector::all_characters(strong)), vec![b.theirs[0]]);
    }
}
