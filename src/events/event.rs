//! Game event types.
//!
//! An `EventContext` is an immutable notification: it is created where a
//! mutation happens, dispatched once through the [`EventBus`](super::EventBus),
//! and then dropped. The only field listeners may touch is the `prevented`
//! veto flag, which stops the remaining listeners for that one event.
//!
//! ## Event Data
//!
//! - `kind`: what happened
//! - `source`: the card that caused it (if any)
//! - `target`: the card it happened to (if any)
//! - `player`: the player it concerns (if any)
//! - `data`: typed optional fields plus a free-form integer map

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{EntityId, Phase, PlayerId};
use crate::zones::Zone;

/// Every kind of event the rules core produces or reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    // === Character Actions ===
    CharacterQuests,
    CharacterChallenges,
    CharacterTakesDamage,
    CharacterDealsDamage,
    CharacterHealed,
    CharacterExerted,
    CharacterReadied,
    StatModified,

    // === Lifecycle ===
    CharacterPlayed,
    CharacterEntersPlay,
    CharacterLeavesPlay,
    CharacterBanished,
    CharacterBanishedInChallenge,

    // === Cards ===
    CardDrawn,
    CardDiscarded,
    CardReturnedToHand,
    ActionPlayed,
    SongPlayed,
    SongSung,
    ItemPlayed,
    InkPlayed,

    // === Resources ===
    LoreGained,

    // === Turn Structure ===
    TurnBegins,
    TurnEnds,
    PhaseChanges,

    // === Engine ===
    ChoiceMade,
    ConditionalEffectApplied,
    ConditionalEffectRemoved,
    EffectExpired,
}

impl EventKind {
    /// Stable snake_case name, used in step descriptions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::CharacterQuests => "character_quests",
            EventKind::CharacterChallenges => "character_challenges",
            EventKind::CharacterTakesDamage => "character_takes_damage",
            EventKind::CharacterDealsDamage => "character_deals_damage",
            EventKind::CharacterHealed => "character_healed",
            EventKind::CharacterExerted => "character_exerted",
            EventKind::CharacterReadied => "character_readied",
            EventKind::StatModified => "stat_modified",
            EventKind::CharacterPlayed => "character_played",
            EventKind::CharacterEntersPlay => "character_enters_play",
            EventKind::CharacterLeavesPlay => "character_leaves_play",
            EventKind::CharacterBanished => "character_banished",
            EventKind::CharacterBanishedInChallenge => "character_banished_in_challenge",
            EventKind::CardDrawn => "card_drawn",
            EventKind::CardDiscarded => "card_discarded",
            EventKind::CardReturnedToHand => "card_returned_to_hand",
            EventKind::ActionPlayed => "action_played",
            EventKind::SongPlayed => "song_played",
            EventKind::SongSung => "song_sung",
            EventKind::ItemPlayed => "item_played",
            EventKind::InkPlayed => "ink_played",
            EventKind::LoreGained => "lore_gained",
            EventKind::TurnBegins => "turn_begins",
            EventKind::TurnEnds => "turn_ends",
            EventKind::PhaseChanges => "phase_changes",
            EventKind::ChoiceMade => "choice_made",
            EventKind::ConditionalEffectApplied => "conditional_effect_applied",
            EventKind::ConditionalEffectRemoved => "conditional_effect_removed",
            EventKind::EffectExpired => "effect_expired",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed payload carried by an event.
///
/// Fields that only some events use are optional. Anything else goes in
/// `extra`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    /// Magnitude of the change (damage dealt, cards drawn, lore gained).
    pub amount: Option<i64>,

    /// Value after the change (damage on the card, lore total).
    pub total: Option<i64>,

    /// The card whose ability is handling this event. Set per ability.
    pub ability_owner: Option<EntityId>,

    pub ability_name: Option<String>,

    pub choice_id: Option<String>,

    /// Conditional-effect or duration record id.
    pub effect_id: Option<String>,

    pub from_zone: Option<Zone>,
    pub to_zone: Option<Zone>,
    pub phase: Option<Phase>,

    /// Logical timestamp for ordering engine events.
    pub timestamp: Option<u64>,

    /// Veto: remaining listeners skip this event.
    pub prevented: bool,

    /// The event's target was changed by a retargeting effect.
    pub retargeted: bool,

    #[serde(default)]
    pub extra: FxHashMap<String, i64>,
}

/// An event with its context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    pub kind: EventKind,
    pub source: Option<EntityId>,
    pub target: Option<EntityId>,
    pub player: Option<PlayerId>,
    pub data: EventData,
}

impl EventContext {
    /// Create an event with just a kind.
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            source: None,
            target: None,
            player: None,
            data: EventData::default(),
        }
    }

    /// Set the source entity (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the source entity if known (builder pattern).
    #[must_use]
    pub fn with_source_opt(mut self, source: Option<EntityId>) -> Self {
        self.source = source;
        self
    }

    /// Set the target entity (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the associated player (builder pattern).
    #[must_use]
    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    /// Set the associated player if known (builder pattern).
    #[must_use]
    pub fn with_player_opt(mut self, player: Option<PlayerId>) -> Self {
        self.player = player;
        self
    }

    /// Set the amount (builder pattern).
    #[must_use]
    pub fn with_amount(mut self, amount: i64) -> Self {
        self.data.amount = Some(amount);
        self
    }

    /// Set the resulting total (builder pattern).
    #[must_use]
    pub fn with_total(mut self, total: i64) -> Self {
        self.data.total = Some(total);
        self
    }

    /// Set the ability name (builder pattern).
    #[must_use]
    pub fn with_ability_name(mut self, name: impl Into<String>) -> Self {
        self.data.ability_name = Some(name.into());
        self
    }

    /// Record a zone change (builder pattern).
    #[must_use]
    pub fn with_zones(mut self, from: Zone, to: Zone) -> Self {
        self.data.from_zone = Some(from);
        self.data.to_zone = Some(to);
        self
    }

    /// Set the phase (builder pattern).
    #[must_use]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.data.phase = Some(phase);
        self
    }

    /// Add a free-form value (builder pattern).
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: i64) -> Self {
        self.data.extra.insert(key.into(), value);
        self
    }

    /// Mark the event as vetoed.
    pub fn prevent(&mut self) {
        self.data.prevented = true;
    }

    #[must_use]
    pub fn is_prevented(&self) -> bool {
        self.data.prevented
    }

    /// The card whose ability is handling the event, falling back to the
    /// event source.
    #[must_use]
    pub fn owner_or_source(&self) -> Option<EntityId> {
        self.data.ability_owner.or(self.source)
    }
}

/// Builders for common events.
impl EventContext {
    /// A character took damage.
    pub fn damage_taken(source: Option<EntityId>, target: EntityId, amount: i64, total: i64) -> Self {
        Self::new(EventKind::CharacterTakesDamage)
            .with_source_opt(source)
            .with_target(target)
            .with_amount(amount)
            .with_total(total)
    }

    /// A turn began for `player`.
    pub fn turn_begins(player: PlayerId, turn_number: u32) -> Self {
        Self::new(EventKind::TurnBegins)
            .with_player(player)
            .with_total(i64::from(turn_number))
    }

    /// A phase began.
    pub fn phase_changes(player: PlayerId, phase: Phase) -> Self {
        Self::new(EventKind::PhaseChanges)
            .with_player(player)
            .with_phase(phase)
    }
}
