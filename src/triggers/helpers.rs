//! Ready-made trigger conditions.
//!
//! Actor events (quests, challenges, deals damage, enters play) name the
//! acting card as their source. Events that happen *to* a card (takes
//! damage, banished, leaves play) name it as their target.

use super::condition::TriggerCondition;
use crate::core::{EntityId, PlayerId};
use crate::events::EventKind;

pub fn when_event(kind: EventKind) -> TriggerCondition {
    TriggerCondition::Event(kind)
}

fn by(kind: EventKind, card: EntityId) -> TriggerCondition {
    when_event(kind).and(TriggerCondition::SourceIs(card))
}

fn to(kind: EventKind, card: EntityId) -> TriggerCondition {
    when_event(kind).and(TriggerCondition::TargetIs(card))
}

fn for_player(kind: EventKind, player: Option<PlayerId>) -> TriggerCondition {
    match player {
        Some(player) => when_event(kind).and(TriggerCondition::ForPlayer(player)),
        None => when_event(kind),
    }
}

// === Character Actions ===

pub fn when_quests(card: EntityId) -> TriggerCondition {
    by(EventKind::CharacterQuests, card)
}

pub fn when_any_quests() -> TriggerCondition {
    when_event(EventKind::CharacterQuests)
}

pub fn when_challenges(card: EntityId) -> TriggerCondition {
    by(EventKind::CharacterChallenges, card)
}

/// `card` is the one being challenged.
pub fn when_challenged(card: EntityId) -> TriggerCondition {
    to(EventKind::CharacterChallenges, card)
}

// === Lifecycle ===

pub fn when_enters_play(card: EntityId) -> TriggerCondition {
    by(EventKind::CharacterEntersPlay, card)
}

pub fn when_any_enters_play() -> TriggerCondition {
    when_event(EventKind::CharacterEntersPlay)
}

/// A character with `subtype` enters play, optionally for one controller.
pub fn when_subtype_enters_play(subtype: impl Into<String>, controller: Option<PlayerId>) -> TriggerCondition {
    let condition = when_any_enters_play().and(TriggerCondition::SourceHasSubtype(subtype.into()));
    match controller {
        Some(player) => condition.and(TriggerCondition::SourceControlledBy(player)),
        None => condition,
    }
}

pub fn when_leaves_play(card: EntityId) -> TriggerCondition {
    to(EventKind::CharacterLeavesPlay, card)
}

/// `None` listens for any character being banished.
pub fn when_banished(card: Option<EntityId>) -> TriggerCondition {
    match card {
        Some(card) => to(EventKind::CharacterBanished, card),
        None => when_event(EventKind::CharacterBanished),
    }
}

pub fn when_banished_in_challenge(card: EntityId) -> TriggerCondition {
    to(EventKind::CharacterBanishedInChallenge, card)
}

// === Damage ===

pub fn when_takes_damage(card: EntityId) -> TriggerCondition {
    to(EventKind::CharacterTakesDamage, card)
}

pub fn when_any_takes_damage() -> TriggerCondition {
    when_event(EventKind::CharacterTakesDamage)
}

pub fn when_deals_damage(card: EntityId) -> TriggerCondition {
    by(EventKind::CharacterDealsDamage, card)
}

// === Cards ===

pub fn when_song_sung() -> TriggerCondition {
    when_event(EventKind::SongSung)
}

pub fn when_song_played() -> TriggerCondition {
    when_event(EventKind::SongPlayed)
}

pub fn when_action_played() -> TriggerCondition {
    when_event(EventKind::ActionPlayed)
}

pub fn when_item_played() -> TriggerCondition {
    when_event(EventKind::ItemPlayed)
}

pub fn when_ink_played() -> TriggerCondition {
    when_event(EventKind::InkPlayed)
}

pub fn when_card_drawn(player: Option<PlayerId>) -> TriggerCondition {
    for_player(EventKind::CardDrawn, player)
}

pub fn when_lore_gained() -> TriggerCondition {
    when_event(EventKind::LoreGained)
}

// === Turn Structure ===

pub fn when_turn_begins(player: Option<PlayerId>) -> TriggerCondition {
    for_player(EventKind::TurnBegins, player)
}

pub fn when_turn_ends(player: Option<PlayerId>) -> TriggerCondition {
    for_player(EventKind::TurnEnds, player)
}
