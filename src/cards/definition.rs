//! Card definitions: static card data.
//!
//! `CardDefinition` holds the printed properties of a card. Instance
//! state (damage, exerted, bonuses, zone) lives in `CardInstance`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Printed card type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    Character,
    Action,
    Song,
    Item,
    Location,
}

/// Keyword abilities printed on a card.
///
/// Keywords with a value carry it inline (`Challenger +2` is
/// `Keyword::Challenger(2)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Bodyguard,
    Evasive,
    Rush,
    Ward,
    Reckless,
    Support,
    Vanish,
    Challenger(i64),
    Resist(i64),
    Singer(i64),
    Shift(i64),
}

impl Keyword {
    /// True when both keywords are the same ability, ignoring values.
    #[must_use]
    pub fn same_kind(&self, other: &Keyword) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A named ability printed on the card, materialized at load time
/// through the ability factory table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySpec {
    /// Ability name, e.g. `"HEROISM"`.
    pub name: String,
    /// Integer parameters for the factory.
    #[serde(default)]
    pub data: FxHashMap<String, i64>,
}

impl AbilitySpec {
    /// Ability with no parameters.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: FxHashMap::default(),
        }
    }

    /// Add a parameter (builder pattern).
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: i64) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// Static card definition.
///
/// ## Example
///
/// ```
/// use ccg_rules::cards::{CardDefinition, CardKind, Keyword};
///
/// let stitch = CardDefinition::character("Stitch", 2, 3, 2, 1)
///     .with_version("Rock Star")
///     .with_subtype("Alien")
///     .with_keyword(Keyword::Evasive);
///
/// assert_eq!(stitch.kind, CardKind::Character);
/// assert_eq!(stitch.full_name(), "Stitch - Rock Star");
/// assert!(stitch.has_subtype("Alien"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Card name.
    pub name: String,

    /// Version subtitle (`None` for cards without one).
    pub version: Option<String>,

    pub kind: CardKind,

    /// Ink cost.
    pub cost: i64,

    /// Can this card be put into the inkwell?
    pub inkable: bool,

    pub strength: i64,
    pub willpower: i64,
    pub lore: i64,

    /// Classifications such as "Hero" or "Princess".
    #[serde(default)]
    pub subtypes: SmallVec<[String; 3]>,

    #[serde(default)]
    pub keywords: SmallVec<[Keyword; 2]>,

    /// Named abilities to materialize at load time.
    #[serde(default)]
    pub abilities: Vec<AbilitySpec>,
}

impl CardDefinition {
    /// Create a definition of any kind with zeroed stats.
    pub fn new(name: impl Into<String>, kind: CardKind, cost: i64) -> Self {
        Self {
            name: name.into(),
            version: None,
            kind,
            cost,
            inkable: true,
            strength: 0,
            willpower: 0,
            lore: 0,
            subtypes: SmallVec::new(),
            keywords: SmallVec::new(),
            abilities: Vec::new(),
        }
    }

    /// Create a character definition.
    pub fn character(
        name: impl Into<String>,
        cost: i64,
        strength: i64,
        willpower: i64,
        lore: i64,
    ) -> Self {
        Self {
            strength,
            willpower,
            lore,
            ..Self::new(name, CardKind::Character, cost)
        }
    }

    /// Set the version subtitle (builder pattern).
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Add a subtype (builder pattern).
    #[must_use]
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtypes.push(subtype.into());
        self
    }

    /// Add a keyword (builder pattern).
    #[must_use]
    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        self.keywords.push(keyword);
        self
    }

    /// Add a named ability (builder pattern).
    #[must_use]
    pub fn with_ability(mut self, ability: AbilitySpec) -> Self {
        self.abilities.push(ability);
        self
    }

    /// Mark the card as not inkable (builder pattern).
    #[must_use]
    pub fn uninkable(mut self) -> Self {
        self.inkable = false;
        self
    }

    /// "Name - Version", or just the name.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.version {
            Some(version) => format!("{} - {}", self.name, version),
            None => self.name.clone(),
        }
    }

    #[must_use]
    pub fn has_subtype(&self, subtype: &str) -> bool {
        self.subtypes.iter().any(|s| s == subtype)
    }

    #[must_use]
    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.iter().any(|k| k.same_kind(&keyword))
    }
}
