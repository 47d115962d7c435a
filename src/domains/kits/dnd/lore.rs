//! Reference tools: names, spells, monsters, encounters and conditions.
//!
//! All lookups are case-insensitive. An unknown key is not a failure: the
//! tool answers with an `error` message plus the keys it does know, so the
//! caller can retry.

use rand::seq::IndexedRandom;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// ============================================================================
// Tables
// ============================================================================

struct RaceNames {
    race: &'static str,
    first: &'static [&'static str],
    last: &'static [&'static str],
}

const NAMES: &[RaceNames] = &[
    RaceNames {
        race: "human",
        first: &["Aldric", "Brenna", "Cedric", "Daria", "Edwyn", "Fiona", "Gareth", "Helena"],
        last: &[
            "Ashwood",
            "Blackthorn",
            "Coldwater",
            "Dunmore",
            "Fairwind",
            "Ironforge",
            "Stormridge",
        ],
    },
    RaceNames {
        race: "elf",
        first: &["Aelindra", "Caladrel", "Erevan", "Faelyn", "Ithilwen", "Lyriel", "Soveliss", "Tindómë"],
        last: &["Brightleaf", "Dawnwhisper", "Moonshadow", "Silverbow", "Starweave", "Sunsong"],
    },
    RaceNames {
        race: "dwarf",
        first: &["Balin", "Dolgrin", "Gurdis", "Helga", "Marta", "Rurik", "Thorin", "Ulfgar"],
        last: &["Battlehammer", "Copperkettle", "Deepdelve", "Ironmantle", "Stonehewer", "Thunderfist"],
    },
    RaceNames {
        race: "halfling",
        first: &["Cora", "Eldon", "Garret", "Lila", "Merric", "Nora", "Osric", "Pippa"],
        last: &["Brushgather", "Goodbarrel", "Greenbottle", "High-hill", "Tealeaf", "Thistletop"],
    },
    RaceNames {
        race: "gnome",
        first: &["Alston", "Boddynock", "Dimble", "Ellyjobell", "Fonkin", "Gimble", "Namfoodle", "Zook"],
        last: &["Beren", "Daergel", "Folkor", "Garrick", "Nackle", "Murnig", "Ningel", "Raulnor"],
    },
    RaceNames {
        race: "half-orc",
        first: &["Dench", "Feng", "Gell", "Henk", "Holg", "Imsh", "Keth", "Murg"],
        last: &["Duskwalker", "Grimstone", "Ironjaw", "Razorclaw", "Shadowpeak", "Steelborn"],
    },
    RaceNames {
        race: "tiefling",
        first: &["Akmenos", "Amnon", "Barakas", "Damakos", "Ekemon", "Iados", "Kairon", "Leucis"],
        last: &["Crowe", "Inferno", "Mourne", "Night", "Rage", "Sorrow", "Thorn", "Void"],
    },
    RaceNames {
        race: "dragonborn",
        first: &["Arjhan", "Balasar", "Bharash", "Donaar", "Ghesh", "Heskan", "Kriv", "Nadarr"],
        last: &[
            "Clethtinthiallor",
            "Daardendrian",
            "Fenkenkabradon",
            "Kepeshkmolik",
            "Patinajirrk",
        ],
    },
];

#[derive(Debug, Serialize)]
struct Spell {
    #[serde(skip)]
    key: &'static str,
    level: u8,
    school: &'static str,
    casting_time: &'static str,
    range: &'static str,
    components: &'static str,
    duration: &'static str,
    description: &'static str,
}

const SPELLS: &[Spell] = &[
    Spell {
        key: "fireball",
        level: 3,
        school: "Evocation",
        casting_time: "1 action",
        range: "150 feet",
        components: "V, S, M (a tiny ball of bat guano and sulfur)",
        duration: "Instantaneous",
        description: "A bright streak flashes from your pointing finger to a point you choose within range and then blossoms with a low roar into an explosion of flame. Each creature in a 20-foot-radius sphere centered on that point must make a Dexterity saving throw. A target takes 8d6 fire damage on a failed save, or half as much on a successful one.",
    },
    Spell {
        key: "magic missile",
        level: 1,
        school: "Evocation",
        casting_time: "1 action",
        range: "120 feet",
        components: "V, S",
        duration: "Instantaneous",
        description: "You create three glowing darts of magical force. Each dart hits a creature of your choice that you can see within range. A dart deals 1d4+1 force damage to its target. The darts all strike simultaneously.",
    },
    Spell {
        key: "cure wounds",
        level: 1,
        school: "Evocation",
        casting_time: "1 action",
        range: "Touch",
        components: "V, S",
        duration: "Instantaneous",
        description: "A creature you touch regains a number of hit points equal to 1d8 + your spellcasting ability modifier. This spell has no effect on undead or constructs.",
    },
    Spell {
        key: "shield",
        level: 1,
        school: "Abjuration",
        casting_time: "1 reaction",
        range: "Self",
        components: "V, S",
        duration: "1 round",
        description: "An invisible barrier of magical force appears and protects you. Until the start of your next turn, you have a +5 bonus to AC, including against the triggering attack, and you take no damage from magic missile.",
    },
    Spell {
        key: "counterspell",
        level: 3,
        school: "Abjuration",
        casting_time: "1 reaction",
        range: "60 feet",
        components: "S",
        duration: "Instantaneous",
        description: "You attempt to interrupt a creature in the process of casting a spell. If the creature is casting a spell of 3rd level or lower, its spell fails and has no effect. If it is casting a spell of 4th level or higher, make an ability check using your spellcasting ability with a DC equal to 10 + the spell's level. On a success, the spell fails.",
    },
    Spell {
        key: "misty step",
        level: 2,
        school: "Conjuration",
        casting_time: "1 bonus action",
        range: "Self",
        components: "V",
        duration: "Instantaneous",
        description: "Briefly surrounded by silvery mist, you teleport up to 30 feet to an unoccupied space that you can see.",
    },
    Spell {
        key: "hold person",
        level: 2,
        school: "Enchantment",
        casting_time: "1 action",
        range: "60 feet",
        components: "V, S, M (a small, straight piece of iron)",
        duration: "Concentration, up to 1 minute",
        description: "Choose a humanoid that you can see within range. The target must succeed on a Wisdom saving throw or be paralyzed for the duration. At the end of each of its turns, the target can make another Wisdom saving throw. On a success, the spell ends.",
    },
    Spell {
        key: "detect magic",
        level: 1,
        school: "Divination",
        casting_time: "1 action (ritual)",
        range: "Self",
        components: "V, S",
        duration: "Concentration, up to 10 minutes",
        description: "For the duration, you sense the presence of magic within 30 feet of you. If you sense magic in this way, you can use your action to see a faint aura around any visible creature or object in the area that bears magic, and you learn its school of magic.",
    },
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "UPPERCASE")]
struct Monster {
    #[serde(skip)]
    key: &'static str,
    #[serde(rename = "size")]
    size: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "alignment")]
    alignment: &'static str,
    ac: u8,
    hp: &'static str,
    #[serde(rename = "speed")]
    speed: &'static str,
    str: u8,
    dex: u8,
    con: u8,
    int: u8,
    wis: u8,
    cha: u8,
    cr: &'static str,
    xp: u32,
    #[serde(rename = "traits")]
    traits: &'static [&'static str],
    #[serde(rename = "actions")]
    actions: &'static [&'static str],
}

const MONSTERS: &[Monster] = &[
    Monster {
        key: "goblin",
        size: "Small",
        kind: "humanoid",
        alignment: "neutral evil",
        ac: 15,
        hp: "7 (2d6)",
        speed: "30 ft.",
        str: 8,
        dex: 14,
        con: 10,
        int: 10,
        wis: 8,
        cha: 8,
        cr: "1/4",
        xp: 50,
        traits: &["Nimble Escape: Can Disengage or Hide as a bonus action."],
        actions: &[
            "Scimitar: +4 to hit, 1d6+2 slashing.",
            "Shortbow: +4 to hit, range 80/320 ft., 1d6+2 piercing.",
        ],
    },
    Monster {
        key: "skeleton",
        size: "Medium",
        kind: "undead",
        alignment: "lawful evil",
        ac: 13,
        hp: "13 (2d8+4)",
        speed: "30 ft.",
        str: 10,
        dex: 14,
        con: 15,
        int: 6,
        wis: 8,
        cha: 5,
        cr: "1/4",
        xp: 50,
        traits: &[
            "Damage Vulnerabilities: bludgeoning.",
            "Damage Immunities: poison.",
            "Condition Immunities: exhaustion, poisoned.",
        ],
        actions: &[
            "Shortsword: +4 to hit, 1d6+2 piercing.",
            "Shortbow: +4 to hit, range 80/320 ft., 1d6+2 piercing.",
        ],
    },
    Monster {
        key: "troll",
        size: "Large",
        kind: "giant",
        alignment: "chaotic evil",
        ac: 15,
        hp: "84 (8d10+40)",
        speed: "30 ft.",
        str: 18,
        dex: 13,
        con: 20,
        int: 7,
        wis: 9,
        cha: 7,
        cr: "5",
        xp: 1800,
        traits: &[
            "Keen Smell: Advantage on Perception checks using smell.",
            "Regeneration: Regains 10 HP at start of turn unless it took acid or fire damage.",
        ],
        actions: &[
            "Multiattack: Makes 3 attacks (1 bite, 2 claws).",
            "Bite: +7 to hit, 1d6+4 piercing.",
            "Claw: +7 to hit, 2d6+4 slashing.",
        ],
    },
    Monster {
        key: "dragon (young red)",
        size: "Large",
        kind: "dragon",
        alignment: "chaotic evil",
        ac: 18,
        hp: "178 (17d10+85)",
        speed: "40 ft., climb 40 ft., fly 80 ft.",
        str: 23,
        dex: 10,
        con: 21,
        int: 14,
        wis: 11,
        cha: 19,
        cr: "10",
        xp: 5900,
        traits: &["Fire Immunity.", "Blindsight 30 ft., Darkvision 120 ft."],
        actions: &[
            "Multiattack: 1 bite + 2 claws.",
            "Bite: +10 to hit, 2d10+6 piercing + 1d6 fire.",
            "Claw: +10 to hit, 2d6+6 slashing.",
            "Fire Breath (Recharge 5-6): 30-ft. cone, DC 18 Dex save, 16d6 fire damage.",
        ],
    },
    Monster {
        key: "beholder",
        size: "Large",
        kind: "aberration",
        alignment: "lawful evil",
        ac: 18,
        hp: "180 (19d10+76)",
        speed: "0 ft., fly 20 ft. (hover)",
        str: 10,
        dex: 14,
        con: 18,
        int: 17,
        wis: 15,
        cha: 17,
        cr: "13",
        xp: 10000,
        traits: &[
            "Antimagic Cone: The central eye creates a 150-ft. cone of antimagic.",
            "Regional Effects: The lair warps reality.",
        ],
        actions: &[
            "Bite: +5 to hit, 4d6 piercing.",
            "Eye Rays: Shoots 3 random magical rays each turn (charm, paralyze, fear, slow, etc.)",
        ],
    },
];

const ENCOUNTERS: &[(&str, &[&str])] = &[
    (
        "forest",
        &[
            "A pack of 1d4+2 wolves stalks you through the undergrowth.",
            "A green hag offers you a trade: her knowledge for a secret.",
            "2d6 goblins set up an ambush from the treetops.",
            "A wounded unicorn is trapped in a hunter's snare.",
            "A will-o'-wisp leads you in circles.",
            "A dryad demands you explain why you are in her grove.",
        ],
    ),
    (
        "dungeon",
        &[
            "1d6 skeletons animate as you enter the chamber.",
            "A mimic disguised as a treasure chest waits patiently.",
            "A gelatinous cube fills the corridor ahead.",
            "Rival adventurers claim this floor is already theirs.",
            "A trapped pit hides a long-dead adventurer's belongings.",
            "A ghost relives its final moments and begs for closure.",
        ],
    ),
    (
        "city",
        &[
            "A pickpocket bumps into you. Roll a DC 14 Perception check.",
            "A town crier announces a bounty for your capture.",
            "A disguised assassin sits across from you at the tavern.",
            "The city guard demands to inspect your belongings.",
            "A merchant offers a suspicious 'deal of a lifetime'.",
            "A street urchin slips a cryptic note into your pocket.",
        ],
    ),
    (
        "sea",
        &[
            "A kraken tentacle rises alongside the ship.",
            "Pirates flying a black flag approach at full sail.",
            "A siren's song drifts across the fog.",
            "A sea hag surfaces and curses one crew member.",
            "A ghost ship passes silently, crewed by the undead.",
            "A water elemental rises from a sudden maelstrom.",
        ],
    ),
];

const CONDITIONS: &[(&str, &str)] = &[
    ("blinded", "A blinded creature can't see and automatically fails any ability check that requires sight. Attack rolls against it have advantage, and its attack rolls have disadvantage."),
    ("charmed", "A charmed creature can't attack the charmer or target them with harmful abilities or effects. The charmer has advantage on social checks against the creature."),
    ("deafened", "A deafened creature can't hear and automatically fails any ability check requiring hearing."),
    ("exhaustion", "Exhaustion has 6 levels: 1-Disadvantage on ability checks, 2-Speed halved, 3-Disadvantage on attack rolls and saving throws, 4-HP max halved, 5-Speed reduced to 0, 6-Death. Each long rest removes one level."),
    ("frightened", "A frightened creature has disadvantage on ability checks and attack rolls while the source of its fear is within line of sight. It can't willingly move closer to the source."),
    ("grappled", "A grappled creature's speed becomes 0. The condition ends if the grappler is incapacitated or if the creature is moved out of reach."),
    ("incapacitated", "An incapacitated creature can't take actions or reactions."),
    ("invisible", "An invisible creature is impossible to see without special senses. It has advantage on attack rolls; attacks against it have disadvantage."),
    ("paralyzed", "A paralyzed creature is incapacitated, can't move or speak, automatically fails STR and DEX saves, attacks against it have advantage, and hits within 5 ft. are critical hits."),
    ("petrified", "A petrified creature is transformed into stone, incapacitated, and has resistance to all damage. It automatically fails STR and DEX saves."),
    ("poisoned", "A poisoned creature has disadvantage on attack rolls and ability checks."),
    ("prone", "A prone creature's only movement option is crawling. It has disadvantage on attack rolls. Attacks against it have advantage if within 5 ft., otherwise disadvantage."),
    ("restrained", "A restrained creature's speed becomes 0. Attack rolls against it have advantage; its attack rolls have disadvantage. It has disadvantage on DEX saving throws."),
    ("stunned", "A stunned creature is incapacitated, can't move, and can only speak falteringly. It automatically fails STR and DEX saves; attacks against it have advantage."),
    ("unconscious", "An unconscious creature is incapacitated, can't move or speak, is unaware of its surroundings, drops held items, falls prone, and automatically fails STR and DEX saves. Attacks have advantage and hits within 5 ft. are critical hits."),
];

// ============================================================================
// Tool Parameters
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CharacterNameParams {
    /// One of: human, elf, dwarf, halfling, gnome, half-orc, tiefling, dragonborn.
    pub race: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SpellParams {
    /// Spell name, e.g. "fireball".
    pub spell_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MonsterParams {
    /// Monster name, e.g. "goblin".
    pub monster_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EncounterParams {
    /// One of: forest, dungeon, city, sea.
    pub environment: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ConditionParams {
    /// Condition name, e.g. "paralyzed".
    pub condition: String,
}

// ============================================================================
// Tool Definitions
// ============================================================================

pub struct CharacterNameTool;

impl CharacterNameTool {
    pub const NAME: &'static str = "random_character_name";

    pub const DESCRIPTION: &'static str = "Generate a random D&D character name for a given race.\nSupported races: human, elf, dwarf, halfling, gnome, half-orc, tiefling, dragonborn.";

    pub fn execute(params: &CharacterNameParams) -> Value {
        let race = normalize(&params.race);
        let Some(names) = NAMES.iter().find(|n| n.race == race) else {
            return json!({
                "error": format!("Unknown race '{race}'."),
                "supported_races": NAMES.iter().map(|n| n.race).collect::<Vec<_>>(),
            });
        };

        let mut rng = rand::rng();
        let first = names.first.choose(&mut rng).copied().unwrap_or_default();
        let last = names.last.choose(&mut rng).copied().unwrap_or_default();
        json!({
            "race": race,
            "name": format!("{first} {last}"),
            "first": first,
            "last": last,
        })
    }
}

pub struct SpellLookupTool;

impl SpellLookupTool {
    pub const NAME: &'static str = "lookup_spell";

    pub const DESCRIPTION: &'static str = "Look up details for a D&D 5e spell by name.\nReturns level, school, casting time, range, components, duration, and description.";

    pub fn execute(params: &SpellParams) -> Value {
        let key = normalize(&params.spell_name);
        match SPELLS.iter().find(|s| s.key == key) {
            Some(spell) => with_title("spell", &params.spell_name, spell),
            None => {
                let mut available: Vec<_> = SPELLS.iter().map(|s| s.key).collect();
                available.sort_unstable();
                json!({
                    "error": format!("Spell '{}' not found.", params.spell_name),
                    "available_spells": available,
                })
            }
        }
    }
}

pub struct MonsterStatsTool;

impl MonsterStatsTool {
    pub const NAME: &'static str = "get_monster_stats";

    pub const DESCRIPTION: &'static str = "Get the stat block for a D&D 5e monster.\nAvailable monsters: goblin, skeleton, troll, dragon (young red), beholder.";

    pub fn execute(params: &MonsterParams) -> Value {
        let key = normalize(&params.monster_name);
        match MONSTERS.iter().find(|m| m.key == key) {
            Some(monster) => with_title("monster", &params.monster_name, monster),
            None => json!({
                "error": format!("Monster '{}' not found.", params.monster_name),
                "available_monsters": MONSTERS.iter().map(|m| m.key).collect::<Vec<_>>(),
            }),
        }
    }
}

pub struct EncounterTool;

impl EncounterTool {
    pub const NAME: &'static str = "random_encounter";

    pub const DESCRIPTION: &'static str = "Generate a random encounter for a given environment.\nSupported environments: forest, dungeon, city, sea.";

    pub fn execute(params: &EncounterParams) -> Value {
        let key = normalize(&params.environment);
        let Some((_, options)) = ENCOUNTERS.iter().find(|(env, _)| *env == key) else {
            return json!({
                "error": format!("Unknown environment '{}'.", params.environment),
                "supported_environments":
                    ENCOUNTERS.iter().map(|(env, _)| *env).collect::<Vec<_>>(),
            });
        };

        json!({
            "environment": key,
            "encounter": options.choose(&mut rand::rng()).copied().unwrap_or_default(),
        })
    }
}

pub struct ConditionLookupTool;

impl ConditionLookupTool {
    pub const NAME: &'static str = "lookup_condition";

    pub const DESCRIPTION: &'static str =
        "Look up the rules for a D&D 5e condition (e.g. 'blinded', 'paralyzed', 'poisoned').";

    pub fn execute(params: &ConditionParams) -> Value {
        let key = normalize(&params.condition);
        match CONDITIONS.iter().find(|(name, _)| *name == key) {
            Some((_, description)) => json!({
                "condition": title_case(&params.condition),
                "description": description,
            }),
            None => {
                let mut available: Vec<_> = CONDITIONS.iter().map(|(name, _)| *name).collect();
                available.sort_unstable();
                json!({
                    "error": format!("Condition '{}' not found.", params.condition),
                    "available_conditions": available,
                })
            }
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Serialize `entry` with a title-cased `label` field in front.
fn with_title<T: Serialize>(label: &str, name: &str, entry: &T) -> Value {
    let mut object = serde_json::Map::new();
    object.insert(label.to_string(), Value::from(title_case(name)));
    if let Ok(Value::Object(fields)) = serde_json::to_value(entry) {
        object.extend(fields);
    }
    Value::Object(object)
}

/// Capitalize the first letter of every word, lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.trim().chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("magic missile"), "Magic Missile");
        assert_eq!(title_case(" FIREBALL "), "Fireball");
        assert_eq!(title_case("dragon (young red)"), "Dragon (Young Red)");
    }

    #[test]
    fn test_character_name() {
        let result = CharacterNameTool::execute(&CharacterNameParams {
            race: "Dwarf".into(),
        });
        assert_eq!(result["race"], "dwarf");
        let name = result["name"].as_str().unwrap();
        assert_eq!(
            name,
            format!("{} {}", result["first"].as_str().unwrap(), result["last"].as_str().unwrap())
        );
    }

    #[test]
    fn test_character_name_unknown_race() {
        let result = CharacterNameTool::execute(&CharacterNameParams {
            race: "kobold".into(),
        });
        assert!(result["error"].as_str().unwrap().contains("kobold"));
        assert_eq!(result["supported_races"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn test_lookup_spell() {
        let result = SpellLookupTool::execute(&SpellParams {
            spell_name: "Magic Missile".into(),
        });
        assert_eq!(result["spell"], "Magic Missile");
        assert_eq!(result["level"], 1);
        assert_eq!(result["school"], "Evocation");
        assert!(result.get("key").is_none());
    }

    #[test]
    fn test_lookup_spell_unknown() {
        let result = SpellLookupTool::execute(&SpellParams {
            spell_name: "wish".into(),
        });
        let available = result["available_spells"].as_array().unwrap();
        assert_eq!(available.len(), SPELLS.len());
        assert_eq!(available[0], "counterspell");
    }

    #[test]
    fn test_monster_stats() {
        let result = MonsterStatsTool::execute(&MonsterParams {
            monster_name: "troll".into(),
        });
        assert_eq!(result["monster"], "Troll");
        assert_eq!(result["AC"], 15);
        assert_eq!(result["HP"], "84 (8d10+40)");
        assert_eq!(result["STR"], 18);
        assert_eq!(result["CR"], "5");
        assert_eq!(result["XP"], 1800);
        assert_eq!(result["type"], "giant");
        assert_eq!(result["actions"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_random_encounter() {
        let result = EncounterTool::execute(&EncounterParams {
            environment: "Sea".into(),
        });
        assert_eq!(result["environment"], "sea");
        assert!(!result["encounter"].as_str().unwrap().is_empty());

        let result = EncounterTool::execute(&EncounterParams {
            environment: "desert".into(),
        });
        assert!(result.get("error").is_some());
    }

    #[test]
    fn test_lookup_condition() {
        let result = ConditionLookupTool::execute(&ConditionParams {
            condition: "prone".into(),
        });
        assert_eq!(result["condition"], "Prone");
        assert!(result["description"].as_str().unwrap().contains("crawling"));

        let result = ConditionLookupTool::execute(&ConditionParams {
            condition: "sleepy".into(),
        });
        assert_eq!(
            result["available_conditions"].as_array().unwrap().len(),
            CONDITIONS.len()
        );
    }
}
