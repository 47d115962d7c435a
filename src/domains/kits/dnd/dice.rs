//! Dice tools: notation rolls and ability score generation.

use anyhow::{Context, bail};
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

const MAX_DICE: u32 = 100;
const MAX_SIDES: u32 = 1000;
const ABILITIES: [&str; 6] = ["STR", "DEX", "CON", "INT", "WIS", "CHA"];

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the dice roller.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RollDiceParams {
    /// Dice in standard notation, e.g. "2d6", "1d20" or "d8".
    pub dice: String,
}

/// The stat generator takes no input.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

// ============================================================================
// Tool Definitions
// ============================================================================

/// Roll dice from standard notation.
pub struct RollDiceTool;

impl RollDiceTool {
    pub const NAME: &'static str = "roll_dice";

    pub const DESCRIPTION: &'static str = "Roll dice using standard D&D notation, e.g. '2d6', '1d20', '4d6'.\nReturns each individual roll and the total.";

    pub fn execute(params: &RollDiceParams) -> anyhow::Result<Value> {
        let notation = params.dice.trim().to_lowercase();
        let (count, sides) = parse_notation(&notation)?;
        let rolls = roll(&mut rand::rng(), count, sides);
        debug!("Rolled {}: {:?}", notation, rolls);

        Ok(json!({
            "notation": notation,
            "total": rolls.iter().sum::<u32>(),
            "rolls": rolls,
        }))
    }
}

/// Roll a full set of ability scores.
pub struct CharacterStatsTool;

/// One rolled ability score.
#[derive(Debug, Clone, Serialize)]
pub struct AbilityScore {
    pub rolls: Vec<u32>,
    pub score: u32,
    pub modifier: i32,
    pub modifier_str: String,
}

impl CharacterStatsTool {
    pub const NAME: &'static str = "generate_character_stats";

    pub const DESCRIPTION: &'static str = "Roll a full set of D&D 5e ability scores (STR, DEX, CON, INT, WIS, CHA)\nusing the standard 4d6-drop-lowest method.\nAlso calculates each ability modifier.";

    pub fn execute(_params: &NoParams) -> Value {
        let mut rng = rand::rng();
        let mut scores = Map::new();
        for ability in ABILITIES {
            let score = ability_score(roll(&mut rng, 4, 6));
            scores.insert(ability.to_string(), json!(score));
        }
        json!({ "ability_scores": scores })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse `NdM` (N optional, defaults to 1) into `(N, M)`.
fn parse_notation(notation: &str) -> anyhow::Result<(u32, u32)> {
    let Some((count, sides)) = notation.split_once('d') else {
        bail!("Invalid dice notation '{notation}'. Use format like '2d6' or '1d20'.");
    };

    let count: u32 = if count.is_empty() {
        1
    } else {
        count
            .parse()
            .with_context(|| format!("Invalid dice count in '{notation}'"))?
    };
    let sides: u32 = sides
        .parse()
        .with_context(|| format!("Invalid die size in '{notation}'"))?;

    if !(1..=MAX_DICE).contains(&count) || !(1..=MAX_SIDES).contains(&sides) {
        bail!("Dice values out of range (max {MAX_DICE} dice, max d{MAX_SIDES}).");
    }
    Ok((count, sides))
}

fn roll<R: Rng + ?Sized>(rng: &mut R, count: u32, sides: u32) -> Vec<u32> {
    (0..count).map(|_| rng.random_range(1..=sides)).collect()
}

/// Sum the best three of four rolls and derive the modifier.
fn ability_score(rolls: Vec<u32>) -> AbilityScore {
    let mut sorted = rolls.clone();
    sorted.sort_unstable();
    let score: u32 = sorted.iter().skip(1).sum();
    let modifier = (score as i32 - 10).div_euclid(2);

    AbilityScore {
        rolls,
        score,
        modifier,
        modifier_str: if modifier >= 0 {
            format!("+{modifier}")
        } else {
            modifier.to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_parse_notation() {
        assert_eq!(parse_notation("2d6").unwrap(), (2, 6));
        assert_eq!(parse_notation("d20").unwrap(), (1, 20));
        assert!(parse_notation("2x6").is_err());
        assert!(parse_notation("0d6").is_err());
        assert!(parse_notation("101d6").is_err());
        assert!(parse_notation("1d1001").is_err());
        assert!(parse_notation("ad6").is_err());
    }

    #[test]
    fn test_rolls_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let rolls = roll(&mut rng, 50, 6);
        assert_eq!(rolls.len(), 50);
        assert!(rolls.iter().all(|r| (1..=6).contains(r)));
    }

    #[test]
    fn test_roll_dice_tool() {
        let result = RollDiceTool::execute(&RollDiceParams {
            dice: " 3D4 ".into(),
        })
        .unwrap();

        assert_eq!(result["notation"], "3d4");
        let rolls: Vec<u64> = result["rolls"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_u64().unwrap())
            .collect();
        assert_eq!(rolls.len(), 3);
        assert_eq!(result["total"].as_u64().unwrap(), rolls.iter().sum::<u64>());
    }

    #[test]
    fn test_roll_dice_invalid() {
        let result = RollDiceTool::execute(&RollDiceParams {
            dice: "lots".into(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_ability_score_drops_lowest() {
        let score = ability_score(vec![1, 6, 6, 6]);
        assert_eq!(score.score, 18);
        assert_eq!(score.modifier, 4);
        assert_eq!(score.modifier_str, "+4");

        let score = ability_score(vec![1, 1, 1, 1]);
        assert_eq!(score.score, 3);
        assert_eq!(score.modifier, -4);
        assert_eq!(score.modifier_str, "-4");
    }

    #[test]
    fn test_character_stats() {
        let result = CharacterStatsTool::execute(&NoParams::default());
        let scores = result["ability_scores"].as_object().unwrap();
        assert_eq!(scores.len(), 6);
        for ability in ABILITIES {
            let score = scores[ability]["score"].as_u64().unwrap();
            assert!((3..=18).contains(&score));
        }
    }
}
