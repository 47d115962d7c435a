//! Tabletop kit: dice, character generation and 5e reference lookups.
//!
//! Everything here is local and offline, so the kit always loads.

mod dice;
mod lore;

pub use dice::{CharacterStatsTool, NoParams, RollDiceParams, RollDiceTool};
pub use lore::{
    CharacterNameParams, CharacterNameTool, ConditionLookupTool, ConditionParams, EncounterParams,
    EncounterTool, MonsterParams, MonsterStatsTool, SpellLookupTool, SpellParams,
};

use crate::domains::tools::{Kit, KitError, KitRegistrar};

/// The tabletop kit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DndKit;

impl DndKit {
    pub const NAME: &'static str = "dnd";
}

impl Kit for DndKit {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn register(&self, registrar: &mut KitRegistrar<'_>) -> Result<(), KitError> {
        registrar.register_typed(
            RollDiceTool::NAME,
            RollDiceTool::DESCRIPTION,
            |p: RollDiceParams| RollDiceTool::execute(&p),
        )?;
        registrar.register_typed(
            CharacterStatsTool::NAME,
            CharacterStatsTool::DESCRIPTION,
            |p: NoParams| Ok(CharacterStatsTool::execute(&p)),
        )?;
        registrar.register_typed(
            CharacterNameTool::NAME,
            CharacterNameTool::DESCRIPTION,
            |p: CharacterNameParams| Ok(CharacterNameTool::execute(&p)),
        )?;
        registrar.register_typed(
            SpellLookupTool::NAME,
            SpellLookupTool::DESCRIPTION,
            |p: SpellParams| Ok(SpellLookupTool::execute(&p)),
        )?;
        registrar.register_typed(
            MonsterStatsTool::NAME,
            MonsterStatsTool::DESCRIPTION,
            |p: MonsterParams| Ok(MonsterStatsTool::execute(&p)),
        )?;
        registrar.register_typed(
            EncounterTool::NAME,
            EncounterTool::DESCRIPTION,
            |p: EncounterParams| Ok(EncounterTool::execute(&p)),
        )?;
        registrar.register_typed(
            ConditionLookupTool::NAME,
            ConditionLookupTool::DESCRIPTION,
            |p: ConditionParams| Ok(ConditionLookupTool::execute(&p)),
        )?;
        Ok(())
    }
}
