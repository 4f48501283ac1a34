// Dice-roll parsing and rolling for the `roll` command.
//
// Accepts `NdM` with N optional (defaults to 1). Bounds: 1..=100 dice,
// at least one side. No dice are drawn for a rejected spec.

use rand::Rng;

pub const MAX_DICE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollSpec {
    pub count: u32,
    pub sides: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub rolls: Vec<u32>,
    // u64: 100 dice at u32::MAX sides overflows a u32 sum.
    pub total: u64,
}

/// Parse a spec like `2d6` or `d20`. Returns `None` for anything malformed
/// or out of bounds; the caller turns that into a usage message.
pub fn parse_spec(input: &str) -> Option<RollSpec> {
    let (count_part, sides_part) = input.split_once('d')?;

    let count: u32 = if count_part.is_empty() {
        1
    } else {
        count_part.parse().ok()?
    };
    let sides: u32 = sides_part.parse().ok()?;

    if count < 1 || count > MAX_DICE || sides < 1 {
        return None;
    }

    Some(RollSpec { count, sides })
}

/// Draw `count` independent uniform values in `[1, sides]`.
pub fn roll(spec: RollSpec, rng: &mut impl Rng) -> RollOutcome {
    let rolls: Vec<u32> = (0..spec.count)
        .map(|_| rng.gen_range(1..=spec.sides))
        .collect();
    let total = rolls.iter().map(|&v| u64::from(v)).sum();

    RollOutcome { rolls, total }
}

// ============================================================================
// TESTS
// ============================================================================
