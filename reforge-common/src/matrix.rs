//! Coordinates shared by the build matrix and every stage that reads artifacts produced from it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four optimization levels in the build matrix.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptLevel {
    O0,
    O1,
    O2,
    O3,
}

impl OptLevel {
    pub const ALL: [OptLevel; 4] = [OptLevel::O0, OptLevel::O1, OptLevel::O2, OptLevel::O3];

    /// The `-O{n}` compiler flag for this level.
    pub fn as_flag(self) -> &'static str {
        match self {
            OptLevel::O0 => "-O0",
            OptLevel::O1 => "-O1",
            OptLevel::O2 => "-O2",
            OptLevel::O3 => "-O3",
        }
    }

    /// The directory segment used in the on-disk layout, e.g. `O2`.
    pub fn dir_name(self) -> &'static str {
        match self {
            OptLevel::O0 => "O0",
            OptLevel::O1 => "O1",
            OptLevel::O2 => "O2",
            OptLevel::O3 => "O3",
        }
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One of the three post-compilation treatments of an artifact.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Debug,
    Release,
    Stripped,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Debug, Variant::Release, Variant::Stripped];

    pub fn dir_name(self) -> &'static str {
        match self {
            Variant::Debug => "debug",
            Variant::Release => "release",
            Variant::Stripped => "stripped",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A single point in the `(optimization, variant)` build matrix.
///
/// `Ord` follows the deterministic cell ordering required by the build receipt: optimization
/// level first, then variant, both in declaration order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub opt_level: OptLevel,
    pub variant: Variant,
}

impl Cell {
    pub fn new(opt_level: OptLevel, variant: Variant) -> Self {
        Self { opt_level, variant }
    }

    /// All 12 cells of the matrix, in deterministic receipt order.
    pub fn matrix() -> Vec<Cell> {
        let mut cells = Vec::with_capacity(OptLevel::ALL.len() * Variant::ALL.len());
        for opt_level in OptLevel::ALL {
            for variant in Variant::ALL {
                cells.push(Cell::new(opt_level, variant));
            }
        }
        cells
    }

    /// Relative directory for this cell, e.g. `O2/stripped`.
    pub fn rel_dir(self) -> String {
        format!("{}/{}", self.opt_level.dir_name(), self.variant.dir_name())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.opt_level, self.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_has_twelve_cells_in_order() {
        let cells = Cell::matrix();
        assert_eq!(cells.len(), 12);
        assert_eq!(cells[0], Cell::new(OptLevel::O0, Variant::Debug));
        assert_eq!(cells[11], Cell::new(OptLevel::O3, Variant::Stripped));
        let mut sorted = cells.clone();
        sorted.sort();
        assert_eq!(cells, sorted, "matrix() must already be in Cell's Ord order");
    }
}
