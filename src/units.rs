//! Ingredient measurement units.
//!
//! Ids are stored on the server and must never be renumbered. Id 20 is
//! retired.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    pub id: u32,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct UnitGroup {
    pub name: &'static str,
    pub units: &'static [Unit],
}

const fn unit(id: u32, label: &'static str) -> Unit {
    Unit { id, label }
}

/// Units grouped for a picker, in display order.
pub const UNIT_GROUPS: &[UnitGroup] = &[
    UnitGroup {
        name: "Volume Metric",
        units: &[unit(1, "mL"), unit(2, "L")],
    },
    UnitGroup {
        name: "Volume Imperial",
        units: &[
            unit(3, "tsp"),
            unit(4, "Tbsp"),
            unit(5, "fluid ounce"),
            unit(6, "cup"),
            unit(7, "pint"),
            unit(8, "quart"),
            unit(9, "gallon"),
        ],
    },
    UnitGroup {
        name: "Weight Metric",
        units: &[unit(10, "mg"), unit(11, "g"), unit(12, "kg")],
    },
    UnitGroup {
        name: "Weight Imperial",
        units: &[unit(13, "ounce"), unit(14, "pound")],
    },
    UnitGroup {
        name: "Pieces",
        units: &[
            unit(15, "pcs"),
            unit(16, "each"),
            unit(17, "dozen"),
            unit(18, "bunch"),
            unit(19, "head"),
        ],
    },
    UnitGroup {
        name: "Other",
        units: &[
            unit(21, "pinch"),
            unit(22, "dash"),
            unit(23, "clove"),
            unit(24, "slice"),
            unit(25, "stick"),
            unit(26, "package"),
            unit(27, "can"),
            unit(28, "bottle"),
        ],
    },
];

pub fn all_units() -> impl Iterator<Item = Unit> {
    UNIT_GROUPS.iter().flat_map(|g| g.units.iter().copied())
}

pub fn unit_label(id: u32) -> Option<&'static str> {
    all_units().find(|u| u.id == id).map(|u| u.label)
}
