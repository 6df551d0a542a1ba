// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length-unit extraction.
//!
//! Resolves the chain `IFCPROJECT → UnitsInContext → IFCSIUNIT` and turns
//! the SI prefix of the length unit into the multiplier that converts
//! model coordinates to metres.

use tracing::warn;

use crate::error::Result;
use crate::loader::IfcLoader;
use crate::schema;
use crate::tokenizer::IfcTokenType;

/// SI prefix multipliers as defined by the IFC specification. Empty or
/// unknown prefixes mean the base unit.
#[inline]
pub fn convert_prefix(prefix: &str) -> f64 {
    match prefix {
        "EXA" => 1e18,
        "PETA" => 1e15,
        "TERA" => 1e12,
        "GIGA" => 1e9,
        "MEGA" => 1e6,
        "KILO" => 1e3,
        "HECTO" => 1e2,
        "DECA" => 1e1,
        "DECI" => 1e-1,
        "CENTI" => 1e-2,
        "MILLI" => 1e-3,
        "MICRO" => 1e-6,
        "NANO" => 1e-9,
        "PICO" => 1e-12,
        "FEMTO" => 1e-15,
        "ATTO" => 1e-18,
        _ => 1.0,
    }
}

/// Walks the project's unit assignment and returns the linear scaling
/// factor, defaulting to 1.0 (metres) whenever the chain cannot be
/// resolved. Lenient: a malformed unit line is skipped, not fatal.
pub fn read_linear_scaling_factor(loader: &mut IfcLoader) -> f64 {
    let projects = loader.express_ids_with_type(schema::IFCPROJECT);
    if projects.len() != 1 {
        warn!(count = projects.len(), "expected exactly one IFCPROJECT");
        return 1.0;
    }

    match scaling_factor_of_project(loader, projects[0]) {
        Ok(factor) => factor,
        Err(error) => {
            warn!(%error, "could not resolve project units");
            1.0
        }
    }
}

fn scaling_factor_of_project(loader: &mut IfcLoader, project: u32) -> Result<f64> {
    let project_line = loader
        .line_id_of(project)
        .ok_or(crate::error::Error::UnknownLine(project))?;
    loader.move_to_argument(project_line, 8)?;
    let units_id = loader.get_ref_argument()?;

    let units_line = loader
        .line_id_of(units_id)
        .ok_or(crate::error::Error::UnknownLine(units_id))?;
    loader.move_to_argument(units_line, 0)?;
    let unit_offsets = loader.get_set_argument()?;

    let mut factor = 1.0;
    for offset in unit_offsets {
        let Ok(unit_id) = loader.get_ref_argument_at(offset) else {
            continue;
        };
        let Some(unit_line) = loader.line_id_of(unit_id) else {
            continue;
        };
        if loader.lines()[unit_line as usize].ifc_type != schema::IFCSIUNIT {
            continue;
        }
        if let Ok(Some(si_factor)) = si_unit_length_factor(loader, unit_line) {
            factor = si_factor;
        }
    }
    Ok(factor)
}

/// Reads one IFCSIUNIT line; `Some` only for `(LENGTHUNIT, prefix, METRE)`.
fn si_unit_length_factor(loader: &mut IfcLoader, unit_line: u32) -> Result<Option<f64>> {
    loader.move_to_argument(unit_line, 1)?;
    let unit_type = loader.get_enum_argument()?;

    loader.move_to_argument(unit_line, 2)?;
    let prefix = if loader.get_token_type()? == IfcTokenType::Enum {
        loader.reverse();
        loader.get_enum_argument()?
    } else {
        String::new()
    };

    loader.move_to_argument(unit_line, 3)?;
    let unit_name = loader.get_enum_argument()?;

    if unit_type == "LENGTHUNIT" && unit_name == "METRE" {
        Ok(Some(convert_prefix(&prefix)))
    } else {
        Ok(None)
    }
}
