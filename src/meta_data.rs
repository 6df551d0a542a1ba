// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Index structures for one open model: the line table, the handle and
//! type indices, and the relationship maps the post-passes populate.

use rustc_hash::FxHashMap;

/// One `#N = TYPE(args…);` statement, located on the tape.
///
/// `tape_offset` points at the `SET_BEGIN` of the outermost argument list;
/// `start` points at the leading `REF` token (what the serializer walks
/// from); `tape_end` is one past the line's `LINE_END`.
#[derive(Debug, Clone, Copy)]
pub struct IfcLine {
    pub express_id: u32,
    pub line_index: u32,
    pub ifc_type: u16,
    pub start: u64,
    pub tape_offset: u64,
    pub tape_end: u64,
}

/// Line records plus every inverted index derived from them.
#[derive(Debug, Default)]
pub struct IfcMetaData {
    pub lines: Vec<IfcLine>,
    pub express_id_to_line: FxHashMap<u32, u32>,
    pub ifc_type_to_line_id: FxHashMap<u16, Vec<u32>>,

    pub rel_voids: FxHashMap<u32, Vec<u32>>,
    pub rel_aggregates: FxHashMap<u32, Vec<u32>>,
    pub styled_items: FxHashMap<u32, Vec<(u32, u32)>>,
    pub rel_materials: FxHashMap<u32, Vec<(u32, u32)>>,
    pub material_definitions: FxHashMap<u32, Vec<(u32, u32)>>,

    /// Multiplier converting model length units to metres.
    pub linear_scaling_factor: f64,
    /// Relationship lines the lenient post-passes skipped as malformed.
    pub skipped_rel_lines: u32,
}

impl IfcMetaData {
    pub fn new() -> Self {
        IfcMetaData {
            linear_scaling_factor: 1.0,
            ..Default::default()
        }
    }

    #[inline]
    pub fn line_id_of(&self, express_id: u32) -> Option<u32> {
        self.express_id_to_line.get(&express_id).copied()
    }

    #[inline]
    pub fn line_ids_with_type(&self, ifc_type: u16) -> &[u32] {
        self.ifc_type_to_line_id
            .get(&ifc_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn express_ids_with_type(&self, ifc_type: u16) -> Vec<u32> {
        self.line_ids_with_type(ifc_type)
            .iter()
            .map(|&line_id| self.lines[line_id as usize].express_id)
            .collect()
    }

    /// Points a line record at freshly written tape bytes. A new express ID
    /// gets a new record and a type-index entry; an existing one has only
    /// its offsets rewritten — the old tape bytes become garbage, the tape
    /// never compacts during a session.
    pub fn update_line_tape(
        &mut self,
        express_id: u32,
        ifc_type: u16,
        start: u64,
        tape_offset: u64,
        tape_end: u64,
    ) {
        match self.express_id_to_line.get(&express_id) {
            Some(&line_id) => {
                let line = &mut self.lines[line_id as usize];
                line.start = start;
                line.tape_offset = tape_offset;
                line.tape_end = tape_end;
            }
            None => {
                let line_id = self.lines.len() as u32;
                self.lines.push(IfcLine {
                    express_id,
                    line_index: line_id,
                    ifc_type,
                    start,
                    tape_offset,
                    tape_end,
                });
                self.express_id_to_line.insert(express_id, line_id);
                self.ifc_type_to_line_id
                    .entry(ifc_type)
                    .or_default()
                    .push(line_id);
            }
        }
    }
}
