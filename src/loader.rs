// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model loader.
//!
//! One `IfcLoader` owns one open model: the token tape, the line indices
//! and the derived relationship maps. Reading is cursor arithmetic over the
//! tape; writing appends fresh tokens and repoints the line's index entry.
//! The loader is single-threaded per model; the schema table it shares is
//! read-only.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::meta_data::{IfcLine, IfcMetaData};
use crate::parser::Parser;
use crate::schema::{self, IfcSchema};
use crate::serializer;
use crate::tape::DynamicTape;
use crate::tokenizer::{skip_payload, IfcTokenType, Tokenizer};
use crate::units;

/// Loader configuration. Only the loader stores these; the geometry layer
/// consumes everything except the tape itself.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoaderSettings {
    pub coordinate_to_origin: bool,
    pub use_fast_bools: bool,
    pub dump_csg_meshes: bool,
    pub circle_segments_low: i32,
    pub circle_segments_medium: i32,
    pub circle_segments_high: i32,
    pub mesh_cache: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        LoaderSettings {
            coordinate_to_origin: false,
            use_fast_bools: false,
            dump_csg_meshes: false,
            circle_segments_low: 5,
            circle_segments_medium: 8,
            circle_segments_high: 12,
            mesh_cache: false,
        }
    }
}

/// One tagged argument value. Nested entity objects do not appear here;
/// flattening them to `Ref` handles is the caller's walk, which writes the
/// nested lines first and substitutes their handles.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IfcValue {
    Ref(u32),
    Real(f64),
    String(String),
    Label(u16),
    Enum(String),
    Empty,
    Unknown,
    Set(Vec<IfcValue>),
}

/// A line in decoded form: what `get_line` returns and `write_line` takes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawLineData {
    pub express_id: u32,
    pub ifc_type: u16,
    pub arguments: Vec<IfcValue>,
}

pub struct IfcLoader {
    settings: LoaderSettings,
    schema: Arc<IfcSchema>,
    tape: DynamicTape,
    meta: IfcMetaData,
}

impl IfcLoader {
    /// An empty model with an empty tape.
    pub fn new(settings: LoaderSettings, schema: Arc<IfcSchema>) -> Self {
        IfcLoader {
            settings,
            schema,
            tape: DynamicTape::new(),
            meta: IfcMetaData::new(),
        }
    }

    /// Parses raw STEP bytes into a fresh model. On error the partially
    /// built tape is dropped with the loader.
    pub fn open(content: &[u8], settings: LoaderSettings, schema: Arc<IfcSchema>) -> Result<Self> {
        let mut loader = Self::new(settings, schema);
        loader.load_file(content)?;
        Ok(loader)
    }

    fn load_file(&mut self, content: &[u8]) -> Result<()> {
        let num_lines = Tokenizer::new(content).tokenize(&mut self.tape)?;
        self.tape.move_to(0);
        Parser::new(&mut self.tape, &mut self.meta, self.schema.as_ref())
            .parse_tape(num_lines)?;

        self.populate_rel_voids();
        self.populate_rel_aggregates();
        self.populate_styled_items();
        self.populate_rel_materials();
        self.populate_material_definitions();
        let factor = units::read_linear_scaling_factor(self);
        self.meta.linear_scaling_factor = factor;

        debug!(
            num_lines,
            tape_bytes = self.tape.total_size(),
            skipped_rel_lines = self.meta.skipped_rel_lines,
            "model loaded"
        );
        Ok(())
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    pub fn schema(&self) -> &IfcSchema {
        self.schema.as_ref()
    }

    pub fn num_lines(&self) -> usize {
        self.meta.lines.len()
    }

    pub fn lines(&self) -> &[IfcLine] {
        &self.meta.lines
    }

    #[inline]
    pub fn line_id_of(&self, express_id: u32) -> Option<u32> {
        self.meta.line_id_of(express_id)
    }

    /// LineIDs of every line with the given type, in file order.
    pub fn line_ids_with_type(&self, ifc_type: u16) -> &[u32] {
        self.meta.line_ids_with_type(ifc_type)
    }

    /// Express IDs of every line with the given type, in file order.
    pub fn express_ids_with_type(&self, ifc_type: u16) -> Vec<u32> {
        self.meta.express_ids_with_type(ifc_type)
    }

    /// Every express ID, in LineID order.
    pub fn all_express_ids(&self) -> Vec<u32> {
        self.meta.lines.iter().map(|line| line.express_id).collect()
    }

    pub fn linear_scaling_factor(&self) -> f64 {
        self.meta.linear_scaling_factor
    }

    pub fn rel_voids(&self) -> &rustc_hash::FxHashMap<u32, Vec<u32>> {
        &self.meta.rel_voids
    }

    pub fn rel_aggregates(&self) -> &rustc_hash::FxHashMap<u32, Vec<u32>> {
        &self.meta.rel_aggregates
    }

    pub fn styled_items(&self) -> &rustc_hash::FxHashMap<u32, Vec<(u32, u32)>> {
        &self.meta.styled_items
    }

    pub fn rel_materials(&self) -> &rustc_hash::FxHashMap<u32, Vec<(u32, u32)>> {
        &self.meta.rel_materials
    }

    pub fn material_definitions(&self) -> &rustc_hash::FxHashMap<u32, Vec<(u32, u32)>> {
        &self.meta.material_definitions
    }

    /// Relationship lines the lenient post-passes skipped as malformed.
    pub fn skipped_rel_lines(&self) -> u32 {
        self.meta.skipped_rel_lines
    }

    /// Direct tape access for collaborators that stream token ranges out.
    pub fn tape_mut(&mut self) -> &mut DynamicTape {
        &mut self.tape
    }

    // ---- cursor primitives -------------------------------------------------

    /// Positions the cursor on the tag byte of argument `index` (0-based,
    /// top level) of a line.
    pub fn move_to_argument(&mut self, line_id: u32, index: u32) -> Result<()> {
        let line = self.meta.lines[line_id as usize];
        self.tape.move_to(line.tape_offset);
        self.expect_token(IfcTokenType::SetBegin)?;

        let mut depth = 1u32;
        let mut moved = 0u32;
        loop {
            let offset = self.tape.read_offset();
            let token = self.read_token()?;
            match token {
                IfcTokenType::SetEnd => {
                    depth -= 1;
                    if depth == 0 {
                        return Err(Error::ArgumentOutOfRange {
                            express_id: line.express_id,
                            index,
                        });
                    }
                }
                IfcTokenType::SetBegin => {
                    if depth == 1 {
                        if moved == index {
                            self.tape.move_to(offset);
                            return Ok(());
                        }
                        moved += 1;
                    }
                    depth += 1;
                }
                IfcTokenType::LineEnd => {
                    return Err(Error::parse(offset, "truncated line"));
                }
                other => {
                    if depth == 1 {
                        if moved == index {
                            self.tape.move_to(offset);
                            return Ok(());
                        }
                        moved += 1;
                    }
                    skip_payload(&mut self.tape, other);
                }
            }
        }
    }

    /// Reads and returns the next token tag, advancing past it. Pair with
    /// [`reverse`](Self::reverse) to peek.
    pub fn get_token_type(&mut self) -> Result<IfcTokenType> {
        self.read_token()
    }

    /// Backs the cursor up by one token tag.
    pub fn reverse(&mut self) {
        self.tape.reverse();
    }

    pub fn get_string_argument(&mut self) -> Result<String> {
        self.expect_token(IfcTokenType::String)?;
        Ok(String::from_utf8_lossy(self.tape.read_string_view()).into_owned())
    }

    pub fn get_enum_argument(&mut self) -> Result<String> {
        self.expect_token(IfcTokenType::Enum)?;
        Ok(String::from_utf8_lossy(self.tape.read_string_view()).into_owned())
    }

    pub fn get_double_argument(&mut self) -> Result<f64> {
        self.expect_token(IfcTokenType::Real)?;
        Ok(self.tape.read_f64())
    }

    pub fn get_double_argument_at(&mut self, offset: u64) -> Result<f64> {
        self.tape.move_to(offset);
        self.get_double_argument()
    }

    pub fn get_ref_argument(&mut self) -> Result<u32> {
        self.expect_token(IfcTokenType::Ref)?;
        Ok(self.tape.read_u32())
    }

    pub fn get_ref_argument_at(&mut self, offset: u64) -> Result<u32> {
        self.tape.move_to(offset);
        self.get_ref_argument()
    }

    /// Reads a set argument and returns the tape offset of each top-level
    /// element token, skipping nested sets whole. The offsets feed the
    /// `*_at` accessors; this is the random-access primitive for nested
    /// IFC lists.
    pub fn get_set_argument(&mut self) -> Result<Vec<u64>> {
        self.expect_token(IfcTokenType::SetBegin)?;
        let mut offsets = Vec::new();
        let mut depth = 1u32;
        while depth > 0 {
            let offset = self.tape.read_offset();
            let token = self.read_token()?;
            match token {
                IfcTokenType::SetBegin => depth += 1,
                IfcTokenType::SetEnd => depth -= 1,
                IfcTokenType::LineEnd => {
                    return Err(Error::parse(offset, "unterminated set"));
                }
                other => {
                    if depth == 1 {
                        offsets.push(offset);
                    }
                    skip_payload(&mut self.tape, other);
                }
            }
        }
        Ok(offsets)
    }

    // ---- line-level read/write ---------------------------------------------

    /// Decodes one line into a [`RawLineData`] record.
    pub fn get_line(&mut self, express_id: u32) -> Result<RawLineData> {
        let line_id = self
            .meta
            .line_id_of(express_id)
            .ok_or(Error::UnknownLine(express_id))?;
        let line = self.meta.lines[line_id as usize];
        self.tape.move_to(line.tape_offset);
        self.expect_token(IfcTokenType::SetBegin)?;
        let arguments = self.read_value_list()?;
        Ok(RawLineData {
            express_id,
            ifc_type: line.ifc_type,
            arguments,
        })
    }

    /// Writes a line record. A new express ID is appended to the line table
    /// and the type index; an existing one is repointed at the fresh tape
    /// bytes, stranding the old ones (the tape never compacts).
    pub fn write_line(&mut self, raw: &RawLineData) -> Result<()> {
        self.write_raw_line(raw.express_id, raw.ifc_type, &raw.arguments)
    }

    pub fn write_raw_line(
        &mut self,
        express_id: u32,
        ifc_type: u16,
        arguments: &[IfcValue],
    ) -> Result<()> {
        let name = self
            .schema
            .name_of(ifc_type)
            .ok_or(Error::UnknownType(ifc_type))?
            .to_owned();

        // An error mid-emission strands the bytes written so far; they are
        // unreachable garbage, same as any overwritten line.
        let start = self.tape.total_size();
        self.tape.push_byte(IfcTokenType::Ref as u8);
        self.tape.push_u32(express_id);
        self.emit_text(IfcTokenType::Label, name.as_bytes())?;

        let tape_offset = self.tape.total_size();
        self.tape.push_byte(IfcTokenType::SetBegin as u8);
        for value in arguments {
            self.write_value(value)?;
        }
        self.tape.push_byte(IfcTokenType::SetEnd as u8);
        self.tape.push_byte(IfcTokenType::LineEnd as u8);
        let tape_end = self.tape.total_size();

        self.meta
            .update_line_tape(express_id, ifc_type, start, tape_offset, tape_end);
        Ok(())
    }

    /// Bulk-copies one line's token range out of the tape, for cloning
    /// into another model.
    pub fn copy_line_tape(&self, express_id: u32) -> Result<Vec<u8>> {
        let line_id = self
            .meta
            .line_id_of(express_id)
            .ok_or(Error::UnknownLine(express_id))?;
        let line = self.meta.lines[line_id as usize];
        Ok(self.tape.copy_range(line.start, line.tape_end))
    }

    /// Re-serializes the whole model to STEP text.
    pub fn dump_as_ifc(&mut self) -> String {
        serializer::dump_as_ifc(&mut self.tape, &self.meta)
    }

    // ---- internals ---------------------------------------------------------

    fn read_token(&mut self) -> Result<IfcTokenType> {
        let offset = self.tape.read_offset();
        IfcTokenType::from_byte(self.tape.read_u8())
            .ok_or_else(|| Error::parse(offset, "corrupt token tag"))
    }

    fn expect_token(&mut self, expected: IfcTokenType) -> Result<()> {
        let found = self.read_token()?;
        if found != expected {
            return Err(Error::WrongTag { expected, found });
        }
        Ok(())
    }

    fn read_value_list(&mut self) -> Result<Vec<IfcValue>> {
        let mut values = Vec::new();
        loop {
            let token = self.read_token()?;
            if token == IfcTokenType::SetEnd {
                return Ok(values);
            }
            self.tape.reverse();
            values.push(self.read_value()?);
        }
    }

    fn read_value(&mut self) -> Result<IfcValue> {
        let offset = self.tape.read_offset();
        let token = self.read_token()?;
        match token {
            IfcTokenType::Ref => Ok(IfcValue::Ref(self.tape.read_u32())),
            IfcTokenType::Real => Ok(IfcValue::Real(self.tape.read_f64())),
            IfcTokenType::String => Ok(IfcValue::String(
                String::from_utf8_lossy(self.tape.read_string_view()).into_owned(),
            )),
            IfcTokenType::Enum => Ok(IfcValue::Enum(
                String::from_utf8_lossy(self.tape.read_string_view()).into_owned(),
            )),
            IfcTokenType::Label => {
                let label = self.tape.read_string_view().to_vec();
                Ok(IfcValue::Label(self.schema.code_of(&label)))
            }
            IfcTokenType::Empty => Ok(IfcValue::Empty),
            IfcTokenType::Unknown => Ok(IfcValue::Unknown),
            IfcTokenType::SetBegin => Ok(IfcValue::Set(self.read_value_list()?)),
            IfcTokenType::SetEnd | IfcTokenType::LineEnd => {
                Err(Error::parse(offset, "unexpected token in argument list"))
            }
        }
    }

    fn write_value(&mut self, value: &IfcValue) -> Result<()> {
        match value {
            IfcValue::Ref(id) => {
                self.tape.push_byte(IfcTokenType::Ref as u8);
                self.tape.push_u32(*id);
            }
            IfcValue::Real(v) => {
                self.tape.push_byte(IfcTokenType::Real as u8);
                self.tape.push_f64(*v);
            }
            IfcValue::String(text) => {
                self.emit_text(IfcTokenType::String, text.as_bytes())?;
            }
            IfcValue::Enum(name) => {
                self.emit_text(IfcTokenType::Enum, name.as_bytes())?;
            }
            IfcValue::Label(code) => {
                let name = self
                    .schema
                    .name_of(*code)
                    .ok_or(Error::UnknownType(*code))?
                    .to_owned();
                self.emit_text(IfcTokenType::Label, name.as_bytes())?;
            }
            IfcValue::Empty => self.tape.push_byte(IfcTokenType::Empty as u8),
            IfcValue::Unknown => self.tape.push_byte(IfcTokenType::Unknown as u8),
            IfcValue::Set(items) => {
                self.tape.push_byte(IfcTokenType::SetBegin as u8);
                for item in items {
                    self.write_value(item)?;
                }
                self.tape.push_byte(IfcTokenType::SetEnd as u8);
            }
        }
        Ok(())
    }

    fn emit_text(&mut self, tag: IfcTokenType, text: &[u8]) -> Result<()> {
        if text.len() > u8::MAX as usize {
            return Err(Error::TokenTooLong {
                offset: self.tape.total_size(),
            });
        }
        self.tape.push_byte(tag as u8);
        self.tape.push_byte(text.len() as u8);
        self.tape.push(text);
        Ok(())
    }

    // ---- relationship post-passes ------------------------------------------
    //
    // Real-world files routinely violate minor schema expectations, so the
    // passes are lenient: a line whose expected argument carries the wrong
    // tag is skipped and counted, never fatal.

    fn populate_rel_voids(&mut self) {
        for express_id in self.express_ids_with_type(schema::IFCRELVOIDSELEMENT) {
            if self.rel_voids_line(express_id).is_err() {
                self.skip_rel_line(express_id);
            }
        }
    }

    fn rel_voids_line(&mut self, express_id: u32) -> Result<()> {
        let line_id = self.line_id_of(express_id).ok_or(Error::UnknownLine(express_id))?;
        self.move_to_argument(line_id, 4)?;
        let building_element = self.get_ref_argument()?;
        let opening = self.get_ref_argument()?;
        self.meta
            .rel_voids
            .entry(building_element)
            .or_default()
            .push(opening);
        Ok(())
    }

    fn populate_rel_aggregates(&mut self) {
        for express_id in self.express_ids_with_type(schema::IFCRELAGGREGATES) {
            if self.rel_aggregates_line(express_id).is_err() {
                self.skip_rel_line(express_id);
            }
        }
    }

    fn rel_aggregates_line(&mut self, express_id: u32) -> Result<()> {
        let line_id = self.line_id_of(express_id).ok_or(Error::UnknownLine(express_id))?;
        self.move_to_argument(line_id, 4)?;
        let parent = self.get_ref_argument()?;
        let children = self.get_set_argument()?;
        for offset in children {
            let child = self.get_ref_argument_at(offset)?;
            self.meta
                .rel_aggregates
                .entry(parent)
                .or_default()
                .push(child);
        }
        Ok(())
    }

    fn populate_styled_items(&mut self) {
        for express_id in self.express_ids_with_type(schema::IFCSTYLEDITEM) {
            if self.styled_item_line(express_id).is_err() {
                self.skip_rel_line(express_id);
            }
        }
    }

    fn styled_item_line(&mut self, express_id: u32) -> Result<()> {
        let line_id = self.line_id_of(express_id).ok_or(Error::UnknownLine(express_id))?;
        self.move_to_argument(line_id, 0)?;
        let token = self.get_token_type()?;
        if token != IfcTokenType::Ref {
            // unstyled item reference ($) carries nothing to index
            return Err(Error::WrongTag {
                expected: IfcTokenType::Ref,
                found: token,
            });
        }
        self.reverse();
        let item = self.get_ref_argument()?;

        self.move_to_argument(line_id, 1)?;
        let assignments = self.get_set_argument()?;
        for offset in assignments {
            let assignment = self.get_ref_argument_at(offset)?;
            self.meta
                .styled_items
                .entry(item)
                .or_default()
                .push((express_id, assignment));
        }
        Ok(())
    }

    fn populate_rel_materials(&mut self) {
        for express_id in self.express_ids_with_type(schema::IFCRELASSOCIATESMATERIAL) {
            if self.rel_materials_line(express_id).is_err() {
                self.skip_rel_line(express_id);
            }
        }
    }

    fn rel_materials_line(&mut self, express_id: u32) -> Result<()> {
        let line_id = self.line_id_of(express_id).ok_or(Error::UnknownLine(express_id))?;
        self.move_to_argument(line_id, 5)?;
        let material = self.get_ref_argument()?;

        self.move_to_argument(line_id, 4)?;
        let objects = self.get_set_argument()?;
        for offset in objects {
            let object = self.get_ref_argument_at(offset)?;
            self.meta
                .rel_materials
                .entry(object)
                .or_default()
                .push((express_id, material));
        }
        Ok(())
    }

    fn populate_material_definitions(&mut self) {
        for express_id in self.express_ids_with_type(schema::IFCMATERIALDEFINITIONREPRESENTATION) {
            if self.material_definition_line(express_id).is_err() {
                self.skip_rel_line(express_id);
            }
        }
    }

    fn material_definition_line(&mut self, express_id: u32) -> Result<()> {
        let line_id = self.line_id_of(express_id).ok_or(Error::UnknownLine(express_id))?;
        self.move_to_argument(line_id, 2)?;
        let representations = self.get_set_argument()?;

        self.move_to_argument(line_id, 3)?;
        let material = self.get_ref_argument()?;
        for offset in representations {
            let representation = self.get_ref_argument_at(offset)?;
            self.meta
                .material_definitions
                .entry(material)
                .or_default()
                .push((express_id, representation));
        }
        Ok(())
    }

    fn skip_rel_line(&mut self, express_id: u32) {
        self.meta.skipped_rel_lines += 1;
        trace!(express_id, "skipped malformed relationship line");
    }
}
