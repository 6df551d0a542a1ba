//! Tape parser.
//!
//! Walks a freshly tokenized tape, discovers line boundaries and populates
//! the metadata indices. The tokenizer guarantees each line is the token
//! sequence `REF LABEL SET_BEGIN … LINE_END`; the parser validates the
//! shape, balances the sets and records the three offsets every later
//! cursor operation anchors on.

use crate::error::{Error, Result};
use crate::meta_data::IfcMetaData;
use crate::schema::IfcSchema;
use crate::tape::DynamicTape;
use crate::tokenizer::{skip_payload, IfcTokenType};

pub struct Parser<'a> {
    tape: &'a mut DynamicTape,
    meta: &'a mut IfcMetaData,
    schema: &'a IfcSchema,
}

impl<'a> Parser<'a> {
    pub fn new(tape: &'a mut DynamicTape, meta: &'a mut IfcMetaData, schema: &'a IfcSchema) -> Self {
        Parser { tape, meta, schema }
    }

    /// Indexes `num_lines` lines starting at the current cursor.
    pub fn parse_tape(&mut self, num_lines: u32) -> Result<()> {
        let mut parsed = 0;
        while parsed < num_lines && !self.tape.at_end() {
            self.parse_line()?;
            parsed += 1;
        }
        Ok(())
    }

    fn parse_line(&mut self) -> Result<()> {
        let start = self.tape.read_offset();

        self.expect(IfcTokenType::Ref)?;
        let express_id = self.tape.read_u32();

        self.expect(IfcTokenType::Label)?;
        let label = self.tape.read_string_view().to_vec();
        let ifc_type = self.schema.code_of(&label);

        let tape_offset = self.tape.read_offset();
        self.expect(IfcTokenType::SetBegin)?;

        let mut depth = 1u32;
        while depth > 0 {
            let token_offset = self.tape.read_offset();
            let token = self.read_token(token_offset)?;
            match token {
                IfcTokenType::SetBegin => depth += 1,
                IfcTokenType::SetEnd => depth -= 1,
                IfcTokenType::LineEnd => {
                    return Err(Error::parse(token_offset, "unbalanced set"));
                }
                other => skip_payload(self.tape, other),
            }
        }

        let line_end_offset = self.tape.read_offset();
        let token = self.read_token(line_end_offset)?;
        if token != IfcTokenType::LineEnd {
            return Err(Error::parse(line_end_offset, "expected end of line"));
        }
        let tape_end = self.tape.read_offset();

        self.meta
            .update_line_tape(express_id, ifc_type, start, tape_offset, tape_end);
        Ok(())
    }

    fn read_token(&mut self, offset: u64) -> Result<IfcTokenType> {
        IfcTokenType::from_byte(self.tape.read_u8())
            .ok_or_else(|| Error::parse(offset, "corrupt token tag"))
    }

    fn expect(&mut self, expected: IfcTokenType) -> Result<()> {
        let offset = self.tape.read_offset();
        let found = self.read_token(offset)?;
        if found != expected {
            return Err(Error::WrongTag { expected, found });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn parse(content: &str) -> Result<(DynamicTape, IfcMetaData)> {
        let mut tape = DynamicTape::new();
        let num_lines = Tokenizer::new(content.as_bytes()).tokenize(&mut tape)?;
        tape.move_to(0);
        let mut meta = IfcMetaData::new();
        let schema = IfcSchema::new();
        Parser::new(&mut tape, &mut meta, &schema).parse_tape(num_lines)?;
        Ok((tape, meta))
    }

    #[test]
    fn test_lines_are_indexed_in_file_order() {
        let (_, meta) = parse(
            "#1=IFCWALL('a',$);\n#5=IFCDOOR('b',$);\n#3=IFCWALL('c',$);\n",
        )
        .unwrap();
        assert_eq!(meta.lines.len(), 3);
        assert_eq!(meta.express_ids_with_type(crate::schema::IFCWALL), vec![1, 3]);
        assert_eq!(meta.express_ids_with_type(crate::schema::IFCDOOR), vec![5]);
        assert_eq!(meta.line_id_of(5), Some(1));
    }

    #[test]
    fn test_line_offsets_bracket_the_argument_list() {
        let (mut tape, meta) = parse("#1=IFCWALL(('x'),$);").unwrap();
        let line = meta.lines[0];
        assert!(line.start < line.tape_offset);
        assert!(line.tape_offset < line.tape_end);

        tape.move_to(line.tape_offset);
        assert_eq!(
            IfcTokenType::from_byte(tape.read_u8()),
            Some(IfcTokenType::SetBegin)
        );
        tape.move_to(line.tape_end - 1);
        assert_eq!(
            IfcTokenType::from_byte(tape.read_u8()),
            Some(IfcTokenType::LineEnd)
        );
    }

    #[test]
    fn test_unknown_label_gets_sentinel_type() {
        let (_, meta) = parse("#1=IFCFLUXCAPACITOR($);").unwrap();
        assert_eq!(meta.lines[0].ifc_type, 0);
        assert_eq!(meta.line_id_of(1), Some(0));
    }

    #[test]
    fn test_unbalanced_set_reports_semicolon_offset() {
        let err = parse("#1=X((1,2);").unwrap_err();
        match err {
            Error::Parse { offset, .. } => {
                // REF(5) LABEL(3) SET_BEGIN SET_BEGIN REAL(9) REAL(9) SET_END
                // put the LINE_END tag at byte 29
                assert_eq!(offset, 29);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
