// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP serializer — the tokenizer in reverse.
//!
//! Walks the tape line by line and transcribes tokens back to STEP text
//! under a fixed header stub. Reals print as the shortest decimal that
//! round-trips; embedded quotes in strings are re-doubled. Infallible
//! given a consistent tape.

use std::fmt::Write;

use crate::meta_data::IfcMetaData;
use crate::tape::DynamicTape;
use crate::tokenizer::IfcTokenType;

const HEADER: &str = "ISO-10303-21;\n\
HEADER;\n\
FILE_DESCRIPTION(('no description'), '2;1');\n\
FILE_NAME('no name', '', (''), (''), 'ifc-tape-export');\n\
FILE_SCHEMA(('IFC2X3'));\n\
ENDSEC;\n\
DATA;\n";

const FOOTER: &str = "ENDSEC;\nEND-ISO-10303-21;";

/// Serializes every line, in LineID order, to STEP text.
pub fn dump_as_ifc(tape: &mut DynamicTape, meta: &IfcMetaData) -> String {
    let mut out = String::with_capacity(HEADER.len() + FOOTER.len() + meta.lines.len() * 64);
    out.push_str(HEADER);

    for line in &meta.lines {
        tape.move_to(line.start);
        let mut new_line = true;
        let mut inside_set = false;
        let mut prev = IfcTokenType::Empty;

        while !tape.at_end() {
            let token = IfcTokenType::from_byte(tape.read_u8())
                .expect("tape holds a valid token stream");

            if token != IfcTokenType::SetEnd
                && token != IfcTokenType::LineEnd
                && inside_set
                && prev != IfcTokenType::SetBegin
                && prev != IfcTokenType::Label
            {
                out.push(',');
            }

            match token {
                IfcTokenType::LineEnd => {
                    out.push_str(";\n");
                    break;
                }
                IfcTokenType::Unknown => out.push('*'),
                IfcTokenType::Empty => out.push('$'),
                IfcTokenType::SetBegin => {
                    out.push('(');
                    inside_set = true;
                }
                IfcTokenType::SetEnd => out.push(')'),
                IfcTokenType::String => {
                    out.push('\'');
                    for c in String::from_utf8_lossy(tape.read_string_view()).chars() {
                        out.push(c);
                        if c == '\'' {
                            out.push('\'');
                        }
                    }
                    out.push('\'');
                }
                IfcTokenType::Enum => {
                    out.push('.');
                    out.push_str(&String::from_utf8_lossy(tape.read_string_view()));
                    out.push('.');
                }
                IfcTokenType::Label => {
                    out.push_str(&String::from_utf8_lossy(tape.read_string_view()));
                }
                IfcTokenType::Ref => {
                    let id = tape.read_u32();
                    let _ = write!(out, "#{id}");
                    if new_line {
                        out.push('=');
                    }
                }
                IfcTokenType::Real => {
                    let value = tape.read_f64();
                    let _ = write!(out, "{value}");
                }
            }

            new_line = false;
            prev = token;
        }
    }

    out.push_str(FOOTER);
    out
}
