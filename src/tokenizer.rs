// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP tokenizer.
//!
//! Streams raw STEP text through a byte classifier and emits prefix-typed
//! tokens onto the tape. Outside of `#N = …;` lines everything is skipped
//! (header section, `DATA;`/`ENDSEC;` markers, comments), with quoted
//! strings consumed string-aware so a `#` inside header text cannot start
//! a phantom line.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, digit1},
    combinator::map_res,
    sequence::{delimited, preceded},
    IResult,
};

use crate::error::{Error, Result};
use crate::tape::DynamicTape;

/// Token tag bytes on the tape. Each token is a tag followed by a
/// tag-specific payload.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfcTokenType {
    /// `*` — inherited value, no payload
    Unknown = 0,
    /// quoted string literal, `u8` length + unescaped bytes
    String = 1,
    /// entity class name, `u8` length + bytes
    Label = 2,
    /// `.NAME.` literal, `u8` length + bytes
    Enum = 3,
    /// numeric literal, `f64` payload
    Real = 4,
    /// `#N` handle, `u32` payload
    Ref = 5,
    /// `$` — unset, no payload
    Empty = 6,
    /// `(`
    SetBegin = 7,
    /// `)`
    SetEnd = 8,
    /// `;`
    LineEnd = 9,
}

impl IfcTokenType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Unknown),
            1 => Some(Self::String),
            2 => Some(Self::Label),
            3 => Some(Self::Enum),
            4 => Some(Self::Real),
            5 => Some(Self::Ref),
            6 => Some(Self::Empty),
            7 => Some(Self::SetBegin),
            8 => Some(Self::SetEnd),
            9 => Some(Self::LineEnd),
            _ => None,
        }
    }
}

/// Advances the tape cursor past the payload of a just-read token tag.
pub(crate) fn skip_payload(tape: &mut DynamicTape, token: IfcTokenType) {
    match token {
        IfcTokenType::String | IfcTokenType::Label | IfcTokenType::Enum => {
            let len = tape.read_u8() as usize;
            tape.advance(len);
        }
        IfcTokenType::Ref => {
            tape.advance(4);
        }
        IfcTokenType::Real => {
            tape.advance(8);
        }
        _ => {}
    }
}

/// Parse entity reference: #123
fn entity_ref(input: &[u8]) -> IResult<&[u8], u32> {
    preceded(
        char('#'),
        map_res(digit1, |digits: &[u8]| {
            std::str::from_utf8(digits)
                .map_err(|_| ())
                .and_then(|s| s.parse::<u32>().map_err(|_| ()))
        }),
    )(input)
}

/// Parse enum literal: .LENGTHUNIT., .T.
fn enum_literal(input: &[u8]) -> IResult<&[u8], &[u8]> {
    delimited(
        char('.'),
        take_while1(|b: u8| b.is_ascii_alphanumeric() || b == b'_'),
        char('.'),
    )(input)
}

/// Parse entity class name: IFCWALL (greedy A-Z, 0-9, `_`)
fn label(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(|b: u8| b.is_ascii_alphanumeric() || b == b'_')(input)
}

/// Parse string body up to the closing quote; a doubled `''` is a literal
/// quote and does not terminate. Returns the raw span, quotes still doubled.
fn string_body(input: &[u8]) -> Option<(usize, &[u8])> {
    let mut i = 0;
    loop {
        let quote = i + memchr::memchr(b'\'', &input[i..])?;
        if input.get(quote + 1) == Some(&b'\'') {
            i = quote + 2;
            continue;
        }
        return Some((quote + 1, &input[..quote]));
    }
}

/// Tokenizes one STEP document into a tape.
pub struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer { input, pos: 0 }
    }

    /// Runs the whole input through the classifier, appending tokens to
    /// `tape`. Returns the number of lines found.
    pub fn tokenize(&mut self, tape: &mut DynamicTape) -> Result<u32> {
        let mut lines = 0u32;
        while self.seek_line_start()? {
            self.emit_ref(tape)?;
            self.tokenize_line(tape)?;
            lines += 1;
        }
        Ok(lines)
    }

    /// Top-level scan: skips whitespace, comments, header strings and bare
    /// section keywords until the `#` that starts the next line. Returns
    /// false at end of input.
    fn seek_line_start(&mut self) -> Result<bool> {
        while self.pos < self.input.len() {
            match self.input[self.pos] {
                b'#' => return Ok(true),
                b'\'' => self.skip_string()?,
                b'/' if self.input.get(self.pos + 1) == Some(&b'*') => self.skip_comment()?,
                _ => self.pos += 1,
            }
        }
        Ok(false)
    }

    /// Tokenizes one line body after its leading `#N`, through the `;`.
    fn tokenize_line(&mut self, tape: &mut DynamicTape) -> Result<()> {
        loop {
            let Some(&byte) = self.input.get(self.pos) else {
                return Err(Error::parse(self.pos as u64, "unterminated line"));
            };
            match byte {
                b if b.is_ascii_whitespace() => self.pos += 1,
                b'/' if self.input.get(self.pos + 1) == Some(&b'*') => self.skip_comment()?,
                b'=' => self.pos += 1,
                b'#' => self.emit_ref(tape)?,
                b'\'' => self.emit_string(tape)?,
                b'(' => {
                    tape.push_byte(IfcTokenType::SetBegin as u8);
                    self.pos += 1;
                }
                b')' => {
                    tape.push_byte(IfcTokenType::SetEnd as u8);
                    self.pos += 1;
                }
                b'$' => {
                    tape.push_byte(IfcTokenType::Empty as u8);
                    self.pos += 1;
                }
                b'*' => {
                    tape.push_byte(IfcTokenType::Unknown as u8);
                    self.pos += 1;
                }
                b';' => {
                    tape.push_byte(IfcTokenType::LineEnd as u8);
                    self.pos += 1;
                    return Ok(());
                }
                b',' => self.pos += 1,
                b'.' => {
                    // `.5` is a real, `.T.` is an enum
                    if self
                        .input
                        .get(self.pos + 1)
                        .is_some_and(|b| b.is_ascii_digit())
                    {
                        self.emit_real(tape)?;
                    } else {
                        self.emit_enum(tape)?;
                    }
                }
                b if b.is_ascii_digit() || b == b'+' || b == b'-' => self.emit_real(tape)?,
                b if b.is_ascii_alphabetic() => self.emit_label(tape)?,
                _ => {
                    return Err(Error::parse(
                        self.pos as u64,
                        format!("unexpected byte {:#04x}", byte),
                    ));
                }
            }
        }
    }

    fn emit_ref(&mut self, tape: &mut DynamicTape) -> Result<()> {
        let rest = &self.input[self.pos..];
        let (remaining, id) = entity_ref(rest)
            .map_err(|_| Error::parse(self.pos as u64, "malformed entity reference"))?;
        self.pos += rest.len() - remaining.len();
        tape.push_byte(IfcTokenType::Ref as u8);
        tape.push_u32(id);
        Ok(())
    }

    fn emit_real(&mut self, tape: &mut DynamicTape) -> Result<()> {
        match fast_float::parse_partial::<f64, _>(&self.input[self.pos..]) {
            Ok((value, consumed)) if consumed > 0 => {
                self.pos += consumed;
                tape.push_byte(IfcTokenType::Real as u8);
                tape.push_f64(value);
                Ok(())
            }
            _ => Err(Error::parse(self.pos as u64, "malformed numeric literal")),
        }
    }

    fn emit_enum(&mut self, tape: &mut DynamicTape) -> Result<()> {
        let rest = &self.input[self.pos..];
        let (remaining, name) = enum_literal(rest)
            .map_err(|_| Error::parse(self.pos as u64, "unterminated enum literal"))?;
        self.emit_text(tape, IfcTokenType::Enum, name)?;
        self.pos += rest.len() - remaining.len();
        Ok(())
    }

    fn emit_label(&mut self, tape: &mut DynamicTape) -> Result<()> {
        let rest = &self.input[self.pos..];
        let (remaining, name) = label(rest)
            .map_err(|_| Error::parse(self.pos as u64, "malformed entity label"))?;
        let upper: Vec<u8> = name.iter().map(|b| b.to_ascii_uppercase()).collect();
        self.emit_text(tape, IfcTokenType::Label, &upper)?;
        self.pos += rest.len() - remaining.len();
        Ok(())
    }

    fn emit_string(&mut self, tape: &mut DynamicTape) -> Result<()> {
        let body_start = self.pos + 1;
        let Some((consumed, raw)) = string_body(&self.input[body_start..]) else {
            return Err(Error::parse(self.pos as u64, "unterminated string"));
        };
        if memchr::memmem::find(raw, b"''").is_some() {
            let mut unescaped = Vec::with_capacity(raw.len());
            let mut i = 0;
            while i < raw.len() {
                unescaped.push(raw[i]);
                if raw[i] == b'\'' {
                    i += 1; // second quote of the pair
                }
                i += 1;
            }
            self.emit_text(tape, IfcTokenType::String, &unescaped)?;
        } else {
            self.emit_text(tape, IfcTokenType::String, raw)?;
        }
        self.pos = body_start + consumed;
        Ok(())
    }

    fn emit_text(&mut self, tape: &mut DynamicTape, tag: IfcTokenType, text: &[u8]) -> Result<()> {
        if text.len() > u8::MAX as usize {
            return Err(Error::TokenTooLong {
                offset: self.pos as u64,
            });
        }
        tape.push_byte(tag as u8);
        tape.push_byte(text.len() as u8);
        tape.push(text);
        Ok(())
    }

    fn skip_string(&mut self) -> Result<()> {
        let body_start = self.pos + 1;
        match string_body(&self.input[body_start..]) {
            Some((consumed, _)) => {
                self.pos = body_start + consumed;
                Ok(())
            }
            None => Err(Error::parse(self.pos as u64, "unterminated string")),
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        match memchr::memmem::find(&self.input[self.pos + 2..], b"*/") {
            Some(end) => {
                self.pos += 2 + end + 2;
                Ok(())
            }
            None => Err(Error::parse(self.pos as u64, "unterminated comment")),
        }
    }
}
