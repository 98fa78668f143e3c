//! Positioned text-run extraction from page content streams.
//!
//! A deliberately small interpreter: it tracks the text matrix through
//! `BT`/`ET`, `Td`/`TD`/`Tm`/`T*` and emits one [`TextRun`] per show
//! operator (`Tj`, `TJ`, `'`, `"`). Glyph widths are estimated from the
//! font size, which is plenty for label proximity work; no font programs
//! are loaded.

use crate::document::Document;
use crate::error::Result;
use crate::lexer::{is_delimiter, is_whitespace, lex_token, skip_ws, Token};

/// A horizontal run of shown text with its estimated bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Decoded text
    pub text: String,
    /// Left edge in user space
    pub x: f32,
    /// Baseline in user space
    pub y: f32,
    /// Estimated width
    pub width: f32,
    /// Estimated height
    pub height: f32,
}

impl TextRun {
    /// Center point of the run's box.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Average glyph width as a fraction of the font size.
const GLYPH_WIDTH_FACTOR: f32 = 0.5;

/// Extract text runs from one page (zero-based index).
pub fn extract_text_runs(doc: &Document, page_index: usize) -> Result<Vec<TextRun>> {
    let content = doc.page_content(page_index)?;
    Ok(interpret(&content))
}

/// 2x3 text matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translated(self, tx: f32, ty: f32) -> Matrix {
        Matrix {
            e: tx * self.a + ty * self.c + self.e,
            f: tx * self.b + ty * self.d + self.f,
            ..self
        }
    }
}

/// One operand on the content stream stack.
#[derive(Debug, Clone)]
enum Operand {
    Number(f32),
    String(Vec<u8>),
    Array(Vec<Operand>),
    Other,
}

impl Operand {
    fn number(&self) -> Option<f32> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Run the interpreter over decoded content bytes.
fn interpret(content: &[u8]) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut input = content;

    let mut tm = Matrix::IDENTITY;
    let mut tlm = Matrix::IDENTITY;
    let mut font_size: f32 = 12.0;
    let mut leading: f32 = 0.0;
    let mut operands: Vec<Operand> = Vec::new();

    loop {
        input = skip_ws(input);
        if input.is_empty() {
            break;
        }
        let first = input[0];

        // Operand tokens reuse the object lexer
        if matches!(first, b'(' | b'<' | b'/' | b'[' | b'+' | b'-' | b'.' | b'0'..=b'9') {
            match lex_operand(input) {
                Some((rest, operand)) => {
                    operands.push(operand);
                    input = rest;
                    continue;
                },
                None => {
                    input = &input[1..];
                    continue;
                },
            }
        }

        // Operator word
        let end = input
            .iter()
            .position(|&b| is_whitespace(b) || is_delimiter(b))
            .unwrap_or(input.len())
            .max(1);
        let op = &input[..end];
        input = &input[end..];

        match op {
            b"BT" => {
                tm = Matrix::IDENTITY;
                tlm = Matrix::IDENTITY;
            },
            b"ET" => {},
            b"Tf" => {
                if let Some(size) = operands.last().and_then(Operand::number) {
                    font_size = size;
                }
            },
            b"TL" => {
                if let Some(l) = operands.last().and_then(Operand::number) {
                    leading = l;
                }
            },
            b"Td" | b"TD" => {
                let n = operands.len();
                if n >= 2 {
                    let tx = operands[n - 2].number().unwrap_or(0.0);
                    let ty = operands[n - 1].number().unwrap_or(0.0);
                    if op == b"TD" {
                        leading = -ty;
                    }
                    tlm = tlm.translated(tx, ty);
                    tm = tlm;
                }
            },
            b"Tm" => {
                let n = operands.len();
                if n >= 6 {
                    let get = |i: usize| operands[n - 6 + i].number().unwrap_or(0.0);
                    tlm = Matrix {
                        a: get(0),
                        b: get(1),
                        c: get(2),
                        d: get(3),
                        e: get(4),
                        f: get(5),
                    };
                    tm = tlm;
                }
            },
            b"T*" => {
                tlm = tlm.translated(0.0, -leading);
                tm = tlm;
            },
            b"Tj" => {
                if let Some(Operand::String(bytes)) = operands.last() {
                    emit(&mut runs, bytes, &mut tm, font_size);
                }
            },
            b"'" => {
                tlm = tlm.translated(0.0, -leading);
                tm = tlm;
                if let Some(Operand::String(bytes)) = operands.last() {
                    emit(&mut runs, bytes, &mut tm, font_size);
                }
            },
            b"\"" => {
                tlm = tlm.translated(0.0, -leading);
                tm = tlm;
                if let Some(Operand::String(bytes)) = operands.last() {
                    emit(&mut runs, bytes, &mut tm, font_size);
                }
            },
            b"TJ" => {
                if let Some(Operand::Array(items)) = operands.last() {
                    // One run per TJ array; kerning offsets are ignored
                    let mut text = Vec::new();
                    for item in items {
                        if let Operand::String(bytes) = item {
                            text.extend_from_slice(bytes);
                        }
                    }
                    emit(&mut runs, &text, &mut tm, font_size);
                }
            },
            b"BI" => {
                // Inline image: skip to EI so binary data never reaches the lexer
                if let Some(pos) = crate::parser::find_subsequence(input, b"EI") {
                    input = &input[pos + 2..];
                } else {
                    break;
                }
            },
            _ => {},
        }
        operands.clear();
    }

    runs
}

fn emit(runs: &mut Vec<TextRun>, bytes: &[u8], tm: &mut Matrix, font_size: f32) {
    let text: String = bytes.iter().map(|&b| b as char).collect();
    let trimmed = text.trim();
    let scale_x = (tm.a * tm.a + tm.b * tm.b).sqrt().max(f32::EPSILON);
    let scale_y = (tm.c * tm.c + tm.d * tm.d).sqrt().max(f32::EPSILON);
    let width = text.chars().count() as f32 * font_size * GLYPH_WIDTH_FACTOR * scale_x;
    if !trimmed.is_empty() {
        runs.push(TextRun {
            text: trimmed.to_string(),
            x: tm.e,
            y: tm.f,
            width,
            height: font_size * scale_y,
        });
    }
    // Pen advances even for whitespace-only shows
    *tm = tm.translated(width / scale_x, 0.0);
}

/// Lex one operand, mapping object tokens to the operand stack model.
fn lex_operand(input: &[u8]) -> Option<(&[u8], Operand)> {
    if input.first() == Some(&b'[') {
        let mut rest = &input[1..];
        let mut items = Vec::new();
        loop {
            rest = skip_ws(rest);
            if rest.first() == Some(&b']') {
                return Some((&rest[1..], Operand::Array(items)));
            }
            let (next, operand) = lex_operand(rest)?;
            items.push(operand);
            rest = next;
        }
    }
    match lex_token(input) {
        Ok((rest, token)) => {
            let operand = match token {
                Token::Integer(i) => Operand::Number(i as f32),
                Token::Real(r) => Operand::Number(r as f32),
                Token::String(s) => Operand::String(s),
                _ => Operand::Other,
            };
            Some((rest, operand))
        },
        Err(_) => None,
    }
}
