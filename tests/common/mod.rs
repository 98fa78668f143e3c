#![allow(dead_code)] // each test binary uses a different subset

//! Synthetic AcroForm builder for integration tests.
//!
//! Produces small but structurally complete PDFs: catalog, page tree,
//! content stream with positioned labels, AcroForm field tree with
//! text fields, checkboxes and dual-hierarchy radio groups, and a
//! conventional cross-reference table.

/// One field to place in the synthetic form.
#[derive(Debug, Clone)]
pub enum FieldSpec {
    /// Merged text field/widget
    Text {
        /// `/T` title
        title: String,
        /// `/Rect`
        rect: [i64; 4],
        /// `/Ff` flags word
        flags: u32,
        /// Optional `/V`
        value: Option<String>,
        /// Optional `/TU`
        tooltip: Option<String>,
    },
    /// Merged checkbox field/widget
    Checkbox {
        /// `/T` title
        title: String,
        /// `/Rect`
        rect: [i64; 4],
        /// On-state name in `/AP /N`
        export: String,
    },
    /// Signature field
    Signature {
        /// `/T` title
        title: String,
        /// `/Rect`
        rect: [i64; 4],
    },
    /// Radio group: logical parent plus one widget per option
    Radio {
        /// `/T` title of the group
        title: String,
        /// `(export value, rect)` per widget
        options: Vec<(String, [i64; 4])>,
    },
    /// Hierarchical text field: titled parent with titled widget kids
    TextGroup {
        /// Parent `/T`
        title: String,
        /// Parent `/Ff` (inherited)
        flags: u32,
        /// `(child /T, rect)` pairs
        kids: Vec<(String, [i64; 4])>,
    },
    /// Malformed: field whose `/Kids` points back at itself
    SelfCycle {
        /// `/T` title
        title: String,
    },
    /// Malformed: `/Rect` with three entries
    ShortRect {
        /// `/T` title
        title: String,
    },
}

/// Builder collecting labels and fields, then emitting PDF bytes.
#[derive(Debug, Default)]
pub struct FormPdf {
    labels: Vec<(String, i64, i64)>,
    fields: Vec<FieldSpec>,
}

impl FormPdf {
    /// Empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a text label on the page.
    pub fn label(mut self, text: &str, x: i64, y: i64) -> Self {
        self.labels.push((text.to_string(), x, y));
        self
    }

    /// Add a plain text field.
    pub fn text_field(self, title: &str, rect: [i64; 4]) -> Self {
        self.text_field_full(title, rect, 0, None)
    }

    /// Add a text field with flags and value.
    pub fn text_field_full(
        mut self,
        title: &str,
        rect: [i64; 4],
        flags: u32,
        value: Option<&str>,
    ) -> Self {
        self.fields.push(FieldSpec::Text {
            title: title.to_string(),
            rect,
            flags,
            value: value.map(str::to_string),
            tooltip: None,
        });
        self
    }

    /// Add a text field with a tooltip.
    pub fn text_field_with_tooltip(mut self, title: &str, rect: [i64; 4], tooltip: &str) -> Self {
        self.fields.push(FieldSpec::Text {
            title: title.to_string(),
            rect,
            flags: 0,
            value: None,
            tooltip: Some(tooltip.to_string()),
        });
        self
    }

    /// Add a checkbox.
    pub fn checkbox(mut self, title: &str, rect: [i64; 4], export: &str) -> Self {
        self.fields.push(FieldSpec::Checkbox {
            title: title.to_string(),
            rect,
            export: export.to_string(),
        });
        self
    }

    /// Add a signature field.
    pub fn signature(mut self, title: &str, rect: [i64; 4]) -> Self {
        self.fields.push(FieldSpec::Signature {
            title: title.to_string(),
            rect,
        });
        self
    }

    /// Add a radio group with one widget per `(export, rect)` option.
    pub fn radio_group(mut self, title: &str, options: &[(&str, [i64; 4])]) -> Self {
        self.fields.push(FieldSpec::Radio {
            title: title.to_string(),
            options: options
                .iter()
                .map(|(export, rect)| (export.to_string(), *rect))
                .collect(),
        });
        self
    }

    /// Add a hierarchical text field.
    pub fn text_group(mut self, title: &str, flags: u32, kids: &[(&str, [i64; 4])]) -> Self {
        self.fields.push(FieldSpec::TextGroup {
            title: title.to_string(),
            flags,
            kids: kids.iter().map(|(t, r)| (t.to_string(), *r)).collect(),
        });
        self
    }

    /// Add a self-referencing (cyclic) field node.
    pub fn self_cycle(mut self, title: &str) -> Self {
        self.fields.push(FieldSpec::SelfCycle {
            title: title.to_string(),
        });
        self
    }

    /// Add a field with a malformed rectangle.
    pub fn short_rect(mut self, title: &str) -> Self {
        self.fields.push(FieldSpec::ShortRect {
            title: title.to_string(),
        });
        self
    }

    /// Emit the PDF bytes.
    pub fn build(self) -> Vec<u8> {
        // Object numbers: 1 catalog, 2 pages, 3 page, 4 contents, 5+ fields
        let mut next = 5u32;
        let mut bodies: Vec<(u32, String)> = Vec::new();
        let mut top_refs: Vec<u32> = Vec::new();
        let mut annot_refs: Vec<u32> = Vec::new();

        for spec in &self.fields {
            match spec {
                FieldSpec::Text {
                    title,
                    rect,
                    flags,
                    value,
                    tooltip,
                } => {
                    let n = alloc(&mut next);
                    let mut body = format!(
                        "<< /Type /Annot /Subtype /Widget /FT /Tx /T ({}) /Rect {} /P 3 0 R",
                        title,
                        rect_str(rect)
                    );
                    if *flags != 0 {
                        body.push_str(&format!(" /Ff {}", flags));
                    }
                    if let Some(value) = value {
                        body.push_str(&format!(" /V ({})", value));
                    }
                    if let Some(tooltip) = tooltip {
                        body.push_str(&format!(" /TU ({})", tooltip));
                    }
                    body.push_str(" >>");
                    bodies.push((n, body));
                    top_refs.push(n);
                    annot_refs.push(n);
                },
                FieldSpec::Checkbox { title, rect, export } => {
                    let n = alloc(&mut next);
                    bodies.push((n, format!(
                        "<< /Type /Annot /Subtype /Widget /FT /Btn /T ({}) /Rect {} /P 3 0 R \
                         /V /Off /AS /Off /AP << /N << /{} null /Off null >> >> >>",
                        title,
                        rect_str(rect),
                        export
                    )));
                    top_refs.push(n);
                    annot_refs.push(n);
                },
                FieldSpec::Signature { title, rect } => {
                    let n = alloc(&mut next);
                    bodies.push((n, format!(
                        "<< /Type /Annot /Subtype /Widget /FT /Sig /T ({}) /Rect {} /P 3 0 R >>",
                        title,
                        rect_str(rect)
                    )));
                    top_refs.push(n);
                    annot_refs.push(n);
                },
                FieldSpec::Radio { title, options } => {
                    let parent = alloc(&mut next);
                    let kid_numbers: Vec<u32> =
                        options.iter().map(|_| alloc(&mut next)).collect();
                    let kids_list = kid_numbers
                        .iter()
                        .map(|k| format!("{} 0 R", k))
                        .collect::<Vec<_>>()
                        .join(" ");
                    bodies.push((parent, format!(
                        "<< /FT /Btn /Ff 32768 /T ({}) /V /Off /Kids [{}] >>",
                        title, kids_list
                    )));
                    for ((export, rect), kid) in options.iter().zip(&kid_numbers) {
                        bodies.push((*kid, format!(
                            "<< /Type /Annot /Subtype /Widget /Parent {} 0 R /Rect {} /P 3 0 R \
                             /AS /Off /AP << /N << /{} null /Off null >> >> >>",
                            parent,
                            rect_str(rect),
                            export
                        )));
                        annot_refs.push(*kid);
                    }
                    top_refs.push(parent);
                },
                FieldSpec::TextGroup { title, flags, kids } => {
                    let parent = alloc(&mut next);
                    let kid_numbers: Vec<u32> = kids.iter().map(|_| alloc(&mut next)).collect();
                    let kids_list = kid_numbers
                        .iter()
                        .map(|k| format!("{} 0 R", k))
                        .collect::<Vec<_>>()
                        .join(" ");
                    bodies.push((parent, format!(
                        "<< /FT /Tx /Ff {} /T ({}) /Kids [{}] >>",
                        flags, title, kids_list
                    )));
                    for ((child_title, rect), kid) in kids.iter().zip(&kid_numbers) {
                        bodies.push((*kid, format!(
                            "<< /Type /Annot /Subtype /Widget /Parent {} 0 R /T ({}) /Rect {} /P 3 0 R >>",
                            parent,
                            child_title,
                            rect_str(rect)
                        )));
                        annot_refs.push(*kid);
                    }
                    top_refs.push(parent);
                },
                FieldSpec::SelfCycle { title } => {
                    let n = alloc(&mut next);
                    bodies.push((n, format!(
                        "<< /FT /Tx /T ({}) /Kids [{} 0 R] >>",
                        title, n
                    )));
                    top_refs.push(n);
                },
                FieldSpec::ShortRect { title } => {
                    let n = alloc(&mut next);
                    bodies.push((n, format!(
                        "<< /Type /Annot /Subtype /Widget /FT /Tx /T ({}) /Rect [0 0 10] /P 3 0 R >>",
                        title
                    )));
                    top_refs.push(n);
                    annot_refs.push(n);
                },
            }
        }

        let content: String = self
            .labels
            .iter()
            .map(|(text, x, y)| format!("BT /F1 10 Tf {} {} Td ({}) Tj ET\n", x, y, text))
            .collect();

        let fields_list = top_refs
            .iter()
            .map(|n| format!("{} 0 R", n))
            .collect::<Vec<_>>()
            .join(" ");
        let annots_list = annot_refs
            .iter()
            .map(|n| format!("{} 0 R", n))
            .collect::<Vec<_>>()
            .join(" ");

        let mut all: Vec<(u32, String)> = vec![
            (
                1,
                format!(
                    "<< /Type /Catalog /Pages 2 0 R /AcroForm << /Fields [{}] /DA (/Helv 0 Tf 0 g) >> >>",
                    fields_list
                ),
            ),
            (2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string()),
            (
                3,
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Annots [{}] >>",
                    annots_list
                ),
            ),
            (
                4,
                format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
            ),
        ];
        all.extend(bodies);
        all.sort_by_key(|(n, _)| *n);

        let mut out: Vec<u8> = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets: Vec<(u32, usize)> = Vec::new();
        for (number, body) in &all {
            offsets.push((*number, out.len()));
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", number, body).as_bytes());
        }

        let xref_offset = out.len();
        let max = all.last().map(|(n, _)| *n).unwrap_or(0);
        out.extend_from_slice(format!("xref\n0 {}\n", max + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for number in 1..=max {
            let offset = offsets
                .iter()
                .find(|(n, _)| *n == number)
                .map(|(_, o)| *o)
                .unwrap_or(0);
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                max + 1,
                xref_offset
            )
            .as_bytes(),
        );
        out
    }
}

fn alloc(next: &mut u32) -> u32 {
    let n = *next;
    *next += 1;
    n
}

fn rect_str(rect: &[i64; 4]) -> String {
    format!("[{} {} {} {}]", rect[0], rect[1], rect[2], rect[3])
}
