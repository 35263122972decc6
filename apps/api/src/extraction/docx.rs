//! DOCX text extraction via `docx-rs`.
//!
//! Document → Paragraph → Run → Text. Only body paragraphs are read;
//! tables, headers, footers and embedded objects are not extracted.

use docx_rs::{read_docx, DocumentChild, Paragraph, ParagraphChild, Run, RunChild};

use super::{DocumentFormat, ExtractError};

/// Returns every body paragraph's text in document order, joined by `\n`.
/// Empty paragraphs are kept as empty lines.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = read_docx(bytes).map_err(|e| ExtractError::Unreadable {
        format: DocumentFormat::Docx,
        reason: format!("{e:?}"),
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(para: &Paragraph) -> String {
    let mut out = String::new();
    push_children(&para.children, &mut out);
    out
}

fn push_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(run, out),
            // Email addresses in CVs are commonly hyperlinked.
            ParagraphChild::Hyperlink(link) => push_children(&link.children, out),
            _ => {}
        }
    }
}

fn push_run(run: &Run, out: &mut String) {
    for rc in &run.children {
        match rc {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}
