//! PDF sniffing and page counting.

use thiserror::Error;

/// The only MIME type accepted for uploads.
pub const PDF_MIME: &str = "application/pdf";

/// Extension stored blobs carry.
pub const PDF_EXTENSION: &str = ".pdf";

/// Every PDF file starts with this header.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("not a PDF: missing %PDF- header")]
    MissingHeader,

    #[error("malformed PDF: {0}")]
    Parse(String),

    #[error("PDF contains no pages")]
    NoPages,
}

/// Whether `data` starts with the PDF header.
pub fn has_pdf_magic(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

/// Count the pages of an in-memory PDF without rendering it.
pub fn page_count(data: &[u8]) -> Result<u32, PdfError> {
    if !has_pdf_magic(data) {
        return Err(PdfError::MissingHeader);
    }

    let document = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
    let pages = document.get_pages().len();
    if pages == 0 {
        return Err(PdfError::NoPages);
    }

    u32::try_from(pages).map_err(|_| PdfError::Parse(format!("implausible page count {pages}")))
}

/// Builders for small, structurally valid PDFs used by tests.
#[cfg(any(test, feature = "test-util"))]
pub mod fixtures {
    /// Build a PDF with `pages` empty pages and an unreferenced stream of
    /// `padding` filler bytes, so callers can reach a target file size.
    pub fn minimal_pdf(pages: usize, padding: usize) -> Vec<u8> {
        let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::new();

        let first_page = 3;
        let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", first_page + i)).collect();

        offsets.push(out.len());
        out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
                kids.join(" "),
                pages
            )
            .as_bytes(),
        );

        for i in 0..pages {
            offsets.push(out.len());
            out.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n",
                    first_page + i
                )
                .as_bytes(),
            );
        }

        let filler_id = first_page + pages;
        offsets.push(out.len());
        out.extend_from_slice(format!("{filler_id} 0 obj\n<< /Length {padding} >>\nstream\n").as_bytes());
        out.extend((0..padding).map(|i| b"0123456789abcdef"[i % 16]));
        out.extend_from_slice(b"\nendstream\nendobj\n");

        let xref_offset = out.len();
        let object_count = offsets.len() + 1;
        out.extend_from_slice(format!("xref\n0 {object_count}\n").as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {object_count} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
            )
            .as_bytes(),
        );

        out
    }
}
