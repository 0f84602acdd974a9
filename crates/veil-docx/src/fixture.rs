//! In-memory DOCX packages for tests

use quick_xml::escape::escape;

use crate::archive::create_zip;

const NAMESPACES: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// A single-run paragraph
pub fn paragraph_xml(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape(text)
    )
}

/// A paragraph with one run per fragment
pub fn runs_xml(fragments: &[&str]) -> String {
    let runs: String = fragments
        .iter()
        .map(|f| format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, escape(f)))
        .collect();
    format!("<w:p>{}</w:p>", runs)
}

/// A table; each cell holds raw content XML
pub fn table_xml(rows: &[Vec<String>]) -> String {
    let rows: String = rows
        .iter()
        .map(|cells| {
            let cells: String = cells
                .iter()
                .map(|content| format!("<w:tc>{}</w:tc>", content))
                .collect();
            format!("<w:tr>{}</w:tr>", cells)
        })
        .collect();
    format!("<w:tbl><w:tblPr/>{}</w:tbl>", rows)
}

/// Tables nested `depth` levels through their single cell around `content`
pub fn nested_table_xml(depth: usize, content: &str) -> String {
    let mut xml = String::with_capacity(depth * 48 + content.len());
    for _ in 0..depth {
        xml.push_str("<w:tbl><w:tr><w:tc>");
    }
    xml.push_str(content);
    for _ in 0..depth {
        xml.push_str("</w:tc></w:tr></w:tbl>");
    }
    xml
}

/// Builds a minimal but well-formed Word package
#[derive(Debug, Default)]
pub struct DocxBuilder {
    body: String,
    parts: Vec<(String, String)>,
    relationships: Vec<(String, String, String)>,
    extras: Vec<(String, Vec<u8>)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw body XML
    pub fn body(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    pub fn paragraph(self, text: &str) -> Self {
        self.body(&paragraph_xml(text))
    }

    pub fn header(mut self, id: &str, file: &str, content: &str) -> Self {
        self.parts.push((
            format!("word/{}", file),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:hdr {}>{}</w:hdr>"#,
                NAMESPACES, content
            ),
        ));
        self.relationships
            .push((id.to_string(), "header".to_string(), file.to_string()));
        self
    }

    pub fn footer(mut self, id: &str, file: &str, content: &str) -> Self {
        self.parts.push((
            format!("word/{}", file),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:ftr {}>{}</w:ftr>"#,
                NAMESPACES, content
            ),
        ));
        self.relationships
            .push((id.to_string(), "footer".to_string(), file.to_string()));
        self
    }

    /// Register a relationship without adding its part
    pub fn relationship(mut self, id: &str, target: &str) -> Self {
        self.relationships
            .push((id.to_string(), "header".to_string(), target.to_string()));
        self
    }

    /// Close a section; `refs` are `(header|footer, default|first|even, rId)`
    pub fn section(self, refs: &[(&str, &str, &str)]) -> Self {
        let refs: String = refs
            .iter()
            .map(|(element, kind, id)| {
                format!(r#"<w:{}Reference w:type="{}" r:id="{}"/>"#, element, kind, id)
            })
            .collect();
        self.body(&format!(
            "<w:p><w:pPr><w:sectPr>{}<w:pgSz w:w=\"12240\" w:h=\"15840\"/></w:sectPr></w:pPr></w:p>",
            refs
        ))
    }

    /// Add an arbitrary package entry
    pub fn extra(mut self, name: &str, bytes: &[u8]) -> Self {
        self.extras.push((name.to_string(), bytes.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body>{}</w:body></w:document>"#,
            NAMESPACES, self.body
        );
        let relationships: String = self
            .relationships
            .iter()
            .map(|(id, kind, target)| {
                format!(
                    r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}" Target="{}"/>"#,
                    id, kind, target
                )
            })
            .collect();
        let document_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            relationships
        );

        let mut files = vec![
            ("[Content_Types].xml".to_string(), CONTENT_TYPES.as_bytes().to_vec()),
            ("_rels/.rels".to_string(), PACKAGE_RELS.as_bytes().to_vec()),
            ("word/document.xml".to_string(), document.into_bytes()),
            ("word/_rels/document.xml.rels".to_string(), document_rels.into_bytes()),
        ];
        files.extend(
            self.parts
                .into_iter()
                .map(|(name, xml)| (name, xml.into_bytes())),
        );
        files.extend(self.extras);

        create_zip(&files).expect("in-memory archive")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WordDocument;

    #[test]
    fn test_markup_characters_are_escaped() {
        let text = r#"A & <B> "quoted" it's"#;
        let bytes = DocxBuilder::new()
            .paragraph(text)
            .body(&runs_xml(&["x < y", " & z"]))
            .build();

        let document = WordDocument::open(&bytes).unwrap();
        assert_eq!(
            document.body().paragraph_texts(),
            vec![text.to_string(), "x < y & z".to_string()]
        );
    }
}
