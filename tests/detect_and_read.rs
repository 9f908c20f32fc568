//! Detection and decoding against well-formed samples of each family.

use fileconv::content::{read, DecodedContent};
use fileconv::convert::convert;
use fileconv::detect::{detect, TypeTag};

/// Build a real document of the given target from text, using the converter
/// itself as the sample generator.
fn generated_sample(target: TypeTag) -> Vec<u8> {
    let value = DecodedContent::Text("sample body text for detection".to_string());
    convert(&value, TypeTag::Txt, target).unwrap().bytes
}

#[test]
fn detects_generated_pdf_and_docx_by_content() {
    let pdf = generated_sample(TypeTag::Pdf);
    // Content sniffing must win even with a misleading name.
    assert_eq!(detect(&pdf, "mislabeled.txt"), TypeTag::Pdf);

    let docx = generated_sample(TypeTag::Docx);
    assert_eq!(detect(&docx, "mislabeled.bin"), TypeTag::Docx);
}

#[test]
fn detects_generated_xlsx_by_content() {
    let xlsx = generated_sample(TypeTag::Xlsx);
    assert_eq!(detect(&xlsx, "nameless"), TypeTag::Xlsx);
}

#[test]
fn detects_text_families_by_extension() {
    assert_eq!(detect(b"name,age\na,1\n", "people.csv"), TypeTag::Csv);
    assert_eq!(detect(b"{\"a\": 1}", "data.json"), TypeTag::Json);
    assert_eq!(detect(b"a: 1\n", "conf.yaml"), TypeTag::Yaml);
    assert_eq!(detect(b"# Title\n", "notes.md"), TypeTag::Md);
    assert_eq!(detect(b"print('hi')\n", "tool.py"), TypeTag::Py);
    assert_eq!(detect(b"<root/>", "doc.xml"), TypeTag::Xml);
}

#[test]
fn detects_image_and_legacy_excel_signatures() {
    assert_eq!(detect(b"\x89PNG\r\n\x1a\n....", "whatever"), TypeTag::Png);
    assert_eq!(detect(b"\xD0\xCF\x11\xE0rest", "book"), TypeTag::Xls);
}

#[test]
fn zero_length_buffer_without_extension_is_unknown() {
    assert_eq!(detect(b"", ""), TypeTag::Unknown);
}

#[test]
fn csv_sample_decodes_to_expected_table() {
    let data = b"name,age\nalice,30\nbob,25\ncarol,41\n";
    let tag = detect(data, "people.csv");
    let DecodedContent::Table(table) = read(data, tag).unwrap() else {
        panic!("expected table");
    };
    assert_eq!(table.dimensions(), (3, 2));
}

#[test]
fn generated_documents_decode_back_to_their_text() {
    for target in [TypeTag::Pdf, TypeTag::Docx] {
        let bytes = generated_sample(target);
        let DecodedContent::Text(text) = read(&bytes, target).unwrap() else {
            panic!("expected text from {target}");
        };
        let normalized: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(
            normalized.contains("sample body text for detection"),
            "{target} text was: {normalized:?}"
        );
    }
}
