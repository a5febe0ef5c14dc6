//! PDF text extraction with a single password attempt per call.

use lopdf::{Dictionary, Document, Object};

use crate::error::{BillnoteError, Result};

/// Recovers the plain text of a PDF. One call is one password attempt; the
/// caller owns the retry order.
pub trait TextExtractor: Send + Sync {
    /// `password` is empty for the no-password attempt.
    ///
    /// Errors are [`BillnoteError::DecryptionFailed`] when this password does
    /// not open the document, [`BillnoteError::CorruptDocument`] when no
    /// password ever could and [`BillnoteError::UnsupportedEncryption`] when
    /// the document is locked by a scheme lopdf cannot open.
    fn extract(&self, pdf: &[u8], password: &str) -> Result<String>;
}

/// lopdf-backed extractor. Handles the Standard security handler (RC4 and
/// AES) and fonts mapped through a ToUnicode CMap, which covers the
/// Identity-H CJK fonts Taiwanese banks embed.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, pdf: &[u8], password: &str) -> Result<String> {
        let mut doc =
            Document::load_mem(pdf).map_err(|e| BillnoteError::CorruptDocument(e.to_string()))?;

        let encrypted = doc.is_encrypted();
        if encrypted {
            check_security_handler(&doc)?;
            doc.decrypt(password)
                .map_err(|_| BillnoteError::DecryptionFailed)?;
        }

        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        if pages.is_empty() {
            return Err(BillnoteError::CorruptDocument("document has no pages".to_string()));
        }

        // Page text is joined in page order, each text object ending its own line.
        match doc.extract_text(&pages) {
            Ok(text) => Ok(text),
            // A wrong key can get past decrypt() and only show up as undecodable streams.
            Err(_) if encrypted => Err(BillnoteError::DecryptionFailed),
            Err(e) => Err(BillnoteError::CorruptDocument(e.to_string())),
        }
    }
}

/// Standard handler only, algorithm V1/V2 (RC4) or V4/V5 (crypt filters, AES).
fn check_security_handler(doc: &Document) -> Result<()> {
    let dict = encrypt_dictionary(doc).map_err(|e| {
        BillnoteError::CorruptDocument(format!("unreadable encryption dictionary: {e}"))
    })?;

    let filter = dict
        .get(b"Filter")
        .and_then(Object::as_name)
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .unwrap_or_default();
    if filter != "Standard" {
        return Err(BillnoteError::UnsupportedEncryption(format!(
            "security handler {filter:?}"
        )));
    }

    let version = dict.get(b"V").and_then(Object::as_i64).unwrap_or(0);
    if !matches!(version, 1 | 2 | 4 | 5) {
        return Err(BillnoteError::UnsupportedEncryption(format!(
            "encryption algorithm V{version}"
        )));
    }
    Ok(())
}

fn encrypt_dictionary(doc: &Document) -> lopdf::Result<&Dictionary> {
    match doc.trailer.get(b"Encrypt")? {
        Object::Reference(id) => doc.get_dictionary(*id),
        other => other.as_dict(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, ObjectId, Stream, StringFormat};

    const PAD: [u8; 32] = [
        0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
        0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
        0x69, 0x7A,
    ];
    const FILE_ID: &[u8; 16] = b"billnote-fixture";

    /// One page whose `shown` strings are separate text objects in font F1.
    fn one_page(mut doc: Document, font_id: ObjectId, shown: Vec<Object>) -> Document {
        let pages_id = doc.new_object_id();
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut operations = Vec::new();
        for (i, text) in shown.into_iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new(
                "Td",
                vec![50.into(), (750 - 20 * i as i64).into()],
            ));
            operations.push(Operation::new("Tj", vec![text]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn helvetica_page(lines: &[&str]) -> Document {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let shown = lines.iter().map(|l| Object::string_literal(*l)).collect();
        one_page(doc, font_id, shown)
    }

    fn to_bytes(mut doc: Document) -> Vec<u8> {
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// Build a one-page, unencrypted PDF whose lines are separate text objects.
    pub(crate) fn build_pdf(lines: &[&str]) -> Vec<u8> {
        to_bytes(helvetica_page(lines))
    }

    /// Build a PDF the way statement generators embed CJK text: a Type0
    /// Identity-H font whose two-byte codes only mean anything through its
    /// ToUnicode CMap.
    pub(crate) fn build_cid_pdf(lines: &[&str]) -> Vec<u8> {
        let mut chars: Vec<u16> = lines.iter().flat_map(|l| l.encode_utf16()).collect();
        chars.sort_unstable();
        chars.dedup();

        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );
        for block in chars.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", block.len()));
            for c in block {
                cmap.push_str(&format!("<{c:04X}> <{c:04X}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }
        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");

        let mut doc = Document::with_version("1.5");
        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, cmap.into_bytes()));
        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "MingLiU",
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "DW" => 1000,
        });
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "MingLiU",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![cid_font_id.into()],
            "ToUnicode" => to_unicode_id,
        });
        let shown = lines
            .iter()
            .map(|l| {
                let codes = l.encode_utf16().flat_map(u16::to_be_bytes).collect();
                Object::String(codes, StringFormat::Hexadecimal)
            })
            .collect();
        to_bytes(one_page(doc, font_id, shown))
    }

    fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
        let mut s: Vec<u8> = (0..=255).collect();
        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
            s.swap(i, j as usize);
        }
        let (mut i, mut j) = (0u8, 0u8);
        data.iter()
            .map(|b| {
                i = i.wrapping_add(1);
                j = j.wrapping_add(s[i as usize]);
                s.swap(i as usize, j as usize);
                b ^ s[s[i as usize].wrapping_add(s[j as usize]) as usize]
            })
            .collect()
    }

    fn padded(password: &str) -> Vec<u8> {
        let bytes = &password.as_bytes()[..password.len().min(32)];
        bytes.iter().chain(&PAD[..32 - bytes.len()]).copied().collect()
    }

    /// 1 MD5 pass over `input` followed by 50 over the digest (revision 3).
    fn md5_51(input: &[u8]) -> Vec<u8> {
        let mut key = md5::compute(input).0.to_vec();
        for _ in 0..50 {
            key = md5::compute(&key).0.to_vec();
        }
        key
    }

    /// RC4 with `key`, then 19 more passes with each key byte XOR the pass number.
    fn rc4_20(key: &[u8], data: &[u8]) -> Vec<u8> {
        let mut out = rc4(key, data);
        for n in 1..=19u8 {
            let round_key: Vec<u8> = key.iter().map(|b| b ^ n).collect();
            out = rc4(&round_key, &out);
        }
        out
    }

    /// Lock `doc` with the Standard handler, RC4 128-bit (V2, R3).
    fn encrypt_standard_rc4(mut doc: Document, user: &str, owner: &str) -> Vec<u8> {
        let permissions: i32 = -4;
        let owner_entry = rc4_20(&md5_51(&padded(owner)), &padded(user));

        let mut key_input = padded(user);
        key_input.extend_from_slice(&owner_entry);
        key_input.extend_from_slice(&(permissions as u32).to_le_bytes());
        key_input.extend_from_slice(FILE_ID);
        let file_key = md5_51(&key_input);

        let mut check_input = PAD.to_vec();
        check_input.extend_from_slice(FILE_ID);
        let mut user_entry = rc4_20(&file_key, &md5::compute(&check_input).0);
        user_entry.extend_from_slice(&PAD[..16]);

        for (&(num, generation), object) in doc.objects.iter_mut() {
            let mut object_key = file_key.clone();
            object_key.extend_from_slice(&num.to_le_bytes()[..3]);
            object_key.extend_from_slice(&generation.to_le_bytes());
            let object_key = md5::compute(&object_key).0;
            match object {
                Object::Stream(stream) => {
                    let sealed = rc4(&object_key, &stream.content);
                    stream.set_content(sealed);
                }
                Object::String(bytes, _) => *bytes = rc4(&object_key, bytes),
                _ => {}
            }
        }

        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 2,
            "R" => 3,
            "Length" => 128,
            "O" => Object::String(owner_entry, StringFormat::Hexadecimal),
            "U" => Object::String(user_entry, StringFormat::Hexadecimal),
            "P" => permissions,
        });
        lock(doc, encrypt_id)
    }

    fn lock(mut doc: Document, encrypt_id: ObjectId) -> Vec<u8> {
        let file_id = Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal);
        doc.trailer.set("ID", Object::Array(vec![file_id.clone(), file_id]));
        doc.trailer.set("Encrypt", encrypt_id);
        to_bytes(doc)
    }

    /// A statement that only opens with the user password `password`.
    pub(crate) fn build_encrypted_pdf(lines: &[&str], password: &str) -> Vec<u8> {
        encrypt_standard_rc4(helvetica_page(lines), password, "bank-owner")
    }

    fn build_locked_pdf(encrypt: Dictionary) -> Vec<u8> {
        let mut doc = helvetica_page(&["FUBON BANK"]);
        let encrypt_id = doc.add_object(encrypt);
        lock(doc, encrypt_id)
    }

    #[test]
    fn test_extracts_unencrypted_text() {
        let pdf = build_pdf(&["CATHAY UNITED BANK", "12/25 SHOP 1,234"]);
        let text = PdfTextExtractor.extract(&pdf, "").unwrap();
        assert!(text.contains("CATHAY UNITED BANK"));
        assert!(text.contains("12/25 SHOP 1,234"));
    }

    #[test]
    fn test_password_ignored_for_unencrypted_document() {
        let pdf = build_pdf(&["TAISHIN"]);
        let text = PdfTextExtractor.extract(&pdf, "anything").unwrap();
        assert!(text.contains("TAISHIN"));
    }

    #[test]
    fn test_identity_h_font_decodes_through_to_unicode() {
        let pdf = build_cid_pdf(&["國泰世華銀行 信用卡帳單", "12/25 全聯福利中心 1,234"]);
        let text = PdfTextExtractor.extract(&pdf, "").unwrap();
        assert!(text.contains("國泰世華銀行 信用卡帳單"), "got {text:?}");
        assert!(text.contains("12/25 全聯福利中心 1,234"), "got {text:?}");
        assert!(!text.contains("Unimplemented"));
    }

    #[test]
    fn test_encrypted_document_opens_with_user_password() {
        let pdf = build_encrypted_pdf(&["FUBON BANK", "114/12/25 DINNER 2,500"], "secret");
        let text = PdfTextExtractor.extract(&pdf, "secret").unwrap();
        assert!(text.contains("FUBON BANK"));
        assert!(text.contains("114/12/25 DINNER 2,500"));
    }

    #[test]
    fn test_encrypted_document_rejects_wrong_password() {
        let pdf = build_encrypted_pdf(&["FUBON BANK"], "secret");
        for attempt in ["", "wrong1", "Secret"] {
            let err = PdfTextExtractor.extract(&pdf, attempt).unwrap_err();
            assert!(matches!(err, BillnoteError::DecryptionFailed), "{attempt:?}: {err}");
        }
    }

    #[test]
    fn test_public_key_handler_is_unsupported() {
        let pdf = build_locked_pdf(dictionary! {
            "Filter" => "Adobe.PubSec",
            "SubFilter" => "adbe.pkcs7.s5",
            "V" => 4,
            "Length" => 128,
        });
        let err = PdfTextExtractor.extract(&pdf, "secret").unwrap_err();
        match err {
            BillnoteError::UnsupportedEncryption(reason) => assert!(reason.contains("Adobe.PubSec")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unpublished_algorithm_is_unsupported() {
        let pdf = build_locked_pdf(dictionary! {
            "Filter" => "Standard",
            "V" => 3,
            "R" => 3,
            "Length" => 128,
            "O" => Object::String(PAD.to_vec(), StringFormat::Hexadecimal),
            "U" => Object::String(PAD.to_vec(), StringFormat::Hexadecimal),
            "P" => -4,
        });
        let err = PdfTextExtractor.extract(&pdf, "").unwrap_err();
        assert!(matches!(err, BillnoteError::UnsupportedEncryption(_)), "{err}");
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let err = PdfTextExtractor
            .extract(b"this is not a pdf at all", "")
            .unwrap_err();
        assert!(matches!(err, BillnoteError::CorruptDocument(_)));
    }

    #[test]
    fn test_empty_input_is_corrupt() {
        let err = PdfTextExtractor.extract(&[], "secret").unwrap_err();
        assert!(matches!(err, BillnoteError::CorruptDocument(_)));
    }
}
