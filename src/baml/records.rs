//! BAML document and record codec.
//!
//! A BAML stream is a header (signature string plus three format version pairs) followed
//! by an ordered sequence of records. Each record starts with a kind byte; depending on
//! the kind, the body is either a fixed number of bytes or is prefixed with a 7-bit
//! encoded size that counts the size field itself plus the body (but not the kind byte).
//!
//! The codec decodes structured variants only for the record kinds the merge engines
//! read or rewrite; every other kind round-trips as an opaque [`BamlRecord::Raw`]
//! payload. Deferred-content sizes are resolved to record indices on load and recomputed
//! on save, so documents stay internally consistent after records are inserted.

use widestring::{U16Str, U16String};

use crate::{
    file::{writer::encoded_int_len, Parser, Writer},
    Result,
};

/// Signature string at the start of every BAML stream.
pub const BAML_SIGNATURE: &str = "MSBAML";

/// One of the three format version pairs in a BAML header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BamlVersion {
    /// Major version component
    pub major: u16,
    /// Minor version component
    pub minor: u16,
}

impl BamlVersion {
    /// The version the markup compiler has emitted since the format stabilized.
    pub const CURRENT: BamlVersion = BamlVersion { major: 0, minor: 96 };
}

/// Every record kind the BAML format defines.
///
/// The discriminant is the kind byte as it appears on the wire. Kinds without a
/// structured [`BamlRecord`] variant are carried as raw payloads; the split into
/// fixed-size and size-prefixed kinds in [`BamlRecordKind::fixed_size`] and
/// [`BamlRecordKind::is_sized`] is what lets unknown records round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::FromRepr)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum BamlRecordKind {
    DocumentStart = 0x01,
    DocumentEnd = 0x02,
    ElementStart = 0x03,
    ElementEnd = 0x04,
    Property = 0x05,
    PropertyCustom = 0x06,
    PropertyComplexStart = 0x07,
    PropertyComplexEnd = 0x08,
    PropertyArrayStart = 0x09,
    PropertyArrayEnd = 0x0a,
    PropertyListStart = 0x0b,
    PropertyListEnd = 0x0c,
    PropertyDictionaryStart = 0x0d,
    PropertyDictionaryEnd = 0x0e,
    LiteralContent = 0x0f,
    Text = 0x10,
    TextWithConverter = 0x11,
    RoutedEvent = 0x12,
    ClrEvent = 0x13,
    XmlnsProperty = 0x14,
    XmlAttribute = 0x15,
    ProcessingInstruction = 0x16,
    Comment = 0x17,
    DefTag = 0x18,
    DefAttribute = 0x19,
    EndAttributes = 0x1a,
    PiMapping = 0x1b,
    AssemblyInfo = 0x1c,
    TypeInfo = 0x1d,
    TypeSerializerInfo = 0x1e,
    AttributeInfo = 0x1f,
    StringInfo = 0x20,
    PropertyStringReference = 0x21,
    PropertyTypeReference = 0x22,
    PropertyWithExtension = 0x23,
    PropertyWithConverter = 0x24,
    DeferableContentStart = 0x25,
    DefAttributeKeyString = 0x26,
    DefAttributeKeyType = 0x27,
    KeyElementStart = 0x28,
    KeyElementEnd = 0x29,
    ConstructorParametersStart = 0x2a,
    ConstructorParametersEnd = 0x2b,
    ConstructorParameterType = 0x2c,
    ConnectionId = 0x2d,
    ContentProperty = 0x2e,
    NamedElementStart = 0x2f,
    StaticResourceStart = 0x30,
    StaticResourceEnd = 0x31,
    StaticResourceId = 0x32,
    TextWithId = 0x33,
    PresentationOptionsAttribute = 0x34,
    LineNumberAndPosition = 0x35,
    LinePosition = 0x36,
    OptimizedStaticResource = 0x37,
    PropertyWithStaticResourceId = 0x38,
}

impl BamlRecordKind {
    /// Body byte count for kinds with a fixed wire size, `None` for the rest.
    #[must_use]
    pub fn fixed_size(self) -> Option<usize> {
        use BamlRecordKind::*;
        match self {
            DocumentStart => Some(6),
            DocumentEnd | ElementEnd | PropertyComplexEnd | PropertyArrayEnd
            | PropertyListEnd | PropertyDictionaryEnd | EndAttributes | KeyElementEnd
            | ConstructorParametersStart | ConstructorParametersEnd | StaticResourceEnd => Some(0),
            ElementStart | StaticResourceStart | OptimizedStaticResource => Some(3),
            PropertyComplexStart | PropertyArrayStart | PropertyListStart
            | PropertyDictionaryStart | ConstructorParameterType | ContentProperty
            | StaticResourceId => Some(2),
            PropertyStringReference | PropertyTypeReference | DeferableContentStart
            | ConnectionId | PropertyWithStaticResourceId | LinePosition => Some(4),
            PropertyWithExtension => Some(6),
            DefAttributeKeyType | KeyElementStart => Some(7),
            LineNumberAndPosition => Some(8),
            _ => None,
        }
    }

    /// Returns `true` for kinds whose body is prefixed with a 7-bit encoded size.
    #[must_use]
    pub fn is_sized(self) -> bool {
        use BamlRecordKind::*;
        matches!(
            self,
            Property
                | PropertyCustom
                | LiteralContent
                | Text
                | TextWithConverter
                | RoutedEvent
                | ClrEvent
                | XmlnsProperty
                | XmlAttribute
                | ProcessingInstruction
                | Comment
                | DefTag
                | DefAttribute
                | PiMapping
                | AssemblyInfo
                | TypeInfo
                | TypeSerializerInfo
                | AttributeInfo
                | StringInfo
                | PropertyWithConverter
                | DefAttributeKeyString
                | TextWithId
                | PresentationOptionsAttribute
        )
    }
}

/// A single BAML record.
///
/// Structured variants exist for the kinds the theme generator, patcher, and reference
/// rewriter touch; everything else is preserved byte-for-byte as [`BamlRecord::Raw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BamlRecord {
    /// Start of the document.
    DocumentStart {
        /// Whether the document may be loaded asynchronously
        load_async: bool,
        /// Async record batch size hint
        max_async_records: i32,
        /// Whether debug records are present
        debug_baml: bool,
    },
    /// End of the document.
    DocumentEnd,
    /// Start of an element node.
    ElementStart {
        /// Type id; negative known-type ids appear as their two's complement
        type_id: u16,
        /// Element creation flags
        flags: u8,
    },
    /// End of an element node.
    ElementEnd,
    /// Start of a list-typed property's content.
    PropertyListStart {
        /// Attribute id of the list property
        attribute_id: u16,
    },
    /// End of a list-typed property's content.
    PropertyListEnd,
    /// An xml namespace declaration on the current element.
    XmlnsProperty {
        /// Namespace prefix, empty for the default namespace
        prefix: String,
        /// The namespace URI, possibly carrying an `assembly=` suffix
        xml_namespace: String,
        /// Assembly-info ids the namespace maps onto
        assembly_ids: Vec<u16>,
    },
    /// Declaration of a referenced assembly.
    AssemblyInfo {
        /// Id other records reference this assembly by
        assembly_id: u16,
        /// Full assembly name, `Name, Version=..., Culture=..., PublicKeyToken=...`
        full_name: String,
    },
    /// Declaration of an attribute (property) name.
    AttributeInfo {
        /// Id other records reference this attribute by
        attribute_id: u16,
        /// Type id of the declaring type
        owner_type_id: u16,
        /// Usage discriminator byte
        attribute_usage: u8,
        /// Attribute name
        name: String,
    },
    /// A property whose string value goes through a type converter (pack URIs live here).
    PropertyWithConverter {
        /// Attribute id of the property
        attribute_id: u16,
        /// The unconverted string value
        value: String,
        /// Type id of the converter
        converter_type_id: u16,
    },
    /// Marker wrapping deferred content, sized in bytes on the wire.
    DeferableContentStart {
        /// Wire value; authoritative only when `target` is `None`
        content_size: i32,
        /// Index of the last record covered by the deferred span, when resolvable
        target: Option<usize>,
    },
    /// Any record kind the engines do not interpret, preserved verbatim.
    Raw {
        /// The record kind
        kind: BamlRecordKind,
        /// Body bytes, without the kind byte or size prefix
        body: Vec<u8>,
    },
}

impl BamlRecord {
    /// The wire kind of this record.
    #[must_use]
    pub fn kind(&self) -> BamlRecordKind {
        match self {
            BamlRecord::DocumentStart { .. } => BamlRecordKind::DocumentStart,
            BamlRecord::DocumentEnd => BamlRecordKind::DocumentEnd,
            BamlRecord::ElementStart { .. } => BamlRecordKind::ElementStart,
            BamlRecord::ElementEnd => BamlRecordKind::ElementEnd,
            BamlRecord::PropertyListStart { .. } => BamlRecordKind::PropertyListStart,
            BamlRecord::PropertyListEnd => BamlRecordKind::PropertyListEnd,
            BamlRecord::XmlnsProperty { .. } => BamlRecordKind::XmlnsProperty,
            BamlRecord::AssemblyInfo { .. } => BamlRecordKind::AssemblyInfo,
            BamlRecord::AttributeInfo { .. } => BamlRecordKind::AttributeInfo,
            BamlRecord::PropertyWithConverter { .. } => BamlRecordKind::PropertyWithConverter,
            BamlRecord::DeferableContentStart { .. } => BamlRecordKind::DeferableContentStart,
            BamlRecord::Raw { kind, .. } => *kind,
        }
    }
}

/// A parsed BAML stream: header fields plus the ordered record sequence.
///
/// Documents are ephemeral: parsed (or generated), mutated, serialized, discarded. The
/// record list is public because the patcher splices records in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BamlDocument {
    /// Header signature, `MSBAML` for compiler output
    pub signature: String,
    /// Format version the reader must support
    pub reader_version: BamlVersion,
    /// Format version of the last updater
    pub updater_version: BamlVersion,
    /// Format version of the writer
    pub writer_version: BamlVersion,
    /// The record sequence
    pub records: Vec<BamlRecord>,
}

impl Default for BamlDocument {
    fn default() -> Self {
        BamlDocument {
            signature: BAML_SIGNATURE.to_string(),
            reader_version: BamlVersion::CURRENT,
            updater_version: BamlVersion::CURRENT,
            writer_version: BamlVersion::CURRENT,
            records: Vec::new(),
        }
    }
}

impl BamlDocument {
    /// Create an empty document with the standard header.
    #[must_use]
    pub fn new() -> Self {
        BamlDocument::default()
    }

    /// Parse a BAML stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty input and
    /// [`crate::Error::Malformed`] / [`crate::Error::OutOfBounds`] for streams that do
    /// not decode; a corrupt stream aborts the merge rather than being partially
    /// recovered.
    pub fn parse(data: &[u8]) -> Result<BamlDocument> {
        if data.is_empty() {
            return Err(crate::Error::Empty);
        }

        let mut parser = Parser::new(data);

        let signature = read_header_string(&mut parser)?;
        if signature != BAML_SIGNATURE {
            return Err(malformed_error!(
                "Unexpected BAML signature '{}'",
                signature
            ));
        }
        let reader_version = read_version(&mut parser)?;
        let updater_version = read_version(&mut parser)?;
        let writer_version = read_version(&mut parser)?;

        let mut records = Vec::new();
        let mut ends = Vec::new();
        while parser.has_more_data() {
            records.push(read_record(&mut parser)?);
            ends.push(parser.pos());
        }

        resolve_deferred_targets(&mut records, &ends);

        Ok(BamlDocument {
            signature,
            reader_version,
            updater_version,
            writer_version,
            records,
        })
    }

    /// Serialize the document.
    ///
    /// Deferred-content records with a resolved target get their size recomputed from
    /// the actual encoded span, so insertions between a marker and its target are
    /// reflected on the wire.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a deferred-content target index does not
    /// point at a later record.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let encoded: Vec<Vec<u8>> = self.records.iter().map(encode_record).collect();

        let mut writer = Writer::new();
        write_header_string(&mut writer, &self.signature);
        for version in [
            self.reader_version,
            self.updater_version,
            self.writer_version,
        ] {
            writer.write_le(version.major);
            writer.write_le(version.minor);
        }

        for (index, record) in self.records.iter().enumerate() {
            if let BamlRecord::DeferableContentStart {
                target: Some(target),
                ..
            } = record
            {
                if *target < index || *target >= self.records.len() {
                    return Err(malformed_error!(
                        "Deferred content at record {} targets invalid record {}",
                        index,
                        target
                    ));
                }
                let span: usize = encoded[index + 1..=*target].iter().map(Vec::len).sum();
                let mut patched = encoded[index].clone();
                patched[1..5].copy_from_slice(&(span as i32).to_le_bytes());
                writer.write_bytes(&patched);
            } else {
                writer.write_bytes(&encoded[index]);
            }
        }

        Ok(writer.into_inner())
    }
}

fn read_header_string(parser: &mut Parser) -> Result<String> {
    let byte_len = parser.read_le::<u32>()? as usize;
    if byte_len % 2 != 0 {
        return Err(malformed_error!(
            "BAML header string has odd byte length {}",
            byte_len
        ));
    }

    // Bounds-check the prefixed length before allocating anything for it.
    let units: Vec<u16> = parser
        .read_bytes(byte_len)?
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    U16Str::from_slice(&units)
        .to_string()
        .map_err(|_| malformed_error!("BAML header string is not valid UTF-16"))
}

fn write_header_string(writer: &mut Writer, value: &str) {
    let wide = U16String::from_str(value);
    writer.write_le(2 * wide.len() as u32);
    for unit in wide.as_slice() {
        writer.write_le(*unit);
    }
}

fn read_version(parser: &mut Parser) -> Result<BamlVersion> {
    Ok(BamlVersion {
        major: parser.read_le::<u16>()?,
        minor: parser.read_le::<u16>()?,
    })
}

fn read_record(parser: &mut Parser) -> Result<BamlRecord> {
    let kind_byte = parser.read_le::<u8>()?;
    let kind = BamlRecordKind::from_repr(kind_byte)
        .ok_or_else(|| malformed_error!("Unknown BAML record kind {:#04x}", kind_byte))?;

    match kind {
        BamlRecordKind::DocumentStart => Ok(BamlRecord::DocumentStart {
            load_async: parser.read_le::<u8>()? != 0,
            max_async_records: parser.read_le::<i32>()?,
            debug_baml: parser.read_le::<u8>()? != 0,
        }),
        BamlRecordKind::DocumentEnd => Ok(BamlRecord::DocumentEnd),
        BamlRecordKind::ElementStart => Ok(BamlRecord::ElementStart {
            type_id: parser.read_le::<u16>()?,
            flags: parser.read_le::<u8>()?,
        }),
        BamlRecordKind::ElementEnd => Ok(BamlRecord::ElementEnd),
        BamlRecordKind::PropertyListStart => Ok(BamlRecord::PropertyListStart {
            attribute_id: parser.read_le::<u16>()?,
        }),
        BamlRecordKind::PropertyListEnd => Ok(BamlRecord::PropertyListEnd),
        BamlRecordKind::DeferableContentStart => Ok(BamlRecord::DeferableContentStart {
            content_size: parser.read_le::<i32>()?,
            target: None,
        }),
        BamlRecordKind::XmlnsProperty => {
            let end = sized_record_end(parser)?;
            let prefix = parser.read_prefixed_string_utf8()?;
            let xml_namespace = parser.read_prefixed_string_utf8()?;
            let count = parser.read_le::<u16>()? as usize;
            let mut assembly_ids = Vec::with_capacity(count);
            for _ in 0..count {
                assembly_ids.push(parser.read_le::<u16>()?);
            }
            check_record_end(parser, end, kind)?;
            Ok(BamlRecord::XmlnsProperty {
                prefix,
                xml_namespace,
                assembly_ids,
            })
        }
        BamlRecordKind::AssemblyInfo => {
            let end = sized_record_end(parser)?;
            let assembly_id = parser.read_le::<u16>()?;
            let full_name = parser.read_prefixed_string_utf8()?;
            check_record_end(parser, end, kind)?;
            Ok(BamlRecord::AssemblyInfo {
                assembly_id,
                full_name,
            })
        }
        BamlRecordKind::AttributeInfo => {
            let end = sized_record_end(parser)?;
            let attribute_id = parser.read_le::<u16>()?;
            let owner_type_id = parser.read_le::<u16>()?;
            let attribute_usage = parser.read_le::<u8>()?;
            let name = parser.read_prefixed_string_utf8()?;
            check_record_end(parser, end, kind)?;
            Ok(BamlRecord::AttributeInfo {
                attribute_id,
                owner_type_id,
                attribute_usage,
                name,
            })
        }
        BamlRecordKind::PropertyWithConverter => {
            let end = sized_record_end(parser)?;
            let attribute_id = parser.read_le::<u16>()?;
            let value = parser.read_prefixed_string_utf8()?;
            let converter_type_id = parser.read_le::<u16>()?;
            check_record_end(parser, end, kind)?;
            Ok(BamlRecord::PropertyWithConverter {
                attribute_id,
                value,
                converter_type_id,
            })
        }
        _ => read_raw_record(parser, kind),
    }
}

/// Read the size prefix of a sized record and return the position its body ends at.
fn sized_record_end(parser: &mut Parser) -> Result<usize> {
    let start = parser.pos();
    let size = parser.read_7bit_encoded_int()? as usize;
    if size < parser.pos() - start {
        return Err(malformed_error!("BAML record size {} underflows its own prefix", size));
    }
    Ok(start + size)
}

fn check_record_end(parser: &mut Parser, end: usize, kind: BamlRecordKind) -> Result<()> {
    if parser.pos() != end {
        return Err(malformed_error!(
            "BAML {} record body does not fill its declared size",
            kind
        ));
    }
    Ok(())
}

fn read_raw_record(parser: &mut Parser, kind: BamlRecordKind) -> Result<BamlRecord> {
    let body = if let Some(size) = kind.fixed_size() {
        parser.read_bytes(size)?.to_vec()
    } else if kind.is_sized() {
        let end = sized_record_end(parser)?;
        parser.read_bytes(end - parser.pos())?.to_vec()
    } else {
        // NamedElementStart is the one kind that is neither fixed nor size-prefixed:
        // a type id followed by a length-prefixed runtime name.
        let start = parser.pos();
        let _ = parser.read_le::<u16>()?;
        let _ = parser.read_prefixed_string_utf8()?;
        let end = parser.pos();
        parser.seek(start)?;
        parser.read_bytes(end - start)?.to_vec()
    };

    Ok(BamlRecord::Raw { kind, body })
}

fn resolve_deferred_targets(records: &mut [BamlRecord], ends: &[usize]) {
    for index in 0..records.len() {
        let BamlRecord::DeferableContentStart {
            content_size,
            target,
        } = &mut records[index]
        else {
            continue;
        };

        // An unresolvable or negative size is kept verbatim and re-emitted as-is.
        if *content_size < 0 {
            continue;
        }
        let span_end = ends[index] + *content_size as usize;
        *target = ends.iter().position(|&end| end == span_end);
    }
}

fn encode_record(record: &BamlRecord) -> Vec<u8> {
    let mut body = Writer::new();
    match record {
        BamlRecord::DocumentStart {
            load_async,
            max_async_records,
            debug_baml,
        } => {
            body.write_le(u8::from(*load_async));
            body.write_le(*max_async_records);
            body.write_le(u8::from(*debug_baml));
        }
        BamlRecord::DocumentEnd | BamlRecord::ElementEnd | BamlRecord::PropertyListEnd => {}
        BamlRecord::ElementStart { type_id, flags } => {
            body.write_le(*type_id);
            body.write_le(*flags);
        }
        BamlRecord::PropertyListStart { attribute_id } => {
            body.write_le(*attribute_id);
        }
        BamlRecord::DeferableContentStart { content_size, .. } => {
            body.write_le(*content_size);
        }
        BamlRecord::XmlnsProperty {
            prefix,
            xml_namespace,
            assembly_ids,
        } => {
            body.write_prefixed_string_utf8(prefix);
            body.write_prefixed_string_utf8(xml_namespace);
            body.write_le(assembly_ids.len() as u16);
            for id in assembly_ids {
                body.write_le(*id);
            }
        }
        BamlRecord::AssemblyInfo {
            assembly_id,
            full_name,
        } => {
            body.write_le(*assembly_id);
            body.write_prefixed_string_utf8(full_name);
        }
        BamlRecord::AttributeInfo {
            attribute_id,
            owner_type_id,
            attribute_usage,
            name,
        } => {
            body.write_le(*attribute_id);
            body.write_le(*owner_type_id);
            body.write_le(*attribute_usage);
            body.write_prefixed_string_utf8(name);
        }
        BamlRecord::PropertyWithConverter {
            attribute_id,
            value,
            converter_type_id,
        } => {
            body.write_le(*attribute_id);
            body.write_prefixed_string_utf8(value);
            body.write_le(*converter_type_id);
        }
        BamlRecord::Raw { body: bytes, .. } => {
            body.write_bytes(bytes);
        }
    }
    let body = body.into_inner();

    let mut out = Writer::with_capacity(body.len() + 4);
    out.write_le(record.kind() as u8);
    if record.kind().is_sized() {
        // The size counts itself, so its encoding length feeds back into the value.
        let mut size = body.len() + 1;
        loop {
            let with_prefix = body.len() + encoded_int_len(size as u32);
            if with_prefix == size {
                break;
            }
            size = with_prefix;
        }
        out.write_7bit_encoded_int(size as u32);
    }
    out.write_bytes(&body);
    out.into_inner()
}
