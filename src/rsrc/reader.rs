//! Parser for PE `.rsrc` section bytes into the in-memory tree model.
//!
//! The reader walks the directory tables recursively, honoring the format's high-bit
//! conventions (string name references and subdirectory offsets) and the fixed three
//! level nesting limit. Raw data is copied out of the section buffer so the resulting
//! tree owns its bytes and can outlive the mapped input file.

use std::path::Path;

use goblin::pe::{data_directories::DataDirectoryType, PE};
use memmap2::Mmap;
use widestring::U16Str;

use crate::{
    file::Parser,
    rsrc::{
        writer::RSRC_HIGH_BIT, ResourceDirectory, ResourceEntry, ResourceNode, MAX_RSRC_DEPTH,
    },
    Result,
};

/// Parse a `.rsrc` section buffer into a [`ResourceDirectory`] tree.
///
/// # Arguments
/// * `data` - The section bytes, starting at the root directory header
/// * `virtual_address` - The RVA the section is mapped at; data entry RVAs are
///   translated to buffer offsets by subtracting it
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for truncated tables, invalid UTF-16 names, or
/// data RVAs outside the section, and [`crate::Error::NotSupported`] if directories
/// nest deeper than the format allows.
///
/// # Examples
///
/// ```rust
/// use dotmerge::rsrc::{read_rsrc, write_rsrc, ResourceDirectory, ResourceEntry};
///
/// let mut root = ResourceDirectory::new();
/// root.entries.push(ResourceEntry::data(2, vec![1, 2, 3]));
///
/// let bytes = write_rsrc(&mut root, 0x3000)?;
/// let reread = read_rsrc(&bytes, 0x3000)?;
/// assert_eq!(reread, root);
/// # Ok::<(), dotmerge::Error>(())
/// ```
pub fn read_rsrc(data: &[u8], virtual_address: u32) -> Result<ResourceDirectory> {
    read_directory(data, 0, virtual_address, 0)
}

fn read_directory(
    data: &[u8],
    offset: usize,
    virtual_address: u32,
    depth: usize,
) -> Result<ResourceDirectory> {
    if depth > MAX_RSRC_DEPTH {
        return Err(crate::Error::NotSupported);
    }

    let mut parser = Parser::new(data);
    parser.seek(offset)?;

    let characteristics = parser.read_le::<u32>()?;
    let time_date_stamp = parser.read_le::<u32>()?;
    let major_version = parser.read_le::<u16>()?;
    let minor_version = parser.read_le::<u16>()?;
    let named_count = parser.read_le::<u16>()? as usize;
    let id_count = parser.read_le::<u16>()? as usize;

    let mut entries = Vec::with_capacity(named_count + id_count);
    for index in 0..named_count + id_count {
        let name_field = parser.read_le::<u32>()?;
        let offset_field = parser.read_le::<u32>()?;

        let (name, id) = if name_field & RSRC_HIGH_BIT != 0 {
            if index >= named_count {
                return Err(malformed_error!(
                    "String-named entry found in the id entry range at index {}",
                    index
                ));
            }
            (
                Some(read_name(data, (name_field & !RSRC_HIGH_BIT) as usize)?),
                0,
            )
        } else {
            (None, name_field)
        };

        let node = if offset_field & RSRC_HIGH_BIT != 0 {
            let child = read_directory(
                data,
                (offset_field & !RSRC_HIGH_BIT) as usize,
                virtual_address,
                depth + 1,
            )?;
            ResourceNode::Directory(child)
        } else {
            read_data_entry(data, offset_field as usize, virtual_address)?
        };

        entries.push(ResourceEntry { name, id, node });
    }

    Ok(ResourceDirectory {
        characteristics,
        time_date_stamp,
        major_version,
        minor_version,
        entries,
    })
}

fn read_name(data: &[u8], offset: usize) -> Result<String> {
    let mut parser = Parser::new(data);
    parser.seek(offset)?;

    // Bounds-check the prefixed length before allocating anything for it.
    let char_count = parser.read_le::<u32>()? as usize;
    let byte_len = char_count.checked_mul(2).ok_or(out_of_bounds_error!())?;
    let units: Vec<u16> = parser
        .read_bytes(byte_len)?
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    U16Str::from_slice(&units)
        .to_string()
        .map_err(|_| malformed_error!("Resource entry name at offset {} is not valid UTF-16", offset))
}

fn read_data_entry(data: &[u8], offset: usize, virtual_address: u32) -> Result<ResourceNode> {
    let mut parser = Parser::new(data);
    parser.seek(offset)?;

    let rva = parser.read_le::<u32>()?;
    let size = parser.read_le::<u32>()? as usize;
    let code_page = parser.read_le::<u32>()?;
    let reserved = parser.read_le::<u32>()?;

    let start = rva.checked_sub(virtual_address).ok_or_else(|| {
        malformed_error!(
            "Resource data RVA {:#x} precedes the section base {:#x}",
            rva,
            virtual_address
        )
    })? as usize;
    let bytes = data
        .get(start..start + size)
        .ok_or_else(|| out_of_bounds_error!())?
        .to_vec();

    Ok(ResourceNode::Data {
        bytes,
        code_page,
        reserved,
    })
}

/// Load the Win32 resource tree of a PE file on disk.
///
/// Returns `Ok(None)` when the file carries no resource table, which is common for
/// class libraries.
///
/// # Arguments
/// * `path` - Path to the PE file
///
/// # Errors
/// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped,
/// [`crate::Error::GoblinErr`] if it is not a parseable PE, and
/// [`crate::Error::Malformed`] if the resource table lies outside the mapped sections.
pub fn load_rsrc<P: AsRef<Path>>(path: P) -> Result<Option<ResourceDirectory>> {
    let file = std::fs::File::open(path.as_ref())?;
    let mmap = unsafe { Mmap::map(&file)? };
    let pe = PE::parse(&mmap)?;

    let Some(optional_header) = pe.header.optional_header else {
        return Ok(None);
    };

    let Some(directory) = optional_header
        .data_directories
        .dirs()
        .find(|(dir_type, directory)| {
            *dir_type == DataDirectoryType::ResourceTable
                && directory.virtual_address != 0
                && directory.size != 0
        })
        .map(|(_, directory)| directory)
    else {
        return Ok(None);
    };

    let file_offset = rva_to_offset(&pe, directory.virtual_address).ok_or_else(|| {
        malformed_error!(
            "Resource table RVA {:#x} is not covered by any section",
            directory.virtual_address
        )
    })?;
    let end = file_offset + directory.size as usize;
    let section = mmap
        .get(file_offset..end)
        .ok_or_else(|| out_of_bounds_error!())?;

    read_rsrc(section, directory.virtual_address).map(Some)
}

fn rva_to_offset(pe: &PE, rva: u32) -> Option<usize> {
    pe.sections.iter().find_map(|section| {
        let section_max = section.virtual_address.checked_add(section.virtual_size)?;
        if rva >= section.virtual_address && rva < section_max {
            Some((rva - section.virtual_address + section.pointer_to_raw_data) as usize)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsrc::write_rsrc;

    fn sample_tree() -> ResourceDirectory {
        let mut lang = ResourceDirectory::new();
        lang.entries.push(ResourceEntry {
            name: None,
            id: 0x409,
            node: ResourceNode::Data {
                bytes: vec![0xCA, 0xFE, 0xBA, 0xBE, 0x01],
                code_page: 1252,
                reserved: 0,
            },
        });

        let mut name = ResourceDirectory::new();
        name.entries.push(ResourceEntry::directory(1, lang));
        name.entries.push(ResourceEntry::named_directory("CUSTOM", {
            let mut d = ResourceDirectory::new();
            d.entries.push(ResourceEntry::data(0, vec![0x11; 3]));
            d
        }));

        let mut root = ResourceDirectory::new();
        root.entries.push(ResourceEntry::directory(16, name));
        root
    }

    #[test]
    fn round_trips_writer_output() {
        let mut tree = sample_tree();
        let bytes = write_rsrc(&mut tree, 0x5000).unwrap();

        let reread = read_rsrc(&bytes, 0x5000).unwrap();
        assert_eq!(reread, tree);
    }

    #[test]
    fn truncated_buffer_is_malformed() {
        let mut tree = sample_tree();
        let bytes = write_rsrc(&mut tree, 0x5000).unwrap();

        assert!(read_rsrc(&bytes[..bytes.len() / 2], 0x5000).is_err());
        assert!(read_rsrc(&bytes[..10], 0x5000).is_err());
    }

    #[test]
    fn data_rva_below_section_base_is_malformed() {
        let mut tree = ResourceDirectory::new();
        tree.entries.push(ResourceEntry::data(1, vec![0xAA]));
        let bytes = write_rsrc(&mut tree, 0).unwrap();

        // Reading with a higher base makes every data RVA precede it.
        assert!(read_rsrc(&bytes, 0x1000).is_err());
    }

    #[test]
    fn preserves_header_fields() {
        let mut tree = sample_tree();
        tree.time_date_stamp = 0x1234_5678;
        tree.major_version = 4;

        let bytes = write_rsrc(&mut tree, 0x2000).unwrap();
        let reread = read_rsrc(&bytes, 0x2000).unwrap();

        assert_eq!(reread.time_date_stamp, 0x1234_5678);
        assert_eq!(reread.major_version, 4);
    }

    #[test]
    fn oversized_name_length_prefix_is_rejected() {
        // Root directory with one string-named entry whose name offset points at a
        // length prefix claiming u32::MAX characters. The read must fail on the
        // bounds check instead of attempting a multi-gigabyte allocation.
        let mut data = vec![0u8; 16];
        data[12..14].copy_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&(RSRC_HIGH_BIT | 24).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&u32::MAX.to_le_bytes());

        assert!(read_rsrc(&data, 0).is_err());
    }
}
