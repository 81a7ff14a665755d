#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for the archive lifecycle through the public API
//!
//! Archives are built in memory, serialized, reparsed and edited again the
//! way a tool would between sessions.

use img_archive::constants::{BLOCK_SIZE, RECORD_SIZE};
use img_archive::{AccessMode, Archive, ArchiveError, ArchiveOptions, Layout, blocks_for};
use pretty_assertions::assert_eq;

fn content(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| ((i as u8) ^ seed) | 0x80).collect()
}

fn reopen(archive: &mut Archive) -> Archive {
    archive.sync().unwrap();
    Archive::parse(
        archive.data().to_vec(),
        archive.index_data().map(<[u8]>::to_vec),
    )
    .unwrap()
}

#[test]
fn unified_archive_survives_sessions() {
    let mut archive = Archive::create(Layout::Unified);
    archive.add("infernus.dff", &content(12_000, 1)).unwrap();
    archive.add("infernus.txd", &content(40_000, 2)).unwrap();
    archive.add("handling.cfg", &content(700, 3)).unwrap();

    let mut second = reopen(&mut archive);
    assert_eq!(second.layout(), Layout::Unified);
    assert_eq!(second.len(), 3);

    second.remove("INFERNUS.TXD").unwrap();
    second.rename("handling.cfg", "handling_v2.cfg").unwrap();
    second.pack().unwrap();

    let third = reopen(&mut second);
    let names: Vec<_> = third.entries().iter().map(|e| e.name().to_string()).collect();
    assert_eq!(names, vec!["infernus.dff", "handling_v2.cfg"]);

    let dff = third.lookup("infernus.dff").unwrap();
    assert_eq!(dff.offset, 1);
    assert_eq!(u64::from(dff.size), blocks_for(12_000));
    let stored = third.read_payload(dff).unwrap();
    assert_eq!(&stored[..12_000], &content(12_000, 1)[..]);

    let cfg = third.lookup("handling_v2.cfg").unwrap();
    assert_eq!(cfg.offset, dff.offset + dff.size);
    assert_eq!(third.total_blocks(), 1 + u64::from(dff.size) + u64::from(cfg.size));
    assert_eq!(third.data().len() as u64, third.total_blocks() * BLOCK_SIZE as u64);
}

#[test]
fn split_archive_survives_sessions() {
    let mut archive = Archive::create(Layout::Split);
    archive.add("gta3.ide", &content(3000, 4)).unwrap();
    archive.add("gta3.ipl", &content(10, 5)).unwrap();

    let mut second = reopen(&mut archive);
    assert_eq!(second.layout(), Layout::Split);
    assert_eq!(second.index_data().unwrap().len(), 2 * RECORD_SIZE);
    assert_eq!(second.entries()[0].offset, 0);

    second.remove("gta3.ide").unwrap();
    assert_eq!(second.pack().unwrap(), 2);

    let third = reopen(&mut second);
    assert_eq!(third.len(), 1);
    assert_eq!(third.entries()[0].offset, 0);
    assert_eq!(third.data().len(), BLOCK_SIZE);
}

#[test]
fn many_entries_grow_the_header() {
    let mut archive = Archive::create(Layout::Unified);
    for i in 0..200u32 {
        archive
            .add(&format!("model{i:03}.dff"), &content(50 + i as usize, i as u8))
            .unwrap();
    }

    // 8 + 200 * 32 bytes need four blocks of header
    assert_eq!(archive.header_reserved_blocks(), 4);

    let reopened = reopen(&mut archive);
    assert_eq!(reopened.len(), 200);
    for i in 0..200u32 {
        let expected = content(50 + i as usize, i as u8);
        let stored = reopened
            .read_payload_by_name(&format!("MODEL{i:03}.DFF"))
            .unwrap()
            .unwrap();
        assert_eq!(&stored[..expected.len()], &expected[..]);
        assert!(stored[expected.len()..].iter().all(|&b| b == 0));
    }
}

#[test]
fn read_only_archive_is_untouched() {
    let mut source = Archive::create(Layout::Unified);
    source.add("a.dat", b"abc").unwrap();
    source.sync().unwrap();
    let bytes = source.into_buffers().data;

    let options = ArchiveOptions::new().mode(AccessMode::ReadOnly);
    let mut archive = Archive::parse_with_options(bytes.clone(), None, options).unwrap();
    assert_eq!(archive.mode(), AccessMode::ReadOnly);
    assert!(matches!(archive.add("b.dat", b""), Err(ArchiveError::ReadOnly)));
    archive.sync().unwrap();
    assert_eq!(archive.into_buffers().data, bytes);
}

#[test]
fn unsorted_table_is_normalized_and_rewritten() {
    let mut data = vec![0u8; 4 * BLOCK_SIZE];
    data[..4].copy_from_slice(b"VER2");
    data[4..8].copy_from_slice(&2u32.to_le_bytes());
    for (slot, (offset, name)) in [(3u32, "late"), (1u32, "early")].into_iter().enumerate() {
        let at = 8 + slot * RECORD_SIZE;
        data[at..at + 4].copy_from_slice(&offset.to_le_bytes());
        data[at + 4..at + 8].copy_from_slice(&1u32.to_le_bytes());
        data[at + 8..at + 8 + name.len()].copy_from_slice(name.as_bytes());
    }

    let mut archive = Archive::parse(data, None).unwrap();
    assert_eq!(archive.entries()[0].name(), "early");

    let reopened = reopen(&mut archive);
    let offsets: Vec<_> = reopened.entries().iter().map(|e| e.offset).collect();
    assert_eq!(offsets, vec![1, 3]);
    assert_eq!(&reopened.data()[8 + 8..8 + 8 + 5], b"early");
}
