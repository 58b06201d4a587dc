mod common;

use common::{ATTR_ARCHIVE, ATTR_DIRECTORY, ROOT, open_session, raw_entry, temp_file, test_image};
use fat_navigator::test_utils::ImageBuilder;
use fat_navigator::{ErrorKind, FATError, Session, SessionOptions};
use std::path::Path;

/// Root: REPORT.TXT, DOCS/ and a deleted entry.
/// DOCS (clusters 3 -> 20): `.`, `..`, 18 small files, DEEP/ in the second cluster.
/// DOCS/DEEP (cluster 4): `.`, `..`, BIG.BIN spread over clusters 10 -> 6 -> 11.
fn tree() -> (ImageBuilder, Vec<u8>) {
    let big: Vec<u8> = (0..1400u32).map(|i| (i * 7 % 256) as u8).collect();

    let mut image = test_image();
    image
        .chain(&[5])
        .data(5, b"Hello, FAT32!")
        .entry(ROOT, 0, raw_entry(b"REPORT  TXT", ATTR_ARCHIVE, 5, 13))
        .entry(ROOT, 1, raw_entry(b"DOCS       ", ATTR_DIRECTORY, 3, 0))
        .entry(ROOT, 2, raw_entry(b"\xE5LD     TXT", ATTR_ARCHIVE, 7, 3));

    image
        .chain(&[3, 20])
        .entry(3, 0, raw_entry(b".          ", ATTR_DIRECTORY, 3, 0))
        .entry(3, 1, raw_entry(b"..         ", ATTR_DIRECTORY, 0, 0));
    for i in 0..18usize {
        let name = format!("F{i:02}     TXT");
        let (cluster, slot) = if i < 14 { (3, i + 2) } else { (20, i - 14) };
        let name: &[u8; 11] = name.as_bytes().try_into().unwrap();
        image.entry(cluster, slot, raw_entry(name, ATTR_ARCHIVE, 0, 0));
    }
    image.entry(20, 4, raw_entry(b"DEEP       ", ATTR_DIRECTORY, 4, 0));

    image
        .chain(&[4])
        .entry(4, 0, raw_entry(b".          ", ATTR_DIRECTORY, 4, 0))
        .entry(4, 1, raw_entry(b"..         ", ATTR_DIRECTORY, 3, 0))
        .entry(4, 2, raw_entry(b"BIG     BIN", ATTR_ARCHIVE, 10, big.len() as u32))
        .chain(&[10, 6, 11])
        .data(10, &big[..512])
        .data(6, &big[512..1024])
        .data(11, &big[1024..]);

    (image, big)
}

fn listed_names<R: std::io::Read + std::io::Seek>(session: &mut Session<R>) -> Vec<String> {
    session
        .list()
        .unwrap()
        .iter()
        .map(|entry| entry.display_name())
        .collect()
}

#[test]
fn reads_report_from_an_image_file() {
    let mut image = test_image();
    image
        .entry(ROOT, 0, raw_entry(b"REPORT  TXT", ATTR_ARCHIVE, 5, 13))
        .chain(&[5])
        .data(5, b"Hello, FAT32!");
    let file = temp_file(&image);

    let mut session = Session::open(file.path(), &SessionOptions::default()).unwrap();
    assert_eq!(
        session.read_file_range("REPORT.TXT", 0, 13).unwrap(),
        b"Hello, FAT32!"
    );
    assert_eq!(
        session.read_file_range("REPORT.TXT", 7, 100).unwrap(),
        b"FAT32!"
    );
    assert_eq!(&session.volume_label(), b"TESTVOL    ");

    drop(session.close());
}

#[test]
fn open_reports_io_and_format_errors() {
    let err = Session::open(
        Path::new("/nonexistent/image.img"),
        &SessionOptions::default(),
    )
    .err()
    .unwrap();
    assert_eq!(err.kind(), ErrorKind::Io);

    let mut image = test_image();
    image.patch(11, &0u16.to_le_bytes());
    let err = Session::from_reader(std::io::Cursor::new(image.build()), &SessionOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err, FATError::InvalidBytesPerSec(0)));
}

#[test]
fn deleted_entries_are_never_listed() {
    let (image, _) = tree();
    let mut session = open_session(&image);

    assert_eq!(listed_names(&mut session), vec!["REPORT.TXT", "DOCS"]);
    assert!(
        session
            .list()
            .unwrap()
            .iter()
            .all(|entry| entry.name()[0] != 0xE5)
    );
}

#[test]
fn multi_cluster_directories_are_listed_completely() {
    let (image, _) = tree();
    let mut session = open_session(&image);
    session.change_directory("DOCS").unwrap();

    let names = listed_names(&mut session);
    assert_eq!(names.len(), 2 + 18 + 1);
    assert_eq!(names[..2], [".", ".."]);
    assert_eq!(names.last().unwrap(), "DEEP");
}

#[test]
fn dotdot_from_the_root_is_a_no_op() {
    let (image, _) = tree();
    let mut session = open_session(&image);
    let before = session.list().unwrap();

    session.change_directory("..").unwrap();
    assert_eq!(session.current_directory_cluster(), ROOT);
    assert_eq!(session.list().unwrap(), before);
}

#[test]
fn cd_and_back_restores_the_listing() {
    let (image, _) = tree();
    let mut session = open_session(&image);
    let root = session.list().unwrap();

    session.change_directory("docs").unwrap();
    let docs = session.list().unwrap();
    session.change_directory("deep").unwrap();
    assert_eq!(session.current_directory_cluster(), 4);

    session.change_directory("..").unwrap();
    assert_eq!(session.current_directory_cluster(), 3);
    assert_eq!(session.list().unwrap(), docs);

    session.change_directory("..").unwrap();
    assert_eq!(session.current_directory_cluster(), ROOT);
    assert_eq!(session.list().unwrap(), root);
}

#[test]
fn stat_round_trips_with_the_listing() {
    let (image, _) = tree();
    let mut session = open_session(&image);
    session.change_directory("DOCS").unwrap();

    for entry in session.list().unwrap() {
        let stat = session.stat(&entry.display_name()).unwrap();
        assert_eq!(stat.size(), entry.file_size());
        assert_eq!(stat.cluster(), entry.cluster_number());
    }
}

#[test]
fn partial_reads_are_suffixes_of_the_whole_file() {
    let (image, big) = tree();
    let mut session = open_session(&image);
    session.change_directory("DOCS").unwrap();
    session.change_directory("DEEP").unwrap();

    let whole = session.read_file_range("BIG.BIN", 0, big.len() as u64).unwrap();
    assert_eq!(whole, big);
    assert_eq!(session.read_file("big.bin").unwrap(), big);
    assert_eq!(session.clusters("BIG.BIN").unwrap(), vec![10, 6, 11]);

    for k in (0..big.len() as u64).step_by(97) {
        let suffix = session
            .read_file_range("BIG.BIN", k, big.len() as u64 - k)
            .unwrap();
        assert_eq!(suffix, &whole[k as usize..]);
    }

    let err = session
        .read_file_range("BIG.BIN", big.len() as u64, 1)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
}

#[test]
fn cycles_fail_and_leave_the_session_usable() {
    let (mut image, _) = tree();
    // DOCS loops on its second cluster, BIG.BIN loops back to its first one.
    image.fat(20, 20).fat(6, 10);
    let mut session = open_session(&image);

    session.change_directory("DOCS").unwrap();
    let err = session.list().unwrap_err();
    assert!(matches!(err, FATError::ClusterCycle(20)));
    assert_eq!(err.kind(), ErrorKind::Format);

    // DEEP sits in the looping cluster, but is found before the loop is detected.
    session.change_directory("DEEP").unwrap();
    let err = session.read_file("BIG.BIN").unwrap_err();
    assert!(matches!(err, FATError::ClusterCycle(10)));

    session.change_directory("..").unwrap();
    session.change_directory("..").unwrap();
    assert_eq!(
        session.read_file_range("REPORT.TXT", 0, 5).unwrap(),
        b"Hello"
    );
}

#[test]
fn files_are_not_directories() {
    let (image, _) = tree();
    let mut session = open_session(&image);

    let err = session.change_directory("REPORT.TXT").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotADirectory);
    let err = session.change_directory("MISSING").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(session.current_directory_cluster(), ROOT);
}

#[test]
fn clusters_past_the_image_are_format_errors() {
    let (mut image, _) = tree();
    // The root directory continues on a cluster the 32-cluster image does not hold.
    image.fat(ROOT, 100);
    let mut session = open_session(&image);

    let err = session.list().unwrap_err();
    assert!(matches!(
        err,
        FATError::MalformedFatEntry {
            cluster: 2,
            value: 100
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Format);

    let mut image = test_image();
    image.patch(44, &100u32.to_le_bytes());
    let err = Session::from_reader(std::io::Cursor::new(image.build()), &SessionOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err, FATError::InconsistentGeometry(_)));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn entries_pointing_past_the_image_are_rejected() {
    let mut image = test_image();
    image.entry(ROOT, 0, raw_entry(b"FAR     BIN", ATTR_ARCHIVE, 100, 10));
    let mut session = open_session(&image);

    let err = session.read_file("FAR.BIN").unwrap_err();
    assert!(matches!(err, FATError::InvalidCluster(100)));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn directories_are_not_files() {
    let (image, _) = tree();
    let mut session = open_session(&image);

    let err = session.read_file("DOCS").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IsADirectory);
    assert_eq!(listed_names(&mut session), vec!["REPORT.TXT", "DOCS"]);
}
