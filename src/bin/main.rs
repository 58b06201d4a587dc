//! This is the main entry point for the FAT32 navigator.
//!
//! The program provides an interactive command-line interface for browsing FAT32 disk images.
//! Users can open an image, move through its directories, inspect entries and extract files.
//!
//! Usage: `main [-v]... [IMAGE]`. Each `-v` raises the log verbosity; `IMAGE` is opened at start.

use fat_navigator::commands::Command;
use fat_navigator::traits::LayoutDisplay;
use fat_navigator::{ErrorKind, FATError, Session, SessionOptions};
use log::{error, info, warn};
use std::{
    env,
    fs::File,
    io::{self, Read, Seek, Write},
    path::Path,
};

/// Represents the runtime state of the program.
struct RunState {
    /// The currently opened image, if any.
    session: Option<Session<File>>,
    /// Enable the strict validation of the bpb
    strict: bool,
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let verbose = args.iter().filter(|arg| arg.as_str() == "-v").count();

    stderrlog::new()
        .module(module_path!())
        .module("fat_navigator")
        .verbosity(1 + verbose)
        .init()
        .unwrap();

    let mut run_state = RunState {
        session: None,
        strict: true,
    };

    if let Some(path) = args.iter().find(|arg| !arg.starts_with('-')) {
        open_image(&mut run_state, path);
    }

    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut s = String::new();
        match io::stdin().read_line(&mut s) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error!("Failed to read command: {e}");
                break;
            }
        }

        match Command::from_string(&s) {
            Command::Quit => break,
            Command::Open(path) => open_image(&mut run_state, &path),
            Command::Close => match run_state.session.take() {
                Some(session) => {
                    drop(session.close());
                    info!("Image closed.");
                }
                None => warn!("File system not open."),
            },
            Command::Skip => run_state.strict = false,
            Command::Unknown(s) => error!("Unknown command: {s:?}"),
            Command::Invalid(s) => error!("{s}"),
            Command::Empty => {}
            cmd => match run_state.session.as_mut() {
                Some(session) => {
                    if let Err(err) = run_command(session, cmd) {
                        report(&err);
                    }
                }
                None => warn!("File system image must be opened first."),
            },
        }
    }
}

fn open_image(run_state: &mut RunState, path: &str) {
    if run_state.session.is_some() {
        error!("File system image already open.");
        return;
    }

    let options = SessionOptions::default().strict(run_state.strict);
    match Session::open(Path::new(path), &options) {
        Ok(session) => run_state.session = Some(session),
        Err(err) => error!("{err}"),
    }
}

/// Runs a command needing an open image.
fn run_command(session: &mut Session<File>, cmd: Command) -> Result<(), FATError> {
    match cmd {
        Command::Info => print_info(session),
        Command::Layout => match session.volume_info().display_layout(3) {
            Ok(layout) => print!("{layout}"),
            Err(e) => error!("Print layout error: {e}"),
        },
        Command::Ls => {
            for entry in session.list()? {
                if !entry.is_volume_label() {
                    println!("{entry}");
                }
            }
        }
        Command::Cd(name) => session.change_directory(&name)?,
        Command::Get(name) => get_file(session, &name)?,
        Command::Stat(name) => println!("{}", describe_stat(session, &name)?),
        Command::Volume => {
            let label = session.volume_label();
            println!("Volume name: {}", String::from_utf8_lossy(&label).trim_end());
        }
        Command::Read {
            name,
            offset,
            length,
        } => print_hex(offset, &session.read_file_range(&name, offset, length)?),
        other => warn!("{other:?} does not apply to an open image."),
    }

    Ok(())
}

/// Expected outcomes are warnings, everything else is an error.
fn report(err: &FATError) {
    match err.kind() {
        ErrorKind::NotFound
        | ErrorKind::NotADirectory
        | ErrorKind::IsADirectory
        | ErrorKind::OutOfRange => warn!("{err}"),
        ErrorKind::Io | ErrorKind::Format => error!("{err}"),
    }
}

fn print_info(session: &Session<File>) {
    let vol = session.volume_info();

    macro_rules! field {
        ($name:expr, $val:expr) => {
            println!("  {:<18} {:>10}  0x{:X}", $name, $val, $val)
        };
    }

    println!("BIOS Parameter Block:");
    println!(
        "  {:<18} {:>10}",
        "BS_OEMName",
        String::from_utf8_lossy(&vol.oem_name())
    );
    field!("BPB_BytesPerSec", vol.bytes_per_sector());
    field!("BPB_SecPerClus", vol.sectors_per_cluster());
    field!("BPB_RsvdSecCnt", vol.reserved_sectors());
    field!("BPB_NumFATs", vol.num_fats());
    field!("BPB_RootEntCnt", vol.root_entry_count());
    field!("BPB_FATSz32", vol.fat_size());
    field!("BPB_RootClus", vol.root_cluster());
    field!("BS_VolID", vol.volume_id());
}

/// Renders the metadata of `name`. A broken chain only affects the cluster count.
fn describe_stat<R: Read + Seek>(session: &mut Session<R>, name: &str) -> Result<String, FATError> {
    let stat = session.stat(name)?;
    let cluster_count = match session.clusters(name) {
        Ok(clusters) => clusters.len().to_string(),
        Err(err) => format!("unknown ({err})"),
    };

    Ok(format!(
        "Size: {}\nAttr: 0x{:02X}\nStarting Cluster: {}\nCluster High: {}\nCluster Count: {}",
        stat.size(),
        stat.attr(),
        stat.cluster(),
        stat.cluster_high(),
        cluster_count
    ))
}

/// Copies `name` into a file of the same name in the working directory of the host.
fn get_file(session: &mut Session<File>, name: &str) -> Result<(), FATError> {
    let data = session.read_file(name)?;

    let mut f = File::create(name)?;
    f.write_all(&data)?;
    println!("{} bytes written to {name}", data.len());
    Ok(())
}

fn print_hex(offset: u64, bytes: &[u8]) {
    for (i, chunk) in bytes.chunks(16).enumerate() {
        print!("0x{:08X}: ", offset + i as u64 * 16);
        for byte in chunk {
            print!("{byte:02X} ");
        }
        println!();
    }
}
