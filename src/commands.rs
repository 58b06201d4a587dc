//! Parsing of the lines typed in the navigator shell.
//!
//! Each line becomes one [`Command`]. Parsing never fails: malformed lines map to
//! `Command::Invalid` or `Command::Unknown` and the shell reports them.

/// Represents a user command in the FAT32 navigator shell.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// `quit` or `exit`
    Quit,
    /// Open the image file at the given path.
    Open(String),
    /// Close the open image.
    Close,
    /// Print the BPB fields of the open volume.
    Info,
    /// Print the region layout of the open volume.
    Layout,
    /// List the current directory.
    Ls,
    /// Change the current directory.
    Cd(String),
    /// Copy a file of the current directory into the working directory of the host.
    Get(String),
    /// Print the metadata of an entry of the current directory.
    Stat(String),
    /// Print the volume label.
    Volume,
    /// Print `length` bytes of a file starting at `offset`.
    Read {
        name: String,
        offset: u64,
        length: u64,
    },
    /// Skip the strict BPB validation for the next images to open.
    Skip,
    /// First word of a line that names no command.
    Unknown(String),
    /// Known command with missing or unparsable arguments, with the message to print.
    Invalid(String),
    /// Command for an empty input.
    Empty,
}

impl Command {
    /// Parses a string into a `Command` instance.
    ///
    /// # Parameters
    /// - `s`: A string slice representing the user input.
    ///
    /// # Returns
    /// - The matching command when the input is well formed.
    /// - `Command::Unknown` if the input does not match any known command.
    /// - `Command::Invalid` if a command misses an argument or an argument does not parse.
    /// - `Command::Empty` if the input is empty or contains only whitespace.
    pub fn from_string(s: &str) -> Self {
        let mut parts = s.split_whitespace();
        match parts.next() {
            Some("quit") | Some("exit") => Command::Quit,
            Some("open") => match parts.next() {
                Some(arg) => Command::Open(arg.to_string()),
                None => Command::Invalid(String::from(
                    "Missing arg: 'open' expects the path to a '.img' file.",
                )),
            },
            Some("close") => Command::Close,
            Some("info") => Command::Info,
            Some("layout") => Command::Layout,
            Some("ls") => Command::Ls,
            Some("cd") => match parts.next() {
                Some(arg) => Command::Cd(arg.to_string()),
                None => Command::Invalid(String::from(
                    "Missing arg: 'cd' expects the name of a directory.",
                )),
            },
            Some("get") => match parts.next() {
                Some(arg) => Command::Get(arg.to_string()),
                None => Command::Invalid(String::from(
                    "Missing arg: 'get' expects the name of a file.",
                )),
            },
            Some("stat") => match parts.next() {
                Some(arg) => Command::Stat(arg.to_string()),
                None => Command::Invalid(String::from(
                    "Missing arg: 'stat' expects the name of a file or directory.",
                )),
            },
            Some("volume") => Command::Volume,
            Some("read") => match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(offset), Some(length)) => {
                    match (offset.parse::<u64>(), length.parse::<u64>()) {
                        (Ok(offset), Ok(length)) => Command::Read {
                            name: name.to_string(),
                            offset,
                            length,
                        },
                        _ => Command::Invalid(String::from(
                            "Arg parsing error: 'read' expects unsigned integers for the offset and the length.",
                        )),
                    }
                }
                _ => Command::Invalid(String::from(
                    "Missing arg: 'read' expects a file name, an offset and a length.",
                )),
            },
            Some("skip") => Command::Skip,
            Some(other) => Command::Unknown(other.to_string()),
            None => Command::Empty,
        }
    }
}
