use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while merging native Win32
/// resource trees, serializing `.rsrc` sections, and rewriting BAML resource streams. Each
/// variant provides specific context about the failure mode.
///
/// Recoverable merge conflicts (duplicate resources, mismatched tree shapes, non-dictionary
/// theme documents) are *not* errors: they are resolved in place by the merge policy and
/// reported through the [`crate::Log`] boundary. Only structurally undecodable input
/// surfaces as an `Error`.
///
/// # Examples
///
/// ```rust
/// use dotmerge::{rsrc, Error};
///
/// match rsrc::read_rsrc(&[0x01, 0x02], 0x4000) {
///     Ok(tree) => println!("parsed {} entries", tree.entries.len()),
///     Err(Error::OutOfBounds) => eprintln!("truncated .rsrc section"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("malformed input: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged and could not be parsed.
    ///
    /// This error indicates that a `.rsrc` section or a BAML stream does not conform to
    /// its binary format. The error includes the source location where the malformation
    /// was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the input.
    ///
    /// This error occurs when trying to read data beyond the end of a buffer.
    /// It's a safety check to prevent buffer overruns during parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This input is not supported.
    ///
    /// Indicates that the input uses features outside what the merge engine handles,
    /// such as a Win32 resource directory nested deeper than the three levels the
    /// PE format defines.
    #[error("This input is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE parsing.
    ///
    /// The goblin crate is used for low-level PE format parsing when locating the
    /// resource data directory of an input image. This error wraps any failures
    /// from that parsing layer.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),
}

/// Shorthand result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
