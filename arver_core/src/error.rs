/*!
# ARver: Errors
*/

use cdtoc::TocError;
use fyi_msg::Msg;
use std::{
	error::Error,
	fmt,
};



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Errors.
pub enum ArverError {
	/// # Bug!
	Bug(&'static str),

	/// # CDTOC passthrough.
	Cdtoc(TocError),

	/// # Zero-length track.
	EmptyTrack,

	/// # Missing offsets (fingerprint).
	Fingerprint,

	/// # Invalid offset for track (fingerprint).
	FingerprintOffset(u8),

	/// # Response header does not match the disc.
	HeaderMismatch(String),

	/// # Invalid disc ID string.
	InvalidDiscId,

	/// # Invalid table of contents.
	InvalidToc(&'static str),

	/// # Invalid track number/total.
	InvalidTrack(u8, u8),

	/// # Track lengths differ from the TOC.
	LengthMismatch(usize),

	/// # Response data is structurally invalid.
	Malformed(&'static str),

	/// # No usable rip files.
	NoTracks,

	/// # No database entry for this disc.
	NotFound(String),

	/// # Offset out of range.
	Offset,

	/// # Unable to read an audio file.
	ReadFailure(String),

	/// # Wrong number of rip files.
	TrackCountMismatch(usize, usize),

	/// # Network/transport failure.
	Transport(String),

	/// # Response data ended in the middle of a record.
	Truncated,

	/// # Disc layout does not fit any known type.
	UnsupportedDisc,

	/// # Audio file is not 16-bit stereo 44.1kHz PCM.
	UnsupportedFormat(String),

	/// # Writing to disk.
	Write(String),
}

impl Error for ArverError {}

impl From<TocError> for ArverError {
	#[inline]
	fn from(err: TocError) -> Self { Self::Cdtoc(err) }
}

impl From<ArverError> for Msg {
	#[inline]
	fn from(src: ArverError) -> Self { Self::error(src.to_string()) }
}

impl fmt::Display for ArverError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bug(s) => write!(f, "Bug: {s}."),
			Self::Cdtoc(s) => write!(f, "{s}"),
			Self::EmptyTrack => f.write_str("The track has no audio samples."),
			Self::Fingerprint => f.write_str("Disc IDs cannot be computed without track offsets."),
			Self::FingerprintOffset(n) => write!(f, "Invalid offset for track #{n}."),
			Self::HeaderMismatch(s) => write!(f, "Unexpected AccurateRip response header: {s}."),
			Self::InvalidDiscId => f.write_str("Invalid AccurateRip disc ID."),
			Self::InvalidToc(s) => write!(f, "Invalid table of contents: {s}."),
			Self::InvalidTrack(n, total) => write!(f, "Invalid track: {n}/{total}."),
			Self::LengthMismatch(n) =>
				if *n == 1 { f.write_str("Track length mismatch (1 track); retry in permissive mode to verify anyway.") }
				else { write!(f, "Track length mismatch ({n} tracks); retry in permissive mode to verify anyway.") },
			Self::Malformed(s) => write!(f, "Malformed AccurateRip response: {s}."),
			Self::NoTracks => f.write_str("No usable audio files were found."),
			Self::NotFound(s) => write!(f, "The disc {s} is not in the AccurateRip database."),
			Self::Offset => f.write_str("Invalid sample offset."),
			Self::ReadFailure(s) => write!(f, "Unable to read audio samples from {s}."),
			Self::TrackCountMismatch(files, tracks) => write!(
				f,
				"Track number mismatch: {files} to verify, but {tracks} on disc.",
			),
			Self::Transport(s) => write!(f, "Unable to fetch AccurateRip data: {s}"),
			Self::Truncated => f.write_str("The AccurateRip response is truncated."),
			Self::UnsupportedDisc => f.write_str("Missing or unsupported disc type."),
			Self::UnsupportedFormat(s) => write!(f, "Unsupported audio format: {s}."),
			Self::Write(s) => write!(f, "Unable to write to {s}."),
		}
	}
}
