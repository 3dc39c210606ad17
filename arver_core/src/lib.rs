/*!
# ARver: Library

Verify ripped CD audio tracks against the AccurateRip checksum database.

The general flow is:

1. Build a [`DiscToc`] (by hand, from a drive reader, or from a CDTOC string);
   this classifies the disc and derives its [`DiscId`].
2. Fetch and decode the database response into an [`AccurateRipDisc`] with a
   [`ResponseFetcher`].
3. Load the ripped files into a [`Rip`] with a [`SampleSource`].
4. Call [`Rip::verify`] for a [`DiscVerdict`], and/or [`Rip::detect_offset`]
   to guess the pressing offset.
*/

#![deny(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::doc_markdown,
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]

mod cache;
mod chk;
mod classify;
mod dbar;
mod error;
mod fingerprint;
mod log;
mod offset;
mod opts;
mod rip;
mod source;
mod toc;
mod verify;

pub use chk::{
	checksums,
	ChecksumSet,
	frame_window_table,
	FrameWindowTable,
};
pub use classify::{
	classify,
	DiscType,
};
pub use dbar::{
	AccurateRipDisc,
	LookupEntry,
	LookupTable,
	Response,
	ResponseTrack,
};
pub use error::ArverError;
pub use fingerprint::{
	accuraterip_ids,
	DiscId,
	freedb_id,
};
pub use log::{
	VerifyLog,
	VerifyLogKind,
};
pub use offset::{
	detect_offset,
	OffsetVote,
	OffsetVotes,
	SampleOffset,
};
pub use opts::VerifyOptions;
pub use rip::{
	HTOA_NAMES,
	Rip,
	RipTrack,
};
pub use source::{
	CacheFetcher,
	HttpFetcher,
	ResponseFetcher,
	SampleSource,
	WavSource,
};
pub use toc::{
	DiscToc,
	Pregap,
	TrackKind,
	TrackOffset,
};
pub use verify::{
	ChecksumVersion,
	DiscVerdict,
	TrackStatus,
	Verdict,
	VerificationResult,
};



/// # 16-bit Stereo Sample (raw PCM bytes).
///
/// This is one left/right pair, little-endian, exactly as it appears in a WAV
/// data chunk. AccurateRip reads it as a single `u32`.
pub type Sample = [u8; 4];

/// # Samples per sector.
pub const SAMPLES_PER_SECTOR: u16 = 588;

/// # Number of lead-in sectors.
///
/// All discs have a 2-second region at the start before any data. LBA values
/// include it; LSN values do not.
pub const CD_LEADIN: u32 = 150;

/// # Sectors per second.
pub const SECTORS_PER_SECOND: u32 = 75;

/// # Maximum number of tracks.
pub const MAX_TRACKS: u8 = 99;

/// # Enhanced CD Session Gap (in sectors).
///
/// Multi-session discs have this many sectors between the end of the audio
/// session and the start of the data session.
pub const SESSION_GAP: u32 = 11_400;

/// # Checksum Edge Skip (in samples).
///
/// AccurateRip ignores five sectors at the start of the first track and the
/// end of the last. This is also the offset detection search radius.
pub const CHECKSUM_SKIP: u32 = 5 * SAMPLES_PER_SECTOR as u32;

/// # Frame-450 Sector.
///
/// The sector whose (shifted) checksums are used for offset detection.
pub const FRAME450_SECTOR: u32 = 450;

/// # Null sample.
pub const NULL_SAMPLE: Sample = [0, 0, 0, 0];

/// # Wave Spec.
///
/// The only audio format AccurateRip checksums make sense for: CDDA.
pub(crate) const WAVE_SPEC: hound::WavSpec = hound::WavSpec {
	channels: 2,
	sample_rate: 44100,
	bits_per_sample: 16,
	sample_format: hound::SampleFormat::Int,
};
