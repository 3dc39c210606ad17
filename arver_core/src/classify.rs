/*!
# ARver: Disc Classification
*/

use crate::TrackKind;
use std::fmt;



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Disc Type.
///
/// The layout of a disc determines which tracks count toward the AccurateRip
/// IDs and how rip files line up with the database's track slots.
pub enum DiscType {
	/// # Audio CD (all audio, one session).
	Audio,

	/// # Mixed-Mode CD (leading data track, one session).
	MixedMode,

	/// # Enhanced CD (audio session followed by a data session).
	Enhanced,

	/// # Anything else.
	Unsupported,
}

impl fmt::Display for DiscType {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl DiscType {
	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Audio => "Audio CD",
			Self::MixedMode => "Mixed Mode CD",
			Self::Enhanced => "Enhanced CD",
			Self::Unsupported => "Unsupported",
		}
	}

	#[must_use]
	/// # Is Supported?
	pub const fn is_supported(self) -> bool { ! matches!(self, Self::Unsupported) }

	#[must_use]
	/// # Lookup Index.
	///
	/// Convert a one-based rip index into the one-based track slot of the
	/// database lookup table.
	///
	/// On Mixed-Mode discs the leading data track takes the first slot, so
	/// everything is pushed back by one. The lookup table carries an extra
	/// empty slot so the last rip track still lands somewhere.
	///
	/// Unsupported discs return `None`.
	pub const fn lookup_index(self, rip_idx: usize) -> Option<usize> {
		match self {
			Self::Audio | Self::Enhanced => Some(rip_idx),
			Self::MixedMode => Some(rip_idx + 1),
			Self::Unsupported => None,
		}
	}
}



#[must_use]
/// # Classify Disc.
///
/// Determine the layout from the ordered track kinds and session count. The
/// rules are applied in order:
///
/// 1. No audio at all: unsupported.
/// 2. One session, all audio: Audio CD.
/// 3. One session, data first: Mixed-Mode CD.
/// 4. Multiple sessions, data last: Enhanced CD.
/// 5. Anything else: unsupported.
pub fn classify(kinds: &[TrackKind], sessions: u8) -> DiscType {
	if ! kinds.iter().any(|k| k.is_audio()) { return DiscType::Unsupported; }

	let first = kinds.first().copied();
	let last = kinds.last().copied();
	match sessions {
		0 => DiscType::Unsupported,
		1 =>
			if kinds.iter().all(|k| k.is_audio()) { DiscType::Audio }
			else if first == Some(TrackKind::Data) { DiscType::MixedMode }
			else { DiscType::Unsupported },
		_ =>
			if last == Some(TrackKind::Data) { DiscType::Enhanced }
			else { DiscType::Unsupported },
	}
}
