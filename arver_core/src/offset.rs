/*!
# ARver: Sample Offsets
*/

use crate::{
	AccurateRipDisc,
	ArverError,
	CHECKSUM_SKIP,
	DiscType,
	FrameWindowTable,
};
use dactyl::traits::BytesToSigned;
use std::{
	collections::BTreeMap,
	fmt,
};



/// # Min Offset.
const MIN_OFFSET: i16 = 0 - CHECKSUM_SKIP as i16;

/// # Max Offset.
const MAX_OFFSET: i16 = CHECKSUM_SKIP as i16;

/// # Total Offsets.
pub(crate) const OFFSET_LEN: usize = CHECKSUM_SKIP as usize * 2 + 1;



#[derive(Debug, Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
/// # Sample Offset.
///
/// A signed sample shift within the offset detection radius, `±2940`.
pub struct SampleOffset(i16);

impl fmt::Display for SampleOffset {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:+}", self.0)
	}
}

impl TryFrom<i16> for SampleOffset {
	type Error = ArverError;
	fn try_from(src: i16) -> Result<Self, Self::Error> {
		if (MIN_OFFSET..=MAX_OFFSET).contains(&src) { Ok(Self(src)) }
		else { Err(ArverError::Offset) }
	}
}

impl TryFrom<&[u8]> for SampleOffset {
	type Error = ArverError;
	fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
		let src = src.strip_prefix(b"+").unwrap_or(src);
		if src.is_empty() { Ok(Self(0)) }
		else {
			i16::btoi(src)
				.ok_or(ArverError::Offset)
				.and_then(Self::try_from)
		}
	}
}

impl TryFrom<&str> for SampleOffset {
	type Error = ArverError;
	fn try_from(src: &str) -> Result<Self, Self::Error> {
		Self::try_from(src.trim().as_bytes())
	}
}

impl SampleOffset {
	#[must_use]
	/// # Is Negative?
	pub const fn is_negative(self) -> bool { self.0 < 0 }

	#[must_use]
	/// # Samples.
	pub const fn samples(self) -> i16 { self.0 }

	#[must_use]
	/// # Samples (Absolute).
	pub const fn samples_abs(self) -> u16 { self.0.unsigned_abs() }

	/// # All Offsets.
	///
	/// Iterate through every offset in the radius, from most negative to most
	/// positive.
	pub fn all() -> impl ExactSizeIterator<Item=Self> {
		(0..OFFSET_LEN).map(Self::from_index)
	}

	#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
	/// # From Table Index.
	pub(crate) const fn from_index(idx: usize) -> Self {
		Self(idx as i16 + MIN_OFFSET)
	}

	#[allow(clippy::cast_sign_loss)]
	/// # Table Index.
	pub(crate) const fn index(self) -> usize { (self.0 - MIN_OFFSET) as usize }
}



#[derive(Debug, Clone, Copy, Default, Eq, Hash, PartialEq)]
/// # Offset Vote.
///
/// The tally for a single candidate offset: the number of frame-450 matches
/// pointing at it, and the highest database confidence among them.
pub struct OffsetVote {
	votes: u32,
	confidence: u8,
}

impl OffsetVote {
	#[must_use]
	/// # Vote Count.
	pub const fn votes(&self) -> u32 { self.votes }

	#[must_use]
	/// # Max Confidence.
	pub const fn confidence(&self) -> u8 { self.confidence }
}



#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// # Offset Votes.
///
/// Every candidate pressing offset that was matched at least once, ordered by
/// offset. Outliers are left in; interpretation is up to the caller.
pub struct OffsetVotes(BTreeMap<SampleOffset, OffsetVote>);

impl OffsetVotes {
	/// # Add Vote.
	pub(crate) fn add(&mut self, offset: SampleOffset, confidence: u8) {
		let e = self.0.entry(offset).or_default();
		e.votes += 1;
		e.confidence = e.confidence.max(confidence);
	}

	#[must_use]
	/// # Get.
	pub fn get(&self, offset: SampleOffset) -> Option<OffsetVote> {
		self.0.get(&offset).copied()
	}

	#[must_use]
	/// # Is Empty?
	pub fn is_empty(&self) -> bool { self.0.is_empty() }

	#[must_use]
	/// # Length.
	pub fn len(&self) -> usize { self.0.len() }

	/// # Iterate.
	pub fn iter(&self) -> impl Iterator<Item=(SampleOffset, OffsetVote)> + '_ {
		self.0.iter().map(|(k, v)| (*k, *v))
	}

	#[must_use]
	/// # Most Voted.
	///
	/// Return the offset with the most votes. Ties go to the higher confidence,
	/// then to the offset closest to zero.
	pub fn best(&self) -> Option<(SampleOffset, OffsetVote)> {
		self.iter().max_by(|(ka, a), (kb, b)|
			a.votes.cmp(&b.votes)
				.then(a.confidence.cmp(&b.confidence))
				.then(kb.samples_abs().cmp(&ka.samples_abs()))
		)
	}
}



#[must_use]
/// # Tally Pressing Offsets.
///
/// Each rip track's frame-window table is inverted into a checksum-to-offset
/// map, and each non-zero frame-450 checksum the database has for the
/// corresponding track slot is looked up in it. Every hit is a vote.
///
/// Zero-confidence database entries count here too.
///
/// Tables must be in rip order; `kind` determines which database slot each
/// one is compared against.
pub fn detect_offset(tables: &[FrameWindowTable], disc: &AccurateRipDisc, kind: DiscType)
-> OffsetVotes {
	let db = disc.frame450_lookup();
	let mut out = OffsetVotes::default();
	for (idx, table) in (1..).zip(tables) {
		let Some(chk) = kind.lookup_index(idx)
			.and_then(|slot| db.get(slot - 1))
			.filter(|chk| ! chk.is_empty())
			else { continue; };

		let local = table.invert();
		for (c, conf) in chk {
			if let Some(offset) = local.get(c) { out.add(*offset, *conf); }
		}
	}

	out
}
