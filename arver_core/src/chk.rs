/*!
# ARver: Checksums
*/

use crate::{
	ArverError,
	CHECKSUM_SKIP,
	FRAME450_SECTOR,
	MAX_TRACKS,
	NULL_SAMPLE,
	Sample,
	SAMPLES_PER_SECTOR,
	SampleOffset,
};
use crate::offset::OFFSET_LEN;
use crc32fast::Hasher as Crc;
use dactyl::NoHash;
use std::collections::HashMap;



/// # CRC Batch Size (in samples).
const CRC_CHUNK: usize = 4096;

/// # First Frame-450 Sample.
///
/// This is the (zero-based) start of the window at offset zero.
const FRAME450_START: usize = FRAME450_SECTOR as usize * SAMPLES_PER_SECTOR as usize;



#[derive(Debug, Clone, Copy, Default, Eq, Hash, PartialEq)]
/// # Track Checksums.
///
/// All of the checksums computed for a given track: AccurateRip v1 and v2, a
/// plain CRC32, and a CRC32 that ignores silent channel samples.
pub struct ChecksumSet {
	arv1: u32,
	arv2: u32,
	crc32: u32,
	crc_skip_silence: u32,
}

impl ChecksumSet {
	#[must_use]
	/// # AccurateRip v1.
	pub const fn arv1(&self) -> u32 { self.arv1 }

	#[must_use]
	/// # AccurateRip v2.
	pub const fn arv2(&self) -> u32 { self.arv2 }

	#[must_use]
	/// # CRC32.
	pub const fn crc32(&self) -> u32 { self.crc32 }

	#[must_use]
	/// # CRC32 (Skip Silence).
	pub const fn crc_skip_silence(&self) -> u32 { self.crc_skip_silence }
}



/// # Track Checksums.
///
/// Crunch the AccurateRip v1 and v2 checksums, along with the two CRC32
/// variants, for a single track's worth of samples.
///
/// The AccurateRip computations are the sum of the product of each sample
/// (read as a little-endian `u32`) and its one-based position in the track.
/// Version one keeps only the low 32 bits of each product; version two adds
/// the high bits back in. Everything wraps.
///
/// For the first track, positions below `2940` are ignored, and for the last
/// track, positions above `len - 2940` are ignored. A single-track disc gets
/// both treatments.
///
/// The CRC32s cover every byte, except the skip-silence variant, which first
/// drops every zero-valued 16-bit channel sample.
///
/// ## Errors
///
/// This will return an error if the track number is zero or greater than the
/// total, if the total exceeds `99`, or if there is no data.
pub fn checksums(data: &[Sample], track: u8, total: u8)
-> Result<ChecksumSet, ArverError> {
	if track == 0 || total < track || MAX_TRACKS < total {
		return Err(ArverError::InvalidTrack(track, total));
	}
	if data.is_empty() { return Err(ArverError::EmptyTrack); }

	let (arv1, arv2) = arv(data, track == 1, track == total);
	Ok(ChecksumSet {
		arv1,
		arv2,
		crc32: crc32(data),
		crc_skip_silence: crc_skip_silence(data),
	})
}

#[allow(clippy::cast_possible_truncation)]
/// # AccurateRip v1 and v2.
fn arv(data: &[Sample], first: bool, last: bool) -> (u32, u32) {
	// One-based, inclusive.
	let start =
		if first { CHECKSUM_SKIP as usize }
		else { 1 };
	let end =
		if last { data.len().saturating_sub(CHECKSUM_SKIP as usize) }
		else { data.len() };
	if end < start { return (0, 0); }

	let mut v1 = 0_u32;
	let mut v2 = 0_u32;
	for (k, sample) in (start as u64..).zip(&data[start - 1..end]) {
		let kv = k * u64::from(u32::from_le_bytes(*sample));
		let lo = kv as u32;
		v1 = v1.wrapping_add(lo);
		v2 = v2.wrapping_add(lo).wrapping_add((kv >> 32) as u32);
	}

	(v1, v2)
}

/// # CRC32.
///
/// Samples are fed to the hasher in batches rather than one at a time.
fn crc32(data: &[Sample]) -> u32 {
	let mut crc = Crc::new();
	let mut buf = Vec::with_capacity(CRC_CHUNK * std::mem::size_of::<Sample>());
	for chunk in data.chunks(CRC_CHUNK) {
		buf.clear();
		for sample in chunk { buf.extend_from_slice(sample.as_slice()); }
		crc.update(&buf);
	}
	crc.finalize()
}

/// # CRC32 (Skip Silence).
///
/// Every zero-valued 16-bit channel sample is dropped, wherever it appears,
/// and the CRC is taken over what remains. An all-silent track has nothing
/// left to hash, and returns zero.
fn crc_skip_silence(data: &[Sample]) -> u32 {
	let mut crc = Crc::new();
	let mut buf = Vec::with_capacity(CRC_CHUNK * std::mem::size_of::<Sample>());
	for chunk in data.chunks(CRC_CHUNK) {
		buf.clear();
		for sample in chunk {
			if NULL_SAMPLE.eq(sample) { continue; }
			if sample[0] != 0 || sample[1] != 0 { buf.extend_from_slice(&sample[..2]); }
			if sample[2] != 0 || sample[3] != 0 { buf.extend_from_slice(&sample[2..]); }
		}
		crc.update(&buf);
	}
	crc.finalize()
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Frame-Window Table.
///
/// This holds the position-weighted (v1-style) checksum of the sector-sized
/// window starting at sample `450 * 588 + offset` for every offset in the
/// `±2940` search radius.
///
/// Windows that fall outside the track are zero; a track needs at least `456`
/// sectors for a complete table.
pub struct FrameWindowTable(Box<[u32]>);

impl FrameWindowTable {
	#[must_use]
	/// # Get Checksum.
	pub fn get(&self, offset: SampleOffset) -> u32 {
		self.0.get(offset.index()).copied().unwrap_or(0)
	}

	/// # Iterate.
	///
	/// Return each offset/checksum pair, from most negative to most positive.
	pub fn iter(&self) -> impl Iterator<Item=(SampleOffset, u32)> + '_ {
		SampleOffset::all().zip(self.0.iter().copied())
	}

	#[must_use]
	/// # Is Complete?
	///
	/// Returns `true` if every entry is non-zero, i.e. every window fit
	/// inside the track (and was not pure silence).
	pub fn is_complete(&self) -> bool { self.0.iter().all(|v| 0 != *v) }

	#[must_use]
	/// # Invert.
	///
	/// Return a checksum-to-offset map, skipping zeroes. If the same checksum
	/// turns up at more than one offset, the one closest to zero wins.
	pub fn invert(&self) -> HashMap<u32, SampleOffset, NoHash> {
		let mut out = HashMap::with_capacity_and_hasher(OFFSET_LEN, NoHash::default());
		let zero = SampleOffset::default().index();

		// Work outward from zero: 0, -1, 1, -2, 2…
		let mut order = vec![zero];
		for k in 1..=zero {
			order.push(zero - k);
			order.push(zero + k);
		}

		for idx in order {
			let chk = self.0[idx];
			if chk != 0 {
				out.entry(chk).or_insert_with(|| SampleOffset::from_index(idx));
			}
		}

		out
	}
}

#[must_use]
#[allow(clippy::cast_possible_truncation)]
/// # Frame-Window Table.
///
/// Build the [`FrameWindowTable`] for a track.
///
/// Rather than crunch each window from scratch, the table slides: moving the
/// window one sample to the right drops the old sum once and adds the new
/// sample `588` times.
pub fn frame_window_table(data: &[Sample]) -> FrameWindowTable {
	const WINDOW: usize = SAMPLES_PER_SECTOR as usize;

	let mut out = vec![0_u32; OFFSET_LEN];

	// The first window at offset -2940 begins here.
	let first = FRAME450_START - CHECKSUM_SKIP as usize;
	if first + WINDOW <= data.len() {
		let value = |idx: usize| u32::from_le_bytes(data[idx]);

		// The first window.
		let mut chk = 0_u32;
		let mut sum = 0_u32;
		for (k, idx) in (1_u32..).zip(first..first + WINDOW) {
			let v = value(idx);
			chk = chk.wrapping_add(v.wrapping_mul(k));
			sum = sum.wrapping_add(v);
		}
		out[0] = chk;

		// And the rest, for as long as the data holds out.
		let last = (data.len() - WINDOW - first).min(OFFSET_LEN - 1);
		for idx in 1..=last {
			let start = first + idx;
			let old = value(start - 1);
			let new = value(start + WINDOW - 1);
			chk = chk
				.wrapping_sub(sum)
				.wrapping_add(new.wrapping_mul(WINDOW as u32));
			sum = sum.wrapping_sub(old).wrapping_add(new);
			out[idx] = chk;
		}
	}

	FrameWindowTable(out.into_boxed_slice())
}



#[cfg(test)]
/// # Pseudo-Random Samples (Testing).
pub(crate) fn test_noise(mut seed: u32, len: usize) -> Vec<Sample> {
	(0..len).map(|_| {
		seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		seed.to_le_bytes()
	}).collect()
}
