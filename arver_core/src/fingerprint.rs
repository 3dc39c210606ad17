/*!
# ARver: Disc Fingerprints
*/

use crate::{
	ArverError,
	CD_LEADIN,
	MAX_TRACKS,
	SECTORS_PER_SECOND,
};
use std::{
	fmt,
	str::FromStr,
};



/// # Database Base URL.
const URL_BASE: &str = "http://www.accuraterip.com/accuraterip/";



/// # AccurateRip Disc IDs.
///
/// Return the two AccurateRip identifiers for a disc, given the LBA offsets of
/// its _audio_ tracks and the LBA of the (audio) leadout.
///
/// Both are computed from LSN values, i.e. with the lead-in subtracted:
///
/// * `id1` is the sum of all offsets plus the leadout.
/// * `id2` is the sum of each offset (or one, if zero) times its one-based
///   index, plus the leadout times the track count plus one.
///
/// Everything wraps at `u32`.
///
/// ## Errors
///
/// An error is returned if the list is empty or too long, if any offset falls
/// inside the lead-in or out of order, or if the leadout does not come after
/// the last track.
pub fn accuraterip_ids(offsets: &[u32], leadout: u32) -> Result<(u32, u32), ArverError> {
	check_offsets(offsets, leadout)?;

	let mut id1: u32 = 0;
	let mut id2: u32 = 0;
	for (k, offset) in (1_u32..).zip(offsets.iter().copied()) {
		let lsn = offset - CD_LEADIN;
		id1 = id1.wrapping_add(lsn);
		id2 = id2.wrapping_add(lsn.max(1).wrapping_mul(k));
	}

	let leadout = leadout - CD_LEADIN;
	id1 = id1.wrapping_add(leadout);

	#[allow(clippy::cast_possible_truncation)]
	let len = offsets.len() as u32;
	id2 = id2.wrapping_add(leadout.wrapping_mul(len + 1));

	Ok((id1, id2))
}

/// # FreeDB (CDDB) Disc ID.
///
/// Unlike the AccurateRip IDs, this one is calculated from _every_ track on the
/// disc, data included, along with the disc's true leadout.
///
/// ## Errors
///
/// This returns the same errors as [`accuraterip_ids`].
pub fn freedb_id(offsets: &[u32], leadout: u32) -> Result<u32, ArverError> {
	check_offsets(offsets, leadout)?;

	let digits = offsets.iter().fold(0_u32, |acc, v| {
		let mut secs = v / SECTORS_PER_SECOND;
		let mut sum = 0;
		while secs > 0 {
			sum += secs % 10;
			secs /= 10;
		}
		acc + sum
	});
	let len = leadout / SECTORS_PER_SECOND - offsets[0] / SECTORS_PER_SECOND;

	#[allow(clippy::cast_possible_truncation)]
	let count = offsets.len() as u32;
	Ok((digits % 255) << 24 | len << 8 | count)
}

/// # Sanity Check Offsets.
fn check_offsets(offsets: &[u32], leadout: u32) -> Result<(), ArverError> {
	if offsets.is_empty() { return Err(ArverError::Fingerprint); }
	if usize::from(MAX_TRACKS) < offsets.len() {
		return Err(ArverError::FingerprintOffset(MAX_TRACKS));
	}

	let mut last = None;
	for (k, v) in (1_u8..).zip(offsets.iter().copied()) {
		if v < CD_LEADIN || last.is_some_and(|l| v <= l) {
			return Err(ArverError::FingerprintOffset(k));
		}
		last.replace(v);
	}

	if last.is_some_and(|l| l < leadout) { Ok(()) }
	else { Err(ArverError::FingerprintOffset(0)) }
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # AccurateRip Disc ID.
///
/// This is the full database key for a disc: the track count, the two
/// AccurateRip IDs, and the FreeDB ID. It doubles as the header of every
/// response record, which must match it exactly.
///
/// The string form is `{tracks:03}-{id1:08x}-{id2:08x}-{freedb:08x}`.
pub struct DiscId {
	tracks: u8,
	id1: u32,
	id2: u32,
	freedb: u32,
}

impl fmt::Display for DiscId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{:03}-{:08x}-{:08x}-{:08x}",
			self.tracks,
			self.id1,
			self.id2,
			self.freedb,
		)
	}
}

impl FromStr for DiscId {
	type Err = ArverError;

	fn from_str(src: &str) -> Result<Self, Self::Err> {
		let mut parts = src.trim().split('-');
		let tracks = parts.next()
			.filter(|p| p.len() == 3)
			.and_then(|p| p.parse::<u8>().ok())
			.ok_or(ArverError::InvalidDiscId)?;

		let mut ids = [0_u32; 3];
		for id in &mut ids {
			*id = parts.next()
				.filter(|p| p.len() == 8)
				.and_then(|p| u32::from_str_radix(p, 16).ok())
				.ok_or(ArverError::InvalidDiscId)?;
		}

		if parts.next().is_some() { Err(ArverError::InvalidDiscId) }
		else { Ok(Self::new(tracks, ids[0], ids[1], ids[2])) }
	}
}

impl TryFrom<&str> for DiscId {
	type Error = ArverError;
	#[inline]
	fn try_from(src: &str) -> Result<Self, Self::Error> { src.parse() }
}

impl DiscId {
	#[must_use]
	/// # New.
	pub const fn new(tracks: u8, id1: u32, id2: u32, freedb: u32) -> Self {
		Self { tracks, id1, id2, freedb }
	}

	#[must_use]
	/// # Track Count.
	pub const fn tracks(&self) -> u8 { self.tracks }

	#[must_use]
	/// # AccurateRip ID #1.
	pub const fn id1(&self) -> u32 { self.id1 }

	#[must_use]
	/// # AccurateRip ID #2.
	pub const fn id2(&self) -> u32 { self.id2 }

	#[must_use]
	/// # FreeDB ID.
	pub const fn freedb(&self) -> u32 { self.freedb }

	#[must_use]
	/// # Response File Name.
	///
	/// This is the name the database uses for the disc, and the name cached
	/// copies are saved under.
	pub fn file_name(&self) -> String { format!("dBAR-{self}.bin") }

	#[must_use]
	/// # Checksum URL.
	///
	/// The database shards its files by the last three hex digits of `id1`,
	/// in reverse.
	pub fn checksum_url(&self) -> String {
		let hex = format!("{:08x}", self.id1);
		let hex = hex.as_bytes();
		format!(
			"{URL_BASE}{}/{}/{}/{}",
			char::from(hex[7]),
			char::from(hex[6]),
			char::from(hex[5]),
			self.file_name(),
		)
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_single_track() {
		let (id1, id2) = accuraterip_ids(&[150], 279_187).expect("IDs failed.");
		assert_eq!(id1, 0x0004_41fd);
		assert_eq!(id2, 0x0008_83fb);
		assert_eq!(freedb_id(&[150], 279_187), Ok(0x020e_8801));

		let id = DiscId::new(1, id1, id2, 0x020e_8801);
		assert_eq!(id.to_string(), "001-000441fd-000883fb-020e8801");
	}

	#[test]
	fn t_deterministic() {
		let offsets = [150, 11_413, 25_024, 45_713];
		let a = accuraterip_ids(&offsets, 65_200);
		let b = accuraterip_ids(&offsets, 65_200);
		assert!(a.is_ok(), "IDs failed.");
		assert_eq!(a, b, "Same input, different output!");
	}

	#[test]
	fn t_zero_offset() {
		// The first LSN is zero; id2 counts it as one, id1 does not.
		let (id1, id2) = accuraterip_ids(&[150, 1150], 2150).expect("IDs failed.");
		assert_eq!(id1, 1000 + 2000);
		assert_eq!(id2, 1 + 1000 * 2 + 2000 * 3);

		// With a pregap, there's nothing special.
		let (id1, id2) = accuraterip_ids(&[182, 1150], 2150).expect("IDs failed.");
		assert_eq!(id1, 32 + 1000 + 2000);
		assert_eq!(id2, 32 + 1000 * 2 + 2000 * 3);
	}

	#[test]
	fn t_wrap() {
		// 99 huge tracks overflow u32 many times over.
		let offsets: Vec<u32> = (0..99).map(|k| 150 + k * 40_000_000).collect();
		let leadout = offsets[98] + 1;
		let (id1, _) = accuraterip_ids(&offsets, leadout).expect("IDs failed.");
		let expected = offsets.iter()
			.map(|v| u64::from(v - 150))
			.sum::<u64>() + u64::from(leadout - 150);
		assert_eq!(u64::from(id1), expected & 0xFFFF_FFFF);
	}

	#[test]
	fn t_bad_offsets() {
		assert_eq!(accuraterip_ids(&[], 1000), Err(ArverError::Fingerprint));
		assert_eq!(accuraterip_ids(&[100], 1000), Err(ArverError::FingerprintOffset(1)));
		assert_eq!(accuraterip_ids(&[150, 150], 1000), Err(ArverError::FingerprintOffset(2)));
		assert_eq!(accuraterip_ids(&[150, 500], 500), Err(ArverError::FingerprintOffset(0)));
		assert_eq!(freedb_id(&[], 1000), Err(ArverError::Fingerprint));
	}

	#[test]
	fn t_disc_id_str() {
		let raw = "013-00206791-01486a82-a710de0d";
		let id = DiscId::from_str(raw).expect("Parse failed.");
		assert_eq!(id.tracks(), 13);
		assert_eq!(id.id1(), 0x0020_6791);
		assert_eq!(id.id2(), 0x0148_6a82);
		assert_eq!(id.freedb(), 0xa710_de0d);
		assert_eq!(id.to_string(), raw, "Round trip failed.");
		assert_eq!(
			id.checksum_url(),
			"http://www.accuraterip.com/accuraterip/1/9/7/dBAR-013-00206791-01486a82-a710de0d.bin",
		);

		for bad in [
			"",
			"13-00206791-01486a82-a710de0d",
			"013-00206791-01486a82",
			"013-00206791-01486a82-a710de0d-00",
			"013-0020679z-01486a82-a710de0d",
			"300-00206791-01486a82-a710de0d",
		] {
			assert_eq!(DiscId::try_from(bad), Err(ArverError::InvalidDiscId), "{bad}");
		}
	}
}
