/*!
# ARver: AccurateRip Responses
*/

use crate::{
	ArverError,
	cache::cache_read,
	DiscId,
	ResponseFetcher,
};
use dactyl::NoHash;
use std::{
	collections::HashMap,
	path::Path,
};



/// # Header Length (in bytes).
const HEADER_LEN: usize = 13;

/// # Track Record Length (in bytes).
const TRACK_LEN: usize = 9;



#[derive(Debug, Clone, Copy, Default, Eq, Hash, PartialEq)]
/// # Response Track.
///
/// A single track record from a response: the number of submitters who
/// agreed, the AccurateRip checksum they agreed on, and the frame-450
/// checksum used for offset detection.
pub struct ResponseTrack {
	confidence: u8,
	checksum: u32,
	frame450: u32,
}

impl ResponseTrack {
	#[must_use]
	/// # New.
	pub const fn new(confidence: u8, checksum: u32, frame450: u32) -> Self {
		Self { confidence, checksum, frame450 }
	}

	#[must_use]
	/// # Confidence.
	pub const fn confidence(&self) -> u8 { self.confidence }

	#[must_use]
	/// # Checksum.
	pub const fn checksum(&self) -> u32 { self.checksum }

	#[must_use]
	/// # Frame-450 Checksum.
	pub const fn frame450(&self) -> u32 { self.frame450 }

	/// # From Bytes.
	fn from_bytes(src: &[u8]) -> Self {
		Self {
			confidence: src[0],
			checksum: u32_le(src, 1),
			frame450: u32_le(src, 5),
		}
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Response.
///
/// One database submission block: a header identifying the disc followed by
/// exactly one record per track.
pub struct Response {
	id: DiscId,
	tracks: Vec<ResponseTrack>,
}

impl Response {
	/// # New.
	///
	/// ## Errors
	///
	/// The number of tracks must be non-zero and match the ID's track count.
	pub fn new(id: DiscId, tracks: Vec<ResponseTrack>) -> Result<Self, ArverError> {
		if tracks.is_empty() { Err(ArverError::Malformed("no tracks")) }
		else if tracks.len() == usize::from(id.tracks()) { Ok(Self { id, tracks }) }
		else { Err(ArverError::Malformed("wrong number of tracks")) }
	}

	#[must_use]
	/// # Disc ID (Header).
	pub const fn id(&self) -> DiscId { self.id }

	#[must_use]
	/// # Tracks.
	pub fn tracks(&self) -> &[ResponseTrack] { &self.tracks }
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # AccurateRip Disc.
///
/// The full, decoded database entry for a disc: one or more responses, all
/// sharing exactly the same header.
pub struct AccurateRipDisc {
	id: DiscId,
	responses: Vec<Response>,
}

impl AccurateRipDisc {
	/// # New.
	///
	/// ## Errors
	///
	/// There must be at least one response, and all responses must share the
	/// same header.
	pub fn new(responses: Vec<Response>) -> Result<Self, ArverError> {
		let id = responses.first()
			.map(Response::id)
			.ok_or(ArverError::Malformed("no responses"))?;

		if let Some(bad) = responses.iter().find(|r| r.id != id) {
			return Err(ArverError::HeaderMismatch(bad.id.to_string()));
		}

		Ok(Self { id, responses })
	}

	/// # Decode.
	///
	/// Parse one or more concatenated responses from raw `dBAR` bytes.
	///
	/// Each response is a 13-byte header (track count, then `id1`, `id2`, and
	/// the FreeDB ID as little-endian `u32`s) followed by a 9-byte record for
	/// each track (confidence, then the checksum and frame-450 checksum as
	/// little-endian `u32`s).
	///
	/// If `expected` is provided, every header must match it exactly.
	/// Otherwise every header must match the first one.
	///
	/// ## Errors
	///
	/// Any problem fails the entire decode; partial results are never
	/// returned. Running out of bytes midway through a record is `Truncated`,
	/// an unexpected header is `HeaderMismatch`, and an empty buffer or a
	/// zero-track header is `Malformed`.
	pub fn decode(src: &[u8], expected: Option<&DiscId>) -> Result<Self, ArverError> {
		if src.is_empty() { return Err(ArverError::Malformed("no data")); }

		let mut expected = expected.copied();
		let mut responses = Vec::new();
		let mut rest = src;
		while ! rest.is_empty() {
			// The header.
			let (head, tail) = split(rest, HEADER_LEN)?;
			let id = DiscId::new(
				head[0],
				u32_le(head, 1),
				u32_le(head, 5),
				u32_le(head, 9),
			);
			match expected {
				Some(e) if e != id => return Err(ArverError::HeaderMismatch(id.to_string())),
				None => { expected.replace(id); },
				_ => {},
			}
			if id.tracks() == 0 { return Err(ArverError::Malformed("no tracks")); }

			// The tracks.
			let (body, tail) = split(tail, usize::from(id.tracks()) * TRACK_LEN)?;
			let tracks = body.chunks_exact(TRACK_LEN)
				.map(ResponseTrack::from_bytes)
				.collect();

			responses.push(Response { id, tracks });
			rest = tail;
		}

		let id = expected.ok_or(ArverError::Bug("missing response header"))?;
		Ok(Self { id, responses })
	}

	/// # Fetch.
	///
	/// Fetch the raw response for `id` and decode it, requiring every header
	/// to match.
	///
	/// ## Errors
	///
	/// This will bubble up any fetch or decoding errors.
	pub fn fetch<F>(id: &DiscId, fetcher: &F) -> Result<Self, ArverError>
	where F: ResponseFetcher + ?Sized {
		let raw = fetcher.fetch(id)?;
		Self::decode(&raw, Some(id))
	}

	/// # From File.
	///
	/// Decode a previously saved `dBAR` file for which the disc is not known
	/// ahead of time. The responses still have to agree with each other.
	///
	/// ## Errors
	///
	/// This will return an error if the file cannot be read or decoded.
	pub fn from_file<P>(src: P) -> Result<Self, ArverError>
	where P: AsRef<Path> {
		let src = src.as_ref();
		let raw = cache_read(src)
			.ok_or_else(|| ArverError::ReadFailure(src.to_string_lossy().into_owned()))?;
		Self::decode(&raw, None)
	}

	#[must_use]
	/// # Encode.
	///
	/// Return the raw `dBAR` byte representation.
	pub fn encode(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(
			self.responses.len() *
			(HEADER_LEN + usize::from(self.id.tracks()) * TRACK_LEN)
		);

		for res in &self.responses {
			out.push(res.id.tracks());
			out.extend_from_slice(res.id.id1().to_le_bytes().as_slice());
			out.extend_from_slice(res.id.id2().to_le_bytes().as_slice());
			out.extend_from_slice(res.id.freedb().to_le_bytes().as_slice());
			for t in &res.tracks {
				out.push(t.confidence);
				out.extend_from_slice(t.checksum.to_le_bytes().as_slice());
				out.extend_from_slice(t.frame450.to_le_bytes().as_slice());
			}
		}

		out
	}

	#[must_use]
	/// # Disc ID.
	pub const fn id(&self) -> DiscId { self.id }

	#[must_use]
	/// # Track Count.
	pub const fn track_count(&self) -> u8 { self.id.tracks() }

	#[must_use]
	/// # Responses.
	pub fn responses(&self) -> &[Response] { &self.responses }

	#[must_use]
	/// # Checksum Lookup.
	///
	/// Build a per-track map of each (primary) checksum to its confidence and
	/// the index of the response it came from. Zero-confidence entries are
	/// left out, as are zero checksums, which a too-short or silent track can
	/// produce locally and should never count as a match.
	///
	/// The table has one more slot than the disc has tracks; the extra slot
	/// is always empty, and gives the last track of a Mixed-Mode rip
	/// somewhere to land.
	///
	/// If two responses carry the same checksum for a track, the later one
	/// wins, even if its confidence is lower.
	pub fn lookup(&self) -> LookupTable {
		let len = usize::from(self.id.tracks()) + 1;
		let mut out: Vec<HashMap<u32, LookupEntry, NoHash>> = (0..len)
			.map(|_| HashMap::with_hasher(NoHash::default()))
			.collect();

		for (response, res) in self.responses.iter().enumerate() {
			for (map, t) in out.iter_mut().zip(&res.tracks) {
				if t.confidence != 0 && t.checksum != 0 {
					map.insert(t.checksum, LookupEntry { confidence: t.confidence, response });
				}
			}
		}

		LookupTable(out)
	}

	#[must_use]
	/// # Frame-450 Lookup.
	///
	/// Build a per-track map of each non-zero frame-450 checksum to the
	/// highest confidence seen for it across all responses. Unlike
	/// [`AccurateRipDisc::lookup`], zero-confidence entries are included.
	///
	/// The result is indexed from zero.
	pub fn frame450_lookup(&self) -> Vec<HashMap<u32, u8, NoHash>> {
		let mut out: Vec<HashMap<u32, u8, NoHash>> = (0..self.id.tracks())
			.map(|_| HashMap::with_hasher(NoHash::default()))
			.collect();

		for res in &self.responses {
			for (map, t) in out.iter_mut().zip(&res.tracks) {
				if t.frame450 != 0 {
					let e = map.entry(t.frame450).or_insert(t.confidence);
					if *e < t.confidence { *e = t.confidence; }
				}
			}
		}

		out
	}
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Lookup Entry.
pub struct LookupEntry {
	confidence: u8,
	response: usize,
}

impl LookupEntry {
	#[must_use]
	/// # Confidence.
	pub const fn confidence(&self) -> u8 { self.confidence }

	#[must_use]
	/// # Response Index.
	///
	/// This is the zero-based position of the source response within
	/// [`AccurateRipDisc::responses`].
	pub const fn response(&self) -> usize { self.response }
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Lookup Table.
///
/// See [`AccurateRipDisc::lookup`] for details.
pub struct LookupTable(Vec<HashMap<u32, LookupEntry, NoHash>>);

impl LookupTable {
	#[must_use]
	/// # Get Track.
	///
	/// Return the checksum map for a one-based track slot, if it exists.
	pub fn get(&self, idx: usize) -> Option<&HashMap<u32, LookupEntry, NoHash>> {
		idx.checked_sub(1).and_then(|idx| self.0.get(idx))
	}

	#[must_use]
	/// # Get Checksum.
	///
	/// Shorthand for looking up a specific checksum for a one-based track.
	pub fn get_checksum(&self, idx: usize, checksum: u32) -> Option<LookupEntry> {
		self.get(idx).and_then(|map| map.get(&checksum)).copied()
	}

	#[must_use]
	/// # Slot Count.
	///
	/// This is always the track count plus one.
	pub fn len(&self) -> usize { self.0.len() }

	#[must_use]
	/// # Is Empty?
	pub fn is_empty(&self) -> bool { self.0.is_empty() }
}



/// # Split Bytes.
fn split(src: &[u8], len: usize) -> Result<(&[u8], &[u8]), ArverError> {
	if len <= src.len() { Ok(src.split_at(len)) }
	else { Err(ArverError::Truncated) }
}

/// # Little-Endian u32.
const fn u32_le(src: &[u8], idx: usize) -> u32 {
	u32::from_le_bytes([src[idx], src[idx + 1], src[idx + 2], src[idx + 3]])
}



#[cfg(test)]
mod test {
	use super::*;

	/// # Test Disc.
	///
	/// Three tracks, two responses.
	fn disc() -> AccurateRipDisc {
		let id = DiscId::new(3, 0x0004_41fd, 0x0008_83fb, 0x020e_8801);
		let a = Response::new(id, vec![
			ResponseTrack::new(12, 0xdead_beef, 0x1111_1111),
			ResponseTrack::new(0, 0x0bad_f00d, 0x2222_2222),
			ResponseTrack::new(7, 0x0123_4567, 0),
		]).expect("Response failed.");
		let b = Response::new(id, vec![
			ResponseTrack::new(3, 0xcafe_babe, 0x1111_1111),
			ResponseTrack::new(2, 0x7654_3210, 0x3333_3333),
			ResponseTrack::new(1, 0x0123_4567, 0x4444_4444),
		]).expect("Response failed.");
		AccurateRipDisc::new(vec![a, b]).expect("Disc failed.")
	}

	#[test]
	fn t_round_trip() {
		let disc = disc();
		let raw = disc.encode();
		assert_eq!(raw.len(), (13 + 3 * 9) * 2);
		assert_eq!(&raw[..5], &[3, 0xfd, 0x41, 0x04, 0x00]);

		let id = disc.id();
		assert_eq!(AccurateRipDisc::decode(&raw, Some(&id)).as_ref(), Ok(&disc));
		assert_eq!(AccurateRipDisc::decode(&raw, None).as_ref(), Ok(&disc));
	}

	#[test]
	fn t_truncated() {
		let disc = disc();
		let raw = disc.encode();
		let id = disc.id();

		// Chop off the end.
		for n in 1..=8 {
			assert_eq!(
				AccurateRipDisc::decode(&raw[..raw.len() - n], Some(&id)),
				Err(ArverError::Truncated),
				"Chopping {n} bytes should truncate.",
			);
		}

		// Cut into the second header.
		for n in 1..13 {
			assert_eq!(
				AccurateRipDisc::decode(&raw[..40 + n], Some(&id)),
				Err(ArverError::Truncated),
				"A partial header should truncate.",
			);
		}

		// But a clean cut between responses is fine.
		let one = AccurateRipDisc::decode(&raw[..40], Some(&id)).expect("Decode failed.");
		assert_eq!(one.responses().len(), 1);
	}

	#[test]
	fn t_header_mismatch() {
		let disc = disc();
		let raw = disc.encode();
		let id = disc.id();

		for start in [0, 40] {
			for idx in start..start + 13 {
				let mut bad = raw.clone();
				bad[idx] ^= 0x01;
				assert!(
					matches!(AccurateRipDisc::decode(&bad, Some(&id)), Err(ArverError::HeaderMismatch(_))),
					"Flipping byte {idx} should mismatch.",
				);
			}
		}

		// Without an expectation, the second header must still match the
		// first.
		let mut bad = raw.clone();
		bad[45] ^= 0xFF;
		assert!(
			matches!(AccurateRipDisc::decode(&bad, None), Err(ArverError::HeaderMismatch(_))),
			"Headers should be consistent.",
		);

		// Flipping track data is not a header problem.
		let mut ok = raw;
		ok[20] ^= 0xFF;
		assert!(AccurateRipDisc::decode(&ok, Some(&id)).is_ok(), "Track data is not validated.");
	}

	#[test]
	fn t_malformed() {
		assert_eq!(AccurateRipDisc::decode(&[], None), Err(ArverError::Malformed("no data")));
		assert_eq!(
			AccurateRipDisc::decode(&[0; 13], None),
			Err(ArverError::Malformed("no tracks")),
		);
		assert_eq!(AccurateRipDisc::new(Vec::new()), Err(ArverError::Malformed("no responses")));

		let id = DiscId::new(2, 1, 2, 3);
		assert!(Response::new(id, vec![ResponseTrack::default()]).is_err(), "Wrong track count.");
	}

	#[test]
	fn t_lookup() {
		let disc = disc();
		let lookup = disc.lookup();
		assert_eq!(lookup.len(), 4, "There should be an extra slot.");
		assert!(lookup.get(0).is_none(), "Slots are one-based.");
		assert!(lookup.get(4).is_some_and(HashMap::is_empty), "The extra slot should be empty.");
		assert!(lookup.get(5).is_none(), "Out of range.");

		// No zero confidences.
		for idx in 1..=4 {
			let map = lookup.get(idx).expect("Missing slot.");
			assert!(map.values().all(|e| e.confidence() != 0), "Zero confidence in slot {idx}.");
		}

		let e = lookup.get_checksum(1, 0xdead_beef).expect("Missing checksum.");
		assert_eq!((e.confidence(), e.response()), (12, 0));
		assert!(lookup.get_checksum(2, 0x0bad_f00d).is_none(), "Zero confidence should be skipped.");
		assert_eq!(lookup.get(2).map(HashMap::len), Some(1));

		// Collision: the later response wins.
		let e = lookup.get_checksum(3, 0x0123_4567).expect("Missing checksum.");
		assert_eq!((e.confidence(), e.response()), (1, 1));

		// Zero checksums are never matchable, however confident.
		let id = DiscId::new(2, 1, 2, 3);
		let disc = AccurateRipDisc::new(vec![
			Response::new(id, vec![
				ResponseTrack::new(200, 0, 0x1111_1111),
				ResponseTrack::new(5, 0x2222_2222, 0),
			]).expect("Response failed."),
		]).expect("Disc failed.");
		let lookup = disc.lookup();
		assert!(lookup.get_checksum(1, 0).is_none(), "Zero checksum was kept.");
		assert!(lookup.get(1).is_some_and(HashMap::is_empty), "Slot 1 should be empty.");
		assert!(lookup.get_checksum(2, 0x2222_2222).is_some(), "Missing checksum.");
	}

	#[test]
	fn t_frame450_lookup() {
		let lookup = disc().frame450_lookup();
		assert_eq!(lookup.len(), 3);
		assert_eq!(lookup[0].get(&0x1111_1111), Some(&12), "Max confidence should win.");
		assert_eq!(lookup[1].get(&0x2222_2222), Some(&0), "Zero confidence should be kept.");
		assert_eq!(lookup[1].len(), 2);
		assert_eq!(lookup[2].len(), 1, "Zero checksums should be skipped.");
	}

	#[test]
	fn t_from_file() {
		let disc = disc();
		let dir = tempfile::tempdir().expect("Tempdir failed.");
		let dst = dir.path().join(disc.id().file_name());
		std::fs::write(&dst, disc.encode()).expect("Write failed.");
		assert_eq!(AccurateRipDisc::from_file(&dst).as_ref(), Ok(&disc));
		assert!(
			matches!(AccurateRipDisc::from_file(dir.path().join("nope.bin")), Err(ArverError::ReadFailure(_))),
			"Missing files should fail.",
		);
	}
}
