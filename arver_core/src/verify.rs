/*!
# ARver: Verification
*/

use crate::{
	AccurateRipDisc,
	ArverError,
	ChecksumSet,
	DiscToc,
	LookupEntry,
	Rip,
	SampleSource,
	VerifyLog,
	VerifyLogKind,
	VerifyOptions,
};
use dactyl::{
	NoHash,
	traits::NiceInflection,
};
use std::{
	collections::HashMap,
	fmt,
};



#[derive(Debug, Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
/// # AccurateRip Checksum Version.
pub enum ChecksumVersion {
	/// # Version 1.
	V1,

	/// # Version 2.
	V2,
}

impl fmt::Display for ChecksumVersion {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl ChecksumVersion {
	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::V1 => "v1",
			Self::V2 => "v2",
		}
	}
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Track Status.
pub enum TrackStatus {
	/// # Matched.
	///
	/// The checksum that matched, the database confidence, and the
	/// (zero-based) index of the response it was found in.
	Success {
		/// # Checksum Version.
		version: ChecksumVersion,

		/// # Checksum.
		checksum: u32,

		/// # Confidence.
		confidence: u8,

		/// # Response Index.
		response: usize,
	},

	/// # No Match.
	///
	/// The database has entries for the track, but none of them match. This
	/// holds the local v2 checksum.
	Failed(u32),

	/// # No Entries.
	///
	/// The database has nothing (with any confidence) for the track.
	NoData,
}

impl fmt::Display for TrackStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Success { version, checksum, confidence, response } => write!(
				f,
				"OK [{checksum:08x}] ({version}, confidence {confidence}, response {})",
				response + 1,
			),
			Self::Failed(checksum) => write!(f, "FAILED [{checksum:08x}]"),
			Self::NoData => f.write_str("NO DATA"),
		}
	}
}

impl TrackStatus {
	/// # Match Checksums.
	///
	/// v2 is tried first, then v1. An empty (or missing) slot means there is
	/// no data; anything else is a failure.
	fn new(map: Option<&HashMap<u32, LookupEntry, NoHash>>, chk: ChecksumSet) -> Self {
		let Some(map) = map.filter(|m| ! m.is_empty()) else { return Self::NoData; };

		[(ChecksumVersion::V2, chk.arv2()), (ChecksumVersion::V1, chk.arv1())]
			.into_iter()
			.find_map(|(version, checksum)|
				map.get(&checksum).map(|e| Self::Success {
					version,
					checksum,
					confidence: e.confidence(),
					response: e.response(),
				})
			)
			.unwrap_or(Self::Failed(chk.arv2()))
	}

	#[must_use]
	/// # Is Success?
	pub const fn is_success(&self) -> bool { matches!(self, Self::Success { .. }) }

	#[must_use]
	/// # Is Failed?
	pub const fn is_failed(&self) -> bool { matches!(self, Self::Failed(_)) }

	#[must_use]
	/// # Is No Data?
	pub const fn is_no_data(&self) -> bool { matches!(self, Self::NoData) }

	#[must_use]
	/// # Confidence.
	///
	/// Return the confidence for successful matches.
	pub const fn confidence(&self) -> Option<u8> {
		if let Self::Success { confidence, .. } = self { Some(*confidence) }
		else { None }
	}
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Verification Result.
///
/// The outcome for a single rip track.
pub struct VerificationResult {
	track: u8,
	slot: usize,
	checksums: ChecksumSet,
	status: TrackStatus,
	confident: bool,
}

impl VerificationResult {
	#[must_use]
	/// # Track Number.
	///
	/// This is the one-based position of the file within the rip.
	pub const fn track(&self) -> u8 { self.track }

	#[must_use]
	/// # Database Slot.
	///
	/// This is the one-based database track the file was compared against.
	/// It only differs from [`VerificationResult::track`] for Mixed-Mode CDs.
	pub const fn slot(&self) -> usize { self.slot }

	#[must_use]
	/// # Checksums.
	pub const fn checksums(&self) -> ChecksumSet { self.checksums }

	#[must_use]
	/// # Status.
	pub const fn status(&self) -> TrackStatus { self.status }

	#[must_use]
	/// # Is Confident?
	///
	/// Returns `true` if the track matched with at least the minimum
	/// confidence set in the [`VerifyOptions`].
	pub const fn is_confident(&self) -> bool { self.confident }
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Verdict.
///
/// The disc-wide summary of the individual results.
pub enum Verdict {
	/// # Every track matched.
	AllOk,

	/// # Every track with data matched, but some had none.
	OkNoData,

	/// # Every track with data failed.
	AllFailed,

	/// # A mix of matches and failures.
	SomeFailed,
}

impl fmt::Display for Verdict {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Verdict {
	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AllOk => "all ok",
			Self::OkNoData => "ok, some no data",
			Self::AllFailed => "all failed",
			Self::SomeFailed => "some failed",
		}
	}

	#[must_use]
	/// # Is Ok?
	///
	/// Returns `true` if nothing failed.
	pub const fn is_ok(self) -> bool { matches!(self, Self::AllOk | Self::OkNoData) }
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Disc Verdict.
///
/// The per-track results, in rip order, along with the overall verdict.
pub struct DiscVerdict {
	results: Vec<VerificationResult>,
	verdict: Verdict,
}

impl From<Vec<VerificationResult>> for DiscVerdict {
	fn from(results: Vec<VerificationResult>) -> Self {
		let failed = results.iter().filter(|r| r.status.is_failed()).count();
		let no_data = results.iter().filter(|r| r.status.is_no_data()).count();

		let verdict =
			if failed == 0 {
				if no_data == 0 { Verdict::AllOk }
				else { Verdict::OkNoData }
			}
			else if failed + no_data == results.len() { Verdict::AllFailed }
			else { Verdict::SomeFailed };

		Self { results, verdict }
	}
}

impl DiscVerdict {
	#[must_use]
	/// # Results.
	pub fn results(&self) -> &[VerificationResult] { &self.results }

	#[must_use]
	/// # Verdict.
	pub const fn verdict(&self) -> Verdict { self.verdict }

	#[must_use]
	/// # Summary.
	///
	/// Return a one-line description of the verdict.
	pub fn summary(&self) -> String {
		let len = self.results.len();
		let count = |cb: fn(&TrackStatus) -> bool|
			self.results.iter().filter(|r| cb(&r.status)).count();

		match self.verdict {
			Verdict::AllOk => format!(
				"All {} verified successfully.",
				len.nice_inflect("track", "tracks"),
			),
			Verdict::OkNoData => format!(
				"All tracks with database entries verified successfully; {} had no data.",
				count(TrackStatus::is_no_data).nice_inflect("track", "tracks"),
			),
			Verdict::AllFailed => format!(
				"Verification failed for all {} with database entries.",
				count(TrackStatus::is_failed).nice_inflect("track", "tracks"),
			),
			Verdict::SomeFailed => format!(
				"Verification failed for {} of {}.",
				count(TrackStatus::is_failed),
				len.nice_inflect("track", "tracks"),
			),
		}
	}
}



impl Rip {
	/// # Verify.
	///
	/// Verify each rip file against the database entries for the disc.
	///
	/// The rip must have exactly one file per audio track. Track lengths are
	/// compared against the disc too; any differences are logged, and unless
	/// the options are permissive, they stop verification altogether.
	///
	/// Each file's checksums are computed using its position in the rip as the
	/// track number, then looked up in the corresponding database slot (which
	/// is shifted by one on Mixed-Mode CDs).
	///
	/// ## Errors
	///
	/// An error is returned if the track counts differ, if the lengths differ
	/// in strict mode, if `disc` is for a different disc, or if any file
	/// cannot be read.
	pub fn verify<S>(
		&self,
		source: &S,
		toc: &DiscToc,
		disc: &AccurateRipDisc,
		opts: VerifyOptions,
		log: &mut VerifyLog,
	) -> Result<DiscVerdict, ArverError>
	where S: SampleSource + Sync + ?Sized {
		// The file count has to match.
		let audio = toc.audio_len();
		if self.len() != audio {
			if self.len() == audio + 1 && toc.pregap().is_some() {
				log.add(
					VerifyLogKind::Advisory,
					"There is one more file than audio tracks, and the disc has a pregap; was an HTOA file included by mistake?",
				);
			}
			return Err(ArverError::TrackCountMismatch(self.len(), audio));
		}

		// Make sure the responses are for this disc.
		let id = toc.disc_id()?;
		if disc.id() != id { return Err(ArverError::HeaderMismatch(disc.id().to_string())); }

		// The lengths should match too.
		let mismatched = self.log_lengths(toc, log);
		if mismatched != 0 {
			if opts.permissive() {
				log.add(
					VerifyLogKind::Advisory,
					format!(
						"Verifying anyway despite {} (permissive mode).",
						mismatched.nice_inflect("length mismatch", "length mismatches"),
					),
				);
			}
			else { return Err(ArverError::LengthMismatch(mismatched)); }
		}

		let checksums = self.checksums(source, opts)?;
		let lookup = disc.lookup();
		let kind = toc.kind();
		let mut results = Vec::with_capacity(checksums.len());
		for (idx, (t, chk)) in (1_u8..).zip(self.tracks().iter().zip(checksums)) {
			let slot = kind.lookup_index(usize::from(idx)).ok_or(ArverError::UnsupportedDisc)?;
			let status = TrackStatus::new(lookup.get(slot), chk);
			let confident = status.confidence().is_some_and(|c| opts.min_confidence() <= c);

			log.add(
				VerifyLogKind::Result,
				format!("Track {idx:02} ({}): {status}", t.src().display()),
			);

			results.push(VerificationResult {
				track: idx,
				slot,
				checksums: chk,
				status,
				confident,
			});
		}

		Ok(DiscVerdict::from(results))
	}
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		checksums,
		chk::test_noise,
		DiscId,
		Response,
		ResponseTrack,
		Sample,
		source::MemSource,
		TrackKind::{
			Audio as A,
			Data as D,
		},
	};

	/// # Fixture.
	///
	/// Build a TOC from the LBAs along with an in-memory rip whose files
	/// exactly match the audio tracks.
	fn fixture(entries: &[(u32, crate::TrackKind)], leadout: u32)
	-> (DiscToc, MemSource, Vec<String>, Vec<Vec<Sample>>) {
		let toc = DiscToc::from_lbas(entries, leadout, 1).expect("TOC failed.");
		let mut src = MemSource::default();
		let mut paths = Vec::new();
		let mut data = Vec::new();
		for (k, t) in (1_u32..).zip(toc.audio_tracks()) {
			let path = format!("/rip/track{k:02}.wav");
			let v = test_noise(k, t.sectors() as usize * 588);
			src.insert(&path, v.clone());
			paths.push(path);
			data.push(v);
		}
		(toc, src, paths, data)
	}

	/// # Disc From Tracks.
	fn disc(id: DiscId, responses: &[&[(u8, u32)]]) -> AccurateRipDisc {
		AccurateRipDisc::new(
			responses.iter()
				.map(|r| Response::new(
					id,
					r.iter().map(|&(c, chk)| ResponseTrack::new(c, chk, 0)).collect(),
				).expect("Response failed."))
				.collect()
		).expect("Disc failed.")
	}

	#[test]
	fn t_verify() {
		let (toc, src, paths, data) = fixture(&[(150, A), (160, A), (175, A), (190, A)], 210);
		let chk: Vec<ChecksumSet> = (1_u8..).zip(&data)
			.map(|(k, v)| checksums(v, k, 4).expect("Checksums failed."))
			.collect();
		let id = toc.disc_id().expect("Disc ID failed.");

		// Track 1 matches v2, track 2 matches v1 (in the second response),
		// track 3 fails, track 4 has only zero-confidence data.
		let disc = disc(id, &[
			&[(5, chk[0].arv2()), (3, 0x1234), (2, 0x5678), (0, chk[3].arv2())],
			&[(1, 0x0101), (3, chk[1].arv1()), (9, 0x9abc), (0, 0x0202)],
		]);

		let mut log = VerifyLog::new(false);
		let rip = Rip::load(&paths, &src, &mut log).expect("Load failed.");
		let opts = VerifyOptions::default().with_min_confidence(4);
		let res = rip.verify(&src, &toc, &disc, opts, &mut log).expect("Verify failed.");

		let results = res.results();
		assert_eq!(results.len(), 4);
		assert_eq!(
			results[0].status(),
			TrackStatus::Success {
				version: ChecksumVersion::V2,
				checksum: chk[0].arv2(),
				confidence: 5,
				response: 0,
			},
		);
		assert!(results[0].is_confident(), "Track 1 should be confident.");
		assert_eq!(
			results[1].status(),
			TrackStatus::Success {
				version: ChecksumVersion::V1,
				checksum: chk[1].arv1(),
				confidence: 3,
				response: 1,
			},
		);
		assert!(! results[1].is_confident(), "Track 2 should not be confident.");
		assert_eq!(results[2].status(), TrackStatus::Failed(chk[2].arv2()));
		assert_eq!(results[3].status(), TrackStatus::NoData);
		assert_eq!(res.verdict(), Verdict::SomeFailed);
		assert_eq!(res.summary(), "Verification failed for 1 of 4 tracks.");
		assert_eq!(log.count(VerifyLogKind::Result), 4);
	}

	#[test]
	fn t_mixed_mode() {
		let (toc, src, paths, data) = fixture(&[(150, D), (1000, A), (1012, A)], 1030);
		assert_eq!(toc.kind(), crate::DiscType::MixedMode);
		assert_eq!(paths.len(), 2);

		let chk: Vec<ChecksumSet> = (1_u8..).zip(&data)
			.map(|(k, v)| checksums(v, k, 2).expect("Checksums failed."))
			.collect();
		let id = toc.disc_id().expect("Disc ID failed.");
		assert_eq!(id.tracks(), 3);

		// The data track holds the first slot, and happens to carry track
		// one's checksum; it must not match.
		let disc = disc(id, &[&[(7, chk[0].arv2()), (2, chk[0].arv2()), (4, chk[1].arv2())]]);

		let mut log = VerifyLog::new(false);
		let rip = Rip::load(&paths, &src, &mut log).expect("Load failed.");
		let res = rip.verify(&src, &toc, &disc, VerifyOptions::default(), &mut log)
			.expect("Verify failed.");

		let results = res.results();
		assert_eq!(results[0].slot(), 2, "Rip track 1 should map to slot 2.");
		assert_eq!(results[1].slot(), 3, "Rip track 2 should map to slot 3.");
		assert_eq!(results[0].status().confidence(), Some(2));
		assert_eq!(results[1].status().confidence(), Some(4));
		assert_eq!(res.verdict(), Verdict::AllOk);
		assert_eq!(res.summary(), "All 2 tracks verified successfully.");
	}

	#[test]
	fn t_track_count() {
		let (toc, mut src, mut paths, _) = fixture(&[(182, A), (200, A), (220, A)], 240);
		let disc = disc(toc.disc_id().expect("Disc ID failed."), &[&[(1, 1), (1, 2), (1, 3)]]);

		// Too few.
		let mut log = VerifyLog::new(false);
		let rip = Rip::load(&paths[..2], &src, &mut log).expect("Load failed.");
		assert_eq!(
			rip.verify(&src, &toc, &disc, VerifyOptions::default().with_permissive(true), &mut log),
			Err(ArverError::TrackCountMismatch(2, 3)),
		);
		assert_eq!(log.count(VerifyLogKind::Advisory), 0);

		// One too many, with a pregap, earns an advisory.
		src.insert("/rip/extra.wav", test_noise(99, 588));
		paths.push("/rip/extra.wav".to_owned());
		let mut log = VerifyLog::new(false);
		let rip = Rip::load(&paths, &src, &mut log).expect("Load failed.");
		assert_eq!(
			rip.verify(&src, &toc, &disc, VerifyOptions::default(), &mut log),
			Err(ArverError::TrackCountMismatch(4, 3)),
		);
		assert_eq!(log.count(VerifyLogKind::Advisory), 1);
	}

	#[test]
	fn t_lengths() {
		let (toc, mut src, paths, data) = fixture(&[(150, A), (170, A), (185, A)], 200);

		// Shorten the second file by a sector.
		let mut short = data[1].clone();
		short.truncate(short.len() - 588);
		src.insert(&paths[1], short.clone());

		let chk = [
			checksums(&data[0], 1, 3).expect("Checksums failed."),
			checksums(&short, 2, 3).expect("Checksums failed."),
			checksums(&data[2], 3, 3).expect("Checksums failed."),
		];
		let disc = disc(
			toc.disc_id().expect("Disc ID failed."),
			&[&[(1, chk[0].arv2()), (1, chk[1].arv2()), (1, chk[2].arv2())]],
		);

		let mut log = VerifyLog::new(false);
		let rip = Rip::load(&paths, &src, &mut log).expect("Load failed.");
		assert_eq!(
			rip.verify(&src, &toc, &disc, VerifyOptions::default(), &mut log),
			Err(ArverError::LengthMismatch(1)),
		);
		assert_eq!(log.count(VerifyLogKind::Length), 1);
		assert!(
			log.entries().any(|(_, _, m)| m == "CD track 02 is 1 frame longer than /rip/track02.wav."),
			"Missing length entry:\n{log}",
		);

		// Permissive mode carries on.
		let mut log = VerifyLog::new(false);
		let res = rip.verify(&src, &toc, &disc, VerifyOptions::default().with_permissive(true), &mut log)
			.expect("Verify failed.");
		assert_eq!(res.results().len(), 3);
		assert_eq!(res.verdict(), Verdict::AllOk);
		assert_eq!(log.count(VerifyLogKind::Length), 1);
	}

	#[test]
	fn t_wrong_disc() {
		let (toc, src, paths, _) = fixture(&[(150, A), (170, A)], 200);
		let disc = disc(DiscId::new(2, 1, 2, 3), &[&[(1, 1), (1, 2)]]);

		let mut log = VerifyLog::new(false);
		let rip = Rip::load(&paths, &src, &mut log).expect("Load failed.");
		assert!(
			matches!(
				rip.verify(&src, &toc, &disc, VerifyOptions::default(), &mut log),
				Err(ArverError::HeaderMismatch(_)),
			),
			"The disc IDs should not match.",
		);
	}

	#[test]
	fn t_verdict() {
		let chk = ChecksumSet::default();
		let result = |status| VerificationResult {
			track: 1,
			slot: 1,
			checksums: chk,
			status,
			confident: false,
		};
		let ok = TrackStatus::Success {
			version: ChecksumVersion::V1,
			checksum: 0,
			confidence: 1,
			response: 0,
		};
		let bad = TrackStatus::Failed(0);
		let none = TrackStatus::NoData;

		for (set, expected) in [
			(vec![ok, ok], Verdict::AllOk),
			(vec![ok, none], Verdict::OkNoData),
			(vec![none, none], Verdict::OkNoData),
			(vec![bad, bad], Verdict::AllFailed),
			(vec![bad, none], Verdict::AllFailed),
			(vec![ok, bad], Verdict::SomeFailed),
			(vec![ok, bad, none], Verdict::SomeFailed),
		] {
			let verdict = DiscVerdict::from(set.into_iter().map(result).collect::<Vec<_>>());
			assert_eq!(verdict.verdict(), expected);
		}
	}
}
