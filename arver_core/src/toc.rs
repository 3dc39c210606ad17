/*!
# ARver: Table of Contents
*/

use cdtoc::{
	Toc,
	TocKind,
};
use crate::{
	accuraterip_ids,
	ArverError,
	CD_LEADIN,
	classify,
	DiscId,
	DiscType,
	freedb_id,
	MAX_TRACKS,
	SAMPLES_PER_SECTOR,
	SECTORS_PER_SECOND,
	SESSION_GAP,
};
use std::fmt;



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Track Kind.
pub enum TrackKind {
	/// # Audio.
	Audio,

	/// # Data.
	Data,
}

impl fmt::Display for TrackKind {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl TrackKind {
	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Audio => "audio",
			Self::Data => "data",
		}
	}

	#[must_use]
	/// # Is Audio?
	pub const fn is_audio(self) -> bool { matches!(self, Self::Audio) }
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Track Offset.
///
/// A single TOC entry: the one-based track number, its starting LBA (lead-in
/// included), its length in sectors, and its kind.
pub struct TrackOffset {
	number: u8,
	lba: u32,
	sectors: u32,
	kind: TrackKind,
}

impl TrackOffset {
	#[must_use]
	/// # New.
	pub const fn new(number: u8, lba: u32, sectors: u32, kind: TrackKind) -> Self {
		Self { number, lba, sectors, kind }
	}

	#[must_use]
	/// # Track Number.
	pub const fn number(&self) -> u8 { self.number }

	#[must_use]
	/// # Starting LBA.
	pub const fn lba(&self) -> u32 { self.lba }

	#[must_use]
	/// # Starting LSN.
	pub const fn lsn(&self) -> u32 { self.lba.saturating_sub(CD_LEADIN) }

	#[must_use]
	/// # Length (Sectors).
	pub const fn sectors(&self) -> u32 { self.sectors }

	#[must_use]
	/// # Length (Samples).
	pub const fn samples(&self) -> u64 {
		self.sectors as u64 * SAMPLES_PER_SECTOR as u64
	}

	#[must_use]
	/// # Kind.
	pub const fn kind(&self) -> TrackKind { self.kind }

	#[must_use]
	/// # Is Audio?
	pub const fn is_audio(&self) -> bool { self.kind.is_audio() }

	#[must_use]
	/// # Length as `m:ss.ff`.
	pub fn msf(&self) -> String { msf(self.sectors) }
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Pregap (HTOA).
///
/// Audio hidden between the lead-in and the first track. It is reported for
/// reference, but never verified.
pub struct Pregap {
	sectors: u32,
}

impl Pregap {
	#[must_use]
	/// # Starting LBA.
	pub const fn lba(&self) -> u32 { CD_LEADIN }

	#[must_use]
	/// # Length (Sectors).
	pub const fn sectors(&self) -> u32 { self.sectors }

	#[must_use]
	/// # Length as `m:ss.ff`.
	pub fn msf(&self) -> String { msf(self.sectors) }
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Disc Table of Contents.
///
/// This is built once per disc and classified on the spot; there is no way
/// to mutate it afterward.
///
/// A few adjustments happen during construction:
///
/// * Enhanced CDs have the inter-session gap trimmed from the last audio
///   track, since TOC readers count it as part of that track.
/// * A pregap pseudo-track is recorded if the first track starts after the
///   lead-in.
pub struct DiscToc {
	tracks: Vec<TrackOffset>,
	leadout: u32,
	sessions: u8,
	pregap: Option<Pregap>,
	kind: DiscType,
}

impl fmt::Display for DiscToc {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "##  {:>6}  {:>6}  {:>8}  TYPE", "LBA", "FRAMES", "LENGTH")?;
		if let Some(p) = self.pregap {
			writeln!(f, "00  {:>6}  {:>6}  {:>8}  htoa", p.lba(), p.sectors(), p.msf())?;
		}
		for t in &self.tracks {
			writeln!(
				f,
				"{:02}  {:>6}  {:>6}  {:>8}  {}",
				t.number(),
				t.lba(),
				t.sectors(),
				t.msf(),
				t.kind(),
			)?;
		}
		write!(f, "AA  {:>6}", self.leadout)
	}
}

impl DiscToc {
	/// # New.
	///
	/// Build, validate, and classify a table of contents from the reader's
	/// track list, the leadout LBA, and the number of sessions.
	///
	/// ## Errors
	///
	/// An error is returned if the tracks are missing, misnumbered, out of
	/// order, or if the layout does not fit any supported disc type.
	pub fn new(mut tracks: Vec<TrackOffset>, leadout: u32, sessions: u8)
	-> Result<Self, ArverError> {
		if tracks.is_empty() { return Err(ArverError::InvalidToc("no tracks")); }
		if usize::from(MAX_TRACKS) < tracks.len() {
			return Err(ArverError::InvalidToc("too many tracks"));
		}

		let mut last = None;
		for (k, t) in (1_u8..).zip(tracks.iter()) {
			if t.number != k {
				return Err(ArverError::InvalidToc("tracks must be numbered from one"));
			}
			if t.lba < CD_LEADIN {
				return Err(ArverError::InvalidToc("track starts inside the lead-in"));
			}
			if last.is_some_and(|l| t.lba <= l) {
				return Err(ArverError::InvalidToc("tracks are out of order"));
			}
			last.replace(t.lba);
		}
		if last.is_some_and(|l| leadout <= l) {
			return Err(ArverError::InvalidToc("leadout must follow the last track"));
		}

		let kinds: Vec<TrackKind> = tracks.iter().map(TrackOffset::kind).collect();
		let kind = classify(&kinds, sessions);
		if ! kind.is_supported() { return Err(ArverError::UnsupportedDisc); }

		// Readers double-count the session gap.
		if matches!(kind, DiscType::Enhanced) {
			if let Some(t) = tracks.iter_mut().rev().find(|t| t.is_audio()) {
				t.sectors = t.sectors.saturating_sub(SESSION_GAP);
			}
		}

		let pregap = tracks.first()
			.map(|t| t.lba - CD_LEADIN)
			.filter(|&n| n != 0)
			.map(|sectors| Pregap { sectors });

		Ok(Self { tracks, leadout, sessions, pregap, kind })
	}

	/// # From LBAs.
	///
	/// Same as [`DiscToc::new`], but track lengths are derived from the
	/// distance to the next track (or the leadout).
	///
	/// ## Errors
	///
	/// See [`DiscToc::new`].
	pub fn from_lbas(entries: &[(u32, TrackKind)], leadout: u32, sessions: u8)
	-> Result<Self, ArverError> {
		if usize::from(MAX_TRACKS) < entries.len() {
			return Err(ArverError::InvalidToc("too many tracks"));
		}

		let mut tracks = Vec::with_capacity(entries.len());
		for (k, (idx, (lba, kind))) in (1_u8..).zip(entries.iter().copied().enumerate()) {
			let end = entries.get(idx + 1).map_or(leadout, |(next, _)| *next);
			tracks.push(TrackOffset::new(k, lba, end.saturating_sub(lba), kind));
		}

		Self::new(tracks, leadout, sessions)
	}

	/// # From CDTOC.
	///
	/// Parse a CDTOC metadata string, like `4+96+2D2B+6256+B327+D84A`, which
	/// is what disc-ID lookup services hand back in lieu of a physical disc.
	/// Any data track is placed according to the string's markers, with
	/// CD-Extra data counted as a second session.
	///
	/// ## Errors
	///
	/// This will return an error if the string cannot be parsed, or if the
	/// result is otherwise invalid.
	pub fn from_cdtoc<S>(src: S) -> Result<Self, ArverError>
	where S: AsRef<str> {
		let toc = Toc::from_cdtoc(src)?;
		let data_first = matches!(toc.kind(), TocKind::DataFirst);
		let data_last = matches!(toc.kind(), TocKind::CDExtra);

		let mut entries = Vec::with_capacity(toc.audio_sectors().len() + 1);
		if data_first {
			if let Some(lba) = toc.data_sector() { entries.push((lba, TrackKind::Data)); }
		}
		entries.extend(toc.audio_sectors().iter().map(|&lba| (lba, TrackKind::Audio)));
		if data_last {
			if let Some(lba) = toc.data_sector() { entries.push((lba, TrackKind::Data)); }
		}

		Self::from_lbas(&entries, toc.leadout(), if data_last { 2 } else { 1 })
	}
}

impl DiscToc {
	#[must_use]
	/// # All Tracks.
	pub fn tracks(&self) -> &[TrackOffset] { &self.tracks }

	/// # Audio Tracks.
	pub fn audio_tracks(&self) -> impl Iterator<Item=&TrackOffset> {
		self.tracks.iter().filter(|t| t.is_audio())
	}

	#[must_use]
	/// # Audio Track Count.
	pub fn audio_len(&self) -> usize { self.audio_tracks().count() }

	#[must_use]
	/// # Leadout LBA.
	pub const fn leadout(&self) -> u32 { self.leadout }

	#[must_use]
	/// # Session Count.
	pub const fn sessions(&self) -> u8 { self.sessions }

	#[must_use]
	/// # Pregap.
	pub const fn pregap(&self) -> Option<Pregap> { self.pregap }

	#[must_use]
	/// # Disc Type.
	pub const fn kind(&self) -> DiscType { self.kind }

	#[must_use]
	/// # Audio Leadout LBA.
	///
	/// For Enhanced CDs this is the end of the (gap-corrected) last audio
	/// track; for everything else it is the leadout.
	pub fn audio_leadout(&self) -> u32 {
		if matches!(self.kind, DiscType::Enhanced) {
			self.audio_tracks()
				.last()
				.map_or(self.leadout, |t| t.lba + t.sectors)
		}
		else { self.leadout }
	}

	/// # AccurateRip IDs.
	///
	/// These use the audio tracks only, ending at the audio leadout.
	///
	/// ## Errors
	///
	/// This will return an error if the offsets cannot be fingerprinted,
	/// which should only happen with degenerate Enhanced CD layouts.
	pub fn accuraterip_ids(&self) -> Result<(u32, u32), ArverError> {
		let offsets: Vec<u32> = self.audio_tracks().map(TrackOffset::lba).collect();
		accuraterip_ids(&offsets, self.audio_leadout())
	}

	/// # FreeDB ID.
	///
	/// This uses every track, data included, and the true leadout.
	///
	/// ## Errors
	///
	/// See [`freedb_id`].
	pub fn freedb_id(&self) -> Result<u32, ArverError> {
		let offsets: Vec<u32> = self.tracks.iter().map(TrackOffset::lba).collect();
		freedb_id(&offsets, self.leadout)
	}

	#[must_use]
	/// # Database Track Count.
	///
	/// The number of track slots in this disc's database record. Mixed-Mode
	/// discs count their leading data track; Enhanced CDs do not count the
	/// data session.
	pub fn db_tracks(&self) -> u8 {
		let len =
			if matches!(self.kind, DiscType::MixedMode) { self.tracks.len() }
			else { self.audio_len() };
		u8::try_from(len).unwrap_or(MAX_TRACKS)
	}

	/// # AccurateRip Disc ID.
	///
	/// ## Errors
	///
	/// See [`DiscToc::accuraterip_ids`].
	pub fn disc_id(&self) -> Result<DiscId, ArverError> {
		let (id1, id2) = self.accuraterip_ids()?;
		let freedb = self.freedb_id()?;
		Ok(DiscId::new(self.db_tracks(), id1, id2, freedb))
	}
}



/// # Sectors to `m:ss.ff`.
fn msf(sectors: u32) -> String {
	let secs = sectors / SECTORS_PER_SECOND;
	format!("{}:{:02}.{:02}", secs / 60, secs % 60, sectors % SECTORS_PER_SECOND)
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_single_track() {
		let toc = DiscToc::new(
			vec![TrackOffset::new(1, 150, 279_037, TrackKind::Audio)],
			279_187,
			1,
		).expect("TOC failed.");
		assert_eq!(toc.kind(), DiscType::Audio);
		assert!(toc.pregap().is_none(), "Unexpected pregap.");
		assert_eq!(
			toc.disc_id().map(|id| id.to_string()),
			Ok("001-000441fd-000883fb-020e8801".to_owned()),
		);
	}

	#[test]
	fn t_from_cdtoc() {
		let toc = DiscToc::from_cdtoc("1+96+44293").expect("CDTOC failed.");
		assert_eq!(toc.kind(), DiscType::Audio);
		assert_eq!(toc.leadout(), 279_187);
		assert_eq!(toc.tracks()[0].sectors(), 279_037);
		assert_eq!(
			toc.disc_id().map(|id| id.to_string()),
			Ok("001-000441fd-000883fb-020e8801".to_owned()),
		);

		assert!(DiscToc::from_cdtoc("not a toc").is_err(), "Garbage parsed?");
	}

	#[test]
	fn t_from_cdtoc_enhanced() {
		// Three audio tracks plus a CD-Extra data session.
		let toc = DiscToc::from_cdtoc("3+96+2D2B+6256+B327+D84A").expect("CDTOC failed.");
		assert_eq!(toc.kind(), DiscType::Enhanced);
		assert_eq!(toc.sessions(), 2);
		assert_eq!(toc.tracks().len(), 4);
		assert_eq!(toc.audio_len(), 3);
		assert_eq!(toc.db_tracks(), 3, "The data session has no database slot.");
		assert_eq!(toc.leadout(), 0xD84A);
		assert!(toc.pregap().is_none(), "Unexpected pregap.");

		let data = toc.tracks()[3];
		assert_eq!(data.kind(), TrackKind::Data);
		assert_eq!(data.lba(), 0xB327);

		// The last audio track loses the session gap.
		assert_eq!(toc.audio_leadout(), 0xB327 - SESSION_GAP);
		assert_eq!(toc.audio_leadout(), 34_463);
		assert_eq!(toc.tracks()[2].sectors(), 0xB327 - 0x6256 - SESSION_GAP);
		assert_eq!(
			toc.accuraterip_ids(),
			accuraterip_ids(&[0x96, 0x2D2B, 0x6256], 34_463),
		);
	}

	#[test]
	fn t_from_cdtoc_data_first() {
		// A leading data track, then three audio tracks.
		let toc = DiscToc::from_cdtoc("3+2D2B+6256+B327+D84A+X96").expect("CDTOC failed.");
		assert_eq!(toc.kind(), DiscType::MixedMode);
		assert_eq!(toc.sessions(), 1);
		assert_eq!(toc.tracks().len(), 4);
		assert_eq!(toc.audio_len(), 3);
		assert_eq!(toc.db_tracks(), 4, "The data track has a database slot.");
		assert!(toc.pregap().is_none(), "The data track starts at the lead-in.");

		let data = toc.tracks()[0];
		assert_eq!(data.kind(), TrackKind::Data);
		assert_eq!(data.number(), 1);
		assert_eq!(data.lba(), 150);
		assert_eq!(toc.tracks()[1].number(), 2);
		assert_eq!(toc.tracks()[1].lba(), 0x2D2B);

		// Nothing is trimmed here.
		assert_eq!(toc.audio_leadout(), 0xD84A);
		assert_eq!(toc.tracks()[3].sectors(), 0xD84A - 0xB327);
		assert_eq!(
			toc.disc_id().map(|id| id.tracks()),
			Ok(4),
		);
	}

	#[test]
	fn t_pregap() {
		let toc = DiscToc::from_lbas(
			&[(182, TrackKind::Audio), (5000, TrackKind::Audio)],
			9000,
			1,
		).expect("TOC failed.");
		let pregap = toc.pregap().expect("Missing pregap.");
		assert_eq!(pregap.sectors(), 32);
		assert_eq!(toc.audio_len(), 2, "The pregap should not count as a track.");
		assert_eq!(toc.tracks()[0].sectors(), 5000 - 182);
	}

	#[test]
	fn t_mixed_mode() {
		let toc = DiscToc::from_lbas(
			&[
				(150, TrackKind::Data),
				(20_000, TrackKind::Audio),
				(30_000, TrackKind::Audio),
			],
			40_000,
			1,
		).expect("TOC failed.");
		assert_eq!(toc.kind(), DiscType::MixedMode);
		assert_eq!(toc.audio_len(), 2);
		assert_eq!(toc.db_tracks(), 3);
		assert_eq!(toc.audio_leadout(), 40_000);
		assert_eq!(toc.accuraterip_ids(), accuraterip_ids(&[20_000, 30_000], 40_000));
	}

	#[test]
	fn t_enhanced() {
		let toc = DiscToc::new(
			vec![
				TrackOffset::new(1, 150, 10_000, TrackKind::Audio),
				TrackOffset::new(2, 10_150, 19_850, TrackKind::Audio),
				TrackOffset::new(3, 30_000, 5000, TrackKind::Data),
			],
			35_000,
			2,
		).expect("TOC failed.");
		assert_eq!(toc.kind(), DiscType::Enhanced);
		assert_eq!(toc.tracks()[1].sectors(), 19_850 - SESSION_GAP);
		assert_eq!(toc.tracks()[0].sectors(), 10_000, "Only the last audio track changes.");
		assert_eq!(toc.audio_leadout(), 30_000 - SESSION_GAP);
		assert_eq!(toc.db_tracks(), 2);
		assert_eq!(
			toc.freedb_id(),
			freedb_id(&[150, 10_150, 30_000], 35_000),
			"FreeDB should see every track.",
		);
	}

	#[test]
	fn t_invalid() {
		assert_eq!(DiscToc::new(Vec::new(), 1000, 1), Err(ArverError::InvalidToc("no tracks")));
		assert!(matches!(
			DiscToc::new(vec![TrackOffset::new(2, 150, 100, TrackKind::Audio)], 250, 1),
			Err(ArverError::InvalidToc(_)),
		));
		assert!(matches!(
			DiscToc::from_lbas(&[(150, TrackKind::Audio), (100, TrackKind::Audio)], 250, 1),
			Err(ArverError::InvalidToc(_)),
		));
		assert!(matches!(
			DiscToc::from_lbas(&[(150, TrackKind::Audio)], 150, 1),
			Err(ArverError::InvalidToc(_)),
		));
		assert_eq!(
			DiscToc::from_lbas(&[(150, TrackKind::Data)], 1000, 1),
			Err(ArverError::UnsupportedDisc),
		);
		assert_eq!(
			DiscToc::from_lbas(&[(150, TrackKind::Audio), (500, TrackKind::Data)], 1000, 1),
			Err(ArverError::UnsupportedDisc),
		);
	}

	#[test]
	fn t_msf() {
		assert_eq!(msf(0), "0:00.00");
		assert_eq!(msf(75 * 61 + 3), "1:01.03");
		assert_eq!(msf(279_037), "62:00.37");
	}
}
