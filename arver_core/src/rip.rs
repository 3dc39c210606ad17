/*!
# ARver: Rip
*/

use crate::{
	AccurateRipDisc,
	ArverError,
	checksums,
	ChecksumSet,
	DiscToc,
	frame_window_table,
	FrameWindowTable,
	MAX_TRACKS,
	OffsetVotes,
	SampleSource,
	SAMPLES_PER_SECTOR,
	VerifyLog,
	VerifyLogKind,
	VerifyOptions,
};
use dactyl::traits::NiceInflection;
use std::{
	path::{
		Path,
		PathBuf,
	},
	sync::OnceLock,
};



/// # Default HTOA File Names.
///
/// Rippers that extract the hidden pregap audio save it under one of these
/// names. They never correspond to a database track, so are left out.
pub const HTOA_NAMES: [&str; 4] = [
	"track00.wav",
	"track00.cdda.wav",
	"track00.flac",
	"track00.cdda.flac",
];



#[derive(Debug)]
/// # Rip Track.
///
/// A single ripped audio file. Its checksums are computed on demand, at most
/// once.
pub struct RipTrack {
	src: PathBuf,
	frames: u32,
	checksums: OnceLock<ChecksumSet>,
}

impl RipTrack {
	#[must_use]
	/// # Source Path.
	pub fn src(&self) -> &Path { &self.src }

	#[must_use]
	/// # Length (Samples).
	pub const fn frames(&self) -> u32 { self.frames }

	#[must_use]
	#[allow(clippy::integer_division)]
	/// # Length (Sectors).
	///
	/// Partial sectors are dropped.
	pub const fn cdda_sectors(&self) -> u32 { self.frames / SAMPLES_PER_SECTOR as u32 }

	#[must_use]
	/// # Is CDDA?
	///
	/// Returns `true` if the length is a whole number of sectors, as it
	/// would be for any properly extracted track.
	pub const fn is_cdda(&self) -> bool { self.frames % SAMPLES_PER_SECTOR as u32 == 0 }

	#[must_use]
	/// # Checksums.
	///
	/// Return the checksums if they have been computed.
	pub fn checksums(&self) -> Option<ChecksumSet> { self.checksums.get().copied() }

	/// # Compute Checksums.
	fn compute<S>(&self, source: &S, track: u8, total: u8)
	-> Result<ChecksumSet, ArverError>
	where S: SampleSource + ?Sized {
		if let Some(chk) = self.checksums.get() { return Ok(*chk); }

		let data = source.read_samples(&self.src)?;
		let chk = checksums(&data, track, total)?;
		Ok(*self.checksums.get_or_init(|| chk))
	}

	/// # Compute Frame-Window Table.
	fn frame_window_table<S>(&self, source: &S) -> Result<FrameWindowTable, ArverError>
	where S: SampleSource + ?Sized {
		let data = source.read_samples(&self.src)?;
		Ok(frame_window_table(&data))
	}
}



#[derive(Debug)]
/// # Rip.
///
/// An ordered set of ripped track files, one per audio track on the disc.
///
/// ## Examples
///
/// ```no_run
/// use arver_core::{
///     AccurateRipDisc,
///     DiscToc,
///     HttpFetcher,
///     Rip,
///     VerifyLog,
///     VerifyOptions,
///     WavSource,
/// };
///
/// let toc = DiscToc::from_cdtoc("4+96+2D2B+6256+B327+D84A").unwrap();
/// let disc = AccurateRipDisc::fetch(&toc.disc_id().unwrap(), &HttpFetcher::new()).unwrap();
///
/// let mut log = VerifyLog::new(false);
/// let rip = Rip::load(
///     ["track01.wav", "track02.wav", "track03.wav", "track04.wav"],
///     &WavSource,
///     &mut log,
/// ).unwrap();
///
/// let verdict = rip.verify(&WavSource, &toc, &disc, VerifyOptions::default(), &mut log)
///     .unwrap();
/// println!("{}", verdict.summary());
/// ```
pub struct Rip {
	tracks: Vec<RipTrack>,
}

impl Rip {
	/// # Load.
	///
	/// Build a rip from a list of file paths, in track order, skipping any
	/// with a default HTOA name (see [`HTOA_NAMES`]).
	///
	/// ## Errors
	///
	/// See [`Rip::load_excluding`].
	pub fn load<I, P, S>(paths: I, source: &S, log: &mut VerifyLog)
	-> Result<Self, ArverError>
	where
		I: IntoIterator<Item=P>,
		P: AsRef<Path>,
		S: SampleSource + ?Sized {
		Self::load_excluding(paths, source, &HTOA_NAMES, log)
	}

	/// # Load (Custom Exclusions).
	///
	/// Same as [`Rip::load`], but skipping files matching any of the
	/// `exclude` patterns instead.
	///
	/// Patterns are shell-style globs (`*`, `?`, and `[…]` classes, with `!`
	/// or `^` to negate) compared case-insensitively against either the file
	/// name or the full path. A pattern without wildcards is thus a plain
	/// file name, like the defaults.
	///
	/// Files whose length cannot be read, or that have no samples at all, are
	/// also left out. Everything skipped is noted in the log.
	///
	/// ## Errors
	///
	/// If nothing is left, an error is returned.
	pub fn load_excluding<I, P, S>(
		paths: I,
		source: &S,
		exclude: &[&str],
		log: &mut VerifyLog,
	) -> Result<Self, ArverError>
	where
		I: IntoIterator<Item=P>,
		P: AsRef<Path>,
		S: SampleSource + ?Sized {
		let mut tracks = Vec::new();
		for src in paths {
			let src = src.as_ref();
			let excluded = is_excluded(src, exclude);
			if excluded {
				log.add(
					VerifyLogKind::Skip,
					format!("Skipping {} (HTOA).", src.display()),
				);
				continue;
			}

			match source.frame_count(src) {
				Ok(0) => log.add(
					VerifyLogKind::Skip,
					format!("Skipping {}: {}", src.display(), ArverError::EmptyTrack),
				),
				Ok(frames) => tracks.push(RipTrack {
					src: src.to_path_buf(),
					frames,
					checksums: OnceLock::new(),
				}),
				Err(e) => log.add(
					VerifyLogKind::Skip,
					format!("Skipping {}: {e}", src.display()),
				),
			}
		}

		if tracks.is_empty() { Err(ArverError::NoTracks) }
		else { Ok(Self { tracks }) }
	}

	#[must_use]
	/// # Tracks.
	pub fn tracks(&self) -> &[RipTrack] { &self.tracks }

	#[must_use]
	/// # Track Count.
	pub fn len(&self) -> usize { self.tracks.len() }

	#[must_use]
	/// # Is Empty?
	pub fn is_empty(&self) -> bool { self.tracks.is_empty() }

	/// # Checksums.
	///
	/// Compute (or recall) the checksums for every track, using each file's
	/// position in the rip as its track number.
	///
	/// Tracks are split across up to [`VerifyOptions::threads`] threads.
	///
	/// ## Errors
	///
	/// This will return an error if any file cannot be read, or if the rip
	/// has more than `99` tracks.
	pub fn checksums<S>(&self, source: &S, opts: VerifyOptions)
	-> Result<Vec<ChecksumSet>, ArverError>
	where S: SampleSource + Sync + ?Sized {
		let total = self.total()?;
		self.parallel(opts.threads(), |idx, t| t.compute(source, idx, total))
	}

	/// # Frame-Window Tables.
	///
	/// Compute the frame-window table for every track, in parallel. These are
	/// not cached.
	///
	/// ## Errors
	///
	/// This will return an error if any file cannot be read.
	pub fn frame_window_tables<S>(&self, source: &S, opts: VerifyOptions)
	-> Result<Vec<FrameWindowTable>, ArverError>
	where S: SampleSource + Sync + ?Sized {
		self.parallel(opts.threads(), |_, t| t.frame_window_table(source))
	}

	/// # Detect Pressing Offset.
	///
	/// Tally up the candidate sample offsets between this rip and the
	/// pressings in the database. See [`detect_offset`](crate::detect_offset)
	/// for details.
	///
	/// ## Errors
	///
	/// This will return an error if any file cannot be read.
	pub fn detect_offset<S>(
		&self,
		source: &S,
		toc: &DiscToc,
		disc: &AccurateRipDisc,
		opts: VerifyOptions,
	) -> Result<OffsetVotes, ArverError>
	where S: SampleSource + Sync + ?Sized {
		let tables = self.frame_window_tables(source, opts)?;
		Ok(crate::detect_offset(&tables, disc, toc.kind()))
	}

	/// # Total (as `u8`).
	fn total(&self) -> Result<u8, ArverError> {
		u8::try_from(self.tracks.len())
			.ok()
			.filter(|&n| n <= MAX_TRACKS)
			.ok_or(ArverError::TrackCountMismatch(self.tracks.len(), usize::from(MAX_TRACKS)))
	}

	#[allow(clippy::integer_division)]
	/// # Parallel Map.
	///
	/// Run `cb` against each (one-based) track index and track, split into
	/// contiguous chunks across `threads` scoped threads, and collect the
	/// results in order.
	fn parallel<T, F>(&self, threads: usize, cb: F) -> Result<Vec<T>, ArverError>
	where
		T: Send,
		F: Fn(u8, &RipTrack) -> Result<T, ArverError> + Sync {
		let jobs: Vec<(u8, &RipTrack)> = (1..=MAX_TRACKS).zip(&self.tracks).collect();
		if jobs.len() != self.tracks.len() {
			return Err(ArverError::TrackCountMismatch(self.tracks.len(), usize::from(MAX_TRACKS)));
		}

		let threads = threads.clamp(1, jobs.len().max(1));
		let chunk = (jobs.len() + threads - 1) / threads;
		let cb = &cb;

		std::thread::scope(|s| -> Result<Vec<T>, ArverError> {
			let workers: Vec<_> = jobs.chunks(chunk.max(1))
				.map(|set| s.spawn(move ||
					set.iter()
						.map(|(idx, t)| cb(*idx, *t))
						.collect::<Result<Vec<T>, ArverError>>()
				))
				.collect();

			let mut out = Vec::with_capacity(jobs.len());
			for worker in workers {
				let res = worker.join()
					.map_err(|_| ArverError::Bug("a checksum thread panicked"))?;
				out.extend(res?);
			}
			Ok(out)
		})
	}

	/// # Log Length Differences.
	///
	/// Compare each track's length against the disc's audio tracks, noting
	/// any differences. The number of mismatches is returned.
	pub(crate) fn log_lengths(&self, toc: &DiscToc, log: &mut VerifyLog) -> usize {
		let mut mismatched = 0;
		for (cd, t) in toc.audio_tracks().zip(&self.tracks) {
			let have = t.cdda_sectors();
			let want = cd.sectors();
			if have != want {
				mismatched += 1;
				let (diff, rel) =
					if want < have { (have - want, "shorter") }
					else { (want - have, "longer") };
				log.add(
					VerifyLogKind::Length,
					format!(
						"CD track {:02} is {} {rel} than {}.",
						cd.number(),
						diff.nice_inflect("frame", "frames"),
						t.src.display(),
					),
				);
			}

			if ! t.is_cdda() {
				log.add(
					VerifyLogKind::Advisory,
					format!("{} is not a whole number of sectors.", t.src.display()),
				);
			}
		}

		mismatched
	}
}



/// # Excluded?
///
/// Returns `true` if the file name or full path matches any of the patterns.
fn is_excluded(src: &Path, patterns: &[&str]) -> bool {
	if patterns.is_empty() { return false; }
	let full: Vec<char> = src.to_string_lossy().chars().collect();
	let name: Vec<char> = src.file_name()
		.map(|n| n.to_string_lossy().chars().collect())
		.unwrap_or_default();

	patterns.iter().any(|pat| {
		let pat: Vec<char> = pat.chars().collect();
		glob_match(&pat, &name) || glob_match(&pat, &full)
	})
}

/// # Glob Match.
///
/// Case-insensitive shell-style matching. A `*` matches anything, including
/// path separators.
fn glob_match(pat: &[char], txt: &[char]) -> bool {
	let mut p = 0;
	let mut t = 0;
	let mut star: Option<(usize, usize)> = None;

	while t < txt.len() {
		if pat.get(p) == Some(&'*') {
			star = Some((p, t));
			p += 1;
			continue;
		}

		if let Some(n) = pat.get(p..).and_then(|rest| glob_step(rest, txt[t])) {
			p += n;
			t += 1;
			continue;
		}

		// Backtrack to the last star, letting it eat one more character.
		match star {
			Some((sp, st)) => {
				p = sp + 1;
				t = st + 1;
				star = Some((sp, t));
			},
			None => return false,
		}
	}

	pat[p..].iter().all(|c| '*'.eq(c))
}

/// # Glob Step.
///
/// Match one character against the start of the (non-star) pattern,
/// returning the number of pattern characters consumed.
fn glob_step(pat: &[char], c: char) -> Option<usize> {
	match *pat.first()? {
		'?' => Some(1),
		'[' => match glob_class(pat, c) {
			Some((true, len)) => Some(len),
			Some((false, _)) => None,
			// An unclosed bracket is just a bracket.
			None => ('[' == c).then_some(1),
		},
		p => p.eq_ignore_ascii_case(&c).then_some(1),
	}
}

/// # Glob Class.
///
/// Parse a `[…]` class at the start of the pattern, returning whether it
/// matches and its total length, or `None` if it is never closed.
fn glob_class(pat: &[char], c: char) -> Option<(bool, usize)> {
	let negate = matches!(pat.get(1), Some('!' | '^'));
	let start = if negate { 2 } else { 1 };

	// A leading bracket is literal.
	let mut end = start;
	if pat.get(end) == Some(&']') { end += 1; }
	while pat.get(end)? != &']' { end += 1; }

	let body = &pat[start..end];
	let lower = c.to_ascii_lowercase();
	let upper = c.to_ascii_uppercase();
	let mut hit = false;
	let mut k = 0;
	while k < body.len() {
		if k + 2 < body.len() && body[k + 1] == '-' {
			let range = body[k]..=body[k + 2];
			hit |= range.contains(&lower) || range.contains(&upper);
			k += 3;
		}
		else {
			hit |= body[k].eq_ignore_ascii_case(&c);
			k += 1;
		}
	}

	Some((hit != negate, end + 1))
}
