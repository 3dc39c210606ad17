/*!
# ARver: Verification Options
*/

use std::num::NonZeroUsize;



/// # FLAG: Permissive.
const FLAG_PERMISSIVE: u8 = 0b0000_0001;

/// # FLAG: Verbose.
const FLAG_VERBOSE: u8 =    0b0000_0010;

/// # Maximum Threads.
const THREADS_MAX: u16 = 256;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Verification Options.
///
/// Options are set using builder-style methods, like:
///
/// ```
/// use arver_core::VerifyOptions;
///
/// let opts = VerifyOptions::default()
///     .with_permissive(true)
///     .with_min_confidence(2)
///     .with_threads(4);
///
/// assert!(opts.permissive());
/// assert_eq!(opts.min_confidence(), 2);
/// assert_eq!(opts.threads(), 4);
/// ```
pub struct VerifyOptions {
	flags: u8,
	min_confidence: u8,
	threads: u16,
}

impl Default for VerifyOptions {
	fn default() -> Self {
		Self {
			flags: 0,
			min_confidence: 1,
			threads: 0,
		}
	}
}

macro_rules! with_flag {
	($fn:ident, $flag:ident, $($doc:literal),+ $(,)?) => (
		#[must_use]
		$(
			#[doc = $doc]
		)+
		pub const fn $fn(self, v: bool) -> Self {
			let flags =
				if v { self.flags | $flag }
				else { self.flags & ! $flag };

			Self {
				flags,
				..self
			}
		}
	)
}

/// ## Setters.
impl VerifyOptions {
	with_flag!(
		with_permissive,
		FLAG_PERMISSIVE,
		"# Permissive Mode.",
		"",
		"When `true`, track length mismatches between the rip files and the",
		"disc are logged but otherwise ignored, and verification proceeds.",
		"",
		"The default is `false`.",
	);

	with_flag!(
		with_verbose,
		FLAG_VERBOSE,
		"# Verbose.",
		"",
		"When `true`, log entries are echoed to STDERR as they happen.",
		"",
		"The default is `false`.",
	);

	#[must_use]
	/// # Minimum Confidence.
	///
	/// Matches with a lower database confidence than this are still counted
	/// as successes, but are not considered confident.
	///
	/// The default is `1`.
	pub const fn with_min_confidence(self, min_confidence: u8) -> Self {
		Self {
			min_confidence,
			..self
		}
	}

	#[must_use]
	/// # Threads.
	///
	/// Set the maximum number of threads to use when crunching track
	/// checksums. Zero means "auto", i.e. the available parallelism.
	///
	/// Values are capped at `256`.
	pub const fn with_threads(self, threads: u16) -> Self {
		let threads =
			if threads < THREADS_MAX { threads }
			else { THREADS_MAX };

		Self {
			threads,
			..self
		}
	}
}



macro_rules! get_flag {
	($fn:ident, $flag:ident, $title:literal) => (
		#[must_use]
		#[doc = concat!("# ", $title, "?")]
		pub const fn $fn(&self) -> bool { $flag == self.flags & $flag }
	);
}

/// # Getters.
impl VerifyOptions {
	get_flag!(permissive, FLAG_PERMISSIVE, "Permissive Mode");
	get_flag!(verbose, FLAG_VERBOSE, "Verbose");

	#[must_use]
	/// # Minimum Confidence.
	pub const fn min_confidence(&self) -> u8 { self.min_confidence }

	#[must_use]
	/// # Threads.
	///
	/// Return the thread count, resolving "auto" to the available
	/// parallelism (or `1` if that cannot be determined).
	pub fn threads(&self) -> usize {
		if self.threads == 0 {
			std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
		}
		else { usize::from(self.threads) }
	}
}
