/*!
# ARver: Log
*/

use crate::VerifyOptions;
use fyi_msg::Msg;
use std::{
	fmt,
	io::Write,
};
use utc2k::FmtUtc2k;



#[derive(Debug, Clone, Default)]
/// # Verification Log.
///
/// Rip loading and verification do not print or bail over minor problems;
/// they collect them here instead, along with the per-track results, so the
/// caller gets a complete, consistently ordered record of the run.
///
/// In verbose mode, each entry is also echoed to STDERR as it is added.
pub struct VerifyLog {
	verbose: bool,
	entries: Vec<(FmtUtc2k, VerifyLogKind, String)>,
}

impl fmt::Display for VerifyLog {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (time, kind, msg) in &self.entries {
			writeln!(f, "[{time}] {:<6} {msg}", kind.as_str())?;
		}
		Ok(())
	}
}

impl From<VerifyOptions> for VerifyLog {
	#[inline]
	fn from(opts: VerifyOptions) -> Self { Self::new(opts.verbose()) }
}

impl VerifyLog {
	#[must_use]
	/// # New.
	pub const fn new(verbose: bool) -> Self {
		Self {
			verbose,
			entries: Vec::new(),
		}
	}

	/// # Add Entry.
	pub(crate) fn add<S>(&mut self, kind: VerifyLogKind, msg: S)
	where S: Into<String> {
		let msg = msg.into();
		if self.verbose {
			match kind {
				VerifyLogKind::Result => Msg::custom(kind.as_str(), 199, &msg),
				_ => Msg::warning(&msg),
			}
				.eprint();
		}
		self.entries.push((FmtUtc2k::now(), kind, msg));
	}

	#[must_use]
	/// # Is Verbose?
	pub const fn is_verbose(&self) -> bool { self.verbose }

	#[must_use]
	/// # Is Empty?
	pub fn is_empty(&self) -> bool { self.entries.is_empty() }

	#[must_use]
	/// # Length.
	pub fn len(&self) -> usize { self.entries.len() }

	#[must_use]
	/// # Count By Kind.
	pub fn count(&self, kind: VerifyLogKind) -> usize {
		self.entries.iter().filter(|(_, k, _)| *k == kind).count()
	}

	/// # Entries.
	///
	/// Return the timestamp, kind, and message of each entry, in the order
	/// they were added.
	pub fn entries(&self) -> impl Iterator<Item=(&FmtUtc2k, VerifyLogKind, &str)> + '_ {
		self.entries.iter().map(|(t, k, m)| (t, *k, m.as_str()))
	}

	/// # Print.
	///
	/// Write the whole log to STDERR.
	pub fn print(&self) {
		if self.entries.is_empty() { return; }
		let writer = std::io::stderr();
		let mut handle = writer.lock();
		let _res = write!(&mut handle, "{self}").and_then(|()| handle.flush());
	}
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Log Entry Kind.
pub enum VerifyLogKind {
	/// # A file was left out of the rip.
	Skip,

	/// # Something worth knowing, but not a problem in itself.
	Advisory,

	/// # A track's length differs from the disc.
	Length,

	/// # A per-track verification result.
	Result,
}

impl VerifyLogKind {
	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Skip => "SKIP",
			Self::Advisory => "NOTE",
			Self::Length => "LENGTH",
			Self::Result => "RESULT",
		}
	}
}
