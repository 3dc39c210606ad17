/*!
# ARver: Cache
*/

use crate::ArverError;
use std::{
	io::Write,
	path::{
		Path,
		PathBuf,
	},
};
use tempfile::NamedTempFile;



/// # Read From Cache.
///
/// Return the contents of `src` if it exists and is non-empty; problems are
/// treated the same as a miss.
pub(crate) fn cache_read(src: &Path) -> Option<Vec<u8>> {
	std::fs::read(src).ok().filter(|v| ! v.is_empty())
}



#[derive(Debug)]
/// # Cache Writer.
///
/// Data is written to a temporary file in the destination's directory, and
/// only moved into place once [`CacheWriter::finish`] is called. A write that
/// fails midway never leaves a partial file at the destination.
pub(crate) struct CacheWriter {
	dst: PathBuf,
	tmp: NamedTempFile,
}

impl CacheWriter {
	/// # New.
	///
	/// The parent directory is created if missing.
	///
	/// ## Errors
	///
	/// This will return an error if the destination has no parent or the
	/// temporary file cannot be created.
	pub(crate) fn new(dst: &Path) -> Result<Self, ArverError> {
		let err = || ArverError::Write(dst.to_string_lossy().into_owned());
		let dir = dst.parent()
			.filter(|p| ! p.as_os_str().is_empty())
			.ok_or_else(err)?;

		if ! dir.is_dir() { std::fs::create_dir_all(dir).map_err(|_| err())?; }
		let tmp = NamedTempFile::new_in(dir).map_err(|_| err())?;

		Ok(Self { dst: dst.to_path_buf(), tmp })
	}

	/// # Writer.
	pub(crate) fn writer(&mut self) -> &mut impl Write { &mut self.tmp }

	/// # Finish.
	///
	/// Flush and move the temporary file to its final destination, replacing
	/// whatever was there before.
	///
	/// ## Errors
	///
	/// This will return an error if the flush or the move fail.
	pub(crate) fn finish(mut self) -> Result<(), ArverError> {
		let err = ArverError::Write(self.dst.to_string_lossy().into_owned());
		self.tmp.flush().map_err(|_| err.clone())?;
		self.tmp.persist(&self.dst).map(|_| ()).map_err(|_| err)
	}
}

/// # Write to Cache.
///
/// Atomically write `data` to `dst`.
///
/// ## Errors
///
/// This will return an error if any part of the write fails.
pub(crate) fn cache_write(dst: &Path, data: &[u8]) -> Result<(), ArverError> {
	let mut writer = CacheWriter::new(dst)?;
	writer.writer()
		.write_all(data)
		.map_err(|_| ArverError::Write(dst.to_string_lossy().into_owned()))?;
	writer.finish()
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_cache() {
		let dir = tempfile::tempdir().expect("Tempdir failed.");
		let dst = dir.path().join("nested").join("dBAR-test.bin");
		assert!(cache_read(&dst).is_none(), "Nothing should be cached yet.");

		assert!(cache_write(&dst, b"hello").is_ok(), "Write failed.");
		assert_eq!(cache_read(&dst).as_deref(), Some(&b"hello"[..]));

		// Overwrite.
		assert!(cache_write(&dst, b"world!").is_ok(), "Rewrite failed.");
		assert_eq!(cache_read(&dst).as_deref(), Some(&b"world!"[..]));

		// Empty files count as misses.
		assert!(cache_write(&dst, b"").is_ok(), "Empty write failed.");
		assert!(cache_read(&dst).is_none(), "Empty files should be ignored.");

		// Nowhere to put it.
		assert!(CacheWriter::new(Path::new("dBAR-test.bin")).is_err(), "Parentless paths should fail.");
	}
}
