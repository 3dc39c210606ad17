/*!
# ARver: Data Sources

The verification engine needs two things it does not produce itself: the
audio samples of each ripped track, and the raw database response for the
disc. Both are abstracted behind traits so alternative decoders or
transports can be plugged in.
*/

use crate::{
	AccurateRipDisc,
	ArverError,
	cache::{
		cache_read,
		cache_write,
	},
	DiscId,
	Sample,
	WAVE_SPEC,
};
use hound::WavReader;
use std::{
	fs::File,
	io::{
		BufReader,
		Read,
	},
	path::{
		Path,
		PathBuf,
	},
	sync::OnceLock,
	time::Duration,
};
use ureq::{
	Agent,
	AgentBuilder,
};



/// # Connection Agent.
static AGENT: OnceLock<Agent> = OnceLock::new();



/// # Sample Source.
///
/// Something that can turn a file path into CDDA samples: interleaved 16-bit
/// stereo, one `[u8; 4]` per left/right pair.
pub trait SampleSource {
	/// # Frame Count.
	///
	/// Return the number of stereo samples in the file without decoding them.
	///
	/// ## Errors
	///
	/// Implementations should return `UnsupportedFormat` for anything that
	/// isn't CDDA, and `ReadFailure` for I/O problems.
	fn frame_count(&self, src: &Path) -> Result<u32, ArverError>;

	/// # Read Samples.
	///
	/// ## Errors
	///
	/// As with [`SampleSource::frame_count`].
	fn read_samples(&self, src: &Path) -> Result<Vec<Sample>, ArverError>;
}



#[derive(Debug, Clone, Copy, Default)]
/// # WAV Source.
///
/// Read CDDA samples from WAV files. Only 2-channel, 44.1kHz, 16-bit integer
/// PCM is accepted.
pub struct WavSource;

impl SampleSource for WavSource {
	fn frame_count(&self, src: &Path) -> Result<u32, ArverError> {
		let reader = wav_open(src)?;

		// Hound counts per-channel samples, but reports the duration in
		// stereo pairs.
		Ok(reader.duration())
	}

	fn read_samples(&self, src: &Path) -> Result<Vec<Sample>, ArverError> {
		let mut reader = wav_open(src)?;
		let mut out = Vec::with_capacity(reader.duration() as usize);
		let mut samples = reader.samples::<i16>();
		loop {
			match (samples.next(), samples.next()) {
				(Some(l), Some(r)) => {
					let l = l.map_err(|_| read_failure(src))?.to_le_bytes();
					let r = r.map_err(|_| read_failure(src))?.to_le_bytes();
					out.push([l[0], l[1], r[0], r[1]]);
				},
				(None, None) => break,
				// A left without a right.
				_ => return Err(read_failure(src)),
			}
		}

		Ok(out)
	}
}

/// # Open WAV.
///
/// Open the file and make sure it is CDDA.
fn wav_open(src: &Path) -> Result<WavReader<BufReader<File>>, ArverError> {
	let reader = WavReader::open(src).map_err(|e| match e {
		hound::Error::IoError(_) => read_failure(src),
		_ => ArverError::UnsupportedFormat(src.to_string_lossy().into_owned()),
	})?;

	if reader.spec() == WAVE_SPEC { Ok(reader) }
	else { Err(ArverError::UnsupportedFormat(src.to_string_lossy().into_owned())) }
}

/// # Read Failure.
fn read_failure(src: &Path) -> ArverError {
	ArverError::ReadFailure(src.to_string_lossy().into_owned())
}



/// # Response Fetcher.
///
/// Something that can return the raw `dBAR` bytes for a disc.
pub trait ResponseFetcher {
	/// # Fetch.
	///
	/// ## Errors
	///
	/// Implementations should return `NotFound` if the database has no record
	/// of the disc, and `Transport` for anything else that goes wrong.
	fn fetch(&self, id: &DiscId) -> Result<Vec<u8>, ArverError>;
}



#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// # Cache Fetcher.
///
/// Read previously downloaded responses from a local directory, where each
/// is saved as `dBAR-<id>.bin`.
pub struct CacheFetcher {
	dir: PathBuf,
}

impl CacheFetcher {
	#[must_use]
	/// # New.
	pub fn new<P>(dir: P) -> Self
	where P: AsRef<Path> {
		Self { dir: dir.as_ref().to_path_buf() }
	}

	#[must_use]
	/// # Path.
	///
	/// Return the path a given disc's response would live at.
	pub fn path(&self, id: &DiscId) -> PathBuf { self.dir.join(id.file_name()) }
}

impl ResponseFetcher for CacheFetcher {
	fn fetch(&self, id: &DiscId) -> Result<Vec<u8>, ArverError> {
		cache_read(&self.path(id)).ok_or_else(|| ArverError::NotFound(id.to_string()))
	}
}



#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// # HTTP Fetcher.
///
/// Download responses straight from the AccurateRip servers.
///
/// If a cache directory is set, it is checked first, and successful
/// downloads are saved to it for next time. Only responses that decode
/// cleanly for the requested disc are read from or written to the cache.
pub struct HttpFetcher {
	cache: Option<CacheFetcher>,
}

impl HttpFetcher {
	#[must_use]
	/// # New.
	pub const fn new() -> Self { Self { cache: None } }

	#[must_use]
	/// # With Cache.
	pub fn with_cache<P>(dir: P) -> Self
	where P: AsRef<Path> {
		Self { cache: Some(CacheFetcher::new(dir)) }
	}
}

impl ResponseFetcher for HttpFetcher {
	fn fetch(&self, id: &DiscId) -> Result<Vec<u8>, ArverError> {
		// Check the cache first.
		if let Some(out) = self.cached(id) { return Ok(out); }

		let out = download(id)?;
		self.save(id, &out);
		Ok(out)
	}
}

impl HttpFetcher {
	/// # Cached Response.
	///
	/// Return the cached copy, but only if it decodes cleanly for this disc.
	/// Anything else is ignored so a fresh copy gets downloaded.
	fn cached(&self, id: &DiscId) -> Option<Vec<u8>> {
		let out = self.cache.as_ref()?.fetch(id).ok()?;
		if AccurateRipDisc::decode(&out, Some(id)).is_ok() { Some(out) }
		else { None }
	}

	/// # Save Response.
	///
	/// Write a downloaded response to the cache, if there is one and the
	/// response decodes cleanly for this disc. This is a nice-to-have, so
	/// write errors are ignored.
	fn save(&self, id: &DiscId, data: &[u8]) {
		if let Some(cache) = &self.cache {
			if AccurateRipDisc::decode(data, Some(id)).is_ok() {
				let _res = cache_write(&cache.path(id), data);
			}
		}
	}
}

/// # Connection Agent.
///
/// Storing the agent statically saves a little bit of overhead on reuse.
fn agent() -> &'static Agent {
	AGENT.get_or_init(||
		AgentBuilder::new()
			.timeout(Duration::from_secs(15))
			.user_agent(concat!("ARver/", env!("CARGO_PKG_VERSION")))
			.max_idle_connections(0)
			.build()
	)
}

/// # Download.
fn download(id: &DiscId) -> Result<Vec<u8>, ArverError> {
	let res = agent().get(&id.checksum_url()).call().map_err(|e| match e {
		ureq::Error::Status(404, _) => ArverError::NotFound(id.to_string()),
		ureq::Error::Status(code, _) => ArverError::Transport(format!("HTTP {code}.")),
		ureq::Error::Transport(e) => ArverError::Transport(e.to_string()),
	})?;

	let mut out = Vec::new();
	res.into_reader()
		.read_to_end(&mut out)
		.map_err(|e| ArverError::Transport(e.to_string()))?;

	if out.is_empty() { Err(ArverError::NotFound(id.to_string())) }
	else { Ok(out) }
}



#[cfg(test)]
/// # Write WAV (Testing).
///
/// Save samples to a CDDA WAV file.
pub(crate) fn write_wav(dst: &Path, data: &[Sample]) {
	let mut wav = hound::WavWriter::create(dst, WAVE_SPEC).expect("WAV create failed.");
	for sample in data {
		wav.write_sample(i16::from_le_bytes([sample[0], sample[1]])).expect("WAV write failed.");
		wav.write_sample(i16::from_le_bytes([sample[2], sample[3]])).expect("WAV write failed.");
	}
	wav.finalize().expect("WAV finalize failed.");
}



#[cfg(test)]
#[derive(Debug, Default)]
/// # In-Memory Source (Testing).
pub(crate) struct MemSource(std::collections::HashMap<PathBuf, Vec<Sample>>);

#[cfg(test)]
impl MemSource {
	/// # Add File.
	pub(crate) fn insert<P>(&mut self, src: P, data: Vec<Sample>)
	where P: AsRef<Path> {
		self.0.insert(src.as_ref().to_path_buf(), data);
	}
}

#[cfg(test)]
impl SampleSource for MemSource {
	fn frame_count(&self, src: &Path) -> Result<u32, ArverError> {
		self.0.get(src)
			.and_then(|v| u32::try_from(v.len()).ok())
			.ok_or_else(|| read_failure(src))
	}

	fn read_samples(&self, src: &Path) -> Result<Vec<Sample>, ArverError> {
		self.0.get(src).cloned().ok_or_else(|| read_failure(src))
	}
}
