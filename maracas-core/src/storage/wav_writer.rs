use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::audio_models::SampleSpec;
use crate::models::error::RecorderError;
use crate::processing::wav_format;

/// Streaming WAV writer with late-bound size fields.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header, size fields zero until finalize]
/// [raw PCM data, appended verbatim...]
/// ```
///
/// The header is written exactly once, by the constructor. `finalize` may be
/// called repeatedly; each call patches both size fields from the current
/// write position and leaves the cursor at end-of-file. Appending after
/// `finalize` is rejected.
pub struct WavFileWriter<W: Write + Seek> {
    inner: W,
    audio_bytes: u64,
    finalized: bool,
}

impl<W: Write + Seek> WavFileWriter<W> {
    /// Wrap `inner` and write the placeholder header.
    pub fn new(mut inner: W, spec: SampleSpec) -> Result<Self, RecorderError> {
        let header = wav_format::placeholder_header(&spec);
        inner
            .write_all(&header)
            .map_err(|e| RecorderError::StorageError(format!("failed to write wav header: {}", e)))?;
        Ok(Self {
            inner,
            audio_bytes: 0,
            finalized: false,
        })
    }

    /// Append raw PCM bytes. No alignment to sample boundaries is enforced.
    pub fn append(&mut self, data: &[u8]) -> Result<(), RecorderError> {
        if self.finalized {
            return Err(RecorderError::WriterFinalized);
        }
        if data.is_empty() {
            return Ok(());
        }
        self.inner
            .write_all(data)
            .map_err(|e| RecorderError::StorageError(format!("write failed: {}", e)))?;
        self.audio_bytes += data.len() as u64;
        Ok(())
    }

    /// Patch the RIFF and data sizes from the current write position.
    ///
    /// Returns the total file size in bytes.
    pub fn finalize(&mut self) -> Result<u64, RecorderError> {
        let file_size = self.inner.stream_position().map_err(storage)?;

        self.inner.seek(SeekFrom::Start(wav_format::RIFF_SIZE_OFFSET)).map_err(storage)?;
        self.inner
            .write_all(&wav_format::riff_chunk_size(file_size).to_le_bytes())
            .map_err(storage)?;

        self.inner.seek(SeekFrom::Start(wav_format::DATA_SIZE_OFFSET)).map_err(storage)?;
        self.inner
            .write_all(&wav_format::data_chunk_size(file_size).to_le_bytes())
            .map_err(storage)?;

        self.inner.seek(SeekFrom::End(0)).map_err(storage)?;
        self.inner.flush().map_err(storage)?;
        self.finalized = true;
        Ok(file_size)
    }

    /// Audio bytes successfully appended, header excluded.
    pub fn audio_bytes(&self) -> u64 {
        self.audio_bytes
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl WavFileWriter<File> {
    /// Create `path` exclusively (it must not exist) and write the header.
    ///
    /// Writes go straight to the file, so a failed `append` reports that
    /// buffer's own error and leaves the file writable for the next one.
    pub fn create_new(path: &Path, spec: SampleSpec) -> Result<Self, RecorderError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                RecorderError::StorageError(format!("failed to create {}: {}", path.display(), e))
            })?;
        Self::new(file, spec)
    }

    /// Sync to disk and close the file handle.
    pub fn close(self) -> Result<(), RecorderError> {
        self.inner.sync_all().map_err(storage)
    }
}

fn storage(e: std::io::Error) -> RecorderError {
    RecorderError::StorageError(e.to_string())
}

/// Compute SHA-256 hex digest of a file.
pub fn sha256_file(path: &Path) -> Result<String, RecorderError> {
    let data = fs::read(path)
        .map_err(|e| RecorderError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    fn memory_writer() -> WavFileWriter<Cursor<Vec<u8>>> {
        WavFileWriter::new(Cursor::new(Vec::new()), SampleSpec::CAPTURE).unwrap()
    }

    /// Fails exactly one write (counting the header as write 0), then recovers.
    struct FlakyDisk {
        inner: Cursor<Vec<u8>>,
        fail_at: u32,
        writes: u32,
    }

    impl Write for FlakyDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = self.writes;
            self.writes += 1;
            if n == self.fail_at {
                return Err(io::Error::new(io::ErrorKind::Other, "transient EIO"));
            }
            self.inner.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FlakyDisk {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn silent_file_is_valid() {
        let mut writer = memory_writer();
        let size = writer.finalize().unwrap();
        assert_eq!(size, 44);

        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes.len(), 44);
        assert_eq!(wav_format::read_sizes(&bytes), Some((36, 0)));
    }

    #[test]
    fn one_second_of_mono_audio() {
        let mut writer = memory_writer();
        writer.append(&vec![0x11u8; 88_200]).unwrap();
        writer.finalize().unwrap();

        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes.len(), 44 + 88_200);
        assert_eq!(wav_format::read_sizes(&bytes), Some((88_236, 88_200)));
        // Audio bytes untouched by the header patch
        assert!(bytes[44..].iter().all(|&b| b == 0x11));
    }

    #[test]
    fn finalize_restores_cursor_to_end() {
        let mut writer = memory_writer();
        writer.append(&[1, 2, 3]).unwrap();
        writer.finalize().unwrap();
        assert_eq!(writer.get_ref().position(), 47);
    }

    #[test]
    fn finalize_twice_gives_same_sizes() {
        let mut writer = memory_writer();
        writer.append(&[0u8; 10]).unwrap();
        writer.finalize().unwrap();
        let first = wav_format::read_sizes(writer.get_ref().get_ref()).unwrap();
        writer.finalize().unwrap();
        let second = wav_format::read_sizes(writer.get_ref().get_ref()).unwrap();
        assert_eq!(first, second);
        assert_eq!(second, (46, 10));
    }

    #[test]
    fn append_after_finalize_is_rejected() {
        let mut writer = memory_writer();
        writer.finalize().unwrap();
        assert_eq!(writer.append(&[0u8; 4]), Err(RecorderError::WriterFinalized));
        assert_eq!(writer.audio_bytes(), 0);
    }

    #[test]
    fn odd_length_append_is_kept_verbatim() {
        let mut writer = memory_writer();
        writer.append(&[1, 2, 3]).unwrap();
        writer.append(&[4]).unwrap();
        writer.finalize().unwrap();
        assert_eq!(writer.audio_bytes(), 4);
        let bytes = writer.into_inner().into_inner();
        assert_eq!(&bytes[44..], &[1, 2, 3, 4]);
    }

    #[test]
    fn write_plain_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.wav");

        let mut writer = WavFileWriter::create_new(&path, SampleSpec::CAPTURE).unwrap();
        writer.append(&[0u8; 16]).unwrap();
        writer.finalize().unwrap();
        writer.close().unwrap();

        let file_data = fs::read(&path).unwrap();
        assert_eq!(file_data.len(), 44 + 16);
        assert_eq!(&file_data[0..4], b"RIFF");
        assert_eq!(wav_format::read_sizes(&file_data), Some((52, 16)));

        let checksum = sha256_file(&path).unwrap();
        assert_eq!(checksum.len(), 64);
    }

    #[test]
    fn failed_append_does_not_spoil_finalize() {
        let mut writer = WavFileWriter::new(
            FlakyDisk {
                inner: Cursor::new(Vec::new()),
                fail_at: 2,
                writes: 0,
            },
            SampleSpec::CAPTURE,
        )
        .unwrap();

        writer.append(&[1u8; 100]).unwrap();
        assert!(matches!(writer.append(&[2u8; 200]), Err(RecorderError::StorageError(_))));
        writer.append(&[3u8; 50]).unwrap();
        assert_eq!(writer.audio_bytes(), 150);

        assert_eq!(writer.finalize().unwrap(), 44 + 150);
        let bytes = writer.into_inner().inner.into_inner();
        assert_eq!(wav_format::read_sizes(&bytes), Some((186, 150)));
        assert_eq!(&bytes[144..], &[3u8; 50][..]);
    }

    #[test]
    fn create_new_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken.wav");
        fs::write(&path, b"keep me").unwrap();

        let err = WavFileWriter::create_new(&path, SampleSpec::CAPTURE).err().unwrap();
        assert!(matches!(err, RecorderError::StorageError(_)));
        assert_eq!(fs::read(&path).unwrap(), b"keep me");
    }
}
