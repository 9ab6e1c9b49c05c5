//! Extension-driven artifact deserialization.

use flate2::read::{GzDecoder, ZlibDecoder};
use serde_pickle::{DeOptions, Value};
use std::io::Read;
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZLIB_CMF: u8 = 0x78;

/// On-disk container chosen from the file extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// `.pkl`, `.pickle`: a bare pickle stream.
    Pickle,
    /// `.joblib`, `.model`: a pickle stream, optionally zlib or gzip compressed.
    Joblib,
}

impl ArtifactFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pkl" | "pickle" => Some(ArtifactFormat::Pickle),
            "joblib" | "model" => Some(ArtifactFormat::Joblib),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Decodes raw file contents into a plain value.
    pub fn read(self, bytes: &[u8]) -> Result<Value, String> {
        match self {
            ArtifactFormat::Pickle => unpickle(bytes),
            ArtifactFormat::Joblib => {
                let inflated = inflate(bytes)?;
                unpickle(inflated.as_deref().unwrap_or(bytes))
            }
        }
    }
}

fn unpickle(bytes: &[u8]) -> Result<Value, String> {
    serde_pickle::value_from_slice(bytes, DeOptions::new())
        .map_err(|e| format!("not a readable pickle stream: {e}"))
}

/// Decompressed contents, or `None` when the stream is stored uncompressed.
fn inflate(bytes: &[u8]) -> Result<Option<Vec<u8>>, String> {
    let mut out = Vec::new();
    if bytes.starts_with(&GZIP_MAGIC) {
        GzDecoder::new(bytes)
            .read_to_end(&mut out)
            .map_err(|e| format!("corrupt gzip stream: {e}"))?;
        return Ok(Some(out));
    }
    // zlib header: CMF 0x78 and a check byte making the pair divisible by 31
    if bytes.len() >= 2
        && bytes[0] == ZLIB_CMF
        && u16::from_be_bytes([bytes[0], bytes[1]]) % 31 == 0
    {
        ZlibDecoder::new(bytes)
            .read_to_end(&mut out)
            .map_err(|e| format!("corrupt zlib stream: {e}"))?;
        return Ok(Some(out));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use serde_pickle::SerOptions;
    use std::io::Write;

    fn pickled() -> Vec<u8> {
        let value = Value::List(vec![Value::I64(1), Value::String("x".into())]);
        serde_pickle::value_to_vec(&value, SerOptions::new()).unwrap()
    }

    #[test]
    fn extension_picks_format() {
        assert_eq!(
            ArtifactFormat::from_path(Path::new("m/risk.pkl")),
            Some(ArtifactFormat::Pickle)
        );
        assert_eq!(
            ArtifactFormat::from_path(Path::new("risk.model")),
            Some(ArtifactFormat::Joblib)
        );
        assert_eq!(ArtifactFormat::from_path(Path::new("risk.onnx")), None);
    }

    #[test]
    fn joblib_reads_plain_zlib_and_gzip() {
        let raw = pickled();

        let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
        z.write_all(&raw).unwrap();
        let zlib = z.finish().unwrap();

        let mut g = GzEncoder::new(Vec::new(), Compression::default());
        g.write_all(&raw).unwrap();
        let gzip = g.finish().unwrap();

        let expected = ArtifactFormat::Pickle.read(&raw).unwrap();
        for bytes in [&raw, &zlib, &gzip] {
            assert_eq!(ArtifactFormat::Joblib.read(bytes).unwrap(), expected);
        }
    }

    #[test]
    fn pickle_does_not_decompress() {
        let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
        z.write_all(&pickled()).unwrap();
        assert!(ArtifactFormat::Pickle.read(&z.finish().unwrap()).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let err = ArtifactFormat::Pickle.read(b"definitely not a pickle").unwrap_err();
        assert!(err.starts_with("not a readable pickle stream"), "{err}");
    }
}
