//! Reading the specificity archive (`.npz`) written by the inference tool.
//!
//! The archive is a zip of `.npy` members:
//!
//! - `predicted_ppm`: `[positions, residue_types]`, float32 or float64
//! - `dna_mask`: `[positions]`, bool or numeric (nonzero = DNA)
//! - `restype_to_int`: a pickled `dict[str, int]` saved as a 0-d object array
//!
use anyhow::{anyhow, bail, ensure, Context, Result};
use ndarray::{Array1, Array2};
use ndarray_npy::ReadNpyExt;
use serde_pickle::{DeOptions, HashableValue, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

// pickle opcodes
const BUILD: u8 = b'b';
const STOP: u8 = b'.';
const TUPLE2: u8 = 0x86;

#[derive(Debug, Clone)]
pub struct SpecificityArchive {
    pub predicted_ppm: Array2<f64>,
    pub dna_mask: Array1<bool>,
    pub restype_to_int: HashMap<String, usize>,
}

impl SpecificityArchive {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut zip = ZipArchive::new(file)
            .with_context(|| format!("{} is not an npz archive", path.display()))?;

        let predicted_ppm = read_ppm(&member(&mut zip, "predicted_ppm")?)?;
        let dna_mask = read_mask(&member(&mut zip, "dna_mask")?)?;
        let restype_to_int = read_symbol_map(&member(&mut zip, "restype_to_int")?)?;

        log::debug!(
            "loaded {}: ppm {:?}, {} residue types",
            path.display(),
            predicted_ppm.dim(),
            restype_to_int.len()
        );
        Ok(Self {
            predicted_ppm,
            dna_mask,
            restype_to_int,
        })
    }

    pub fn num_positions(&self) -> usize {
        self.predicted_ppm.nrows()
    }

    pub fn num_dna_positions(&self) -> usize {
        self.dna_mask.iter().filter(|&&m| m).count()
    }
}

/// Raw bytes of `<name>.npy`.
fn member<R: Read + std::io::Seek>(zip: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let entry_name = format!("{name}.npy");
    let mut entry = zip
        .by_name(&entry_name)
        .with_context(|| format!("archive has no `{name}` array"))?;
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .with_context(|| format!("reading `{name}`"))?;
    Ok(bytes)
}

fn read_ppm(bytes: &[u8]) -> Result<Array2<f64>> {
    if let Ok(ppm) = Array2::<f32>::read_npy(Cursor::new(bytes)) {
        return Ok(ppm.mapv(f64::from));
    }
    Array2::<f64>::read_npy(Cursor::new(bytes))
        .context("`predicted_ppm` is not a 2-D float32/float64 array")
}

fn read_mask(bytes: &[u8]) -> Result<Array1<bool>> {
    if let Ok(mask) = Array1::<bool>::read_npy(Cursor::new(bytes)) {
        return Ok(mask);
    }
    if let Ok(mask) = Array1::<i64>::read_npy(Cursor::new(bytes)) {
        return Ok(mask.mapv(|v| v != 0));
    }
    if let Ok(mask) = Array1::<i32>::read_npy(Cursor::new(bytes)) {
        return Ok(mask.mapv(|v| v != 0));
    }
    if let Ok(mask) = Array1::<u8>::read_npy(Cursor::new(bytes)) {
        return Ok(mask.mapv(|v| v != 0));
    }
    if let Ok(mask) = Array1::<f32>::read_npy(Cursor::new(bytes)) {
        return Ok(mask.mapv(|v| v != 0.0));
    }
    Array1::<f64>::read_npy(Cursor::new(bytes))
        .map(|mask| mask.mapv(|v| v != 0.0))
        .context("`dna_mask` is not a 1-D bool or numeric array")
}

/// Split an `.npy` buffer into its header dict and body.
fn split_npy(bytes: &[u8]) -> Result<(&str, &[u8])> {
    ensure!(bytes.starts_with(NPY_MAGIC), "missing npy magic");
    let major = *bytes.get(6).ok_or_else(|| anyhow!("truncated npy header"))?;
    let (len, start) = match major {
        1 => {
            let raw = bytes.get(8..10).ok_or_else(|| anyhow!("truncated npy header"))?;
            (u16::from_le_bytes([raw[0], raw[1]]) as usize, 10)
        }
        2 | 3 => {
            let raw = bytes.get(8..12).ok_or_else(|| anyhow!("truncated npy header"))?;
            (u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize, 12)
        }
        v => bail!("unsupported npy version {v}"),
    };
    let header = bytes
        .get(start..start + len)
        .ok_or_else(|| anyhow!("truncated npy header"))?;
    let header = std::str::from_utf8(header).context("npy header is not text")?;
    Ok((header, &bytes[start + len..]))
}

/// numpy ends an object-array pickle with `BUILD`, which applies the array state
/// (holding the element) to the reconstructed array. serde-pickle has no objects to
/// apply it to, so the final `BUILD` becomes `TUPLE2` and the state stays in the value.
fn keep_build_state(body: &[u8]) -> Cow<'_, [u8]> {
    match body {
        [.., BUILD, STOP] => {
            let mut patched = body.to_vec();
            let at = patched.len() - 2;
            patched[at] = TUPLE2;
            Cow::Owned(patched)
        }
        _ => Cow::Borrowed(body),
    }
}

/// Decode the pickled symbol map.
///
/// numpy pickles the whole 0-d object array, so the dict sits somewhere inside the
/// reconstruction state rather than at the top of the pickle.
fn read_symbol_map(bytes: &[u8]) -> Result<HashMap<String, usize>> {
    let (header, body) = split_npy(bytes).context("`restype_to_int`")?;
    ensure!(
        header.contains("'|O'"),
        "`restype_to_int` is not an object array"
    );
    let body = keep_build_state(body);
    let value = serde_pickle::value_from_slice(
        &body,
        DeOptions::new().replace_unresolved_globals().decode_strings(),
    )
    .context("unpickling `restype_to_int`")?;

    let dict = find_symbol_dict(&value)
        .ok_or_else(|| anyhow!("`restype_to_int` holds no symbol-to-index mapping"))?;
    Ok(dict)
}

fn find_symbol_dict(value: &Value) -> Option<HashMap<String, usize>> {
    match value {
        Value::Dict(entries) => {
            let mut map = HashMap::with_capacity(entries.len());
            for (key, index) in entries {
                let key = match key {
                    HashableValue::String(s) => s.clone(),
                    HashableValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
                    _ => return None,
                };
                let index = match index {
                    Value::I64(i) => usize::try_from(*i).ok()?,
                    _ => return None,
                };
                map.insert(key, index);
            }
            Some(map)
        }
        Value::List(items) | Value::Tuple(items) => items.iter().find_map(find_symbol_dict),
        _ => None,
    }
}
