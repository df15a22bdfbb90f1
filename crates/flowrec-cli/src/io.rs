//! Request files in, JSON results out.
//!
//! A request file is either a bare JSON array of flows or an object:
//!
//! ```json
//! { "flows": [...], "settings": { "branching": 3 }, "constraintPolicy": "technological" }
//! ```

use anyhow::{bail, Context, Result};
use flowrec_algo::GedSettings;
use flowrec_core::{ConstraintPolicy, Flow};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub flows: Vec<Flow>,
    #[serde(default)]
    pub settings: Option<GedSettings>,
    #[serde(default)]
    pub constraint_policy: Option<ConstraintPolicy>,
}

pub fn parse_request(value: serde_json::Value) -> Result<Request> {
    let request = match value {
        serde_json::Value::Array(_) => Request {
            flows: serde_json::from_value(value).context("parsing flow array")?,
            ..Request::default()
        },
        serde_json::Value::Object(_) => {
            serde_json::from_value(value).context("parsing request object")?
        }
        _ => bail!("request must be a JSON array of flows or an object with a `flows` field"),
    };
    Ok(request)
}

pub fn read_request(path: &Path) -> Result<Request> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing JSON in {}", path.display()))?;
    parse_request(value).with_context(|| format!("reading request {}", path.display()))
}

/// Pretty-print `value` to `out`, or to stdout when `out` is `None`.
pub fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value).context("serializing result")?;
            writeln!(writer)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value).context("serializing result")?;
            writeln!(handle)?;
        }
    }
    Ok(())
}
