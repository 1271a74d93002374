//! Display sinks
//!
//! - `FileSink`: one text file per region, for streaming software text sources
//! - `ConsoleSink`: logs the display whenever it changes
//!
//! Both skip regions whose text did not change, so a refresh that produces
//! the same display causes no visible redraw.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::{DisplaySink, DisplayState, Region, SinkError};

use super::config::{Config, SinkKind};

/// Build the sink selected in the config
pub fn from_config(config: &Config) -> Result<Box<dyn DisplaySink + Send>, SinkError> {
    Ok(match config.display.sink {
        SinkKind::Files => Box::new(FileSink::new(config.output_dir())?),
        SinkKind::Console => Box::new(ConsoleSink::new()),
    })
}

// =============================================================================
// FILE SINK
// =============================================================================

pub struct FileSink {
    dir: PathBuf,
    written: HashMap<Region, String>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(SinkError::Directory)?;
        info!(dir = %dir.display(), "[SINK] Writing overlay regions");
        Ok(Self {
            dir,
            written: HashMap::new(),
        })
    }

    pub fn region_path(&self, region: Region) -> PathBuf {
        self.dir.join(format!("{}.txt", region.name()))
    }

    /// Write through a temp file and rename, so readers never see a
    /// half-written region.
    fn write_region(&self, region: Region, text: &str) -> Result<(), SinkError> {
        let path = self.region_path(region);
        let tmp = path.with_extension("txt.tmp");
        fs::write(&tmp, text)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|source| SinkError::Write {
                region: region.name(),
                source,
            })
    }
}

impl DisplaySink for FileSink {
    fn commit(&mut self, display: &DisplayState) -> Result<(), SinkError> {
        for region in Region::ALL {
            let text = display.region(region);
            if self.written.get(&region).map(String::as_str) == Some(text) {
                continue;
            }
            self.write_region(region, text)?;
            self.written.insert(region, text.to_string());
            debug!(region = region.name(), text, "[SINK] Region updated");
        }
        Ok(())
    }
}

// =============================================================================
// CONSOLE SINK
// =============================================================================

#[derive(Default)]
pub struct ConsoleSink {
    last: Option<DisplayState>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for ConsoleSink {
    fn commit(&mut self, state: &DisplayState) -> Result<(), SinkError> {
        if self.last.as_ref() == Some(state) {
            return Ok(());
        }
        info!(
            map = %state.map_label,
            tp_wr = %state.tp_wr,
            tp_pb = %state.tp_pb,
            pro_wr = %state.pro_wr,
            pro_pb = %state.pro_pb,
            "[SINK] Display"
        );
        self.last = Some(state.clone());
        Ok(())
    }
}
