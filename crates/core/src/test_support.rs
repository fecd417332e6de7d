// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Analyzer, AnalyzerDefinition, Attachment};
use serde_json::Map;
use std::path::Path;

// ── Entity factory functions ────────────────────────────────────────────────

/// An analyzer owned by `org-test` with no rate limit and no config.
pub fn analyzer(id: &str) -> Analyzer {
    Analyzer {
        id: id.to_string(),
        name: format!("{id}-name"),
        organization: "org-test".to_string(),
        rate: None,
        rate_unit: None,
        config: Map::new(),
        analyzer_definition_id: format!("{id}-def"),
    }
}

/// An analyzer definition invoking `cmd` from its parent directory.
pub fn definition(id: &str, cmd: &Path) -> AnalyzerDefinition {
    AnalyzerDefinition {
        id: id.to_string(),
        cmd: cmd.to_path_buf(),
        base_directory: cmd.parent().unwrap_or(Path::new("/")).to_path_buf(),
        configuration_items: Vec::new(),
        configuration: Map::new(),
    }
}

/// An attachment reference with a fixed fake hash.
pub fn attachment(id: &str, name: &str) -> Attachment {
    Attachment {
        id: id.to_string(),
        name: name.to_string(),
        content_type: "application/octet-stream".to_string(),
        size: 4,
        hash: "0000000000000000000000000000000000000000000000000000000000000000".to_string(),
    }
}
